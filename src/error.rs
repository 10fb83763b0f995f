pub type CinescrollResult<T> = Result<T, CinescrollError>;

#[derive(thiserror::Error, Debug)]
pub enum CinescrollError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("signal error: {0}")]
    Signal(String),

    #[error("staging error: {0}")]
    Staging(String),

    #[error("submission error: {0}")]
    Submission(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CinescrollError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn signal(msg: impl Into<String>) -> Self {
        Self::Signal(msg.into())
    }

    pub fn staging(msg: impl Into<String>) -> Self {
        Self::Staging(msg.into())
    }

    pub fn submission(msg: impl Into<String>) -> Self {
        Self::Submission(msg.into())
    }
}
