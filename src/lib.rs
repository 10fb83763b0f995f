#![forbid(unsafe_code)]

pub mod ease;
pub mod error;
pub mod form;
pub mod model;
pub mod orchestrator;
pub mod perf;
pub mod signal;
pub mod stage;
pub mod text;

pub use ease::Ease;
pub use error::{CinescrollError, CinescrollResult};
pub use form::SessionFormState;
pub use model::{ContentBlock, FieldDescriptor, FormDescriptor, Scene, SceneList};
pub use orchestrator::{
    FrameOutput, Orchestrator, OrchestratorConfig, Phase, SceneFrame, SubmissionSink,
};
pub use perf::{DeviceTier, PerfClassifier, PerfThresholds, PerformanceMode};
pub use signal::{ScrollSignal, SignalSmoother, SmootherConfig};
pub use stage::{SceneStage, SceneStager, StagingConfig, StagingMetrics};
pub use text::{CharacterFrame, ChoreographyConfig, TextControls, TextDriver, TextSurface, choreograph};
