use crate::error::{CinescrollError, CinescrollResult};

/// Snapshot of the smoothed scroll state, recomputed every frame.
/// Consumers receive copies; the smoother owns the evolving state.
#[derive(Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ScrollSignal {
    pub raw_position: f64,
    pub smoothed_position: f64,
    /// Normalized [0,1] position across the full scrollable sequence.
    pub progress_ratio: f64,
    /// Smoothed first difference of the position, in units per millisecond.
    pub velocity: f64,
}

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct SmootherConfig {
    /// Filter coefficient per reference frame. Smaller = smoother, more lag.
    pub alpha: f64,
    pub total_scrollable_height: f64,
    /// Frame duration the `alpha` is quoted at; updates at other cadences
    /// rescale the coefficient so settle rate is frame-rate independent.
    pub reference_frame_ms: f64,
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self {
            alpha: 0.18,
            total_scrollable_height: 1.0,
            reference_frame_ms: 1000.0 / 60.0,
        }
    }
}

impl SmootherConfig {
    pub fn validate(&self) -> CinescrollResult<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(CinescrollError::validation(
                "smoother alpha must be in (0,1)",
            ));
        }
        if !(self.total_scrollable_height > 0.0) || !self.total_scrollable_height.is_finite() {
            return Err(CinescrollError::validation(
                "total_scrollable_height must be finite and > 0",
            ));
        }
        if !(self.reference_frame_ms > 0.0) || !self.reference_frame_ms.is_finite() {
            return Err(CinescrollError::validation(
                "reference_frame_ms must be finite and > 0",
            ));
        }
        Ok(())
    }
}

/// Single-pole exponential low-pass over the raw scroll position.
///
/// `smoothed += k · (raw − smoothed)` with `k = 1 − (1−α)^(dt/reference)`,
/// so sampling the same raw input at different frame rates converges at the
/// same rate to the same steady state. Velocity is the first difference of
/// the smoothed position, pushed through the same filter to suppress
/// single-frame spikes.
#[derive(Clone, Debug)]
pub struct SignalSmoother {
    config: SmootherConfig,
    signal: ScrollSignal,
    primed: bool,
}

impl SignalSmoother {
    pub fn new(config: SmootherConfig) -> CinescrollResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            signal: ScrollSignal::default(),
            primed: false,
        })
    }

    /// Read-only snapshot of the current signal.
    pub fn signal(&self) -> ScrollSignal {
        self.signal
    }

    /// Advance the filter by one sample. Clock anomalies (zero, negative, or
    /// non-finite `delta_time_ms`) and non-finite positions are discarded:
    /// the update is a no-op returning the previous signal unchanged.
    pub fn update(&mut self, raw_position: f64, delta_time_ms: f64) -> ScrollSignal {
        if !raw_position.is_finite() || !delta_time_ms.is_finite() || delta_time_ms <= 0.0 {
            tracing::trace!(raw_position, delta_time_ms, "discarding anomalous sample");
            return self.signal;
        }

        if !self.primed {
            // First sample snaps so the filter never lags a cold start.
            self.primed = true;
            self.signal.raw_position = raw_position;
            self.signal.smoothed_position = raw_position;
            self.signal.velocity = 0.0;
            self.signal.progress_ratio = self.ratio(raw_position);
            return self.signal;
        }

        let k = self.step_coefficient(delta_time_ms);
        let prev = self.signal.smoothed_position;
        let smoothed = prev + k * (raw_position - prev);

        let instantaneous = (smoothed - prev) / delta_time_ms;
        let velocity = self.signal.velocity + k * (instantaneous - self.signal.velocity);

        self.signal = ScrollSignal {
            raw_position,
            smoothed_position: smoothed,
            progress_ratio: self.ratio(smoothed),
            velocity,
        };
        self.signal
    }

    fn step_coefficient(&self, delta_time_ms: f64) -> f64 {
        let frames = delta_time_ms / self.config.reference_frame_ms;
        1.0 - (1.0 - self.config.alpha).powf(frames)
    }

    fn ratio(&self, position: f64) -> f64 {
        (position / self.config.total_scrollable_height).clamp(0.0, 1.0)
    }
}
