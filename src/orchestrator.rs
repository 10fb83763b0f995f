use std::collections::BTreeMap;

use crate::{
    error::{CinescrollError, CinescrollResult},
    form::SessionFormState,
    model::{Scene, SceneList},
    perf::{DeviceTier, PerfClassifier, PerfThresholds, PerformanceMode},
    signal::{ScrollSignal, SignalSmoother, SmootherConfig},
    stage::{SceneStage, SceneStager, StagingConfig, StagingMetrics},
    text::{ChoreographyConfig, TextControls, choreograph},
};

/// External collaborator that receives committed form data. The engine never
/// retries; a failed hand-off is surfaced to the caller as a result value.
pub trait SubmissionSink {
    fn submit(
        &mut self,
        scene_id: &str,
        data: &BTreeMap<String, String>,
        is_final: bool,
    ) -> Result<(), String>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Phase {
    Idle,
    Active,
    Completed,
}

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct OrchestratorConfig {
    pub smoother: SmootherConfig,
    pub staging: StagingConfig,
    pub choreography: ChoreographyConfig,
    pub thresholds: PerfThresholds,
    pub device_tier: DeviceTier,
    /// Minimum spacing between accepted input samples, bounding the
    /// smoother's update rate independent of the raw event rate.
    pub min_input_interval_ms: f64,
    /// Local-progress crossing point for active-index hand-over. Deliberately
    /// not the raw band boundary, so the index never flaps there.
    pub activation_threshold: f64,
    /// Scales |velocity| into the choreographer's motion-blur input.
    pub motion_blur_gain: f64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            smoother: SmootherConfig::default(),
            staging: StagingConfig::default(),
            choreography: ChoreographyConfig::default(),
            thresholds: PerfThresholds::default(),
            device_tier: DeviceTier::default(),
            min_input_interval_ms: 8.0,
            activation_threshold: 0.2,
            motion_blur_gain: 1.2,
        }
    }
}

impl OrchestratorConfig {
    pub fn validate(&self) -> CinescrollResult<()> {
        self.smoother.validate()?;
        self.staging.validate()?;
        self.choreography.validate()?;
        self.thresholds.validate()?;
        if !self.min_input_interval_ms.is_finite() || self.min_input_interval_ms < 0.0 {
            return Err(CinescrollError::validation(
                "min_input_interval_ms must be finite and >= 0",
            ));
        }
        if !(self.activation_threshold > 0.0 && self.activation_threshold < 1.0) {
            return Err(CinescrollError::validation(
                "activation_threshold must be in (0,1)",
            ));
        }
        if !self.motion_blur_gain.is_finite() || self.motion_blur_gain < 0.0 {
            return Err(CinescrollError::validation(
                "motion_blur_gain must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

/// One non-hidden scene's output for one frame.
#[derive(Clone, Debug, serde::Serialize)]
pub struct SceneFrame {
    pub index: usize,
    pub scene_id: String,
    pub metrics: StagingMetrics,
    pub text: Vec<crate::text::CharacterFrame>,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct FrameOutput {
    pub signal: ScrollSignal,
    pub mode: PerformanceMode,
    pub phase: Phase,
    pub active_index: usize,
    /// Non-hidden scenes only; hidden scenes are culled from rendering.
    pub scenes: Vec<SceneFrame>,
}

/// Top-level coordinator. Owns the scene list and form state, feeds the
/// signal smoother from throttled input, and runs the per-frame pipeline in
/// its contractual order: smoother update first, then every scene staged,
/// then text choreography consuming that same frame's `text_visibility`.
pub struct Orchestrator {
    scenes: SceneList,
    config: OrchestratorConfig,
    smoother: SignalSmoother,
    stager: SceneStager,
    classifier: PerfClassifier,
    form: SessionFormState,
    phase: Phase,
    active_index: usize,
    pending_input: Option<f64>,
    last_input_ts: Option<f64>,
    last_frame_ts: Option<f64>,
    last_mode: PerformanceMode,
    torn_down: bool,
}

impl Orchestrator {
    pub fn new(scenes: Vec<Scene>, config: OrchestratorConfig) -> CinescrollResult<Self> {
        config.validate()?;
        let scenes = SceneList::new(scenes)?;
        let smoother = SignalSmoother::new(config.smoother)?;
        let stager = SceneStager::new(config.staging, scenes.len())?;
        let classifier = PerfClassifier::new(config.thresholds, config.device_tier)?;

        Ok(Self {
            scenes,
            config,
            smoother,
            stager,
            classifier,
            form: SessionFormState::default(),
            phase: Phase::Idle,
            active_index: 0,
            pending_input: None,
            last_input_ts: None,
            last_frame_ts: None,
            last_mode: PerformanceMode::High,
            torn_down: false,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn active_scene(&self) -> &Scene {
        self.scenes
            .get(self.active_index)
            .expect("active index is always in range")
    }

    pub fn form(&self) -> &SessionFormState {
        &self.form
    }

    /// Record a raw scroll sample. Out-of-order or non-finite samples are
    /// dropped. Samples inside the `min_input_interval_ms` throttle window
    /// coalesce: the latest position wins, so the trailing event of a burst
    /// is never lost, while the accepted-sample cadence stays bounded.
    pub fn push_input(&mut self, position: f64, timestamp_ms: f64) {
        if self.torn_down {
            return;
        }
        if !position.is_finite() || !timestamp_ms.is_finite() {
            tracing::trace!(position, timestamp_ms, "dropping non-finite input sample");
            return;
        }
        if let Some(last) = self.last_input_ts {
            if timestamp_ms <= last {
                tracing::trace!(timestamp_ms, last, "dropping out-of-order input sample");
                return;
            }
            if timestamp_ms - last < self.config.min_input_interval_ms {
                self.pending_input = Some(position);
                return;
            }
        }
        self.last_input_ts = Some(timestamp_ms);
        self.pending_input = Some(position);
    }

    /// Run one animation frame.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn frame(&mut self, timestamp_ms: f64) -> CinescrollResult<FrameOutput> {
        if self.torn_down {
            return Err(CinescrollError::staging("orchestrator is torn down"));
        }
        if self.phase == Phase::Idle {
            tracing::debug!("entering active phase");
            self.phase = Phase::Active;
        }

        let dt = match self.last_frame_ts {
            Some(last) => timestamp_ms - last,
            None => self.config.smoother.reference_frame_ms,
        };
        if timestamp_ms.is_finite() {
            self.last_frame_ts = Some(timestamp_ms);
        }

        // Ordering contract: smoother → stager (all scenes) → choreographer.
        let raw = self
            .pending_input
            .take()
            .unwrap_or(self.smoother.signal().raw_position);
        let signal = self.smoother.update(raw, dt);

        let mode = self.classifier.classify(signal.velocity);
        if mode != self.last_mode {
            tracing::trace!(?mode, velocity = signal.velocity, "performance mode changed");
            self.last_mode = mode;
        }

        let metrics = self.stager.stage_all(signal.progress_ratio);
        self.track_active_index(signal.progress_ratio, &metrics);

        let motion_blur = match mode {
            // Low mode sheds per-character blur entirely; metrics themselves
            // are unaffected.
            PerformanceMode::Low => 0.0,
            PerformanceMode::Medium => signal.velocity.abs() * self.config.motion_blur_gain * 0.5,
            PerformanceMode::High => signal.velocity.abs() * self.config.motion_blur_gain,
        };

        let scenes = metrics
            .iter()
            .enumerate()
            .filter(|(_, m)| m.stage != SceneStage::Hidden)
            .map(|(index, m)| {
                let scene = self.scenes.get(index).expect("staged index in range");
                let text = match scene.headline() {
                    Some(headline) => {
                        // Entering scenes get full anticipation so their text
                        // feels ready before the container lands.
                        let anticipation = if m.stage == SceneStage::Entering {
                            1.0
                        } else {
                            0.0
                        };
                        let controls = TextControls {
                            visibility: m.text_visibility,
                            morph_progress: 0.0,
                            anticipation,
                            motion_blur,
                        };
                        choreograph(headline, &controls, &self.config.choreography)
                    }
                    None => Vec::new(),
                };
                SceneFrame {
                    index,
                    scene_id: scene.id.clone(),
                    metrics: *m,
                    text,
                }
            })
            .collect();

        Ok(FrameOutput {
            signal,
            mode,
            phase: self.phase,
            active_index: self.active_index,
            scenes,
        })
    }

    /// Hysteresis on the active index: advance once the candidate band is
    /// genuinely underway, retreat once progress has backed a threshold's
    /// worth past the current band's start.
    fn track_active_index(&mut self, progress: f64, metrics: &[StagingMetrics]) {
        let n = self.scenes.len();
        let candidate = ((progress * n as f64).floor() as usize).min(n - 1);
        if candidate == self.active_index {
            return;
        }

        if candidate > self.active_index {
            if metrics[candidate].local_progress >= self.config.activation_threshold {
                tracing::debug!(from = self.active_index, to = candidate, "scene advanced");
                self.active_index = candidate;
            }
        } else {
            let u_active = progress * n as f64 - self.active_index as f64;
            if u_active <= -self.config.activation_threshold {
                tracing::debug!(from = self.active_index, to = candidate, "scene retreated");
                self.active_index = candidate;
            }
        }
    }

    /// Write a field of the currently active scene's form entry.
    pub fn set_field(&mut self, field_id: impl Into<String>, value: impl Into<String>) {
        if self.torn_down {
            return;
        }
        let scene_id = self.active_scene().id.clone();
        self.form.set_field(scene_id, field_id, value);
    }

    /// Hand the active scene's entered data to the collaborator. On success
    /// the scene's entries are cleared; on failure they are left intact so
    /// the user can retry without re-entering anything.
    #[tracing::instrument(level = "debug", skip(self, sink))]
    pub fn submit_scene(&mut self, sink: &mut dyn SubmissionSink) -> CinescrollResult<()> {
        if self.torn_down {
            return Err(CinescrollError::staging("orchestrator is torn down"));
        }
        let scene_id = self.active_scene().id.clone();
        let is_final = self.active_index == self.scenes.last_index();
        let data = self.form.scene_data(&scene_id);

        sink.submit(&scene_id, &data, is_final)
            .map_err(CinescrollError::submission)?;

        self.form.clear_scene(&scene_id);
        if is_final {
            tracing::debug!(scene_id = %scene_id, "session completed");
            self.phase = Phase::Completed;
        }
        Ok(())
    }

    /// Final hand-off. Only valid once the final scene is active.
    pub fn complete(&mut self, sink: &mut dyn SubmissionSink) -> CinescrollResult<()> {
        if self.active_index != self.scenes.last_index() {
            return Err(CinescrollError::staging(
                "completion triggered before the final scene",
            ));
        }
        self.submit_scene(sink)
    }

    /// Tear the engine down. Further frames and submissions are refused,
    /// queued input is dropped, and partially entered data for incomplete
    /// scenes is discarded rather than submitted.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        tracing::debug!("orchestrator torn down");
        self.torn_down = true;
        self.pending_input = None;
        self.form.clear();
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}
