use crate::{
    ease::Ease,
    error::{CinescrollError, CinescrollResult},
};

/// Lifecycle stage of one scene at one instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SceneStage {
    Hidden,
    Entering,
    Active,
    Exiting,
}

/// Derived visual parameters for one scene at one instant. Ephemeral; the
/// host turns these into actual style output.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct StagingMetrics {
    pub stage: SceneStage,
    /// The scene's own [0,1] progress within its band.
    pub local_progress: f64,
    pub background_opacity: f64,
    pub scale: f64,
    pub transform_y: f64,
    pub z_index: i32,
    pub text_visibility: f64,
}

/// Tuning constants for the band partition. These encode the "no abrupt cut"
/// aesthetic as configuration defaults, not invariants.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct StagingConfig {
    /// Share of the band during which the scene is fully active and stable;
    /// the remainder is the transition phase.
    pub content_fraction: f64,
    /// Local progress at which the scene's text starts fading out. Text
    /// leads the container so it never cuts abruptly.
    pub text_exit_start: f64,
    /// How far before its band a scene's text starts fading in, as a
    /// fraction of the previous band (0.15 = at 85% of the previous band).
    pub text_enter_lead: f64,
    pub exit_scale: f64,
    pub enter_scale: f64,
    pub exit_shift_y: f64,
    pub enter_shift_y: f64,
    /// Ease applied to container opacity/scale/offset transitions.
    pub transition_ease: Ease,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            content_fraction: 0.75,
            text_exit_start: 0.75,
            text_enter_lead: 0.15,
            exit_scale: 0.92,
            enter_scale: 1.06,
            exit_shift_y: -48.0,
            enter_shift_y: 48.0,
            // Slow-start cubic: the container lingers while the (linear)
            // text fade leads it out of the frame.
            transition_ease: Ease::InCubic,
        }
    }
}

impl StagingConfig {
    pub fn validate(&self) -> CinescrollResult<()> {
        for (name, v) in [
            ("content_fraction", self.content_fraction),
            ("text_exit_start", self.text_exit_start),
            ("text_enter_lead", self.text_enter_lead),
        ] {
            if !(v > 0.0 && v < 1.0) {
                return Err(CinescrollError::validation(format!(
                    "{name} must be in (0,1)"
                )));
            }
        }
        for (name, v) in [("exit_scale", self.exit_scale), ("enter_scale", self.enter_scale)] {
            if !v.is_finite() || v <= 0.0 {
                return Err(CinescrollError::validation(format!(
                    "{name} must be finite and > 0"
                )));
            }
        }
        if !self.exit_shift_y.is_finite() || !self.enter_shift_y.is_finite() {
            return Err(CinescrollError::validation("shift offsets must be finite"));
        }
        Ok(())
    }
}

const Z_STRIDE: i32 = 10;

/// Maps global progress to per-scene staging metrics.
///
/// Each scene owns an equal-width band of the progress range. All staging is
/// computed from the unclamped band offset `u = progress·n − i`: `u = 0` at
/// the scene's band start, `1` at its end, negative while the previous scene
/// still owns the viewport. The only mutable state is the recency tracker
/// used to break z-order ties during band overlap.
#[derive(Clone, Debug)]
pub struct SceneStager {
    config: StagingConfig,
    total_scenes: usize,
    last_active: Option<usize>,
}

impl SceneStager {
    pub fn new(config: StagingConfig, total_scenes: usize) -> CinescrollResult<Self> {
        config.validate()?;
        if total_scenes == 0 {
            return Err(CinescrollError::validation("total_scenes must be > 0"));
        }
        Ok(Self {
            config,
            total_scenes,
            last_active: None,
        })
    }

    pub fn total_scenes(&self) -> usize {
        self.total_scenes
    }

    /// Stage every scene for one frame and update the recency tracker.
    pub fn stage_all(&mut self, progress_ratio: f64) -> Vec<StagingMetrics> {
        let metrics: Vec<_> = (0..self.total_scenes)
            .map(|i| self.stage(i, progress_ratio))
            .collect();
        if let Some(active) = metrics.iter().position(|m| m.stage == SceneStage::Active) {
            self.last_active = Some(active);
        }
        metrics
    }

    /// Metrics for one scene. Pure given the recency state.
    pub fn stage(&self, scene_index: usize, progress_ratio: f64) -> StagingMetrics {
        let p = progress_ratio.clamp(0.0, 1.0);
        let n = self.total_scenes as f64;
        let u = p * n - scene_index as f64;
        let is_last = scene_index + 1 == self.total_scenes;

        let stage = self.classify(u, is_last);
        let local_progress = u.clamp(0.0, 1.0);

        let (background_opacity, scale, transform_y) = self.container(u, stage);
        let text_visibility = self.text_visibility(u, is_last);
        let z_index = self.z_index(scene_index, stage);

        StagingMetrics {
            stage,
            local_progress,
            background_opacity,
            scale,
            transform_y,
            z_index,
            text_visibility,
        }
    }

    fn classify(&self, u: f64, is_last: bool) -> SceneStage {
        // Cull on the actual visibility windows so at most the exiting and
        // entering neighbors ever overlap. The enter cut covers both the
        // container ramp and the earlier text fade-in.
        let enter_window = (1.0 - self.config.content_fraction).max(self.config.text_enter_lead);
        if u <= -enter_window {
            return SceneStage::Hidden;
        }
        if u < 0.0 {
            return SceneStage::Entering;
        }
        if is_last || u <= self.config.content_fraction {
            // The final scene has no successor: it clamps instead of exiting.
            SceneStage::Active
        } else if u < 1.0 {
            SceneStage::Exiting
        } else {
            SceneStage::Hidden
        }
    }

    fn container(&self, u: f64, stage: SceneStage) -> (f64, f64, f64) {
        let cfg = &self.config;
        let window = 1.0 - cfg.content_fraction;
        match stage {
            SceneStage::Hidden => {
                let (scale, shift) = if u < 0.0 {
                    (cfg.enter_scale, cfg.enter_shift_y)
                } else {
                    (cfg.exit_scale, cfg.exit_shift_y)
                };
                (0.0, scale, shift)
            }
            SceneStage::Entering => {
                // Ramp in over the last `window` of the previous band.
                let t = ((u + window) / window).clamp(0.0, 1.0);
                let e = cfg.transition_ease.apply(t);
                (
                    e,
                    cfg.enter_scale + (1.0 - cfg.enter_scale) * e,
                    cfg.enter_shift_y * (1.0 - e),
                )
            }
            SceneStage::Active => (1.0, 1.0, 0.0),
            SceneStage::Exiting => {
                let t = ((u - cfg.content_fraction) / window).clamp(0.0, 1.0);
                let e = cfg.transition_ease.apply(t);
                (
                    1.0 - e,
                    1.0 + (cfg.exit_scale - 1.0) * e,
                    cfg.exit_shift_y * e,
                )
            }
        }
    }

    /// Text leads the container on the way out and anticipates it on the way
    /// in, so a headline never appears or vanishes abruptly.
    fn text_visibility(&self, u: f64, is_last: bool) -> f64 {
        let cfg = &self.config;
        if u < 0.0 {
            return ((u + cfg.text_enter_lead) / cfg.text_enter_lead).clamp(0.0, 1.0);
        }
        if is_last || u <= cfg.text_exit_start {
            return 1.0;
        }
        (1.0 - (u - cfg.text_exit_start) / (1.0 - cfg.text_exit_start)).clamp(0.0, 1.0)
    }

    fn z_index(&self, scene_index: usize, stage: SceneStage) -> i32 {
        let base = match stage {
            SceneStage::Active => 3,
            SceneStage::Entering => 2,
            SceneStage::Exiting => 1,
            SceneStage::Hidden => 0,
        };
        let recency = i32::from(self.last_active == Some(scene_index));
        base * Z_STRIDE + recency
    }
}
