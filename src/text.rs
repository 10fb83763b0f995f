use kurbo::Vec2;

use crate::{
    ease::Ease,
    error::{CinescrollError, CinescrollResult},
};

/// One character's visual parameters for one frame. `rotate_z` is in
/// degrees; `blur` is a radius in the host's units.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct CharacterFrame {
    pub ch: char,
    pub opacity: f64,
    pub scale: f64,
    pub translate: Vec2,
    pub rotate_z: f64,
    pub blur: f64,
}

/// Continuous control inputs for one choreography frame. All values are
/// clamped on use, so callers may pass raw interpolator output.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextControls {
    /// 0 = fully hidden, 1 = fully entered.
    pub visibility: f64,
    /// Degree to which the text is mid-replacement; attenuates left-to-right.
    pub morph_progress: f64,
    /// Bias on per-character entrance timing so text feels ready early.
    pub anticipation: f64,
    /// Externally supplied blur term for fast scroll.
    pub motion_blur: f64,
}

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct ChoreographyConfig {
    /// Share of the entrance spent staggering across the string.
    pub stagger: f64,
    /// Amplitude of the sinusoidal visibility ripple across the wave.
    pub ripple_amp: f64,
    /// How strongly anticipation accelerates per-character entrances.
    pub anticipation_gain: f64,
    /// Vertical rise distance a character travels while entering.
    pub entrance_rise: f64,
    pub entrance_scale: f64,
    pub entrance_blur: f64,
    pub morph_jitter: f64,
    pub morph_rotate_deg: f64,
    pub morph_blur: f64,
    /// Hard cap so characters never disappear into illegible blur.
    pub blur_max: f64,
}

impl Default for ChoreographyConfig {
    fn default() -> Self {
        Self {
            stagger: 0.35,
            ripple_amp: 0.08,
            anticipation_gain: 0.4,
            entrance_rise: 14.0,
            entrance_scale: 0.85,
            entrance_blur: 3.0,
            morph_jitter: 6.0,
            morph_rotate_deg: 9.0,
            morph_blur: 2.5,
            blur_max: 6.0,
        }
    }
}

impl ChoreographyConfig {
    pub fn validate(&self) -> CinescrollResult<()> {
        if !(self.stagger >= 0.0 && self.stagger < 1.0) {
            return Err(CinescrollError::validation("stagger must be in [0,1)"));
        }
        if !self.ripple_amp.is_finite() || self.ripple_amp < 0.0 || self.ripple_amp > 0.5 {
            return Err(CinescrollError::validation("ripple_amp must be in [0,0.5]"));
        }
        if !(self.blur_max > 0.0) || !self.blur_max.is_finite() {
            return Err(CinescrollError::validation("blur_max must be finite and > 0"));
        }
        for (name, v) in [
            ("anticipation_gain", self.anticipation_gain),
            ("entrance_rise", self.entrance_rise),
            ("entrance_scale", self.entrance_scale),
            ("entrance_blur", self.entrance_blur),
            ("morph_jitter", self.morph_jitter),
            ("morph_rotate_deg", self.morph_rotate_deg),
            ("morph_blur", self.morph_blur),
        ] {
            if !v.is_finite() {
                return Err(CinescrollError::validation(format!("{name} must be finite")));
            }
        }
        Ok(())
    }
}

/// Compute one frame of per-character staging. Pure: identical inputs yield
/// identical output, so the math is testable apart from the driver loop.
///
/// Character `k` of `n` is delayed by `stagger·k/n`, biased by anticipation,
/// rippled by a `sin(2π·k/n)` term windowed by `t(1−t)` (endpoints stay
/// exact), then pushed through a cubic in-out ease. Morph attenuates opacity
/// and scale with weight `1 − k/n` and injects small positional/rotational
/// jitter, so a replacement reads left-to-right.
pub fn choreograph(
    text: &str,
    controls: &TextControls,
    config: &ChoreographyConfig,
) -> Vec<CharacterFrame> {
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    if n == 0 {
        return Vec::new();
    }

    let v = controls.visibility.clamp(0.0, 1.0);
    let morph = controls.morph_progress.clamp(0.0, 1.0);
    let anticipation = controls.anticipation.clamp(0.0, 1.0);
    let motion_blur = controls.motion_blur.clamp(0.0, f64::MAX);

    let boost = 1.0 + anticipation * config.anticipation_gain;

    chars
        .into_iter()
        .enumerate()
        .map(|(k, ch)| {
            let frac = k as f64 / n as f64;

            let t = (v * boost * (1.0 + config.stagger) - frac * config.stagger).clamp(0.0, 1.0);
            let wave_phase = std::f64::consts::TAU * frac;
            let rippled = t + config.ripple_amp * wave_phase.sin() * t * (1.0 - t);
            let eased = Ease::InOutCubic.apply(rippled);

            let morph_weight = morph * (1.0 - frac);
            let opacity = (eased * (1.0 - morph_weight)).clamp(0.0, 1.0);
            let scale = (config.entrance_scale + (1.0 - config.entrance_scale) * eased)
                * (1.0 - 0.25 * morph_weight);

            let jitter = config.morph_jitter * morph_weight;
            let translate = Vec2::new(
                jitter * (12.9898 * k as f64).sin(),
                config.entrance_rise * (1.0 - eased) + 0.5 * jitter * (7.233 * k as f64).cos(),
            );
            let rotate_z = config.morph_rotate_deg * morph_weight * (3.7 * k as f64 + 0.8).sin();

            let blur = (config.entrance_blur * (1.0 - eased)
                + config.morph_blur * morph_weight
                + motion_blur)
                .clamp(0.0, config.blur_max);

            CharacterFrame {
                ch,
                opacity,
                scale,
                translate,
                rotate_z,
                blur,
            }
        })
        .collect()
}

/// Surface the driver applies frames to. The engine never touches
/// presentation technology; hosts implement this for their renderer.
pub trait TextSurface {
    fn apply(&mut self, frames: &[CharacterFrame]);
}

/// Thin stateful loop around [`choreograph`]. Self-suspends (reports no
/// pending work) once visibility and morph both sit at a steady state, and
/// resumes when a control input changes.
#[derive(Clone, Debug)]
pub struct TextDriver {
    text: String,
    controls: TextControls,
    config: ChoreographyConfig,
    dirty: bool,
}

impl TextDriver {
    pub fn new(text: impl Into<String>, config: ChoreographyConfig) -> CinescrollResult<Self> {
        config.validate()?;
        Ok(Self {
            text: text.into(),
            controls: TextControls::default(),
            config,
            dirty: true,
        })
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.text {
            self.text = text;
            self.dirty = true;
        }
    }

    pub fn set_controls(&mut self, controls: TextControls) {
        if controls != self.controls {
            self.controls = controls;
            self.dirty = true;
        }
    }

    pub fn controls(&self) -> TextControls {
        self.controls
    }

    /// Whether another frame should be scheduled.
    pub fn needs_frame(&self) -> bool {
        self.dirty || !self.at_steady_state()
    }

    fn at_steady_state(&self) -> bool {
        let v = self.controls.visibility;
        (v == 0.0 || v == 1.0) && self.controls.morph_progress == 0.0
    }

    /// Run one frame if any work is pending. Returns `true` when a frame was
    /// produced and applied; `false` means the loop is suspended.
    pub fn tick(&mut self, surface: &mut impl TextSurface) -> bool {
        if !self.needs_frame() {
            return false;
        }
        let frames = choreograph(&self.text, &self.controls, &self.config);
        surface.apply(&frames);
        self.dirty = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(visibility: f64, morph: f64) -> Vec<CharacterFrame> {
        choreograph(
            "staging",
            &TextControls {
                visibility,
                morph_progress: morph,
                ..TextControls::default()
            },
            &ChoreographyConfig::default(),
        )
    }

    #[test]
    fn fully_visible_text_is_at_rest() {
        for f in frames(1.0, 0.0) {
            assert_eq!(f.opacity, 1.0, "char {:?}", f.ch);
            assert_eq!(f.scale, 1.0);
            assert_eq!(f.translate, Vec2::ZERO);
            assert_eq!(f.rotate_z, 0.0);
            assert_eq!(f.blur, 0.0);
        }
    }

    #[test]
    fn invisible_text_has_zero_opacity() {
        for f in frames(0.0, 0.0) {
            assert_eq!(f.opacity, 0.0, "char {:?}", f.ch);
        }
    }

    #[test]
    fn entrance_staggers_left_to_right() {
        let fs = frames(0.45, 0.0);
        assert!(
            fs.first().unwrap().opacity > fs.last().unwrap().opacity,
            "leading characters enter first"
        );
    }

    #[test]
    fn morph_attenuates_left_to_right() {
        let fs = frames(1.0, 0.6);
        assert!(fs.first().unwrap().opacity < fs.last().unwrap().opacity);
        assert!(fs.first().unwrap().rotate_z.abs() >= fs.last().unwrap().rotate_z.abs());
    }

    #[test]
    fn anticipation_accelerates_entrances() {
        let cfg = ChoreographyConfig::default();
        let slow = choreograph(
            "staging",
            &TextControls {
                visibility: 0.4,
                ..TextControls::default()
            },
            &cfg,
        );
        let eager = choreograph(
            "staging",
            &TextControls {
                visibility: 0.4,
                anticipation: 1.0,
                ..TextControls::default()
            },
            &cfg,
        );
        let sum = |fs: &[CharacterFrame]| fs.iter().map(|f| f.opacity).sum::<f64>();
        assert!(sum(&eager) > sum(&slow));
    }

    #[test]
    fn blur_is_capped() {
        let cfg = ChoreographyConfig::default();
        let fs = choreograph(
            "staging",
            &TextControls {
                visibility: 0.2,
                morph_progress: 1.0,
                motion_blur: 100.0,
                ..TextControls::default()
            },
            &cfg,
        );
        for f in fs {
            assert!(f.blur <= cfg.blur_max);
        }
    }

    #[test]
    fn choreography_is_pure() {
        let a = frames(0.37, 0.21);
        let b = frames(0.37, 0.21);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.opacity, y.opacity);
            assert_eq!(x.translate, y.translate);
            assert_eq!(x.blur, y.blur);
        }
    }

    #[test]
    fn empty_text_yields_no_frames() {
        assert!(!frames(1.0, 0.0).is_empty());
        assert!(
            choreograph("", &TextControls::default(), &ChoreographyConfig::default()).is_empty()
        );
    }

    struct Recorder {
        applied: usize,
    }

    impl TextSurface for Recorder {
        fn apply(&mut self, frames: &[CharacterFrame]) {
            self.applied += frames.len();
        }
    }

    #[test]
    fn driver_suspends_at_steady_state_and_resumes_on_change() {
        let mut driver = TextDriver::new("hi", ChoreographyConfig::default()).unwrap();
        let mut surface = Recorder { applied: 0 };

        // Initial state is dirty once, then settles at visibility 0.
        assert!(driver.tick(&mut surface));
        assert!(!driver.tick(&mut surface));
        let after_settle = surface.applied;

        driver.set_controls(TextControls {
            visibility: 0.5,
            ..TextControls::default()
        });
        assert!(driver.needs_frame());
        // Mid-entrance is not steady: the loop keeps scheduling.
        assert!(driver.tick(&mut surface));
        assert!(driver.tick(&mut surface));
        assert!(surface.applied > after_settle);

        driver.set_controls(TextControls {
            visibility: 1.0,
            ..TextControls::default()
        });
        assert!(driver.tick(&mut surface));
        assert!(!driver.tick(&mut surface), "steady state suspends the loop");
    }

    #[test]
    fn driver_wakes_on_text_swap() {
        let mut driver = TextDriver::new("before", ChoreographyConfig::default()).unwrap();
        let mut surface = Recorder { applied: 0 };
        driver.set_controls(TextControls {
            visibility: 1.0,
            ..TextControls::default()
        });
        driver.tick(&mut surface);
        assert!(!driver.needs_frame());

        driver.set_text("after");
        assert!(driver.needs_frame());
    }
}
