use crate::error::{CinescrollError, CinescrollResult};

/// Advisory fidelity tier. Rendering code reads this to decide whether to
/// compute expensive per-frame effects (backdrop blur, parallax, per-character
/// blur); it never changes staging metric values, only their rendering cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum PerformanceMode {
    Low,
    Medium,
    High,
}

/// Coarse capability hint supplied once at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DeviceTier {
    #[default]
    Standard,
    /// Caps the classifier at `Medium` so constrained devices never attempt
    /// full-fidelity effects, even at rest.
    Constrained,
}

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct PerfThresholds {
    /// |velocity| below this (units/ms) is full fidelity.
    pub low_velocity: f64,
    /// |velocity| above this sheds parallax and blur work.
    pub high_velocity: f64,
}

impl Default for PerfThresholds {
    fn default() -> Self {
        Self {
            low_velocity: 0.4,
            high_velocity: 1.6,
        }
    }
}

impl PerfThresholds {
    pub fn validate(&self) -> CinescrollResult<()> {
        if !(self.low_velocity > 0.0) || !self.low_velocity.is_finite() {
            return Err(CinescrollError::validation(
                "low_velocity must be finite and > 0",
            ));
        }
        if !(self.high_velocity > self.low_velocity) || !self.high_velocity.is_finite() {
            return Err(CinescrollError::validation(
                "high_velocity must be finite and > low_velocity",
            ));
        }
        Ok(())
    }
}

/// Stateless velocity → mode threshold function. Hysteresis belongs upstream
/// in the signal smoother, never here.
#[derive(Clone, Copy, Debug)]
pub struct PerfClassifier {
    thresholds: PerfThresholds,
    tier: DeviceTier,
}

impl PerfClassifier {
    pub fn new(thresholds: PerfThresholds, tier: DeviceTier) -> CinescrollResult<Self> {
        thresholds.validate()?;
        Ok(Self { thresholds, tier })
    }

    pub fn classify(&self, velocity: f64) -> PerformanceMode {
        let speed = velocity.abs();
        let mode = if !speed.is_finite() || speed > self.thresholds.high_velocity {
            PerformanceMode::Low
        } else if speed < self.thresholds.low_velocity {
            PerformanceMode::High
        } else {
            PerformanceMode::Medium
        };

        match self.tier {
            DeviceTier::Standard => mode,
            DeviceTier::Constrained => mode.min(PerformanceMode::Medium),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier(tier: DeviceTier) -> PerfClassifier {
        PerfClassifier::new(PerfThresholds::default(), tier).unwrap()
    }

    #[test]
    fn rest_is_high_fidelity() {
        assert_eq!(
            classifier(DeviceTier::Standard).classify(0.0),
            PerformanceMode::High
        );
    }

    #[test]
    fn fast_scroll_sheds_work() {
        let c = classifier(DeviceTier::Standard);
        assert_eq!(c.classify(5.0), PerformanceMode::Low);
        assert_eq!(c.classify(-5.0), PerformanceMode::Low);
    }

    #[test]
    fn band_between_thresholds_is_medium() {
        assert_eq!(
            classifier(DeviceTier::Standard).classify(1.0),
            PerformanceMode::Medium
        );
    }

    #[test]
    fn classification_is_monotone_in_speed() {
        let c = classifier(DeviceTier::Standard);
        let mut prev = PerformanceMode::High;
        for i in 0..200 {
            let mode = c.classify(i as f64 * 0.02);
            assert!(mode <= prev, "mode rose as speed increased");
            prev = mode;
        }
    }

    #[test]
    fn constrained_tier_caps_at_medium() {
        let c = classifier(DeviceTier::Constrained);
        assert_eq!(c.classify(0.0), PerformanceMode::Medium);
        assert_eq!(c.classify(5.0), PerformanceMode::Low);
    }

    #[test]
    fn thresholds_must_be_ordered() {
        let bad = PerfThresholds {
            low_velocity: 2.0,
            high_velocity: 1.0,
        };
        assert!(PerfClassifier::new(bad, DeviceTier::Standard).is_err());
    }

    #[test]
    fn non_finite_velocity_degrades_instead_of_poisoning() {
        let c = classifier(DeviceTier::Standard);
        assert_eq!(c.classify(f64::NAN), PerformanceMode::Low);
        assert_eq!(c.classify(f64::INFINITY), PerformanceMode::Low);
    }
}
