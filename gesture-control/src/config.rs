//! Pipeline configuration: defaults, plist loading, validation.
//!
//! A config file is a single s-expression plist; keys left out keep their
//! defaults and unknown keys are ignored:
//!
//! ```text
//! (:hold-time-v 1.5 :hold-time-lock 2.0 :gesture-buffer-size 8
//!  :swipe-strategy :velocity :start-active t)
//! ```
//!
//! Configuration is read once at start-up; there is no hot reload.

use lexpr::Value;
use thiserror::Error;

use crate::hand::classifier::ClassifierConfig;
use crate::hand::engine::EngineConfig;
use crate::hand::swipe::{SwipeConfig, SwipeStrategy};
use crate::ipc::sexp::{find_value, get_bool, get_float, get_int, get_keyword, sexp_bool};

/// Errors from loading or validating a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("malformed config s-expression: {0}")]
    Parse(#[from] lexpr::parse::Error),

    #[error("invalid value for :{key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Complete configuration for one pipeline instance.
#[derive(Debug, Clone)]
pub struct GestureConfig {
    pub classifier: ClassifierConfig,
    pub engine: EngineConfig,
    pub swipe: SwipeConfig,
    pub swipe_strategy: SwipeStrategy,
    /// Smoothing window in frames.
    pub smoothing_window: usize,
    /// Start with gesture mode already on.
    pub start_active: bool,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            engine: EngineConfig::default(),
            swipe: SwipeConfig::default(),
            swipe_strategy: SwipeStrategy::default(),
            smoothing_window: 8,
            start_active: false,
        }
    }
}

impl GestureConfig {
    /// Parse a plist over the defaults and validate the result.
    pub fn from_sexp(raw: &str) -> Result<Self, ConfigError> {
        let value = lexpr::from_str(raw)?;
        let mut config = Self::default();
        config.apply(&value)?;
        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, v: &Value) -> Result<(), ConfigError> {
        if let Some(x) = get_float(v, "hold-time-v") {
            self.engine.hold_time_v_s = x;
        }
        if let Some(x) = get_float(v, "hold-time-lock") {
            self.engine.hold_time_lock_s = x;
        }
        if let Some(x) = get_float(v, "volume-min-ratio") {
            self.engine.volume_min_ratio = x as f32;
        }
        if let Some(x) = get_float(v, "volume-max-ratio") {
            self.engine.volume_max_ratio = x as f32;
        }
        if let Some(x) = get_float(v, "v-sign-min-spread-ratio") {
            self.classifier.v_sign_min_spread_ratio = x as f32;
        }
        if let Some(x) = get_float(v, "pinch-noise-floor") {
            self.classifier.pinch_noise_floor = x as f32;
        }
        if let Some(n) = count_value(v, "gesture-buffer-size")? {
            self.smoothing_window = n;
        }
        if let Some(x) = get_float(v, "swipe-arm-hold") {
            self.swipe.arm_hold_s = x;
        }
        if let Some(x) = get_float(v, "swipe-arm-distance") {
            self.swipe.arm_min_distance = x as f32;
        }
        if let Some(x) = get_float(v, "swipe-min-screen-ratio") {
            self.swipe.min_screen_ratio = x as f32;
        }
        if let Some(x) = get_float(v, "swipe-min-velocity") {
            self.swipe.min_velocity = x as f32;
        }
        if let Some(x) = get_float(v, "swipe-cooldown-time") {
            self.swipe.cooldown_s = x;
        }
        if let Some(n) = count_value(v, "swipe-history")? {
            self.swipe.history_len = n;
        }
        if let Some(name) = get_keyword(v, "swipe-strategy") {
            self.swipe_strategy =
                SwipeStrategy::parse(&name).ok_or_else(|| ConfigError::Invalid {
                    key: "swipe-strategy",
                    reason: format!("unknown strategy {:?}", name),
                })?;
        }
        if let Some(b) = get_bool(v, "start-active") {
            self.start_active = b;
        }
        Ok(())
    }

    /// Check ranges that would make the pipeline misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("hold-time-v", self.engine.hold_time_v_s)?;
        non_negative("hold-time-lock", self.engine.hold_time_lock_s)?;
        non_negative("swipe-arm-hold", self.swipe.arm_hold_s)?;
        non_negative("swipe-cooldown-time", self.swipe.cooldown_s)?;
        non_negative("pinch-noise-floor", self.classifier.pinch_noise_floor as f64)?;
        non_negative("v-sign-min-spread-ratio", self.classifier.v_sign_min_spread_ratio as f64)?;
        non_negative("swipe-arm-distance", self.swipe.arm_min_distance as f64)?;
        non_negative("swipe-min-screen-ratio", self.swipe.min_screen_ratio as f64)?;
        non_negative("swipe-min-velocity", self.swipe.min_velocity as f64)?;
        if self.engine.volume_min_ratio >= self.engine.volume_max_ratio {
            return Err(ConfigError::Invalid {
                key: "volume-min-ratio",
                reason: format!(
                    "{} must be below :volume-max-ratio {}",
                    self.engine.volume_min_ratio, self.engine.volume_max_ratio
                ),
            });
        }
        if self.swipe.history_len < self.swipe.min_samples {
            return Err(ConfigError::Invalid {
                key: "swipe-history",
                reason: format!(
                    "{} samples cannot reach the {} needed for a velocity swipe",
                    self.swipe.history_len, self.swipe.min_samples
                ),
            });
        }
        if self.smoothing_window == 0 {
            return Err(ConfigError::Invalid {
                key: "gesture-buffer-size",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Generate s-expression for IPC config.
    pub fn config_sexp(&self) -> String {
        format!(
            "(:hold-time-v {:.2} :hold-time-lock {:.2} :volume-min-ratio {:.2} :volume-max-ratio {:.2} :v-sign-min-spread-ratio {:.2} :pinch-noise-floor {:.3} :gesture-buffer-size {} :swipe-strategy :{} :swipe-arm-hold {:.2} :swipe-arm-distance {:.2} :swipe-min-screen-ratio {:.2} :swipe-min-velocity {:.2} :swipe-cooldown-time {:.2} :start-active {})",
            self.engine.hold_time_v_s,
            self.engine.hold_time_lock_s,
            self.engine.volume_min_ratio,
            self.engine.volume_max_ratio,
            self.classifier.v_sign_min_spread_ratio,
            self.classifier.pinch_noise_floor,
            self.smoothing_window,
            self.swipe_strategy.as_str(),
            self.swipe.arm_hold_s,
            self.swipe.arm_min_distance,
            self.swipe.min_screen_ratio,
            self.swipe.min_velocity,
            self.swipe.cooldown_s,
            sexp_bool(self.start_active),
        )
    }
}

fn non_negative(key: &'static str, x: f64) -> Result<(), ConfigError> {
    if x.is_finite() && x >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            key,
            reason: format!("{} must be a non-negative number", x),
        })
    }
}

/// A present key must hold a positive integer.
fn count_value(v: &Value, key: &'static str) -> Result<Option<usize>, ConfigError> {
    let Some(raw) = find_value(v, key) else {
        return Ok(None);
    };
    match get_int(v, key) {
        Some(n) if n >= 1 => Ok(Some(n as usize)),
        _ => Err(ConfigError::Invalid {
            key,
            reason: format!("{} must be an integer of at least 1", raw),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = GestureConfig::default();
        assert_eq!(c.engine.hold_time_v_s, 1.0);
        assert_eq!(c.engine.hold_time_lock_s, 1.0);
        assert_eq!(c.engine.volume_min_ratio, 0.18);
        assert_eq!(c.engine.volume_max_ratio, 1.25);
        assert_eq!(c.classifier.v_sign_min_spread_ratio, 0.35);
        assert_eq!(c.classifier.pinch_noise_floor, 0.025);
        assert_eq!(c.smoothing_window, 8);
        assert_eq!(c.swipe.min_screen_ratio, 0.20);
        assert_eq!(c.swipe.min_velocity, 0.35);
        assert_eq!(c.swipe.cooldown_s, 1.0);
        assert_eq!(c.swipe_strategy, SwipeStrategy::HoldToArm);
        assert!(!c.start_active);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_from_sexp_overrides() {
        let c = GestureConfig::from_sexp(
            "(:hold-time-v 1.5 :gesture-buffer-size 5 :swipe-strategy :velocity :start-active t)",
        )
        .unwrap();
        assert_eq!(c.engine.hold_time_v_s, 1.5);
        assert_eq!(c.smoothing_window, 5);
        assert_eq!(c.swipe_strategy, SwipeStrategy::Velocity);
        assert!(c.start_active);
        // Untouched keys keep defaults.
        assert_eq!(c.engine.hold_time_lock_s, 1.0);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let c = GestureConfig::from_sexp("(:camera-index 2 :hold-time-lock 2.0)").unwrap();
        assert_eq!(c.engine.hold_time_lock_s, 2.0);
    }

    #[test]
    fn test_empty_plist() {
        let c = GestureConfig::from_sexp("()").unwrap();
        assert_eq!(c.smoothing_window, 8);
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(
            GestureConfig::from_sexp("(:hold-time-v"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            GestureConfig::from_sexp("(:gesture-buffer-size 0)"),
            Err(ConfigError::Invalid { key: "gesture-buffer-size", .. })
        ));
        assert!(matches!(
            GestureConfig::from_sexp("(:hold-time-lock -1.0)"),
            Err(ConfigError::Invalid { key: "hold-time-lock", .. })
        ));
        assert!(matches!(
            GestureConfig::from_sexp("(:volume-min-ratio 2.0)"),
            Err(ConfigError::Invalid { key: "volume-min-ratio", .. })
        ));
        assert!(matches!(
            GestureConfig::from_sexp("(:swipe-strategy :fling)"),
            Err(ConfigError::Invalid { key: "swipe-strategy", .. })
        ));
    }

    #[test]
    fn test_swipe_history_must_cover_min_samples() {
        assert!(matches!(
            GestureConfig::from_sexp("(:swipe-history 3 :swipe-strategy :velocity)"),
            Err(ConfigError::Invalid { key: "swipe-history", .. })
        ));
        let c = GestureConfig::from_sexp("(:swipe-history 4)").unwrap();
        assert_eq!(c.swipe.history_len, 4);
    }

    #[test]
    fn test_fractional_count_rejected() {
        assert!(matches!(
            GestureConfig::from_sexp("(:gesture-buffer-size 8.0)"),
            Err(ConfigError::Invalid { key: "gesture-buffer-size", .. })
        ));
        assert!(matches!(
            GestureConfig::from_sexp("(:swipe-history :six)"),
            Err(ConfigError::Invalid { key: "swipe-history", .. })
        ));
    }

    #[test]
    fn test_config_sexp() {
        let sexp = GestureConfig::default().config_sexp();
        assert!(sexp.contains(":hold-time-v 1.00"));
        assert!(sexp.contains(":gesture-buffer-size 8"));
        assert!(sexp.contains(":swipe-strategy :hold"));
        assert!(sexp.contains(":start-active nil"));
    }

    #[test]
    fn test_config_sexp_reparses() {
        let first = GestureConfig::from_sexp("(:swipe-strategy :velocity :hold-time-v 2.5)").unwrap();
        let again = GestureConfig::from_sexp(&first.config_sexp()).unwrap();
        assert_eq!(again.swipe_strategy, SwipeStrategy::Velocity);
        assert_eq!(again.engine.hold_time_v_s, 2.5);
    }
}
