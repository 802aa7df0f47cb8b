//! Per-frame hand pose classification.
//!
//! Pure distance-ratio geometry over a `LandmarkFrame`: a finger counts as
//! extended when its tip is farther from the wrist than the joint below it,
//! and the thumb is open when its tip is farther from the pinky knuckle than
//! its IP joint.  No state is kept between calls.

use super::landmarks::{HandLandmark, LandmarkFrame};

// ── Gesture labels ─────────────────────────────────────────

/// Unfiltered gesture label for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawGesture {
    /// No recognized pose, or no hand.
    None,
    /// Index finger extended, thumb and other fingers curled.
    IndexOnly,
    /// Index and middle extended and spread apart.
    VSign,
    /// Index and middle extended but held together.
    TwoFingerClose,
    /// All fingers and thumb curled.
    Fist,
    /// Thumb open and index extended with a visible gap between the tips.
    VolumePinch,
}

impl RawGesture {
    /// Wire name for events and status output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::IndexOnly => "INDEX_ONLY",
            Self::VSign => "V_SIGN",
            Self::TwoFingerClose => "TWO_FINGER_CLOSE",
            Self::Fist => "FIST",
            Self::VolumePinch => "VOLUME_PINCH",
        }
    }
}

// ── Config ─────────────────────────────────────────────────

/// Geometric thresholds for classification.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Minimum index/middle tip gap, relative to hand size, for a V-sign.
    pub v_sign_min_spread_ratio: f32,
    /// Minimum thumb-tip to index-tip distance for a volume pinch.
    pub pinch_noise_floor: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            v_sign_min_spread_ratio: 0.35,
            pinch_noise_floor: 0.025,
        }
    }
}

// ── Classification ─────────────────────────────────────────

/// Extension state of the five digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FingerState {
    thumb_open: bool,
    index: bool,
    middle: bool,
    ring: bool,
    pinky: bool,
}

impl FingerState {
    fn of(frame: &LandmarkFrame) -> Self {
        use HandLandmark::*;
        let extended = |tip: HandLandmark, lower: HandLandmark| {
            frame.distance(tip, Wrist) > frame.distance(lower, Wrist)
        };
        Self {
            thumb_open: frame.distance(ThumbTip, PinkyMcp) > frame.distance(ThumbIp, PinkyMcp),
            index: extended(IndexTip, IndexPip),
            middle: extended(MiddleTip, MiddlePip),
            ring: extended(RingTip, RingPip),
            pinky: extended(PinkyTip, PinkyPip),
        }
    }
}

/// Classify one frame.  A missing frame is always `RawGesture::None`.
///
/// Checks run in a fixed order; `IndexOnly` and `VolumePinch` share the
/// same finger pattern and are separated only by the thumb gate.
pub fn classify(frame: Option<&LandmarkFrame>, config: &ClassifierConfig) -> RawGesture {
    let Some(frame) = frame else {
        return RawGesture::None;
    };
    let f = FingerState::of(frame);
    let others_curled = !f.middle && !f.ring && !f.pinky;

    if f.index && !f.thumb_open && others_curled {
        return RawGesture::IndexOnly;
    }

    if f.index && f.middle && !f.ring && !f.pinky {
        let hand_size = frame.hand_size();
        let gap = frame.distance(HandLandmark::IndexTip, HandLandmark::MiddleTip);
        if hand_size > 0.0 && gap / hand_size >= config.v_sign_min_spread_ratio {
            return RawGesture::VSign;
        }
        return RawGesture::TwoFingerClose;
    }

    if !f.index && !f.middle && !f.ring && !f.pinky && !f.thumb_open {
        return RawGesture::Fist;
    }

    if f.thumb_open && f.index && others_curled {
        let pinch = frame.distance(HandLandmark::ThumbTip, HandLandmark::IndexTip);
        if pinch > config.pinch_noise_floor {
            return RawGesture::VolumePinch;
        }
    }

    RawGesture::None
}

// ── Test helpers ───────────────────────────────────────────


#[cfg(test)]
mod tests {
    use super::poses::*;
    use super::*;

    fn cfg() -> ClassifierConfig {
        ClassifierConfig::default()
    }

    #[test]
    fn test_no_hand_is_none() {
        assert_eq!(classify(None, &cfg()), RawGesture::None);
    }

    #[test]
    fn test_fist() {
        assert_eq!(classify(Some(&fist()), &cfg()), RawGesture::Fist);
    }

    #[test]
    fn test_index_only() {
        assert_eq!(classify(Some(&index_only()), &cfg()), RawGesture::IndexOnly);
    }

    #[test]
    fn test_v_sign() {
        assert_eq!(classify(Some(&v_sign()), &cfg()), RawGesture::VSign);
    }

    #[test]
    fn test_two_fingers_together() {
        assert_eq!(
            classify(Some(&two_finger_close()), &cfg()),
            RawGesture::TwoFingerClose
        );
    }

    #[test]
    fn test_spread_threshold_is_inclusive() {
        let frame = v_sign();
        let ratio = frame.distance(HandLandmark::IndexTip, HandLandmark::MiddleTip)
            / frame.hand_size();
        let config = ClassifierConfig {
            v_sign_min_spread_ratio: ratio,
            ..cfg()
        };
        assert_eq!(classify(Some(&frame), &config), RawGesture::VSign);

        let config = ClassifierConfig {
            v_sign_min_spread_ratio: ratio + 0.01,
            ..cfg()
        };
        assert_eq!(classify(Some(&frame), &config), RawGesture::TwoFingerClose);
    }

    #[test]
    fn test_volume_pinch_requires_open_thumb() {
        assert_eq!(
            classify(Some(&volume_pinch()), &cfg()),
            RawGesture::VolumePinch
        );
        // Same fingers with the thumb tucked is a swipe pose, never a pinch.
        assert_eq!(classify(Some(&index_only()), &cfg()), RawGesture::IndexOnly);
    }

    #[test]
    fn test_pinch_noise_floor() {
        let config = ClassifierConfig {
            pinch_noise_floor: 1.0,
            ..cfg()
        };
        assert_eq!(classify(Some(&volume_pinch()), &config), RawGesture::None);
    }

    #[test]
    fn test_open_palm_is_none() {
        assert_eq!(classify(Some(&open_palm()), &cfg()), RawGesture::None);
    }

    #[test]
    fn test_deterministic() {
        let frames = [fist(), index_only(), v_sign(), two_finger_close(), volume_pinch()];
        for frame in &frames {
            let first = classify(Some(frame), &cfg());
            for _ in 0..10 {
                assert_eq!(classify(Some(frame), &cfg()), first);
            }
        }
    }

    #[test]
    fn test_degenerate_hand_size_is_not_v_sign() {
        let mut pts: Vec<_> = v_sign().points().to_vec();
        // Collapse the middle knuckle onto the wrist.
        pts[HandLandmark::MiddleMcp.index()] = pts[HandLandmark::Wrist.index()];
        let frame = LandmarkFrame::from_points(pts).unwrap();
        assert_eq!(classify(Some(&frame), &cfg()), RawGesture::TwoFingerClose);
    }

    #[test]
    fn test_as_str() {
        assert_eq!(RawGesture::None.as_str(), "NONE");
        assert_eq!(RawGesture::IndexOnly.as_str(), "INDEX_ONLY");
        assert_eq!(RawGesture::VSign.as_str(), "V_SIGN");
        assert_eq!(RawGesture::VolumePinch.as_str(), "VOLUME_PINCH");
    }
}
