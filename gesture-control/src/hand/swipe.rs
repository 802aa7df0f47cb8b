//! Directional app-switch swipes driven by the index-only pose.
//!
//! Two debounce strategies live behind one `SwipeController`:
//!
//! - **Hold-to-arm** (default): hold the pose still until armed, then move
//!   the fingertip sideways past a displacement threshold.  One event per
//!   arm cycle.
//! - **Velocity**: a short rolling window of palm positions; fires when both
//!   displacement and speed exceed their minimums and the cooldown since
//!   the previous swipe has passed.
//!
//! Only one strategy runs per controller, so a swipe can never be reported
//! twice by both.

use std::collections::VecDeque;

use tracing::{debug, info};

use super::classifier::RawGesture;
use super::landmarks::{HandLandmark, LandmarkFrame};

// ── Types ──────────────────────────────────────────────────

/// Direction of an app-switch swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
}

impl SwipeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    fn from_dx(dx: f32) -> Self {
        if dx > 0.0 {
            Self::Right
        } else {
            Self::Left
        }
    }
}

/// Which debounce strategy a controller uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwipeStrategy {
    #[default]
    HoldToArm,
    Velocity,
}

impl SwipeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HoldToArm => "hold",
            Self::Velocity => "velocity",
        }
    }

    /// Parse a strategy name ("hold" or "velocity").
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hold" | "hold-to-arm" => Some(Self::HoldToArm),
            "velocity" => Some(Self::Velocity),
            _ => None,
        }
    }
}

/// A fired swipe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeEvent {
    pub direction: SwipeDirection,
    /// Horizontal displacement in normalized frame widths.
    pub dx: f32,
    /// Same displacement in camera pixels.
    pub dx_px: f32,
}

/// Result of one swipe tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SwipeOutput {
    /// Prompt for the HUD, if the controller has something to say.
    pub status_text: Option<String>,
    pub fired: Option<SwipeEvent>,
}

// ── Config ─────────────────────────────────────────────────

/// Thresholds for both swipe strategies.
#[derive(Debug, Clone)]
pub struct SwipeConfig {
    /// Seconds the pose must be held before the swipe is armed.
    pub arm_hold_s: f64,
    /// Fingertip displacement (frame widths) that fires an armed swipe.
    pub arm_min_distance: f32,
    /// Palm displacement (frame widths) for a velocity swipe.
    pub min_screen_ratio: f32,
    /// Palm speed (frame widths per second) for a velocity swipe.
    pub min_velocity: f32,
    /// Minimum seconds between velocity swipes.
    pub cooldown_s: f64,
    /// Samples kept in the velocity window.
    pub history_len: usize,
    /// Samples required before the velocity window is evaluated.
    pub min_samples: usize,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            arm_hold_s: 1.0,
            arm_min_distance: 0.15,
            min_screen_ratio: 0.20,
            min_velocity: 0.35,
            cooldown_s: 1.0,
            history_len: 6,
            min_samples: 4,
        }
    }
}

// ── Hold-to-arm ────────────────────────────────────────────

/// Arm-then-displace state.
#[derive(Debug, Clone, Default)]
struct ArmSwipe {
    hold_start: Option<f64>,
    armed: bool,
    start_x: Option<f32>,
    triggered: bool,
}

impl ArmSwipe {
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn update(&mut self, frame: &LandmarkFrame, now: f64, config: &SwipeConfig) -> SwipeOutput {
        // Fired: wait for the pose to be released before arming again.
        if self.triggered {
            return SwipeOutput::default();
        }

        let x = frame.point(HandLandmark::IndexTip).x;

        let start_x = match (self.armed, self.start_x) {
            (true, Some(start_x)) => start_x,
            _ => return self.arm(x, now, config),
        };

        let dx = x - start_x;
        if dx.abs() >= config.arm_min_distance {
            *self = Self {
                triggered: true,
                ..Self::default()
            };
            return SwipeOutput {
                status_text: None,
                fired: Some(SwipeEvent {
                    direction: SwipeDirection::from_dx(dx),
                    dx,
                    dx_px: 0.0,
                }),
            };
        }

        prompt("Swipe <- or ->")
    }

    fn arm(&mut self, x: f32, now: f64, config: &SwipeConfig) -> SwipeOutput {
        let Some(start) = self.hold_start else {
            self.hold_start = Some(now);
            return prompt("Hold index finger...");
        };

        let elapsed = now - start;
        if elapsed >= config.arm_hold_s {
            self.armed = true;
            self.start_x = Some(x);
            debug!("Swipe armed at x={:.3}", x);
            return prompt("Swipe <- or ->");
        }

        let pct = if config.arm_hold_s > 0.0 {
            (elapsed / config.arm_hold_s * 100.0) as u32
        } else {
            100
        };
        prompt(&format!("Hold {}%", pct.min(100)))
    }
}

// ── Velocity ───────────────────────────────────────────────

/// Rolling palm-position window plus cooldown.
#[derive(Debug, Clone, Default)]
struct VelocitySwipe {
    /// `(x, timestamp_s)` samples, oldest first.
    history: VecDeque<(f32, f64)>,
    last_fire_s: Option<f64>,
}

impl VelocitySwipe {
    /// Clear the window.  The cooldown survives a release.
    fn reset(&mut self) {
        self.history.clear();
    }

    fn update(&mut self, frame: &LandmarkFrame, now: f64, config: &SwipeConfig) -> SwipeOutput {
        self.history.push_back((frame.palm_center_x(), now));
        while self.history.len() > config.history_len.max(2) {
            self.history.pop_front();
        }
        if self.history.len() < config.min_samples.max(2) {
            return SwipeOutput::default();
        }

        let (Some(&(x0, t0)), Some(&(x1, t1))) = (self.history.front(), self.history.back()) else {
            return SwipeOutput::default();
        };
        let dx = x1 - x0;
        let dt = t1 - t0;
        let velocity = if dt > 0.0 { (dx as f64 / dt).abs() } else { 0.0 };

        if dx.abs() <= config.min_screen_ratio || velocity <= config.min_velocity as f64 {
            return SwipeOutput::default();
        }

        let cooled = self
            .last_fire_s
            .map_or(true, |last| now - last > config.cooldown_s);
        if !cooled {
            debug!("Swipe suppressed by cooldown (dx={:.3})", dx);
            return SwipeOutput::default();
        }

        self.last_fire_s = Some(now);
        self.history.clear();
        SwipeOutput {
            status_text: None,
            fired: Some(SwipeEvent {
                direction: SwipeDirection::from_dx(dx),
                dx,
                dx_px: 0.0,
            }),
        }
    }
}

// ── Controller ─────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Detector {
    HoldToArm(ArmSwipe),
    Velocity(VelocitySwipe),
}

/// Swipe detection behind a selectable strategy.
#[derive(Debug, Clone)]
pub struct SwipeController {
    pub config: SwipeConfig,
    detector: Detector,
}

impl SwipeController {
    pub fn new(strategy: SwipeStrategy, config: SwipeConfig) -> Self {
        let detector = match strategy {
            SwipeStrategy::HoldToArm => Detector::HoldToArm(ArmSwipe::default()),
            SwipeStrategy::Velocity => Detector::Velocity(VelocitySwipe::default()),
        };
        Self { config, detector }
    }

    pub fn strategy(&self) -> SwipeStrategy {
        match self.detector {
            Detector::HoldToArm(_) => SwipeStrategy::HoldToArm,
            Detector::Velocity(_) => SwipeStrategy::Velocity,
        }
    }

    /// Process one tick.
    ///
    /// Anything other than an index-only pose with a visible hand counts as
    /// a release and resets the controller without firing.
    pub fn update(
        &mut self,
        raw: RawGesture,
        frame: Option<&LandmarkFrame>,
        timestamp_s: f64,
        frame_width: u32,
    ) -> SwipeOutput {
        let frame = match frame {
            Some(f) if raw == RawGesture::IndexOnly => f,
            _ => {
                self.reset();
                return SwipeOutput::default();
            }
        };

        let mut out = match &mut self.detector {
            Detector::HoldToArm(arm) => arm.update(frame, timestamp_s, &self.config),
            Detector::Velocity(vel) => vel.update(frame, timestamp_s, &self.config),
        };

        if let Some(event) = out.fired.as_mut() {
            event.dx_px = event.dx * frame_width as f32;
            info!(
                "Swipe {} (dx={:.3}, {:.0}px)",
                event.direction.as_str(),
                event.dx,
                event.dx_px,
            );
        }
        out
    }

    /// Whether a hold-to-arm swipe is armed and waiting for displacement.
    pub fn is_armed(&self) -> bool {
        matches!(&self.detector, Detector::HoldToArm(arm) if arm.armed)
    }

    /// Drop any in-progress arm or velocity window.
    pub fn reset(&mut self) {
        match &mut self.detector {
            Detector::HoldToArm(arm) => arm.reset(),
            Detector::Velocity(vel) => vel.reset(),
        }
    }
}

fn prompt(text: &str) -> SwipeOutput {
    SwipeOutput {
        status_text: Some(text.to_string()),
        fired: None,
    }
}

#[cfg(test)]
mod tests {
    use super::super::classifier::poses;
    use super::*;

    const DT: f64 = 1.0 / 30.0;
    const WIDTH: u32 = 640;

    fn hold_ctl() -> SwipeController {
        SwipeController::new(SwipeStrategy::HoldToArm, SwipeConfig::default())
    }

    fn velocity_ctl() -> SwipeController {
        SwipeController::new(SwipeStrategy::Velocity, SwipeConfig::default())
    }

    fn tick(c: &mut SwipeController, shift: f32, t: f64) -> SwipeOutput {
        let frame = poses::index_only_at(shift);
        c.update(RawGesture::IndexOnly, Some(&frame), t, WIDTH)
    }

    /// Hold still at `shift` until armed; returns the next timestamp.
    fn arm(c: &mut SwipeController, shift: f32, t0: f64) -> f64 {
        let mut t = t0;
        while !c.is_armed() {
            let out = tick(c, shift, t);
            assert!(out.fired.is_none());
            t += DT;
            assert!(t < t0 + 5.0, "never armed");
        }
        t
    }

    #[test]
    fn test_default_strategy() {
        assert_eq!(SwipeStrategy::default(), SwipeStrategy::HoldToArm);
        assert_eq!(hold_ctl().strategy(), SwipeStrategy::HoldToArm);
        assert_eq!(velocity_ctl().strategy(), SwipeStrategy::Velocity);
    }

    #[test]
    fn test_arm_prompts() {
        let mut c = hold_ctl();
        assert_eq!(tick(&mut c, 0.0, 0.0).status_text.as_deref(), Some("Hold index finger..."));
        assert_eq!(tick(&mut c, 0.0, 0.5).status_text.as_deref(), Some("Hold 50%"));
        assert_eq!(tick(&mut c, 0.0, 1.0).status_text.as_deref(), Some("Swipe <- or ->"));
        assert!(c.is_armed());
    }

    #[test]
    fn test_swipe_right_fires_once() {
        let mut c = hold_ctl();
        let mut t = arm(&mut c, 0.0, 0.0);

        let out = tick(&mut c, 0.2, t);
        let event = out.fired.expect("swipe fired");
        assert_eq!(event.direction, SwipeDirection::Right);
        assert!((event.dx - 0.2).abs() < 1e-5);
        assert!((event.dx_px - 128.0).abs() < 0.01);

        // Holding or moving further does nothing until the pose is released.
        let mut fired = 0;
        for i in 0..90 {
            t += DT;
            if tick(&mut c, 0.2 + i as f32 * 0.01, t).fired.is_some() {
                fired += 1;
            }
        }
        assert_eq!(fired, 0);
        assert!(!c.is_armed());
    }

    #[test]
    fn test_release_rearms_after_fire() {
        let mut c = hold_ctl();
        let t = arm(&mut c, 0.0, 0.0);
        assert!(tick(&mut c, 0.2, t).fired.is_some());

        c.update(RawGesture::None, None, t + DT, WIDTH);
        let t = arm(&mut c, 0.2, t + 2.0 * DT);
        let event = tick(&mut c, 0.0, t).fired.expect("second swipe");
        assert_eq!(event.direction, SwipeDirection::Left);
    }

    #[test]
    fn test_swipe_left() {
        let mut c = hold_ctl();
        let t = arm(&mut c, 0.0, 0.0);
        let event = tick(&mut c, -0.16, t).fired.expect("swipe fired");
        assert_eq!(event.direction, SwipeDirection::Left);
        assert!(event.dx < 0.0);
    }

    #[test]
    fn test_small_displacement_does_not_fire() {
        let mut c = hold_ctl();
        let t = arm(&mut c, 0.0, 0.0);
        let out = tick(&mut c, 0.1, t);
        assert!(out.fired.is_none());
        assert!(c.is_armed());
    }

    #[test]
    fn test_release_before_displacement_resets() {
        let mut c = hold_ctl();
        let t = arm(&mut c, 0.0, 0.0);
        let frame = poses::fist();
        let out = c.update(RawGesture::Fist, Some(&frame), t, WIDTH);
        assert_eq!(out, SwipeOutput::default());
        assert!(!c.is_armed());

        // Moving after re-forming the pose must not fire without a new arm.
        let out = tick(&mut c, 0.3, t + DT);
        assert!(out.fired.is_none());
    }

    #[test]
    fn test_no_hand_resets() {
        let mut c = hold_ctl();
        let t = arm(&mut c, 0.0, 0.0);
        c.update(RawGesture::IndexOnly, None, t, WIDTH);
        assert!(!c.is_armed());
    }

    /// Sweep the palm from `from` to `to` over `ticks` frames.
    fn sweep(c: &mut SwipeController, from: f32, to: f32, ticks: usize, t0: f64) -> Vec<SwipeEvent> {
        let mut events = Vec::new();
        for i in 0..ticks {
            let shift = from + (to - from) * i as f32 / (ticks - 1) as f32;
            if let Some(e) = tick(c, shift, t0 + i as f64 * DT).fired {
                events.push(e);
            }
        }
        events
    }

    #[test]
    fn test_velocity_fast_swing_fires() {
        let mut c = velocity_ctl();
        let events = sweep(&mut c, 0.0, 0.3, 6, 0.0);
        assert_eq!(events.len(), 1, "got {:?}", events);
        assert_eq!(events[0].direction, SwipeDirection::Right);
    }

    #[test]
    fn test_velocity_slow_drift_does_not_fire() {
        let mut c = velocity_ctl();
        // 0.3 over 3 seconds: displacement per window stays tiny.
        let events = sweep(&mut c, 0.0, 0.3, 90, 0.0);
        assert!(events.is_empty(), "got {:?}", events);
    }

    #[test]
    fn test_velocity_needs_min_samples() {
        let mut c = velocity_ctl();
        assert!(tick(&mut c, 0.0, 0.0).fired.is_none());
        assert!(tick(&mut c, 0.3, DT).fired.is_none());
        assert!(tick(&mut c, 0.3, 2.0 * DT).fired.is_none());
        assert!(tick(&mut c, 0.3, 3.0 * DT).fired.is_some());
    }

    #[test]
    fn test_velocity_cooldown() {
        let mut c = velocity_ctl();
        assert_eq!(sweep(&mut c, 0.0, 0.3, 6, 0.0).len(), 1);
        // Swing back immediately: blocked by cooldown.
        assert!(sweep(&mut c, 0.3, -0.1, 6, 6.0 * DT).is_empty());
        // After the cooldown it fires again.
        let events = sweep(&mut c, 0.3, -0.1, 6, 2.0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].direction, SwipeDirection::Left);
    }

    #[test]
    fn test_velocity_release_clears_history() {
        let mut c = velocity_ctl();
        tick(&mut c, 0.0, 0.0);
        tick(&mut c, 0.0, DT);
        tick(&mut c, 0.0, 2.0 * DT);
        c.update(RawGesture::None, None, 3.0 * DT, WIDTH);
        // Fresh window: three samples are not enough to evaluate.
        assert!(tick(&mut c, 0.4, 4.0 * DT).fired.is_none());
        assert!(tick(&mut c, 0.4, 5.0 * DT).fired.is_none());
        assert!(tick(&mut c, 0.4, 6.0 * DT).fired.is_none());
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!(SwipeStrategy::parse("hold"), Some(SwipeStrategy::HoldToArm));
        assert_eq!(SwipeStrategy::parse("velocity"), Some(SwipeStrategy::Velocity));
        assert_eq!(SwipeStrategy::parse("fling"), None);
        assert_eq!(SwipeStrategy::Velocity.as_str(), "velocity");
    }

    #[test]
    fn test_direction_as_str() {
        assert_eq!(SwipeDirection::Left.as_str(), "left");
        assert_eq!(SwipeDirection::Right.as_str(), "right");
    }
}
