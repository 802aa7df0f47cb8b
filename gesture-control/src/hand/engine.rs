//! Gesture engine.  Turns stabilized gestures into mode toggles, the
//! one-shot lock and continuous volume.
//!
//! Priority per tick (first match wins):
//! 1. V-sign owns the mode toggle.  It clears any fist hold, and a full
//!    hold flips the mode once per continuous hold.
//! 2. With the mode off nothing else has an effect.
//! 3. Fist held for the lock time fires `Lock` once per hold.
//! 4. Volume pinch maps the thumb/index spread onto 0-100 every tick.
//!
//! All timers are wall-clock (`timestamp_s`), so dropped frames shorten an
//! observed hold but never extend it.

use tracing::{debug, info};

use super::classifier::RawGesture;
use super::landmarks::{HandLandmark, LandmarkFrame};
use super::smoother::StableGesture;
use crate::action::Action;
use crate::ipc::sexp::sexp_bool;

// ── Config ─────────────────────────────────────────────────

/// Timing and mapping constants for the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Seconds a V-sign must be held to toggle the mode.
    pub hold_time_v_s: f64,
    /// Seconds a fist must be held to lock the workstation.
    pub hold_time_lock_s: f64,
    /// Pinch ratio mapped to 0% volume.
    pub volume_min_ratio: f32,
    /// Pinch ratio mapped to 100% volume.
    pub volume_max_ratio: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hold_time_v_s: 1.0,
            hold_time_lock_s: 1.0,
            volume_min_ratio: 0.18,
            volume_max_ratio: 1.25,
        }
    }
}

// ── Output ─────────────────────────────────────────────────

/// What the engine did on a tick, for status display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// Nothing in progress.
    Idle,
    /// Mode is off; only the V-sign is listened to.
    Gated,
    /// V-sign hold in progress.
    ModeHold,
    /// V-sign hold completed; waiting for release.
    ModeToggled,
    /// Fist hold in progress.
    LockHold,
    /// Lock fired; waiting for release.
    Locked,
    /// Volume pinch is driving the level.
    Volume,
}

/// Result of one engine tick.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOutput {
    /// Progress of the active hold, 0.0-1.0.  UI feedback only.
    pub hold_progress: f32,
    /// Volume percent set this tick, if the pinch is active.
    pub volume_percent: Option<u8>,
    /// Actions to hand to the dispatcher, in order.
    pub actions: Vec<Action>,
    pub status: EngineStatus,
}

impl EngineOutput {
    fn idle(status: EngineStatus) -> Self {
        Self {
            hold_progress: 0.0,
            volume_percent: None,
            actions: Vec::new(),
            status,
        }
    }
}

// ── Engine ─────────────────────────────────────────────────

/// Hold-to-trigger state machine.
#[derive(Debug)]
pub struct GestureEngine {
    pub config: EngineConfig,
    mode_active: bool,
    v_hold_start: Option<f64>,
    v_triggered: bool,
    fist_hold_start: Option<f64>,
    fist_triggered: bool,
}

impl GestureEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            mode_active: false,
            v_hold_start: None,
            v_triggered: false,
            fist_hold_start: None,
            fist_triggered: false,
        }
    }

    /// Whether gesture mode is on.
    pub fn mode_active(&self) -> bool {
        self.mode_active
    }

    /// Force the mode from outside the gesture path.  Clears any fist hold.
    pub fn set_mode_active(&mut self, active: bool) {
        if self.mode_active != active {
            info!("Gesture mode set externally: {}", active);
        }
        self.mode_active = active;
        self.reset_fist();
    }

    /// Process one stabilized label.
    pub fn update(
        &mut self,
        stable: StableGesture,
        frame: Option<&LandmarkFrame>,
        timestamp_s: f64,
    ) -> EngineOutput {
        if stable.is(RawGesture::VSign) {
            return self.update_v_sign(timestamp_s);
        }

        // V-sign released: re-arm for the next hold.
        self.v_hold_start = None;
        self.v_triggered = false;

        if !self.mode_active {
            self.reset_fist();
            return EngineOutput::idle(EngineStatus::Gated);
        }

        if stable.is(RawGesture::Fist) {
            return self.update_fist(timestamp_s);
        }
        self.reset_fist();

        if stable.is(RawGesture::VolumePinch) {
            if let Some(percent) = frame.and_then(|f| self.volume_percent(f)) {
                return EngineOutput {
                    hold_progress: 0.0,
                    volume_percent: Some(percent),
                    actions: vec![Action::SetVolume(percent)],
                    status: EngineStatus::Volume,
                };
            }
        }

        EngineOutput::idle(EngineStatus::Idle)
    }

    fn update_v_sign(&mut self, now: f64) -> EngineOutput {
        // V-sign always preempts a fist hold.
        self.reset_fist();

        if self.v_triggered {
            return EngineOutput {
                hold_progress: 1.0,
                volume_percent: None,
                actions: Vec::new(),
                status: EngineStatus::ModeToggled,
            };
        }

        let start = *self.v_hold_start.get_or_insert_with(|| {
            debug!("V-sign hold started at {:.3}", now);
            now
        });
        let elapsed = now - start;
        let mut actions = Vec::new();
        let mut status = EngineStatus::ModeHold;

        if elapsed >= self.config.hold_time_v_s {
            self.mode_active = !self.mode_active;
            self.v_triggered = true;
            info!("Gesture mode {}", if self.mode_active { "enabled" } else { "disabled" });
            actions.push(Action::SetMode(self.mode_active));
            status = EngineStatus::ModeToggled;
        }

        EngineOutput {
            hold_progress: progress(elapsed, self.config.hold_time_v_s),
            volume_percent: None,
            actions,
            status,
        }
    }

    fn update_fist(&mut self, now: f64) -> EngineOutput {
        if self.fist_triggered {
            return EngineOutput {
                hold_progress: 1.0,
                volume_percent: None,
                actions: Vec::new(),
                status: EngineStatus::Locked,
            };
        }

        let start = *self.fist_hold_start.get_or_insert_with(|| {
            debug!("Fist hold started at {:.3}", now);
            now
        });
        let elapsed = now - start;
        let mut actions = Vec::new();
        let mut status = EngineStatus::LockHold;

        if elapsed >= self.config.hold_time_lock_s {
            // One-shot: the flag is set whether or not the lock succeeds.
            self.fist_triggered = true;
            info!("Fist held {:.2}s, locking", elapsed);
            actions.push(Action::Lock);
            status = EngineStatus::Locked;
        }

        EngineOutput {
            hold_progress: progress(elapsed, self.config.hold_time_lock_s),
            volume_percent: None,
            actions,
            status,
        }
    }

    /// Volume percent for the current pinch, or `None` for a degenerate hand.
    fn volume_percent(&self, frame: &LandmarkFrame) -> Option<u8> {
        let hand_size = frame.hand_size();
        if hand_size <= 0.0 {
            return None;
        }
        let ratio = frame.distance(HandLandmark::ThumbTip, HandLandmark::IndexTip) / hand_size;
        let level = volume_level(ratio, self.config.volume_min_ratio, self.config.volume_max_ratio);
        Some((level * 100.0).round() as u8)
    }

    fn reset_fist(&mut self) {
        self.fist_hold_start = None;
        self.fist_triggered = false;
    }

    /// Reset all hold state.  The mode itself is kept.
    pub fn reset(&mut self) {
        self.v_hold_start = None;
        self.v_triggered = false;
        self.reset_fist();
    }

    /// Generate s-expression for IPC status.
    pub fn status_sexp(&self, timestamp_s: f64) -> String {
        let held = |start: Option<f64>| start.map(|s| (timestamp_s - s).max(0.0)).unwrap_or(0.0);
        format!(
            "(:mode-active {} :v-hold-s {:.2} :v-triggered {} :fist-hold-s {:.2} :fist-triggered {})",
            sexp_bool(self.mode_active),
            held(self.v_hold_start),
            sexp_bool(self.v_triggered),
            held(self.fist_hold_start),
            sexp_bool(self.fist_triggered),
        )
    }
}

/// Map a pinch ratio linearly from `[min, max]` onto `[0, 1]`, clamped.
pub fn volume_level(ratio: f32, min: f32, max: f32) -> f32 {
    if max <= min {
        return if ratio >= max { 1.0 } else { 0.0 };
    }
    ((ratio - min) / (max - min)).clamp(0.0, 1.0)
}

/// Hold fraction clamped to 0.0-1.0.
fn progress(elapsed: f64, hold: f64) -> f32 {
    if hold <= 0.0 {
        return 1.0;
    }
    (elapsed / hold).clamp(0.0, 1.0) as f32
}
