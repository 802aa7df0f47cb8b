//! One-tick pipeline: classify → smooth → engine / swipe → dispatch.
//!
//! Data flows strictly forward.  The pipeline owns every piece of gesture
//! state plus the injected dispatcher, so independent instances never share
//! anything.

use tracing::{debug, warn};

use crate::action::{Action, ActionDispatcher};
use crate::config::GestureConfig;
use crate::hand::classifier::{classify, ClassifierConfig, RawGesture};
use crate::hand::engine::{EngineStatus, GestureEngine};
use crate::hand::landmarks::LandmarkFrame;
use crate::hand::smoother::{GestureSmoother, StableGesture};
use crate::hand::swipe::{SwipeController, SwipeEvent};
use crate::ipc::sexp::{escape_string, format_event, sexp_bool};

// ── Frame rate ─────────────────────────────────────────────

/// Ticks per second, recomputed once per elapsed second.
#[derive(Debug, Clone, Default)]
pub struct FrameRate {
    window_start_s: Option<f64>,
    frames: u32,
    fps: f32,
}

impl FrameRate {
    pub fn record(&mut self, timestamp_s: f64) {
        let Some(start) = self.window_start_s else {
            self.window_start_s = Some(timestamp_s);
            return;
        };
        self.frames += 1;
        let elapsed = timestamp_s - start;
        if elapsed >= 1.0 {
            self.fps = (self.frames as f64 / elapsed) as f32;
            self.frames = 0;
            self.window_start_s = Some(timestamp_s);
        }
    }

    /// Last computed rate, 0.0 until a full second has been observed.
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

// ── Report ─────────────────────────────────────────────────

/// Everything observable about one tick.  Informational only; nothing
/// here is read back by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub raw: RawGesture,
    pub stable: StableGesture,
    pub mode_active: bool,
    pub hold_progress: f32,
    pub volume_percent: Option<u8>,
    pub swipe: Option<SwipeEvent>,
    /// HUD line for an overlay.
    pub status_text: String,
    /// Stabilized gesture, when it changed since the last reported one.
    pub gesture_changed: Option<StableGesture>,
    /// Actions sent to the dispatcher this tick, in order.
    pub actions: Vec<Action>,
}

impl TickReport {
    /// Per-tick status event for an overlay.
    pub fn status_sexp(&self) -> String {
        format_event(
            "status",
            &[
                ("text", &format!("\"{}\"", escape_string(&self.status_text))),
                ("progress", &format!("{:.2}", self.hold_progress)),
                ("gesture", &format!(":{}", self.stable.as_str())),
                ("mode-active", sexp_bool(self.mode_active)),
            ],
        )
    }
}

// ── Pipeline ───────────────────────────────────────────────

/// The whole gesture core for a single hand.
pub struct Pipeline<D: ActionDispatcher> {
    classifier: ClassifierConfig,
    smoother: GestureSmoother,
    engine: GestureEngine,
    swipe: SwipeController,
    dispatcher: D,
    frame_rate: FrameRate,
    last_reported: Option<StableGesture>,
    dispatch_failures: u64,
}

impl<D: ActionDispatcher> Pipeline<D> {
    pub fn new(config: GestureConfig, dispatcher: D) -> Self {
        let mut engine = GestureEngine::new(config.engine);
        engine.set_mode_active(config.start_active);
        Self {
            classifier: config.classifier,
            smoother: GestureSmoother::new(config.smoothing_window),
            engine,
            swipe: SwipeController::new(config.swipe_strategy, config.swipe),
            dispatcher,
            frame_rate: FrameRate::default(),
            last_reported: None,
            dispatch_failures: 0,
        }
    }

    /// Run one tick.  `frame` is `None` when no hand is visible.
    pub fn tick(
        &mut self,
        frame: Option<&LandmarkFrame>,
        timestamp_s: f64,
        frame_width: u32,
    ) -> TickReport {
        self.frame_rate.record(timestamp_s);

        let raw = classify(frame, &self.classifier);
        let stable = self.smoother.smooth(raw);

        let engine_out = self.engine.update(stable, frame, timestamp_s);
        let mut actions = engine_out.actions;

        let swipe_out = if self.engine.mode_active() {
            self.swipe.update(raw, frame, timestamp_s, frame_width)
        } else {
            self.swipe.reset();
            Default::default()
        };
        if let Some(event) = swipe_out.fired {
            actions.push(Action::SwitchApp(event.direction));
        }

        for action in &actions {
            self.dispatch(*action);
        }

        let gesture_changed = self.track_change(stable);
        let status_text = hud_text(
            self.engine.mode_active(),
            stable,
            engine_out.status,
            engine_out.hold_progress,
            swipe_out.status_text.as_deref(),
        );

        TickReport {
            raw,
            stable,
            mode_active: self.engine.mode_active(),
            hold_progress: engine_out.hold_progress,
            volume_percent: engine_out.volume_percent,
            swipe: swipe_out.fired,
            status_text,
            gesture_changed,
            actions,
        }
    }

    /// Best-effort dispatch.  Failures are logged and never retried.
    fn dispatch(&mut self, action: Action) {
        if let Err(e) = action.dispatch(&mut self.dispatcher) {
            self.dispatch_failures += 1;
            warn!("{} action failed: {}", action.as_str(), e);
        }
    }

    /// Report a new stabilized gesture once; warm-up, NONE and
    /// TRANSITIONING are not worth an event.
    fn track_change(&mut self, stable: StableGesture) -> Option<StableGesture> {
        if matches!(
            stable,
            StableGesture::Stabilizing
                | StableGesture::Transitioning
                | StableGesture::Gesture(RawGesture::None)
        ) {
            return None;
        }
        if self.last_reported == Some(stable) {
            return None;
        }
        debug!("Stable gesture: {}", stable.as_str());
        self.last_reported = Some(stable);
        Some(stable)
    }

    /// Switch gesture mode from outside (e.g. a voice command).
    pub fn set_mode_active(&mut self, active: bool) {
        self.engine.set_mode_active(active);
        if !active {
            self.swipe.reset();
        }
    }

    pub fn mode_active(&self) -> bool {
        self.engine.mode_active()
    }

    /// Measured tick rate.
    pub fn fps(&self) -> f32 {
        self.frame_rate.fps()
    }

    /// Number of dispatcher calls that returned an error.
    pub fn dispatch_failures(&self) -> u64 {
        self.dispatch_failures
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn into_dispatcher(self) -> D {
        self.dispatcher
    }

    /// Generate s-expression for IPC status.
    pub fn status_sexp(&self, timestamp_s: f64) -> String {
        format!(
            "(:fps {:.1} :smoothing (:window {} :filled {}) :swipe-strategy :{} :swipe-armed {} :dispatch-failures {} :engine {})",
            self.frame_rate.fps(),
            self.smoother.window(),
            self.smoother.len(),
            self.swipe.strategy().as_str(),
            sexp_bool(self.swipe.is_armed()),
            self.dispatch_failures,
            self.engine.status_sexp(timestamp_s),
        )
    }
}

/// HUD line: lock progress and swipe prompts take over the mode banner.
fn hud_text(
    mode_active: bool,
    stable: StableGesture,
    status: EngineStatus,
    hold_progress: f32,
    swipe_prompt: Option<&str>,
) -> String {
    match status {
        EngineStatus::LockHold | EngineStatus::Locked => {
            return format!("LOCKING {}%", (hold_progress * 100.0) as u32);
        }
        EngineStatus::ModeHold => {
            return format!("MODE TOGGLE {}%", (hold_progress * 100.0) as u32);
        }
        _ => {}
    }
    if let Some(prompt) = swipe_prompt {
        return prompt.to_string();
    }
    format!(
        "MODE: {} | {}",
        if mode_active { "ACTIVE" } else { "STANDBY" },
        stable.as_str()
    )
}
