//! Output side of the pipeline: the actions gestures produce and the
//! dispatcher capability that performs them.
//!
//! The core never touches the OS directly.  Effects go through an
//! `ActionDispatcher` injected at construction; `SexpDispatcher` is the
//! stock implementation that forwards each action as an IPC event line to
//! whatever process owns the real effectors.

use std::io::Write;

use thiserror::Error;
use tracing::debug;

use crate::hand::swipe::SwipeDirection;
use crate::ipc::sexp::{format_event, sexp_bool};

// ── Errors ─────────────────────────────────────────────────

/// Failure reported by an effector.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("effector unavailable: {0}")]
    Unavailable(String),

    #[error("action rejected: {0}")]
    Rejected(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

// ── Capability ─────────────────────────────────────────────

/// OS-level effectors driven by the gesture core.
///
/// Calls are fire-and-forget from the core's point of view: failures are
/// logged by the caller and never retried.
pub trait ActionDispatcher {
    /// Lock the workstation.
    fn lock(&mut self) -> Result<(), DispatchError>;

    /// Set the master volume, 0-100.
    fn set_volume(&mut self, percent: u8) -> Result<(), DispatchError>;

    /// Switch to the previous/next application window.
    fn switch_app(&mut self, direction: SwipeDirection) -> Result<(), DispatchError>;

    /// Gesture mode was toggled.
    fn set_mode(&mut self, active: bool) -> Result<(), DispatchError>;
}

// ── Actions ────────────────────────────────────────────────

/// A discrete or continuous output of the gesture core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Lock,
    SetVolume(u8),
    SwitchApp(SwipeDirection),
    SetMode(bool),
}

impl Action {
    /// Event name for IPC and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lock => "lock",
            Self::SetVolume(_) => "volume",
            Self::SwitchApp(_) => "switch-app",
            Self::SetMode(_) => "mode",
        }
    }

    /// Send this action through a dispatcher.
    pub fn dispatch(&self, dispatcher: &mut dyn ActionDispatcher) -> Result<(), DispatchError> {
        match *self {
            Self::Lock => dispatcher.lock(),
            Self::SetVolume(percent) => dispatcher.set_volume(percent),
            Self::SwitchApp(direction) => dispatcher.switch_app(direction),
            Self::SetMode(active) => dispatcher.set_mode(active),
        }
    }

    /// IPC event s-expression for this action.
    pub fn event_sexp(&self) -> String {
        match *self {
            Self::Lock => format_event("lock", &[]),
            Self::SetVolume(percent) => {
                format_event("volume", &[("percent", &percent.to_string())])
            }
            Self::SwitchApp(direction) => format_event(
                "switch-app",
                &[("direction", &format!(":{}", direction.as_str()))],
            ),
            Self::SetMode(active) => format_event("mode", &[("active", sexp_bool(active))]),
        }
    }
}

// ── S-expression dispatcher ────────────────────────────────

/// Writes one event line per action to `out`.
///
/// Repeated volume events with an unchanged level are collapsed, since the
/// pinch control reports every tick.
pub struct SexpDispatcher<W: Write> {
    out: W,
    last_volume: Option<u8>,
}

impl<W: Write> SexpDispatcher<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_volume: None,
        }
    }

    /// Consume the dispatcher, returning the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, action: Action) -> Result<(), DispatchError> {
        let line = action.event_sexp();
        debug!("dispatch: {}", line);
        writeln!(self.out, "{}", line)?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> ActionDispatcher for SexpDispatcher<W> {
    fn lock(&mut self) -> Result<(), DispatchError> {
        self.emit(Action::Lock)
    }

    fn set_volume(&mut self, percent: u8) -> Result<(), DispatchError> {
        if self.last_volume == Some(percent) {
            return Ok(());
        }
        self.last_volume = Some(percent);
        self.emit(Action::SetVolume(percent))
    }

    fn switch_app(&mut self, direction: SwipeDirection) -> Result<(), DispatchError> {
        self.emit(Action::SwitchApp(direction))
    }

    fn set_mode(&mut self, active: bool) -> Result<(), DispatchError> {
        self.emit(Action::SetMode(active))
    }
}
