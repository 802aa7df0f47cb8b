//! Gesture control: hand landmarks in, desktop actions out.
//!
//! One `Pipeline` per tracked hand turns a stream of 21-point landmark
//! frames into stabilized gestures, hold-to-trigger actions and swipes,
//! and hands each action to an injected `ActionDispatcher`.

pub mod action;
pub mod config;
pub mod hand;
pub mod ipc;
pub mod pipeline;
pub mod source;

pub use action::{Action, ActionDispatcher, DispatchError, SexpDispatcher};
pub use config::{ConfigError, GestureConfig};
pub use pipeline::{Pipeline, TickReport};
pub use source::{LandmarkSource, Sample, SexpSource, SourceError};
