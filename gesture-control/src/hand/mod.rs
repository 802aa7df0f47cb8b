//! Hand gesture core: everything between landmarks and actions.
//!
//! Provides:
//! - `landmarks`: the 21-point hand frame and geometry helpers
//! - `classifier`: per-frame raw gesture labels
//! - `smoother`: sliding-window majority vote over raw labels
//! - `engine`: mode toggle, one-shot lock and volume control
//! - `swipe`: directional app-switch swipes

pub mod classifier;
pub mod engine;
pub mod landmarks;
pub mod smoother;
pub mod swipe;

pub use classifier::{classify, ClassifierConfig, RawGesture};
pub use engine::{EngineConfig, EngineOutput, EngineStatus, GestureEngine};
pub use landmarks::{HandLandmark, Landmark, LandmarkFrame, LANDMARK_COUNT};
pub use smoother::{GestureSmoother, StableGesture};
pub use swipe::{SwipeConfig, SwipeController, SwipeDirection, SwipeEvent, SwipeStrategy};
