//! Sliding-window majority vote over raw gesture labels.

use std::collections::VecDeque;

use super::classifier::RawGesture;

/// Share of the window (percent) a label must hold to be reported as stable.
pub const MAJORITY_PERCENT: usize = 80;

/// Stabilized gesture label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StableGesture {
    /// The window has not filled yet.
    Stabilizing,
    /// No label reaches the majority share.
    Transitioning,
    /// A label holds the majority.
    Gesture(RawGesture),
}

impl StableGesture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stabilizing => "STABILIZING",
            Self::Transitioning => "TRANSITIONING",
            Self::Gesture(g) => g.as_str(),
        }
    }

    /// Whether this is the given settled gesture.
    pub fn is(&self, gesture: RawGesture) -> bool {
        *self == Self::Gesture(gesture)
    }
}

/// Bounded FIFO of the most recent raw labels.
#[derive(Debug, Clone)]
pub struct GestureSmoother {
    history: VecDeque<RawGesture>,
    window: usize,
}

impl GestureSmoother {
    /// Create a smoother over `window` frames (at least one).
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            history: VecDeque::with_capacity(window),
            window,
        }
    }

    /// Push this tick's raw label and return the stabilized one.
    pub fn smooth(&mut self, raw: RawGesture) -> StableGesture {
        self.history.push_back(raw);
        while self.history.len() > self.window {
            self.history.pop_front();
        }
        if self.history.len() < self.window {
            return StableGesture::Stabilizing;
        }

        let (best, count) = self.majority();
        if count * 100 >= self.window * MAJORITY_PERCENT {
            StableGesture::Gesture(best)
        } else {
            StableGesture::Transitioning
        }
    }

    /// Most frequent label and its count.  Ties go to the label seen most
    /// recently.
    fn majority(&self) -> (RawGesture, usize) {
        let mut best = (RawGesture::None, 0usize);
        let mut seen: Vec<RawGesture> = Vec::with_capacity(self.history.len());
        // Newest first so the first label reaching the top count wins ties.
        for label in self.history.iter().rev() {
            if seen.contains(label) {
                continue;
            }
            seen.push(*label);
            let count = self.history.iter().filter(|l| *l == label).count();
            if count > best.1 {
                best = (*label, count);
            }
        }
        best
    }

    /// Number of labels currently buffered.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Configured window size.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Drop all history; the next `window - 1` calls report `Stabilizing`.
    pub fn reset(&mut self) {
        self.history.clear();
    }
}
