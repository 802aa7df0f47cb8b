//! Hand landmark frames as delivered by a 2D hand tracker.
//!
//! Models the 21 joints of a single hand, each normalized to the camera
//! frame (x to width, y to height).  A frame is only constructed when it
//! carries exactly 21 finite points; anything else is treated as "no hand".

use tracing::debug;

// ── Joint definitions ──────────────────────────────────────

/// The 21 landmarks produced per hand, in tracker order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

impl HandLandmark {
    /// Every landmark in tracker order.
    pub const ALL: [HandLandmark; LANDMARK_COUNT] = [
        Self::Wrist,
        Self::ThumbCmc,
        Self::ThumbMcp,
        Self::ThumbIp,
        Self::ThumbTip,
        Self::IndexMcp,
        Self::IndexPip,
        Self::IndexDip,
        Self::IndexTip,
        Self::MiddleMcp,
        Self::MiddlePip,
        Self::MiddleDip,
        Self::MiddleTip,
        Self::RingMcp,
        Self::RingPip,
        Self::RingDip,
        Self::RingTip,
        Self::PinkyMcp,
        Self::PinkyPip,
        Self::PinkyDip,
        Self::PinkyTip,
    ];

    /// Convert landmark enum to array index (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// String representation for IPC.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbCmc => "thumb-cmc",
            Self::ThumbMcp => "thumb-mcp",
            Self::ThumbIp => "thumb-ip",
            Self::ThumbTip => "thumb-tip",
            Self::IndexMcp => "index-mcp",
            Self::IndexPip => "index-pip",
            Self::IndexDip => "index-dip",
            Self::IndexTip => "index-tip",
            Self::MiddleMcp => "middle-mcp",
            Self::MiddlePip => "middle-pip",
            Self::MiddleDip => "middle-dip",
            Self::MiddleTip => "middle-tip",
            Self::RingMcp => "ring-mcp",
            Self::RingPip => "ring-pip",
            Self::RingDip => "ring-dip",
            Self::RingTip => "ring-tip",
            Self::PinkyMcp => "pinky-mcp",
            Self::PinkyPip => "pinky-pip",
            Self::PinkyDip => "pinky-dip",
            Self::PinkyTip => "pinky-tip",
        }
    }
}

// ── Points ─────────────────────────────────────────────────

/// A single normalized 2D landmark.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another landmark.
    pub fn distance(&self, other: &Landmark) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

// ── Frame ──────────────────────────────────────────────────

/// One tick's worth of hand landmarks.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkFrame {
    points: [Landmark; LANDMARK_COUNT],
}

impl LandmarkFrame {
    /// Build a frame from tracker output.
    ///
    /// Returns `None` for short, long or non-finite input so callers can
    /// treat it exactly like a tick without a hand.
    pub fn from_points(points: Vec<Landmark>) -> Option<Self> {
        if points.len() != LANDMARK_COUNT {
            debug!(
                "Landmark frame: expected {} points, got {}",
                LANDMARK_COUNT,
                points.len(),
            );
            return None;
        }
        if let Some(bad) = points.iter().position(|p| !p.is_finite()) {
            debug!(
                "Landmark frame: non-finite {} ({:?}), dropping",
                HandLandmark::ALL[bad].as_str(),
                points[bad],
            );
            return None;
        }
        let mut out = [Landmark::default(); LANDMARK_COUNT];
        out.copy_from_slice(&points);
        Some(Self { points: out })
    }

    /// Position of a single landmark.
    pub fn point(&self, landmark: HandLandmark) -> Landmark {
        self.points[landmark.index()]
    }

    /// All landmarks in tracker order.
    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    /// Distance between two landmarks of this hand.
    pub fn distance(&self, a: HandLandmark, b: HandLandmark) -> f32 {
        self.point(a).distance(&self.point(b))
    }

    /// Hand-size reference: middle knuckle to wrist.
    pub fn hand_size(&self) -> f32 {
        self.distance(HandLandmark::MiddleMcp, HandLandmark::Wrist)
    }

    /// Horizontal position of the palm (wrist / middle knuckle midpoint).
    pub fn palm_center_x(&self) -> f32 {
        (self.point(HandLandmark::Wrist).x + self.point(HandLandmark::MiddleMcp).x) / 2.0
    }
}

// ── Test helpers ───────────────────────────────────────────

/// Build a frame from `(x, y)` pairs, panicking on bad input.
#[cfg(test)]
pub(crate) fn test_frame(points: &[(f32, f32); LANDMARK_COUNT]) -> LandmarkFrame {
    let points = points.iter().map(|&(x, y)| Landmark::new(x, y)).collect();
    LandmarkFrame::from_points(points).expect("valid test frame")
}
