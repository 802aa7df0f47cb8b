//! Landmark input: the capability that supplies one sample per tick.
//!
//! The stock source reads line-delimited s-expression records, as written
//! by an external hand tracker:
//!
//! ```text
//! (:t 0.033 :hand ((0.51 0.90) (0.47 0.85) ... (0.56 0.64)))
//! (:t 0.066 :hand nil)
//! ```
//!
//! `:t` (seconds) is optional; without it the caller supplies wall-clock
//! time.  A record whose hand is short or malformed is a no-hand sample.

use std::io::BufRead;

use lexpr::Value;
use thiserror::Error;
use tracing::debug;

use crate::hand::landmarks::{Landmark, LandmarkFrame};
use crate::ipc::sexp::{as_f64, find_value, get_float, is_nil, list_items};

/// Default camera frame width in pixels.
pub const DEFAULT_FRAME_WIDTH: u32 = 640;

/// Errors from reading landmark input.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("i/o error reading landmarks: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: malformed record: {reason}")]
    Parse { line: usize, reason: String },
}

/// One tick of input.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Capture time in seconds, if the source provides one.
    pub timestamp_s: Option<f64>,
    /// The hand, or `None` when no (valid) hand was seen.
    pub frame: Option<LandmarkFrame>,
}

/// Supplier of landmark samples.
pub trait LandmarkSource {
    /// Next sample, or `Ok(None)` once the stream has ended.
    fn next_sample(&mut self) -> Result<Option<Sample>, SourceError>;

    /// Width of the camera frame in pixels.
    fn frame_width(&self) -> u32;
}

/// Reads one s-expression record per line.
pub struct SexpSource<R: BufRead> {
    reader: R,
    frame_width: u32,
    line_no: usize,
    buf: String,
}

impl<R: BufRead> SexpSource<R> {
    pub fn new(reader: R, frame_width: u32) -> Self {
        Self {
            reader,
            frame_width,
            line_no: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> LandmarkSource for SexpSource<R> {
    fn next_sample(&mut self) -> Result<Option<Sample>, SourceError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let line = self.buf.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            return parse_record(line)
                .map(Some)
                .map_err(|reason| SourceError::Parse {
                    line: self.line_no,
                    reason,
                });
        }
    }

    fn frame_width(&self) -> u32 {
        self.frame_width
    }
}

/// Parse one record line into a sample.
pub fn parse_record(line: &str) -> Result<Sample, String> {
    let value = lexpr::from_str(line).map_err(|e| e.to_string())?;
    if !matches!(value, Value::Cons(_)) {
        return Err("expected a plist".to_string());
    }

    let timestamp_s = get_float(&value, "t");
    let frame = match find_value(&value, "hand") {
        None => None,
        Some(hand) if is_nil(hand) => None,
        Some(hand) => parse_hand(hand),
    };
    Ok(Sample { timestamp_s, frame })
}

/// Turn `((x y) ...)` into a frame.  Anything malformed yields `None`.
fn parse_hand(hand: &Value) -> Option<LandmarkFrame> {
    let Some(items) = list_items(hand) else {
        debug!("landmark record: :hand is not a list");
        return None;
    };
    let mut points = Vec::with_capacity(items.len());
    for item in items {
        let coords = list_items(item)?;
        if coords.len() < 2 {
            debug!("landmark record: point with {} coordinates", coords.len());
            return None;
        }
        let x = as_f64(coords[0])?;
        let y = as_f64(coords[1])?;
        points.push(Landmark::new(x as f32, y as f32));
    }
    LandmarkFrame::from_points(points)
}
