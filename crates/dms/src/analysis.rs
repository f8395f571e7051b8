//! Eye samples and the binocular closure signal

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Per-eye openness ratios reported by the vision pipeline for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeRatios {
    /// Left eye openness ratio
    pub left: f64,
    /// Right eye openness ratio
    pub right: f64,
}

impl EyeRatios {
    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    /// Both eyes below the closed threshold.
    ///
    /// A ratio that is not a positive finite number is a sensor anomaly and
    /// never counts as closed.
    pub fn both_closed(&self, threshold: f64) -> bool {
        is_closed(self.left, threshold) && is_closed(self.right, threshold)
    }
}

fn is_closed(ratio: f64, threshold: f64) -> bool {
    ratio.is_finite() && ratio > 0.0 && ratio < threshold
}

/// One tick worth of sensor input
#[derive(Debug, Clone, Copy)]
pub struct EyeSample {
    pub ratio_left: f64,
    pub ratio_right: f64,
    pub timestamp: Instant,
}

impl EyeSample {
    pub fn new(ratios: EyeRatios, timestamp: Instant) -> Self {
        Self {
            ratio_left: ratios.left,
            ratio_right: ratios.right,
            timestamp,
        }
    }

    pub fn ratios(&self) -> EyeRatios {
        EyeRatios::new(self.ratio_left, self.ratio_right)
    }
}

/// Derive the closure signal for a frame.
///
/// `None` means no face was found; it maps to "not closed" so that losing
/// the face can never be mistaken for sustained closure.
pub fn closure_signal(sample: Option<&EyeSample>, threshold: f64) -> bool {
    sample.is_some_and(|s| s.ratios().both_closed(threshold))
}

/// Image-space point (pixels)
pub type Point = (f64, f64);

/// Four contour points of one eye
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeLandmarks {
    pub top: Point,
    pub bottom: Point,
    pub inner: Point,
    pub outer: Point,
}

impl EyeLandmarks {
    /// Vertical opening over horizontal width, x100.
    ///
    /// Scale invariant, so moving closer to the camera does not change it.
    /// Returns `None` for a degenerate eye (zero width).
    pub fn openness_ratio(&self) -> Option<f64> {
        let vertical = distance(self.top, self.bottom);
        let horizontal = distance(self.inner, self.outer);
        if horizontal <= f64::EPSILON {
            return None;
        }
        Some(vertical / horizontal * 100.0)
    }
}

fn distance(a: Point, b: Point) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}
