//! Error types shared across the core.
//!
//! None of these are fatal: curve errors make a single measurement or
//! series drop out of one pass, window errors leave the current view in
//! place.

use thiserror::Error;

/// Failures while reading a value off a curve.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CurveError {
    #[error("no sample at or beyond {wavelength} nm")]
    OutOfDomain { wavelength: f64 },
    #[error("{wavelength} nm lies outside the curve domain [{min}, {max}]")]
    OutOfBounds { wavelength: f64, min: f64, max: f64 },
    #[error("no samples strictly between the band boundaries")]
    EmptyInterval,
}

/// Rejected view-window updates.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum WindowError {
    #[error("degenerate view window: x [{min_x}, {max_x}], y [{min_y}, {max_y}]")]
    Degenerate {
        min_x: f64,
        max_x: f64,
        min_y: f64,
        max_y: f64,
    },
}
