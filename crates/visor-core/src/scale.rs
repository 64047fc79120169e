//! Data → screen mappings and the pointer-zoom transform layered on top.
//!
//! Screen space has its origin at the top-left of the plotting surface:
//! x grows right, y grows down. The y scale therefore maps the top of the
//! data window to pixel 0.

use serde::{Deserialize, Serialize};

use crate::interp::Point;
use crate::window::ViewWindow;

/// A monotonic linear map from `domain` to `range`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearScale {
    pub domain: [f64; 2],
    pub range: [f64; 2],
}

impl LinearScale {
    pub fn new(domain: [f64; 2], range: [f64; 2]) -> Self {
        Self { domain, range }
    }

    pub fn apply(&self, value: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        if d1 == d0 {
            return r0;
        }
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }

    pub fn invert(&self, pixel: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        if r1 == r0 {
            return d0;
        }
        d0 + (pixel - r0) / (r1 - r0) * (d1 - d0)
    }

    /// Smaller domain end.
    pub fn low(&self) -> f64 {
        self.domain[0].min(self.domain[1])
    }

    /// Larger domain end.
    pub fn high(&self) -> f64 {
        self.domain[0].max(self.domain[1])
    }

    pub fn with_range(&self, range: [f64; 2]) -> Self {
        Self::new(self.domain, range)
    }
}

/// The x and y maps of one plotting surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub x: LinearScale,
    pub y: LinearScale,
}

impl Scale {
    pub fn from_window(window: &ViewWindow, width: f64, height: f64) -> Self {
        Self {
            x: LinearScale::new([window.min_x, window.max_x], [0.0, width]),
            y: LinearScale::new([window.max_y, window.min_y], [0.0, height]),
        }
    }

    pub fn to_screen(&self, p: Point) -> [f64; 2] {
        [self.x.apply(p[0]), self.y.apply(p[1])]
    }

    pub fn from_screen(&self, px: f64, py: f64) -> Point {
        [self.x.invert(px), self.y.invert(py)]
    }

    /// The data rectangle this scale shows.
    pub fn window(&self) -> ViewWindow {
        ViewWindow {
            min_x: self.x.domain[0],
            max_x: self.x.domain[1],
            min_y: self.y.domain[1],
            max_y: self.y.domain[0],
        }
    }

    pub fn resized(&self, width: f64, height: f64) -> Self {
        Self {
            x: self.x.with_range([0.0, width]),
            y: self.y.with_range([0.0, height]),
        }
    }
}

/// Pan/zoom transform in screen space: `screen' = screen * k + (x, y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTransform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl ZoomTransform {
    pub const IDENTITY: ZoomTransform = ZoomTransform {
        k: 1.0,
        x: 0.0,
        y: 0.0,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn invert_x(&self, px: f64) -> f64 {
        (px - self.x) / self.k
    }

    pub fn invert_y(&self, py: f64) -> f64 {
        (py - self.y) / self.k
    }

    /// Copy of `scale` whose domain is what the transformed view shows.
    pub fn rescale_x(&self, scale: &LinearScale) -> LinearScale {
        let d0 = scale.invert(self.invert_x(scale.range[0]));
        let d1 = scale.invert(self.invert_x(scale.range[1]));
        LinearScale::new([d0, d1], scale.range)
    }

    pub fn rescale_y(&self, scale: &LinearScale) -> LinearScale {
        let d0 = scale.invert(self.invert_y(scale.range[0]));
        let d1 = scale.invert(self.invert_y(scale.range[1]));
        LinearScale::new([d0, d1], scale.range)
    }

    pub fn rescale(&self, scale: &Scale) -> Scale {
        Scale {
            x: self.rescale_x(&scale.x),
            y: self.rescale_y(&scale.y),
        }
    }

    /// Zoom to `k` keeping the screen point `anchor` fixed.
    pub fn scale_to(&self, k: f64, anchor: [f64; 2]) -> Self {
        let fixed = [self.invert_x(anchor[0]), self.invert_y(anchor[1])];
        Self {
            k,
            x: anchor[0] - fixed[0] * k,
            y: anchor[1] - fixed[1] * k,
        }
    }

    /// Shift by screen pixels.
    pub fn pan(&self, dx: f64, dy: f64) -> Self {
        Self {
            k: self.k,
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Shift by untransformed units.
    fn translate(&self, tx: f64, ty: f64) -> Self {
        Self {
            k: self.k,
            x: self.x + self.k * tx,
            y: self.y + self.k * ty,
        }
    }
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Limits on how far the pointer zoom may scale and wander.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomConstraints {
    pub scale_extent: [f64; 2],
    pub translate_extent: [[f64; 2]; 2],
    pub extent: [[f64; 2]; 2],
}

impl ZoomConstraints {
    /// Constraints that allow anything.
    pub fn unbounded(width: f64, height: f64) -> Self {
        Self {
            scale_extent: [0.0, f64::INFINITY],
            translate_extent: [
                [f64::NEG_INFINITY, f64::NEG_INFINITY],
                [f64::INFINITY, f64::INFINITY],
            ],
            extent: [[0.0, 0.0], [width, height]],
        }
    }

    /// Extents proportional to how much of the data the canonical window
    /// currently covers.
    pub fn for_view(data_span: [f64; 2], canonical: &ViewWindow, width: f64, height: f64) -> Self {
        let x_proportion = data_span[0] / (canonical.max_x - canonical.min_x);
        let y_proportion = data_span[1] / (canonical.max_y - canonical.min_y);
        let total = x_proportion + y_proportion;
        if !total.is_finite() || total <= 0.0 {
            return Self::unbounded(width, height);
        }
        Self {
            scale_extent: [0.5 / total, 20.0 * total],
            translate_extent: [
                [width * -0.5 * x_proportion, height * -0.5 * y_proportion],
                [width * 1.5 * x_proportion, height * 1.5 * y_proportion],
            ],
            extent: [[0.0, 0.0], [width, height]],
        }
    }

    pub fn clamp_k(&self, k: f64) -> f64 {
        k.max(self.scale_extent[0]).min(self.scale_extent[1])
    }

    /// Pull `transform` back so the visible extent stays inside the
    /// translate extent (centred when it cannot fit).
    pub fn constrain(&self, transform: ZoomTransform) -> ZoomTransform {
        let dx0 = transform.invert_x(self.extent[0][0]) - self.translate_extent[0][0];
        let dx1 = transform.invert_x(self.extent[1][0]) - self.translate_extent[1][0];
        let dy0 = transform.invert_y(self.extent[0][1]) - self.translate_extent[0][1];
        let dy1 = transform.invert_y(self.extent[1][1]) - self.translate_extent[1][1];
        transform.translate(settle(dx0, dx1), settle(dy0, dy1))
    }
}

fn settle(d0: f64, d1: f64) -> f64 {
    if d1 > d0 {
        (d0 + d1) / 2.0
    } else if d0.min(0.0) != 0.0 {
        d0.min(0.0)
    } else {
        d1.max(0.0)
    }
}
