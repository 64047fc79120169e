//! Rendering surface boundary.
//!
//! The core never draws. It tells a [`RenderSurface`] which curves,
//! axes and markers exist, in data space; the surface maps them with the
//! scale handed to [`RenderSurface::draw_axis`].

use serde::{Deserialize, Serialize};

use crate::color::LineColor;
use crate::interp::Point;
use crate::scale::Scale;
use crate::series::SeriesKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

/// How a curve should look.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveStyle {
    pub color: LineColor,
    pub lines: bool,
    pub points: bool,
    pub dashed: bool,
    pub width: f32,
}

/// Overlay markers. Each kind replaces any previous marker of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerKind {
    /// Circle on the nearest clickable point.
    Pointer,
    /// Vertical line following the pointer.
    TrackingLine,
    /// A dropped locator, numbered from 0.
    Locator(usize),
    /// A placed measurement focus.
    CalcFocus { key: SeriesKey, index: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderCommand {
    Curve {
        key: SeriesKey,
        points: Vec<Point>,
        style: CurveStyle,
    },
    EraseCurve(SeriesKey),
    Axis {
        axis: Axis,
        scale: Scale,
    },
    /// `at: None` removes the marker.
    Marker {
        kind: MarkerKind,
        at: Option<Point>,
        label: Option<String>,
    },
    Resize {
        width: f64,
        height: f64,
    },
}

pub trait RenderSurface {
    fn draw_curve(&mut self, key: SeriesKey, points: &[Point], style: &CurveStyle);
    fn erase_curve(&mut self, key: SeriesKey);
    fn draw_axis(&mut self, axis: Axis, scale: &Scale);
    fn draw_marker(&mut self, kind: MarkerKind, at: Option<Point>, label: Option<&str>);
    fn resize(&mut self, width: f64, height: f64);
}

/// Records every call, in order.
impl RenderSurface for Vec<RenderCommand> {
    fn draw_curve(&mut self, key: SeriesKey, points: &[Point], style: &CurveStyle) {
        self.push(RenderCommand::Curve {
            key,
            points: points.to_vec(),
            style: *style,
        });
    }

    fn erase_curve(&mut self, key: SeriesKey) {
        self.push(RenderCommand::EraseCurve(key));
    }

    fn draw_axis(&mut self, axis: Axis, scale: &Scale) {
        self.push(RenderCommand::Axis {
            axis,
            scale: *scale,
        });
    }

    fn draw_marker(&mut self, kind: MarkerKind, at: Option<Point>, label: Option<&str>) {
        self.push(RenderCommand::Marker {
            kind,
            at,
            label: label.map(str::to_string),
        });
    }

    fn resize(&mut self, width: f64, height: f64) {
        self.push(RenderCommand::Resize { width, height });
    }
}
