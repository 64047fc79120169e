//! View-window synchronization.
//!
//! One canonical data rectangle is shared by the pointer zoom, the two
//! range sliders and the four numeric bound fields. Every change funnels
//! through [`ViewSync::request_update`], which settles the new window,
//! writes it into every widget except the one that asked, and records who
//! owns the update so a stale pointer-zoom transform is dropped exactly
//! once when another widget takes over.

use serde::{Deserialize, Serialize};

use crate::error::WindowError;
use crate::interp::Point;
use crate::scale::{Scale, ZoomConstraints, ZoomTransform};

/// Fraction of the data span added on each side by a zoom reset.
pub const WINDOW_PADDING: f64 = 0.05;

/// Visible data-space rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewWindow {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl ViewWindow {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Same window with the lower bounds pulled up to zero.
    pub fn clamped(&self) -> Self {
        Self {
            min_x: self.min_x.max(0.0),
            min_y: self.min_y.max(0.0),
            ..*self
        }
    }

    pub fn is_valid(&self) -> bool {
        let finite = [self.min_x, self.max_x, self.min_y, self.max_y]
            .iter()
            .all(|v| v.is_finite());
        finite && self.min_x < self.max_x && self.min_y < self.max_y
    }
}

impl Default for ViewWindow {
    fn default() -> Self {
        Self::new(0.0, 1.0, 0.0, 1.0)
    }
}

/// Raw extent of some set of curves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl DataBounds {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        let mut bounds: Option<Self> = None;
        for p in points {
            let b = bounds.get_or_insert(Self {
                min_x: p[0],
                max_x: p[0],
                min_y: p[1],
                max_y: p[1],
            });
            b.min_x = b.min_x.min(p[0]);
            b.max_x = b.max_x.max(p[0]);
            b.min_y = b.min_y.min(p[1]);
            b.max_y = b.max_y.max(p[1]);
        }
        bounds
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_y: self.min_y.min(other.min_y),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn span(&self) -> [f64; 2] {
        [self.max_x - self.min_x, self.max_y - self.min_y]
    }

    /// `(x_off, y_off)` padding for each axis.
    pub fn padding(&self) -> (f64, f64) {
        let [sx, sy] = self.span();
        (sx * WINDOW_PADDING, sy * WINDOW_PADDING)
    }

    /// Bounds grown by [`WINDOW_PADDING`] on every side (not clamped).
    pub fn padded(&self) -> ViewWindow {
        let (x_off, y_off) = self.padding();
        ViewWindow::new(
            self.min_x - x_off,
            self.max_x + x_off,
            self.min_y - y_off,
            self.max_y + y_off,
        )
    }
}

/// The bound-editing widgets kept in sync with the view window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Widget {
    MinXField,
    MaxXField,
    MinYField,
    MaxYField,
    XSlider,
    YSlider,
}

impl Widget {
    pub const ALL: [Widget; 6] = [
        Widget::MinXField,
        Widget::MaxXField,
        Widget::MinYField,
        Widget::MaxYField,
        Widget::YSlider,
        Widget::XSlider,
    ];
}

/// Who is asking for a window change. Doubles as the update-owner token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateSource {
    Widget(Widget),
    PointerZoom,
    Reset,
    Layout,
}

/// A numeric bound field showing one window edge at fixed precision.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundField {
    pub decimals: usize,
    pub text: String,
}

impl BoundField {
    fn new(decimals: usize) -> Self {
        Self {
            decimals,
            text: String::new(),
        }
    }

    fn show(&mut self, value: f64) {
        self.text = format!("{:.*}", self.decimals, value);
    }

    pub fn value(&self) -> Option<f64> {
        self.text.trim().parse().ok()
    }
}

/// A two-handle range slider.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeSlider {
    pub values: [f64; 2],
    pub extent: [f64; 2],
    /// Minimum handle separation.
    pub margin: f64,
}

impl RangeSlider {
    fn new() -> Self {
        Self {
            values: [0.0, 1.0],
            extent: [0.0, 1.0],
            margin: 0.0,
        }
    }

    fn fit(&mut self, low: f64, high: f64, span: f64) {
        self.extent = [low, high];
        self.margin = span / 10.0;
    }
}

/// What each bound widget is currently displaying.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetBank {
    pub min_x: BoundField,
    pub max_x: BoundField,
    pub min_y: BoundField,
    pub max_y: BoundField,
    pub x_slider: RangeSlider,
    pub y_slider: RangeSlider,
}

impl WidgetBank {
    fn new() -> Self {
        Self {
            min_x: BoundField::new(0),
            max_x: BoundField::new(0),
            min_y: BoundField::new(2),
            max_y: BoundField::new(2),
            x_slider: RangeSlider::new(),
            y_slider: RangeSlider::new(),
        }
    }

    fn show(&mut self, widget: Widget, w: &ViewWindow) {
        match widget {
            Widget::MinXField => self.min_x.show(w.min_x),
            Widget::MaxXField => self.max_x.show(w.max_x),
            Widget::MinYField => self.min_y.show(w.min_y),
            Widget::MaxYField => self.max_y.show(w.max_y),
            Widget::XSlider => self.x_slider.values = [w.min_x, w.max_x],
            Widget::YSlider => self.y_slider.values = [w.min_y, w.max_y],
        }
    }

    pub fn field(&self, widget: Widget) -> Option<&BoundField> {
        match widget {
            Widget::MinXField => Some(&self.min_x),
            Widget::MaxXField => Some(&self.max_x),
            Widget::MinYField => Some(&self.min_y),
            Widget::MaxYField => Some(&self.max_y),
            Widget::XSlider | Widget::YSlider => None,
        }
    }

    /// Whether every widget displays `w` at its own precision.
    pub fn agrees_with(&self, w: &ViewWindow) -> bool {
        let mut expected = self.clone();
        for widget in Widget::ALL {
            expected.show(widget, w);
        }
        expected == *self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActiveScale {
    Canonical,
    Zoomed,
}

/// Owner of the canonical window, its scale, and the pointer-zoom layer.
#[derive(Debug, Clone)]
pub struct ViewSync {
    canonical: ViewWindow,
    canonical_scale: Scale,
    zoom: ZoomTransform,
    zoom_scale: Scale,
    active: ActiveScale,
    owner: Option<UpdateSource>,
    widgets: WidgetBank,
    size: [f64; 2],
    data: Option<DataBounds>,
    constraints: ZoomConstraints,
}

impl ViewSync {
    pub fn new(width: f64, height: f64) -> Self {
        let canonical = ViewWindow::default();
        let scale = Scale::from_window(&canonical, width, height);
        let mut widgets = WidgetBank::new();
        for widget in Widget::ALL {
            widgets.show(widget, &canonical);
        }
        Self {
            canonical,
            canonical_scale: scale,
            zoom: ZoomTransform::IDENTITY,
            zoom_scale: scale,
            active: ActiveScale::Canonical,
            owner: None,
            widgets,
            size: [width, height],
            data: None,
            constraints: ZoomConstraints::unbounded(width, height),
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────────

    pub fn window(&self) -> ViewWindow {
        self.canonical
    }

    pub fn canonical_scale(&self) -> &Scale {
        &self.canonical_scale
    }

    /// The scale currently driving rendering and hit-testing.
    pub fn active_scale(&self) -> &Scale {
        match self.active {
            ActiveScale::Canonical => &self.canonical_scale,
            ActiveScale::Zoomed => &self.zoom_scale,
        }
    }

    pub fn active_window(&self) -> ViewWindow {
        self.active_scale().window()
    }

    pub fn is_zoomed(&self) -> bool {
        self.active == ActiveScale::Zoomed
    }

    pub fn zoom_transform(&self) -> ZoomTransform {
        self.zoom
    }

    pub fn owner(&self) -> Option<UpdateSource> {
        self.owner
    }

    pub fn widgets(&self) -> &WidgetBank {
        &self.widgets
    }

    pub fn size(&self) -> [f64; 2] {
        self.size
    }

    pub fn data_bounds(&self) -> Option<DataBounds> {
        self.data
    }

    // ─── Updates ────────────────────────────────────────────────────────

    /// Record the extent of the curves on display. Slider extents follow
    /// it; the window itself is left alone until the next reset.
    pub fn set_data_bounds(&mut self, bounds: Option<DataBounds>) {
        self.data = bounds;
        if let Some(b) = bounds {
            let (x_off, y_off) = b.padding();
            let [sx, sy] = b.span();
            self.widgets
                .x_slider
                .fit(b.min_x - x_off, b.max_x + x_off, sx);
            self.widgets
                .y_slider
                .fit(b.min_y - y_off, b.max_y + y_off, sy);
        }
    }

    /// Settle a new window and fan it out to every widget but `source`.
    pub fn request_update(
        &mut self,
        min_x: f64,
        max_x: f64,
        min_y: f64,
        max_y: f64,
        source: UpdateSource,
    ) -> Result<ViewWindow, WindowError> {
        let next = ViewWindow::new(min_x, max_x, min_y, max_y).clamped();
        if !next.is_valid() {
            log::warn!(
                "rejecting view window x [{}, {}] y [{}, {}] from {:?}",
                next.min_x,
                next.max_x,
                next.min_y,
                next.max_y,
                source
            );
            let current = self.active_window();
            for widget in Widget::ALL {
                self.widgets.show(widget, &current);
            }
            return Err(WindowError::Degenerate {
                min_x: next.min_x,
                max_x: next.max_x,
                min_y: next.min_y,
                max_y: next.max_y,
            });
        }

        let [width, height] = self.size;
        match source {
            UpdateSource::PointerZoom => {
                if self.owner != Some(UpdateSource::PointerZoom) {
                    self.refresh_constraints();
                }
                self.zoom_scale = Scale::from_window(&next, width, height);
                self.active = ActiveScale::Zoomed;
            }
            UpdateSource::Layout => {}
            UpdateSource::Widget(_) | UpdateSource::Reset => {
                self.canonical = next;
                self.canonical_scale = Scale::from_window(&next, width, height);
                self.zoom_scale = self.canonical_scale;
                self.active = ActiveScale::Canonical;
                if self.owner == Some(UpdateSource::PointerZoom) {
                    log::debug!("pointer zoom released, resetting transform");
                    self.zoom = ZoomTransform::IDENTITY;
                }
            }
        }

        for widget in Widget::ALL {
            if source != UpdateSource::Widget(widget) {
                self.widgets.show(widget, &next);
            }
        }
        if source != UpdateSource::Layout {
            self.owner = Some(source);
        }
        Ok(next)
    }

    /// Back to the padded extent of the data on display.
    pub fn reset_zoom(&mut self) -> Result<ViewWindow, WindowError> {
        let Some(bounds) = self.data else {
            return Ok(self.canonical);
        };
        let w = bounds.padded();
        self.request_update(w.min_x, w.max_x, w.min_y, w.max_y, UpdateSource::Reset)
    }

    /// New surface size: rebuild pixel ranges, keep the logical window.
    pub fn rebuild_layout(&mut self, width: f64, height: f64) -> Result<ViewWindow, WindowError> {
        self.size = [width, height];
        self.canonical_scale = self.canonical_scale.resized(width, height);
        self.zoom_scale = self.zoom_scale.resized(width, height);
        self.refresh_constraints();
        let w = self.active_window();
        self.request_update(w.min_x, w.max_x, w.min_y, w.max_y, UpdateSource::Layout)
    }

    /// Wheel zoom by `factor` around the screen point `(px, py)`.
    pub fn zoom_at(&mut self, px: f64, py: f64, factor: f64) -> Result<ViewWindow, WindowError> {
        if self.owner != Some(UpdateSource::PointerZoom) {
            self.refresh_constraints();
        }
        let k = self.constraints.clamp_k(self.zoom.k * factor);
        let next = self.zoom.scale_to(k, [px, py]);
        self.apply_transform(next)
    }

    /// Drag pan by screen pixels.
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> Result<ViewWindow, WindowError> {
        if self.owner != Some(UpdateSource::PointerZoom) {
            self.refresh_constraints();
        }
        let next = self.zoom.pan(dx, dy);
        self.apply_transform(next)
    }

    fn apply_transform(&mut self, transform: ZoomTransform) -> Result<ViewWindow, WindowError> {
        self.zoom = self.constraints.constrain(transform);
        let w = self.zoom.rescale(&self.canonical_scale).window();
        self.request_update(w.min_x, w.max_x, w.min_y, w.max_y, UpdateSource::PointerZoom)
    }

    fn refresh_constraints(&mut self) {
        let [width, height] = self.size;
        self.constraints = match self.data {
            Some(b) => ZoomConstraints::for_view(b.span(), &self.canonical, width, height),
            None => ZoomConstraints::unbounded(width, height),
        };
    }

    /// A numeric field was edited. The other edges come from the
    /// canonical window.
    pub fn field_edited(&mut self, widget: Widget, value: f64) -> Result<ViewWindow, WindowError> {
        let mut w = self.canonical;
        match widget {
            Widget::MinXField => w.min_x = value,
            Widget::MaxXField => w.max_x = value,
            Widget::MinYField => w.min_y = value,
            Widget::MaxYField => w.max_y = value,
            Widget::XSlider => w.min_x = value,
            Widget::YSlider => w.min_y = value,
        }
        self.request_update(w.min_x, w.max_x, w.min_y, w.max_y, UpdateSource::Widget(widget))
    }

    /// A slider moved. The other axis comes from the active scale.
    pub fn slider_moved(&mut self, widget: Widget, values: [f64; 2]) -> Result<ViewWindow, WindowError> {
        let mut w = self.active_window();
        match widget {
            Widget::YSlider => {
                w.min_y = values[0];
                w.max_y = values[1];
            }
            _ => {
                w.min_x = values[0];
                w.max_x = values[1];
            }
        }
        self.request_update(w.min_x, w.max_x, w.min_y, w.max_y, UpdateSource::Widget(widget))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sync_with_data() -> ViewSync {
        let mut sync = ViewSync::new(400.0, 200.0);
        sync.set_data_bounds(Some(DataBounds {
            min_x: 400.0,
            max_x: 600.0,
            min_y: 0.1,
            max_y: 0.4,
        }));
        sync
    }

    #[test]
    fn test_clamps_lower_bounds() {
        let mut sync = ViewSync::new(100.0, 100.0);
        let w = sync
            .request_update(-10.0, 50.0, -1.0, 2.0, UpdateSource::Reset)
            .unwrap();
        assert_eq!(w.min_x, 0.0);
        assert_eq!(w.min_y, 0.0);
        assert_eq!(sync.window(), w);
    }

    #[test]
    fn test_source_widget_is_skipped() {
        let mut sync = ViewSync::new(100.0, 100.0);
        let before = sync.widgets().min_x.text.clone();
        sync.request_update(
            123.4,
            500.0,
            0.0,
            1.0,
            UpdateSource::Widget(Widget::MinXField),
        )
        .unwrap();
        assert_eq!(sync.widgets().min_x.text, before);
        assert_eq!(sync.widgets().max_x.text, "500");
        assert_eq!(sync.widgets().x_slider.values, [123.4, 500.0]);
    }

    #[test]
    fn test_request_update_is_idempotent() {
        let mut sync = ViewSync::new(100.0, 100.0);
        let src = UpdateSource::Widget(Widget::XSlider);
        let a = sync.request_update(410.0, 590.0, 0.05, 0.6, src).unwrap();
        let widgets = sync.widgets().clone();
        let b = sync.request_update(410.0, 590.0, 0.05, 0.6, src).unwrap();
        assert_eq!(a, b);
        assert_eq!(&widgets, sync.widgets());
    }

    #[test]
    fn test_all_widgets_agree_after_reset() {
        let mut sync = sync_with_data();
        let w = sync.reset_zoom().unwrap();
        assert!(sync.widgets().agrees_with(&w));
        assert_eq!(sync.widgets().min_x.text, "390");
        assert_eq!(sync.widgets().max_x.text, "610");
    }

    #[test]
    fn test_reset_reproduces_padded_bounds() {
        let mut sync = sync_with_data();
        sync.reset_zoom().unwrap();
        let w = sync.active_window();
        assert!((w.min_x - 390.0).abs() < 1e-9);
        assert!((w.max_x - 610.0).abs() < 1e-9);
        assert!((w.min_y - 0.085).abs() < 1e-9);
        assert!((w.max_y - 0.415).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_window_rejected() {
        let mut sync = sync_with_data();
        let before = sync.reset_zoom().unwrap();
        let err = sync.field_edited(Widget::MinXField, 700.0);
        assert!(matches!(err, Err(WindowError::Degenerate { .. })));
        assert_eq!(sync.window(), before);
        assert!(sync.widgets().agrees_with(&before));
    }

    #[test]
    fn test_zoom_then_widget_resets_transform() {
        let mut sync = sync_with_data();
        sync.reset_zoom().unwrap();
        sync.zoom_at(200.0, 100.0, 2.0).unwrap();
        assert!(sync.is_zoomed());
        assert!(!sync.zoom_transform().is_identity());
        assert_eq!(sync.owner(), Some(UpdateSource::PointerZoom));
        let zoomed = sync.active_window();
        assert!(sync.widgets().agrees_with(&zoomed));

        sync.slider_moved(Widget::XSlider, [450.0, 550.0]).unwrap();
        assert!(!sync.is_zoomed());
        assert!(sync.zoom_transform().is_identity());
        assert_eq!(sync.window().min_x, 450.0);
        // y axis came from the zoomed scale
        assert!((sync.window().max_y - zoomed.max_y).abs() < 1e-12);
    }

    #[test]
    fn test_layout_keeps_window_and_owner() {
        let mut sync = sync_with_data();
        let before = sync.reset_zoom().unwrap();
        sync.rebuild_layout(800.0, 300.0).unwrap();
        assert_eq!(sync.active_window(), before);
        assert_eq!(sync.active_scale().x.range, [0.0, 800.0]);
        assert_eq!(sync.owner(), Some(UpdateSource::Reset));
        assert!(sync.widgets().agrees_with(&before));
    }

    #[test]
    fn test_slider_extent_tracks_data() {
        let sync = sync_with_data();
        let s = &sync.widgets().x_slider;
        assert!((s.extent[0] - 390.0).abs() < 1e-9);
        assert!((s.extent[1] - 610.0).abs() < 1e-9);
        assert!((s.margin - 20.0).abs() < 1e-9);
    }
}
