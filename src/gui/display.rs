/// Display list: the retained scene the plot view paints every frame
///
/// The viewer core pushes curves, axes and markers through the
/// `RenderSurface` trait; egui repaints immediately, so the latest
/// command for each curve or marker is simply kept until replaced.

use std::collections::{BTreeMap, HashMap};

use visor_core::{Axis, CurveStyle, MarkerKind, Point, RenderSurface, Scale, SeriesKey, ViewWindow};

/// One overlay marker as last drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub at: Point,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    pub curves: BTreeMap<SeriesKey, (Vec<Point>, CurveStyle)>,
    pub markers: HashMap<MarkerKind, Marker>,
    x_axis: Option<Scale>,
    y_axis: Option<Scale>,
    pub size: [f64; 2],
}

impl DisplayList {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            size: [width, height],
            ..Default::default()
        }
    }

    /// Window the axes were last drawn for.
    pub fn window(&self) -> Option<ViewWindow> {
        let x = self.x_axis.as_ref()?.window();
        let y = self.y_axis.as_ref()?.window();
        Some(ViewWindow::new(x.min_x, x.max_x, y.min_y, y.max_y))
    }

    /// Locators in drop order.
    pub fn locators(&self) -> Vec<&Marker> {
        let mut found: Vec<(usize, &Marker)> = self
            .markers
            .iter()
            .filter_map(|(kind, m)| match kind {
                MarkerKind::Locator(i) => Some((*i, m)),
                _ => None,
            })
            .collect();
        found.sort_by_key(|(i, _)| *i);
        found.into_iter().map(|(_, m)| m).collect()
    }

    /// Placed calc foci as `(series, focus index, point)`.
    pub fn foci(&self) -> Vec<(SeriesKey, usize, Point)> {
        let mut found: Vec<_> = self
            .markers
            .iter()
            .filter_map(|(kind, m)| match kind {
                MarkerKind::CalcFocus { key, index } => Some((*key, *index, m.at)),
                _ => None,
            })
            .collect();
        found.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        found
    }
}

impl RenderSurface for DisplayList {
    fn draw_curve(&mut self, key: SeriesKey, points: &[Point], style: &CurveStyle) {
        self.curves.insert(key, (points.to_vec(), *style));
    }

    fn erase_curve(&mut self, key: SeriesKey) {
        self.curves.remove(&key);
    }

    fn draw_axis(&mut self, axis: Axis, scale: &Scale) {
        match axis {
            Axis::X => self.x_axis = Some(*scale),
            Axis::Y => self.y_axis = Some(*scale),
        }
    }

    fn draw_marker(&mut self, kind: MarkerKind, at: Option<Point>, label: Option<&str>) {
        match at {
            Some(at) => {
                self.markers.insert(
                    kind,
                    Marker {
                        at,
                        label: label.map(str::to_string),
                    },
                );
            }
            None => {
                self.markers.remove(&kind);
            }
        }
    }

    fn resize(&mut self, width: f64, height: f64) {
        self.size = [width, height];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visor_core::LineColor;

    fn style() -> CurveStyle {
        CurveStyle {
            color: LineColor { r: 10, g: 20, b: 30 },
            lines: true,
            points: false,
            dashed: false,
            width: 1.5,
        }
    }

    #[test]
    fn test_curve_replaced_then_erased() {
        let mut list = DisplayList::new(100.0, 50.0);
        let key = SeriesKey::lab(1);
        list.draw_curve(key, &[[1.0, 2.0]], &style());
        list.draw_curve(key, &[[1.0, 3.0], [2.0, 4.0]], &style());
        assert_eq!(list.curves[&key].0.len(), 2);
        list.erase_curve(key);
        assert!(list.curves.is_empty());
    }

    #[test]
    fn test_window_from_axes() {
        let mut list = DisplayList::new(100.0, 50.0);
        assert!(list.window().is_none());
        let scale = Scale::from_window(&ViewWindow::new(400.0, 700.0, 0.1, 0.9), 100.0, 50.0);
        list.draw_axis(Axis::X, &scale);
        list.draw_axis(Axis::Y, &scale);
        let w = list.window().unwrap();
        assert!((w.min_x - 400.0).abs() < 1e-9);
        assert!((w.max_y - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_markers_removed_with_none() {
        let mut list = DisplayList::new(100.0, 50.0);
        list.draw_marker(MarkerKind::Locator(1), Some([2.0, 0.2]), Some("2, 0.200"));
        list.draw_marker(MarkerKind::Locator(0), Some([1.0, 0.1]), Some("1, 0.100"));
        let locs = list.locators();
        assert_eq!(locs[0].at, [1.0, 0.1]);
        assert_eq!(locs[1].label.as_deref(), Some("2, 0.200"));

        list.draw_marker(MarkerKind::Locator(0), None, None);
        assert_eq!(list.locators().len(), 1);
    }
}
