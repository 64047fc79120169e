//! The viewer aggregate.
//!
//! [`ViewState`] owns the series store, the view-window engine and the
//! calc foci, and exposes one handler per input event. Every handler runs
//! to completion synchronously: state is mutated, widget fan-out finishes,
//! and only then are drawing commands sent to the [`RenderSurface`].

use std::collections::BTreeSet;

use crate::calc::{CalcFoci, CalcMode, CalcSummary, ClickOutcome, Focus};
use crate::error::WindowError;
use crate::hit_test::{self, Hit};
use crate::interp::Point;
use crate::inventory::Inventory;
use crate::series::{LayerVisibility, Normalization, Sample, SampleId, SeriesKey, SeriesStore};
use crate::surface::{Axis, MarkerKind, RenderSurface};
use crate::window::{ViewSync, ViewWindow, Widget};

/// Pointer-marker switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Toggles {
    /// Clicking drops a labelled locator line.
    pub drop_locator: bool,
    /// A vertical line follows the pointer.
    pub vertical_line: bool,
}

pub struct ViewState {
    store: SeriesStore,
    view: ViewSync,
    calc: CalcFoci,
    pub toggles: Toggles,
    locators: Vec<Point>,
    pointer: Option<Hit>,
    /// Reference entered for wavelength normalization, kept while that
    /// mode is off.
    norm_wavelength: Option<f64>,
    inventory: BTreeSet<SampleId>,
    /// Series whose focus markers are on the surface.
    drawn_foci: Vec<SeriesKey>,
}

impl ViewState {
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_store(SeriesStore::new(), width, height)
    }

    pub fn with_store(store: SeriesStore, width: f64, height: f64) -> Self {
        Self {
            store,
            view: ViewSync::new(width, height),
            calc: CalcFoci::new(),
            toggles: Toggles::default(),
            locators: Vec::new(),
            pointer: None,
            norm_wavelength: None,
            inventory: BTreeSet::new(),
            drawn_foci: Vec::new(),
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────────

    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    pub fn view(&self) -> &ViewSync {
        &self.view
    }

    pub fn calc(&self) -> &CalcFoci {
        &self.calc
    }

    pub fn locators(&self) -> &[Point] {
        &self.locators
    }

    pub fn pointer(&self) -> Option<Hit> {
        self.pointer
    }

    pub fn norm_wavelength(&self) -> Option<f64> {
        self.norm_wavelength
    }

    pub fn in_inventory(&self, sample: SampleId) -> bool {
        self.inventory.contains(&sample)
    }

    pub fn calc_summary(&self) -> CalcSummary {
        self.calc.summary(&self.store)
    }

    pub fn normalization_label(&self) -> Option<String> {
        match self.store.normalization() {
            Normalization::None | Normalization::Wavelength(None) => None,
            Normalization::Peak => self
                .store
                .auto_norm_wavelength()
                .map(|w| format!("normalized to 1.0 @ {}nm", w)),
            Normalization::Wavelength(Some(w)) => Some(format!("normalized to 1.0 @ {}nm", w)),
        }
    }

    // ─── Series handlers ────────────────────────────────────────────────

    /// Register samples, fit the window to them and draw.
    pub fn load_samples(&mut self, samples: Vec<Sample>, surface: &mut dyn RenderSurface) -> usize {
        let added = self.store.load(samples);
        log::info!("loaded {} sample(s), {} in view", added, self.store.len());
        self.view.set_data_bounds(self.store.bounds_from_samples());
        settle(self.view.reset_zoom());
        self.calc.refresh(&self.store);
        self.redraw(surface);
        added
    }

    pub fn remove_sample(&mut self, sample: SampleId, surface: &mut dyn RenderSurface) -> bool {
        if self.store.remove(sample).is_none() {
            return false;
        }
        surface.erase_curve(SeriesKey::lab(sample));
        surface.erase_curve(SeriesKey::instrument(sample));
        self.curves_changed();
        self.redraw(surface);
        true
    }

    /// Show or hide a sample (both its lab and instrument curves).
    pub fn toggle_sample(&mut self, sample: SampleId, active: bool, surface: &mut dyn RenderSurface) {
        if !self.store.set_active(sample, active) {
            log::warn!("toggle for unknown sample {}", sample);
            return;
        }
        self.curves_changed();
        self.redraw(surface);
    }

    pub fn set_offset(&mut self, sample: SampleId, offset: f64, surface: &mut dyn RenderSurface) {
        if !self.store.set_offset(sample, offset) {
            return;
        }
        self.curves_changed();
        self.redraw(surface);
    }

    pub fn set_filter_set(&mut self, name: &str, surface: &mut dyn RenderSurface) {
        self.store.set_filter_set(name);
        self.curves_changed();
        self.redraw(surface);
    }

    pub fn set_layers(&mut self, layers: LayerVisibility, surface: &mut dyn RenderSurface) {
        self.store.set_layers(layers);
        if self.calc.apply_to_all() {
            self.calc.set_apply_to_all(&self.store, true);
        }
        self.redraw(surface);
    }

    fn curves_changed(&mut self) {
        if let Some(bounds) = self.store.bounds_from_active_series() {
            self.view.set_data_bounds(Some(bounds));
        }
        self.calc.refresh(&self.store);
    }

    // ─── Normalization ──────────────────────────────────────────────────

    pub fn toggle_peak_normalization(&mut self, on: bool, surface: &mut dyn RenderSurface) {
        let mode = if on {
            Normalization::Peak
        } else {
            Normalization::None
        };
        self.renormalize(mode, surface);
    }

    pub fn toggle_wavelength_normalization(&mut self, on: bool, surface: &mut dyn RenderSurface) {
        let mode = if on {
            Normalization::Wavelength(self.norm_wavelength)
        } else {
            Normalization::None
        };
        self.renormalize(mode, surface);
    }

    pub fn set_normalization_wavelength(&mut self, wavelength: f64, surface: &mut dyn RenderSurface) {
        self.norm_wavelength = Some(wavelength);
        if let Normalization::Wavelength(_) = self.store.normalization() {
            self.store
                .set_normalization(Normalization::Wavelength(Some(wavelength)));
            self.curves_changed();
            settle(self.view.reset_zoom());
            self.redraw(surface);
        }
    }

    fn renormalize(&mut self, mode: Normalization, surface: &mut dyn RenderSurface) {
        self.store.set_normalization(mode);
        self.calc.clear();
        self.curves_changed();
        settle(self.view.reset_zoom());
        self.redraw(surface);
    }

    // ─── Calc ───────────────────────────────────────────────────────────

    pub fn set_calc_mode(&mut self, mode: CalcMode, surface: &mut dyn RenderSurface) {
        log::debug!("calc mode -> {:?}", mode);
        self.calc.set_mode(&self.store, mode);
        self.redraw(surface);
    }

    pub fn set_apply_to_all(&mut self, on: bool, surface: &mut dyn RenderSurface) {
        self.calc.set_apply_to_all(&self.store, on);
        self.redraw(surface);
    }

    // ─── Pointer ────────────────────────────────────────────────────────

    fn hit_at(&self, px: f64, py: f64) -> Option<Hit> {
        let scale = self.view.active_scale();
        let [mx, my] = scale.from_screen(px, py);
        hit_test::nearest_point(&self.store, scale, mx, my)
    }

    /// Click at surface pixel `(px, py)`.
    pub fn pointer_click(
        &mut self,
        px: f64,
        py: f64,
        surface: &mut dyn RenderSurface,
    ) -> Option<(Hit, ClickOutcome)> {
        let hit = self.hit_at(px, py)?;
        let outcome = self.calc.click(&self.store, hit.key, hit.point[0]);
        if self.toggles.drop_locator {
            self.locators.push(hit.point);
        }
        self.pointer = Some(hit);
        self.redraw(surface);
        Some((hit, outcome))
    }

    pub fn pointer_move(&mut self, px: f64, py: f64, surface: &mut dyn RenderSurface) -> Option<Hit> {
        self.pointer = self.hit_at(px, py);
        self.draw_pointer(surface);
        self.pointer
    }

    pub fn pointer_leave(&mut self, surface: &mut dyn RenderSurface) {
        self.pointer = None;
        self.draw_pointer(surface);
    }

    pub fn erase_locators(&mut self, surface: &mut dyn RenderSurface) {
        for i in 0..self.locators.len() {
            surface.draw_marker(MarkerKind::Locator(i), None, None);
        }
        self.locators.clear();
    }

    // ─── Window ─────────────────────────────────────────────────────────

    pub fn wheel_zoom(
        &mut self,
        px: f64,
        py: f64,
        factor: f64,
        surface: &mut dyn RenderSurface,
    ) -> Result<ViewWindow, WindowError> {
        let result = self.view.zoom_at(px, py, factor);
        self.redraw(surface);
        result
    }

    pub fn drag_pan(&mut self, dx: f64, dy: f64, surface: &mut dyn RenderSurface) -> Result<ViewWindow, WindowError> {
        let result = self.view.pan_by(dx, dy);
        self.redraw(surface);
        result
    }

    pub fn field_changed(
        &mut self,
        widget: Widget,
        value: f64,
        surface: &mut dyn RenderSurface,
    ) -> Result<ViewWindow, WindowError> {
        let result = self.view.field_edited(widget, value);
        self.redraw(surface);
        result
    }

    pub fn slider_changed(
        &mut self,
        widget: Widget,
        values: [f64; 2],
        surface: &mut dyn RenderSurface,
    ) -> Result<ViewWindow, WindowError> {
        let result = self.view.slider_moved(widget, values);
        self.redraw(surface);
        result
    }

    pub fn reset_zoom(&mut self, surface: &mut dyn RenderSurface) -> Result<ViewWindow, WindowError> {
        let result = self.view.reset_zoom();
        self.redraw(surface);
        result
    }

    pub fn resize(&mut self, width: f64, height: f64, surface: &mut dyn RenderSurface) {
        if self.view.size() == [width, height] {
            return;
        }
        surface.resize(width, height);
        settle(self.view.rebuild_layout(width, height));
        self.redraw(surface);
    }

    // ─── Inventory ──────────────────────────────────────────────────────

    pub fn sync_inventory(&mut self, inventory: &mut dyn Inventory) {
        self.inventory = inventory.fetch_status();
    }

    pub fn set_in_inventory(&mut self, sample: SampleId, saved: bool, inventory: &mut dyn Inventory) {
        let changed = if saved {
            self.inventory.insert(sample)
        } else {
            self.inventory.remove(&sample)
        };
        if changed {
            inventory.persist(&self.inventory);
        }
    }

    // ─── Drawing ────────────────────────────────────────────────────────

    /// Push the whole scene to `surface`.
    pub fn redraw(&mut self, surface: &mut dyn RenderSurface) {
        let scale = self.view.active_scale();
        surface.draw_axis(Axis::X, scale);
        surface.draw_axis(Axis::Y, scale);

        let layers = self.store.layers();
        for series in self.store.iter() {
            for key in [SeriesKey::lab(series.id()), SeriesKey::instrument(series.id())] {
                let curve = self.store.materialized_curve(key).unwrap_or_default();
                let style = self.store.curve_style(key);
                match style {
                    Some(style) if series.active && layers.visible(key.variant) && !curve.is_empty() => {
                        surface.draw_curve(key, curve, &style)
                    }
                    _ => surface.erase_curve(key),
                }
            }
        }

        for (i, p) in self.locators.iter().enumerate() {
            let label = format!("{}, {:.3}", p[0], p[1]);
            surface.draw_marker(MarkerKind::Locator(i), Some(*p), Some(&label));
        }
        self.draw_foci(surface);
        self.draw_pointer(surface);
    }

    fn draw_foci(&mut self, surface: &mut dyn RenderSurface) {
        let tracked: Vec<SeriesKey> = self.calc.sets().iter().map(|(k, _)| *k).collect();
        for key in self.drawn_foci.drain(..) {
            if !tracked.contains(&key) {
                for index in 0..3 {
                    surface.draw_marker(MarkerKind::CalcFocus { key, index }, None, None);
                }
            }
        }
        self.drawn_foci = tracked;

        let shown = match self.calc.mode() {
            CalcMode::Off => 0,
            CalcMode::Slope | CalcMode::Ratio => 2,
            CalcMode::BandDepthCustom | CalcMode::BandDepthMin => 3,
        };
        for (key, foci) in self.calc.sets() {
            for (index, focus) in foci.iter().enumerate() {
                let at = match focus {
                    Focus::Placed { .. } if index < shown => focus.point(),
                    _ => None,
                };
                surface.draw_marker(MarkerKind::CalcFocus { key: *key, index }, at, None);
            }
        }
    }

    fn draw_pointer(&self, surface: &mut dyn RenderSurface) {
        match self.pointer {
            Some(hit) => {
                let [w, v] = hit.point;
                let label = format!("{}, {:.3}", w.round(), v);
                surface.draw_marker(MarkerKind::Pointer, Some(hit.point), Some(&label));
                let line = self.toggles.vertical_line.then_some(hit.point);
                surface.draw_marker(MarkerKind::TrackingLine, line, None);
            }
            None => {
                surface.draw_marker(MarkerKind::Pointer, None, None);
                surface.draw_marker(MarkerKind::TrackingLine, None, None);
            }
        }
    }
}

fn settle(result: Result<ViewWindow, WindowError>) {
    if let Err(e) = result {
        log::warn!("view window kept: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorAllocator;
    use crate::inventory::MemoryInventory;
    use crate::series::Curve;
    use crate::surface::RenderCommand;

    fn samples() -> Vec<Sample> {
        vec![
            Sample {
                id: 1,
                sample_name: "hematite".into(),
                reflectance: Curve(vec![[400.0, 0.10], [500.0, 0.40], [600.0, 0.20]]),
                simulated: Default::default(),
            },
            Sample {
                id: 2,
                sample_name: "basalt".into(),
                reflectance: Curve(vec![[400.0, 0.30], [500.0, 0.20], [600.0, 0.25]]),
                simulated: Default::default(),
            },
        ]
    }

    fn loaded() -> (ViewState, Vec<RenderCommand>) {
        let store = SeriesStore::with_colors(ColorAllocator::seeded(5));
        let mut state = ViewState::with_store(store, 400.0, 300.0);
        let mut out = Vec::new();
        state.load_samples(samples(), &mut out);
        (state, out)
    }

    /// Pixel position of a data point under the current scale.
    fn px(state: &ViewState, p: Point) -> [f64; 2] {
        state.view().active_scale().to_screen(p)
    }

    #[test]
    fn test_load_draws_every_curve() {
        let (state, out) = loaded();
        let curves = out
            .iter()
            .filter(|c| matches!(c, RenderCommand::Curve { .. }))
            .count();
        assert_eq!(curves, 2);
        let w = state.view().window();
        assert!((w.min_x - 390.0).abs() < 1e-9);
        assert!((w.max_y - 0.415).abs() < 1e-9);
    }

    #[test]
    fn test_axes_drawn_before_curves() {
        let (_, out) = loaded();
        let first_curve = out
            .iter()
            .position(|c| matches!(c, RenderCommand::Curve { .. }))
            .unwrap();
        let last_axis = out
            .iter()
            .rposition(|c| matches!(c, RenderCommand::Axis { .. }))
            .unwrap();
        assert!(last_axis < first_curve);
    }

    #[test]
    fn test_toggled_off_sample_is_erased() {
        let (mut state, _) = loaded();
        let mut out = Vec::new();
        state.toggle_sample(2, false, &mut out);
        assert!(out.contains(&RenderCommand::EraseCurve(SeriesKey::lab(2))));
        assert!(!state.store().is_clickable(SeriesKey::lab(2)));
    }

    #[test]
    fn test_click_places_focus_and_locator() {
        let (mut state, _) = loaded();
        let mut out = Vec::new();
        state.toggles.drop_locator = true;
        state.set_calc_mode(CalcMode::Slope, &mut out);

        let [x, y] = px(&state, [400.0, 0.10]);
        let (hit, outcome) = state.pointer_click(x, y, &mut out).unwrap();
        assert_eq!(hit.key, SeriesKey::lab(1));
        assert_eq!(outcome, ClickOutcome::Placed { index: 0 });
        assert_eq!(state.locators(), &[[400.0, 0.10]]);

        let [x, y] = px(&state, [600.0, 0.20]);
        let (_, outcome) = state.pointer_click(x, y, &mut out).unwrap();
        assert_eq!(outcome, ClickOutcome::Completed);
        assert_eq!(state.calc().results()[0].text, "5.000e-4");
        assert!(out.iter().any(|c| matches!(
            c,
            RenderCommand::Marker { kind: MarkerKind::Locator(0), label: Some(l), .. } if l == "400, 0.100"
        )));
    }

    #[test]
    fn test_click_after_completion_removes_focus_markers() {
        let (mut state, _) = loaded();
        let mut out = Vec::new();
        state.set_calc_mode(CalcMode::Ratio, &mut out);
        for p in [[400.0, 0.10], [500.0, 0.40]] {
            let [x, y] = px(&state, p);
            state.pointer_click(x, y, &mut out);
        }
        assert_eq!(state.calc().results().len(), 1);

        out.clear();
        let [x, y] = px(&state, [600.0, 0.20]);
        let (_, outcome) = state.pointer_click(x, y, &mut out).unwrap();
        assert_eq!(outcome, ClickOutcome::Cleared);
        assert!(out.contains(&RenderCommand::Marker {
            kind: MarkerKind::CalcFocus {
                key: SeriesKey::lab(1),
                index: 0
            },
            at: None,
            label: None,
        }));
    }

    #[test]
    fn test_pointer_move_and_leave() {
        let (mut state, _) = loaded();
        let mut out = Vec::new();
        state.toggles.vertical_line = true;
        let [x, y] = px(&state, [500.0, 0.21]);
        let hit = state.pointer_move(x, y, &mut out).unwrap();
        assert_eq!(hit.key, SeriesKey::lab(2));
        assert!(out.contains(&RenderCommand::Marker {
            kind: MarkerKind::Pointer,
            at: Some([500.0, 0.20]),
            label: Some("500, 0.200".to_string()),
        }));
        out.clear();
        state.pointer_leave(&mut out);
        assert!(out.contains(&RenderCommand::Marker {
            kind: MarkerKind::TrackingLine,
            at: None,
            label: None,
        }));
    }

    #[test]
    fn test_normalization_clears_foci_and_refits() {
        let (mut state, _) = loaded();
        let mut out = Vec::new();
        state.set_calc_mode(CalcMode::Slope, &mut out);
        let [x, y] = px(&state, [400.0, 0.10]);
        state.pointer_click(x, y, &mut out);
        assert!(!state.calc().sets().is_empty());

        state.toggle_peak_normalization(true, &mut out);
        assert!(state.calc().sets().is_empty());
        assert_eq!(
            state.normalization_label().as_deref(),
            Some("normalized to 1.0 @ 500nm")
        );
        // basalt scaled by 1 / 0.2
        let b = state.view().data_bounds().unwrap();
        assert!((b.max_y - 1.5).abs() < 1e-9);
        assert!(state.view().window().max_y > 1.5);
    }

    #[test]
    fn test_wavelength_normalization_waits_for_reference() {
        let (mut state, _) = loaded();
        let mut out = Vec::new();
        state.toggle_wavelength_normalization(true, &mut out);
        assert_eq!(state.normalization_label(), None);
        state.set_normalization_wavelength(600.0, &mut out);
        assert_eq!(
            state.normalization_label().as_deref(),
            Some("normalized to 1.0 @ 600nm")
        );
        let c = state.store().materialized_curve(SeriesKey::lab(2)).unwrap();
        assert!((c[2][1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_resize_keeps_window() {
        let (mut state, _) = loaded();
        let before = state.view().window();
        let mut out = Vec::new();
        state.resize(800.0, 600.0, &mut out);
        assert_eq!(out[0], RenderCommand::Resize { width: 800.0, height: 600.0 });
        assert_eq!(state.view().active_window(), before);
    }

    #[test]
    fn test_inventory_persists_changes_only() {
        let (mut state, _) = loaded();
        let mut inv = MemoryInventory::new([2]);
        state.sync_inventory(&mut inv);
        assert!(state.in_inventory(2));
        state.set_in_inventory(2, true, &mut inv);
        assert_eq!(inv.writes, 0);
        state.set_in_inventory(1, true, &mut inv);
        assert_eq!(inv.writes, 1);
        assert_eq!(inv.fetch_status().len(), 2);
    }
}
