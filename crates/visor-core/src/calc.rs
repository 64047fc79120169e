//! On-curve measurements.
//!
//! The user clicks two (or three) wavelengths on a curve; every tracked
//! series gets a triple of foci interpolated from its own materialized
//! curve, and once the last required focus lands the selected measurement
//! is computed per series. A further click clears everything.
//!
//! Focus placement is shared: the n-th click places index n on every
//! tracked series at once, so "apply to all" only changes which series are
//! tracked, never how many clicks a measurement needs.

use serde::{Deserialize, Serialize};

use crate::color::LineColor;
use crate::error::CurveError;
use crate::interp::{self, Point};
use crate::series::{SeriesKey, SeriesStore};

/// Selected measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CalcMode {
    #[default]
    Off,
    Slope,
    Ratio,
    BandDepthCustom,
    BandDepthMin,
}

impl CalcMode {
    pub const ALL: [CalcMode; 5] = [
        CalcMode::Off,
        CalcMode::Slope,
        CalcMode::Ratio,
        CalcMode::BandDepthCustom,
        CalcMode::BandDepthMin,
    ];

    /// Clicks needed before the measurement runs.
    pub fn required_foci(&self) -> usize {
        match self {
            CalcMode::BandDepthCustom => 3,
            _ => 2,
        }
    }

    /// Heading of the result line.
    pub fn result_label(&self) -> &'static str {
        match self {
            CalcMode::Off => "",
            CalcMode::Slope => "slope",
            CalcMode::Ratio => "ratio",
            CalcMode::BandDepthCustom => "band depth @",
            CalcMode::BandDepthMin => "band depth",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CalcMode::Off => "Off",
            CalcMode::Slope => "Slope",
            CalcMode::Ratio => "Ratio",
            CalcMode::BandDepthCustom => "Band depth (custom)",
            CalcMode::BandDepthMin => "Band depth (minimum)",
        }
    }
}

/// One measurement point on one series.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Focus {
    #[default]
    Unset,
    /// Wavelength lies outside this series' domain.
    OutOfBounds { wavelength: f64 },
    Placed { wavelength: f64, value: f64 },
}

impl Focus {
    pub fn point(&self) -> Option<Point> {
        match *self {
            Focus::Placed { wavelength, value } => Some([wavelength, value]),
            _ => None,
        }
    }

    fn at(curve: Option<&[Point]>, wavelength: f64) -> Self {
        match curve.map(|c| interp::value_at(c, wavelength)) {
            Some(Ok(value)) => Focus::Placed { wavelength, value },
            Some(Err(e)) => {
                log::debug!("focus at {} nm not placed: {}", wavelength, e);
                Focus::OutOfBounds { wavelength }
            }
            None => Focus::OutOfBounds { wavelength },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcState {
    Idle,
    /// `n` foci placed, more needed.
    Partial(usize),
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Tool is off.
    Ignored,
    /// Another series already holds the single-series focus.
    Rejected,
    /// The measurement was complete; all foci removed.
    Cleared,
    Placed { index: usize },
    Completed,
}

/// A computed measurement for one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalcResult {
    pub key: SeriesKey,
    pub mode: CalcMode,
    pub value: f64,
    pub text: String,
    /// The minimum located by a band-depth-min pass.
    pub minimum: Option<Point>,
}

/// One result line, drawn in its series' colour.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryValue {
    pub key: SeriesKey,
    pub color: LineColor,
    pub text: String,
}

/// Text shown alongside the plot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CalcSummary {
    pub shoulders: Vec<String>,
    pub heading: Option<String>,
    pub values: Vec<SummaryValue>,
}

#[derive(Debug, Clone, Default)]
pub struct CalcFoci {
    mode: CalcMode,
    apply_to_all: bool,
    sets: Vec<(SeriesKey, [Focus; 3])>,
    /// Series holding the single-series focus; `None` in shared mode.
    focused: Option<SeriesKey>,
    placed: [bool; 3],
    wavelengths: [Option<f64>; 3],
    results: Vec<CalcResult>,
}

impl CalcFoci {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Accessors ──────────────────────────────────────────────────────

    pub fn mode(&self) -> CalcMode {
        self.mode
    }

    pub fn apply_to_all(&self) -> bool {
        self.apply_to_all
    }

    pub fn focused(&self) -> Option<SeriesKey> {
        self.focused
    }

    pub fn sets(&self) -> &[(SeriesKey, [Focus; 3])] {
        &self.sets
    }

    pub fn foci(&self, key: SeriesKey) -> Option<&[Focus; 3]> {
        self.sets.iter().find(|(k, _)| *k == key).map(|(_, f)| f)
    }

    pub fn wavelengths(&self) -> [Option<f64>; 3] {
        self.wavelengths
    }

    pub fn results(&self) -> &[CalcResult] {
        &self.results
    }

    pub fn is_complete(&self) -> bool {
        self.placed[self.mode.required_foci() - 1]
    }

    pub fn state(&self) -> CalcState {
        if self.is_complete() {
            return CalcState::Complete;
        }
        match self.placed.iter().filter(|p| **p).count() {
            0 => CalcState::Idle,
            n => CalcState::Partial(n),
        }
    }

    // ─── Transitions ────────────────────────────────────────────────────

    /// A click landed on `key` at `wavelength`.
    pub fn click(&mut self, store: &SeriesStore, key: SeriesKey, wavelength: f64) -> ClickOutcome {
        if self.mode == CalcMode::Off {
            return ClickOutcome::Ignored;
        }
        if self.is_complete() {
            self.clear();
            return ClickOutcome::Cleared;
        }
        if !self.focus_on(store, key) {
            log::debug!("calc click on {} rejected, focus is on {:?}", key, self.focused);
            return ClickOutcome::Rejected;
        }
        let required = self.mode.required_foci();
        let Some(index) = (0..required).find(|&i| !self.placed[i]) else {
            return ClickOutcome::Ignored;
        };
        self.move_foci(store, index, wavelength);
        self.placed[index] = true;
        self.wavelengths[index] = Some(wavelength);

        if self.is_complete() {
            self.recalculate(store);
            ClickOutcome::Completed
        } else {
            ClickOutcome::Placed { index }
        }
    }

    /// Make sure `key` is tracked. `false` means the click must be refused.
    fn focus_on(&mut self, store: &SeriesStore, key: SeriesKey) -> bool {
        if !self.apply_to_all {
            if self.focused.is_some_and(|f| f != key) {
                return false;
            }
            self.focused = Some(key);
            if self.sets.is_empty() {
                self.sets.push((key, [Focus::Unset; 3]));
            }
            return true;
        }

        if !self.sets.is_empty() {
            if self.focused.is_some() {
                self.spread(store);
            }
            return true;
        }
        for k in store.clickable_keys() {
            self.sets.push((k, [Focus::Unset; 3]));
        }
        self.focused = None;
        true
    }

    /// Give every clickable series a copy of the focused series' foci and
    /// switch to shared mode.
    fn spread(&mut self, store: &SeriesStore) {
        let Some(focused) = self.focused else {
            return;
        };
        let source = self.foci(focused).copied().unwrap_or_default();
        for k in store.clickable_keys() {
            if self.foci(k).is_none() {
                self.sets.push((k, [Focus::Unset; 3]));
            }
        }
        for (index, focus) in source.iter().enumerate() {
            if let Focus::Placed { wavelength, .. } = *focus {
                self.move_foci(store, index, wavelength);
            }
        }
        log::debug!("spread foci of {} to {} series", focused, self.sets.len());
        self.focused = None;
    }

    /// Place index `index` of every tracked set at `wavelength`.
    fn move_foci(&mut self, store: &SeriesStore, index: usize, wavelength: f64) {
        for (key, foci) in &mut self.sets {
            foci[index] = Focus::at(store.materialized_curve(*key), wavelength);
        }
    }

    pub fn clear(&mut self) {
        self.sets.clear();
        self.focused = None;
        self.placed = [false; 3];
        self.wavelengths = [None; 3];
        self.results.clear();
    }

    /// Leaving band-depth-min keeps the located minimum in `foci[2]`, so it
    /// stays on screen until a third click in custom mode replaces it.
    /// `placed[2]` is never set by a computed minimum.
    pub fn set_mode(&mut self, store: &SeriesStore, mode: CalcMode) {
        self.mode = mode;
        if mode != CalcMode::Off && self.is_complete() {
            self.recalculate(store);
        } else {
            self.results.clear();
        }
    }

    /// Switching off drops every focus; switching on spreads an existing
    /// single-series selection to every clickable series.
    pub fn set_apply_to_all(&mut self, store: &SeriesStore, apply_to_all: bool) {
        self.apply_to_all = apply_to_all;
        if !apply_to_all {
            self.clear();
            return;
        }
        if !self.sets.is_empty() {
            self.spread(store);
        }
        if self.mode != CalcMode::Off && self.is_complete() {
            self.recalculate(store);
        }
    }

    /// Re-read placed foci from the current curves. Sets whose series is
    /// gone are dropped.
    pub fn refresh(&mut self, store: &SeriesStore) {
        self.sets.retain(|(k, _)| store.get(k.sample).is_some());
        if self.focused.is_some_and(|k| store.get(k.sample).is_none()) {
            self.focused = None;
        }
        for (key, foci) in &mut self.sets {
            let curve = store.materialized_curve(*key);
            for focus in foci.iter_mut() {
                let wavelength = match *focus {
                    Focus::Unset => continue,
                    Focus::OutOfBounds { wavelength } | Focus::Placed { wavelength, .. } => wavelength,
                };
                *focus = Focus::at(curve, wavelength);
            }
        }
        if self.mode != CalcMode::Off && self.is_complete() {
            self.recalculate(store);
        }
    }

    /// Compute the current mode for every set with its boundary foci
    /// placed.
    pub fn recalculate(&mut self, store: &SeriesStore) {
        self.results.clear();
        let mode = self.mode;
        for (key, foci) in &mut self.sets {
            let (Some(p1), Some(p2)) = (foci[0].point(), foci[1].point()) else {
                continue;
            };
            let outcome = match mode {
                CalcMode::Off => continue,
                CalcMode::Slope => {
                    let v = slope(p1, p2);
                    Ok((v, format!("{:.3e}", v), None))
                }
                CalcMode::Ratio => {
                    let v = ratio(p1, p2);
                    Ok((v, format!("{:.3}", v), None))
                }
                CalcMode::BandDepthCustom => match foci[2].point() {
                    Some(p3) => {
                        let v = continuum_depth(p1, p2, p3);
                        Ok((v, format!("{:.3}", v), None))
                    }
                    None => continue,
                },
                CalcMode::BandDepthMin => store
                    .materialized_curve(*key)
                    .ok_or(CurveError::EmptyInterval)
                    .and_then(|c| band_depth_min(c, p1, p2))
                    .map(|(v, min)| {
                        (v, format!("{:.3} @ {:.0}nm", v, min[0]), Some(min))
                    }),
            };
            match outcome {
                Ok((value, text, minimum)) => {
                    if let Some([wavelength, value]) = minimum {
                        foci[2] = Focus::Placed { wavelength, value };
                    }
                    self.results.push(CalcResult {
                        key: *key,
                        mode,
                        value,
                        text,
                        minimum,
                    });
                }
                Err(e) => log::debug!("skipping {} in {:?} pass: {}", key, mode, e),
            }
        }
        log::debug!("{:?}: {} result(s)", mode, self.results.len());
    }

    /// Shoulder wavelengths and per-series result values.
    pub fn summary(&self, store: &SeriesStore) -> CalcSummary {
        let mut summary = CalcSummary::default();
        let Some(left) = self.wavelengths[0] else {
            return summary;
        };
        summary.shoulders.push(format!("L shoulder: {}nm", left));
        if let Some(right) = self.wavelengths[1] {
            summary.shoulders.push(format!("R shoulder: {}nm", right));
        }
        if self.results.is_empty() {
            return summary;
        }
        summary.heading = Some(match (self.mode, self.wavelengths[2]) {
            (CalcMode::BandDepthCustom, Some(w)) => {
                format!("{} {}nm:", self.mode.result_label(), w)
            }
            _ => format!("{}:", self.mode.result_label()),
        });
        for r in &self.results {
            let color = store
                .get(r.key.sample)
                .map(|s| s.color_of(r.key.variant))
                .unwrap_or(LineColor::FALLBACK);
            summary.values.push(SummaryValue {
                key: r.key,
                color,
                text: r.text.clone(),
            });
        }
        summary
    }
}

// ─── Measurements ───────────────────────────────────────────────────────

pub fn slope(p1: Point, p2: Point) -> f64 {
    (p2[1] - p1[1]) / (p2[0] - p1[0])
}

/// Smaller over larger value, so never above 1 for positive input.
pub fn ratio(p1: Point, p2: Point) -> f64 {
    if p1[1] < p2[1] {
        p1[1] / p2[1]
    } else {
        p2[1] / p1[1]
    }
}

/// `1 - y3 / continuum(x3)` for the straight continuum through `p1`, `p2`.
pub fn continuum_depth(p1: Point, p2: Point, p3: Point) -> f64 {
    let continuum = p1[1] + slope(p1, p2) * (p3[0] - p1[0]);
    1.0 - p3[1] / continuum
}

/// Depth at the lowest sample strictly between the two boundaries.
///
/// Boundaries are ordered by their located index on `curve`, so click
/// order does not matter for the search window. Ties go to the lowest
/// index. Returns the depth and the minimum sample.
pub fn band_depth_min(curve: &[Point], p1: Point, p2: Point) -> Result<(f64, Point), CurveError> {
    let i1 = interp::locate_index(p1[0], curve)?;
    let i2 = interp::locate_index(p2[0], curve)?;
    let (lo, hi) = if i1 > i2 { (i2, i1) } else { (i1, i2) };
    if hi <= lo + 1 {
        return Err(CurveError::EmptyInterval);
    }
    let mut min = curve[lo + 1];
    for &p in &curve[lo + 2..hi] {
        if p[1] < min[1] {
            min = p;
        }
    }
    Ok((continuum_depth(p1, p2, min), min))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorAllocator;
    use crate::series::{Curve, LayerVisibility, Sample};

    fn store() -> SeriesStore {
        let mut store = SeriesStore::with_colors(ColorAllocator::seeded(11));
        store.load(vec![
            Sample {
                id: 1,
                sample_name: "one".into(),
                reflectance: Curve(vec![[400.0, 0.10], [500.0, 0.40], [600.0, 0.20]]),
                simulated: Default::default(),
            },
            Sample {
                id: 2,
                sample_name: "two".into(),
                reflectance: Curve(vec![[450.0, 0.30], [500.0, 0.10], [550.0, 0.30]]),
                simulated: Default::default(),
            },
        ]);
        store
    }

    #[test]
    fn test_pure_measurements() {
        assert!((slope([400.0, 0.1], [600.0, 0.2]) - 5.0e-4).abs() < 1e-15);
        assert!((ratio([1.0, 0.2], [2.0, 0.4]) - 0.5).abs() < 1e-12);
        assert!((ratio([1.0, 0.4], [2.0, 0.2]) - 0.5).abs() < 1e-12);
        let d = continuum_depth([400.0, 0.4], [600.0, 0.4], [500.0, 0.1]);
        assert!((d - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_band_depth_min_order_independent() {
        let curve = vec![[400.0, 0.5], [450.0, 0.2], [500.0, 0.2], [550.0, 0.4], [600.0, 0.5]];
        let (_, a) = band_depth_min(&curve, [400.0, 0.5], [600.0, 0.5]).unwrap();
        let (_, b) = band_depth_min(&curve, [600.0, 0.5], [400.0, 0.5]).unwrap();
        assert_eq!(a, [450.0, 0.2]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_band_depth_min_empty_interval() {
        let curve = vec![[400.0, 0.5], [450.0, 0.2]];
        assert_eq!(
            band_depth_min(&curve, [400.0, 0.5], [450.0, 0.2]),
            Err(CurveError::EmptyInterval)
        );
    }

    #[test]
    fn test_off_ignores_clicks() {
        let s = store();
        let mut calc = CalcFoci::new();
        assert_eq!(calc.click(&s, SeriesKey::lab(1), 400.0), ClickOutcome::Ignored);
        assert_eq!(calc.state(), CalcState::Idle);
    }

    #[test]
    fn test_ratio_cycle() {
        let s = store();
        let mut calc = CalcFoci::new();
        calc.set_mode(&s, CalcMode::Ratio);
        let key = SeriesKey::lab(1);
        assert_eq!(calc.click(&s, key, 400.0), ClickOutcome::Placed { index: 0 });
        assert_eq!(calc.state(), CalcState::Partial(1));
        assert_eq!(calc.click(&s, key, 500.0), ClickOutcome::Completed);
        assert_eq!(calc.results().len(), 1);
        assert_eq!(calc.results()[0].text, "0.250");
        assert_eq!(calc.click(&s, key, 450.0), ClickOutcome::Cleared);
        assert_eq!(calc.state(), CalcState::Idle);
        assert!(calc.sets().is_empty());
        assert!(calc.results().is_empty());
    }

    #[test]
    fn test_custom_needs_three_clicks() {
        let s = store();
        let mut calc = CalcFoci::new();
        calc.set_mode(&s, CalcMode::BandDepthCustom);
        let key = SeriesKey::lab(1);
        calc.click(&s, key, 400.0);
        assert_eq!(calc.click(&s, key, 600.0), ClickOutcome::Placed { index: 1 });
        assert_eq!(calc.click(&s, key, 500.0), ClickOutcome::Completed);
        assert_eq!(calc.results()[0].text, "-1.667");

        let summary = calc.summary(&s);
        assert_eq!(summary.shoulders, vec!["L shoulder: 400nm", "R shoulder: 600nm"]);
        assert_eq!(summary.heading.as_deref(), Some("band depth @ 500nm:"));
        assert_eq!(summary.values.len(), 1);
    }

    #[test]
    fn test_out_of_bounds_series_skipped() {
        let s = store();
        let mut calc = CalcFoci::new();
        calc.set_mode(&s, CalcMode::Slope);
        calc.set_apply_to_all(&s, true);
        calc.click(&s, SeriesKey::lab(1), 400.0);
        calc.click(&s, SeriesKey::lab(1), 500.0);
        assert_eq!(calc.sets().len(), 2);
        assert_eq!(
            calc.foci(SeriesKey::lab(2)).unwrap()[0],
            Focus::OutOfBounds { wavelength: 400.0 }
        );
        assert_eq!(calc.results().len(), 1);
        assert_eq!(calc.results()[0].key, SeriesKey::lab(1));
    }

    #[test]
    fn test_apply_to_all_spreads_complete_selection() {
        let s = store();
        let mut calc = CalcFoci::new();
        calc.set_mode(&s, CalcMode::Ratio);
        calc.click(&s, SeriesKey::lab(2), 450.0);
        calc.click(&s, SeriesKey::lab(2), 500.0);
        assert_eq!(calc.results().len(), 1);

        calc.set_apply_to_all(&s, true);
        assert_eq!(calc.focused(), None);
        assert_eq!(calc.sets().len(), 2);
        let one = calc.foci(SeriesKey::lab(1)).unwrap();
        assert_eq!(one[1], Focus::Placed { wavelength: 500.0, value: 0.40 });
        assert_eq!(calc.results().len(), 2);

        calc.set_apply_to_all(&s, false);
        assert!(calc.sets().is_empty());
    }

    #[test]
    fn test_apply_to_all_spreads_partial_selection() {
        let s = store();
        let mut calc = CalcFoci::new();
        calc.set_mode(&s, CalcMode::Ratio);
        assert_eq!(calc.click(&s, SeriesKey::lab(1), 500.0), ClickOutcome::Placed { index: 0 });
        assert_eq!(calc.focused(), Some(SeriesKey::lab(1)));

        calc.set_apply_to_all(&s, true);
        assert_eq!(calc.focused(), None);
        assert_eq!(calc.state(), CalcState::Partial(1));
        assert!(calc.results().is_empty());
        assert_eq!(
            calc.foci(SeriesKey::lab(1)).unwrap()[0],
            Focus::Placed { wavelength: 500.0, value: 0.40 }
        );
        assert_eq!(
            calc.foci(SeriesKey::lab(2)).unwrap()[0],
            Focus::Placed { wavelength: 500.0, value: 0.10 }
        );

        // Any clickable series may finish the shared set.
        assert_eq!(calc.click(&s, SeriesKey::lab(2), 450.0), ClickOutcome::Completed);
        let one = calc.foci(SeriesKey::lab(1)).unwrap();
        assert!((one[1].point().unwrap()[1] - 0.25).abs() < 1e-12);
        let texts: Vec<_> = calc.results().iter().map(|r| (r.key, r.text.as_str())).collect();
        assert_eq!(
            texts,
            vec![(SeriesKey::lab(1), "0.625"), (SeriesKey::lab(2), "0.333")]
        );
    }

    #[test]
    fn test_mode_change_recalculates() {
        let s = store();
        let mut calc = CalcFoci::new();
        calc.set_mode(&s, CalcMode::Slope);
        calc.click(&s, SeriesKey::lab(1), 400.0);
        calc.click(&s, SeriesKey::lab(1), 600.0);
        calc.set_mode(&s, CalcMode::BandDepthMin);
        assert_eq!(calc.results()[0].text, "-1.667 @ 500nm");
        assert_eq!(
            calc.foci(SeriesKey::lab(1)).unwrap()[2],
            Focus::Placed { wavelength: 500.0, value: 0.40 }
        );

        calc.set_mode(&s, CalcMode::BandDepthCustom);
        assert_eq!(calc.state(), CalcState::Partial(2));
        assert!(calc.results().is_empty());
        // The computed minimum is still drawn but counts as unplaced.
        assert!(calc.foci(SeriesKey::lab(1)).unwrap()[2].point().is_some());
        assert_eq!(calc.wavelengths()[2], None);
    }

    #[test]
    fn test_refresh_follows_offset() {
        let mut s = store();
        let mut calc = CalcFoci::new();
        calc.set_mode(&s, CalcMode::Slope);
        calc.click(&s, SeriesKey::lab(1), 400.0);
        s.set_offset(1, 0.5);
        calc.refresh(&s);
        assert_eq!(
            calc.foci(SeriesKey::lab(1)).unwrap()[0],
            Focus::Placed { wavelength: 400.0, value: 0.6 }
        );
        s.remove(1);
        calc.refresh(&s);
        assert!(calc.sets().is_empty());
        assert_eq!(calc.focused(), None);
    }

    #[test]
    fn test_apply_to_all_tracks_every_clickable_series() {
        let mut s = store();
        s.set_layers(LayerVisibility {
            lab_points: true,
            ..LayerVisibility::default()
        });
        let mut calc = CalcFoci::new();
        calc.set_mode(&s, CalcMode::Slope);
        calc.set_apply_to_all(&s, true);
        calc.click(&s, SeriesKey::lab(1), 500.0);
        assert_eq!(calc.sets().len(), 2);
    }
}
