//! Spectral series store.
//!
//! Holds every loaded sample, its colours and offset, the process-wide
//! normalization mode and the currently selected instrument filter set.
//! Rendering, hit-testing and measurement only ever read the
//! *materialized* curves kept here: raw values mapped through
//! `value * scale + offset`.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::color::{ColorAllocator, LineColor};
use crate::interp::{self, Point};
use crate::surface::CurveStyle;
use crate::window::DataBounds;

pub type SampleId = u64;

// ─── Keys ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Variant {
    /// Lab-measured reflectance.
    Lab,
    /// Reflectance simulated through the selected instrument filter set.
    Instrument,
}

/// Addresses one drawable curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesKey {
    pub sample: SampleId,
    pub variant: Variant,
}

impl SeriesKey {
    pub fn lab(sample: SampleId) -> Self {
        Self {
            sample,
            variant: Variant::Lab,
        }
    }

    pub fn instrument(sample: SampleId) -> Self {
        Self {
            sample,
            variant: Variant::Instrument,
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variant {
            Variant::Lab => write!(f, "{}", self.sample),
            Variant::Instrument => write!(f, "{}_r", self.sample),
        }
    }
}

// ─── Input records ──────────────────────────────────────────────────────

/// Ordered `[wavelength, value]` samples.
///
/// Deserializes from either a JSON object of `"wavelength": value` entries
/// (kept in document order) or an array of pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Curve(pub Vec<Point>);

impl Curve {
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Point>> for Curve {
    fn from(points: Vec<Point>) -> Self {
        Self(points)
    }
}

struct CurveVisitor;

impl<'de> Visitor<'de> for CurveVisitor {
    type Value = Curve;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of wavelength to value or a list of [wavelength, value] pairs")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Curve, A::Error> {
        let mut points = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, f64>()? {
            let wavelength: f64 = key
                .trim()
                .parse()
                .map_err(|_| de::Error::custom(format!("bad wavelength key '{}'", key)))?;
            points.push([wavelength, value]);
        }
        Ok(Curve(points))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Curve, A::Error> {
        let mut points = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some((wavelength, value)) = seq.next_element::<(f64, f64)>()? {
            points.push([wavelength, value]);
        }
        Ok(Curve(points))
    }
}

impl<'de> Deserialize<'de> for Curve {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CurveVisitor)
    }
}

/// One sample as delivered by the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub id: SampleId,
    pub sample_name: String,
    pub reflectance: Curve,
    /// Instrument-simulated reflectance keyed by filter-set name.
    #[serde(default)]
    pub simulated: BTreeMap<String, Curve>,
}

// ─── Modes and toggles ──────────────────────────────────────────────────

/// Which curve layers are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerVisibility {
    pub lab_lines: bool,
    pub lab_points: bool,
    pub instrument_lines: bool,
    pub instrument_points: bool,
}

impl LayerVisibility {
    pub fn lab_visible(&self) -> bool {
        self.lab_lines || self.lab_points
    }

    pub fn instrument_visible(&self) -> bool {
        self.instrument_lines || self.instrument_points
    }

    pub fn visible(&self, variant: Variant) -> bool {
        match variant {
            Variant::Lab => self.lab_visible(),
            Variant::Instrument => self.instrument_visible(),
        }
    }
}

impl Default for LayerVisibility {
    fn default() -> Self {
        Self {
            lab_lines: true,
            lab_points: false,
            instrument_lines: false,
            instrument_points: false,
        }
    }
}

/// Process-wide normalization applied to every series.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Normalization {
    #[default]
    None,
    /// 1.0 at the wavelength where the first loaded sample peaks.
    Peak,
    /// 1.0 at a chosen wavelength; scale 1 until one is chosen.
    Wavelength(Option<f64>),
}

// ─── Store ──────────────────────────────────────────────────────────────

/// A loaded sample plus everything derived from it.
#[derive(Debug, Clone)]
pub struct Series {
    pub sample: Sample,
    pub color: LineColor,
    pub instrument_color: LineColor,
    pub offset: f64,
    pub active: bool,
    scale: f64,
    lab: Vec<Point>,
    instrument: Vec<Point>,
}

impl Series {
    pub fn id(&self) -> SampleId {
        self.sample.id
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn color_of(&self, variant: Variant) -> LineColor {
        match variant {
            Variant::Lab => self.color,
            Variant::Instrument => self.instrument_color,
        }
    }

    fn materialized(&self, variant: Variant) -> &[Point] {
        match variant {
            Variant::Lab => &self.lab,
            Variant::Instrument => &self.instrument,
        }
    }

    fn rematerialize(&mut self, reference: Option<f64>, filter_set: Option<&str>) {
        self.scale = match reference {
            Some(r) => match interp::normalization_scale(self.sample.reflectance.points(), r) {
                Ok(s) if s.is_finite() => s,
                Ok(s) => {
                    log::warn!(
                        "sample {} has non-finite scale {} at {} nm, leaving unscaled",
                        self.sample.id,
                        s,
                        r
                    );
                    1.0
                }
                Err(e) => {
                    log::warn!("sample {} cannot be normalized: {}", self.sample.id, e);
                    1.0
                }
            },
            None => 1.0,
        };
        let (scale, offset) = (self.scale, self.offset);
        let map = |c: &Curve| -> Vec<Point> {
            c.points()
                .iter()
                .map(|&[w, v]| [w, v * scale + offset])
                .collect()
        };
        self.lab = map(&self.sample.reflectance);
        self.instrument = filter_set
            .and_then(|name| self.sample.simulated.get(name))
            .map(map)
            .unwrap_or_default();
    }
}

/// Every loaded series in load order.
#[derive(Debug, Clone)]
pub struct SeriesStore {
    series: Vec<Series>,
    colors: ColorAllocator,
    filter_set: Option<String>,
    layers: LayerVisibility,
    normalization: Normalization,
    auto_norm_wavelength: Option<f64>,
}

impl Default for SeriesStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SeriesStore {
    pub fn new() -> Self {
        Self::with_colors(ColorAllocator::new())
    }

    pub fn with_colors(colors: ColorAllocator) -> Self {
        Self {
            series: Vec::new(),
            colors,
            filter_set: None,
            layers: LayerVisibility::default(),
            normalization: Normalization::None,
            auto_norm_wavelength: None,
        }
    }

    /// Register samples in input order. Ids already present are skipped.
    /// Returns how many were added.
    pub fn load(&mut self, samples: Vec<Sample>) -> usize {
        let mut added = 0;
        for sample in samples {
            if self.get(sample.id).is_some() {
                log::warn!("sample {} already loaded, skipping", sample.id);
                continue;
            }
            if self.filter_set.is_none() {
                self.filter_set = sample.simulated.keys().next().cloned();
            }
            if self.auto_norm_wavelength.is_none() {
                self.auto_norm_wavelength = interp::argmax_wavelength(sample.reflectance.points());
            }
            let color = self.colors.allocate();
            let mut series = Series {
                instrument_color: color.complementary(),
                color,
                offset: 0.0,
                active: true,
                scale: 1.0,
                lab: Vec::new(),
                instrument: Vec::new(),
                sample,
            };
            series.rematerialize(self.reference_wavelength(), self.filter_set.as_deref());
            log::debug!(
                "loaded sample {} '{}' ({} points, colour {})",
                series.id(),
                series.sample.sample_name,
                series.lab.len(),
                series.color
            );
            self.series.push(series);
            added += 1;
        }
        added
    }

    /// Drop a sample and give its colour back.
    pub fn remove(&mut self, sample: SampleId) -> Option<Sample> {
        let idx = self.series.iter().position(|s| s.id() == sample)?;
        let series = self.series.remove(idx);
        self.colors.release(series.color);
        Some(series.sample)
    }

    pub fn get(&self, sample: SampleId) -> Option<&Series> {
        self.series.iter().find(|s| s.id() == sample)
    }

    fn get_mut(&mut self, sample: SampleId) -> Option<&mut Series> {
        self.series.iter_mut().find(|s| s.id() == sample)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Series> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    // ─── Mutators ───────────────────────────────────────────────────────

    /// Returns `false` for an unknown sample.
    pub fn set_active(&mut self, sample: SampleId, active: bool) -> bool {
        match self.get_mut(sample) {
            Some(s) => {
                s.active = active;
                true
            }
            None => false,
        }
    }

    pub fn set_offset(&mut self, sample: SampleId, offset: f64) -> bool {
        let reference = self.reference_wavelength();
        let filter_set = self.filter_set.clone();
        match self.get_mut(sample) {
            Some(s) => {
                s.offset = offset;
                s.rematerialize(reference, filter_set.as_deref());
                true
            }
            None => false,
        }
    }

    pub fn set_filter_set(&mut self, name: &str) {
        log::debug!("filter set -> {}", name);
        self.filter_set = Some(name.to_string());
        self.rematerialize_all();
    }

    pub fn set_normalization(&mut self, mode: Normalization) {
        log::debug!("normalization -> {:?}", mode);
        self.normalization = mode;
        self.rematerialize_all();
    }

    pub fn set_layers(&mut self, layers: LayerVisibility) {
        self.layers = layers;
    }

    fn rematerialize_all(&mut self) {
        let reference = self.reference_wavelength();
        let filter_set = self.filter_set.clone();
        for s in &mut self.series {
            s.rematerialize(reference, filter_set.as_deref());
        }
    }

    // ─── Queries ────────────────────────────────────────────────────────

    pub fn filter_set(&self) -> Option<&str> {
        self.filter_set.as_deref()
    }

    /// Every filter-set name offered by at least one sample.
    pub fn filter_sets(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .series
            .iter()
            .flat_map(|s| s.sample.simulated.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn layers(&self) -> LayerVisibility {
        self.layers
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    pub fn auto_norm_wavelength(&self) -> Option<f64> {
        self.auto_norm_wavelength
    }

    /// Wavelength every series is normalized to, if any.
    pub fn reference_wavelength(&self) -> Option<f64> {
        match self.normalization {
            Normalization::None => None,
            Normalization::Peak => self.auto_norm_wavelength,
            Normalization::Wavelength(w) => w,
        }
    }

    pub fn materialized_curve(&self, key: SeriesKey) -> Option<&[Point]> {
        self.get(key.sample).map(|s| s.materialized(key.variant))
    }

    pub fn is_clickable(&self, key: SeriesKey) -> bool {
        match self.get(key.sample) {
            Some(s) => {
                s.active
                    && self.layers.visible(key.variant)
                    && !s.materialized(key.variant).is_empty()
            }
            None => false,
        }
    }

    /// Clickable keys in load order, lab before instrument.
    pub fn clickable_keys(&self) -> Vec<SeriesKey> {
        self.series
            .iter()
            .flat_map(|s| [SeriesKey::lab(s.id()), SeriesKey::instrument(s.id())])
            .filter(|k| self.is_clickable(*k))
            .collect()
    }

    /// Extent of the raw lab reflectance of every loaded sample.
    pub fn bounds_from_samples(&self) -> Option<DataBounds> {
        self.series
            .iter()
            .filter_map(|s| DataBounds::from_points(s.sample.reflectance.points()))
            .reduce(|a, b| a.union(&b))
    }

    /// Extent of the materialized lab and instrument curves of every
    /// active series.
    pub fn bounds_from_active_series(&self) -> Option<DataBounds> {
        self.series
            .iter()
            .filter(|s| s.active)
            .flat_map(|s| [s.lab.as_slice(), s.instrument.as_slice()])
            .filter_map(|c| DataBounds::from_points(c))
            .reduce(|a, b| a.union(&b))
    }

    pub fn series_label(&self, key: SeriesKey) -> Option<String> {
        let s = self.get(key.sample)?;
        Some(match (key.variant, self.filter_set()) {
            (Variant::Instrument, Some(fs)) => format!("{} ({})", s.sample.sample_name, fs),
            _ => s.sample.sample_name.clone(),
        })
    }

    pub fn curve_style(&self, key: SeriesKey) -> Option<CurveStyle> {
        let s = self.get(key.sample)?;
        let style = match key.variant {
            Variant::Lab => CurveStyle {
                color: s.color,
                lines: self.layers.lab_lines,
                points: self.layers.lab_points,
                dashed: false,
                width: 1.5,
            },
            Variant::Instrument => CurveStyle {
                color: s.instrument_color,
                lines: self.layers.instrument_lines,
                points: self.layers.instrument_points,
                dashed: true,
                width: 1.5,
            },
        };
        Some(style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: SampleId, points: Vec<Point>) -> Sample {
        let simulated_points = points.iter().map(|&[w, v]| [w, v / 2.0]).collect();
        let mut simulated = BTreeMap::new();
        simulated.insert("pancam".to_string(), Curve(simulated_points));
        Sample {
            id,
            sample_name: format!("sample {}", id),
            reflectance: Curve(points),
            simulated,
        }
    }

    fn store() -> SeriesStore {
        let mut store = SeriesStore::with_colors(ColorAllocator::seeded(3));
        store.load(vec![
            sample(1, vec![[400.0, 0.2], [500.0, 0.5], [600.0, 0.4]]),
            sample(2, vec![[400.0, 0.1], [500.0, 0.2], [600.0, 0.8]]),
        ]);
        store
    }

    #[test]
    fn test_curve_from_object_keeps_document_order() {
        let json = r#"{"600": 0.3, "400.5": 0.1, "500": 0.2}"#;
        let c: Curve = serde_json::from_str(json).unwrap();
        assert_eq!(c.0, vec![[600.0, 0.3], [400.5, 0.1], [500.0, 0.2]]);
    }

    #[test]
    fn test_curve_from_pairs() {
        let c: Curve = serde_json::from_str("[[400, 0.1], [410, 0.2]]").unwrap();
        assert_eq!(c.0, vec![[400.0, 0.1], [410.0, 0.2]]);
        assert!(serde_json::from_str::<Curve>(r#"{"abc": 1.0}"#).is_err());
    }

    #[test]
    fn test_sample_record_without_simulated() {
        let json = r#"{"id": 9, "sample_name": "basalt", "reflectance": {"400": 0.1}}"#;
        let s: Sample = serde_json::from_str(json).unwrap();
        assert_eq!(s.id, 9);
        assert!(s.simulated.is_empty());
    }

    #[test]
    fn test_key_display() {
        assert_eq!(SeriesKey::lab(12).to_string(), "12");
        assert_eq!(SeriesKey::instrument(12).to_string(), "12_r");
    }

    #[test]
    fn test_load_assigns_distinct_colours() {
        let s = store();
        let a = s.get(1).unwrap();
        let b = s.get(2).unwrap();
        assert_ne!(a.color, b.color);
        assert_eq!(a.instrument_color, a.color.complementary());
        assert_eq!(s.filter_set(), Some("pancam"));
        assert_eq!(s.auto_norm_wavelength(), Some(500.0));
    }

    #[test]
    fn test_duplicate_ids_are_skipped() {
        let mut s = store();
        assert_eq!(s.load(vec![sample(1, vec![[1.0, 1.0]])]), 0);
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_offset_and_scale_materialize() {
        let mut s = store();
        s.set_offset(1, 0.1);
        let c = s.materialized_curve(SeriesKey::lab(1)).unwrap();
        assert!((c[1][1] - 0.6).abs() < 1e-12);

        s.set_normalization(Normalization::Wavelength(Some(600.0)));
        let c = s.materialized_curve(SeriesKey::lab(1)).unwrap();
        assert!((c[2][1] - 1.1).abs() < 1e-12);
        let c = s.materialized_curve(SeriesKey::lab(2)).unwrap();
        assert!((c[2][1] - 1.0).abs() < 1e-12);
        // instrument curve shares the lab scale
        let c = s.materialized_curve(SeriesKey::instrument(2)).unwrap();
        assert!((c[2][1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_peak_normalizes_at_first_sample_maximum() {
        let mut s = store();
        s.set_normalization(Normalization::Peak);
        assert_eq!(s.reference_wavelength(), Some(500.0));
        let c = s.materialized_curve(SeriesKey::lab(2)).unwrap();
        assert!((c[1][1] - 1.0).abs() < 1e-12);

        s.set_normalization(Normalization::Wavelength(None));
        let c = s.materialized_curve(SeriesKey::lab(2)).unwrap();
        assert!((c[1][1] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_zero_reference_value_leaves_series_unscaled() {
        let mut s = SeriesStore::with_colors(ColorAllocator::seeded(1));
        s.load(vec![sample(5, vec![[400.0, 0.0], [500.0, 0.3]])]);
        s.set_normalization(Normalization::Wavelength(Some(400.0)));
        assert_eq!(s.get(5).unwrap().scale(), 1.0);
    }

    #[test]
    fn test_clickable_follows_active_and_layers() {
        let mut s = store();
        assert_eq!(s.clickable_keys(), vec![SeriesKey::lab(1), SeriesKey::lab(2)]);

        s.set_layers(LayerVisibility {
            instrument_points: true,
            ..LayerVisibility::default()
        });
        s.set_active(1, false);
        assert_eq!(
            s.clickable_keys(),
            vec![SeriesKey::lab(2), SeriesKey::instrument(2)]
        );
    }

    #[test]
    fn test_bounds() {
        let mut s = store();
        let b = s.bounds_from_samples().unwrap();
        assert_eq!((b.min_x, b.max_x, b.min_y, b.max_y), (400.0, 600.0, 0.1, 0.8));

        s.set_active(2, false);
        let b = s.bounds_from_active_series().unwrap();
        assert_eq!(b.max_y, 0.5);
        assert_eq!(b.min_y, 0.1);

        s.set_active(1, false);
        assert!(s.bounds_from_active_series().is_none());
    }

    #[test]
    fn test_remove_releases_colour() {
        let mut s = store();
        let c = s.get(1).unwrap().color;
        assert!(s.remove(1).is_some());
        assert!(s.get(1).is_none());
        assert!(s.remove(1).is_none());
        // the colour is back in the pool and eventually handed out again
        let mut again = Vec::new();
        for id in 10..19 {
            s.load(vec![sample(id, vec![[1.0, 1.0]])]);
            again.push(s.get(id).unwrap().color);
        }
        assert!(again.contains(&c));
    }

    #[test]
    fn test_labels() {
        let s = store();
        assert_eq!(s.series_label(SeriesKey::lab(1)).unwrap(), "sample 1");
        assert_eq!(
            s.series_label(SeriesKey::instrument(1)).unwrap(),
            "sample 1 (pancam)"
        );
    }
}
