//! Nearest clickable point under the pointer.

use crate::interp::Point;
use crate::scale::Scale;
use crate::series::{SeriesKey, SeriesStore};

/// Result of a successful hit-test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub key: SeriesKey,
    pub point: Point,
    pub index: usize,
    /// Screen-space distance from the pointer, in pixels.
    pub distance: f64,
}

/// Binary-narrow `curve` toward the sample closest to `x` in wavelength.
///
/// The best candidate seen along the way is kept, later candidates
/// replacing earlier ones on equal distance. Returns `None` for an empty
/// curve.
pub fn closest_by_wavelength(curve: &[Point], x: f64) -> Option<(Point, usize)> {
    if curve.is_empty() {
        return None;
    }
    let mut min = 0;
    let mut max = curve.len();
    let mut mid = (min + max) / 2;
    let mut best = (curve[mid], mid);
    let mut dx = (x - curve[mid][0]).abs();
    loop {
        if curve[mid][0] > x {
            max = mid;
        } else {
            min = mid;
        }
        mid = (min + max) / 2;
        let diff = (curve[mid][0] - x).abs();
        if diff <= dx {
            dx = diff;
            best = (curve[mid], mid);
        }
        if diff == 0.0 || max - min <= 1 {
            break;
        }
    }
    Some(best)
}

/// Closest point over every clickable series, measured on screen through
/// `scale`. `(mx, my)` is the pointer in data space. The first series in
/// iteration order wins ties.
pub fn nearest_point(store: &SeriesStore, scale: &Scale, mx: f64, my: f64) -> Option<Hit> {
    let pointer = scale.to_screen([mx, my]);
    let mut closest: Option<Hit> = None;
    for key in store.clickable_keys() {
        let Some(curve) = store.materialized_curve(key) else {
            continue;
        };
        let Some((point, index)) = closest_by_wavelength(curve, mx) else {
            continue;
        };
        let [px, py] = scale.to_screen(point);
        let distance = ((pointer[0] - px).powi(2) + (pointer[1] - py).powi(2)).sqrt();
        if closest.map_or(true, |c| distance < c.distance) {
            closest = Some(Hit {
                key,
                point,
                index,
                distance,
            });
        }
    }
    closest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorAllocator;
    use crate::series::{Curve, Sample};
    use crate::window::ViewWindow;

    fn curve() -> Vec<Point> {
        (0..11).map(|i| [400.0 + i as f64 * 10.0, 0.1 * i as f64]).collect()
    }

    #[test]
    fn test_exact_wavelength_found() {
        let c = curve();
        for (i, p) in c.iter().enumerate() {
            let (hit, idx) = closest_by_wavelength(&c, p[0]).unwrap();
            assert_eq!(idx, i, "at {}", p[0]);
            assert_eq!(hit, *p);
        }
    }

    #[test]
    fn test_between_samples() {
        let c = curve();
        let (p, idx) = closest_by_wavelength(&c, 433.0).unwrap();
        assert_eq!(idx, 3);
        assert_eq!(p[0], 430.0);
        let (p, _) = closest_by_wavelength(&c, 437.0).unwrap();
        assert_eq!(p[0], 440.0);
    }

    #[test]
    fn test_outside_curve_clamps_to_ends() {
        let c = curve();
        assert_eq!(closest_by_wavelength(&c, 100.0).unwrap().1, 0);
        assert_eq!(closest_by_wavelength(&c, 900.0).unwrap().1, 10);
        assert!(closest_by_wavelength(&[], 1.0).is_none());
        assert_eq!(closest_by_wavelength(&[[5.0, 1.0]], 1.0).unwrap().1, 0);
    }

    fn two_sample_store(second: Vec<Point>) -> SeriesStore {
        let mut store = SeriesStore::with_colors(ColorAllocator::seeded(0));
        store.load(vec![
            Sample {
                id: 1,
                sample_name: "a".into(),
                reflectance: Curve(vec![[400.0, 0.2], [500.0, 0.2]]),
                simulated: Default::default(),
            },
            Sample {
                id: 2,
                sample_name: "b".into(),
                reflectance: Curve(second),
                simulated: Default::default(),
            },
        ]);
        store
    }

    #[test]
    fn test_nearest_across_series() {
        let store = two_sample_store(vec![[400.0, 0.8], [500.0, 0.8]]);
        let scale = Scale::from_window(&ViewWindow::new(350.0, 550.0, 0.0, 1.0), 200.0, 100.0);
        let hit = nearest_point(&store, &scale, 405.0, 0.7).unwrap();
        assert_eq!(hit.key, SeriesKey::lab(2));
        assert_eq!(hit.point, [400.0, 0.8]);
        assert!((hit.distance - (25.0f64 + 100.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_tie_goes_to_first_series() {
        let store = two_sample_store(vec![[400.0, 0.2], [500.0, 0.2]]);
        let scale = Scale::from_window(&ViewWindow::new(350.0, 550.0, 0.0, 1.0), 200.0, 100.0);
        let hit = nearest_point(&store, &scale, 400.0, 0.5).unwrap();
        assert_eq!(hit.key, SeriesKey::lab(1));
    }

    #[test]
    fn test_inactive_series_not_hit() {
        let mut store = two_sample_store(vec![[400.0, 0.8], [500.0, 0.8]]);
        store.set_active(1, false);
        store.set_active(2, false);
        let scale = Scale::from_window(&ViewWindow::new(350.0, 550.0, 0.0, 1.0), 200.0, 100.0);
        assert!(nearest_point(&store, &scale, 400.0, 0.5).is_none());
    }
}
