//! Interpolation over ordered (wavelength, value) sequences.
//!
//! Curves are slices of `[wavelength, value]` pairs sorted ascending by
//! wavelength. Nothing here reorders or validates that ordering; callers
//! hand in data the way it was loaded.

use crate::error::CurveError;

/// A single `[wavelength, value]` sample.
pub type Point = [f64; 2];

/// Smallest and largest wavelength of a curve.
pub fn curve_extent(curve: &[Point]) -> Option<(f64, f64)> {
    if curve.is_empty() {
        return None;
    }
    let min = curve.iter().map(|p| p[0]).fold(f64::INFINITY, f64::min);
    let max = curve.iter().map(|p| p[0]).fold(f64::NEG_INFINITY, f64::max);
    Some((min, max))
}

/// Right-hand neighbour search.
///
/// Returns the index of `wavelength` if a sample sits exactly on it,
/// otherwise the index of the first sample (scanning from the left) whose
/// wavelength is at or beyond the query.
pub fn locate_index(wavelength: f64, curve: &[Point]) -> Result<usize, CurveError> {
    if let Some(exact) = curve.iter().position(|p| p[0] == wavelength) {
        return Ok(exact);
    }
    curve
        .iter()
        .position(|p| p[0] >= wavelength)
        .ok_or(CurveError::OutOfDomain { wavelength })
}

/// Linearly interpolated value of `curve` at `wavelength`.
///
/// The closer neighbour gets the larger weight; a query landing on the
/// first located index returns that sample unchanged.
pub fn value_at(curve: &[Point], wavelength: f64) -> Result<f64, CurveError> {
    let (min, max) = curve_extent(curve).ok_or(CurveError::OutOfDomain { wavelength })?;
    if wavelength < min || wavelength > max {
        return Err(CurveError::OutOfBounds {
            wavelength,
            min,
            max,
        });
    }

    let index = locate_index(wavelength, curve)?;
    if index == 0 {
        return Ok(curve[0][1]);
    }

    let [left_w, left_v] = curve[index - 1];
    let [right_w, right_v] = curve[index];
    let left_weight = (right_w - wavelength).abs() / (right_w - left_w).abs();
    let right_weight = 1.0 - left_weight;
    Ok(right_v * right_weight + left_v * left_weight)
}

/// Sample whose wavelength is closest to `wavelength` (first one on ties).
pub fn nearest_sample(curve: &[Point], wavelength: f64) -> Option<Point> {
    let mut best: Option<(f64, Point)> = None;
    for &p in curve {
        let diff = (p[0] - wavelength).abs();
        match best {
            Some((best_diff, _)) if diff >= best_diff => {}
            _ => best = Some((diff, p)),
        }
    }
    best.map(|(_, p)| p)
}

/// Factor that brings `curve` to 1.0 at `reference`.
///
/// Outside the curve's domain the value of the closest sample stands in
/// for the interpolated one.
pub fn normalization_scale(curve: &[Point], reference: f64) -> Result<f64, CurveError> {
    let value = match value_at(curve, reference) {
        Ok(v) => v,
        Err(CurveError::OutOfBounds { .. }) => {
            nearest_sample(curve, reference)
                .ok_or(CurveError::OutOfDomain {
                    wavelength: reference,
                })?[1]
        }
        Err(e) => return Err(e),
    };
    Ok(1.0 / value)
}

/// Wavelength of the first maximum value.
pub fn argmax_wavelength(curve: &[Point]) -> Option<f64> {
    let mut best: Option<Point> = None;
    for &p in curve {
        match best {
            Some(b) if p[1] <= b[1] => {}
            _ => best = Some(p),
        }
    }
    best.map(|p| p[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_curve() -> Vec<Point> {
        vec![[400.0, 0.10], [500.0, 0.40], [600.0, 0.20]]
    }

    #[test]
    fn test_locate_exact_and_right_hand() {
        let curve = sample_curve();
        assert_eq!(locate_index(500.0, &curve), Ok(1));
        assert_eq!(locate_index(450.0, &curve), Ok(1));
        assert_eq!(locate_index(501.0, &curve), Ok(2));
        assert_eq!(locate_index(100.0, &curve), Ok(0));
    }

    #[test]
    fn test_locate_without_neighbour() {
        let curve = sample_curve();
        assert_eq!(
            locate_index(700.0, &curve),
            Err(CurveError::OutOfDomain { wavelength: 700.0 })
        );
        assert!(locate_index(1.0, &[]).is_err());
    }

    #[test]
    fn test_value_at_samples_is_exact() {
        let curve = sample_curve();
        for p in &curve {
            assert_eq!(value_at(&curve, p[0]).unwrap(), p[1]);
        }
    }

    #[test]
    fn test_value_at_blends_toward_closer_neighbour() {
        let curve = sample_curve();
        let v = value_at(&curve, 425.0).unwrap();
        assert!((v - 0.175).abs() < 1e-12);
        let v = value_at(&curve, 590.0).unwrap();
        assert!((v - 0.22).abs() < 1e-12);
    }

    #[test]
    fn test_value_at_stays_between_bounding_samples() {
        let curve = sample_curve();
        let mut w = 400.5;
        while w < 600.0 {
            let v = value_at(&curve, w).unwrap();
            let i = locate_index(w, &curve).unwrap();
            let lo = curve[i - 1][1].min(curve[i][1]);
            let hi = curve[i - 1][1].max(curve[i][1]);
            assert!(v >= lo - 1e-12 && v <= hi + 1e-12, "w={} v={}", w, v);
            w += 7.3;
        }
    }

    #[test]
    fn test_value_at_out_of_bounds() {
        let curve = sample_curve();
        match value_at(&curve, 399.0) {
            Err(CurveError::OutOfBounds { min, max, .. }) => {
                assert_eq!(min, 400.0);
                assert_eq!(max, 600.0);
            }
            other => panic!("expected OutOfBounds, got {:?}", other),
        }
        assert!(value_at(&curve, 600.1).is_err());
    }

    #[test]
    fn test_normalization_scale_inside_domain() {
        let curve = sample_curve();
        let s = normalization_scale(&curve, 500.0).unwrap();
        assert!((s - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_normalization_scale_falls_back_to_closest_sample() {
        let curve = sample_curve();
        let s = normalization_scale(&curve, 900.0).unwrap();
        assert!((s - 5.0).abs() < 1e-12);
        let s = normalization_scale(&curve, 10.0).unwrap();
        assert!((s - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_nearest_sample_prefers_first_on_tie() {
        let curve = sample_curve();
        assert_eq!(nearest_sample(&curve, 450.0), Some([400.0, 0.10]));
    }

    #[test]
    fn test_argmax_first_occurrence() {
        let curve = vec![[1.0, 0.5], [2.0, 0.9], [3.0, 0.9]];
        assert_eq!(argmax_wavelength(&curve), Some(2.0));
        assert_eq!(argmax_wavelength(&[]), None);
    }
}
