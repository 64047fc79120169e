/// Sample files: JSON arrays of reflectance records
///
/// Each record carries a lab reflectance curve and any number of curves
/// simulated through named instrument filter sets.

use std::collections::BTreeMap;
use std::path::Path;

use visor_core::{Curve, Point, Sample};

/// Parse a sample file body. A single record is accepted as well as an array.
pub fn parse_samples(json: &str) -> Result<Vec<Sample>, String> {
    // Parsed straight from the text: going through `serde_json::Value`
    // would sort wavelength keys.
    let samples = if json.trim_start().starts_with('[') {
        serde_json::from_str::<Vec<Sample>>(json)
    } else {
        serde_json::from_str::<Sample>(json).map(|s| vec![s])
    }
    .map_err(|e| format!("Parse error: {}", e))?;

    for s in &samples {
        check_increasing(&s.sample_name, s.reflectance.points())?;
        for (name, curve) in &s.simulated {
            check_increasing(&format!("{} ({})", s.sample_name, name), curve.points())?;
        }
    }
    Ok(samples)
}

/// Read and parse a sample file
pub fn load_samples(path: &Path) -> Result<Vec<Sample>, String> {
    let json = std::fs::read_to_string(path).map_err(|e| format!("Read error: {}", e))?;
    let samples = parse_samples(&json)?;
    log::info!("Read {} sample(s) from {}", samples.len(), path.display());
    Ok(samples)
}

fn check_increasing(name: &str, points: &[Point]) -> Result<(), String> {
    match points.windows(2).position(|w| w[1][0] <= w[0][0]) {
        Some(i) => Err(format!(
            "{}: wavelengths must increase (at {} nm)",
            name,
            points[i + 1][0]
        )),
        None => Ok(()),
    }
}

/// Synthetic spectra shown when the viewer starts without a file
pub fn demo_samples() -> Vec<Sample> {
    let wavelengths: Vec<f64> = (0..=70).map(|i| 350.0 + i as f64 * 10.0).collect();
    let shapes: [(u64, &str, fn(f64) -> f64); 3] = [
        (1, "hematite", |w| 0.05 + 0.35 / (1.0 + (-(w - 580.0) / 25.0).exp()) - band(w, 860.0, 60.0, 0.12)),
        (2, "olivine", |w| 0.30 + 0.10 * (w - 350.0) / 700.0 - band(w, 1000.0, 90.0, 0.15)),
        (3, "basalt", |w| 0.06 + 0.02 * (w - 350.0) / 700.0),
    ];

    shapes
        .iter()
        .map(|(id, name, f)| {
            let lab: Vec<Point> = wavelengths.iter().map(|&w| [w, f(w)]).collect();
            let mut simulated = BTreeMap::new();
            simulated.insert("broadband".to_string(), Curve(resample(&lab, 50.0)));
            simulated.insert("multispectral".to_string(), Curve(resample(&lab, 100.0)));
            Sample {
                id: *id,
                sample_name: name.to_string(),
                reflectance: Curve(lab),
                simulated,
            }
        })
        .collect()
}

fn band(w: f64, center: f64, width: f64, depth: f64) -> f64 {
    depth * (-((w - center) / width).powi(2)).exp()
}

/// Box-average `curve` into bins `step` nm wide.
fn resample(curve: &[Point], step: f64) -> Vec<Point> {
    let Some(first) = curve.first() else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut start = first[0];
    loop {
        let bin: Vec<f64> = curve
            .iter()
            .filter(|p| p[0] >= start && p[0] < start + step)
            .map(|p| p[1])
            .collect();
        if bin.is_empty() {
            break;
        }
        out.push([start + step / 2.0, bin.iter().sum::<f64>() / bin.len() as f64]);
        start += step;
    }
    out
}
