//! Quantile classification and colorization of scalar surfaces.

use crate::error::RasterError;
use crate::surface::{RgbRaster, ScalarRaster};
use serde::Serialize;
use tracing::debug;

/// Default color ramp, deep blue through red.
pub const DEFAULT_PALETTE: [&str; 5] = ["#0d47a1", "#29b6f6", "#66bb6a", "#ffee58", "#e53935"];

/// Terrain ramp for elevation fields, green through brown.
pub const ELEVATION_PALETTE: [&str; 5] = ["#00441b", "#41ab5d", "#addd8e", "#d8c29d", "#8c510a"];

/// Spectral ramp for fields with no dedicated scheme.
pub const SPECTRAL_PALETTE: [&str; 5] = ["#2b83ba", "#abdda4", "#ffffbf", "#fdae61", "#d7191c"];

/// Color ramp for a measured field: water levels get the blue-to-red
/// ramp, reduced levels and other elevations the terrain ramp, anything
/// else the spectral default.
pub fn palette_for_field(field: &str) -> &'static [&'static str] {
    let name = field.to_ascii_uppercase();
    if name == "RL" || name.contains("ELEV") {
        &ELEVATION_PALETTE
    } else if name.starts_with("PRE_") || name.starts_with("POST_") || name.contains("WATER") {
        &DEFAULT_PALETTE
    } else {
        &SPECTRAL_PALETTE
    }
}

/// One RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parse a "#RRGGBB" hex string.
    pub fn from_hex(hex: &str) -> Result<Self, RasterError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(RasterError::InvalidPalette(format!(
                "expected #RRGGBB, got '{hex}'"
            )));
        }
        let parse =
            |s: &str| u8::from_str_radix(s, 16).map_err(|e| RasterError::InvalidPalette(e.to_string()));
        Ok(Rgb {
            r: parse(&digits[0..2])?,
            g: parse(&digits[2..4])?,
            b: parse(&digits[4..6])?,
        })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// One class of the legend.
#[derive(Debug, Clone, Serialize)]
pub struct LegendEntry {
    pub lower: f64,
    pub upper: f64,
    pub color: Rgb,
    pub label: String,
}

/// Classifier output: the colored raster plus its legend.
#[derive(Debug, Clone)]
pub struct Classified {
    pub raster: RgbRaster,
    pub breaks: Vec<f64>,
    pub legend: Vec<LegendEntry>,
}

/// Classify a scalar raster into quantile bins and color each bin.
///
/// `num_classes` defaults to the palette length. NaN cells come out pure
/// black, which doubles as the RGB no-data marker downstream.
pub fn classify_quantile(
    raster: &ScalarRaster,
    palette_hex: &[&str],
    num_classes: Option<usize>,
) -> Result<Classified, RasterError> {
    if palette_hex.is_empty() {
        return Err(RasterError::InvalidPalette("empty palette".to_string()));
    }
    let palette: Vec<Rgb> = palette_hex
        .iter()
        .map(|h| Rgb::from_hex(h))
        .collect::<Result<_, _>>()?;
    let num_classes = num_classes.unwrap_or(palette.len()).max(1);

    let mut finite: Vec<f64> = raster
        .data
        .iter()
        .filter(|v| v.is_finite())
        .map(|&v| v as f64)
        .collect();
    if finite.is_empty() {
        return Err(RasterError::NoFiniteCells);
    }
    finite.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let breaks = quantile_breaks(&finite, num_classes);
    let colors = fit_palette(&palette, breaks.len() - 1);
    debug!(classes = colors.len(), ?breaks, "classified surface");

    let legend: Vec<LegendEntry> = colors
        .iter()
        .enumerate()
        .map(|(i, &color)| LegendEntry {
            lower: breaks[i],
            upper: breaks[i + 1],
            color,
            label: format!("{:.2} - {:.2}", breaks[i], breaks[i + 1]),
        })
        .collect();

    let mut data = vec![0u8; raster.width * raster.height * 3];
    for (cell, out) in raster.data.iter().zip(data.chunks_exact_mut(3)) {
        if !cell.is_finite() {
            continue; // stays black
        }
        let color = colors[bin_index(&breaks, *cell as f64)];
        out[0] = color.r;
        out[1] = color.g;
        out[2] = color.b;
    }

    Ok(Classified {
        raster: RgbRaster::new(
            raster.width,
            raster.height,
            raster.transform,
            raster.crs,
            data,
        ),
        breaks,
        legend,
    })
}

/// Quantile breakpoints over sorted finite values. Collapsed quantiles
/// (heavily tied data) are deduplicated; a near-constant surface gets a
/// synthetic range instead.
fn quantile_breaks(sorted: &[f64], num_classes: usize) -> Vec<f64> {
    let mut breaks: Vec<f64> = (0..=num_classes)
        .map(|i| percentile(sorted, 100.0 * i as f64 / num_classes as f64))
        .collect();
    breaks.dedup();

    if breaks.len() < 2 {
        let lo = sorted[0];
        let hi = sorted[sorted.len() - 1];
        if hi - lo <= f64::EPSILON {
            return vec![lo - 0.1, lo + 0.1];
        }
        return (0..=num_classes)
            .map(|i| lo + (hi - lo) * i as f64 / num_classes as f64)
            .collect();
    }

    breaks
}

/// Linear-interpolated percentile over pre-sorted data.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Match the palette length to the class count: truncate when too long,
/// resample with linear RGB interpolation when too short.
fn fit_palette(palette: &[Rgb], classes: usize) -> Vec<Rgb> {
    if palette.len() >= classes {
        return palette[..classes].to_vec();
    }
    if classes == 1 {
        return vec![palette[0]];
    }

    (0..classes)
        .map(|i| {
            let t = i as f64 / (classes - 1) as f64 * (palette.len() - 1) as f64;
            let lo = t.floor() as usize;
            let hi = t.ceil() as usize;
            let frac = t - lo as f64;
            let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
            Rgb {
                r: lerp(palette[lo].r, palette[hi].r),
                g: lerp(palette[lo].g, palette[hi].g),
                b: lerp(palette[lo].b, palette[hi].b),
            }
        })
        .collect()
}

/// Bin index for a value: `breaks[i] <= v < breaks[i+1]`, last bin
/// closed on the upper bound. Out-of-range values clamp to the nearest
/// bin.
fn bin_index(breaks: &[f64], v: f64) -> usize {
    let classes = breaks.len() - 1;
    for i in 0..classes {
        if v >= breaks[i] && v < breaks[i + 1] {
            return i;
        }
    }
    if v >= breaks[classes] {
        classes - 1
    } else {
        0
    }
}
