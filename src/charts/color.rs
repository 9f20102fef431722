//! Colour scaling for growth markers.

use crate::data::UrbanTable;
use crate::stats::StatsCalculator;
use plotters::style::RGBColor;

/// Maps `[vmin, midpoint, vmax]` piecewise-linearly onto `[0, 0.5, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MidpointNormalize {
    pub vmin: f64,
    pub midpoint: f64,
    pub vmax: f64,
}

impl MidpointNormalize {
    pub fn new(vmin: f64, midpoint: f64, vmax: f64) -> Self {
        Self {
            vmin,
            midpoint,
            vmax,
        }
    }

    /// Bounds from the 1st and 95th percentile of `growth_pct`, centred on zero.
    pub fn for_growth(table: &UrbanTable) -> Self {
        let (vmin, vmax) = growth_color_bounds(table);
        Self::new(vmin, 0.0, vmax)
    }

    /// Normalized position in `[0, 1]`.
    pub fn apply(&self, value: f64) -> f64 {
        let t = if value <= self.midpoint {
            if self.midpoint > self.vmin {
                0.5 * (value - self.vmin) / (self.midpoint - self.vmin)
            } else {
                0.5
            }
        } else if self.vmax > self.midpoint {
            0.5 + 0.5 * (value - self.midpoint) / (self.vmax - self.midpoint)
        } else {
            0.5
        };
        t.clamp(0.0, 1.0)
    }
}

/// `(cmin, cmax)` for colouring by percentage growth.
/// Falls back to `(-1, 1)` when no city has a defined percentage.
pub fn growth_color_bounds(table: &UrbanTable) -> (f64, f64) {
    let pct = table.growth_pct();
    let vmin = StatsCalculator::percentile_of(&pct, 1.0);
    let vmax = StatsCalculator::percentile_of(&pct, 95.0);
    if vmin.is_nan() || vmax.is_nan() {
        (-1.0, 1.0)
    } else {
        (vmin, vmax)
    }
}

/// Matplotlib's RdYlGn anchors at 0.0, 0.1, ..., 1.0
const RD_YL_GN: [(u8, u8, u8); 11] = [
    (165, 0, 38),
    (215, 48, 39),
    (244, 109, 67),
    (253, 174, 97),
    (254, 224, 139),
    (255, 255, 191),
    (217, 239, 139),
    (166, 217, 106),
    (102, 189, 99),
    (26, 152, 80),
    (0, 104, 55),
];

/// Red (shrinking) through yellow to green (growing).
pub fn rd_yl_gn(t: f64) -> RGBColor {
    let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (RD_YL_GN.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(RD_YL_GN.len() - 2);
    let frac = scaled - i as f64;
    let (r0, g0, b0) = RD_YL_GN[i];
    let (r1, g1, b1) = RD_YL_GN[i + 1];
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    RGBColor(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

/// Marker area for the static map (matplotlib `s`, points squared).
pub fn static_marker_area(growth_abs: f64) -> f64 {
    growth_abs.abs().powf(0.7) + 10.0
}

/// Marker area for the globe (plotly `sizemode: area`).
pub fn globe_marker_size(growth_abs: f64) -> f64 {
    growth_abs.abs().powf(0.7) + 5.0
}
