//! McBryde-Thomas flat-polar quartic projection.
//!
//! Equal-area pseudocylindrical projection with flat poles; the static map
//! uses it centred on 45°E.

use std::f64::consts::PI;

const C: f64 = 1.707_106_781_186_547_5; // 1 + sqrt(2)/2
const FYC: f64 = 1.874_758_284_622_695;
const FXC: f64 = 0.312_459_714_103_782_5;
const MAX_ITER: usize = 20;
const EPS: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatPolarQuartic {
    /// Central meridian in degrees
    pub lon_0: f64,
}

impl Default for FlatPolarQuartic {
    fn default() -> Self {
        Self { lon_0: 45.0 }
    }
}

impl FlatPolarQuartic {
    pub fn new(lon_0: f64) -> Self {
        Self { lon_0 }
    }

    /// Half extents of the projected plane, `(x_max, y_max)`.
    pub fn extent() -> (f64, f64) {
        (FXC * PI * 3.0, FYC * (PI / 4.0).sin())
    }

    /// Project geographic degrees to plane coordinates.
    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let lam = wrap_degrees(lon - self.lon_0).to_radians();
        Self::forward(lam, lat.clamp(-90.0, 90.0).to_radians())
    }

    fn forward(lam: f64, phi: f64) -> (f64, f64) {
        let c = C * phi.sin();
        let mut psi = phi;
        for _ in 0..MAX_ITER {
            let step = ((0.5 * psi).sin() + psi.sin() - c) / (0.5 * (0.5 * psi).cos() + psi.cos());
            psi -= step;
            if step.abs() < EPS {
                break;
            }
        }
        let x = FXC * lam * (1.0 + 2.0 * psi.cos() / (0.5 * psi).cos());
        let y = FYC * (0.5 * psi).sin();
        (x, y)
    }

    /// Closed outline of the map (the ±180° meridians around the central one).
    pub fn outline(&self, steps: usize) -> Vec<(f64, f64)> {
        let steps = steps.max(2);
        let edge = PI - 1e-9;
        let mut points = Vec::with_capacity(2 * steps + 1);
        for i in 0..=steps {
            let phi = -PI / 2.0 + PI * i as f64 / steps as f64;
            points.push(Self::forward(edge, phi));
        }
        for i in 0..=steps {
            let phi = PI / 2.0 - PI * i as f64 / steps as f64;
            points.push(Self::forward(-edge, phi));
        }
        points
    }

    /// A parallel as a polyline across the whole map.
    pub fn parallel(&self, lat: f64, steps: usize) -> Vec<(f64, f64)> {
        let steps = steps.max(2);
        let phi = lat.clamp(-90.0, 90.0).to_radians();
        let edge = PI - 1e-9;
        (0..=steps)
            .map(|i| Self::forward(-edge + 2.0 * edge * i as f64 / steps as f64, phi))
            .collect()
    }

    /// A meridian from pole to pole.
    pub fn meridian(&self, lon: f64, steps: usize) -> Vec<(f64, f64)> {
        let steps = steps.max(2);
        (0..=steps)
            .map(|i| self.project(lon, -90.0 + 180.0 * i as f64 / steps as f64))
            .collect()
    }
}

/// Wrap an angle in degrees into `[-180, 180)`.
fn wrap_degrees(deg: f64) -> f64 {
    (deg + 180.0).rem_euclid(360.0) - 180.0
}
