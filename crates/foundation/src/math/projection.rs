use std::f64::consts::{FRAC_PI_2, TAU};

use super::{LonLat, Vec2};
use crate::bounds::Aabb2;

/// Latitude beyond which spherical Mercator diverges; inputs are clamped here.
pub const MERCATOR_MAX_LAT_DEG: f64 = 85.051_128_779_806_59;

/// Maps geographic positions to screen space for a fitted viewport.
pub trait Projection {
    fn project(&self, position: LonLat) -> Vec2;
}

/// Spherical Mercator with a screen scale (pixels per radian) and translation.
///
/// Screen y grows downwards, so northern latitudes map to smaller y.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mercator {
    pub scale: f64,
    pub translate: Vec2,
}

impl Default for Mercator {
    fn default() -> Self {
        Self {
            scale: 961.0 / TAU,
            translate: Vec2::new(480.0, 250.0),
        }
    }
}

impl Mercator {
    pub fn new(scale: f64, translate: Vec2) -> Self {
        Self { scale, translate }
    }

    /// Fits `bounds` (degrees: x = longitude, y = latitude) into a
    /// `width` x `height` viewport anchored at the origin, preserving aspect.
    ///
    /// Degenerate bounds (empty, zero-area or non-finite) fall back to the
    /// default projection centred in the viewport.
    pub fn fit_size(width: f64, height: f64, bounds: Aabb2) -> Self {
        let sw = raw(LonLat::new(bounds.min[0], bounds.min[1]));
        let ne = raw(LonLat::new(bounds.max[0], bounds.max[1]));
        // Raw y grows northwards; flip to screen orientation before measuring.
        let (x0, x1) = (sw.x, ne.x);
        let (y0, y1) = (-ne.y, -sw.y);
        let dx = x1 - x0;
        let dy = y1 - y0;
        if bounds.is_empty() || !(dx > 0.0 || dy > 0.0) || !dx.is_finite() || !dy.is_finite() {
            return Self {
                translate: Vec2::new(width / 2.0, height / 2.0),
                ..Self::default()
            };
        }

        let k = match (dx > 0.0, dy > 0.0) {
            (true, true) => (width / dx).min(height / dy),
            (true, false) => width / dx,
            _ => height / dy,
        };
        let tx = (width - k * (x1 + x0)) / 2.0;
        let ty = (height - k * (y1 + y0)) / 2.0;
        Self::new(k, Vec2::new(tx, ty))
    }
}

impl Projection for Mercator {
    fn project(&self, position: LonLat) -> Vec2 {
        let r = raw(position);
        Vec2::new(
            self.translate.x + self.scale * r.x,
            self.translate.y - self.scale * r.y,
        )
    }
}

fn raw(position: LonLat) -> Vec2 {
    let lambda = position.lon_deg.to_radians();
    let phi = position
        .lat_deg
        .clamp(-MERCATOR_MAX_LAT_DEG, MERCATOR_MAX_LAT_DEG)
        .to_radians();
    Vec2::new(lambda, ((FRAC_PI_2 + phi) / 2.0).tan().ln())
}
