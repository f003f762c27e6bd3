//! Display/simulation unit conversion.
//!
//! The game places everything in pixels with the y axis pointing up; the
//! physics engine works in meters. A single [`Units`] value, fixed when the
//! [`World`](super::world::World) is created, is the only authority for the
//! scale between the two. Angles cross the public API in degrees and are
//! stored in radians.

use rapier2d::na as nalgebra;
use rapier2d::prelude::{Real, Vector, vector};

/// Default scale: 32 display pixels per simulation meter.
pub const PIXELS_PER_METER: f32 = 32.0;

/// Plain 2D value used at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for Vec2 {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// Pixel/meter scale for one world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Units {
    pixels_per_meter: f32,
}

impl Default for Units {
    fn default() -> Self {
        Self::new(PIXELS_PER_METER)
    }
}

impl Units {
    /// Create a converter for the given scale.
    ///
    /// # Panics
    ///
    /// Panics if `pixels_per_meter` is not a finite positive number.
    pub fn new(pixels_per_meter: f32) -> Self {
        assert!(
            pixels_per_meter.is_finite() && pixels_per_meter > 0.0,
            "pixels_per_meter must be positive, got {pixels_per_meter}"
        );
        Self { pixels_per_meter }
    }

    pub fn pixels_per_meter(&self) -> f32 {
        self.pixels_per_meter
    }

    /// Pixels to meters.
    #[inline]
    pub fn to_sim(&self, px: f32) -> Real {
        px / self.pixels_per_meter
    }

    /// Meters to pixels.
    #[inline]
    pub fn to_display(&self, sim: Real) -> f32 {
        sim * self.pixels_per_meter
    }

    #[inline]
    pub fn vec_to_sim(&self, x: f32, y: f32) -> Vector<Real> {
        vector![self.to_sim(x), self.to_sim(y)]
    }

    #[inline]
    pub fn vec_to_display(&self, v: &Vector<Real>) -> (f32, f32) {
        (self.to_display(v.x), self.to_display(v.y))
    }
}

#[inline]
pub fn deg_to_rad(degrees: f32) -> f32 {
    degrees.to_radians()
}

#[inline]
pub fn rad_to_deg(radians: f32) -> f32 {
    radians.to_degrees()
}
