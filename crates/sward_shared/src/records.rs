//! The per-blade instance record.
//!
//! This struct is the contract every stage of the pipeline consumes: the
//! generator fills an array of them, the culling kernel reads them from a
//! storage buffer, and survivor copies land in the LOD buckets that the
//! external renderer draws from.

use bytemuck::{Pod, Zeroable};

use crate::math::{BoundingSphere, Vec2, Vec3};

/// Per-instance blade record.
///
/// Memory layout is a hard contract: exactly 9 floats (36 bytes), matching
/// the `array<f32>`-strided view the WGSL kernels use. Records are written
/// once at generation time and never mutated in place afterward; distance
/// thinning adjusts the width of the *copy* appended to a bucket.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct BladeInstance {
    /// World position of the blade root.
    pub position: [f32; 3],
    /// Blade height in world units.
    pub height: f32,
    /// Normalized planar facing direction.
    pub facing: [f32; 2],
    /// Wind animation phase seed.
    pub phase: f32,
    /// Stiffness coefficient in a narrow randomized band.
    pub stiffness: f32,
    /// Render-time width multiplier; 1.0 at generation.
    pub width_scale: f32,
}

impl BladeInstance {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Creates a record with explicit attributes.
    #[must_use]
    pub fn new(
        position: Vec3,
        height: f32,
        facing: Vec2,
        phase: f32,
        stiffness: f32,
    ) -> Self {
        Self {
            position: position.to_array(),
            height,
            facing: facing.to_array(),
            phase,
            stiffness,
            width_scale: 1.0,
        }
    }

    /// World position as a vector.
    #[inline]
    #[must_use]
    pub fn position_vec(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    /// Conservative bounding sphere for frustum and occlusion tests.
    ///
    /// Centered halfway up the blade; the radius sums the half-height and
    /// half-width so it can only over-estimate, never under-estimate.
    #[must_use]
    pub fn bounding_sphere(&self) -> BoundingSphere {
        let center = Vec3::new(
            self.position[0],
            self.position[1] + self.height * 0.5,
            self.position[2],
        );
        let radius = self.height * 0.5 + self.width_scale * 0.5;
        BoundingSphere::new(center, radius)
    }

    /// Returns a copy with the width scale overridden.
    ///
    /// Used by distance thinning to widen survivors; the source record is
    /// left untouched.
    #[must_use]
    pub const fn with_width_scale(mut self, width_scale: f32) -> Self {
        self.width_scale = width_scale;
        self
    }
}
