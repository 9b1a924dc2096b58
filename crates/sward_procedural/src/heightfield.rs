//! The external height-field sampling boundary.
//!
//! Terrain belongs to the host; the generator only ever asks "how high is
//! the ground at (x, z)". Adapters for the common cases live here so tests
//! and headless tools do not need a full terrain system.

/// Height sampling boundary between the host terrain and the generator.
pub trait HeightField {
    /// Returns the ground height at the given planar position.
    fn sample(&self, x: f32, z: f32) -> f32;
}

/// A perfectly flat field at a fixed height.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlatHeightField(pub f32);

impl HeightField for FlatHeightField {
    #[inline]
    fn sample(&self, _x: f32, _z: f32) -> f32 {
        self.0
    }
}

/// Wraps a closure as a height field.
///
/// Handy for tests and for hosts whose terrain query is already a function.
pub struct FnHeightField<F: Fn(f32, f32) -> f32>(pub F);

impl<F: Fn(f32, f32) -> f32> HeightField for FnHeightField<F> {
    #[inline]
    fn sample(&self, x: f32, z: f32) -> f32 {
        (self.0)(x, z)
    }
}
