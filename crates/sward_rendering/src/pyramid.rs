//! The conservative depth pyramid.
//!
//! A square, power-of-two, multi-level reduction of the camera depth
//! buffer. Level 0 is a **point-sampled** resize of the external depth
//! texture - bilinear filtering is forbidden here, because a blended value
//! can be nearer than any real sample and would make the occlusion test
//! unsound. Each higher level stores, per texel, the numerically farthest
//! (least occluding) depth of the corresponding 2x2 block below it, so a
//! single texel at the right mip conservatively bounds what could be
//! visible across its whole footprint.
//!
//! This module is the CPU reference implementation; the GPU path in
//! `shaders/depth_pyramid.wgsl` performs the identical resize + reduction
//! per frame, strictly sequential across levels.

use sward_shared::DepthConvention;

/// A borrowed view of the external single-level depth buffer.
///
/// Row-major, row 0 at the top of the screen, values in [0, 1].
#[derive(Clone, Copy, Debug)]
pub struct DepthSource<'a> {
    texels: &'a [f32],
    width: u32,
    height: u32,
}

impl<'a> DepthSource<'a> {
    /// Wraps a depth buffer slice.
    ///
    /// # Panics
    ///
    /// Panics if the slice length does not match the dimensions - a
    /// capacity mismatch is a programming error, not a runtime condition.
    #[must_use]
    pub fn new(texels: &'a [f32], width: u32, height: u32) -> Self {
        assert_eq!(
            texels.len(),
            (width * height) as usize,
            "depth source length must equal width * height"
        );
        assert!(width > 0 && height > 0, "depth source must be non-empty");
        Self {
            texels,
            width,
            height,
        }
    }

    /// Source width in texels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Source height in texels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Exact point read, edge-clamped.
    #[inline]
    fn read(&self, x: u32, y: u32) -> f32 {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.texels[(y * self.width + x) as usize]
    }
}

/// The built pyramid: a derived, frame-scoped view with no persistent
/// identity of its own.
#[derive(Clone, Debug)]
pub struct DepthPyramid {
    base_size: u32,
    convention: DepthConvention,
    /// Per-level texels; level 0 is `base_size^2`, the last level is 1x1.
    levels: Vec<Vec<f32>>,
}

impl DepthPyramid {
    /// Builds the full pyramid from an external depth source.
    ///
    /// `base_size` must be a power of two; callers get it from
    /// `CullingConfig::pyramid_size`, which is validated.
    ///
    /// # Panics
    ///
    /// Panics if `base_size` is not a power of two.
    #[must_use]
    pub fn build(source: DepthSource<'_>, base_size: u32, convention: DepthConvention) -> Self {
        assert!(
            base_size.is_power_of_two(),
            "pyramid base size must be a power of two"
        );

        // Level 0: point-sampled resize. Each destination texel reads the
        // one source texel its center lands in.
        let mut level0 = vec![0.0f32; (base_size * base_size) as usize];
        for y in 0..base_size {
            for x in 0..base_size {
                let sx = (u64::from(x) * u64::from(source.width()) / u64::from(base_size)) as u32;
                let sy = (u64::from(y) * u64::from(source.height()) / u64::from(base_size)) as u32;
                level0[(y * base_size + x) as usize] = source.read(sx, sy);
            }
        }

        let mut levels = vec![level0];
        let mut size = base_size;
        while size > 1 {
            let next_size = size / 2;
            let prev = &levels[levels.len() - 1];
            let mut next = vec![0.0f32; (next_size * next_size) as usize];
            for y in 0..next_size {
                for x in 0..next_size {
                    let i = (2 * y * size + 2 * x) as usize;
                    let a = prev[i];
                    let b = prev[i + 1];
                    let c = prev[i + size as usize];
                    let d = prev[i + size as usize + 1];
                    next[(y * next_size + x) as usize] =
                        convention.farthest(convention.farthest(a, b), convention.farthest(c, d));
                }
            }
            levels.push(next);
            size = next_size;
        }

        Self {
            base_size,
            convention,
            levels,
        }
    }

    /// Side length of level 0.
    #[must_use]
    pub const fn base_size(&self) -> u32 {
        self.base_size
    }

    /// Number of levels, down to and including the 1x1 level.
    #[must_use]
    pub fn level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    /// The depth convention the pyramid was reduced under.
    #[must_use]
    pub const fn convention(&self) -> DepthConvention {
        self.convention
    }

    /// Side length of the given level.
    #[must_use]
    pub fn level_size(&self, level: u32) -> u32 {
        (self.base_size >> level).max(1)
    }

    /// Exact texel read at a level, edge-clamped.
    #[must_use]
    pub fn read(&self, x: u32, y: u32, level: u32) -> f32 {
        let level = level.min(self.level_count() - 1);
        let size = self.level_size(level);
        let x = x.min(size - 1);
        let y = y.min(size - 1);
        self.levels[level as usize][(y * size + x) as usize]
    }

    /// Point-samples a level at normalized [0, 1] coordinates, edge-clamped.
    #[must_use]
    pub fn sample_level(&self, u: f32, v: f32, level: u32) -> f32 {
        let level = level.min(self.level_count() - 1);
        let size = self.level_size(level);
        let x = ((u * size as f32) as i64).clamp(0, i64::from(size) - 1) as u32;
        let y = ((v * size as f32) as i64).clamp(0, i64::from(size) - 1) as u32;
        self.read(x, y, level)
    }
}
