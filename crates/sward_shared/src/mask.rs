//! The artist-painted inclusion mask.
//!
//! An external painting tool edits the mask between frames; the culling
//! kernel must read a single consistent committed version per dispatch.
//! Edits therefore go to a working copy and become visible only on
//! `commit()`, which publishes an immutable snapshot behind an `Arc`. A
//! dispatch clones the `Arc` once and samples that snapshot for its entire
//! duration - no tearing within a dispatch, no cross-frame guarantee.

use std::sync::Arc;

use parking_lot::RwLock;

/// Mapping from world-space planar coordinates to mask texels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaskExtent {
    /// World X of the mask's min corner.
    pub min_x: f32,
    /// World Z of the mask's min corner.
    pub min_z: f32,
    /// World-space width covered by the mask.
    pub width: f32,
    /// World-space depth covered by the mask.
    pub depth: f32,
}

impl MaskExtent {
    /// Creates an extent centered on the origin.
    #[must_use]
    pub const fn centered(width: f32, depth: f32) -> Self {
        Self {
            min_x: -width * 0.5,
            min_z: -depth * 0.5,
            width,
            depth,
        }
    }
}

/// One committed version of the mask.
///
/// Single-channel, values in [0, 1]. Sampling is point-sampled and
/// edge-clamped; positions outside the extent read the border texel.
#[derive(Clone, Debug)]
pub struct MaskData {
    width: u32,
    height: u32,
    extent: MaskExtent,
    texels: Vec<f32>,
}

impl MaskData {
    /// Creates a mask filled with a constant value.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero; a zero-sized mask is a
    /// programming error, not a runtime condition.
    #[must_use]
    pub fn filled(width: u32, height: u32, extent: MaskExtent, value: f32) -> Self {
        assert!(width > 0 && height > 0, "mask dimensions must be non-zero");
        Self {
            width,
            height,
            extent,
            texels: vec![value.clamp(0.0, 1.0); (width * height) as usize],
        }
    }

    /// Mask width in texels.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Mask height in texels.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// World-space extent covered by the mask.
    #[inline]
    #[must_use]
    pub const fn extent(&self) -> MaskExtent {
        self.extent
    }

    /// Raw texels, row-major.
    #[must_use]
    pub fn texels(&self) -> &[f32] {
        &self.texels
    }

    /// Sets one texel. Values are clamped to [0, 1].
    pub fn set_texel(&mut self, x: u32, y: u32, value: f32) {
        if x < self.width && y < self.height {
            self.texels[(y * self.width + x) as usize] = value.clamp(0.0, 1.0);
        }
    }

    /// Point-samples the mask at a world-space planar position.
    #[inline]
    #[must_use]
    pub fn sample_world(&self, world_x: f32, world_z: f32) -> f32 {
        let u = (world_x - self.extent.min_x) / self.extent.width;
        let v = (world_z - self.extent.min_z) / self.extent.depth;
        self.sample_uv(u, v)
    }

    /// Point-samples the mask at normalized [0, 1] coordinates, edge-clamped.
    #[inline]
    #[must_use]
    pub fn sample_uv(&self, u: f32, v: f32) -> f32 {
        let x = ((u * self.width as f32) as i64).clamp(0, i64::from(self.width) - 1) as usize;
        let y = ((v * self.height as f32) as i64).clamp(0, i64::from(self.height) - 1) as usize;
        self.texels[y * self.width as usize + x]
    }
}

/// The long-lived mask resource shared between the painting tool and the
/// culling core.
pub struct InclusionMask {
    inner: RwLock<MaskInner>,
}

struct MaskInner {
    edit: MaskData,
    committed: Arc<MaskData>,
}

impl InclusionMask {
    /// Creates a mask filled with a constant value, already committed.
    #[must_use]
    pub fn filled(width: u32, height: u32, extent: MaskExtent, value: f32) -> Self {
        let data = MaskData::filled(width, height, extent, value);
        Self {
            inner: RwLock::new(MaskInner {
                committed: Arc::new(data.clone()),
                edit: data,
            }),
        }
    }

    /// Mutates the working copy. Not visible to dispatches until `commit()`.
    pub fn paint<F: FnOnce(&mut MaskData)>(&self, f: F) {
        f(&mut self.inner.write().edit);
    }

    /// Publishes the working copy as the new committed version.
    pub fn commit(&self) {
        let mut inner = self.inner.write();
        inner.committed = Arc::new(inner.edit.clone());
    }

    /// Returns the current committed version.
    ///
    /// A dispatch takes exactly one snapshot and samples only that; later
    /// commits do not affect it.
    #[must_use]
    pub fn snapshot(&self) -> Arc<MaskData> {
        Arc::clone(&self.inner.read().committed)
    }
}
