//! Depth-buffer convention handling.
//!
//! The occlusion path has to work against both standard depth (0 at the
//! near plane) and reversed-Z (1 at the near plane). Every comparison that
//! depends on the convention lives here so no call site re-derives it.

use serde::{Deserialize, Serialize};

/// Which end of the [0, 1] depth range is the near plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepthConvention {
    /// 0 at the near plane, 1 at the far plane.
    #[default]
    Standard,
    /// 1 at the near plane, 0 at the far plane (reversed-Z).
    Reversed,
}

impl DepthConvention {
    /// Returns the farther (less occluding) of two raw depth values.
    ///
    /// This is the reduction operator of the depth pyramid: under the
    /// standard convention farther means numerically larger, under
    /// reversed-Z it means numerically smaller.
    #[inline]
    #[must_use]
    pub fn farthest(self, a: f32, b: f32) -> f32 {
        match self {
            Self::Standard => a.max(b),
            Self::Reversed => a.min(b),
        }
    }

    /// Returns true if `a` is strictly farther from the camera than `b`.
    #[inline]
    #[must_use]
    pub fn is_farther(self, a: f32, b: f32) -> bool {
        match self {
            Self::Standard => a > b,
            Self::Reversed => a < b,
        }
    }

    /// Converts a raw [0, 1] depth value to linear eye-space distance.
    ///
    /// Both conventions share one formula with the roles of `near` and
    /// `far` swapped; the result is always in `[near, far]`.
    #[inline]
    #[must_use]
    pub fn to_linear_eye(self, depth: f32, near: f32, far: f32) -> f32 {
        match self {
            Self::Standard => near * far / (far - depth * (far - near)),
            Self::Reversed => near * far / (near + depth * (far - near)),
        }
    }

    /// Shader-side flag value (0 = standard, 1 = reversed).
    #[inline]
    #[must_use]
    pub const fn as_flag(self) -> u32 {
        match self {
            Self::Standard => 0,
            Self::Reversed => 1,
        }
    }
}
