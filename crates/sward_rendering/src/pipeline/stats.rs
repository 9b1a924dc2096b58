//! Per-dispatch culling statistics.
//!
//! Maintained by the software pipeline for free; on the GPU path the same
//! numbers are only available through the explicit debug read-back.

use sward_shared::MAX_LOD_TIERS;

/// Statistics from one culling dispatch.
#[derive(Debug, Clone, Copy, Default)]
pub struct CullStats {
    /// Blades examined (the full population).
    pub tested: u32,
    /// Survivors per LOD tier.
    pub kept: [u32; MAX_LOD_TIERS],
    /// Rejected by the inclusion mask.
    pub rejected_mask: u32,
    /// Rejected by the frustum test.
    pub rejected_frustum: u32,
    /// Rejected by max-distance or thinning.
    pub rejected_distance: u32,
    /// Rejected by the occlusion test.
    pub rejected_occlusion: u32,
    /// Whether occlusion testing was live this dispatch.
    pub occlusion_active: bool,
}

impl CullStats {
    /// Total survivors across all tiers.
    #[must_use]
    pub fn total_kept(&self) -> u32 {
        self.kept.iter().sum()
    }

    /// Fraction of the population that survived.
    #[must_use]
    pub fn survival_ratio(&self) -> f32 {
        if self.tested > 0 {
            self.total_kept() as f32 / self.tested as f32
        } else {
            0.0
        }
    }
}
