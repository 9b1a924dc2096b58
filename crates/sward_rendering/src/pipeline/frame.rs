//! Frame input and output handoff structures.

use sward_shared::{BladeInstance, InclusionMask};

use crate::camera::CameraState;
use crate::indirect::DrawIndexedIndirectArgs;
use crate::pipeline::stats::CullStats;
use crate::pyramid::DepthSource;

/// Everything one frame of culling consumes, passed explicitly - there is
/// no engine-global state behind this.
pub struct FrameInput<'a> {
    /// This frame's camera.
    pub camera: CameraState,
    /// The external depth buffer, if one is available. `None` marks
    /// occlusion unavailable for this frame.
    pub depth: Option<DepthSource<'a>>,
    /// The inclusion mask. The pipeline takes exactly one committed
    /// snapshot per dispatch. `None` degrades the mask stage to
    /// always-pass.
    pub mask: Option<&'a InclusionMask>,
}

/// One LOD tier's published output: the survivor records paired with the
/// draw-argument record an external renderer consumes.
pub struct TierOutput<'a> {
    /// Survivor records, valid until the next dispatch.
    pub records: &'a [BladeInstance],
    /// The indirect draw arguments for this tier.
    pub args: DrawIndexedIndirectArgs,
}

/// The published result of one frame.
pub struct FrameOutput<'a> {
    /// Per-tier (bucket, arguments) pairs, tier 0 first.
    pub tiers: Vec<TierOutput<'a>>,
    /// Dispatch statistics.
    pub stats: CullStats,
}

impl FrameOutput<'_> {
    /// Total survivors across all tiers this frame.
    #[must_use]
    pub fn total_survivors(&self) -> u32 {
        self.stats.total_kept()
    }
}
