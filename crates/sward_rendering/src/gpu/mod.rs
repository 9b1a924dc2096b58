//! The wgpu rendition of the frame pipeline.
//!
//! Three compute passes encoded in fixed dependency order every frame:
//! pyramid (point-sample resize, then per-level farthest reduction),
//! culling, argument update. The host's per-frame work is one uniform
//! write and the command encoding; no data ever comes back except through
//! the explicitly opt-in debug read-back.
//!
//! Resource lifecycle: the blade buffer is keyed by the population's
//! epoch - a regeneration allocates a fresh buffer, and wgpu keeps the old
//! one alive until every in-flight submission referencing it completes.

mod passes;
mod readback;
mod resources;

pub use passes::{GpuFrame, GpuSwardPipeline};
pub use readback::read_tier_counts;
