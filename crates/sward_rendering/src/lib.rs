//! # Sward Rendering Core
//!
//! GPU-resident instance culling, occlusion and LOD classification for very
//! large blade populations (hundreds of thousands to low millions).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      PER-FRAME PIPELINE                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  camera + depth buffer → Depth Pyramid (farthest reduction)  │
//! │        ↓                                                     │
//! │  population + pyramid + frustum + mask → Culling Kernel      │
//! │        ↓                                                     │
//! │  LOD buckets (atomic append) → Indirect Draw Arguments       │
//! │        ↓                                                     │
//! │  (bucket, args) pairs per tier → external renderer           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! This core never decides how a blade looks - only whether it exists this
//! frame, at what width, and in which detail tier. Every decision is
//! deterministic for identical inputs, and every degraded mode (no depth
//! source, no mask) fails open to "keep", never to "reject".
//!
//! The same decision function exists twice: `culling::classify_blade` is
//! the CPU reference driving the software pipeline and the test suite, and
//! `shaders/blade_cull.wgsl` is the data-parallel twin the GPU pipeline
//! dispatches. The uniform block layout is shared and asserted.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod camera;
pub mod config;
pub mod culling;
pub mod error;
pub mod field;
pub mod gpu;
pub mod indirect;
pub mod pipeline;
pub mod pyramid;

pub use camera::CameraState;
pub use config::{ConfigError, CullingConfig};
pub use culling::{classify_blade, Classification, CullInputs, RejectStage, TierBucket};
pub use error::GpuError;
pub use field::BladeField;
pub use gpu::{read_tier_counts, GpuFrame, GpuSwardPipeline};
pub use indirect::DrawIndexedIndirectArgs;
pub use pipeline::{CullStats, FrameInput, FrameOutput, SwardPipeline, TierOutput};
pub use pyramid::{DepthPyramid, DepthSource};
