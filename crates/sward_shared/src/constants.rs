//! # Cross-Crate Constants
//!
//! Layout contracts shared between the CPU record definitions and the WGSL
//! kernels in `sward_rendering`.
//!
//! **CRITICAL:** These values are baked into the compute shaders.
//! Changes require touching the WGSL side as well.

/// Number of floats in one blade record.
///
/// The record is position (3) + height (1) + facing (2) + phase (1) +
/// stiffness (1) + width scale (1). Every buffer size in the pipeline is a
/// multiple of this.
pub const BLADE_RECORD_FLOATS: usize = 9;

/// Maximum number of LOD tiers the kernel classifies into.
///
/// Configurations may use fewer (2 is common); buffers are always allocated
/// for this many so the shader-side bindings never change shape.
pub const MAX_LOD_TIERS: usize = 3;

/// Threads per workgroup for the culling kernel dispatch.
///
/// One thread per blade; dispatch size is `ceil(population / this)`.
pub const CULL_WORKGROUP_SIZE: u32 = 64;

/// Workgroup side length for the depth pyramid passes (2D dispatch).
pub const PYRAMID_WORKGROUP_SIZE: u32 = 8;
