//! # Sward Shared
//!
//! Common types used by both the population generator and the culling core.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - `wgpu`
//! - Any GPU or window-related crate
//!
//! Graphics-facing code belongs in `sward_rendering`. What lives here is the
//! contract both sides agree on: the 36-byte blade record, the math that
//! derives frustum planes and linear depth, the deterministic seed/hash
//! utilities, and the inclusion-mask resource.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod depth;
pub mod mask;
pub mod math;
pub mod records;
pub mod seed;

pub use constants::{
    BLADE_RECORD_FLOATS, CULL_WORKGROUP_SIZE, MAX_LOD_TIERS, PYRAMID_WORKGROUP_SIZE,
};
pub use depth::DepthConvention;
pub use mask::{InclusionMask, MaskData, MaskExtent};
pub use math::{BoundingSphere, Frustum, Mat4, Plane, Vec2, Vec3};
pub use records::BladeInstance;
pub use seed::{survival_hash, FieldSeed};
