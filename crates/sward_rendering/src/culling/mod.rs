//! The culling and classification kernel.
//!
//! For every blade independently: mask test, frustum test, distance
//! thinning, optional occlusion test, then LOD tier classification with an
//! order-independent atomic append into the tier's bucket. Steps are
//! ordered cheapest first; the combined result is exactly "reject if any
//! step rejects", and no step has an observable side effect when an
//! earlier step already rejected.

mod bucket;
mod kernel;

pub use bucket::TierBucket;
pub use kernel::{
    classify_blade, Classification, CullInputs, CullingUniforms, RejectStage, FLAG_MASK_VALID,
    FLAG_OCCLUSION, FLAG_REVERSED_DEPTH,
};
