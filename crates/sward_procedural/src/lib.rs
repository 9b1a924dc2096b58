//! # Sward Procedural
//!
//! One-shot population generation for the sward culling core.
//!
//! Lays blades on a jittered grid across a planar extent, pushed around by
//! low-frequency simplex noise so the result clumps like real growth
//! instead of reading as a lattice. Heights come from an external
//! height-field sampling boundary; every random draw is seeded per grid
//! cell, so the index-to-blade mapping is stable and reproducible.
//!
//! Nothing in this crate runs per frame. The generator fills the source
//! array once (or again on explicit regeneration) and hands it to
//! `sward_rendering`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod generator;
pub mod heightfield;
pub mod noise;

pub use generator::{FieldGenerator, GrowthParams};
pub use heightfield::{FlatHeightField, FnHeightField, HeightField};
pub use noise::SimplexNoise;
