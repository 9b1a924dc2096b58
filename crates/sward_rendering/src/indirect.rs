//! Indirect draw-argument records.
//!
//! One record per LOD tier. Everything except `instance_count` is fixed at
//! initialization; per frame, only the bucket's survivor count is copied in
//! - on the GPU by `shaders/draw_args.wgsl`, on the software path by
//! `write_instance_counts`. The host never reads counts back to drive
//! control flow; that is what indirect draws exist to avoid.

use bytemuck::{Pod, Zeroable};

use crate::culling::TierBucket;

/// Arguments for `draw_indexed_indirect` - filled GPU-side after culling.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawIndexedIndirectArgs {
    /// Indices per blade mesh. Fixed at initialization.
    pub index_count: u32,
    /// Number of surviving instances. The only per-frame field.
    pub instance_count: u32,
    /// First index. Fixed at initialization.
    pub first_index: u32,
    /// Base vertex. Fixed at initialization.
    pub base_vertex: i32,
    /// First instance. Fixed at initialization.
    pub first_instance: u32,
}

impl DrawIndexedIndirectArgs {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Creates a record for a blade mesh with the given index count,
    /// starting with zero instances.
    #[must_use]
    pub const fn for_blade_mesh(index_count: u32) -> Self {
        Self {
            index_count,
            instance_count: 0,
            first_index: 0,
            base_vertex: 0,
            first_instance: 0,
        }
    }
}

/// Software rendition of the argument-update dispatch: copies each
/// bucket's clamped survivor count into its record's `instance_count`.
pub fn write_instance_counts(args: &mut [DrawIndexedIndirectArgs], buckets: &[TierBucket]) {
    for (record, bucket) in args.iter_mut().zip(buckets) {
        record.instance_count = bucket.len();
    }
}
