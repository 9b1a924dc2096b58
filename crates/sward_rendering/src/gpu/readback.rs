//! Explicit, opt-in debug read-back of the tier counters.
//!
//! This is the one place the host is allowed to wait on the GPU, and it is
//! never called implicitly: mapping the staging buffer stalls the pipeline,
//! which is exactly what the hot path exists to avoid. Use it for external
//! debug displays, not control flow.

use sward_shared::MAX_LOD_TIERS;

use crate::error::GpuError;
use crate::gpu::passes::GpuSwardPipeline;

/// Reads the per-tier survivor counters back to the host.
///
/// Blocks until the copy completes. Counts are clamped to the bucket
/// capacity, matching what the argument updater published.
///
/// # Errors
///
/// Returns `GpuError` if the staging buffer fails to map or the map
/// callback never delivers a result.
pub fn read_tier_counts(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    pipeline: &GpuSwardPipeline,
) -> Result<[u32; MAX_LOD_TIERS], GpuError> {
    let size = (MAX_LOD_TIERS * std::mem::size_of::<u32>()) as u64;
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("sward counter read-back"),
        size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("sward counter read-back"),
    });
    encoder.copy_buffer_to_buffer(pipeline.counters_buffer(), 0, &staging, 0, size);
    queue.submit(Some(encoder.finish()));

    let (tx, rx) = std::sync::mpsc::channel();
    staging.slice(..).map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    let _ = device.poll(wgpu::Maintain::Wait);

    rx.recv().map_err(|_| GpuError::ReadbackLost)??;

    let counts: [u32; MAX_LOD_TIERS] = {
        let view = staging.slice(..).get_mapped_range();
        let raw: &[u32] = bytemuck::cast_slice(&view);
        [
            raw[0].min(pipeline.config().bucket_capacity),
            raw[1].min(pipeline.config().bucket_capacity),
            raw[2].min(pipeline.config().bucket_capacity),
        ]
    };
    staging.unmap();

    tracing::debug!(?counts, "debug counter read-back");
    Ok(counts)
}
