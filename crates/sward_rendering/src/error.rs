//! # Rendering Error Types
//!
//! Only genuinely exceptional conditions are errors. The degraded modes the
//! pipeline is specified to survive - missing depth source, missing mask -
//! are represented as `Option`/status flags and log a warning instead.

use thiserror::Error;

/// Errors from the GPU boundary.
#[derive(Error, Debug)]
pub enum GpuError {
    /// A debug read-back failed to map its staging buffer.
    #[error("staging buffer map failed: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),

    /// A debug read-back completed without delivering a result.
    #[error("read-back channel closed before a result arrived")]
    ReadbackLost,
}
