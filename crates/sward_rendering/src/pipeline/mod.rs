//! Frame orchestration.
//!
//! `SwardPipeline` is an explicit orchestration function: it takes camera,
//! depth source and mask as parameters, owns the pyramid for the frame,
//! and returns per-tier (bucket, argument) handles - no engine globals, no
//! implicit state shared between producer and consumer. Per frame, in
//! strict order:
//!
//! 1. rebuild the population if generation parameters changed
//!    (`rebuild_field`, driven by the caller),
//! 2. build the depth pyramid, or mark occlusion unavailable,
//! 3. zero every bucket counter,
//! 4. run the kernel across the full population,
//! 5. update the indirect arguments,
//! 6. publish the (bucket, args) pairs.
//!
//! This is the software rendition; `gpu::GpuSwardPipeline` issues the same
//! steps as compute dispatches.

mod frame;
mod stats;

pub use frame::{FrameInput, FrameOutput, TierOutput};
pub use stats::CullStats;

use sward_procedural::{GrowthParams, HeightField};
use sward_shared::{InclusionMask, MaskData, MAX_LOD_TIERS};

use crate::config::CullingConfig;
use crate::culling::{classify_blade, Classification, CullInputs, RejectStage, TierBucket};
use crate::field::BladeField;
use crate::indirect::{write_instance_counts, DrawIndexedIndirectArgs};
use crate::pyramid::DepthPyramid;

/// The software frame orchestrator.
pub struct SwardPipeline {
    config: CullingConfig,
    field: BladeField,
    buckets: Vec<TierBucket>,
    args: Vec<DrawIndexedIndirectArgs>,
    depth_warned: bool,
}

impl SwardPipeline {
    /// Creates a pipeline over an existing population.
    ///
    /// `tier_index_counts` fixes each tier's mesh index count in its
    /// draw-argument record; nothing but `instance_count` changes after
    /// this point.
    ///
    /// # Panics
    ///
    /// Panics if the config fails validation; configs from
    /// `CullingConfig::from_toml_str` are already validated.
    #[must_use]
    pub fn new(
        config: CullingConfig,
        field: BladeField,
        tier_index_counts: [u32; MAX_LOD_TIERS],
    ) -> Self {
        if let Err(err) = config.validate() {
            panic!("invalid culling config: {err}");
        }

        let tiers = config.tier_count as usize;
        let buckets = (0..tiers)
            .map(|_| TierBucket::with_capacity(config.bucket_capacity))
            .collect();
        let args = tier_index_counts[..tiers]
            .iter()
            .map(|&n| DrawIndexedIndirectArgs::for_blade_mesh(n))
            .collect();

        Self {
            config,
            field,
            buckets,
            args,
            depth_warned: false,
        }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &CullingConfig {
        &self.config
    }

    /// The source population.
    #[must_use]
    pub const fn field(&self) -> &BladeField {
        &self.field
    }

    /// Step 1 of the frame: rebuilds the population if `params` changed.
    ///
    /// Returns true if a rebuild happened.
    pub fn rebuild_field(
        &mut self,
        params: GrowthParams,
        height_field: &dyn HeightField,
        mask: Option<&MaskData>,
    ) -> bool {
        self.field.rebuild_if_changed(params, height_field, mask)
    }

    /// Steps 2-6 of the frame: pyramid, reset, kernel, arguments, publish.
    ///
    /// The returned output borrows the buckets; it is valid until the next
    /// call.
    pub fn run_frame(&mut self, input: &FrameInput<'_>) -> FrameOutput<'_> {
        // Step 2: the pyramid is a frame-scoped derived view. A missing
        // depth source degrades occlusion to always-pass - never an error.
        let pyramid = if self.config.occlusion {
            match input.depth {
                Some(source) => {
                    self.depth_warned = false;
                    Some(DepthPyramid::build(
                        source,
                        self.config.pyramid_size,
                        input.camera.convention,
                    ))
                }
                None => {
                    if !self.depth_warned {
                        tracing::warn!(
                            "occlusion requested but no depth source; \
                             occlusion disabled until one is available"
                        );
                        self.depth_warned = true;
                    }
                    None
                }
            }
        } else {
            None
        };

        // Step 3: zero every bucket counter.
        for bucket in &self.buckets {
            bucket.reset();
        }

        // One committed mask snapshot serves the whole dispatch.
        let mask_snapshot = input.mask.map(InclusionMask::snapshot);

        let frustum = input.camera.frustum();
        let cull_inputs = CullInputs {
            config: &self.config,
            camera: &input.camera,
            frustum: &frustum,
            mask: mask_snapshot.as_deref(),
            pyramid: pyramid.as_ref(),
        };

        // Step 4: the kernel, one independent decision per blade.
        let mut stats = CullStats {
            tested: self.field.len() as u32,
            occlusion_active: cull_inputs.pyramid.is_some(),
            ..CullStats::default()
        };
        for (index, blade) in self.field.blades().iter().enumerate() {
            match classify_blade(blade, index as u32, &cull_inputs) {
                Classification::Keep { tier, record } => {
                    self.buckets[tier as usize].push(record);
                    stats.kept[tier as usize] += 1;
                }
                Classification::Reject(RejectStage::Mask) => stats.rejected_mask += 1,
                Classification::Reject(RejectStage::Frustum) => stats.rejected_frustum += 1,
                Classification::Reject(RejectStage::Distance) => stats.rejected_distance += 1,
                Classification::Reject(RejectStage::Occlusion) => stats.rejected_occlusion += 1,
            }
        }

        // Step 5: copy survivor counts into the argument records.
        write_instance_counts(&mut self.args, &self.buckets);

        tracing::debug!(
            tested = stats.tested,
            kept = stats.total_kept(),
            occlusion = stats.occlusion_active,
            "culling dispatch complete"
        );

        // Step 6: publish.
        FrameOutput {
            tiers: self
                .buckets
                .iter()
                .zip(&self.args)
                .map(|(bucket, &args)| TierOutput {
                    records: bucket.as_slice(),
                    args,
                })
                .collect(),
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sward_procedural::FlatHeightField;
    use sward_shared::math::{look_at, mat4_mul, perspective};
    use sward_shared::{DepthConvention, Vec3};

    use crate::camera::CameraState;

    fn camera() -> CameraState {
        let view = look_at(Vec3::new(0.0, 2.0, 20.0), Vec3::ZERO, Vec3::Y);
        let proj = perspective(1.0, 1.0, 0.1, 300.0);
        CameraState {
            view_proj: mat4_mul(&proj, &view),
            position: Vec3::new(0.0, 2.0, 20.0),
            near: 0.1,
            far: 300.0,
            fov_y: 1.0,
            convention: DepthConvention::Standard,
        }
    }

    fn pipeline() -> SwardPipeline {
        let params = GrowthParams::meadow().with_count(2_500).with_extent(60.0);
        let field = BladeField::generate(params, &FlatHeightField(0.0), None);
        SwardPipeline::new(CullingConfig::balanced(), field, [12, 6, 3])
    }

    #[test]
    fn test_frame_publishes_tier_per_config() {
        let mut pipeline = pipeline();
        let output = pipeline.run_frame(&FrameInput {
            camera: camera(),
            depth: None,
            mask: None,
        });
        assert_eq!(output.tiers.len(), 3);
        assert!(output.total_survivors() > 0, "an open field must survive");
    }

    #[test]
    fn test_args_mirror_bucket_lengths() {
        let mut pipeline = pipeline();
        let output = pipeline.run_frame(&FrameInput {
            camera: camera(),
            depth: None,
            mask: None,
        });
        for tier in &output.tiers {
            assert_eq!(tier.args.instance_count, tier.records.len() as u32);
        }
        // Fixed fields kept their initialization values.
        assert_eq!(output.tiers[0].args.index_count, 12);
        assert_eq!(output.tiers[1].args.index_count, 6);
    }

    #[test]
    fn test_consecutive_frames_identical() {
        let mut pipeline = pipeline();
        let input = FrameInput {
            camera: camera(),
            depth: None,
            mask: None,
        };
        let first: Vec<u32> = pipeline
            .run_frame(&input)
            .tiers
            .iter()
            .map(|t| t.args.instance_count)
            .collect();
        let second: Vec<u32> = pipeline
            .run_frame(&input)
            .tiers
            .iter()
            .map(|t| t.args.instance_count)
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rebuild_only_on_param_change() {
        let mut pipeline = pipeline();
        let ground = FlatHeightField(0.0);
        let params = *pipeline.field().params();
        assert!(!pipeline.rebuild_field(params, &ground, None));
        assert!(pipeline.rebuild_field(params.with_seed(3), &ground, None));
    }
}
