//! The per-blade decision function and its GPU uniform block.
//!
//! `classify_blade` is the reference implementation: serial, branchy, easy
//! to test. `shaders/blade_cull.wgsl` is its data-parallel twin; both read
//! the same decision inputs, and `CullingUniforms` is the layout contract
//! between them. If either side changes, both must.

use bytemuck::{Pod, Zeroable};

use sward_shared::math::mat4_transform_point;
use sward_shared::{survival_hash, BladeInstance, Frustum, MaskData};

use crate::camera::CameraState;
use crate::config::CullingConfig;
use crate::pyramid::DepthPyramid;

/// Uniform flag: occlusion testing is live (enabled and a valid pyramid
/// exists this frame).
pub const FLAG_OCCLUSION: u32 = 1 << 0;
/// Uniform flag: an inclusion mask is bound this frame.
pub const FLAG_MASK_VALID: u32 = 1 << 1;
/// Uniform flag: the depth convention is reversed-Z.
pub const FLAG_REVERSED_DEPTH: u32 = 1 << 2;

/// GPU-side uniform block for the culling kernel.
///
/// Layout is mirrored field for field by `Params` in
/// `shaders/blade_cull.wgsl`; the size is asserted in tests.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct CullingUniforms {
    /// Column-major view-projection matrix.
    pub view_proj: [[f32; 4]; 4],
    /// Six frustum planes, precomputed on the host.
    pub planes: [[f32; 4]; 6],
    /// Camera position in xyz; projection scale factor in w.
    pub camera_pos: [f32; 4],
    /// Falloff start, max draw distance, min density, compensation.
    pub distance_params: [f32; 4],
    /// Squared tier upper-bound distances; unused slots repeat the last.
    pub tier_distances_sq: [f32; 4],
    /// Near, far, occlusion bias, pyramid base size.
    pub depth_params: [f32; 4],
    /// Mask world mapping: min x, min z, 1/width, 1/depth.
    pub mask_extent: [f32; 4],
    /// Blade count, tier count, flags, pyramid mip count.
    pub counts: [u32; 4],
    /// Mask threshold in x; yzw reserved.
    pub thresholds: [f32; 4],
}

impl CullingUniforms {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Assembles the uniform block for one dispatch.
    #[must_use]
    pub fn assemble(
        config: &CullingConfig,
        camera: &CameraState,
        blade_count: u32,
        pyramid: Option<&DepthPyramid>,
        mask: Option<&MaskData>,
    ) -> Self {
        Self::assemble_raw(
            config,
            camera,
            blade_count,
            pyramid.map(|p| (p.base_size(), p.level_count())),
            mask.map(MaskData::extent),
        )
    }

    /// Assembles the uniform block from raw pyramid and mask descriptions.
    ///
    /// The GPU path uses this directly: it has no CPU-side pyramid object,
    /// only the configured base size, mip count and this frame's
    /// availability.
    #[must_use]
    pub fn assemble_raw(
        config: &CullingConfig,
        camera: &CameraState,
        blade_count: u32,
        pyramid: Option<(u32, u32)>,
        mask_extent: Option<sward_shared::MaskExtent>,
    ) -> Self {
        let frustum = camera.frustum();

        let mut flags = 0;
        if config.occlusion && pyramid.is_some() {
            flags |= FLAG_OCCLUSION;
        }
        if mask_extent.is_some() {
            flags |= FLAG_MASK_VALID;
        }
        flags |= camera.convention.as_flag() * FLAG_REVERSED_DEPTH;

        let mut tier_sq = [0.0f32; 4];
        for (i, slot) in tier_sq.iter_mut().enumerate() {
            let d = config.tier_distances[i.min(config.tier_count as usize - 1)];
            *slot = d * d;
        }

        let mask_extent = mask_extent.map_or([0.0, 0.0, 0.0, 0.0], |e| {
            [e.min_x, e.min_z, 1.0 / e.width, 1.0 / e.depth]
        });

        Self {
            view_proj: camera.view_proj,
            planes: frustum.as_arrays(),
            camera_pos: [
                camera.position.x,
                camera.position.y,
                camera.position.z,
                camera.proj_scale(),
            ],
            distance_params: [
                config.falloff_start,
                config.max_draw_distance(),
                config.min_density,
                config.thinning_compensation,
            ],
            tier_distances_sq: tier_sq,
            depth_params: [
                camera.near,
                camera.far,
                config.occlusion_bias,
                pyramid.map_or(0.0, |(base, _)| base as f32),
            ],
            mask_extent,
            counts: [
                blade_count,
                config.tier_count,
                flags,
                pyramid.map_or(0, |(_, mips)| mips),
            ],
            thresholds: [config.mask_threshold, 0.0, 0.0, 0.0],
        }
    }
}

/// Which stage rejected a blade. Feeds per-dispatch statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectStage {
    /// Below the inclusion-mask threshold.
    Mask,
    /// Bounding sphere fully outside a frustum plane.
    Frustum,
    /// Beyond the max draw distance, or thinned out.
    Distance,
    /// Hidden behind nearer geometry per the depth pyramid.
    Occlusion,
}

/// The outcome of classifying one blade.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Classification {
    /// The blade survives into `tier` with the (possibly width-adjusted)
    /// record copy.
    Keep {
        /// LOD tier index.
        tier: u32,
        /// The record to append; the source array is never touched.
        record: BladeInstance,
    },
    /// The blade was rejected at the given stage.
    Reject(RejectStage),
}

/// Shared per-dispatch inputs for the reference kernel.
pub struct CullInputs<'a> {
    /// Kernel tunables.
    pub config: &'a CullingConfig,
    /// This frame's camera.
    pub camera: &'a CameraState,
    /// Host-precomputed frustum planes.
    pub frustum: &'a Frustum,
    /// Committed mask snapshot, if any. `None` degrades to always-pass.
    pub mask: Option<&'a MaskData>,
    /// This frame's pyramid, if one was built. `None` degrades the
    /// occlusion stage to always-pass - never to rejection.
    pub pyramid: Option<&'a DepthPyramid>,
}

/// Classifies a single blade.
///
/// Fully independent per blade: no ordering guarantees, no side effects.
/// The stage order (mask, frustum, thinning, occlusion) runs cheapest
/// first but is semantically just "reject if any stage rejects".
#[must_use]
pub fn classify_blade(
    blade: &BladeInstance,
    index: u32,
    inputs: &CullInputs<'_>,
) -> Classification {
    let config = inputs.config;
    let camera = inputs.camera;

    // 1. Mask test - re-sampled every frame so live mask edits take
    //    effect without regeneration. Missing mask fails open.
    if let Some(mask) = inputs.mask {
        if mask.sample_world(blade.position[0], blade.position[2]) < config.mask_threshold {
            return Classification::Reject(RejectStage::Mask);
        }
    }

    // 2. Frustum test against host-precomputed planes.
    let sphere = blade.bounding_sphere();
    if !inputs.frustum.test_sphere(sphere) {
        return Classification::Reject(RejectStage::Frustum);
    }

    // 3. Distance thinning on squared distances.
    let d2 = camera.position.distance_squared(sphere.center);
    let max_dist = config.max_draw_distance();
    if d2 > max_dist * max_dist {
        return Classification::Reject(RejectStage::Distance);
    }

    let mut record = *blade;
    let falloff = config.falloff_start;
    if d2 > falloff * falloff {
        // The sqrt is unavoidable here: the survival curve is specified
        // linear in distance, and we only pay it past the falloff start.
        let range = max_dist - falloff;
        let t = if range > 0.0 {
            ((d2.sqrt() - falloff) / range).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let survival = 1.0 - (1.0 - config.min_density) * t;
        if survival_hash(index) > survival {
            return Classification::Reject(RejectStage::Distance);
        }
        // Widen the surviving copy to hold perceived coverage; the source
        // record keeps width_scale untouched.
        let widen = 1.0 + (1.0 / survival - 1.0) * config.thinning_compensation;
        record = record.with_width_scale(record.width_scale * widen);
    }

    // 4. Occlusion test. Skipped entirely - treated as always-pass - when
    //    disabled or no pyramid exists this frame.
    if config.occlusion {
        if let Some(pyramid) = inputs.pyramid {
            if sphere_occluded(sphere, camera, pyramid, config.occlusion_bias) {
                return Classification::Reject(RejectStage::Occlusion);
            }
        }
    }

    // 5. LOD classification by squared distance.
    let mut tier = config.tier_count - 1;
    for i in 0..config.tier_count {
        let d = config.tier_distances[i as usize];
        if d2 <= d * d {
            tier = i;
            break;
        }
    }

    Classification::Keep { tier, record }
}

/// Conservative screen-space occlusion test against the depth pyramid.
fn sphere_occluded(
    sphere: sward_shared::BoundingSphere,
    camera: &CameraState,
    pyramid: &DepthPyramid,
    bias: f32,
) -> bool {
    let clip = mat4_transform_point(&camera.view_proj, sphere.center);
    if clip[3] <= 0.0 {
        // Degenerate projection (at or behind the eye plane): keep.
        return false;
    }

    let inv_w = 1.0 / clip[3];
    let u = clip[0] * inv_w * 0.5 + 0.5;
    let v = 1.0 - (clip[1] * inv_w * 0.5 + 0.5);
    let depth = (clip[2] * inv_w).clamp(0.0, 1.0);

    // Projected radius in pyramid texels, then the mip where one texel
    // covers the whole footprint: ceil(log2(max(radius, 1))).
    let radius_px =
        camera.proj_scale() * sphere.radius * inv_w * (pyramid.base_size() as f32 * 0.5);
    let level = radius_px.max(1.0).log2().ceil() as u32;

    let sampled = pyramid.sample_level(u, v, level);

    let convention = camera.convention;
    let scene_eye = convention.to_linear_eye(sampled, camera.near, camera.far);
    let blade_eye = convention.to_linear_eye(depth, camera.near, camera.far);
    blade_eye > scene_eye + bias
}

#[cfg(test)]
mod tests {
    use super::*;
    use sward_shared::math::{look_at, mat4_mul, perspective};
    use sward_shared::{DepthConvention, InclusionMask, MaskExtent, Vec2, Vec3};

    use crate::pyramid::DepthSource;

    fn camera_at_origin() -> CameraState {
        let view = look_at(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 1.0, -10.0), Vec3::Y);
        let proj = perspective(1.0, 1.0, 0.1, 200.0);
        CameraState {
            view_proj: mat4_mul(&proj, &view),
            position: Vec3::new(0.0, 1.0, 0.0),
            near: 0.1,
            far: 200.0,
            fov_y: 1.0,
            convention: DepthConvention::Standard,
        }
    }

    fn blade_at(x: f32, z: f32) -> BladeInstance {
        BladeInstance::new(Vec3::new(x, 0.0, z), 1.0, Vec2::new(1.0, 0.0), 0.0, 0.7)
    }

    fn inputs<'a>(
        config: &'a CullingConfig,
        camera: &'a CameraState,
        frustum: &'a Frustum,
    ) -> CullInputs<'a> {
        CullInputs {
            config,
            camera,
            frustum,
            mask: None,
            pyramid: None,
        }
    }

    #[test]
    fn test_in_view_blade_survives() {
        let config = CullingConfig::balanced();
        let camera = camera_at_origin();
        let frustum = camera.frustum();
        let result = classify_blade(&blade_at(0.0, -5.0), 0, &inputs(&config, &camera, &frustum));
        assert!(matches!(result, Classification::Keep { tier: 0, .. }));
    }

    #[test]
    fn test_behind_camera_rejects_at_frustum() {
        let config = CullingConfig::balanced();
        let camera = camera_at_origin();
        let frustum = camera.frustum();
        let result = classify_blade(&blade_at(0.0, 50.0), 0, &inputs(&config, &camera, &frustum));
        assert_eq!(result, Classification::Reject(RejectStage::Frustum));
    }

    #[test]
    fn test_beyond_max_distance_rejects() {
        let config = CullingConfig::balanced();
        let camera = camera_at_origin();
        let frustum = camera.frustum();
        let result =
            classify_blade(&blade_at(0.0, -500.0), 0, &inputs(&config, &camera, &frustum));
        // Outside the far tier threshold; frustum may also reject depending
        // on the far plane, so only assert it did not survive.
        assert!(matches!(result, Classification::Reject(_)));
    }

    #[test]
    fn test_mask_rejects_below_threshold() {
        let config = CullingConfig::balanced();
        let camera = camera_at_origin();
        let frustum = camera.frustum();

        let mask = InclusionMask::filled(4, 4, MaskExtent::centered(400.0, 400.0), 0.0);
        let snapshot = mask.snapshot();
        let mut input = inputs(&config, &camera, &frustum);
        input.mask = Some(&snapshot);

        let result = classify_blade(&blade_at(0.0, -5.0), 0, &input);
        assert_eq!(result, Classification::Reject(RejectStage::Mask));
    }

    #[test]
    fn test_thinning_widens_survivors_only_in_copy() {
        let mut config = CullingConfig::balanced();
        config.falloff_start = 1.0;
        config.tier_distances = [25.0, 60.0, 120.0];
        let camera = camera_at_origin();
        let frustum = camera.frustum();
        let blade = blade_at(0.0, -50.0);

        // Scan indices until one survives thinning at this distance.
        let mut widened = None;
        for index in 0..256 {
            if let Classification::Keep { record, .. } =
                classify_blade(&blade, index, &inputs(&config, &camera, &frustum))
            {
                widened = Some(record);
                break;
            }
        }
        let record = widened.expect("some index must survive thinning");
        assert!(record.width_scale > 1.0, "survivor must be widened");
        assert_eq!(blade.width_scale, 1.0, "source record untouched");
    }

    #[test]
    fn test_missing_pyramid_never_rejects_occlusion() {
        let mut config = CullingConfig::balanced();
        config.occlusion = true;
        let camera = camera_at_origin();
        let frustum = camera.frustum();
        // Occlusion requested but no pyramid: must behave as always-pass.
        let result = classify_blade(&blade_at(0.0, -5.0), 0, &inputs(&config, &camera, &frustum));
        assert!(matches!(result, Classification::Keep { .. }));
    }

    #[test]
    fn test_near_occluder_rejects_far_blade() {
        let mut config = CullingConfig::balanced();
        config.occlusion = true;
        // Thinning neutralized so the only possible rejection is occlusion.
        config.falloff_start = config.max_draw_distance();
        let camera = camera_at_origin();
        let frustum = camera.frustum();

        // A wall of very near depth across the whole screen.
        let texels = vec![0.001f32; 16];
        let pyramid = DepthPyramid::build(
            DepthSource::new(&texels, 4, 4),
            4,
            DepthConvention::Standard,
        );

        let mut input = inputs(&config, &camera, &frustum);
        input.pyramid = Some(&pyramid);
        let result = classify_blade(&blade_at(0.0, -50.0), 0, &input);
        assert_eq!(result, Classification::Reject(RejectStage::Occlusion));
    }

    #[test]
    fn test_far_depth_keeps_blade() {
        let mut config = CullingConfig::balanced();
        config.occlusion = true;
        let camera = camera_at_origin();
        let frustum = camera.frustum();

        // Everything at the far plane: nothing can be occluded.
        let texels = vec![1.0f32; 16];
        let pyramid = DepthPyramid::build(
            DepthSource::new(&texels, 4, 4),
            4,
            DepthConvention::Standard,
        );

        let mut input = inputs(&config, &camera, &frustum);
        input.pyramid = Some(&pyramid);
        let result = classify_blade(&blade_at(0.0, -5.0), 0, &input);
        assert!(matches!(result, Classification::Keep { .. }));
    }

    #[test]
    fn test_uniform_block_size_contract() {
        // 4 (mat) + 6 (planes) + 7 (vec4 params) rows of 16 bytes.
        assert_eq!(CullingUniforms::SIZE, 272);
    }

    #[test]
    fn test_uniform_flags() {
        let config = CullingConfig::balanced();
        let camera = camera_at_origin();
        let uniforms = CullingUniforms::assemble(&config, &camera, 100, None, None);
        // Occlusion enabled in config but no pyramid: flag must be clear.
        assert_eq!(uniforms.counts[2] & FLAG_OCCLUSION, 0);
        assert_eq!(uniforms.counts[2] & FLAG_MASK_VALID, 0);
        assert_eq!(uniforms.counts[0], 100);
    }
}
