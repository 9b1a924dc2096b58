//! # Culling Pipeline Properties
//!
//! End-to-end checks of the decision properties the pipeline guarantees:
//! frustum and mask rejection are absolute, buckets stay disjoint and
//! bounded, occlusion only ever shrinks the survivor set, thinning is
//! monotonic in distance, and everything is deterministic frame to frame.

use sward_procedural::{FlatHeightField, GrowthParams};
use sward_rendering::{
    classify_blade, CameraState, Classification, CullInputs, CullingConfig, BladeField,
    DepthPyramid, DepthSource, FrameInput, RejectStage, SwardPipeline,
};
use sward_shared::math::{look_at, mat4_mul, perspective};
use sward_shared::{
    BladeInstance, DepthConvention, InclusionMask, MaskExtent, Vec2, Vec3,
};

/// Camera at the origin looking down -Z; identity view, so world
/// coordinates read directly as eye coordinates.
fn test_camera() -> CameraState {
    let view = look_at(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y);
    let proj = perspective(1.0, 1.0, 0.1, 300.0);
    CameraState {
        view_proj: mat4_mul(&proj, &view),
        position: Vec3::ZERO,
        near: 0.1,
        far: 300.0,
        fov_y: 1.0,
        convention: DepthConvention::Standard,
    }
}

fn blade_at(x: f32, z: f32) -> BladeInstance {
    BladeInstance::new(Vec3::new(x, 0.0, z), 1.0, Vec2::new(1.0, 0.0), 0.0, 0.7)
}

/// Config with thinning neutralized (falloff at max distance) so the
/// scenario tests are fully deterministic per position.
fn no_thinning_config() -> CullingConfig {
    let mut config = CullingConfig::balanced();
    config.tier_distances = [25.0, 60.0, 200.0];
    config.falloff_start = 200.0;
    config
}

fn overhead_pipeline(config: CullingConfig) -> SwardPipeline {
    let params = GrowthParams::meadow().with_count(4_096).with_extent(120.0);
    let field = BladeField::generate(params, &FlatHeightField(0.0), None);
    SwardPipeline::new(config, field, [6, 6, 6])
}

/// Camera above the field center, looking down at a slant so a large part
/// of the population is in view.
fn field_camera() -> CameraState {
    let eye = Vec3::new(0.0, 25.0, 60.0);
    let view = look_at(eye, Vec3::ZERO, Vec3::Y);
    let proj = perspective(1.2, 16.0 / 9.0, 0.1, 300.0);
    CameraState {
        view_proj: mat4_mul(&proj, &view),
        position: eye,
        near: 0.1,
        far: 300.0,
        fov_y: 1.2,
        convention: DepthConvention::Standard,
    }
}

// ---------------------------------------------------------------------------
// The four-blade scenario: A near in view, B outside the frustum, C behind
// a near occluder, D far but unoccluded. Exactly A and D survive.
// ---------------------------------------------------------------------------
#[test]
fn scenario_four_blades() {
    let config = no_thinning_config();
    let camera = test_camera();
    let frustum = camera.frustum();

    // Left half of the screen is walled off by near geometry (eye depth
    // about 9), the right half sees out to the far plane.
    let mut depth = vec![1.0f32; 64];
    for row in 0..8 {
        for col in 0..4 {
            depth[row * 8 + col] = 0.99;
        }
    }
    let pyramid = DepthPyramid::build(
        DepthSource::new(&depth, 8, 8),
        8,
        DepthConvention::Standard,
    );

    let inputs = CullInputs {
        config: &config,
        camera: &camera,
        frustum: &frustum,
        mask: None,
        pyramid: Some(&pyramid),
    };

    let a = blade_at(0.0, -5.0); // near, in view, unoccluded
    let b = blade_at(0.0, 50.0); // behind the camera
    let c = blade_at(-5.0, -50.0); // far, projects into the walled half
    let d = blade_at(5.0, -50.0); // far, projects into the open half

    assert!(matches!(
        classify_blade(&a, 0, &inputs),
        Classification::Keep { tier: 0, .. }
    ));
    assert_eq!(
        classify_blade(&b, 1, &inputs),
        Classification::Reject(RejectStage::Frustum)
    );
    assert_eq!(
        classify_blade(&c, 2, &inputs),
        Classification::Reject(RejectStage::Occlusion)
    );
    assert!(matches!(
        classify_blade(&d, 3, &inputs),
        Classification::Keep { .. }
    ));
}

// ---------------------------------------------------------------------------
// Frustum property: nothing outside the frustum reaches any bucket.
// ---------------------------------------------------------------------------
#[test]
fn outside_frustum_never_bucketed() {
    let mut pipeline = overhead_pipeline(no_thinning_config());
    let camera = field_camera();
    let frustum = camera.frustum();

    let output = pipeline.run_frame(&FrameInput {
        camera,
        depth: None,
        mask: None,
    });

    for tier in &output.tiers {
        for record in tier.records {
            assert!(
                frustum.test_sphere(record.bounding_sphere()),
                "bucketed blade at {:?} is outside the frustum",
                record.position
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Mask property: below-threshold blades never appear, regardless of
// distance or occlusion state.
// ---------------------------------------------------------------------------
#[test]
fn masked_blades_never_bucketed() {
    let mut pipeline = overhead_pipeline(no_thinning_config());

    // Mask out everything at x < 0.
    let mask = InclusionMask::filled(64, 64, MaskExtent::centered(120.0, 120.0), 1.0);
    mask.paint(|m| {
        for y in 0..64 {
            for x in 0..32 {
                m.set_texel(x, y, 0.0);
            }
        }
    });
    mask.commit();

    let output = pipeline.run_frame(&FrameInput {
        camera: field_camera(),
        depth: None,
        mask: Some(&mask),
    });

    assert!(output.stats.rejected_mask > 0, "mask must reject something");
    for tier in &output.tiers {
        for record in tier.records {
            // Point sampling maps every x < 0 into the masked texel half.
            assert!(
                record.position[0] >= 0.0,
                "masked blade at {:?} survived",
                record.position
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Bucket invariants: total never exceeds the population, and no blade
// lands in two tiers.
// ---------------------------------------------------------------------------
#[test]
fn buckets_bounded_and_disjoint() {
    let mut pipeline = overhead_pipeline(no_thinning_config());
    let population = pipeline.field().len() as u32;

    let output = pipeline.run_frame(&FrameInput {
        camera: field_camera(),
        depth: None,
        mask: None,
    });

    let total: u32 = output.tiers.iter().map(|t| t.records.len() as u32).sum();
    assert!(total <= population);

    // Positions are unique per blade, so cross-tier duplicates would mean
    // a blade was classified into two tiers.
    let mut seen = std::collections::HashSet::new();
    for tier in &output.tiers {
        for record in tier.records {
            let key = (
                record.position[0].to_bits(),
                record.position[1].to_bits(),
                record.position[2].to_bits(),
            );
            assert!(seen.insert(key), "blade {:?} in two tiers", record.position);
        }
    }
}

// ---------------------------------------------------------------------------
// Monotonic filter property: enabling occlusion can only shrink the
// survivor set.
// ---------------------------------------------------------------------------
#[test]
fn occlusion_only_shrinks_survivors() {
    fn survivors(depth: Option<DepthSource<'_>>) -> std::collections::HashSet<(u32, u32, u32)> {
        let mut pipeline = overhead_pipeline(no_thinning_config());
        let output = pipeline.run_frame(&FrameInput {
            camera: field_camera(),
            depth,
            mask: None,
        });
        output
            .tiers
            .iter()
            .flat_map(|t| t.records.iter())
            .map(|r| {
                (
                    r.position[0].to_bits(),
                    r.position[1].to_bits(),
                    r.position[2].to_bits(),
                )
            })
            .collect()
    }

    let without = survivors(None);

    // A near wall over the left half of the screen.
    let mut depth = vec![1.0f32; 256];
    for row in 0..16 {
        for col in 0..8 {
            depth[row * 16 + col] = 0.995;
        }
    }
    let with = survivors(Some(DepthSource::new(&depth, 16, 16)));

    assert!(with.len() < without.len(), "the wall must occlude something");
    assert!(
        with.is_subset(&without),
        "occlusion must never add survivors"
    );
}

// ---------------------------------------------------------------------------
// Thinning property: survival is non-increasing with distance, and the
// surviving index sets are nested.
// ---------------------------------------------------------------------------
#[test]
fn thinning_survival_non_increasing() {
    let mut config = CullingConfig::balanced();
    config.tier_distances = [50.0, 120.0, 250.0];
    config.falloff_start = 20.0;
    config.min_density = 0.15;
    let camera = test_camera();
    let frustum = camera.frustum();
    let inputs = CullInputs {
        config: &config,
        camera: &camera,
        frustum: &frustum,
        mask: None,
        pyramid: None,
    };

    let mut previous: Option<std::collections::HashSet<u32>> = None;
    for z in [-30.0, -80.0, -130.0, -180.0, -240.0] {
        let blade = blade_at(0.0, z);
        let survivors: std::collections::HashSet<u32> = (0..4_096)
            .filter(|&i| matches!(classify_blade(&blade, i, &inputs), Classification::Keep { .. }))
            .collect();

        if let Some(prev) = &previous {
            assert!(
                survivors.len() <= prev.len(),
                "survival increased with distance at z = {z}"
            );
            assert!(
                survivors.is_subset(prev),
                "thinning sets must be nested: a blade that dies near cannot live far"
            );
        }
        previous = Some(survivors);
    }
}

// ---------------------------------------------------------------------------
// Determinism: identical population, camera, mask and pyramid produce the
// same decisions on consecutive frames.
// ---------------------------------------------------------------------------
#[test]
fn consecutive_frames_are_identical() {
    let mut pipeline = overhead_pipeline(CullingConfig::balanced());

    let mask = InclusionMask::filled(32, 32, MaskExtent::centered(120.0, 120.0), 0.8);
    let depth: Vec<f32> = (0..1024).map(|i| (i % 97) as f32 / 97.0).collect();

    let run = |p: &mut SwardPipeline| -> Vec<Vec<BladeInstance>> {
        let output = p.run_frame(&FrameInput {
            camera: field_camera(),
            depth: Some(DepthSource::new(&depth, 32, 32)),
            mask: Some(&mask),
        });
        output.tiers.iter().map(|t| t.records.to_vec()).collect()
    };

    let first = run(&mut pipeline);
    let second = run(&mut pipeline);
    assert_eq!(first, second);
}

// ---------------------------------------------------------------------------
// Degraded modes fail open: no depth source and no mask must both behave
// as always-pass, never as rejection.
// ---------------------------------------------------------------------------
#[test]
fn degraded_modes_fail_open() {
    let mut config = no_thinning_config();
    config.occlusion = true;
    let mut pipeline = overhead_pipeline(config);

    let output = pipeline.run_frame(&FrameInput {
        camera: field_camera(),
        depth: None,
        mask: None,
    });

    assert!(!output.stats.occlusion_active);
    assert_eq!(output.stats.rejected_occlusion, 0);
    assert_eq!(output.stats.rejected_mask, 0);
    assert!(output.total_survivors() > 0);
}

// ---------------------------------------------------------------------------
// Scenario from the reversed-Z contract: a 2x2 base of [0.9, 0.2; 0.95,
// 0.1] reduces to 0.1, and a blade nearer than that still draws.
// ---------------------------------------------------------------------------
#[test]
fn reversed_z_pyramid_is_conservative() {
    let texels = [0.9, 0.2, 0.95, 0.1];
    let pyramid = DepthPyramid::build(
        DepthSource::new(&texels, 2, 2),
        2,
        DepthConvention::Reversed,
    );
    assert_eq!(pyramid.read(0, 0, 1), 0.1);

    // The apex must linearize at least as deep as every base texel - that
    // is what makes sampling it sound for occlusion.
    let camera = CameraState {
        convention: DepthConvention::Reversed,
        ..test_camera()
    };
    let conv = DepthConvention::Reversed;
    let apex_eye = conv.to_linear_eye(pyramid.read(0, 0, 1), camera.near, camera.far);
    for &texel in &texels {
        let texel_eye = conv.to_linear_eye(texel, camera.near, camera.far);
        assert!(
            apex_eye >= texel_eye - 1e-4,
            "apex {apex_eye} nearer than base texel {texel_eye}"
        );
    }
}
