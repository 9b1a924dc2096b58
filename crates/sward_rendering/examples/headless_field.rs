//! # Headless Field Demo
//!
//! Runs the software pipeline end to end without a GPU: generate a
//! population, paint a mask, fake a depth buffer with a near wall, and
//! watch the survivor counts move as the stages kick in.

use sward_procedural::{FlatHeightField, GrowthParams};
use sward_rendering::{
    BladeField, CameraState, CullingConfig, DepthSource, FrameInput, SwardPipeline,
};
use sward_shared::math::{look_at, mat4_mul, perspective};
use sward_shared::{DepthConvention, InclusionMask, MaskExtent, Vec3};

fn main() {
    let params = GrowthParams::meadow().with_count(100_000).with_extent(150.0);
    let field = BladeField::generate(params, &FlatHeightField(0.0), None);
    println!(
        "population: {} blades on a {side}x{side} grid",
        params.capacity(),
        side = params.grid_side()
    );
    let mut pipeline = SwardPipeline::new(CullingConfig::balanced(), field, [6, 6, 6]);

    let eye = Vec3::new(0.0, 20.0, 70.0);
    let camera = CameraState {
        view_proj: mat4_mul(
            &perspective(1.2, 16.0 / 9.0, 0.1, 300.0),
            &look_at(eye, Vec3::ZERO, Vec3::Y),
        ),
        position: eye,
        near: 0.1,
        far: 300.0,
        fov_y: 1.2,
        convention: DepthConvention::Standard,
    };

    // Frame 1: open field, no depth source, no mask.
    let output = pipeline.run_frame(&FrameInput {
        camera,
        depth: None,
        mask: None,
    });
    report("open field", &output.stats);

    // Frame 2: an artist masks out a corridor through the field.
    let mask = InclusionMask::filled(128, 128, MaskExtent::centered(150.0, 150.0), 1.0);
    mask.paint(|m| {
        for y in 0..128 {
            for x in 56..72 {
                m.set_texel(x, y, 0.0);
            }
        }
    });
    mask.commit();
    let output = pipeline.run_frame(&FrameInput {
        camera,
        depth: None,
        mask: Some(&mask),
    });
    report("masked corridor", &output.stats);

    // Frame 3: a building fills the left half of the screen at ~19m.
    let mut depth = vec![1.0f32; 256 * 256];
    for row in 0..256 {
        for col in 0..128 {
            depth[row * 256 + col] = 0.995;
        }
    }
    let output = pipeline.run_frame(&FrameInput {
        camera,
        depth: Some(DepthSource::new(&depth, 256, 256)),
        mask: Some(&mask),
    });
    report("occluder on the left", &output.stats);

    for (tier, out) in output.tiers.iter().enumerate() {
        println!(
            "  tier {tier}: {} instances, args = {:?}",
            out.records.len(),
            out.args
        );
    }
}

fn report(label: &str, stats: &sward_rendering::CullStats) {
    println!(
        "{label}: kept {} / {} (mask -{}, frustum -{}, distance -{}, occlusion -{})",
        stats.total_kept(),
        stats.tested,
        stats.rejected_mask,
        stats.rejected_frustum,
        stats.rejected_distance,
        stats.rejected_occlusion,
    );
}
