//! Jittered-grid blade placement.
//!
//! The generator lays one blade per grid cell across a square planar
//! extent. Each cell owns an independent ChaCha8 stream seeded from the
//! field seed and the cell index, so the index-to-blade mapping is stable:
//! regenerating with the same parameters reproduces the population bit for
//! bit, and pruning one cell cannot perturb its neighbours.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use sward_shared::{BladeInstance, FieldSeed, MaskData, Vec2, Vec3};

use crate::heightfield::HeightField;
use crate::noise::SimplexNoise;

/// Seed stream for the clump-density noise.
const CLUMP_STREAM: u64 = 0x01;
/// Seed stream for the planar offset noise (X channel).
const OFFSET_X_STREAM: u64 = 0x02;
/// Seed stream for the planar offset noise (Z channel).
const OFFSET_Z_STREAM: u64 = 0x03;
/// Seed stream root for per-cell attribute draws.
const CELL_STREAM: u64 = 0x10;

/// Tunables for population generation.
///
/// Changing any field and regenerating produces a wholly new population;
/// nothing is patched in place.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GrowthParams {
    /// Requested blade count. Rounded **up** to the next perfect square so
    /// the population tiles a square grid; this is documented policy, not
    /// an error.
    pub blade_count: u32,
    /// Side length of the square planar extent, in world units.
    pub extent: f32,
    /// Blade height range `[min, max]` in world units.
    pub height_range: [f32; 2],
    /// World-space feature size of the clumping noise.
    pub clump_scale: f32,
    /// How strongly clumping modulates height and position, in [0, 1].
    pub clump_strength: f32,
    /// Stiffness band `[min, max]`; kept narrow so wind response stays
    /// coherent across the field.
    pub stiffness_range: [f32; 2],
    /// Mask value below which a cell produces no blade when pre-pruning is
    /// requested at generation time.
    pub mask_threshold: f32,
    /// Field seed. Same seed, same field, always.
    pub seed: u64,
}

impl GrowthParams {
    /// A mid-density meadow; the starting point for most tuning.
    #[must_use]
    pub const fn meadow() -> Self {
        Self {
            blade_count: 250_000,
            extent: 200.0,
            height_range: [0.6, 1.4],
            clump_scale: 18.0,
            clump_strength: 0.55,
            stiffness_range: [0.65, 0.85],
            mask_threshold: 0.5,
            seed: 0x5EED,
        }
    }

    /// Sparse scrubland preset.
    #[must_use]
    pub fn sparse() -> Self {
        Self {
            blade_count: 60_000,
            clump_strength: 0.8,
            ..Self::meadow()
        }
    }

    /// Overrides the blade count.
    #[must_use]
    pub const fn with_count(mut self, count: u32) -> Self {
        self.blade_count = count;
        self
    }

    /// Overrides the planar extent.
    #[must_use]
    pub const fn with_extent(mut self, extent: f32) -> Self {
        self.extent = extent;
        self
    }

    /// Overrides the seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Grid side length after perfect-square rounding.
    #[must_use]
    pub fn grid_side(&self) -> u32 {
        (f64::from(self.blade_count).sqrt().ceil() as u32).max(1)
    }

    /// Population capacity after perfect-square rounding.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        let side = self.grid_side();
        side * side
    }
}

impl Default for GrowthParams {
    fn default() -> Self {
        Self::meadow()
    }
}

/// One-shot population builder.
pub struct FieldGenerator {
    params: GrowthParams,
    clump: SimplexNoise,
    offset_x: SimplexNoise,
    offset_z: SimplexNoise,
}

impl FieldGenerator {
    /// Creates a generator for the given parameters.
    #[must_use]
    pub fn new(params: GrowthParams) -> Self {
        let seed = FieldSeed::new(params.seed);
        Self {
            params,
            clump: SimplexNoise::new(seed.derive(CLUMP_STREAM)),
            offset_x: SimplexNoise::new(seed.derive(OFFSET_X_STREAM)),
            offset_z: SimplexNoise::new(seed.derive(OFFSET_Z_STREAM)),
        }
    }

    /// The parameters this generator was built with.
    #[must_use]
    pub const fn params(&self) -> &GrowthParams {
        &self.params
    }

    /// Generates the full population.
    ///
    /// `mask` enables generation-time pre-pruning: cells whose committed
    /// mask value is below `mask_threshold` produce no blade. Surviving
    /// blades are identical with or without pruning, because every
    /// attribute draw happens on the cell's own stream before the pruning
    /// decision. The per-frame mask test in the culling kernel is
    /// independent of this and always re-samples.
    #[must_use]
    pub fn generate(
        &self,
        height_field: &dyn HeightField,
        mask: Option<&MaskData>,
    ) -> Vec<BladeInstance> {
        let params = &self.params;
        let side = params.grid_side();
        let capacity = params.capacity();
        if capacity != params.blade_count {
            tracing::debug!(
                requested = params.blade_count,
                capacity,
                "rounded population up to the next perfect square"
            );
        }

        let cell = params.extent / side as f32;
        let half = params.extent * 0.5;
        let cell_seed = FieldSeed::new(params.seed).derive(CELL_STREAM);
        let clump_freq = f64::from(1.0 / params.clump_scale.max(1e-3));

        let mut blades = Vec::with_capacity(capacity as usize);
        let mut pruned = 0u32;

        for cz in 0..side {
            for cx in 0..side {
                let index = cz * side + cx;
                let mut rng = ChaCha8Rng::seed_from_u64(
                    cell_seed.derive(u64::from(index)).value(),
                );

                // All draws happen in fixed order before any pruning
                // decision so the mapping stays reproducible.
                let jx: f32 = rng.gen();
                let jz: f32 = rng.gen();
                let r_height: f32 = rng.gen();
                let r_facing: f32 = rng.gen();
                let r_phase: f32 = rng.gen();
                let r_stiffness: f32 = rng.gen();

                // Jitter inside the cell, then push the blade along the
                // clump field for organic grouping.
                let grid_x = (cx as f32 + 0.15 + 0.7 * jx) * cell - half;
                let grid_z = (cz as f32 + 0.15 + 0.7 * jz) * cell - half;
                let nx = f64::from(grid_x) * clump_freq;
                let nz = f64::from(grid_z) * clump_freq;
                let x = grid_x
                    + self.offset_x.sample(nx, nz) as f32 * cell * params.clump_strength;
                let z = grid_z
                    + self.offset_z.sample(nx, nz) as f32 * cell * params.clump_strength;

                if let Some(mask) = mask {
                    if mask.sample_world(x, z) < params.mask_threshold {
                        pruned += 1;
                        continue;
                    }
                }

                let clump = self.clump.sample_unit(nx, nz) as f32;
                let [h_min, h_max] = params.height_range;
                let height = (h_min + (h_max - h_min) * r_height)
                    * (1.0 - params.clump_strength * (1.0 - clump));

                let angle = r_facing * std::f32::consts::TAU;
                let facing = Vec2::new(angle.cos(), angle.sin());

                let [s_min, s_max] = params.stiffness_range;
                let stiffness = s_min + (s_max - s_min) * r_stiffness;

                let y = height_field.sample(x, z);
                blades.push(BladeInstance::new(
                    Vec3::new(x, y, z),
                    height,
                    facing,
                    r_phase * std::f32::consts::TAU,
                    stiffness,
                ));
            }
        }

        tracing::info!(
            blades = blades.len(),
            pruned,
            grid_side = side,
            "generated blade population"
        );
        blades
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heightfield::FlatHeightField;
    use sward_shared::{MaskExtent, InclusionMask};

    fn small_params() -> GrowthParams {
        GrowthParams::meadow().with_count(900).with_extent(30.0)
    }

    #[test]
    fn test_perfect_square_rounding() {
        let params = GrowthParams::meadow().with_count(1000);
        assert_eq!(params.grid_side(), 32);
        assert_eq!(params.capacity(), 1024);

        // Exact squares pass through untouched.
        let params = params.with_count(1024);
        assert_eq!(params.capacity(), 1024);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let gen = FieldGenerator::new(small_params());
        let a = gen.generate(&FlatHeightField(0.0), None);
        let b = gen.generate(&FlatHeightField(0.0), None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_different_field() {
        let a = FieldGenerator::new(small_params()).generate(&FlatHeightField(0.0), None);
        let b = FieldGenerator::new(small_params().with_seed(99))
            .generate(&FlatHeightField(0.0), None);
        assert_ne!(a, b);
    }

    #[test]
    fn test_attributes_within_bounds() {
        let params = small_params();
        let blades = FieldGenerator::new(params).generate(&FlatHeightField(2.0), None);
        assert_eq!(blades.len(), params.capacity() as usize);

        let half = params.extent * 0.5 + params.extent / params.grid_side() as f32;
        for blade in &blades {
            assert!(blade.position[0].abs() <= half);
            assert!(blade.position[2].abs() <= half);
            assert_eq!(blade.position[1], 2.0);
            assert!(blade.height > 0.0 && blade.height <= params.height_range[1]);
            assert!(blade.stiffness >= params.stiffness_range[0]);
            assert!(blade.stiffness <= params.stiffness_range[1]);
            assert_eq!(blade.width_scale, 1.0);
            let f = Vec2::new(blade.facing[0], blade.facing[1]);
            assert!((f.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_mask_pruning_preserves_survivors() {
        let params = small_params();
        let full = FieldGenerator::new(params).generate(&FlatHeightField(0.0), None);

        // Mask out the +X half of the field.
        let mask = InclusionMask::filled(
            64,
            64,
            MaskExtent::centered(params.extent, params.extent),
            1.0,
        );
        mask.paint(|m| {
            for y in 0..64 {
                for x in 32..64 {
                    m.set_texel(x, y, 0.0);
                }
            }
        });
        mask.commit();
        let snapshot = mask.snapshot();

        let pruned = FieldGenerator::new(params).generate(&FlatHeightField(0.0), Some(&snapshot));
        assert!(pruned.len() < full.len());
        assert!(!pruned.is_empty());

        // Every surviving blade must exist, identically, in the full field.
        for blade in &pruned {
            assert!(full.contains(blade));
        }
    }
}
