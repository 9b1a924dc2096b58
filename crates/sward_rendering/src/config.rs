//! Culling tunables.
//!
//! Everything the kernel compares against lives here: tier thresholds, the
//! thinning curve, the mask threshold, the occlusion bias. Loaded once at
//! startup (optionally from TOML); changing a value takes effect next frame
//! with no reallocation, except `bucket_capacity` which sizes buffers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use sward_shared::MAX_LOD_TIERS;

/// Errors from configuration parsing and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The TOML source failed to parse.
    #[error("invalid culling config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field combination violates an invariant the kernel relies on.
    #[error("invalid culling config: {reason}")]
    Invalid {
        /// What was wrong.
        reason: String,
    },
}

/// Tunables for the culling and classification kernel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CullingConfig {
    /// Number of LOD tiers in use (2 or 3).
    pub tier_count: u32,
    /// Upper-bound camera distance per tier, ascending. The last active
    /// entry is the maximum draw distance; blades beyond it are rejected.
    pub tier_distances: [f32; MAX_LOD_TIERS],
    /// Mask value below which a blade is rejected.
    pub mask_threshold: f32,
    /// Distance at which thinning starts. Closer blades always survive
    /// thinning.
    pub falloff_start: f32,
    /// Survival probability at the maximum draw distance, in (0, 1].
    pub min_density: f32,
    /// How much surviving blades widen to compensate for thinning, in
    /// [0, 1]. 0 disables widening; 1 fully preserves expected coverage.
    pub thinning_compensation: f32,
    /// Whether the occlusion test runs at all. Even when true, a frame
    /// without a valid pyramid silently degrades to always-pass.
    pub occlusion: bool,
    /// Occlusion bias in linear eye-space units. Exists purely to stop
    /// self-occlusion flicker on near-grazing ground; tune as small as the
    /// flicker allows.
    pub occlusion_bias: f32,
    /// Side length of the square depth pyramid base level. Power of two.
    pub pyramid_size: u32,
    /// Per-tier bucket capacity. Appends past this are counted then
    /// dropped, and the argument updater clamps.
    pub bucket_capacity: u32,
}

impl CullingConfig {
    /// Balanced defaults: three tiers out to 120 world units.
    #[must_use]
    pub const fn balanced() -> Self {
        Self {
            tier_count: 3,
            tier_distances: [25.0, 60.0, 120.0],
            mask_threshold: 0.5,
            falloff_start: 40.0,
            min_density: 0.2,
            thinning_compensation: 0.75,
            occlusion: true,
            occlusion_bias: 0.05,
            pyramid_size: 512,
            bucket_capacity: 262_144,
        }
    }

    /// Performance preset: two tiers, shorter range, smaller pyramid.
    #[must_use]
    pub fn performance() -> Self {
        Self {
            tier_count: 2,
            tier_distances: [20.0, 70.0, 70.0],
            min_density: 0.1,
            pyramid_size: 256,
            bucket_capacity: 131_072,
            ..Self::balanced()
        }
    }

    /// High-quality preset: full range, dense far field, larger pyramid.
    #[must_use]
    pub fn high_quality() -> Self {
        Self {
            tier_distances: [35.0, 90.0, 180.0],
            falloff_start: 70.0,
            min_density: 0.35,
            pyramid_size: 1024,
            bucket_capacity: 524_288,
            ..Self::balanced()
        }
    }

    /// Parses a config from TOML and validates it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the source fails to parse or violates a
    /// kernel invariant.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every invariant the kernel relies on.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| Err(ConfigError::Invalid { reason });

        if self.tier_count < 1 || self.tier_count as usize > MAX_LOD_TIERS {
            return invalid(format!(
                "tier_count {} outside 1..={MAX_LOD_TIERS}",
                self.tier_count
            ));
        }
        let active = &self.tier_distances[..self.tier_count as usize];
        if active.windows(2).any(|w| w[1] < w[0]) {
            return invalid(format!("tier_distances {active:?} must be ascending"));
        }
        if active[0] <= 0.0 {
            return invalid("first tier distance must be positive".into());
        }
        if !(0.0..=1.0).contains(&self.mask_threshold) {
            return invalid(format!("mask_threshold {} outside [0, 1]", self.mask_threshold));
        }
        if self.min_density <= 0.0 || self.min_density > 1.0 {
            return invalid(format!("min_density {} outside (0, 1]", self.min_density));
        }
        if !(0.0..=1.0).contains(&self.thinning_compensation) {
            return invalid(format!(
                "thinning_compensation {} outside [0, 1]",
                self.thinning_compensation
            ));
        }
        if self.falloff_start > self.max_draw_distance() {
            return invalid(format!(
                "falloff_start {} beyond max draw distance {}",
                self.falloff_start,
                self.max_draw_distance()
            ));
        }
        if !self.pyramid_size.is_power_of_two() {
            return invalid(format!("pyramid_size {} is not a power of two", self.pyramid_size));
        }
        if self.bucket_capacity == 0 {
            return invalid("bucket_capacity must be non-zero".into());
        }
        Ok(())
    }

    /// The maximum draw distance (last active tier threshold).
    #[inline]
    #[must_use]
    pub fn max_draw_distance(&self) -> f32 {
        self.tier_distances[self.tier_count as usize - 1]
    }
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self::balanced()
    }
}
