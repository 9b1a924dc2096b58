//! The source blade population.
//!
//! Owned by the core for its lifetime, rebuilt wholesale on explicit
//! regeneration, never partially updated. The `epoch` counter is the
//! scoped-resource handle: GPU buffers are keyed by it, so a regeneration
//! allocates fresh buffers and the old ones are released once no in-flight
//! work references them.

use sward_procedural::{FieldGenerator, GrowthParams, HeightField};
use sward_shared::{BladeInstance, MaskData};

/// The fixed source population of blade records.
pub struct BladeField {
    params: GrowthParams,
    blades: Box<[BladeInstance]>,
    epoch: u64,
}

impl BladeField {
    /// Generates a new population from the given parameters.
    #[must_use]
    pub fn generate(
        params: GrowthParams,
        height_field: &dyn HeightField,
        mask: Option<&MaskData>,
    ) -> Self {
        let blades = FieldGenerator::new(params)
            .generate(height_field, mask)
            .into_boxed_slice();
        Self {
            params,
            blades,
            epoch: 0,
        }
    }

    /// Wraps an externally authored population.
    ///
    /// For hosts that place blades themselves (and for scenario tests);
    /// `params` is retained for the change-detection contract.
    #[must_use]
    pub fn from_records(params: GrowthParams, blades: Vec<BladeInstance>) -> Self {
        Self {
            params,
            blades: blades.into_boxed_slice(),
            epoch: 0,
        }
    }

    /// Rebuilds the population if `params` differs from the current ones.
    ///
    /// Returns true if a rebuild happened. A rebuild replaces the whole
    /// array and bumps the epoch; it never patches records in place.
    pub fn rebuild_if_changed(
        &mut self,
        params: GrowthParams,
        height_field: &dyn HeightField,
        mask: Option<&MaskData>,
    ) -> bool {
        if params == self.params {
            return false;
        }
        tracing::info!(epoch = self.epoch + 1, "regenerating blade population");
        self.blades = FieldGenerator::new(params)
            .generate(height_field, mask)
            .into_boxed_slice();
        self.params = params;
        self.epoch += 1;
        true
    }

    /// The parameters the current population was generated from.
    #[must_use]
    pub const fn params(&self) -> &GrowthParams {
        &self.params
    }

    /// The blade records.
    #[must_use]
    pub fn blades(&self) -> &[BladeInstance] {
        &self.blades
    }

    /// Number of blades in the population.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blades.len()
    }

    /// True if the population is empty (fully mask-pruned, or zero count).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blades.is_empty()
    }

    /// Generation counter; bumped on every rebuild.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The population as raw bytes for GPU upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.blades)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sward_procedural::FlatHeightField;

    fn params() -> GrowthParams {
        GrowthParams::meadow().with_count(400).with_extent(20.0)
    }

    #[test]
    fn test_rebuild_only_on_change() {
        let ground = FlatHeightField(0.0);
        let mut field = BladeField::generate(params(), &ground, None);
        assert_eq!(field.epoch(), 0);

        assert!(!field.rebuild_if_changed(params(), &ground, None));
        assert_eq!(field.epoch(), 0);

        assert!(field.rebuild_if_changed(params().with_seed(7), &ground, None));
        assert_eq!(field.epoch(), 1);
    }

    #[test]
    fn test_upload_bytes_match_record_size() {
        let field = BladeField::generate(params(), &FlatHeightField(0.0), None);
        assert_eq!(field.as_bytes().len(), field.len() * BladeInstance::SIZE);
    }
}
