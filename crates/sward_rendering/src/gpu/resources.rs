//! GPU buffer and texture lifecycle.

use wgpu::util::DeviceExt;

use sward_shared::{BladeInstance, MaskData, MAX_LOD_TIERS};

use crate::config::CullingConfig;
use crate::culling::CullingUniforms;
use crate::field::BladeField;
use crate::indirect::DrawIndexedIndirectArgs;

/// Every GPU resource the pipeline owns.
///
/// Pre-allocated at creation where sizes are known from the config; the
/// blade buffer follows the population and is re-created on epoch change.
pub(crate) struct GpuResources {
    /// Population epoch currently uploaded, if any.
    pub uploaded_epoch: Option<u64>,
    /// Number of blades in the uploaded buffer.
    pub blade_count: u32,
    /// Source population storage buffer.
    pub blades: Option<wgpu::Buffer>,
    /// Per-tier survivor buffers.
    pub buckets: [wgpu::Buffer; MAX_LOD_TIERS],
    /// Per-tier atomic insertion counters.
    pub counters: wgpu::Buffer,
    /// Indirect draw-argument records, one per tier.
    pub args: wgpu::Buffer,
    /// The culling kernel's uniform block.
    pub uniforms: wgpu::Buffer,
    /// Pyramid pass params (reversed-Z flag).
    pub pyramid_params: wgpu::Buffer,
    /// Argument pass limits (tier count, bucket capacity).
    pub args_limits: wgpu::Buffer,
    /// The depth pyramid mip chain.
    pub pyramid: wgpu::Texture,
    /// Full-chain view for the culling kernel's mip-selected reads.
    pub pyramid_full_view: wgpu::TextureView,
    /// One single-mip view per level for the reduction passes.
    pub pyramid_mip_views: Vec<wgpu::TextureView>,
    /// The inclusion mask texture (1x1 fallback until one is uploaded).
    pub mask: wgpu::Texture,
    /// View of the mask texture.
    pub mask_view: wgpu::TextureView,
}

impl GpuResources {
    /// Allocates every fixed-size resource.
    pub fn new(device: &wgpu::Device, config: &CullingConfig) -> Self {
        let bucket_bytes =
            u64::from(config.bucket_capacity) * BladeInstance::SIZE as u64;
        let buckets = std::array::from_fn(|tier| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("sward bucket {tier}")),
                size: bucket_bytes,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::VERTEX,
                mapped_at_creation: false,
            })
        });

        let counters = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sward tier counters"),
            size: (MAX_LOD_TIERS * std::mem::size_of::<u32>()) as u64,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let args = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sward draw args"),
            size: (MAX_LOD_TIERS * DrawIndexedIndirectArgs::SIZE) as u64,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::INDIRECT
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sward culling uniforms"),
            size: CullingUniforms::SIZE as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let pyramid_params = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sward pyramid params"),
            size: 16,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let args_limits = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sward args limits"),
            contents: bytemuck::cast_slice(&[
                config.tier_count,
                config.bucket_capacity,
                0u32,
                0u32,
            ]),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let mip_count = config.pyramid_size.ilog2() + 1;
        let pyramid = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("sward depth pyramid"),
            size: wgpu::Extent3d {
                width: config.pyramid_size,
                height: config.pyramid_size,
                depth_or_array_layers: 1,
            },
            mip_level_count: mip_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::STORAGE_BINDING,
            view_formats: &[],
        });
        let pyramid_full_view = pyramid.create_view(&wgpu::TextureViewDescriptor::default());
        let pyramid_mip_views = (0..mip_count)
            .map(|level| {
                pyramid.create_view(&wgpu::TextureViewDescriptor {
                    label: Some(&format!("sward pyramid mip {level}")),
                    base_mip_level: level,
                    mip_level_count: Some(1),
                    ..wgpu::TextureViewDescriptor::default()
                })
            })
            .collect();

        let (mask, mask_view) = Self::create_mask_texture(device, 1, 1);

        Self {
            uploaded_epoch: None,
            blade_count: 0,
            blades: None,
            buckets,
            counters,
            args,
            uniforms,
            pyramid_params,
            args_limits,
            pyramid,
            pyramid_full_view,
            pyramid_mip_views,
            mask,
            mask_view,
        }
    }

    /// Uploads the population, re-creating the buffer on epoch change.
    ///
    /// Returns true if the buffer was (re)created, in which case bind
    /// groups referencing it must be rebuilt.
    pub fn upload_field(&mut self, device: &wgpu::Device, field: &BladeField) -> bool {
        if self.uploaded_epoch == Some(field.epoch()) {
            return false;
        }

        tracing::debug!(
            epoch = field.epoch(),
            blades = field.len(),
            "uploading blade population"
        );
        // The previous buffer (if any) stays alive inside wgpu until all
        // in-flight submissions referencing it complete.
        self.blades = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sward blade population"),
            contents: field.as_bytes(),
            usage: wgpu::BufferUsages::STORAGE,
        }));
        self.blade_count = field.len() as u32;
        self.uploaded_epoch = Some(field.epoch());
        true
    }

    /// Uploads a committed mask snapshot, re-creating the texture if the
    /// mask dimensions changed.
    ///
    /// Returns true if the texture was re-created.
    pub fn upload_mask(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        mask: &MaskData,
    ) -> bool {
        let recreated = self.mask.width() != mask.width() || self.mask.height() != mask.height();
        if recreated {
            let (texture, view) = Self::create_mask_texture(device, mask.width(), mask.height());
            self.mask = texture;
            self.mask_view = view;
        }

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.mask,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(mask.texels()),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(mask.width() * 4),
                rows_per_image: Some(mask.height()),
            },
            wgpu::Extent3d {
                width: mask.width(),
                height: mask.height(),
                depth_or_array_layers: 1,
            },
        );
        recreated
    }

    fn create_mask_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("sward inclusion mask"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }
}
