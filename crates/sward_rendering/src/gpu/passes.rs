//! Compute pipelines and per-frame command encoding.

use sward_shared::{MaskData, MaskExtent, CULL_WORKGROUP_SIZE, MAX_LOD_TIERS, PYRAMID_WORKGROUP_SIZE};

use crate::camera::CameraState;
use crate::config::CullingConfig;
use crate::culling::CullingUniforms;
use crate::field::BladeField;
use crate::gpu::resources::GpuResources;

/// Per-frame inputs to the GPU pipeline.
pub struct GpuFrame<'a> {
    /// This frame's camera.
    pub camera: CameraState,
    /// A view of the external single-level depth texture, if one is
    /// available. `None` marks occlusion unavailable for this frame; the
    /// pyramid passes are skipped and the kernel's occlusion flag stays
    /// clear.
    pub depth_view: Option<&'a wgpu::TextureView>,
}

/// The GPU frame orchestrator.
///
/// Owns every pipeline and resource; per frame the host writes one uniform
/// block, resets three counters and encodes the fixed pass order
/// pyramid -> cull -> args. Draws then consume the bucket buffers with the
/// argument records via `draw_indexed_indirect` - the instance counts
/// never travel back through the host.
pub struct GpuSwardPipeline {
    config: CullingConfig,
    resources: GpuResources,
    mask_extent: Option<MaskExtent>,
    depth_warned: bool,

    resize_pipeline: wgpu::ComputePipeline,
    reduce_pipeline: wgpu::ComputePipeline,
    cull_pipeline: wgpu::ComputePipeline,
    args_pipeline: wgpu::ComputePipeline,

    pyramid_layout: wgpu::BindGroupLayout,
    cull_layout: wgpu::BindGroupLayout,

    /// Reduction bind groups, one per destination level (1..mip_count).
    reduce_bind_groups: Vec<wgpu::BindGroup>,
    /// Rebuilt whenever the blade buffer or mask texture changes identity.
    cull_bind_group: Option<wgpu::BindGroup>,
    args_bind_group: wgpu::BindGroup,
}

impl GpuSwardPipeline {
    /// WGSL source of the depth pyramid passes.
    #[must_use]
    pub fn pyramid_shader() -> &'static str {
        include_str!("../../shaders/depth_pyramid.wgsl")
    }

    /// WGSL source of the culling kernel.
    #[must_use]
    pub fn cull_shader() -> &'static str {
        include_str!("../../shaders/blade_cull.wgsl")
    }

    /// WGSL source of the argument-update pass.
    #[must_use]
    pub fn args_shader() -> &'static str {
        include_str!("../../shaders/draw_args.wgsl")
    }

    /// Creates the pipelines and allocates fixed resources.
    ///
    /// # Panics
    ///
    /// Panics if the config fails validation.
    #[must_use]
    pub fn new(device: &wgpu::Device, config: CullingConfig) -> Self {
        if let Err(err) = config.validate() {
            panic!("invalid culling config: {err}");
        }
        let resources = GpuResources::new(device, &config);

        // --- Pyramid passes -------------------------------------------------
        let pyramid_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sward depth pyramid"),
            source: wgpu::ShaderSource::Wgsl(Self::pyramid_shader().into()),
        });
        let pyramid_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sward pyramid layout"),
            entries: &[
                uniform_entry(0),
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: wgpu::TextureFormat::R32Float,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
            ],
        });
        let pyramid_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("sward pyramid pipeline layout"),
                bind_group_layouts: &[&pyramid_layout],
                push_constant_ranges: &[],
            });
        let resize_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("sward pyramid resize"),
            layout: Some(&pyramid_pipeline_layout),
            module: &pyramid_module,
            entry_point: "resize_main",
        });
        let reduce_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("sward pyramid reduce"),
            layout: Some(&pyramid_pipeline_layout),
            module: &pyramid_module,
            entry_point: "reduce_main",
        });

        // Level k reads mip k-1 and writes mip k; views never change, so
        // these bind groups live for the pipeline's lifetime.
        let reduce_bind_groups = (1..resources.pyramid_mip_views.len())
            .map(|level| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("sward pyramid reduce {level}")),
                    layout: &pyramid_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: resources.pyramid_params.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(
                                &resources.pyramid_mip_views[level - 1],
                            ),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::TextureView(
                                &resources.pyramid_mip_views[level],
                            ),
                        },
                    ],
                })
            })
            .collect();

        // --- Culling kernel -------------------------------------------------
        let cull_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sward blade cull"),
            source: wgpu::ShaderSource::Wgsl(Self::cull_shader().into()),
        });
        let cull_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sward cull layout"),
            entries: &[
                uniform_entry(0),
                storage_entry(1, true),
                storage_entry(2, false),
                storage_entry(3, false),
                storage_entry(4, false),
                storage_entry(5, false),
                texture_entry(6),
                texture_entry(7),
            ],
        });
        let cull_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("sward cull pipeline layout"),
                bind_group_layouts: &[&cull_layout],
                push_constant_ranges: &[],
            });
        let cull_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("sward blade cull"),
            layout: Some(&cull_pipeline_layout),
            module: &cull_module,
            entry_point: "cull_main",
        });

        // --- Argument update ------------------------------------------------
        let args_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sward draw args"),
            source: wgpu::ShaderSource::Wgsl(Self::args_shader().into()),
        });
        let args_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sward args layout"),
            entries: &[uniform_entry(0), storage_entry(1, false), storage_entry(2, false)],
        });
        let args_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("sward args pipeline layout"),
                bind_group_layouts: &[&args_layout],
                push_constant_ranges: &[],
            });
        let args_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("sward draw args"),
            layout: Some(&args_pipeline_layout),
            module: &args_module,
            entry_point: "args_main",
        });
        let args_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sward args bind group"),
            layout: &args_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: resources.args_limits.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: resources.counters.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: resources.args.as_entire_binding(),
                },
            ],
        });

        Self {
            config,
            resources,
            mask_extent: None,
            depth_warned: false,
            resize_pipeline,
            reduce_pipeline,
            cull_pipeline,
            args_pipeline,
            pyramid_layout,
            cull_layout,
            reduce_bind_groups,
            cull_bind_group: None,
            args_bind_group,
        }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &CullingConfig {
        &self.config
    }

    /// The per-tier survivor buffer, for the external renderer to bind as
    /// its instance source.
    #[must_use]
    pub fn bucket_buffer(&self, tier: usize) -> &wgpu::Buffer {
        &self.resources.buckets[tier]
    }

    /// The indirect argument buffer; record for `tier` starts at
    /// `tier * DrawIndexedIndirectArgs::SIZE`.
    #[must_use]
    pub fn args_buffer(&self) -> &wgpu::Buffer {
        &self.resources.args
    }

    /// The tier-counter buffer (debug read-back source).
    #[must_use]
    pub(crate) fn counters_buffer(&self) -> &wgpu::Buffer {
        &self.resources.counters
    }

    /// The depth pyramid texture, for host-side debug visualization.
    #[must_use]
    pub fn pyramid_texture(&self) -> &wgpu::Texture {
        &self.resources.pyramid
    }

    /// Uploads the population if its epoch changed since the last upload.
    pub fn upload_field(&mut self, device: &wgpu::Device, field: &BladeField) {
        if self.resources.upload_field(device, field) {
            self.cull_bind_group = None;
        }
    }

    /// Uploads a committed mask snapshot.
    ///
    /// Call once per frame (or whenever the mask commits); the kernel
    /// samples whatever snapshot was uploaded last, giving the same
    /// no-tearing guarantee as the software path.
    pub fn upload_mask(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, mask: &MaskData) {
        if self.resources.upload_mask(device, queue, mask) {
            self.cull_bind_group = None;
        }
        self.mask_extent = Some(mask.extent());
    }

    /// Encodes one frame: uniform write, counter reset, then the fixed
    /// pass order pyramid -> cull -> args.
    ///
    /// # Panics
    ///
    /// Panics if no population was uploaded; dispatching over nothing is a
    /// programming error.
    pub fn encode_frame(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        frame: &GpuFrame<'_>,
    ) {
        let Some(blades) = self.resources.blades.as_ref() else {
            panic!("upload_field must run before encode_frame");
        };

        let occlusion_live = self.config.occlusion && frame.depth_view.is_some();
        if self.config.occlusion && frame.depth_view.is_none() {
            if !self.depth_warned {
                tracing::warn!(
                    "occlusion requested but no depth view; occlusion disabled until one is available"
                );
                self.depth_warned = true;
            }
        } else {
            self.depth_warned = false;
        }

        // Uniform writes are ordered before subsequently submitted work.
        let mip_count = self.resources.pyramid_mip_views.len() as u32;
        let uniforms = CullingUniforms::assemble_raw(
            &self.config,
            &frame.camera,
            self.resources.blade_count,
            occlusion_live.then_some((self.config.pyramid_size, mip_count)),
            self.mask_extent,
        );
        queue.write_buffer(&self.resources.uniforms, 0, bytemuck::bytes_of(&uniforms));
        queue.write_buffer(
            &self.resources.pyramid_params,
            0,
            bytemuck::cast_slice(&[frame.camera.convention.as_flag(), 0u32, 0u32, 0u32]),
        );
        // Step 3: zero every bucket counter.
        queue.write_buffer(
            &self.resources.counters,
            0,
            bytemuck::cast_slice(&[0u32; MAX_LOD_TIERS]),
        );

        // Step 2: the pyramid, strictly sequential across levels.
        if occlusion_live {
            if let Some(depth_view) = frame.depth_view {
                self.encode_pyramid(device, encoder, depth_view);
            }
        }

        // Step 4: the kernel over the full population.
        let cull_bind_group = self.cull_bind_group.get_or_insert_with(|| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("sward cull bind group"),
                layout: &self.cull_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self.resources.uniforms.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: blades.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: self.resources.buckets[0].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: self.resources.buckets[1].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: self.resources.buckets[2].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 5,
                        resource: self.resources.counters.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 6,
                        resource: wgpu::BindingResource::TextureView(
                            &self.resources.pyramid_full_view,
                        ),
                    },
                    wgpu::BindGroupEntry {
                        binding: 7,
                        resource: wgpu::BindingResource::TextureView(&self.resources.mask_view),
                    },
                ],
            })
        });

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("sward cull"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.cull_pipeline);
            pass.set_bind_group(0, cull_bind_group, &[]);
            pass.dispatch_workgroups(
                self.resources.blade_count.div_ceil(CULL_WORKGROUP_SIZE),
                1,
                1,
            );
        }

        // Step 5: copy survivor counts into the argument records.
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("sward args"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.args_pipeline);
            pass.set_bind_group(0, &self.args_bind_group, &[]);
            pass.dispatch_workgroups(1, 1, 1);
        }
    }

    /// Encodes the resize pass and the per-level reductions.
    fn encode_pyramid(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        depth_view: &wgpu::TextureView,
    ) {
        // The source view is external and may change identity every frame,
        // so the resize bind group is rebuilt here; the reduction groups
        // are prebuilt over our own mip views.
        let resize_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sward pyramid resize bind group"),
            layout: &self.pyramid_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.resources.pyramid_params.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(depth_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(
                        &self.resources.pyramid_mip_views[0],
                    ),
                },
            ],
        });

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("sward pyramid"),
            timestamp_writes: None,
        });

        let groups = |size: u32| size.div_ceil(PYRAMID_WORKGROUP_SIZE).max(1);

        pass.set_pipeline(&self.resize_pipeline);
        pass.set_bind_group(0, &resize_bind_group, &[]);
        let base = self.config.pyramid_size;
        pass.dispatch_workgroups(groups(base), groups(base), 1);

        // Level k+1 depends on level k having fully completed; successive
        // dispatches in one pass are ordered by the storage barriers wgpu
        // inserts between them.
        pass.set_pipeline(&self.reduce_pipeline);
        for (i, bind_group) in self.reduce_bind_groups.iter().enumerate() {
            let size = (base >> (i + 1)).max(1);
            pass.set_bind_group(0, bind_group, &[]);
            pass.dispatch_workgroups(groups(size), groups(size), 1);
        }
    }
}

/// Shorthand for a compute-visible uniform buffer layout entry.
fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Shorthand for a compute-visible storage buffer layout entry.
fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Shorthand for a compute-visible non-filterable float texture entry.
fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}
