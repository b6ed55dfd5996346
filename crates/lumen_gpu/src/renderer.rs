//! GPU renderer
//!
//! Owns the wgpu device, the single SDF pipeline, the shared atlas and the
//! per-frame batcher, and exposes the public drawing API. A frame is
//! `begin_frame`, any number of drawing and state calls, then `end_frame`,
//! which uploads the recorded instance arena once and replays each batched
//! segment as one instanced draw with that segment's transform uniform and
//! scissor rect.

use std::sync::Arc;

use crate::atlas::AtlasAllocator;
use crate::batch::FrameState;
use crate::image::{ImageId, ImagePlacement, ImageStore, ImageStoreError};
use crate::primitives::{GpuInstance, SegmentUniforms, SEGMENT_UNIFORM_STRIDE};
use crate::shaders::SDF_SHADER;
use crate::text::{FontId, FontStore};
use lumen_image::{ImagePolicy, ImageSource};
use lumen_paint::{Color, CornerRadii, FillStyle, Rect};
use lumen_text::registry::FontPolicy;
use lumen_text::TextError;

/// Error type for renderer operations
#[derive(Debug)]
pub enum RendererError {
    /// Failed to request a GPU adapter
    AdapterNotFound,
    /// Failed to request a GPU device
    DeviceError(wgpu::RequestDeviceError),
    /// Shader or pipeline validation error
    ShaderError(String),
    /// Font loading or rasterization error
    TextError(TextError),
    /// Image decoding or upload error
    ImageError(ImageStoreError),
    /// The renderer was destroyed with `cleanup`
    Destroyed,
}

impl std::fmt::Display for RendererError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RendererError::AdapterNotFound => write!(f, "No suitable GPU adapter found"),
            RendererError::DeviceError(e) => write!(f, "Failed to request GPU device: {}", e),
            RendererError::ShaderError(e) => write!(f, "Shader compilation error: {}", e),
            RendererError::TextError(e) => write!(f, "Text error: {}", e),
            RendererError::ImageError(e) => write!(f, "Image error: {}", e),
            RendererError::Destroyed => write!(f, "Renderer has been destroyed"),
        }
    }
}

impl std::error::Error for RendererError {}

impl From<TextError> for RendererError {
    fn from(e: TextError) -> Self {
        RendererError::TextError(e)
    }
}

impl From<ImageStoreError> for RendererError {
    fn from(e: ImageStoreError) -> Self {
        RendererError::ImageError(e)
    }
}

/// Configuration for creating a renderer
#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Side length of the square shared atlas texture
    pub atlas_size: u32,
    /// Initial instance buffer capacity; the buffer grows on demand
    pub initial_instances: usize,
    /// Initial segment uniform capacity; the buffer grows on demand
    pub initial_segments: usize,
    /// Render target texture format
    pub texture_format: wgpu::TextureFormat,
    /// What to do when a font fails to load
    pub font_policy: FontPolicy,
    /// What to do when an image fails to decode
    pub image_policy: ImagePolicy,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            atlas_size: AtlasAllocator::DEFAULT_SIZE,
            initial_instances: 8_192,
            initial_segments: 256,
            texture_format: wgpu::TextureFormat::Rgba8Unorm,
            font_policy: FontPolicy::default(),
            image_policy: ImagePolicy::default(),
        }
    }
}

/// Clamp a device-pixel clip rect to the render target, conservatively
/// covering partially-touched pixels. Returns `None` when nothing of the
/// rect survives; the resulting rect never exceeds the target, which wgpu
/// validates against the attachment size.
fn scissor_to_target(rect: &Rect, target_w: u32, target_h: u32) -> Option<(u32, u32, u32, u32)> {
    let x0 = (rect.x.max(0.0).floor() as u32).min(target_w);
    let y0 = (rect.y.max(0.0).floor() as u32).min(target_h);
    let x1 = (rect.max_x().max(0.0).ceil() as u32).min(target_w);
    let y1 = (rect.max_y().max(0.0).ceil() as u32).min(target_h);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some((x0, y0, x1 - x0, y1 - y0))
}

/// Everything released by `cleanup`
struct GpuResources {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    segment_buffer: wgpu::Buffer,
    segment_capacity: usize,
    atlas: AtlasAllocator,
    sampler: wgpu::Sampler,
}

pub struct Renderer {
    _instance: wgpu::Instance,
    _adapter: wgpu::Adapter,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    format: wgpu::TextureFormat,
    resources: Option<GpuResources>,
    frame: FrameState,
    fonts: FontStore,
    images: ImageStore,
}

impl Renderer {
    fn preferred_backends() -> wgpu::Backends {
        #[cfg(target_os = "macos")]
        {
            wgpu::Backends::METAL
        }
        #[cfg(target_os = "windows")]
        {
            wgpu::Backends::DX12
        }
        #[cfg(target_os = "linux")]
        {
            wgpu::Backends::VULKAN
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        {
            wgpu::Backends::all()
        }
    }

    /// Create a renderer without a surface (offscreen rendering)
    pub async fn new(config: RendererConfig) -> Result<Self, RendererError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: Self::preferred_backends(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RendererError::AdapterNotFound)?;

        tracing::info!("gpu adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Lumen GPU Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::MemoryUsage,
                },
                None,
            )
            .await
            .map_err(RendererError::DeviceError)?;

        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let resources = Self::create_resources(&device, &config).await?;

        Ok(Self {
            _instance: instance,
            _adapter: adapter,
            device,
            queue,
            format: config.texture_format,
            resources: Some(resources),
            frame: FrameState::new(),
            fonts: FontStore::new(config.font_policy),
            images: ImageStore::new(config.image_policy),
        })
    }

    /// Blocking convenience wrapper around [`Renderer::new`]
    pub fn new_blocking(config: RendererConfig) -> Result<Self, RendererError> {
        pollster::block_on(Self::new(config))
    }

    async fn create_resources(
        device: &wgpu::Device,
        config: &RendererConfig,
    ) -> Result<GpuResources, RendererError> {
        // Shader and pipeline validation errors surface through the error
        // scope instead of the uncaptured-error handler.
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Lumen SDF Shader"),
            source: wgpu::ShaderSource::Wgsl(SDF_SHADER.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Lumen Bind Group Layout"),
            entries: &[
                // Per-segment uniforms, bound with a dynamic offset
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<
                            SegmentUniforms,
                        >() as u64),
                    },
                    count: None,
                },
                // Instance storage buffer
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Shared atlas (glyph coverage and image pixels)
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Lumen Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        // Straight-alpha source-over blending; the shader outputs straight
        // alpha.
        let blend_state = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Lumen SDF Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.texture_format,
                    blend: Some(blend_state),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        if let Some(error) = device.pop_error_scope().await {
            return Err(RendererError::ShaderError(error.to_string()));
        }

        let atlas = AtlasAllocator::new(device, config.atlas_size);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Lumen Atlas Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let instance_capacity = config.initial_instances.max(1);
        let segment_capacity = config.initial_segments.max(1);
        let instance_buffer = Self::create_instance_buffer(device, instance_capacity);
        let segment_buffer = Self::create_segment_buffer(device, segment_capacity);

        let bind_group = Self::create_bind_group(
            device,
            &bind_group_layout,
            &instance_buffer,
            &segment_buffer,
            atlas.view(),
            &sampler,
        );

        Ok(GpuResources {
            pipeline,
            bind_group_layout,
            bind_group,
            instance_buffer,
            instance_capacity,
            segment_buffer,
            segment_capacity,
            atlas,
            sampler,
        })
    }

    fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Lumen Instance Buffer"),
            size: (capacity * std::mem::size_of::<GpuInstance>()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_segment_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Lumen Segment Uniform Buffer"),
            size: capacity as u64 * SEGMENT_UNIFORM_STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        instance_buffer: &wgpu::Buffer,
        segment_buffer: &wgpu::Buffer,
        atlas_view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Lumen Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: segment_buffer,
                        offset: 0,
                        size: wgpu::BufferSize::new(std::mem::size_of::<SegmentUniforms>() as u64),
                    }),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: instance_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(atlas_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn texture_format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Create an offscreen render target in the renderer's format
    pub fn create_target(&self, width: u32, height: u32) -> wgpu::Texture {
        self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Lumen Offscreen Target"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        })
    }

    // === Frame lifecycle ===

    /// Reset per-frame state. `width` and `height` are in UI points; the
    /// device-pixel target size is `width * pixel_ratio` by
    /// `height * pixel_ratio`.
    pub fn begin_frame(&mut self, width: f32, height: f32, pixel_ratio: f32) {
        self.frame.begin(width, height, pixel_ratio);
    }

    /// Upload the frame and replay its segments into `target` in one render
    /// pass
    pub fn end_frame(
        &mut self,
        target: &wgpu::TextureView,
        clear_color: Color,
    ) -> Result<(), RendererError> {
        self.frame.end();

        let res = self.resources.as_mut().ok_or(RendererError::Destroyed)?;
        let instances = self.frame.instances();
        let segments = self.frame.segments();

        if instances.len() > res.instance_capacity || segments.len() > res.segment_capacity {
            Self::grow_buffers(res, &self.device, instances.len(), segments.len());
        }

        if !instances.is_empty() {
            self.queue
                .write_buffer(&res.instance_buffer, 0, bytemuck::cast_slice(instances));
        }

        let (device_w, device_h) = self.frame.device_size();
        if !segments.is_empty() {
            let stride = SEGMENT_UNIFORM_STRIDE as usize;
            let mut uniforms = vec![0u8; segments.len() * stride];
            for (i, segment) in segments.iter().enumerate() {
                let entry = SegmentUniforms {
                    transform: segment.transform.to_mat4(),
                    viewport: [device_w, device_h, self.frame.pixel_ratio(), 0.0],
                };
                uniforms[i * stride..i * stride + std::mem::size_of::<SegmentUniforms>()]
                    .copy_from_slice(bytemuck::bytes_of(&entry));
            }
            self.queue.write_buffer(&res.segment_buffer, 0, &uniforms);
        }

        tracing::trace!(
            "frame: {} instances in {} segments",
            instances.len(),
            segments.len()
        );

        let target_w = (device_w.round() as u32).max(1);
        let target_h = (device_h.round() as u32).max(1);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Lumen Frame Encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Lumen Frame Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear_color.r as f64,
                            g: clear_color.g as f64,
                            b: clear_color.b as f64,
                            a: clear_color.a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&res.pipeline);

            for (i, segment) in segments.iter().enumerate() {
                let scissor = match &segment.scissor {
                    Some(rect) => match scissor_to_target(rect, target_w, target_h) {
                        Some(clamped) => clamped,
                        None => continue, // fully clipped segment
                    },
                    None => (0, 0, target_w, target_h),
                };

                let offset = (i as u64 * SEGMENT_UNIFORM_STRIDE) as u32;
                pass.set_bind_group(0, &res.bind_group, &[offset]);
                pass.set_scissor_rect(scissor.0, scissor.1, scissor.2, scissor.3);
                pass.draw(0..6, segment.range.clone());
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn grow_buffers(
        res: &mut GpuResources,
        device: &wgpu::Device,
        instances_needed: usize,
        segments_needed: usize,
    ) {
        if instances_needed > res.instance_capacity {
            res.instance_capacity = instances_needed.next_power_of_two();
            res.instance_buffer = Self::create_instance_buffer(device, res.instance_capacity);
            tracing::debug!("instance buffer grown to {}", res.instance_capacity);
        }
        if segments_needed > res.segment_capacity {
            res.segment_capacity = segments_needed.next_power_of_two();
            res.segment_buffer = Self::create_segment_buffer(device, res.segment_capacity);
            tracing::debug!("segment buffer grown to {}", res.segment_capacity);
        }
        res.bind_group = Self::create_bind_group(
            device,
            &res.bind_group_layout,
            &res.instance_buffer,
            &res.segment_buffer,
            res.atlas.view(),
            &res.sampler,
        );
    }

    // === Drawing ===

    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, style: &FillStyle, radii: CornerRadii) {
        self.frame.rect(x, y, w, h, style, radii);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn hollow_rect(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        line_width: f32,
        color: Color,
        radii: CornerRadii,
    ) {
        self.frame.hollow_rect(x, y, w, h, line_width, color, radii);
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: Color, width: f32) {
        self.frame.line(x1, y1, x2, y2, color, width);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn drop_shadow(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        blur: f32,
        spread: f32,
        color: Color,
        radii: CornerRadii,
    ) {
        self.frame.drop_shadow(x, y, w, h, blur, spread, color, radii);
    }

    /// Draw `text` with its top-left corner at `(x, y)`; the baseline sits
    /// at `y + ascent` scaled to `pixel_size`
    pub fn text(
        &mut self,
        font: FontId,
        x: f32,
        y: f32,
        text: &str,
        color: Color,
        pixel_size: f32,
    ) -> Result<(), RendererError> {
        let res = self.resources.as_mut().ok_or(RendererError::Destroyed)?;
        let atlas = self
            .fonts
            .atlas(font, pixel_size, &self.queue, &mut res.atlas)?;

        let scale = pixel_size / atlas.render_size;
        let baseline = y + atlas.ascent * scale;
        let mut pen = x;
        for ch in text.chars() {
            let glyph = atlas.glyph(ch);
            if glyph.uv[0] >= 0.0 {
                self.frame.glyph(
                    pen + glyph.bearing_x * scale,
                    baseline - glyph.bearing_y * scale,
                    glyph.width * scale,
                    glyph.height * scale,
                    glyph.uv,
                    color,
                );
            }
            pen += glyph.advance * scale;
        }
        Ok(())
    }

    /// Measure `text` at `pixel_size` without drawing it
    pub fn text_bounds(
        &mut self,
        font: FontId,
        text: &str,
        pixel_size: f32,
    ) -> Result<(f32, f32), RendererError> {
        let res = self.resources.as_mut().ok_or(RendererError::Destroyed)?;
        let atlas = self
            .fonts
            .atlas(font, pixel_size, &self.queue, &mut res.atlas)?;
        Ok(atlas.measure(text, pixel_size))
    }

    /// Draw a registered image, initializing it on first use. `mask` tints
    /// the image; use white for no tint.
    #[allow(clippy::too_many_arguments)]
    pub fn image(
        &mut self,
        image: ImageId,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        mask: Color,
        radii: CornerRadii,
    ) -> Result<(), RendererError> {
        let placement = self.ensure_image(image)?;
        let uv = placement.uv.to_array();
        self.frame.image_rect(x, y, w, h, uv, mask, radii);
        Ok(())
    }

    /// Decode and upload a registered image ahead of its first draw.
    /// Idempotent.
    pub fn init_image(&mut self, image: ImageId) -> Result<(), RendererError> {
        self.ensure_image(image).map(|_| ())
    }

    /// Natural pixel size of a registered image, initializing it on first
    /// use
    pub fn image_size(&mut self, image: ImageId) -> Result<(u32, u32), RendererError> {
        let placement = self.ensure_image(image)?;
        Ok((placement.width, placement.height))
    }

    fn ensure_image(&mut self, image: ImageId) -> Result<ImagePlacement, RendererError> {
        let res = self.resources.as_mut().ok_or(RendererError::Destroyed)?;
        Ok(self.images.ensure(image, &self.queue, &mut res.atlas)?)
    }

    // === State ===

    pub fn push(&mut self) {
        self.frame.push();
    }

    pub fn pop(&mut self) {
        self.frame.pop();
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        self.frame.translate(x, y);
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.frame.scale(sx, sy);
    }

    pub fn rotate(&mut self, angle: f32) {
        self.frame.rotate(angle);
    }

    pub fn skew_x(&mut self, angle: f32) {
        self.frame.skew_x(angle);
    }

    pub fn skew_y(&mut self, angle: f32) {
        self.frame.skew_y(angle);
    }

    pub fn push_scissor(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.frame.push_scissor(x, y, w, h);
    }

    pub fn push_scissor_intersecting(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.frame.push_scissor_intersecting(x, y, w, h);
    }

    pub fn pop_scissor(&mut self) {
        self.frame.pop_scissor();
    }

    pub fn global_alpha(&mut self, alpha: f32) {
        self.frame.global_alpha(alpha);
    }

    // === Resources ===

    pub fn register_font(&mut self, data: Vec<u8>) -> Result<FontId, RendererError> {
        Ok(self.fonts.register_bytes(data)?)
    }

    pub fn register_font_family(&mut self, name: &str) -> Result<FontId, RendererError> {
        Ok(self.fonts.register_family(name)?)
    }

    /// Register the platform default font
    pub fn register_default_font(&mut self) -> Result<FontId, RendererError> {
        Ok(self.fonts.register_default()?)
    }

    pub fn delete_font(&mut self, font: FontId) {
        self.fonts.delete(font);
    }

    pub fn register_image(&mut self, source: ImageSource) -> ImageId {
        self.images.register(source)
    }

    pub fn delete_image(&mut self, image: ImageId) {
        self.images.delete(image);
    }

    /// Release GPU resources. Safe to call more than once; drawing after
    /// cleanup still batches but `end_frame` reports
    /// [`RendererError::Destroyed`].
    pub fn cleanup(&mut self) {
        if self.resources.take().is_some() {
            tracing::debug!("renderer resources released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_in_bounds(scissor: (u32, u32, u32, u32), w: u32, h: u32) {
        assert!(scissor.0 + scissor.2 <= w, "{:?} exceeds width {}", scissor, w);
        assert!(scissor.1 + scissor.3 <= h, "{:?} exceeds height {}", scissor, h);
    }

    #[test]
    fn test_scissor_interior_rect_passes_through() {
        let rect = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(scissor_to_target(&rect, 800, 600), Some((10, 20, 100, 50)));
    }

    #[test]
    fn test_scissor_fractional_sliver_at_right_edge_stays_in_bounds() {
        // 0.4 device pixels hanging off x=799.6: rounding must not push the
        // rect past the 800-px attachment
        let rect = Rect::new(799.6, 0.0, 0.4, 100.0);
        let scissor = scissor_to_target(&rect, 800, 600).unwrap();
        assert_in_bounds(scissor, 800, 600);
        assert_eq!(scissor, (799, 0, 1, 100));
    }

    #[test]
    fn test_scissor_fully_outside_target_is_skipped() {
        assert_eq!(
            scissor_to_target(&Rect::new(800.0, 0.0, 50.0, 50.0), 800, 600),
            None
        );
        assert_eq!(
            scissor_to_target(&Rect::new(-50.0, -50.0, 50.0, 50.0), 800, 600),
            None
        );
    }

    #[test]
    fn test_scissor_zero_area_is_skipped() {
        assert_eq!(
            scissor_to_target(&Rect::new(10.0, 10.0, 0.0, 40.0), 800, 600),
            None
        );
    }

    #[test]
    fn test_scissor_negative_origin_clamps() {
        let rect = Rect::new(-20.0, -10.0, 100.0, 100.0);
        assert_eq!(scissor_to_target(&rect, 800, 600), Some((0, 0, 80, 90)));
    }

    #[test]
    fn test_scissor_fractional_edges_cover_touched_pixels() {
        // Conservative rounding: partially-covered pixels stay inside the
        // scissor instead of being clipped away
        let rect = Rect::new(10.6, 10.6, 20.0, 20.0);
        let scissor = scissor_to_target(&rect, 800, 600).unwrap();
        assert_eq!(scissor, (10, 10, 21, 21));
        assert_in_bounds(scissor, 800, 600);
    }
}
