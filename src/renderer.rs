use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::config::DemoMode;
use crate::core::GpuContext;
use crate::session::{MeshBatch, Session};
use crate::types::{CameraUniform, LightUniform, MeshVertex};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// What the overlay shows each frame
#[derive(Debug, Clone)]
pub struct OverlayStats {
    pub fps: f32,
    pub mode: DemoMode,
    pub status: String,
    pub bone: Option<String>,
    pub pitch: Option<f32>,
    pub clip_time: Option<f32>,
}

impl OverlayStats {
    pub fn from_session(session: &Session, fps: f32) -> Self {
        use crate::session::ModelStatus;

        let status = match session.status() {
            ModelStatus::Empty => "no model".to_string(),
            ModelStatus::Loaded { name, vertices } => format!("{} ({} vertices)", name, vertices),
            ModelStatus::Failed(err) => format!("load failed: {}", err),
        };
        let tracker = session.tracker();

        Self {
            fps,
            mode: session.config().demo,
            status,
            bone: tracker.map(|t| match t.bone() {
                Some(_) => t.bone_name().to_string(),
                None => format!("{} (missing)", t.bone_name()),
            }),
            pitch: tracker.and_then(|t| t.last_pitch()),
            clip_time: session.clip_time(),
        }
    }
}

/// Growable vertex + index buffer pair for one draw batch
struct BatchBuffers {
    label: &'static str,
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    vertex_capacity: u64,
    index_capacity: u64,
    index_count: u32,
}

impl BatchBuffers {
    const INITIAL_BYTES: u64 = 64 * 1024;

    fn new(device: &wgpu::Device, label: &'static str) -> Self {
        Self {
            label,
            vertex: Self::create(device, label, Self::INITIAL_BYTES, wgpu::BufferUsages::VERTEX),
            index: Self::create(device, label, Self::INITIAL_BYTES, wgpu::BufferUsages::INDEX),
            vertex_capacity: Self::INITIAL_BYTES,
            index_capacity: Self::INITIAL_BYTES,
            index_count: 0,
        }
    }

    fn create(device: &wgpu::Device, label: &str, size: u64, usage: wgpu::BufferUsages) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, batch: &MeshBatch) {
        self.index_count = 0;
        if batch.is_empty() {
            return;
        }

        let vertices: &[u8] = bytemuck::cast_slice(&batch.vertices);
        let indices: &[u8] = bytemuck::cast_slice(&batch.indices);

        if vertices.len() as u64 > self.vertex_capacity {
            self.vertex_capacity = (vertices.len() as u64).next_power_of_two();
            self.vertex = Self::create(device, self.label, self.vertex_capacity, wgpu::BufferUsages::VERTEX);
            log::debug!("{}: vertex buffer grown to {} bytes", self.label, self.vertex_capacity);
        }
        if indices.len() as u64 > self.index_capacity {
            self.index_capacity = (indices.len() as u64).next_power_of_two();
            self.index = Self::create(device, self.label, self.index_capacity, wgpu::BufferUsages::INDEX);
            log::debug!("{}: index buffer grown to {} bytes", self.label, self.index_capacity);
        }

        queue.write_buffer(&self.vertex, 0, vertices);
        queue.write_buffer(&self.index, 0, indices);
        self.index_count = batch.indices.len() as u32;
    }

    fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        if self.index_count == 0 {
            return;
        }
        pass.set_vertex_buffer(0, self.vertex.slice(..));
        pass.set_index_buffer(self.index.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// egui state for the stats overlay
struct Overlay {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

impl Overlay {
    fn new(window: &Window, device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let ctx = egui::Context::default();
        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let renderer = egui_wgpu::Renderer::new(device, format, egui_wgpu::RendererOptions::default());
        Self { ctx, state, renderer }
    }

    fn draw(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        window: &Window,
        size_in_pixels: [u32; 2],
        stats: &OverlayStats,
    ) {
        let raw_input = self.state.take_egui_input(window);
        let full_output = self.ctx.run(raw_input, |ctx| {
            egui::Window::new("Stats")
                .title_bar(false)
                .resizable(false)
                .fixed_pos(egui::pos2(10.0, 10.0))
                .frame(egui::Frame::NONE)
                .show(ctx, |ui| {
                    ui.label(
                        egui::RichText::new(format!("{:.0} FPS", stats.fps))
                            .size(24.0)
                            .color(egui::Color32::from_rgb(74, 158, 255)),
                    );
                    ui.monospace(format!("Mode: {:?}", stats.mode));
                    ui.monospace(format!("Model: {}", stats.status));
                    if let Some(time) = stats.clip_time {
                        ui.monospace(format!("Clip: {:.2}s", time));
                    }
                    if let Some(bone) = &stats.bone {
                        ui.monospace(format!("Bone: {}", bone));
                    }
                    if let Some(pitch) = stats.pitch {
                        ui.monospace(format!("Pitch: {:+.1}°", pitch.to_degrees()));
                    }
                });
        });

        self.state.handle_platform_output(window, full_output.platform_output);

        let tris = self.ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        for (id, image_delta) in &full_output.textures_delta.set {
            self.renderer.update_texture(gpu.device(), gpu.queue(), *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels,
            pixels_per_point: full_output.pixels_per_point,
        };
        self.renderer
            .update_buffers(gpu.device(), gpu.queue(), encoder, &tris, &screen_descriptor);

        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    occlusion_query_set: None,
                    timestamp_writes: None,
                })
                .forget_lifetime();
            self.renderer.render(&mut pass, &tris, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}

/// Forward renderer for the posed model: one opaque pass, then translucent
/// primitives blended on top without depth writes, then the overlay.
pub struct Renderer {
    gpu: GpuContext,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    opaque_pipeline: wgpu::RenderPipeline,
    blend_pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    light_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    opaque: BatchBuffers,
    translucent: BatchBuffers,
    overlay: Option<Overlay>,
    clear_color: wgpu::Color,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, background: [f32; 4], ui: bool) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;
        let gpu = GpuContext::new_with_surface(&instance, &surface).await?;

        let transparent = background[3] < 1.0;
        let surface_config = Self::create_surface_config(&surface, gpu.adapter(), size, transparent)?;
        surface.configure(gpu.device(), &surface_config);

        let device = gpu.device();
        let depth_view = Self::create_depth_view(device, surface_config.width, surface_config.height);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[CameraUniform::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Buffer"),
            contents: bytemuck::cast_slice(&[LightUniform::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("mesh_bind_group_layout"),
            entries: &[Self::uniform_entry(0), Self::uniform_entry(1)],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mesh_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_buffer.as_entire_binding(),
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("mesh.wgsl").into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let opaque_pipeline = Self::create_pipeline(device, &layout, &shader, surface_config.format, false);
        let blend_pipeline = Self::create_pipeline(device, &layout, &shader, surface_config.format, true);

        let overlay = ui.then(|| Overlay::new(&window, device, surface_config.format));

        let opaque = BatchBuffers::new(device, "Opaque Batch");
        let translucent = BatchBuffers::new(device, "Translucent Batch");
        let [r, g, b, a] = background.map(f64::from);
        log::info!(
            "Renderer initialized: {}x{} {:?}",
            surface_config.width,
            surface_config.height,
            surface_config.format
        );

        Ok(Self {
            gpu,
            surface,
            surface_config,
            depth_view,
            opaque_pipeline,
            blend_pipeline,
            camera_buffer,
            light_buffer,
            bind_group,
            opaque,
            translucent,
            overlay,
            clear_color: wgpu::Color { r, g, b, a },
        })
    }

    fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }
    }

    fn create_surface_config(
        surface: &wgpu::Surface,
        adapter: &wgpu::Adapter,
        size: winit::dpi::PhysicalSize<u32>,
        transparent: bool,
    ) -> Result<wgpu::SurfaceConfiguration> {
        let caps = surface.get_capabilities(adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or("Surface reports no supported formats")?;

        let alpha_mode = if transparent {
            [wgpu::CompositeAlphaMode::PreMultiplied, wgpu::CompositeAlphaMode::PostMultiplied]
                .into_iter()
                .find(|mode| caps.alpha_modes.contains(mode))
                .unwrap_or_else(|| {
                    log::warn!("Surface cannot composite with alpha; background will be opaque");
                    caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto)
                })
        } else {
            caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto)
        };

        Ok(wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        })
    }

    fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("Depth Texture"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn create_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        format: wgpu::TextureFormat,
        translucent: bool,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(if translucent { "Translucent Pipeline" } else { "Opaque Pipeline" }),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[MeshVertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(if translucent {
                        wgpu::BlendState::ALPHA_BLENDING
                    } else {
                        wgpu::BlendState::REPLACE
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: !translucent,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    /// Reconfigure for a new window size; zero sizes (minimised) are ignored
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.reconfigure();
    }

    fn reconfigure(&mut self) {
        self.surface.configure(self.gpu.device(), &self.surface_config);
        self.depth_view =
            Self::create_depth_view(self.gpu.device(), self.surface_config.width, self.surface_config.height);
    }

    /// Returns true when egui consumed the event
    pub fn handle_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        match self.overlay.as_mut() {
            Some(overlay) => overlay.state.on_window_event(window, event).consumed,
            None => false,
        }
    }

    /// Draw one frame. Lost or outdated surfaces are reconfigured and the
    /// frame skipped; other surface errors are returned.
    pub fn render(
        &mut self,
        session: &Session,
        window: &Window,
        stats: &OverlayStats,
    ) -> std::result::Result<(), wgpu::SurfaceError> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated; reconfiguring");
                self.reconfigure();
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let device = self.gpu.device();
        let queue = self.gpu.queue();
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[session.camera_uniform()]));
        queue.write_buffer(&self.light_buffer, 0, bytemuck::cast_slice(&[session.light_uniform()]));

        let geometry = session.geometry();
        self.opaque.upload(device, queue, &geometry.opaque);
        self.translucent.upload(device, queue, &geometry.translucent);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Mesh Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_bind_group(0, &self.bind_group, &[]);

            pass.set_pipeline(&self.opaque_pipeline);
            self.opaque.draw(&mut pass);

            pass.set_pipeline(&self.blend_pipeline);
            self.translucent.draw(&mut pass);
        }

        if let Some(overlay) = self.overlay.as_mut() {
            let size = [self.surface_config.width, self.surface_config.height];
            overlay.draw(&self.gpu, &mut encoder, &view, window, size, stats);
        }

        self.gpu.queue().submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}
