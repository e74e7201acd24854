//! wgpu backend.
//!
//! Each frame is recorded into one command encoder: a compute pass with one
//! dispatch per integration, then a render pass with one instanced draw per
//! batch. Command order is what guarantees integration finishes before any
//! draw reads a pool.

mod buffer;
mod pipeline;
mod texture;

use std::sync::Arc;

use winit::window::Window;

pub use buffer::GpuParticleBuffer;
pub use pipeline::Pipelines;
pub use texture::GpuTexture;

use crate::backend::{Backend, Frame, Viewport};
use crate::error::{FrameError, GpuError, TextureError};
use crate::shader::{self, DrawUniforms, ViewportUniforms};
use crate::textures::TextureLoader;

/// Background behind the sprites.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.2,
    g: 0.2,
    b: 0.2,
    a: 1.0,
};

/// Run `create` inside validation and out-of-memory error scopes.
///
/// wgpu reports creation failures asynchronously; this turns them into an
/// `Err` with the device's message.
pub(crate) fn capture_errors<T>(device: &wgpu::Device, create: impl FnOnce() -> T) -> Result<T, String> {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    let validation = pollster::block_on(device.pop_error_scope());
    let out_of_memory = pollster::block_on(device.pop_error_scope());
    match validation.or(out_of_memory) {
        Some(error) => Err(error.to_string()),
        None => Ok(value),
    }
}

/// Surface, device and queue for one window.
pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    pub async fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Sprite colors are authored for a linear-to-display target.
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::UnsupportedSurface)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        tracing::info!(
            adapter = %adapter.get_info().name,
            backend = ?adapter.get_info().backend,
            format = ?surface_format,
            "GPU initialized"
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
        })
    }

    /// Reconfigure the surface; zero-sized requests are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Reconfigure with the current size, after a lost or outdated surface.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }
}

/// [`Backend`] drawing into a window surface.
pub struct GpuBackend {
    context: GpuContext,
    pipelines: Pipelines,
    loader: TextureLoader,
    viewport_buffer: wgpu::Buffer,
    viewport_bind_group: wgpu::BindGroup,
}

impl GpuBackend {
    pub fn new(context: GpuContext, loader: TextureLoader) -> Result<Self, GpuError> {
        let pipelines = Pipelines::new(&context.device, context.config.format)?;

        let viewport_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Viewport Uniform Buffer"),
            size: std::mem::size_of::<ViewportUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let viewport_bind_group = context.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Viewport Bind Group"),
            layout: &pipelines.viewport_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: viewport_buffer.as_entire_binding(),
            }],
        });

        Ok(Self {
            context,
            pipelines,
            loader,
            viewport_buffer,
            viewport_bind_group,
        })
    }

    pub fn context(&self) -> &GpuContext {
        &self.context
    }

    pub fn reconfigure(&mut self) {
        self.context.reconfigure();
    }
}

impl Backend for GpuBackend {
    type Buffer = GpuParticleBuffer;
    type Texture = GpuTexture;

    fn create_particle_buffer(&self, capacity: u32) -> Result<GpuParticleBuffer, GpuError> {
        GpuParticleBuffer::new(
            &self.context.device,
            &self.context.queue,
            &self.pipelines,
            capacity,
        )
    }

    fn load_texture(&self, name: &str) -> Result<GpuTexture, TextureError> {
        let image = self.loader.load(name)?;
        GpuTexture::upload(
            &self.context.device,
            &self.context.queue,
            &self.pipelines.texture_layout,
            name,
            &image,
        )
    }

    fn viewport(&self) -> Viewport {
        Viewport::new(
            self.context.config.width as f32,
            self.context.config.height as f32,
        )
    }

    fn resize(&mut self, viewport: Viewport) {
        self.context
            .resize(viewport.width as u32, viewport.height as u32);
    }

    fn submit_frame(
        &mut self,
        frame: Frame<'_, GpuParticleBuffer, GpuTexture>,
    ) -> Result<(), FrameError> {
        let viewport = self.viewport();
        self.context.queue.write_buffer(
            &self.viewport_buffer,
            0,
            bytemuck::bytes_of(&ViewportUniforms {
                size: [viewport.width, viewport.height],
                _padding: [0.0; 2],
            }),
        );
        for integration in frame.integrations() {
            integration.buffer.write_uniforms(&integration.uniforms);
        }
        for draw in frame.draws() {
            draw.buffer.write_draw_params(&DrawUniforms {
                offset: draw.offset.to_array(),
                _padding: 0.0,
            });
        }

        let output = self.context.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Integrate Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.pipelines.compute);
            for integration in frame.integrations() {
                compute_pass.set_bind_group(0, &integration.buffer.compute_bind_group, &[]);
                compute_pass.dispatch_workgroups(shader::workgroup_count(integration.count), 1, 1);
            }
        }

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sprite Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            render_pass.set_pipeline(&self.pipelines.render);
            render_pass.set_bind_group(0, &self.viewport_bind_group, &[]);
            for draw in frame.draws() {
                render_pass.set_bind_group(1, &draw.texture.bind_group, &[]);
                render_pass.set_bind_group(2, &draw.buffer.draw_bind_group, &[]);
                render_pass.set_vertex_buffer(0, draw.buffer.records.slice(..));
                render_pass.draw(0..6, 0..draw.instances);
            }
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
