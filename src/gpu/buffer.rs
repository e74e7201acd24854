//! Particle pools in GPU memory.

use crate::backend::ParticleBuffer;
use crate::error::GpuError;
use crate::particle::{EmitterUniforms, Particle, ParticleGpu};
use crate::shader::DrawUniforms;
use crate::GpuRecord;

use super::capture_errors;
use super::pipeline::Pipelines;

/// One emitter's pool plus the uniforms and bind groups that address it.
///
/// The record buffer is bound as storage by the integrator and as an
/// instance-rate vertex buffer by the sprite pipeline.
pub struct GpuParticleBuffer {
    queue: wgpu::Queue,
    capacity: u32,
    pub(super) records: wgpu::Buffer,
    pub(super) uniforms: wgpu::Buffer,
    pub(super) draw_params: wgpu::Buffer,
    pub(super) compute_bind_group: wgpu::BindGroup,
    pub(super) draw_bind_group: wgpu::BindGroup,
}

impl GpuParticleBuffer {
    pub(super) fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pipelines: &Pipelines,
        capacity: u32,
    ) -> Result<Self, GpuError> {
        // Zero-capacity pools still need a bindable buffer.
        let bytes = capacity.max(1) as u64 * Particle::STRIDE as u64;
        let limit = device.limits().max_storage_buffer_binding_size as u64;
        if bytes > limit {
            return Err(GpuError::BufferAllocation {
                bytes,
                message: format!("exceeds the device storage binding limit of {limit} bytes"),
            });
        }

        let records = capture_errors(device, || {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Particle Buffer"),
                size: bytes,
                usage: wgpu::BufferUsages::VERTEX
                    | wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        })
        .map_err(|message| GpuError::BufferAllocation { bytes, message })?;

        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Emitter Uniform Buffer"),
            size: std::mem::size_of::<EmitterUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let draw_params = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw Params Buffer"),
            size: std::mem::size_of::<DrawUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let compute_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle Compute Bind Group"),
            layout: &pipelines.compute_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: records.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: uniforms.as_entire_binding(),
                },
            ],
        });

        let draw_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw Params Bind Group"),
            layout: &pipelines.draw_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: draw_params.as_entire_binding(),
            }],
        });

        Ok(Self {
            queue: queue.clone(),
            capacity,
            records,
            uniforms,
            draw_params,
            compute_bind_group,
            draw_bind_group,
        })
    }

    pub(super) fn write_uniforms(&self, uniforms: &EmitterUniforms) {
        self.queue
            .write_buffer(&self.uniforms, 0, bytemuck::bytes_of(uniforms));
    }

    pub(super) fn write_draw_params(&self, params: &DrawUniforms) {
        self.queue
            .write_buffer(&self.draw_params, 0, bytemuck::bytes_of(params));
    }
}

impl ParticleBuffer for GpuParticleBuffer {
    fn capacity(&self) -> u32 {
        self.capacity
    }

    fn write(&mut self, first: u32, records: &[Particle]) {
        if records.is_empty() {
            return;
        }
        let gpu: Vec<ParticleGpu> = records.iter().map(Particle::to_gpu).collect();
        let offset = first as wgpu::BufferAddress * Particle::STRIDE as wgpu::BufferAddress;
        self.queue
            .write_buffer(&self.records, offset, bytemuck::cast_slice(&gpu));
    }
}
