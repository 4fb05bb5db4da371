// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The lit tube pipeline and the per-frame draw list it consumes.
//!
//! All GPU resources on the render path are persistent: per-draw uniforms
//! cycle through an aligned ring inside one uniform buffer, and streamed
//! client arrays go through two growable scratch vertex buffers. Nothing is
//! allocated per frame once the ring and scratches have reached their
//! working size.

use std::mem;
use std::sync::Arc;

use mitos_core::math::{degrees_to_radians, LinearRgba, Mat4, Vec3};
use wgpu::util::DeviceExt;

use super::context::{WgpuHeadlessContext, COLOR_FORMAT, DEPTH_FORMAT};

/// Vertical field of view of the viewer camera, in degrees.
const CAMERA_FOV_Y_DEGREES: f32 = 45.0;
/// Near clipping plane distance of the viewer camera.
const CAMERA_Z_NEAR: f32 = 0.1;
/// Far clipping plane distance of the viewer camera.
const CAMERA_Z_FAR: f32 = 200.0;

/// World-space direction towards the single directional light.
const LIGHT_DIRECTION: Vec3 = Vec3 {
    x: 0.45,
    y: 0.75,
    z: 0.5,
};

/// Number of per-draw uniform slots allocated up front.
const INITIAL_DRAW_SLOTS: usize = 64;
/// Initial size of each streaming scratch buffer, in bytes.
const INITIAL_SCRATCH_BYTES: u64 = 64 * 1024;

/// Camera state uploaded once per camera change, bound at group 0.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniforms {
    view_proj: [[f32; 4]; 4],
    light_dir: [f32; 4],
}

/// Per-draw state staged into the uniform ring, bound at group 1 with a
/// dynamic offset.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct DrawUniforms {
    color: [f32; 4],
}

/// Rounds `size` up to the next multiple of `alignment`.
fn aligned_stride(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

/// One tube draw recorded for the current frame.
#[derive(Debug)]
pub(crate) enum RecordedTube {
    /// A draw sourced from buffers resident in GPU memory.
    ///
    /// The `Arc`s keep the buffers alive through the flush even if the
    /// owning cache destroys them later in the same frame.
    Resident {
        /// The resident vertex position buffer.
        vertices: Arc<wgpu::Buffer>,
        /// The resident vertex normal buffer.
        normals: Arc<wgpu::Buffer>,
        /// Number of vertices to draw.
        vertex_count: u32,
        /// Flat color of the tube.
        color: LinearRgba,
    },
    /// A draw streamed from client arrays through the scratch buffers.
    ///
    /// Positions and normals occupy the same byte range in their
    /// respective scratch buffers.
    Streamed {
        /// Byte offset of this draw's data inside each scratch buffer.
        byte_offset: u64,
        /// Byte length of this draw's data in each scratch buffer.
        byte_len: u64,
        /// Number of vertices to draw.
        vertex_count: u32,
        /// Flat color of the tube.
        color: LinearRgba,
    },
}

impl RecordedTube {
    fn color(&self) -> LinearRgba {
        match self {
            RecordedTube::Resident { color, .. } => *color,
            RecordedTube::Streamed { color, .. } => *color,
        }
    }
}

/// Everything a frame has recorded between two presents.
#[derive(Debug, Default)]
pub(crate) struct FrameRecorder {
    /// Draws in submission order.
    pub(crate) draws: Vec<RecordedTube>,
    /// Concatenated client-side positions, tightly packed `f32` bytes.
    pub(crate) stream_vertices: Vec<u8>,
    /// Concatenated client-side normals, aligned with `stream_vertices`.
    pub(crate) stream_normals: Vec<u8>,
}

/// A growable uniform buffer holding one aligned slot per draw, shared by
/// every draw of the frame through a single dynamic-offset bind group.
#[derive(Debug)]
struct DrawUniformRing {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    capacity: usize,
    staging: Vec<u8>,
    staged: usize,
}

impl DrawUniformRing {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, limits: &wgpu::Limits) -> Self {
        let stride = aligned_stride(
            mem::size_of::<DrawUniforms>() as u64,
            limits.min_uniform_buffer_offset_alignment as u64,
        );
        let (buffer, bind_group) = Self::create(device, layout, stride, INITIAL_DRAW_SLOTS);
        Self {
            buffer,
            bind_group,
            stride,
            capacity: INITIAL_DRAW_SLOTS,
            staging: Vec::new(),
            staged: 0,
        }
    }

    fn create(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: usize,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Per-Draw Uniform Ring"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Per-Draw Uniform Ring"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(mem::size_of::<DrawUniforms>() as u64),
                }),
            }],
        });
        (buffer, bind_group)
    }

    /// Appends one draw's uniforms to the staging area and returns the
    /// dynamic offset its bind group call must use.
    fn stage(&mut self, uniforms: DrawUniforms) -> u32 {
        let offset = self.staged as u64 * self.stride;
        self.staging.extend_from_slice(bytemuck::bytes_of(&uniforms));
        self.staged += 1;
        self.staging.resize((self.staged as u64 * self.stride) as usize, 0);
        offset as u32
    }

    /// Grows the ring if this frame staged more draws than it has slots,
    /// then uploads the staged bytes in one write.
    fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
    ) {
        if self.staged > self.capacity {
            let capacity = self.staged.next_power_of_two();
            let (buffer, bind_group) = Self::create(device, layout, self.stride, capacity);
            self.buffer = buffer;
            self.bind_group = bind_group;
            self.capacity = capacity;
            log::debug!("Per-draw uniform ring grew to {capacity} slots");
        }
        if !self.staging.is_empty() {
            queue.write_buffer(&self.buffer, 0, &self.staging);
        }
    }

    fn reset(&mut self) {
        self.staging.clear();
        self.staged = 0;
    }
}

/// A persistent vertex buffer that grows to fit the largest streamed frame
/// seen so far.
#[derive(Debug)]
struct ScratchBuffer {
    buffer: wgpu::Buffer,
    capacity: u64,
    label: &'static str,
}

impl ScratchBuffer {
    fn new(device: &wgpu::Device, label: &'static str) -> Self {
        Self {
            buffer: Self::create(device, label, INITIAL_SCRATCH_BYTES),
            capacity: INITIAL_SCRATCH_BYTES,
            label,
        }
    }

    fn create(device: &wgpu::Device, label: &'static str, capacity: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: capacity,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Uploads `data` to the front of the buffer, growing it first if the
    /// frame streamed more bytes than the buffer holds.
    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[u8]) {
        let needed = data.len() as u64;
        if needed > self.capacity {
            self.capacity = needed.next_power_of_two();
            self.buffer = Self::create(device, self.label, self.capacity);
            log::debug!("Scratch buffer '{}' grew to {} bytes", self.label, self.capacity);
        }
        if !data.is_empty() {
            queue.write_buffer(&self.buffer, 0, data);
        }
    }
}

/// The lit flat-color pipeline plus every persistent resource the render
/// path needs: camera uniforms, the per-draw uniform ring, and the two
/// streaming scratch buffers.
#[derive(Debug)]
pub(crate) struct TubePipeline {
    pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    draw_layout: wgpu::BindGroupLayout,
    ring: DrawUniformRing,
    scratch_vertices: ScratchBuffer,
    scratch_normals: ScratchBuffer,
}

impl TubePipeline {
    pub(crate) fn new(context: &WgpuHeadlessContext) -> Self {
        let device = context.device();

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Tube Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("tube.wgsl").into()),
        });

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        mem::size_of::<CameraUniforms>() as u64
                    ),
                },
                count: None,
            }],
        });

        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Per-Draw Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(mem::size_of::<DrawUniforms>() as u64),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Tube Pipeline Layout"),
            bind_group_layouts: &[Some(&camera_layout), Some(&draw_layout)],
            immediate_size: 0,
        });

        // Positions and normals stay in separate buffers, mirroring the
        // split layout of the tube meshes.
        let vertex_stride = (3 * mem::size_of::<f32>()) as u64;
        let position_layout = wgpu::VertexBufferLayout {
            array_stride: vertex_stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 0,
            }],
        };
        let normal_layout = wgpu::VertexBufferLayout {
            array_stride: vertex_stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 1,
            }],
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Tube Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[position_layout, normal_layout],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: COLOR_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
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
                depth_write_enabled: Some(true),
                depth_compare: Some(wgpu::CompareFunction::Less),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniforms"),
            contents: bytemuck::bytes_of(&CameraUniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                light_dir: light_direction(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let ring = DrawUniformRing::new(device, &draw_layout, &context.device_limits);
        let scratch_vertices = ScratchBuffer::new(device, "Streamed Tube Vertices");
        let scratch_normals = ScratchBuffer::new(device, "Streamed Tube Normals");

        Self {
            pipeline,
            camera_buffer,
            camera_bind_group,
            draw_layout,
            ring,
            scratch_vertices,
            scratch_normals,
        }
    }

    /// Rebuilds the camera uniforms for a viewer at `eye` looking at
    /// `target`, and uploads them.
    ///
    /// A degenerate frame (eye on top of the target, or a vertical view
    /// direction) is logged and ignored, keeping the previous camera.
    pub(crate) fn set_camera(
        &self,
        context: &WgpuHeadlessContext,
        eye: Vec3,
        target: Vec3,
    ) {
        let view = match Mat4::look_at_rh(eye, target, Vec3::Y) {
            Some(view) => view,
            None => {
                log::warn!("Ignoring degenerate camera frame: eye {eye:?}, target {target:?}");
                return;
            }
        };
        let projection = Mat4::perspective_rh_zo(
            degrees_to_radians(CAMERA_FOV_Y_DEGREES),
            context.aspect_ratio(),
            CAMERA_Z_NEAR,
            CAMERA_Z_FAR,
        );
        let uniforms = CameraUniforms {
            view_proj: (projection * view).to_cols_array_2d(),
            light_dir: light_direction(),
        };
        context
            .queue()
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// Flushes one recorded frame: uploads the per-draw uniforms and the
    /// streamed arrays, then encodes and submits a single render pass over
    /// every recorded draw.
    pub(crate) fn render(&mut self, context: &WgpuHeadlessContext, frame: FrameRecorder) {
        let device = context.device();
        let queue = context.queue();

        self.ring.reset();
        let offsets: Vec<u32> = frame
            .draws
            .iter()
            .map(|draw| {
                let color = draw.color();
                self.ring.stage(DrawUniforms {
                    color: [color.r, color.g, color.b, color.a],
                })
            })
            .collect();
        self.ring.upload(device, queue, &self.draw_layout);

        self.scratch_vertices.upload(device, queue, &frame.stream_vertices);
        self.scratch_normals.upload(device, queue, &frame.stream_normals);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Tube Frame Encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Tube Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &context.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(context.clear_color()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &context.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.camera_bind_group, &[]);

            for (draw, offset) in frame.draws.iter().zip(offsets) {
                pass.set_bind_group(1, &self.ring.bind_group, &[offset]);
                match draw {
                    RecordedTube::Resident {
                        vertices,
                        normals,
                        vertex_count,
                        ..
                    } => {
                        pass.set_vertex_buffer(0, vertices.slice(..));
                        pass.set_vertex_buffer(1, normals.slice(..));
                        pass.draw(0..*vertex_count, 0..1);
                    }
                    RecordedTube::Streamed {
                        byte_offset,
                        byte_len,
                        vertex_count,
                        ..
                    } => {
                        let range = *byte_offset..*byte_offset + *byte_len;
                        pass.set_vertex_buffer(0, self.scratch_vertices.buffer.slice(range.clone()));
                        pass.set_vertex_buffer(1, self.scratch_normals.buffer.slice(range));
                        pass.draw(0..*vertex_count, 0..1);
                    }
                }
            }
        }
        queue.submit(std::iter::once(encoder.finish()));
    }
}

fn light_direction() -> [f32; 4] {
    let dir = LIGHT_DIRECTION.normalize();
    [dir.x, dir.y, dir.z, 0.0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_rounds_up_to_the_alignment() {
        assert_eq!(aligned_stride(16, 256), 256);
        assert_eq!(aligned_stride(256, 256), 256);
        assert_eq!(aligned_stride(257, 256), 512);
        assert_eq!(aligned_stride(80, 16), 80);
    }

    #[test]
    fn uniform_layouts_match_the_shader_structs() {
        // WGSL uniform structs round their size up to 16 bytes.
        assert_eq!(mem::size_of::<CameraUniforms>() % 16, 0);
        assert_eq!(mem::size_of::<DrawUniforms>() % 16, 0);
    }
}
