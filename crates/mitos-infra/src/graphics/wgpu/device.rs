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

//! The wgpu-backed [`GraphicsDevice`] implementation.

use std::collections::HashMap;
use std::mem;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use mitos_core::error::{RenderError, ResourceError};
use mitos_core::math::{LinearRgba, Vec3};
use mitos_core::render::{AdapterInfo, BufferDescriptor, BufferId, GpuTubeBuffers, GraphicsDevice};
use wgpu::util::DeviceExt;

use super::context::WgpuHeadlessContext;
use super::conversions::{from_wgpu_backend, from_wgpu_device_type, IntoWgpu};
use super::pipeline::{FrameRecorder, RecordedTube, TubePipeline};

/// Default viewer position of a freshly created device.
const DEFAULT_CAMERA_EYE: Vec3 = Vec3 {
    x: 7.0,
    y: 5.0,
    z: 9.0,
};

#[derive(Debug)]
struct WgpuBufferEntry {
    wgpu_buffer: Arc<wgpu::Buffer>,
    size: u64, // To track VRAM accurately on destruction
}

/// A headless wgpu implementation of [`GraphicsDevice`].
///
/// Uploaded tube meshes live in a registry of resident `wgpu::Buffer`s keyed
/// by opaque [`BufferId`]s. Draw calls are recorded per frame and flushed in
/// one render pass by [`present`](WgpuTubeDevice::present); until then a
/// recorded draw holds its buffers alive even if the caller destroys them
/// mid-frame.
#[derive(Debug)]
pub struct WgpuTubeDevice {
    context: Arc<WgpuHeadlessContext>,
    pipeline: Mutex<TubePipeline>,
    buffers: Mutex<HashMap<BufferId, WgpuBufferEntry>>,
    next_buffer_id: AtomicUsize,

    // VRAM Tracking
    vram_allocated_bytes: AtomicUsize,
    vram_peak_bytes: AtomicU64,

    frame: Mutex<FrameRecorder>,
}

impl WgpuTubeDevice {
    /// Creates a device on top of an already initialized context.
    pub fn new(context: Arc<WgpuHeadlessContext>) -> Self {
        let pipeline = TubePipeline::new(&context);
        pipeline.set_camera(&context, DEFAULT_CAMERA_EYE, Vec3::ZERO);

        Self {
            context,
            pipeline: Mutex::new(pipeline),
            buffers: Mutex::new(HashMap::new()),
            next_buffer_id: AtomicUsize::new(0),
            vram_allocated_bytes: AtomicUsize::new(0),
            vram_peak_bytes: AtomicU64::new(0),
            frame: Mutex::new(FrameRecorder::default()),
        }
    }

    /// Initializes a headless context of the given size and creates a device
    /// on it, blocking on the adapter and device requests.
    ///
    /// ## Arguments
    /// * `width` - The width of the offscreen render target in pixels.
    /// * `height` - The height of the offscreen render target in pixels.
    ///
    /// ## Returns
    /// * `Result<Self, RenderError>` - The device, or the initialization
    ///   failure bubbled up from the context.
    pub fn create_headless(width: u32, height: u32) -> Result<Self, RenderError> {
        let context = pollster::block_on(WgpuHeadlessContext::new(width, height))?;
        Ok(Self::new(Arc::new(context)))
    }

    /// Returns the underlying headless context.
    pub fn context(&self) -> &WgpuHeadlessContext {
        &self.context
    }

    /// Moves the viewer camera. A degenerate frame is logged and ignored.
    pub fn set_camera(&self, eye: Vec3, target: Vec3) -> Result<(), RenderError> {
        let pipeline = self.pipeline.lock().map_err(|e| {
            RenderError::RenderingFailed(format!("Mutex poisoned (pipeline): {e}"))
        })?;
        pipeline.set_camera(&self.context, eye, target);
        Ok(())
    }

    /// Flushes every draw recorded since the last present into the offscreen
    /// target and submits the frame to the GPU.
    pub fn present(&self) -> Result<(), RenderError> {
        let frame = {
            let mut guard = self.frame.lock().map_err(|e| {
                RenderError::RenderingFailed(format!("Mutex poisoned (frame): {e}"))
            })?;
            mem::take(&mut *guard)
        };
        let mut pipeline = self.pipeline.lock().map_err(|e| {
            RenderError::RenderingFailed(format!("Mutex poisoned (pipeline): {e}"))
        })?;
        pipeline.render(&self.context, frame);
        Ok(())
    }

    /// Returns the number of bytes currently resident in registered buffers.
    pub fn vram_allocated_bytes(&self) -> usize {
        self.vram_allocated_bytes.load(Ordering::Relaxed)
    }

    /// Returns the largest number of resident bytes seen so far.
    pub fn vram_peak_bytes(&self) -> u64 {
        self.vram_peak_bytes.load(Ordering::Relaxed)
    }

    fn generate_buffer_id(&self) -> BufferId {
        BufferId(self.next_buffer_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl GraphicsDevice for WgpuTubeDevice {
    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        let wgpu_buffer =
            self.context
                .device()
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: descriptor.label.as_deref(),
                    contents: data,
                    usage: descriptor.usage.into_wgpu(),
                });

        let id = self.generate_buffer_id();
        let buffer_size = data.len() as u64;

        // Track VRAM usage
        self.vram_allocated_bytes
            .fetch_add(buffer_size as usize, Ordering::Relaxed);
        let current_vram = self.vram_allocated_bytes.load(Ordering::Relaxed) as u64;
        self.vram_peak_bytes.fetch_max(current_vram, Ordering::Relaxed);

        let mut buffers = self
            .buffers
            .lock()
            .map_err(|e| ResourceError::BackendError(format!("Mutex poisoned (buffers): {e}")))?;
        buffers.insert(
            id,
            WgpuBufferEntry {
                wgpu_buffer: Arc::new(wgpu_buffer),
                size: buffer_size,
            },
        );

        log::info!(
            "WgpuTubeDevice: Created buffer '{:?}' with initial data. ID: {:?}, size: {} bytes",
            descriptor.label.as_deref().unwrap_or_default(),
            id,
            buffer_size
        );
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        let mut buffers = self
            .buffers
            .lock()
            .map_err(|e| ResourceError::BackendError(format!("Mutex poisoned (buffers): {e}")))?;

        // Remove the buffer from the map and track VRAM usage
        if let Some(entry) = buffers.remove(&id) {
            self.vram_allocated_bytes
                .fetch_sub(entry.size as usize, Ordering::Relaxed);
            log::debug!("WgpuTubeDevice: Destroyed buffer with ID: {id:?}");
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }

    fn draw_buffers(&self, buffers: &GpuTubeBuffers, color: LinearRgba) -> Result<(), RenderError> {
        let registry = self
            .buffers
            .lock()
            .map_err(|e| RenderError::RenderingFailed(format!("Mutex poisoned (buffers): {e}")))?;
        let vertices = registry
            .get(&buffers.vertices)
            .map(|entry| Arc::clone(&entry.wgpu_buffer))
            .ok_or(ResourceError::NotFound)?;
        let normals = registry
            .get(&buffers.normals)
            .map(|entry| Arc::clone(&entry.wgpu_buffer))
            .ok_or(ResourceError::NotFound)?;
        drop(registry);

        let mut frame = self
            .frame
            .lock()
            .map_err(|e| RenderError::RenderingFailed(format!("Mutex poisoned (frame): {e}")))?;
        frame.draws.push(RecordedTube::Resident {
            vertices,
            normals,
            vertex_count: buffers.vertex_count,
            color,
        });
        Ok(())
    }

    fn draw_client_arrays(
        &self,
        vertices: &[f32],
        normals: &[f32],
        color: LinearRgba,
    ) -> Result<(), RenderError> {
        if vertices.len() != normals.len() || vertices.len() % 3 != 0 {
            return Err(RenderError::RenderingFailed(format!(
                "Client arrays must hold matching f32 triplets, got {} positions and {} normals",
                vertices.len(),
                normals.len()
            )));
        }

        let mut frame = self
            .frame
            .lock()
            .map_err(|e| RenderError::RenderingFailed(format!("Mutex poisoned (frame): {e}")))?;
        let byte_offset = frame.stream_vertices.len() as u64;
        frame
            .stream_vertices
            .extend_from_slice(bytemuck::cast_slice(vertices));
        frame
            .stream_normals
            .extend_from_slice(bytemuck::cast_slice(normals));
        frame.draws.push(RecordedTube::Streamed {
            byte_offset,
            byte_len: (vertices.len() * mem::size_of::<f32>()) as u64,
            vertex_count: (vertices.len() / 3) as u32,
            color,
        });
        Ok(())
    }

    fn adapter_info(&self) -> AdapterInfo {
        AdapterInfo {
            name: self.context.adapter_name.clone(),
            backend_type: from_wgpu_backend(self.context.adapter_backend),
            device_type: from_wgpu_device_type(self.context.adapter_device_type),
        }
    }
}
