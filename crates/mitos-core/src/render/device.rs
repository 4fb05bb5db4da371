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

//! The backend-agnostic graphics device abstraction.

use std::fmt::Debug;

use crate::error::{RenderError, ResourceError};
use crate::math::LinearRgba;
use crate::render::buffer::{BufferDescriptor, BufferId, GpuTubeBuffers};

/// The graphics API backend a device runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GraphicsBackendType {
    /// Vulkan API.
    Vulkan,
    /// Apple's Metal API.
    Metal,
    /// Microsoft's DirectX 12 API.
    Dx12,
    /// OpenGL API.
    OpenGL,
    /// WebGPU API (for web builds).
    WebGpu,
    /// An unknown or unsupported backend.
    #[default]
    Unknown,
}

/// The physical type of a graphics device (GPU).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RendererDeviceType {
    /// A GPU integrated into the CPU.
    IntegratedGpu,
    /// A discrete, dedicated GPU.
    DiscreteGpu,
    /// A virtualized or software-based GPU.
    VirtualGpu,
    /// A software renderer running on the CPU.
    Cpu,
    /// An unknown or unsupported device type.
    #[default]
    Unknown,
}

/// Provides standardized, backend-agnostic information about the graphics adapter.
#[derive(Debug, Clone, Default)]
pub struct AdapterInfo {
    /// The name of the adapter (e.g., "NVIDIA GeForce RTX 4090").
    pub name: String,
    /// The graphics API backend this adapter is associated with.
    pub backend_type: GraphicsBackendType,
    /// The physical type of the adapter.
    pub device_type: RendererDeviceType,
}

/// The minimal device surface the tube renderer needs: buffer lifetime
/// management plus two draw paths, one for resident GPU buffers and one for
/// transient client-side arrays.
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    /// Creates a new GPU buffer and initializes it with the provided data.
    /// ## Arguments
    /// * `descriptor` - A reference to a `BufferDescriptor` containing the buffer configuration.
    /// * `data` - A slice of bytes containing the initial data for the buffer.
    /// ## Returns
    /// A `Result` containing the ID of the created buffer or an error if the creation fails.
    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError>;

    /// Destroys a GPU buffer.
    /// ## Arguments
    /// * `id` - The ID of the buffer to be destroyed.
    /// ## Returns
    /// A `Result` indicating success or failure of the operation.
    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError>;

    /// Draws one tube from buffers resident in GPU memory.
    /// ## Arguments
    /// * `buffers` - The uploaded vertex and normal buffers to source from.
    /// * `color` - The flat color the tube is shaded with.
    /// ## Returns
    /// A `Result` indicating success or failure of the draw.
    fn draw_buffers(&self, buffers: &GpuTubeBuffers, color: LinearRgba) -> Result<(), RenderError>;

    /// Draws one tube directly from client-side arrays, without any upload.
    ///
    /// This is the path for geometry that will change again next frame,
    /// where an upload would be wasted work.
    /// ## Arguments
    /// * `vertices` - Vertex positions as tightly packed `f32` triplets.
    /// * `normals` - Vertex normals matching `vertices` in length and order.
    /// * `color` - The flat color the tube is shaded with.
    /// ## Returns
    /// A `Result` indicating success or failure of the draw.
    fn draw_client_arrays(
        &self,
        vertices: &[f32],
        normals: &[f32],
        color: LinearRgba,
    ) -> Result<(), RenderError>;

    /// Get the adapter information of the rendering device.
    fn adapter_info(&self) -> AdapterInfo;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A mock graphics device that produces unique resource IDs and counts
    /// every call for assertions.
    #[derive(Debug)]
    pub(crate) struct MockGraphicsDevice {
        next_id: AtomicUsize,
        created: AtomicUsize,
        destroyed: AtomicUsize,
        buffer_draws: AtomicUsize,
        client_draws: AtomicUsize,
    }

    impl MockGraphicsDevice {
        pub(crate) fn new() -> Self {
            Self {
                next_id: AtomicUsize::new(1),
                created: AtomicUsize::new(0),
                destroyed: AtomicUsize::new(0),
                buffer_draws: AtomicUsize::new(0),
                client_draws: AtomicUsize::new(0),
            }
        }

        fn next(&self) -> usize {
            self.next_id.fetch_add(1, Ordering::Relaxed)
        }

        pub(crate) fn created(&self) -> usize {
            self.created.load(Ordering::Relaxed)
        }

        pub(crate) fn destroyed(&self) -> usize {
            self.destroyed.load(Ordering::Relaxed)
        }

        pub(crate) fn live_buffers(&self) -> usize {
            self.created() - self.destroyed()
        }

        pub(crate) fn buffer_draws(&self) -> usize {
            self.buffer_draws.load(Ordering::Relaxed)
        }

        pub(crate) fn client_draws(&self) -> usize {
            self.client_draws.load(Ordering::Relaxed)
        }
    }

    impl GraphicsDevice for MockGraphicsDevice {
        fn create_buffer_with_data(
            &self,
            _descriptor: &BufferDescriptor,
            _data: &[u8],
        ) -> Result<BufferId, ResourceError> {
            self.created.fetch_add(1, Ordering::Relaxed);
            Ok(BufferId(self.next()))
        }

        fn destroy_buffer(&self, _id: BufferId) -> Result<(), ResourceError> {
            self.destroyed.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        fn draw_buffers(
            &self,
            _buffers: &GpuTubeBuffers,
            _color: LinearRgba,
        ) -> Result<(), RenderError> {
            self.buffer_draws.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        fn draw_client_arrays(
            &self,
            _vertices: &[f32],
            _normals: &[f32],
            _color: LinearRgba,
        ) -> Result<(), RenderError> {
            self.client_draws.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        fn adapter_info(&self) -> AdapterInfo {
            AdapterInfo {
                name: "Mock".to_string(),
                backend_type: GraphicsBackendType::Unknown,
                device_type: RendererDeviceType::Cpu,
            }
        }
    }

    #[test]
    fn mock_device_hands_out_unique_ids_and_counts_calls() {
        let device = MockGraphicsDevice::new();
        let descriptor = BufferDescriptor {
            label: None,
            size: 16,
            usage: crate::render::buffer::BufferUsage::VERTEX,
            mapped_at_creation: false,
        };
        let a = device.create_buffer_with_data(&descriptor, &[0u8; 16]).unwrap();
        let b = device.create_buffer_with_data(&descriptor, &[0u8; 16]).unwrap();
        assert_ne!(a, b);
        assert_eq!(device.created(), 2);

        device.destroy_buffer(a).unwrap();
        assert_eq!(device.live_buffers(), 1);
    }
}
