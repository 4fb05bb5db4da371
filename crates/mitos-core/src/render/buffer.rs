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

//! Data structures describing GPU buffer resources.

use crate::mitos_bitflags;
use std::borrow::Cow;

mitos_bitflags! {
    /// A set of flags describing the allowed usages of a [`BufferId`].
    ///
    /// The graphics driver uses them to place the buffer in the most
    /// suitable memory type and to validate usage at runtime.
    pub struct BufferUsage: u32 {
        /// The buffer can be mapped for reading on the CPU.
        const MAP_READ = 1 << 0;
        /// The buffer can be mapped for writing on the CPU.
        const MAP_WRITE = 1 << 1;
        /// The buffer can be used as the source of a copy operation.
        const COPY_SRC = 1 << 2;
        /// The buffer can be used as the destination of a copy operation.
        const COPY_DST = 1 << 3;
        /// The buffer can be bound as a vertex buffer.
        const VERTEX = 1 << 4;
        /// The buffer can be bound as an index buffer.
        const INDEX = 1 << 5;
        /// The buffer can be bound as a uniform buffer.
        const UNIFORM = 1 << 6;
    }
}

/// A descriptor used to create a [`BufferId`].
#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    /// An optional debug label for the buffer.
    pub label: Option<Cow<'a, str>>,
    /// The total size of the buffer in bytes.
    pub size: u64,
    /// A bitmask of [`BufferUsage`] flags describing how the buffer will be used.
    pub usage: BufferUsage,
    /// If `true`, the buffer will be created in a mapped state, ready for
    /// immediate CPU access.
    pub mapped_at_creation: bool,
}

/// An opaque handle to a GPU buffer resource.
///
/// Returned by [`GraphicsDevice::create_buffer_with_data`] and used to
/// reference the buffer in all subsequent operations.
///
/// [`GraphicsDevice::create_buffer_with_data`]: crate::render::GraphicsDevice::create_buffer_with_data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub usize);

/// The pair of GPU buffers holding one chain's uploaded tube mesh.
///
/// Both buffers hold tightly packed `f32` triplets, one triplet per vertex,
/// in matching order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuTubeBuffers {
    /// Vertex positions.
    pub vertices: BufferId,
    /// Vertex normals.
    pub normals: BufferId,
    /// Number of vertices in each buffer.
    pub vertex_count: u32,
}
