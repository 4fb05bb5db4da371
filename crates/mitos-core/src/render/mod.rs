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

//! Rendering: the device abstraction, buffer handles, and the per-frame
//! dispatcher that decides between resident GPU buffers and transient
//! client-side arrays.
//!
//! The interaction mode is an explicit parameter on every dispatch call,
//! never ambient state, so the caches stay testable in isolation.

pub mod buffer;
pub mod device;
pub mod dispatcher;
pub mod stats;

pub use buffer::{BufferDescriptor, BufferId, BufferUsage, GpuTubeBuffers};
pub use device::{AdapterInfo, GraphicsBackendType, GraphicsDevice, RendererDeviceType};
pub use dispatcher::RenderDispatcher;
pub use stats::{FrameStats, RenderStats};

/// The interaction mode a frame is rendered under.
///
/// Steady frames may upload geometry to the GPU and keep the buffer cache
/// tight. Dragging frames never upload: chains whose key changed this frame
/// draw from client-side arrays, because they will change again next frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderMode {
    /// No drag gesture is active; geometry is stable between frames.
    #[default]
    Steady,
    /// A drag gesture is in flight; the edited chain changes every frame.
    Dragging,
}
