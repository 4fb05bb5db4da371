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

//! The wgpu implementation of the tube renderer's graphics device.
//!
//! [`WgpuHeadlessContext`] owns the instance, adapter, logical device, and
//! the offscreen color and depth target. [`WgpuTubeDevice`] layers the
//! buffer registry, the lit tube pipeline, and per-frame draw recording on
//! top of it.

mod context;
mod conversions;
mod device;
mod pipeline;

pub use context::WgpuHeadlessContext;
pub use device::WgpuTubeDevice;
