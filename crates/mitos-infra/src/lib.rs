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

//! # Mitos Infra
//!
//! Concrete backend implementations for the Mitos strand engine.
//!
//! The crate supplies the wgpu implementation of
//! [`mitos_core::render::GraphicsDevice`]: a headless device that uploads
//! tube meshes into resident vertex buffers, streams drag geometry through
//! persistent scratch buffers, and renders every recorded draw into an
//! offscreen target when the caller presents the frame.

#![warn(missing_docs)]

#[cfg(feature = "graphics")]
pub mod graphics;

#[cfg(feature = "graphics")]
pub use graphics::wgpu::{WgpuHeadlessContext, WgpuTubeDevice};
