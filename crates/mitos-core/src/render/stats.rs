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

//! Performance statistics for the tube render dispatcher.

/// Running counters accumulated by the dispatcher across frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// A sequential counter for rendered frames.
    pub frames: u64,
    /// Tube draws sourced from resident GPU buffers.
    pub buffer_draws: u64,
    /// Tube draws sourced from freshly built client-side arrays.
    pub client_draws: u64,
    /// End-cap draws, which always go through the client-side path.
    pub cap_draws: u64,
    /// Chains skipped because their geometry was degenerate.
    pub empty_chains: u64,
}

/// A collection of cache and draw statistics for a single rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// A sequential counter for rendered frames.
    pub frame_number: u64,
    /// Chain geometry payloads served from cache this frame.
    pub geometry_hits: u32,
    /// Chain geometry payloads rebuilt this frame.
    pub geometry_builds: u32,
    /// Tube draws served from resident GPU buffers this frame.
    pub buffer_hits: u32,
    /// Tube meshes built and uploaded this frame.
    pub buffer_uploads: u32,
    /// Tube draws streamed from client-side arrays this frame.
    pub client_draws: u32,
    /// End-cap draws this frame.
    pub cap_draws: u32,
    /// GPU buffer cache entries released this frame.
    pub evictions: u32,
}
