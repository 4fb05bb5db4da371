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

//! # Mitos Core
//!
//! Geometry, caching, and dirty-propagation engine for chains of tube-shaped
//! strands edited interactively in 3D.
//!
//! The crate is organized around a single invariant: a strand's
//! `geometry_version` counter changes if and only if its control points,
//! topology, or twist changed. Every cache in the engine embeds the version
//! in its key, so a stale payload can never be returned. At worst a key
//! mismatch forces a rebuild.

#![warn(missing_docs)]

pub mod cache;
pub mod error;
pub mod geometry;
pub mod math;
pub mod render;
pub mod scene;
pub mod strand;
pub mod utils;

pub use scene::StrandScene;
