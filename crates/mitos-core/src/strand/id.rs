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

//! Stable strand identity.

use serde::{Deserialize, Serialize};

/// A unique, stable identifier for a strand within a [`StrandSet`].
///
/// Ids are assigned at creation and never reused, so an id plus a geometry
/// version forms a portable cache-key component. Identity never depends on
/// where a strand happens to live in memory.
///
/// [`StrandSet`]: crate::strand::StrandSet
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct StrandId(pub u32);

impl StrandId {
    /// The arena slot this id refers to.
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for StrandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "strand#{}", self.0)
    }
}
