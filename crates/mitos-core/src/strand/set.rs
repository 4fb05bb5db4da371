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

//! Grow-only arena of strands plus the chain derivation rules.
//!
//! A chain is a maximal run of strands connected end-to-start: it begins at
//! a chain root and follows each strand's first end-side child. Every
//! strand belongs to exactly one chain because only the first end-side
//! child continues its parent's chain; later end-side children and all
//! start-side children are roots of their own chains.

use crate::math::Vec3;
use crate::strand::{Attachment, AttachmentSide, Strand, StrandId};

/// How far a newly attached strand extends past the parent endpoint when no
/// explicit end position is given.
const DEFAULT_EXTENSION: f32 = 2.0;

/// Owns every strand in a scene, keyed by [`StrandId`].
///
/// Strands are never removed, so ids stay valid for the lifetime of the
/// set and an attachment always points at a strand with a smaller id.
#[derive(Debug, Default)]
pub struct StrandSet {
    strands: Vec<Strand>,
}

impl StrandSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a free-standing strand between `start` and `end`.
    pub fn add(&mut self, start: Vec3, end: Vec3) -> StrandId {
        let id = StrandId(self.strands.len() as u32);
        self.strands.push(Strand::new(id, start, end));
        id
    }

    /// Attaches a new strand whose start is pinned to `side` of `parent`.
    ///
    /// The child inherits the parent's style and color. When `end` is
    /// `None` the child extends along the parent's outward tangent. With
    /// `continuity` the child's first control point is laid along that
    /// tangent so the joint is smooth from the start.
    ///
    /// Returns `None` when `parent` does not exist.
    pub fn attach(
        &mut self,
        parent: StrandId,
        side: AttachmentSide,
        end: Option<Vec3>,
        continuity: bool,
    ) -> Option<StrandId> {
        let (attach_point, dir, cp_dist, style, color) = {
            let parent_strand = self.get(parent)?;
            let (dir, cp_dist) = parent_strand.outward_tangent(side);
            (
                parent_strand.endpoint(side),
                dir,
                cp_dist,
                parent_strand.style,
                parent_strand.color,
            )
        };
        let end = end.unwrap_or(attach_point + dir * DEFAULT_EXTENSION);

        let id = StrandId(self.strands.len() as u32);
        let mut child = Strand::new(id, attach_point, end);
        child.style = style;
        child.color = color;
        child.attachment = Some(Attachment {
            parent,
            side,
            continuity,
        });
        if continuity {
            let length = (end - attach_point).length();
            child.control_point1 = attach_point + dir * cp_dist.max(0.33 * length);
        }
        self.strands.push(child);

        if let Some(parent_strand) = self.get_mut(parent) {
            parent_strand.children.push(id);
        }
        Some(id)
    }

    /// Looks up a strand by id.
    #[inline]
    pub fn get(&self, id: StrandId) -> Option<&Strand> {
        self.strands.get(id.index())
    }

    /// Looks up a strand for mutation.
    #[inline]
    pub fn get_mut(&mut self, id: StrandId) -> Option<&mut Strand> {
        self.strands.get_mut(id.index())
    }

    /// Number of strands in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.strands.len()
    }

    /// Whether the set holds no strands.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strands.is_empty()
    }

    /// Iterates over all strands in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Strand> {
        self.strands.iter()
    }

    /// Iterates over all ids in the set.
    pub fn ids(&self) -> impl Iterator<Item = StrandId> + '_ {
        (0..self.strands.len() as u32).map(StrandId)
    }

    /// Current `(id, version)` pairs for the given strands, skipping ids
    /// that do not resolve.
    pub fn version_stamps(&self, ids: &[StrandId]) -> Vec<(StrandId, u64)> {
        ids.iter()
            .filter_map(|&id| self.get(id).map(|s| (id, s.geometry_version())))
            .collect()
    }

    /// The child that continues `id`'s chain: its first end-side child.
    pub fn first_end_child(&self, id: StrandId) -> Option<StrandId> {
        let strand = self.get(id)?;
        strand.children.iter().copied().find(|&child| {
            self.get(child)
                .and_then(|c| c.attachment)
                .is_some_and(|a| a.side == AttachmentSide::End)
        })
    }

    /// Whether `id` begins a chain.
    ///
    /// A strand is a chain root when it has no parent, hangs off a parent's
    /// start point, or is an end-side child that some earlier sibling
    /// already continues the chain through.
    pub fn is_chain_root(&self, id: StrandId) -> bool {
        match self.get(id).and_then(|s| s.attachment) {
            None => true,
            Some(att) => {
                att.side == AttachmentSide::Start || self.first_end_child(att.parent) != Some(id)
            }
        }
    }

    /// All chain roots in id order.
    pub fn chain_roots(&self) -> Vec<StrandId> {
        self.ids().filter(|&id| self.is_chain_root(id)).collect()
    }

    /// The member strands of the chain starting at `root`, in order.
    pub fn chain_of(&self, root: StrandId) -> Vec<StrandId> {
        let mut chain = Vec::new();
        let mut current = Some(root);
        while let Some(id) = current {
            if chain.len() >= self.strands.len() {
                break;
            }
            chain.push(id);
            current = self.first_end_child(id);
        }
        chain
    }

    /// The root of the chain that `id` belongs to.
    pub fn chain_root_of(&self, id: StrandId) -> StrandId {
        let mut current = id;
        for _ in 0..self.strands.len() {
            if self.is_chain_root(current) {
                return current;
            }
            match self.get(current).and_then(|s| s.attachment) {
                Some(att) => current = att.parent,
                None => return current,
            }
        }
        current
    }
}
