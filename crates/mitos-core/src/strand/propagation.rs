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

//! Dirty propagation across attachment links.
//!
//! Every public operation applies one user edit, cascades its geometric
//! consequences through the attachment forest, and returns a [`DirtyWave`]
//! listing each affected strand exactly once. Two per-wave sets enforce
//! that: a visited set caps marking at once per strand, and a control-point
//! write set resolves competing continuity writes to the same slot under
//! the configured [`ContinuityConflict`] policy.

use std::collections::HashSet;

use crate::math::Vec3;
use crate::strand::set::StrandSet;
use crate::strand::{Attachment, AttachmentSide, ControlSlot, StrandId};

/// Shortest a glued strand may get when its free end is dragged toward the
/// joint.
const MIN_ATTACHED_LENGTH: f32 = 0.5;

/// Floor for realigned control-point distances, as a fraction of the
/// strand's chord.
const MIN_CP_FRACTION: f32 = 0.33;

/// What happens when two continuity syncs in one wave want to write the
/// same control point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContinuityConflict {
    /// The first write in the wave sticks; later syncs leave it alone. The
    /// initiating user edit counts as the first write, so it is never
    /// overwritten.
    #[default]
    FirstWins,
    /// Later syncs overwrite earlier writes, so every constrained control
    /// point ends up consistent with the final tangent of its parent.
    LastWins,
}

/// The outcome of one propagation wave: the strands whose geometry version
/// was bumped, in marking order, each listed exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtyWave {
    marked: Vec<StrandId>,
}

impl DirtyWave {
    /// A wave covering exactly one strand whose version was already bumped.
    pub(crate) fn single(id: StrandId) -> Self {
        Self { marked: vec![id] }
    }

    /// The marked strands in the order the wave reached them.
    #[inline]
    pub fn marked(&self) -> &[StrandId] {
        &self.marked
    }

    /// Whether the wave reached `id`.
    #[inline]
    pub fn contains(&self, id: StrandId) -> bool {
        self.marked.contains(&id)
    }

    /// Number of strands the wave marked.
    #[inline]
    pub fn len(&self) -> usize {
        self.marked.len()
    }

    /// Whether the wave marked nothing.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.marked.is_empty()
    }
}

/// Per-wave bookkeeping while a cascade runs.
#[derive(Default)]
struct WaveState {
    visited: HashSet<StrandId>,
    cp_written: HashSet<(StrandId, ControlSlot)>,
    marked: Vec<StrandId>,
}

impl WaveState {
    /// Marks `id`, returning `false` when the wave already reached it.
    fn mark(&mut self, id: StrandId) -> bool {
        if self.visited.insert(id) {
            self.marked.push(id);
            true
        } else {
            false
        }
    }

    fn is_visited(&self, id: StrandId) -> bool {
        self.visited.contains(&id)
    }

    /// Claims a first write on a control point without contesting it.
    fn record_cp(&mut self, id: StrandId, slot: ControlSlot) {
        self.cp_written.insert((id, slot));
    }

    /// Whether a continuity sync may write this control point now.
    fn try_write_cp(&mut self, id: StrandId, slot: ControlSlot, policy: ContinuityConflict) -> bool {
        if self.cp_written.insert((id, slot)) {
            return true;
        }
        matches!(policy, ContinuityConflict::LastWins)
    }

    fn finish(self) -> DirtyWave {
        DirtyWave {
            marked: self.marked,
        }
    }
}

/// Applies edits to a [`StrandSet`] and cascades them through attachments.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirtyPropagator {
    conflict: ContinuityConflict,
}

impl DirtyPropagator {
    /// Creates a propagator with the given conflict policy.
    pub fn new(conflict: ContinuityConflict) -> Self {
        Self { conflict }
    }

    /// The active conflict policy.
    #[inline]
    pub fn conflict(&self) -> ContinuityConflict {
        self.conflict
    }

    /// Moves one endpoint of a strand and cascades to everything glued to
    /// it.
    ///
    /// A free strand's endpoint moves exactly where asked, carrying along
    /// any control point that coincided with it. A glued strand's end is
    /// clamped to keep at least [`MIN_ATTACHED_LENGTH`] from the joint and
    /// drags its second control point by the same delta. Moving a glued
    /// strand's start is redirected to the parent endpoint owning the
    /// joint, so the whole junction travels together.
    pub fn move_endpoint(
        &self,
        set: &mut StrandSet,
        id: StrandId,
        side: AttachmentSide,
        position: Vec3,
    ) -> DirtyWave {
        let mut wave = WaveState::default();
        let attachment = match set.get(id) {
            Some(strand) => strand.attachment(),
            None => return wave.finish(),
        };

        let final_position = match (attachment, side) {
            (Some(att), AttachmentSide::Start) => {
                // Parent ids are strictly smaller than child ids, so the
                // redirect chain cannot loop.
                log::debug!("redirecting start move of {id} to joint owner {}", att.parent);
                return self.move_endpoint(set, att.parent, att.side, position);
            }
            (Some(_), AttachmentSide::End) => {
                match set.get_mut(id) {
                    Some(strand) => {
                        let start = strand.start;
                        let mut target = position;
                        let offset = target - start;
                        let len = offset.length();
                        if len < MIN_ATTACHED_LENGTH {
                            let dir = if len > 1e-6 {
                                offset / len
                            } else {
                                let old = strand.end - start;
                                let old_len = old.length();
                                if old_len > 1e-6 {
                                    old / old_len
                                } else {
                                    Vec3::X
                                }
                            };
                            target = start + dir * MIN_ATTACHED_LENGTH;
                        }
                        // The free end drags its adjacent control point so
                        // the curve keeps its local shape near the tip.
                        let delta = target - strand.end;
                        strand.control_point2 = strand.control_point2 + delta;
                        strand.end = target;
                        strand.mark_dirty();
                        wave.mark(id);
                        target
                    }
                    None => return wave.finish(),
                }
            }
            (None, _) => {
                if let Some(strand) = set.get_mut(id) {
                    strand.set_endpoint(side, position);
                }
                wave.mark(id);
                position
            }
        };

        self.cascade_endpoint(set, id, side, final_position, &mut wave);
        self.align_continuity_children(set, id, side, &mut wave);
        wave.finish()
    }

    /// Moves one interior control point and syncs every continuity link it
    /// participates in.
    pub fn move_control_point(
        &self,
        set: &mut StrandSet,
        id: StrandId,
        slot: ControlSlot,
        position: Vec3,
    ) -> DirtyWave {
        let mut wave = WaveState::default();
        match set.get_mut(id) {
            Some(strand) => strand.set_control_point(slot, position),
            None => return wave.finish(),
        }
        wave.mark(id);
        wave.record_cp(id, slot);

        // The edited control point shapes the tangent at its adjacent
        // endpoint, so continuity children glued there realign.
        let side = match slot {
            ControlSlot::Cp1 => AttachmentSide::Start,
            ControlSlot::Cp2 => AttachmentSide::End,
        };
        self.align_continuity_children(set, id, side, &mut wave);

        // Editing the constrained control point of a continuity child
        // steers the parent instead of breaking the link.
        if slot == ControlSlot::Cp1 {
            let attachment = set.get(id).and_then(|s| s.attachment());
            if let Some(att) = attachment {
                if att.continuity {
                    self.sync_parent_tangent(set, id, att, &mut wave);
                }
            }
        }
        wave.finish()
    }

    /// Translates a free strand and its whole attached subtree by `delta`.
    ///
    /// Translation preserves every joint and tangent, so no continuity
    /// realignment is needed. Glued strands cannot be translated directly;
    /// they follow their root.
    pub fn move_strand(&self, set: &mut StrandSet, id: StrandId, delta: Vec3) -> DirtyWave {
        let mut wave = WaveState::default();
        match set.get(id) {
            Some(strand) => {
                if strand.attachment().is_some() {
                    log::debug!("ignoring translate of {id}: glued strands follow their root");
                    return wave.finish();
                }
            }
            None => return wave.finish(),
        }
        self.translate_subtree(set, id, delta, &mut wave);
        wave.finish()
    }

    /// Bumps one strand's version without a geometric edit, as a one-strand
    /// wave.
    pub fn touch(&self, set: &mut StrandSet, id: StrandId) -> DirtyWave {
        let mut wave = WaveState::default();
        if let Some(strand) = set.get_mut(id) {
            strand.mark_dirty();
            wave.mark(id);
        }
        wave.finish()
    }

    /// Resets a strand's control points onto its chord and resyncs every
    /// continuity link watching those tangents.
    pub fn straighten(&self, set: &mut StrandSet, id: StrandId) -> DirtyWave {
        let mut wave = WaveState::default();
        match set.get_mut(id) {
            Some(strand) => strand.make_straight(),
            None => return wave.finish(),
        }
        wave.mark(id);
        wave.record_cp(id, ControlSlot::Cp1);
        wave.record_cp(id, ControlSlot::Cp2);

        // Both end tangents changed, so continuity children on either side
        // realign, and a continuity parent is steered like a cp1 edit.
        self.align_continuity_children(set, id, AttachmentSide::Start, &mut wave);
        self.align_continuity_children(set, id, AttachmentSide::End, &mut wave);
        let attachment = set.get(id).and_then(|s| s.attachment());
        if let Some(att) = attachment {
            if att.continuity {
                self.sync_parent_tangent(set, id, att, &mut wave);
            }
        }
        wave.finish()
    }

    /// Pins the starts of children glued at `side` of `id` to `position`,
    /// recursing through grandchildren glued to those starts.
    fn cascade_endpoint(
        &self,
        set: &mut StrandSet,
        id: StrandId,
        side: AttachmentSide,
        position: Vec3,
        wave: &mut WaveState,
    ) {
        let children = children_at_side(set, id, side);
        for child in children {
            if wave.is_visited(child) {
                continue;
            }
            if let Some(strand) = set.get_mut(child) {
                strand.set_endpoint(AttachmentSide::Start, position);
            }
            wave.mark(child);
            log::trace!("{child} start follows joint to {position:?}");
            self.cascade_endpoint(set, child, AttachmentSide::Start, position, wave);
            self.align_continuity_children(set, child, AttachmentSide::Start, wave);
        }
    }

    /// Realigns the first control point of every continuity child glued at
    /// `side` of `id` with the parent's current outward tangent there,
    /// cascading down the forest.
    fn align_continuity_children(
        &self,
        set: &mut StrandSet,
        id: StrandId,
        side: AttachmentSide,
        wave: &mut WaveState,
    ) {
        let (joint, dir, cp_dist) = match set.get(id) {
            Some(strand) => {
                let (dir, cp_dist) = strand.outward_tangent(side);
                (strand.endpoint(side), dir, cp_dist)
            }
            None => return,
        };

        let children = continuity_children_at_side(set, id, side);
        for child in children {
            if !wave.try_write_cp(child, ControlSlot::Cp1, self.conflict) {
                continue;
            }
            if let Some(strand) = set.get_mut(child) {
                let length = (strand.end - strand.start).length();
                strand.control_point1 = joint + dir * cp_dist.max(MIN_CP_FRACTION * length);
                strand.mark_dirty();
            }
            wave.mark(child);
            // The child's own start tangent changed with its first control
            // point, so continuity grandchildren glued at its start follow.
            self.align_continuity_children(set, child, AttachmentSide::Start, wave);
        }
    }

    /// Steers the parent's adjacent control point so its tangent at the
    /// joint stays collinear with the child's edited start tangent, then
    /// realigns the parent's other continuity children on that side.
    fn sync_parent_tangent(
        &self,
        set: &mut StrandSet,
        child: StrandId,
        att: Attachment,
        wave: &mut WaveState,
    ) {
        let dir = match set.get(child) {
            Some(strand) => {
                let offset = strand.control_point1 - strand.start;
                let len = offset.length();
                if len <= 1e-6 {
                    return;
                }
                offset / len
            }
            None => return,
        };

        let slot = match att.side {
            AttachmentSide::Start => ControlSlot::Cp1,
            AttachmentSide::End => ControlSlot::Cp2,
        };
        if !wave.try_write_cp(att.parent, slot, self.conflict) {
            return;
        }
        if let Some(parent) = set.get_mut(att.parent) {
            let (anchor, current) = match att.side {
                AttachmentSide::Start => (parent.start, parent.start - parent.control_point1),
                AttachmentSide::End => (parent.end, parent.end - parent.control_point2),
            };
            let chord = (parent.end - parent.start).length();
            let dist = current.length().max(MIN_CP_FRACTION * chord);
            let value = anchor - dir * dist;
            match slot {
                ControlSlot::Cp1 => parent.control_point1 = value,
                ControlSlot::Cp2 => parent.control_point2 = value,
            }
            parent.mark_dirty();
        } else {
            return;
        }
        wave.mark(att.parent);
        self.align_continuity_children(set, att.parent, att.side, wave);
    }

    fn translate_subtree(
        &self,
        set: &mut StrandSet,
        id: StrandId,
        delta: Vec3,
        wave: &mut WaveState,
    ) {
        if !wave.mark(id) {
            return;
        }
        if let Some(strand) = set.get_mut(id) {
            strand.translate(delta);
        }
        let children = match set.get(id) {
            Some(strand) => strand.children().to_vec(),
            None => Vec::new(),
        };
        for child in children {
            self.translate_subtree(set, child, delta, wave);
        }
    }
}

fn children_at_side(set: &StrandSet, id: StrandId, side: AttachmentSide) -> Vec<StrandId> {
    match set.get(id) {
        Some(strand) => strand
            .children()
            .iter()
            .copied()
            .filter(|&child| {
                set.get(child)
                    .and_then(|c| c.attachment())
                    .is_some_and(|a| a.side == side)
            })
            .collect(),
        None => Vec::new(),
    }
}

fn continuity_children_at_side(set: &StrandSet, id: StrandId, side: AttachmentSide) -> Vec<StrandId> {
    match set.get(id) {
        Some(strand) => strand
            .children()
            .iter()
            .copied()
            .filter(|&child| {
                set.get(child)
                    .and_then(|c| c.attachment())
                    .is_some_and(|a| a.side == side && a.continuity)
            })
            .collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::approx_eq_eps;

    fn vec3_close(a: Vec3, b: Vec3) -> bool {
        approx_eq_eps(a.x, b.x, 1e-4) && approx_eq_eps(a.y, b.y, 1e-4) && approx_eq_eps(a.z, b.z, 1e-4)
    }

    fn root_set() -> (StrandSet, StrandId) {
        let mut set = StrandSet::new();
        let root = set.add(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0));
        (set, root)
    }

    #[test]
    fn free_endpoint_move_marks_only_that_strand() {
        let (mut set, root) = root_set();
        let propagator = DirtyPropagator::default();

        let wave = propagator.move_endpoint(
            &mut set,
            root,
            AttachmentSide::End,
            Vec3::new(3.0, 1.0, 0.0),
        );
        assert_eq!(wave.marked(), &[root]);
        assert_eq!(set.get(root).unwrap().end(), Vec3::new(3.0, 1.0, 0.0));
        assert_eq!(set.get(root).unwrap().geometry_version(), 2);
    }

    #[test]
    fn pinned_children_follow_the_moved_joint() {
        let (mut set, root) = root_set();
        let child = set.attach(root, AttachmentSide::End, None, false).unwrap();
        let grandchild = set
            .attach(child, AttachmentSide::Start, None, false)
            .unwrap();
        let propagator = DirtyPropagator::default();

        let target = Vec3::new(2.0, 2.0, 0.0);
        let wave = propagator.move_endpoint(&mut set, root, AttachmentSide::End, target);

        assert_eq!(wave.marked(), &[root, child, grandchild]);
        assert_eq!(set.get(root).unwrap().end(), target);
        assert_eq!(set.get(child).unwrap().start(), target);
        assert_eq!(set.get(grandchild).unwrap().start(), target);
    }

    #[test]
    fn glued_end_moves_are_clamped_to_the_minimum_length() {
        let (mut set, root) = root_set();
        let child = set.attach(root, AttachmentSide::End, None, false).unwrap();
        let propagator = DirtyPropagator::default();

        // Drag the free end almost onto the joint at (2, 0, 0).
        let wave = propagator.move_endpoint(
            &mut set,
            child,
            AttachmentSide::End,
            Vec3::new(2.1, 0.0, 0.0),
        );
        assert_eq!(wave.marked(), &[child]);

        let strand = set.get(child).unwrap();
        let length = (strand.end() - strand.start()).length();
        assert!(approx_eq_eps(length, MIN_ATTACHED_LENGTH, 1e-5));
    }

    #[test]
    fn glued_end_moves_drag_the_adjacent_control_point() {
        let (mut set, root) = root_set();
        let child = set.attach(root, AttachmentSide::End, None, false).unwrap();
        let cp2_before = set.get(child).unwrap().control_point2();
        let end_before = set.get(child).unwrap().end();
        let propagator = DirtyPropagator::default();

        let target = Vec3::new(4.0, 3.0, 0.0);
        propagator.move_endpoint(&mut set, child, AttachmentSide::End, target);

        let strand = set.get(child).unwrap();
        assert!(vec3_close(
            strand.control_point2(),
            cp2_before + (target - end_before)
        ));
    }

    #[test]
    fn glued_start_moves_redirect_to_the_joint_owner() {
        let (mut set, root) = root_set();
        let child = set.attach(root, AttachmentSide::End, None, false).unwrap();
        let propagator = DirtyPropagator::default();

        let target = Vec3::new(3.0, 1.0, 0.0);
        let wave = propagator.move_endpoint(&mut set, child, AttachmentSide::Start, target);

        // The drag lands on the parent's end and the joint travels whole.
        assert_eq!(wave.marked(), &[root, child]);
        assert_eq!(set.get(root).unwrap().end(), target);
        assert_eq!(set.get(child).unwrap().start(), target);
    }

    #[test]
    fn redirected_start_moves_climb_through_stacked_joints() {
        let (mut set, root) = root_set();
        let child = set.attach(root, AttachmentSide::End, None, false).unwrap();
        let grandchild = set
            .attach(child, AttachmentSide::Start, None, false)
            .unwrap();
        let propagator = DirtyPropagator::default();

        let target = Vec3::new(2.0, -2.0, 0.0);
        let wave = propagator.move_endpoint(&mut set, grandchild, AttachmentSide::Start, target);

        // Grandchild hangs on the same joint, so the move still lands on
        // the root's end and comes back down to both children.
        assert!(wave.contains(root));
        assert!(wave.contains(child));
        assert!(wave.contains(grandchild));
        assert_eq!(set.get(root).unwrap().end(), target);
        assert_eq!(set.get(child).unwrap().start(), target);
        assert_eq!(set.get(grandchild).unwrap().start(), target);
    }

    #[test]
    fn continuity_children_realign_when_the_parent_tangent_turns() {
        let (mut set, root) = root_set();
        let child = set
            .attach(
                root,
                AttachmentSide::End,
                Some(Vec3::new(4.0, 0.0, 0.0)),
                true,
            )
            .unwrap();
        let propagator = DirtyPropagator::default();

        // Swing the parent's second control point below the axis; its end
        // tangent now points straight up.
        let wave = propagator.move_control_point(
            &mut set,
            root,
            ControlSlot::Cp2,
            Vec3::new(2.0, -1.0, 0.0),
        );
        assert_eq!(wave.marked(), &[root, child]);

        let parent = set.get(root).unwrap();
        let tangent = (parent.end() - parent.control_point2()).normalize();
        let strand = set.get(child).unwrap();
        let cp_dir = (strand.control_point1() - strand.start()).normalize();
        assert!(vec3_close(tangent, cp_dir));
    }

    #[test]
    fn editing_a_constrained_control_point_steers_the_parent() {
        let (mut set, root) = root_set();
        let child = set
            .attach(
                root,
                AttachmentSide::End,
                Some(Vec3::new(4.0, 0.0, 0.0)),
                true,
            )
            .unwrap();
        let propagator = DirtyPropagator::default();

        let wave = propagator.move_control_point(
            &mut set,
            child,
            ControlSlot::Cp1,
            Vec3::new(2.0, 0.0, 3.0),
        );
        assert_eq!(wave.marked(), &[child, root]);

        // The user's edit survives and the parent's end tangent is now
        // collinear with it.
        let strand = set.get(child).unwrap();
        assert_eq!(strand.control_point1(), Vec3::new(2.0, 0.0, 3.0));
        let parent = set.get(root).unwrap();
        let tangent = (parent.end() - parent.control_point2()).normalize();
        assert!(vec3_close(tangent, Vec3::Z));
    }

    fn sibling_conflict_setup() -> (StrandSet, StrandId, StrandId, StrandId) {
        let mut set = StrandSet::new();
        let root = set.add(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0));
        let a = set
            .attach(
                root,
                AttachmentSide::End,
                Some(Vec3::new(4.0, 0.0, 0.0)),
                true,
            )
            .unwrap();
        let b = set
            .attach(
                root,
                AttachmentSide::End,
                Some(Vec3::new(2.0, 4.0, 0.0)),
                true,
            )
            .unwrap();
        (set, root, a, b)
    }

    #[test]
    fn first_wins_keeps_the_initiating_edit() {
        let (mut set, root, a, b) = sibling_conflict_setup();
        let propagator = DirtyPropagator::new(ContinuityConflict::FirstWins);

        let edited = Vec3::new(2.0, 0.0, 3.0);
        let wave = propagator.move_control_point(&mut set, a, ControlSlot::Cp1, edited);
        assert_eq!(wave.marked(), &[a, root, b]);

        // The edit on a survives untouched.
        assert_eq!(set.get(a).unwrap().control_point1(), edited);
        // The parent's end tangent followed the edit, pulling cp2 below.
        assert!(vec3_close(
            set.get(root).unwrap().control_point2(),
            Vec3::new(2.0, 0.0, -0.66)
        ));
        // The sibling realigned along the new tangent.
        assert!(vec3_close(
            set.get(b).unwrap().control_point1(),
            Vec3::new(2.0, 0.0, 1.32)
        ));
    }

    #[test]
    fn last_wins_renormalizes_the_initiating_edit() {
        let (mut set, root, a, b) = sibling_conflict_setup();
        let propagator = DirtyPropagator::new(ContinuityConflict::LastWins);

        let edited = Vec3::new(2.0, 0.0, 3.0);
        propagator.move_control_point(&mut set, a, ControlSlot::Cp1, edited);

        // The final alignment pass rewrote a's control point at the
        // standard distance, keeping only the edited direction.
        assert!(vec3_close(
            set.get(a).unwrap().control_point1(),
            Vec3::new(2.0, 0.0, 0.66)
        ));
        assert!(vec3_close(
            set.get(b).unwrap().control_point1(),
            Vec3::new(2.0, 0.0, 1.32)
        ));
    }

    #[test]
    fn translating_a_root_carries_the_whole_subtree() {
        let (mut set, root) = root_set();
        let child = set.attach(root, AttachmentSide::End, None, false).unwrap();
        let grandchild = set.attach(child, AttachmentSide::End, None, false).unwrap();
        let propagator = DirtyPropagator::default();

        let delta = Vec3::new(0.0, 5.0, 0.0);
        let child_start_before = set.get(child).unwrap().start();
        let wave = propagator.move_strand(&mut set, root, delta);

        assert_eq!(wave.marked(), &[root, child, grandchild]);
        assert_eq!(set.get(root).unwrap().start(), delta);
        assert_eq!(
            set.get(child).unwrap().start(),
            child_start_before + delta
        );
        // The joint stayed glued.
        assert_eq!(
            set.get(child).unwrap().start(),
            set.get(root).unwrap().end()
        );
    }

    #[test]
    fn translating_a_glued_strand_is_ignored() {
        let (mut set, root) = root_set();
        let child = set.attach(root, AttachmentSide::End, None, false).unwrap();
        let propagator = DirtyPropagator::default();

        let wave = propagator.move_strand(&mut set, child, Vec3::ONE);
        assert!(wave.is_empty());
        assert_eq!(set.get(child).unwrap().start(), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn touch_bumps_exactly_one_version() {
        let (mut set, root) = root_set();
        let propagator = DirtyPropagator::default();

        let wave = propagator.touch(&mut set, root);
        assert_eq!(wave.marked(), &[root]);
        assert_eq!(set.get(root).unwrap().geometry_version(), 2);

        let missing = propagator.touch(&mut set, StrandId(42));
        assert!(missing.is_empty());
    }

    #[test]
    fn straightening_realigns_continuity_children() {
        let (mut set, root) = root_set();
        let child = set.attach(root, AttachmentSide::End, None, true).unwrap();
        let propagator = DirtyPropagator::default();

        propagator.move_control_point(&mut set, root, ControlSlot::Cp2, Vec3::new(2.0, 0.0, 3.0));
        assert!(set.get(child).unwrap().control_point1().z < 0.0);

        let wave = propagator.straighten(&mut set, root);
        assert!(wave.contains(root));
        assert!(wave.contains(child));

        // The root's end tangent is back on the chord, so the child's
        // constrained control point returns to the +X ray off the joint.
        let cp1 = set.get(child).unwrap().control_point1();
        assert!(cp1.x > 2.0);
        assert!(approx_eq_eps(cp1.y, 0.0, 1e-4));
        assert!(approx_eq_eps(cp1.z, 0.0, 1e-4));
    }
}
