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

//! The editor-facing facade tying strand editing to cached rendering.
//!
//! A [`StrandScene`] owns the strand set, the dirty propagator, and the
//! render dispatcher. Routing every edit through it preserves the ordering
//! the caches rely on: all dirty-marking of an interaction step has
//! finished before the next frame computes its cache keys, so a frame can
//! never bake a key from a version that is about to change.

use crate::cache::CacheStats;
use crate::error::RenderError;
use crate::geometry::{CrossSection, TubeResolution, TubeStyle, TwistProfile};
use crate::math::{LinearRgba, Vec3};
use crate::render::{FrameStats, GraphicsDevice, RenderDispatcher, RenderMode, RenderStats};
use crate::strand::{
    AttachmentSide, ContinuityConflict, ControlSlot, DirtyPropagator, DirtyWave, Strand, StrandId,
    StrandSet,
};

/// An editable set of tube strands plus everything needed to draw it.
///
/// Edits run their propagation wave and invalidate the affected chain
/// geometry immediately; GPU-side cleanup follows the schedule of the
/// current interaction mode. Bracket incremental gesture edits with
/// [`begin_drag`](Self::begin_drag) and [`end_drag`](Self::end_drag) so
/// intermediate frames skip uploads entirely.
#[derive(Debug, Default)]
pub struct StrandScene {
    set: StrandSet,
    propagator: DirtyPropagator,
    dispatcher: RenderDispatcher,
    mode: RenderMode,
}

impl StrandScene {
    /// Creates an empty scene with default resolution and conflict policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty scene with explicit settings.
    pub fn with_settings(resolution: TubeResolution, conflict: ContinuityConflict) -> Self {
        Self {
            set: StrandSet::new(),
            propagator: DirtyPropagator::new(conflict),
            dispatcher: RenderDispatcher::new(resolution),
            mode: RenderMode::Steady,
        }
    }

    /// Adds a free strand running from `start` to `end`.
    pub fn add_strand(&mut self, start: Vec3, end: Vec3) -> StrandId {
        self.set.add(start, end)
    }

    /// Attaches a new strand to `parent` at `side`, optionally with a C1
    /// continuity link. Returns `None` when the parent does not exist.
    pub fn attach_strand(
        &mut self,
        parent: StrandId,
        side: AttachmentSide,
        end: Option<Vec3>,
        continuity: bool,
    ) -> Option<StrandId> {
        let child = self.set.attach(parent, side, end, continuity)?;
        // Growing a chain is a topology edit of the strand it grew from.
        let wave = self.propagator.touch(&mut self.set, parent);
        self.dispatcher.invalidate_wave(&self.set, &wave);
        Some(child)
    }

    /// Moves one endpoint of a strand, cascading through attachments and
    /// continuity links.
    pub fn move_endpoint(
        &mut self,
        id: StrandId,
        side: AttachmentSide,
        position: Vec3,
    ) -> DirtyWave {
        let wave = self.propagator.move_endpoint(&mut self.set, id, side, position);
        self.dispatcher.invalidate_wave(&self.set, &wave);
        wave
    }

    /// Moves one interior control point, resyncing continuity links.
    pub fn move_control_point(
        &mut self,
        id: StrandId,
        slot: ControlSlot,
        position: Vec3,
    ) -> DirtyWave {
        let wave = self
            .propagator
            .move_control_point(&mut self.set, id, slot, position);
        self.dispatcher.invalidate_wave(&self.set, &wave);
        wave
    }

    /// Translates a free strand and its attached subtree by `delta`.
    pub fn translate_strand(&mut self, id: StrandId, delta: Vec3) -> DirtyWave {
        let wave = self.propagator.move_strand(&mut self.set, id, delta);
        self.dispatcher.invalidate_wave(&self.set, &wave);
        wave
    }

    /// Resets a strand's control points onto its chord.
    pub fn straighten(&mut self, id: StrandId) -> DirtyWave {
        let wave = self.propagator.straighten(&mut self.set, id);
        self.dispatcher.invalidate_wave(&self.set, &wave);
        wave
    }

    /// Bumps a strand's version after an out-of-band mutation.
    pub fn mark_dirty(&mut self, id: StrandId) -> DirtyWave {
        let wave = self.propagator.touch(&mut self.set, id);
        self.dispatcher.invalidate_wave(&self.set, &wave);
        wave
    }

    /// Replaces a strand's twist profile.
    pub fn set_twist(&mut self, id: StrandId, twist: TwistProfile) -> DirtyWave {
        self.edit_strand(id, |strand| strand.set_twist_profile(twist))
    }

    /// Replaces a strand's tube style.
    pub fn set_style(&mut self, id: StrandId, style: TubeStyle) -> DirtyWave {
        self.edit_strand(id, |strand| strand.set_style(style))
    }

    /// Changes only the swept cross-section shape of a strand's style.
    pub fn set_cross_section(&mut self, id: StrandId, cross_section: CrossSection) -> DirtyWave {
        self.edit_strand(id, move |strand| {
            let mut style = strand.style();
            style.cross_section = cross_section;
            strand.set_style(style);
        })
    }

    /// Changes only the tube width of a strand's style.
    pub fn set_width(&mut self, id: StrandId, width: f32) -> DirtyWave {
        self.edit_strand(id, move |strand| {
            let mut style = strand.style();
            style.width = width;
            strand.set_style(style);
        })
    }

    /// Changes a strand's draw color. Color is a draw-call parameter, not
    /// baked into buffers, so nothing is invalidated.
    pub fn set_color(&mut self, id: StrandId, color: LinearRgba) {
        if let Some(strand) = self.set.get_mut(id) {
            strand.set_color(color);
        }
    }

    /// Enters drag mode: subsequent frames bypass stale GPU entries instead
    /// of replacing them, and edited chains stream from client-side arrays.
    pub fn begin_drag(&mut self) {
        self.mode = RenderMode::Dragging;
    }

    /// Leaves drag mode. The stale buffers the gesture accumulated are
    /// swept during the next stable frame.
    pub fn end_drag(&mut self) {
        if self.mode == RenderMode::Dragging {
            self.mode = RenderMode::Steady;
            self.dispatcher.note_drag_ended();
        }
    }

    /// Whether a drag session is open.
    #[inline]
    pub fn is_dragging(&self) -> bool {
        self.mode == RenderMode::Dragging
    }

    /// The interaction mode the next frame will render under.
    #[inline]
    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Draws every chain once under the current interaction mode.
    /// ## Errors
    /// Returns a [`RenderError`] when a buffer upload or draw call fails.
    pub fn render_frame(&mut self, device: &dyn GraphicsDevice) -> Result<FrameStats, RenderError> {
        self.dispatcher.render_frame(device, &mut self.set, self.mode)
    }

    /// Releases every cached GPU buffer. Call before dropping the device.
    pub fn release_gpu(&mut self, device: &dyn GraphicsDevice) {
        self.dispatcher.release_all(device);
    }

    /// Read access to one strand.
    pub fn strand(&self, id: StrandId) -> Option<&Strand> {
        self.set.get(id)
    }

    /// Read access to the whole strand set.
    #[inline]
    pub fn strands(&self) -> &StrandSet {
        &self.set
    }

    /// Cumulative frame and draw counters.
    #[inline]
    pub fn render_stats(&self) -> RenderStats {
        self.dispatcher.stats()
    }

    /// Chain geometry cache counters.
    #[inline]
    pub fn chain_stats(&self) -> CacheStats {
        self.dispatcher.chain_stats()
    }

    /// GPU buffer cache counters.
    #[inline]
    pub fn gpu_stats(&self) -> CacheStats {
        self.dispatcher.gpu_stats()
    }

    /// The resolution chains render at.
    #[inline]
    pub fn resolution(&self) -> TubeResolution {
        self.dispatcher.resolution()
    }

    /// Changes the rendering resolution; everything rebuilds lazily.
    pub fn set_resolution(&mut self, resolution: TubeResolution) {
        self.dispatcher.set_resolution(resolution);
    }

    /// The continuity conflict policy edits are resolved under.
    #[inline]
    pub fn conflict_policy(&self) -> ContinuityConflict {
        self.propagator.conflict()
    }

    /// Applies a version-bumping edit to one strand and invalidates its
    /// chain. Missing ids produce an empty wave.
    fn edit_strand<F>(&mut self, id: StrandId, edit: F) -> DirtyWave
    where
        F: FnOnce(&mut Strand),
    {
        match self.set.get_mut(id) {
            Some(strand) => edit(strand),
            None => return DirtyWave::default(),
        }
        let wave = DirtyWave::single(id);
        self.dispatcher.invalidate_wave(&self.set, &wave);
        wave
    }
}
