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

//! Integration test for cache turnover across a full drag gesture.
//!
//! Exercises the edit → propagate → render cycle on a three-strand chain:
//! intermediate drag frames must rebuild geometry and stream it without
//! touching GPU memory, and uploads must resume only once the gesture ends
//! and a stable frame renders.

use std::sync::atomic::{AtomicUsize, Ordering};

use mitos_core::error::{RenderError, ResourceError};
use mitos_core::geometry::TubeResolution;
use mitos_core::math::{LinearRgba, Vec3};
use mitos_core::render::{AdapterInfo, BufferDescriptor, BufferId, GpuTubeBuffers, GraphicsDevice};
use mitos_core::strand::{AttachmentSide, ContinuityConflict, ControlSlot};
use mitos_core::StrandScene;

// --- RECORDING DEVICE FOR THIS TEST ---

/// Counts every buffer operation so the test can assert on GPU traffic.
#[derive(Debug)]
struct RecordingDevice {
    next_id: AtomicUsize,
    created: AtomicUsize,
    destroyed: AtomicUsize,
    buffer_draws: AtomicUsize,
    client_draws: AtomicUsize,
}

impl RecordingDevice {
    fn new() -> Self {
        Self {
            next_id: AtomicUsize::new(1),
            created: AtomicUsize::new(0),
            destroyed: AtomicUsize::new(0),
            buffer_draws: AtomicUsize::new(0),
            client_draws: AtomicUsize::new(0),
        }
    }

    fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::Relaxed)
    }

    fn live_buffers(&self) -> usize {
        self.created() - self.destroyed()
    }

    fn buffer_draws(&self) -> usize {
        self.buffer_draws.load(Ordering::Relaxed)
    }

    fn client_draws(&self) -> usize {
        self.client_draws.load(Ordering::Relaxed)
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        assert_eq!(
            descriptor.size,
            data.len() as u64,
            "descriptor size must match the payload"
        );
        self.created.fetch_add(1, Ordering::Relaxed);
        Ok(BufferId(self.next_id.fetch_add(1, Ordering::Relaxed)))
    }

    fn destroy_buffer(&self, _id: BufferId) -> Result<(), ResourceError> {
        self.destroyed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn draw_buffers(
        &self,
        buffers: &GpuTubeBuffers,
        _color: LinearRgba,
    ) -> Result<(), RenderError> {
        assert!(buffers.vertex_count > 0, "empty meshes must be skipped");
        self.buffer_draws.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn draw_client_arrays(
        &self,
        vertices: &[f32],
        normals: &[f32],
        _color: LinearRgba,
    ) -> Result<(), RenderError> {
        assert_eq!(
            vertices.len(),
            normals.len(),
            "normal array must match the vertex array"
        );
        self.client_draws.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn adapter_info(&self) -> AdapterInfo {
        AdapterInfo::default()
    }
}

/// Helper: a scene holding one chain of three strands, sampled at ten
/// curve segments per strand.
fn three_strand_scene() -> (StrandScene, mitos_core::strand::StrandId) {
    let resolution = TubeResolution {
        curve_segments: 10,
        tube_segments: 6,
        cap_segments: 6,
    };
    let mut scene = StrandScene::with_settings(resolution, ContinuityConflict::default());
    let root = scene.add_strand(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0));
    let middle = scene
        .attach_strand(root, AttachmentSide::End, Some(Vec3::new(4.0, 0.0, 0.0)), false)
        .expect("root exists");
    let _tip = scene
        .attach_strand(middle, AttachmentSide::End, Some(Vec3::new(6.0, 0.0, 0.0)), false)
        .expect("middle exists");
    (scene, middle)
}

#[test]
fn test_drag_gesture_streams_then_reuploads_once_stable() {
    // --- 1. ARRANGE ---
    let device = RecordingDevice::new();
    let (mut scene, middle) = three_strand_scene();

    // One stable frame warms both caches for the whole chain.
    let warm = scene.render_frame(&device).expect("warm frame");
    assert_eq!(warm.geometry_builds, 1);
    assert_eq!(warm.buffer_uploads, 1);
    assert_eq!(device.created(), 2);

    let version_before = scene.strand(middle).expect("middle exists").geometry_version();

    // --- 2. ACT: drag the middle strand's interior control point ---
    scene.begin_drag();
    let wave = scene.move_control_point(middle, ControlSlot::Cp1, Vec3::new(2.5, 1.0, 0.0));
    assert_eq!(
        wave.marked(),
        &[middle],
        "an unconstrained control point edit marks only its strand"
    );
    assert_eq!(
        scene.strand(middle).expect("middle exists").geometry_version(),
        version_before + 1,
        "one edit bumps the version by exactly one"
    );

    let drag_frame = scene.render_frame(&device).expect("drag frame");

    // --- 3. ASSERT: the drag frame rebuilt and streamed, no GPU traffic ---
    assert_eq!(drag_frame.geometry_builds, 1, "chain key changed, so rebuild");
    assert_eq!(drag_frame.buffer_uploads, 0, "drag frames never upload");
    assert_eq!(drag_frame.client_draws, 1, "the tube streams client-side");
    assert_eq!(device.created(), 2, "no new buffers mid-drag");
    assert_eq!(device.destroyed(), 0, "no buffers released mid-drag");

    // --- 4. ACT: end the gesture and render one stable frame ---
    scene.end_drag();
    let stable = scene.render_frame(&device).expect("stable frame");

    // The new key uploads, the superseded pair is released.
    assert_eq!(stable.buffer_uploads, 1);
    assert_eq!(device.created(), 4);
    assert_eq!(device.destroyed(), 2);
    assert_eq!(device.live_buffers(), 2);

    // --- 5. ASSERT: from here on the chain hits GPU memory again ---
    let settled = scene.render_frame(&device).expect("settled frame");
    assert_eq!(settled.geometry_hits, 1);
    assert_eq!(settled.buffer_hits, 1);
    assert_eq!(settled.buffer_uploads, 0);
    assert_eq!(device.created(), 4);
}

#[test]
fn test_joint_edit_during_drag_cascades_and_still_streams() {
    let device = RecordingDevice::new();
    let (mut scene, middle) = three_strand_scene();
    scene.render_frame(&device).expect("warm frame");

    scene.begin_drag();
    // Dragging the middle strand's free end moves the joint the tip hangs
    // on, so the wave covers both strands.
    let wave = scene.move_endpoint(middle, AttachmentSide::End, Vec3::new(4.0, 1.5, 0.0));
    assert_eq!(wave.len(), 2, "the tip follows the moved joint");

    let frame = scene.render_frame(&device).expect("drag frame");
    assert_eq!(frame.geometry_builds, 1);
    assert_eq!(frame.client_draws, 1);
    assert_eq!(device.created(), 2, "still no uploads mid-drag");

    scene.end_drag();
    scene.render_frame(&device).expect("stable frame");
    assert_eq!(device.live_buffers(), 2);
    assert!(device.buffer_draws() >= 2, "steady frames draw from GPU memory");
    assert!(device.client_draws() >= 1, "drag frames drew client-side");
}
