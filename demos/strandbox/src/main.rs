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

// Mitos Strandbox
// Headless binary driving a full editing session against the wgpu backend

use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use mitos_core::geometry::{CrossSection, TwistProfile};
use mitos_core::math::{LinearRgba, Vec3};
use mitos_core::render::{FrameStats, GraphicsDevice};
use mitos_core::strand::{AttachmentSide, ControlSlot, StrandId};
use mitos_core::StrandScene;
use mitos_infra::WgpuTubeDevice;

/// One root strand of a scene file. Children chained onto it inherit its
/// color and style.
#[derive(Debug, serde::Deserialize)]
struct SceneStrand {
    start: Vec3,
    end: Vec3,
    #[serde(default)]
    color: Option<[f32; 4]>,
    /// Number of strands chained onto the end with C1 continuity.
    #[serde(default)]
    links: u32,
}

#[derive(Debug, serde::Deserialize)]
struct SceneFile {
    strands: Vec<SceneStrand>,
}

fn load_scene(scene: &mut StrandScene, path: &Path) -> Result<Vec<StrandId>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scene file {}", path.display()))?;
    let file: SceneFile = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse scene file {}", path.display()))?;

    let mut roots = Vec::new();
    for entry in &file.strands {
        let root = scene.add_strand(entry.start, entry.end);
        if let Some([r, g, b, a]) = entry.color {
            scene.set_color(root, LinearRgba::new(r, g, b, a));
        }
        grow_chain(scene, root, entry.links);
        roots.push(root);
    }
    Ok(roots)
}

/// Chains `links` continuity-linked strands onto the end of `root`.
fn grow_chain(scene: &mut StrandScene, root: StrandId, links: u32) {
    let mut tip = root;
    for _ in 0..links {
        match scene.attach_strand(tip, AttachmentSide::End, None, true) {
            Some(child) => tip = child,
            None => break,
        }
    }
}

/// Builds a small braid of three chains when no scene file is given.
fn build_default_scene(scene: &mut StrandScene) -> Vec<StrandId> {
    let copper = scene.add_strand(Vec3::new(-4.0, 0.0, -1.0), Vec3::new(-0.5, 1.2, 0.6));
    scene.set_color(copper, LinearRgba::new(0.72, 0.45, 0.2, 1.0));
    grow_chain(scene, copper, 2);

    let teal = scene.add_strand(Vec3::new(-4.0, 1.4, 1.0), Vec3::new(-0.5, 0.2, -0.6));
    scene.set_color(teal, LinearRgba::new(0.16, 0.62, 0.6, 1.0));
    scene.set_width(teal, 0.22);
    grow_chain(scene, teal, 2);

    // A twisted ribbon to exercise the rectangular sweep path.
    let ribbon = scene.add_strand(Vec3::new(-4.0, 0.7, 0.0), Vec3::new(4.0, 0.7, 0.0));
    scene.set_color(ribbon, LinearRgba::new(0.85, 0.7, 0.25, 1.0));
    scene.set_cross_section(ribbon, CrossSection::Rectangle { corner_radius: 0.3 });
    scene.set_twist(
        ribbon,
        TwistProfile {
            start: 0.0,
            cp1: 60.0,
            cp2: 120.0,
            end: 180.0,
        },
    );

    vec![copper, teal, ribbon]
}

fn log_frame(stats: &FrameStats) {
    log::info!(
        "Frame {:>3}: geometry {} hits / {} builds, buffers {} hits / {} uploads / {} evictions, {} client draws, {} cap draws",
        stats.frame_number,
        stats.geometry_hits,
        stats.geometry_builds,
        stats.buffer_hits,
        stats.buffer_uploads,
        stats.evictions,
        stats.client_draws,
        stats.cap_draws
    );
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("wgpu_hal", log::LevelFilter::Error)
        .init();

    let device = WgpuTubeDevice::create_headless(1280, 720)
        .context("Failed to initialize the headless wgpu device")?;
    let adapter = device.adapter_info();
    log::info!(
        "Strandbox running on '{}' ({:?} via {:?})",
        adapter.name,
        adapter.device_type,
        adapter.backend_type
    );
    device.set_camera(Vec3::new(7.5, 5.0, 9.5), Vec3::new(0.0, 0.8, 0.0))?;

    let mut scene = StrandScene::new();
    let roots = match env::args().nth(1) {
        Some(path) => load_scene(&mut scene, Path::new(&path))?,
        None => build_default_scene(&mut scene),
    };
    anyhow::ensure!(!roots.is_empty(), "The scene contains no strands");
    log::info!(
        "Scene ready: {} strands in {} chains",
        scene.strands().len(),
        roots.len()
    );

    let steady_frames: u64 = env::var("STRANDBOX_FRAMES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8);

    // Warm every cache, then hold steady. After the first frame each chain
    // should render straight out of its resident buffers.
    for _ in 0..steady_frames {
        let stats = scene.render_frame(&device)?;
        device.present()?;
        log_frame(&stats);
    }

    // Grab a control point in the middle of the first chain and wiggle it
    // as one continuous gesture. No uploads should happen until it ends.
    let members = scene.strands().chain_of(roots[0]);
    let grabbed = members[members.len() / 2];
    let anchor = scene
        .strand(grabbed)
        .map(|strand| strand.control_point2())
        .expect("chain members come from the live set");
    log::info!("Dragging control point 2 of {grabbed:?} in the first chain");
    scene.begin_drag();
    for step in 0..12u32 {
        let angle = step as f32 * 0.35;
        let offset = Vec3::new(0.0, 0.6 * angle.sin(), 0.4 * angle.cos());
        scene.move_control_point(grabbed, ControlSlot::Cp2, anchor + offset);
        let stats = scene.render_frame(&device)?;
        device.present()?;
        log_frame(&stats);
    }
    scene.end_drag();
    log::info!("Drag ended, settling");

    // The first stable frame re-uploads the dragged chain and sweeps the
    // buffers the gesture left behind.
    for _ in 0..2 {
        let stats = scene.render_frame(&device)?;
        device.present()?;
        log_frame(&stats);
    }

    let totals = scene.render_stats();
    let chain = scene.chain_stats();
    let gpu = scene.gpu_stats();
    log::info!(
        "Session totals: {} frames, {} buffer draws, {} client draws, {} cap draws",
        totals.frames,
        totals.buffer_draws,
        totals.client_draws,
        totals.cap_draws
    );
    log::info!(
        "Chain cache {} hits / {} misses, GPU cache {} hits / {} misses / {} evictions",
        chain.hits,
        chain.misses,
        gpu.hits,
        gpu.misses,
        gpu.evictions
    );
    log::info!(
        "VRAM: {} bytes resident, {} bytes peak",
        device.vram_allocated_bytes(),
        device.vram_peak_bytes()
    );

    scene.release_gpu(&device);
    Ok(())
}
