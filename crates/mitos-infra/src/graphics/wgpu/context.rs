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

//! Headless WGPU state: instance, adapter, logical device, and the
//! offscreen render target the tube renderer draws into.

use mitos_core::error::RenderError;

/// The texture format of the offscreen color target.
pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// The texture format of the offscreen depth target.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Holds the core WGPU state objects required for rendering without a window.
///
/// The context owns an offscreen color and depth target of a fixed size; the
/// renderer draws into those instead of a swapchain surface. It is a passive
/// component: all recording and submission is driven by the device layered
/// on top of it.
#[derive(Debug)]
pub struct WgpuHeadlessContext {
    #[allow(dead_code)]
    pub(crate) adapter: wgpu::Adapter,
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,

    // Offscreen render target
    #[allow(dead_code)]
    pub(crate) color_texture: wgpu::Texture,
    pub(crate) color_view: wgpu::TextureView,
    #[allow(dead_code)]
    pub(crate) depth_texture: wgpu::Texture,
    pub(crate) depth_view: wgpu::TextureView,
    width: u32,
    height: u32,

    // Store info for easy access
    pub(crate) adapter_name: String,
    pub(crate) adapter_backend: wgpu::Backend,
    pub(crate) adapter_device_type: wgpu::DeviceType,
    #[allow(dead_code)]
    pub(crate) device_limits: wgpu::Limits,
}

impl WgpuHeadlessContext {
    /// Asynchronously initializes a headless graphics context.
    ///
    /// ## Arguments
    /// * `width` - The width of the offscreen render target in pixels.
    /// * `height` - The height of the offscreen render target in pixels.
    ///
    /// ## Returns
    /// * `Result<Self, RenderError>` - The initialized context, or an error if
    ///   no adapter or logical device could be acquired.
    pub async fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        log::info!("Initializing headless WGPU context...");

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::new_without_display_handle());

        // --- 1. Select an Adapter ---
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| {
                RenderError::InitializationFailed(format!("Failed to find a suitable adapter: {e}"))
            })?;

        let adapter_info = adapter.get_info();
        log::info!(
            "Using graphics adapter: \"{}\" (Backend: {:?})",
            adapter_info.name,
            adapter_info.backend
        );

        // --- 2. Create Logical Device and Command Queue from Adapter ---
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Mitos Logical Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
            })
            .await
            .map_err(|e| {
                RenderError::InitializationFailed(format!("Failed to create logical device: {e}"))
            })?;
        log::info!("Logical device and command queue created.");

        device.on_uncaptured_error(std::sync::Arc::new(|e| {
            log::error!("WGPU Uncaptured Error: {e:?}");
        }));

        let device_limits = device.limits();

        // --- 3. Create the Offscreen Render Target ---
        let width = width.max(1);
        let height = height.max(1);
        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let color_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Color Target"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let color_view = color_texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Offscreen Color View"),
            ..Default::default()
        });

        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Depth Target"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Offscreen Depth View"),
            ..Default::default()
        });
        log::info!("Offscreen render target created: {width}x{height}");

        Ok(WgpuHeadlessContext {
            adapter,
            device,
            queue,
            color_texture,
            color_view,
            depth_texture,
            depth_view,
            width,
            height,
            adapter_name: adapter_info.name,
            adapter_backend: adapter_info.backend,
            adapter_device_type: adapter_info.device_type,
            device_limits,
        })
    }

    /// Returns the underlying logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns the command queue of the logical device.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Returns the size of the offscreen render target in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the width-over-height ratio of the offscreen render target.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Returns the clear color used for rendering.
    /// This is the color the offscreen target is cleared to before any
    /// tube is drawn.
    pub fn clear_color(&self) -> wgpu::Color {
        wgpu::Color {
            r: 0.015,
            g: 0.017,
            b: 0.022,
            a: 1.0,
        }
    }
}
