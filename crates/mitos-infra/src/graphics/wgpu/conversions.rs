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

//! Conversions between the engine's renderer types and WGPU types.

use mitos_core::math::LinearRgba;
use mitos_core::render::{BufferUsage, GraphicsBackendType, RendererDeviceType};

/// A local extension trait to convert our engine's types into WGPU-compatible types.
/// This avoids Rust's orphan rules while keeping an idiomatic `.into_wgpu()` syntax.
pub trait IntoWgpu<T> {
    /// Consumes self and converts it into a WGPU-compatible type.
    fn into_wgpu(self) -> T;
}

impl IntoWgpu<wgpu::BufferUsages> for BufferUsage {
    fn into_wgpu(self) -> wgpu::BufferUsages {
        let mut usages = wgpu::BufferUsages::empty();
        if self.contains(BufferUsage::MAP_READ) {
            usages |= wgpu::BufferUsages::MAP_READ;
        }
        if self.contains(BufferUsage::MAP_WRITE) {
            usages |= wgpu::BufferUsages::MAP_WRITE;
        }
        if self.contains(BufferUsage::COPY_SRC) {
            usages |= wgpu::BufferUsages::COPY_SRC;
        }
        if self.contains(BufferUsage::COPY_DST) {
            usages |= wgpu::BufferUsages::COPY_DST;
        }
        if self.contains(BufferUsage::VERTEX) {
            usages |= wgpu::BufferUsages::VERTEX;
        }
        if self.contains(BufferUsage::INDEX) {
            usages |= wgpu::BufferUsages::INDEX;
        }
        if self.contains(BufferUsage::UNIFORM) {
            usages |= wgpu::BufferUsages::UNIFORM;
        }
        usages
    }
}

impl IntoWgpu<wgpu::Color> for LinearRgba {
    fn into_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}

/// Converts a WGPU backend identifier to our generic `GraphicsBackendType`.
pub fn from_wgpu_backend(backend: wgpu::Backend) -> GraphicsBackendType {
    match backend {
        wgpu::Backend::Vulkan => GraphicsBackendType::Vulkan,
        wgpu::Backend::Metal => GraphicsBackendType::Metal,
        wgpu::Backend::Dx12 => GraphicsBackendType::Dx12,
        wgpu::Backend::Gl => GraphicsBackendType::OpenGL,
        wgpu::Backend::BrowserWebGpu => GraphicsBackendType::WebGpu,
        _ => GraphicsBackendType::Unknown,
    }
}

/// Converts a WGPU device type to our generic `RendererDeviceType`.
pub fn from_wgpu_device_type(device_type: wgpu::DeviceType) -> RendererDeviceType {
    match device_type {
        wgpu::DeviceType::IntegratedGpu => RendererDeviceType::IntegratedGpu,
        wgpu::DeviceType::DiscreteGpu => RendererDeviceType::DiscreteGpu,
        wgpu::DeviceType::VirtualGpu => RendererDeviceType::VirtualGpu,
        wgpu::DeviceType::Cpu => RendererDeviceType::Cpu,
        _ => RendererDeviceType::Unknown,
    }
}
