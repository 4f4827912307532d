// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use std::sync::Arc;

use wgpu::SamplerDescriptor;

use crate::bindings::sampler::{AddressMode, Filter, SamplerConfig};

/// A sampler created by a [`super::WgpuDevice`].
#[derive(Debug, Clone)]
pub struct WgpuSampler {
    pub(super) sampler: Arc<wgpu::Sampler>,
    pub config: SamplerConfig,
}

impl WgpuSampler {
    pub fn wgpu(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}

pub(super) fn create(device: &wgpu::Device, config: &SamplerConfig) -> WgpuSampler {
    let (mag_filter, min_filter, mipmap_filter) = match config.filter {
        Filter::Point => (
            wgpu::FilterMode::Nearest,
            wgpu::FilterMode::Nearest,
            wgpu::FilterMode::Nearest,
        ),
        Filter::Bilinear => (
            wgpu::FilterMode::Linear,
            wgpu::FilterMode::Linear,
            wgpu::FilterMode::Nearest,
        ),
        Filter::Trilinear => (
            wgpu::FilterMode::Linear,
            wgpu::FilterMode::Linear,
            wgpu::FilterMode::Linear,
        ),
    };
    let address_mode = match config.address_mode {
        AddressMode::Wrap => wgpu::AddressMode::Repeat,
        AddressMode::Clamp => wgpu::AddressMode::ClampToEdge,
        AddressMode::Mirror => wgpu::AddressMode::MirrorRepeat,
    };
    let descriptor = SamplerDescriptor {
        label: Some("dynamic texture array sampler"),
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter,
        min_filter,
        mipmap_filter,
        lod_min_clamp: 0.0,
        lod_max_clamp: 32.0,
        compare: None,
        anisotropy_clamp: 1,
        border_color: None,
    };
    WgpuSampler {
        sampler: Arc::new(device.create_sampler(&descriptor)),
        config: *config,
    }
}
