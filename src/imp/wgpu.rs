// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! The wgpu backend.

mod bound_device;
mod error;
mod pixel_format;
mod sampler;
mod texture;

pub use bound_device::WgpuDevice;
pub use error::Error;
pub use sampler::WgpuSampler;
pub use texture::WgpuTexture;
