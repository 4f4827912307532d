// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! The graphics device capability the array manager calls into.
//!
//! The manager never allocates or copies memory itself.  Everything device-side
//! goes through [`Device`], which is implemented by the software backend
//! ([`crate::imp::soft::SoftDevice`]) and, with the `backend_wgpu` feature, by
//! [`crate::imp::wgpu::WgpuDevice`].
//!
//! Apart from construction, every method is only invoked from the
//! [`crate::context::GraphicsContext`] thread.

use std::fmt::Debug;

use crate::array::descriptor::ArrayDescriptor;
use crate::bindings::sampler::SamplerConfig;
use crate::error::Error;
use crate::pixel_formats::PixelFormat;

/// Width and height of one mip level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub const fn new(width: u32, height: u32) -> Self {
        Extent { width, height }
    }

    pub const fn square(edge: u32) -> Self {
        Extent {
            width: edge,
            height: edge,
        }
    }

    /// Size of mip level `mip` of a texture whose level 0 has this extent.
    pub const fn mip(self, mip: u32) -> Extent {
        let width = if mip >= 32 { 0 } else { self.width >> mip };
        let height = if mip >= 32 { 0 } else { self.height >> mip };
        Extent {
            width: if width == 0 { 1 } else { width },
            height: if height == 0 { 1 } else { height },
        }
    }

    /// Number of pixels at this extent, computed without `u32` overflow.
    pub const fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Shape of a plain 2D image, as needed to create one on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageInfo {
    pub extent: Extent,
    pub format: PixelFormat,
    pub mip_count: u32,
}

impl ImageInfo {
    /// Tightly packed byte size of mip level `mip`.
    pub fn mip_byte_len(&self, mip: u32) -> usize {
        let extent = self.extent.mip(mip);
        self.format.bytes_per_row(extent.width) as usize * extent.height as usize
    }
}

/**
One texel-region copy from a source texture into an array slice.

Copies always start at the origin of both textures; `extent` is the size of the
source's mip level.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct CopyRegion<T> {
    pub source: T,
    pub source_mip: u32,
    pub dest_mip: u32,
    pub dest_slice: u32,
    pub extent: Extent,
}

/**
A graphics device that can hold array textures.

Handles are cheap to clone and refer to the same device allocation.
*/
pub trait Device: Send + Sync + 'static {
    type Texture: Clone + Debug + PartialEq + Send + Sync + 'static;
    type Sampler: Clone + Debug + Send + Sync + 'static;

    /// Allocates an uninitialized 2D array texture shaped like `descriptor`.
    fn create_array_texture(
        &self,
        descriptor: &ArrayDescriptor,
        debug_name: &str,
    ) -> Result<Self::Texture, Error>;

    /**
    Creates a 2D image and uploads `mips`, one tightly packed buffer per mip level.

    This is how placeholder images are produced, and how applications that do not
    bring their own image store create sources.
    */
    fn create_image(
        &self,
        info: &ImageInfo,
        mips: &[Vec<u8>],
        debug_name: &str,
    ) -> Result<Self::Texture, Error>;

    /// Frees the device allocation behind `texture`.
    fn release_texture(&self, texture: Self::Texture);

    /// Returns the sampler for `config`, creating and caching it on first use.
    fn sampler(&self, config: &SamplerConfig) -> Self::Sampler;

    /**
    Executes `regions` against `destination`, in order, as a single submission.
    */
    fn copy_regions(&self, destination: &Self::Texture, regions: &[CopyRegion<Self::Texture>]);
}

/// The closed set of texture kinds the crate deals in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Image2D,
    Array2D,
}

/**
Capability shared by every texture-like resource: something with an extent and a
mip chain that can be bound for sampling.
*/
pub trait TextureResource<D: Device>: Send + Sync + Debug {
    fn kind(&self) -> TextureKind;
    /// Extent of mip level 0.
    fn extent(&self) -> Extent;
    fn mip_count(&self) -> u32;
    fn format(&self) -> PixelFormat;
    /// The device texture currently backing this resource, if there is one.
    fn bind(&self) -> Option<D::Texture>;
}
