// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Texture creation, slice copies and read-back on wgpu.
*/

use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use wgpu::{Extent3d, Origin3d, TexelCopyBufferInfo, TexelCopyBufferLayout, TexelCopyTextureInfo};

use super::pixel_format::wgpu_format;
use crate::device::{CopyRegion, Extent, ImageInfo, TextureKind};
use crate::pixel_formats::PixelFormat;

struct WgpuTextureInner {
    texture: wgpu::Texture,
    id: u64,
    kind: TextureKind,
    info: ImageInfo,
    layers: u32,
    destroyed: AtomicBool,
}

/**
Handle to a texture created by a [`super::WgpuDevice`].

Clones refer to the same texture.  Equality is identity.
*/
#[derive(Clone)]
pub struct WgpuTexture(Arc<WgpuTextureInner>);

impl WgpuTexture {
    pub(super) fn new(
        texture: wgpu::Texture,
        id: u64,
        kind: TextureKind,
        info: ImageInfo,
        layers: u32,
    ) -> Self {
        WgpuTexture(Arc::new(WgpuTextureInner {
            texture,
            id,
            kind,
            info,
            layers,
            destroyed: AtomicBool::new(false),
        }))
    }

    pub fn wgpu(&self) -> &wgpu::Texture {
        &self.0.texture
    }

    pub fn kind(&self) -> TextureKind {
        self.0.kind
    }

    pub fn layers(&self) -> u32 {
        self.0.layers
    }

    pub fn format(&self) -> PixelFormat {
        self.0.info.format
    }

    pub fn extent(&self) -> Extent {
        self.0.info.extent
    }

    /// A view covering every slice and mip, for binding as a 2D array.
    pub fn array_view(&self) -> wgpu::TextureView {
        self.0.texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("dynamic texture array view"),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        })
    }

    /// Destroys the texture the first time this is called.
    pub(super) fn destroy(&self) -> bool {
        if self.0.destroyed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.0.texture.destroy();
        true
    }
}

impl PartialEq for WgpuTexture {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Debug for WgpuTexture {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuTexture")
            .field("id", &self.0.id)
            .field("kind", &self.0.kind)
            .field("info", &self.0.info)
            .field("layers", &self.0.layers)
            .finish()
    }
}

pub(super) fn texture_descriptor<'a>(
    label: &'a str,
    info: &ImageInfo,
    layers: u32,
    usage: wgpu::TextureUsages,
) -> wgpu::TextureDescriptor<'a> {
    wgpu::TextureDescriptor {
        label: Some(label),
        size: Extent3d {
            width: info.extent.width,
            height: info.extent.height,
            depth_or_array_layers: layers,
        },
        mip_level_count: info.mip_count,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu_format(info.format),
        usage,
        view_formats: &[],
    }
}

/// Uploads tightly packed pixel data into every mip of a single-layer texture.
pub(super) fn upload_mips(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    info: &ImageInfo,
    mips: &[Vec<u8>],
) {
    let _upload_guard = logwise::profile_begin!("image_upload");
    for (mip, data) in mips.iter().enumerate().take(info.mip_count as usize) {
        let extent = info.extent.mip(mip as u32);
        queue.write_texture(
            TexelCopyTextureInfo {
                texture,
                mip_level: mip as u32,
                origin: Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(info.format.bytes_per_row(extent.width)),
                rows_per_image: Some(extent.height),
            },
            Extent3d {
                width: extent.width,
                height: extent.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

/// Records `regions` into `encoder`, one texture-to-texture copy each.
pub(super) fn encode_copies(
    encoder: &mut wgpu::CommandEncoder,
    destination: &WgpuTexture,
    regions: &[CopyRegion<WgpuTexture>],
) {
    for region in regions {
        encoder.copy_texture_to_texture(
            TexelCopyTextureInfo {
                texture: region.source.wgpu(),
                mip_level: region.source_mip,
                origin: Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            TexelCopyTextureInfo {
                texture: destination.wgpu(),
                mip_level: region.dest_mip,
                origin: Origin3d {
                    x: 0,
                    y: 0,
                    z: region.dest_slice,
                },
                aspect: wgpu::TextureAspect::All,
            },
            Extent3d {
                width: region.extent.width,
                height: region.extent.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

/// Row pitch for texture-to-buffer copies.
pub(super) fn aligned_bytes_per_row(unaligned: u32) -> u32 {
    let alignment = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unaligned.div_ceil(alignment) * alignment
}

/**
Records a copy of one (slice, mip) into a fresh mappable buffer.

Rows in the buffer are padded to [`aligned_bytes_per_row`].
*/
pub(super) fn encode_readback(
    device: &wgpu::Device,
    encoder: &mut wgpu::CommandEncoder,
    texture: &WgpuTexture,
    slice: u32,
    mip: u32,
) -> wgpu::Buffer {
    let extent = texture.extent().mip(mip);
    let padded = aligned_bytes_per_row(texture.format().bytes_per_row(extent.width));
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("array slice read-back"),
        size: padded as u64 * extent.height as u64,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    encoder.copy_texture_to_buffer(
        TexelCopyTextureInfo {
            texture: texture.wgpu(),
            mip_level: mip,
            origin: Origin3d { x: 0, y: 0, z: slice },
            aspect: wgpu::TextureAspect::All,
        },
        TexelCopyBufferInfo {
            buffer: &buffer,
            layout: TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(extent.height),
            },
        },
        Extent3d {
            width: extent.width,
            height: extent.height,
            depth_or_array_layers: 1,
        },
    );
    buffer
}

/// Strips row padding from mapped read-back data.
pub(super) fn unpad_rows(
    padded: &[u8],
    row_bytes: usize,
    padded_row_bytes: usize,
    rows: usize,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(row_bytes * rows);
    for row in 0..rows {
        let start = row * padded_row_bytes;
        out.extend_from_slice(&padded[start..start + row_bytes]);
    }
    out
}
