// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Shape of an array texture, derived from its source collection.

use crate::array::source::SourceEntry;
use crate::device::{Device, Extent};
use crate::pixel_formats::PixelFormat;

/**
Allocation parameters of an array texture.

Slices are square, `edge_size` on a side, and every slice has `mip_count` levels.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrayDescriptor {
    pub edge_size: u32,
    pub format: PixelFormat,
    pub mip_count: u32,
    pub slice_count: u32,
    pub srgb: bool,
}

impl ArrayDescriptor {
    /**
    Derives the descriptor for a source collection.

    Only entry 0 contributes edge size, format, mip count and color space.  Every entry
    contributes a slice, including unresolved ones.  Returns `None` when the
    collection is empty or entry 0 is unresolved; no array is needed then.
    */
    pub fn from_sources<D: Device>(sources: &[SourceEntry<D>]) -> Option<ArrayDescriptor> {
        let first = sources.first()?.image()?;
        let extent = first.extent();
        Some(ArrayDescriptor {
            edge_size: extent.width,
            format: first.format(),
            mip_count: first.mip_count().max(1),
            slice_count: sources.len() as u32,
            srgb: first.is_srgb(),
        })
    }

    /// Extent of every slice at mip level 0.
    pub const fn extent(&self) -> Extent {
        Extent::square(self.edge_size)
    }

    /// Format to allocate, with the color-space flag applied.
    pub const fn allocation_format(&self) -> PixelFormat {
        self.format.with_srgb(self.srgb)
    }
}
