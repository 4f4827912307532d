// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::pixel_formats::PixelFormat;

/**
Errors reported by a [`crate::device::Device`].

The array manager never surfaces these to its callers; they are logged on the
graphics context and the affected resource is left absent.  They are returned
from the fallible construction paths (devices, images) instead.
*/
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{format} is not supported by this device")]
    UnsupportedFormat { format: PixelFormat },
    #[error("array texture of {slices} slices exceeds the device limit of {limit}")]
    TooManySlices { slices: u32, limit: u32 },
    #[error("texture extent must be non-zero")]
    EmptyExtent,
    #[error("texture edge {edge} exceeds the device limit of {limit}")]
    TooLarge { edge: u32, limit: u32 },
    #[error("expected {expected} bytes of pixel data for mip {mip}, got {actual}")]
    PixelDataSize {
        mip: u32,
        expected: usize,
        actual: usize,
    },
    #[cfg(feature = "backend_wgpu")]
    #[error(transparent)]
    Wgpu(#[from] crate::imp::wgpu::Error),
}
