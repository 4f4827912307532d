// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Pixel format definitions for source images and array textures.
//!
//! Every slice of an array texture shares the format of source image 0, and that
//! format is only known once the source has been resolved at runtime.  Formats
//! are therefore described by the [`PixelFormat`] enum rather than by a type
//! parameter.
//!
//! # Available Formats
//!
//! ## Single Channel
//! - [`PixelFormat::R8Unorm`] - 8-bit normalized unsigned integer
//! - [`PixelFormat::R16Float`] - 16-bit half-precision float
//! - [`PixelFormat::R32Float`] - 32-bit single-precision float
//! - [`PixelFormat::R32Sint`] - 32-bit signed integer
//!
//! ## Multi-Channel
//! - [`PixelFormat::Rg32Float`] - 2-channel 32-bit float (8 bytes total)
//! - [`PixelFormat::Rgba8Unorm`] / [`PixelFormat::Rgba8UnormSrgb`] - 4-channel 8-bit
//! - [`PixelFormat::Bgra8Unorm`] / [`PixelFormat::Bgra8UnormSrgb`] - 4-channel 8-bit, BGRA order
//! - [`PixelFormat::Rgba16Unorm`] / [`PixelFormat::Rgba16Float`] - 4-channel 16-bit
//! - [`PixelFormat::Rgba32Float`] - 4-channel 32-bit float (16 bytes total)
//!
//! # Examples
//!
//! ```
//! use dynamic_texture_array::pixel_formats::PixelFormat;
//!
//! let format = PixelFormat::Rgba8Unorm;
//! assert_eq!(format.bytes_per_pixel(), 4);
//! assert_eq!(format.with_srgb(true), PixelFormat::Rgba8UnormSrgb);
//! ```

/*
Quick note on type design.  A zero-sized type per format would let us typecheck
pixel writes, but the array's format is decided by whatever image lands in slot 0,
which we only learn after resolving it.  An enum is the honest representation.
 */

use std::fmt::{Display, Formatter};

/// Pixel format of a source image or of an array texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    R8Unorm,
    R16Float,
    R32Float,
    R32Sint,
    Rg32Float,
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Bgra8Unorm,
    Bgra8UnormSrgb,
    Rgba16Unorm,
    Rgba16Float,
    Rgba32Float,
}

impl PixelFormat {
    /// Number of bytes one pixel occupies in a tightly packed row.
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            PixelFormat::R8Unorm => 1,
            PixelFormat::R16Float => 2,
            PixelFormat::R32Float | PixelFormat::R32Sint => 4,
            PixelFormat::Rgba8Unorm
            | PixelFormat::Rgba8UnormSrgb
            | PixelFormat::Bgra8Unorm
            | PixelFormat::Bgra8UnormSrgb => 4,
            PixelFormat::Rg32Float | PixelFormat::Rgba16Unorm | PixelFormat::Rgba16Float => 8,
            PixelFormat::Rgba32Float => 16,
        }
    }

    /// Whether texel values are sRGB-encoded.
    pub const fn is_srgb(self) -> bool {
        matches!(self, PixelFormat::Rgba8UnormSrgb | PixelFormat::Bgra8UnormSrgb)
    }

    /**
    Returns the variant of this format with the requested color-space encoding.

    Formats with no sRGB counterpart are returned unchanged.
    */
    pub const fn with_srgb(self, srgb: bool) -> PixelFormat {
        match (self, srgb) {
            (PixelFormat::Rgba8Unorm, true) => PixelFormat::Rgba8UnormSrgb,
            (PixelFormat::Rgba8UnormSrgb, false) => PixelFormat::Rgba8Unorm,
            (PixelFormat::Bgra8Unorm, true) => PixelFormat::Bgra8UnormSrgb,
            (PixelFormat::Bgra8UnormSrgb, false) => PixelFormat::Bgra8Unorm,
            (other, _) => other,
        }
    }

    /**
    Whether a texel copy between the two formats is a plain byte copy.

    sRGB-ness is an interpretation of the stored bytes, so formats that only differ
    in encoding are copy-compatible.
    */
    pub const fn copy_compatible(self, other: PixelFormat) -> bool {
        self.with_srgb(false) as u8 == other.with_srgb(false) as u8
    }

    /// Bytes in one row of `width` pixels, without any backend alignment.
    pub const fn bytes_per_row(self, width: u32) -> u32 {
        width * self.bytes_per_pixel()
    }

    /// An opaque white pixel in this format, used for placeholder images.
    pub fn white_pixel(self) -> Vec<u8> {
        match self {
            PixelFormat::R8Unorm => vec![0xFF],
            PixelFormat::R16Float => ONE_F16.to_le_bytes().to_vec(),
            PixelFormat::R32Float => 1.0f32.to_le_bytes().to_vec(),
            PixelFormat::R32Sint => i32::MAX.to_le_bytes().to_vec(),
            PixelFormat::Rg32Float => [1.0f32, 1.0].iter().flat_map(|f| f.to_le_bytes()).collect(),
            PixelFormat::Rgba8Unorm
            | PixelFormat::Rgba8UnormSrgb
            | PixelFormat::Bgra8Unorm
            | PixelFormat::Bgra8UnormSrgb => vec![0xFF; 4],
            PixelFormat::Rgba16Unorm => vec![0xFF; 8],
            PixelFormat::Rgba16Float => ONE_F16.to_le_bytes().repeat(4),
            PixelFormat::Rgba32Float => 1.0f32.to_le_bytes().repeat(4),
        }
    }
}

/// IEEE 754 half-precision 1.0
const ONE_F16: u16 = 0x3C00;

impl Display for PixelFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srgb_round_trip_only_touches_8bit_formats() {
        assert_eq!(PixelFormat::Rgba8Unorm.with_srgb(true), PixelFormat::Rgba8UnormSrgb);
        assert_eq!(PixelFormat::Bgra8UnormSrgb.with_srgb(false), PixelFormat::Bgra8Unorm);
        assert_eq!(PixelFormat::Rgba32Float.with_srgb(true), PixelFormat::Rgba32Float);
        assert!(!PixelFormat::R8Unorm.with_srgb(true).is_srgb());
    }

    #[test]
    fn copy_compatibility_ignores_encoding() {
        assert!(PixelFormat::Rgba8Unorm.copy_compatible(PixelFormat::Rgba8UnormSrgb));
        assert!(!PixelFormat::Rgba8Unorm.copy_compatible(PixelFormat::Bgra8Unorm));
        assert!(PixelFormat::R32Float.copy_compatible(PixelFormat::R32Float));
    }

    #[test]
    fn white_pixel_matches_pixel_size() {
        for format in [
            PixelFormat::R8Unorm,
            PixelFormat::R16Float,
            PixelFormat::R32Float,
            PixelFormat::R32Sint,
            PixelFormat::Rg32Float,
            PixelFormat::Rgba8Unorm,
            PixelFormat::Rgba8UnormSrgb,
            PixelFormat::Bgra8Unorm,
            PixelFormat::Bgra8UnormSrgb,
            PixelFormat::Rgba16Unorm,
            PixelFormat::Rgba16Float,
            PixelFormat::Rgba32Float,
        ] {
            assert_eq!(format.white_pixel().len() as u32, format.bytes_per_pixel(), "{format}");
        }
    }
}
