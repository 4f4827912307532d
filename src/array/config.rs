// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::pixel_formats::PixelFormat;

/// Format of the white placeholder image.
pub const PLACEHOLDER_FORMAT: PixelFormat = PixelFormat::Rgba8UnormSrgb;

/**
Per-array settings.

`debug_name` labels the device allocation so it can be found in graphics
debuggers, and names the array in log output.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayConfig {
    pub debug_name: String,
    /// Edge length of the placeholder created by [`crate::DynamicTextureArray::with_placeholder`].
    pub placeholder_edge: u32,
}

impl ArrayConfig {
    pub fn new(debug_name: impl Into<String>) -> Self {
        ArrayConfig {
            debug_name: debug_name.into(),
            ..Default::default()
        }
    }
}

impl Default for ArrayConfig {
    fn default() -> Self {
        ArrayConfig {
            debug_name: "DynamicTextureArray".to_string(),
            placeholder_edge: 4,
        }
    }
}
