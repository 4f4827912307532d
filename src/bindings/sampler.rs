// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Sampler state attached to array textures.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    ///Nearest texel, no interpolation.
    Point,
    ///Linear interpolation within a mip, nearest mip.
    Bilinear,
    ///Linear interpolation within and between mips.
    Trilinear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    Wrap,
    Clamp,
    Mirror,
}

/**
Filter and addressing used when sampling an array texture.

The same address mode applies to every axis.  Array textures default to bilinear
filtering with wrap addressing.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerConfig {
    pub filter: Filter,
    pub address_mode: AddressMode,
}

impl SamplerConfig {
    pub const BILINEAR_WRAP: SamplerConfig = SamplerConfig {
        filter: Filter::Bilinear,
        address_mode: AddressMode::Wrap,
    };
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig::BILINEAR_WRAP
    }
}
