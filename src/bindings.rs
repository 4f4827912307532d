// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Defines binding types */

pub mod sampler;
pub mod texture_reference;

pub use texture_reference::{BoundArray, TextureReference};
