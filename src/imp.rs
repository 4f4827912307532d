// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Device backends.

pub mod soft;

#[cfg(feature = "backend_wgpu")]
pub mod wgpu;
