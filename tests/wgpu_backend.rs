// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Dynamic texture arrays on a real wgpu device.
//!
//! Machines without a usable adapter skip these tests.
#![cfg(feature = "backend_wgpu")]

use std::sync::Arc;

use dynamic_texture_array::array::source::{MemoryImageStore, StaticImage};
use dynamic_texture_array::device::{Device, Extent, ImageInfo, TextureKind};
use dynamic_texture_array::imp::wgpu::WgpuDevice;
use dynamic_texture_array::pixel_formats::PixelFormat;
use dynamic_texture_array::{ArrayConfig, DynamicTextureArray, Error, GraphicsContext, SourceRef};

fn device() -> Option<Arc<WgpuDevice>> {
    match test_executors::sleep_on(WgpuDevice::new("wgpu_backend_test")) {
        Ok(device) => Some(Arc::new(device)),
        Err(e) => {
            println!("skipping, no wgpu device: {e}");
            None
        }
    }
}

/// A 300px image is wide enough that its rows need padding on read-back.
fn striped(device: &WgpuDevice, name: &str, fill: u8) -> SourceRef<WgpuDevice> {
    let info = ImageInfo {
        extent: Extent::square(300),
        format: PixelFormat::Rgba8Unorm,
        mip_count: 2,
    };
    let mips: Vec<Vec<u8>> = (0..info.mip_count)
        .map(|mip| {
            let extent = info.extent.mip(mip);
            (0..extent.height)
                .flat_map(|row| {
                    std::iter::repeat_n(fill.wrapping_add(row as u8), extent.width as usize * 4)
                })
                .collect()
        })
        .collect();
    SourceRef::loaded(StaticImage::from_pixels(device, name, info, &mips).unwrap())
}

fn array(
    context: &GraphicsContext,
    device: &Arc<WgpuDevice>,
    sources: Vec<SourceRef<WgpuDevice>>,
) -> DynamicTextureArray<WgpuDevice> {
    DynamicTextureArray::new(
        context.clone(),
        device.clone(),
        Arc::new(MemoryImageStore::<WgpuDevice>::new()),
        sources,
        ArrayConfig::new("wgpu array"),
    )
}

fn read(
    device: &WgpuDevice,
    array: &DynamicTextureArray<WgpuDevice>,
    slice: u32,
    mip: u32,
) -> Vec<u8> {
    test_executors::sleep_on(array.fence());
    let texture = array.binding().current().expect("array is bound").texture;
    test_executors::sleep_on(device.read_slice(&texture, slice, mip)).unwrap()
}

#[test]
fn slices_hold_their_sources() {
    let Some(device) = device() else { return };
    let context = GraphicsContext::new("wgpu_slices");
    let array = array(
        &context,
        &device,
        vec![striped(&device, "a", 10), striped(&device, "b", 50)],
    );

    let expected_row =
        |fill: u8, row: u32, width: u32| vec![fill.wrapping_add(row as u8); width as usize * 4];
    let slice_1 = read(&device, &array, 1, 0);
    assert_eq!(slice_1.len(), 300 * 300 * 4);
    assert_eq!(&slice_1[..1200], expected_row(50, 0, 300).as_slice());
    assert_eq!(&slice_1[1200 * 7..1200 * 8], expected_row(50, 7, 300).as_slice());

    let slice_0_mip_1 = read(&device, &array, 0, 1);
    assert_eq!(slice_0_mip_1.len(), 150 * 150 * 4);
    assert_eq!(&slice_0_mip_1[600 * 3..600 * 4], expected_row(10, 3, 150).as_slice());

    array.set_source(striped(&device, "c", 90), 0);
    let slice_0 = read(&device, &array, 0, 0);
    assert_eq!(&slice_0[..1200], expected_row(90, 0, 300).as_slice());
    let slice_1_again = read(&device, &array, 1, 0);
    assert_eq!(slice_1_again, slice_1);
}

#[test]
fn array_texture_has_every_layer() {
    let Some(device) = device() else { return };
    let context = GraphicsContext::new("wgpu_layers");
    let sources = (0..5).map(|i| striped(&device, &format!("layer {i}"), i * 20)).collect();
    let array = array(&context, &device, sources);
    test_executors::sleep_on(array.fence());

    let texture = array.binding().current().expect("array is bound").texture;
    assert_eq!(texture.kind(), TextureKind::Array2D);
    assert_eq!(texture.layers(), 5);
    assert_eq!(texture.extent(), Extent::square(300));
    assert_eq!(texture.wgpu().mip_level_count(), 2);
    let _view = texture.array_view();

    array.set_sources(Vec::new());
    test_executors::sleep_on(array.fence());
    assert!(array.binding().current().is_none());
}

#[test]
fn oversized_arrays_are_rejected() {
    let Some(device) = device() else { return };
    let limit = device.wgpu_device().limits().max_texture_dimension_2d;
    let descriptor = dynamic_texture_array::ArrayDescriptor {
        edge_size: limit + 1,
        format: PixelFormat::Rgba8Unorm,
        mip_count: 1,
        slice_count: 1,
        srgb: false,
    };
    let result = device.create_array_texture(&descriptor, "too big");
    assert!(matches!(result, Err(Error::TooLarge { .. })));
}
