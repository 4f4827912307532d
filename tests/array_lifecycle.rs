// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Allocation, reallocation and release of dynamic texture arrays, observed through
//! the software device's event log.

use std::sync::Arc;

use dynamic_texture_array::array::source::{MemoryImageStore, StaticImage};
use dynamic_texture_array::device::{Extent, ImageInfo, TextureKind, TextureResource};
use dynamic_texture_array::imp::soft::{DeviceEvent, SoftDevice, SoftLimits};
use dynamic_texture_array::pixel_formats::PixelFormat;
use dynamic_texture_array::{
    ArrayConfig, ArrayDescriptor, DynamicTextureArray, GraphicsContext, ResourceState, SourceRef,
};

fn solid(device: &SoftDevice, name: &str, edge: u32, mips: u32, fill: u8) -> SourceRef<SoftDevice> {
    SourceRef::loaded(
        device
            .solid_image(name, edge, PixelFormat::Rgba8Unorm, mips, fill)
            .unwrap(),
    )
}

fn array(
    context: &GraphicsContext,
    device: &Arc<SoftDevice>,
    sources: Vec<SourceRef<SoftDevice>>,
) -> DynamicTextureArray<SoftDevice> {
    DynamicTextureArray::new(
        context.clone(),
        device.clone(),
        Arc::new(MemoryImageStore::<SoftDevice>::new()),
        sources,
        ArrayConfig::new("lifecycle"),
    )
}

fn copied(device: &SoftDevice) -> Vec<(u32, u32)> {
    device
        .events()
        .iter()
        .filter_map(|event| match event {
            DeviceEvent::Copy {
                dest_slice,
                dest_mip,
                ..
            } => Some((*dest_slice, *dest_mip)),
            _ => None,
        })
        .collect()
}

fn read(array: &DynamicTextureArray<SoftDevice>, slice: u32, mip: u32) -> Vec<u8> {
    array
        .binding()
        .current()
        .expect("array is bound")
        .texture
        .read(slice, mip)
}

#[test]
fn descriptor_follows_the_first_source() {
    let context = GraphicsContext::new("descriptor_test");
    let device = Arc::new(SoftDevice::new());
    let first = SourceRef::loaded(
        device
            .solid_image("first", 64, PixelFormat::Rgba8UnormSrgb, 3, 1)
            .unwrap(),
    );
    let array = array(
        &context,
        &device,
        vec![first, SourceRef::path("missing"), solid(&device, "third", 16, 1, 3)],
    );
    assert_eq!(array.slice_count(), 3);
    assert_eq!(array.edge_size(), Some(64));
    assert_eq!(array.mip_count(), Some(3));
    assert_eq!(array.pixel_format(), Some(PixelFormat::Rgba8UnormSrgb));

    let expected = ArrayDescriptor {
        edge_size: 64,
        format: PixelFormat::Rgba8UnormSrgb,
        mip_count: 3,
        slice_count: 3,
        srgb: true,
    };
    assert_eq!(array.descriptor(), Some(expected));
    assert_eq!(test_executors::sleep_on(array.live_descriptor()), Some(expected));
    assert_eq!(test_executors::sleep_on(array.live_state()), ResourceState::Allocated);

    assert_eq!(array.kind(), TextureKind::Array2D);
    assert_eq!(array.extent(), Extent::square(64));
    assert_eq!(TextureResource::mip_count(&array), 3);
    assert!(array.bind().is_some());
}

#[test]
fn non_square_first_source_fills_its_own_slice() {
    let context = GraphicsContext::new("non_square_test");
    let device = Arc::new(SoftDevice::new());
    let info = ImageInfo {
        extent: Extent::new(8, 4),
        format: PixelFormat::Rgba8Unorm,
        mip_count: 1,
    };
    let wide = StaticImage::from_pixels(&*device, "wide", info, &[vec![7; 8 * 4 * 4]]).unwrap();
    let array = array(&context, &device, vec![SourceRef::loaded(wide)]);
    test_executors::sleep_on(array.fence());

    assert_eq!(array.edge_size(), Some(8));
    assert_eq!(copied(&device), vec![(0, 0)]);
    let slice = read(&array, 0, 0);
    let row_bytes = 8 * 4;
    assert_eq!(&slice[..4 * row_bytes], vec![7; 4 * row_bytes].as_slice());
    assert_eq!(&slice[4 * row_bytes..], vec![0; 4 * row_bytes].as_slice());
}

#[test]
fn force_update_twice_is_the_same_as_once() {
    let context = GraphicsContext::new("force_test");
    let device = Arc::new(SoftDevice::new());
    let array = array(
        &context,
        &device,
        vec![solid(&device, "a", 8, 2, 10), solid(&device, "b", 8, 2, 20)],
    );

    array.force_update();
    test_executors::sleep_on(array.fence());
    let once_shape = test_executors::sleep_on(array.live_descriptor());
    let once_content = (read(&array, 0, 0), read(&array, 1, 1));
    device.clear_events();

    array.force_update();
    test_executors::sleep_on(array.fence());
    let last_pass = copied(&device);
    array.force_update();
    test_executors::sleep_on(array.fence());

    assert_eq!(test_executors::sleep_on(array.live_descriptor()), once_shape);
    assert_eq!((read(&array, 0, 0), read(&array, 1, 1)), once_content);
    assert_eq!(last_pass, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    assert_eq!(copied(&device), [last_pass.clone(), last_pass].concat());
    assert_eq!(device.live_arrays(), 1);
}

#[test]
fn edge_change_releases_then_allocates_before_copying() {
    let context = GraphicsContext::new("edge_change_test");
    let device = Arc::new(SoftDevice::new());
    let array = array(
        &context,
        &device,
        vec![solid(&device, "a", 32, 1, 1), solid(&device, "b", 32, 1, 2)],
    );
    test_executors::sleep_on(array.fence());
    let old = array.binding().current().unwrap().texture;

    let bigger = solid(&device, "bigger", 64, 1, 9);
    device.clear_events();
    array.set_source(bigger, 0);
    test_executors::sleep_on(array.fence());

    let events = device.events();
    assert_eq!(
        events[0],
        DeviceEvent::Release {
            texture: old.id()
        }
    );
    assert!(matches!(
        &events[1],
        DeviceEvent::CreateArray { descriptor, .. } if descriptor.edge_size == 64 && descriptor.slice_count == 2
    ));
    assert!(
        events[2..]
            .iter()
            .all(|event| matches!(event, DeviceEvent::Copy { .. }))
    );
    assert_eq!(copied(&device), vec![(0, 0)]);
    assert!(old.is_released());
    assert_eq!(read(&array, 0, 0), vec![9; 64 * 64 * 4]);
    // only the replaced slice is refreshed
    assert_eq!(read(&array, 1, 0), vec![0; 64 * 64 * 4]);
}

#[test]
fn replacing_every_source_with_a_new_shape_rebuilds_once() {
    let context = GraphicsContext::new("xyz_test");
    let device = Arc::new(SoftDevice::new());
    let array = array(&context, &device, vec![solid(&device, "a", 16, 1, 1)]);
    test_executors::sleep_on(array.fence());
    let generation = array.binding().generation();

    let sources = vec![
        solid(&device, "x", 8, 1, 24),
        solid(&device, "y", 8, 1, 25),
        solid(&device, "z", 8, 1, 26),
    ];
    device.clear_events();
    array.set_sources(sources);
    test_executors::sleep_on(array.fence());

    let creations = device
        .events()
        .iter()
        .filter(|event| matches!(event, DeviceEvent::CreateArray { .. }))
        .count();
    assert_eq!(creations, 1);
    assert_eq!(copied(&device), vec![(0, 0), (1, 0), (2, 0)]);
    for (slice, fill) in [(0, 24), (1, 25), (2, 26)] {
        assert_eq!(read(&array, slice, 0), vec![fill; 8 * 8 * 4]);
    }
    // release and reallocation each redirect the binding
    assert_eq!(array.binding().generation(), generation + 2);
    assert_eq!(device.live_arrays(), 1);
}

#[test]
fn empty_collection_releases_the_array() {
    let context = GraphicsContext::new("empty_test");
    let device = Arc::new(SoftDevice::new());
    let array = array(&context, &device, vec![solid(&device, "a", 4, 1, 1)]);
    test_executors::sleep_on(array.fence());
    assert_eq!(device.live_arrays(), 1);

    array.set_sources(Vec::new());
    assert_eq!(array.descriptor(), None);
    assert_eq!(array.slice_count(), 0);
    assert_eq!(test_executors::sleep_on(array.live_state()), ResourceState::Released);
    assert_eq!(device.live_arrays(), 0);
    assert!(array.binding().current().is_none());
    assert_eq!(array.extent(), Extent::square(0));
}

#[test]
fn unresolved_first_source_leaves_the_array_absent() {
    let context = GraphicsContext::new("unresolved_test");
    let device = Arc::new(SoftDevice::new());
    let array = array(
        &context,
        &device,
        vec![SourceRef::path("not/loaded"), solid(&device, "b", 4, 1, 1)],
    );
    assert_eq!(array.slice_count(), 2);
    assert_eq!(array.descriptor(), None);
    assert_eq!(
        test_executors::sleep_on(array.live_state()),
        ResourceState::Uninitialized
    );
    assert!(copied(&device).is_empty());
}

#[test]
fn failed_allocation_recovers_on_the_next_update() {
    let context = GraphicsContext::new("limits_test");
    let device = Arc::new(SoftDevice::with_limits(SoftLimits {
        max_edge: 64,
        max_array_layers: 2,
    }));
    let array = array(
        &context,
        &device,
        vec![
            solid(&device, "a", 4, 1, 1),
            solid(&device, "b", 4, 1, 2),
            solid(&device, "c", 4, 1, 3),
        ],
    );
    assert_eq!(test_executors::sleep_on(array.live_descriptor()), None);
    assert!(copied(&device).is_empty());

    array.set_sources(vec![solid(&device, "a", 4, 1, 1), solid(&device, "b", 4, 1, 2)]);
    assert_eq!(
        test_executors::sleep_on(array.live_descriptor()).map(|d| d.slice_count),
        Some(2)
    );
    assert_eq!(read(&array, 1, 0), vec![2; 64]);
}

#[test]
fn dropping_the_array_releases_its_texture() {
    let context = GraphicsContext::new("drop_test");
    let device = Arc::new(SoftDevice::new());
    let binding = {
        let array = array(&context, &device, vec![solid(&device, "a", 4, 1, 1)]);
        test_executors::sleep_on(array.fence());
        array.binding()
    };
    test_executors::sleep_on(context.fence());
    assert_eq!(device.live_arrays(), 0);
    assert!(binding.current().is_none());
}

#[test]
fn placeholder_is_a_single_white_slice() {
    let context = GraphicsContext::new("placeholder_test");
    let device = Arc::new(SoftDevice::new());
    let array = DynamicTextureArray::with_placeholder(
        context,
        device.clone(),
        Arc::new(MemoryImageStore::<SoftDevice>::new()),
        ArrayConfig::new("placeholder"),
    )
    .unwrap();
    assert_eq!(array.slice_count(), 1);
    assert_eq!(array.edge_size(), Some(4));
    assert_eq!(array.pixel_format(), Some(PixelFormat::Rgba8UnormSrgb));
    test_executors::sleep_on(array.fence());
    assert_eq!(read(&array, 0, 0), vec![0xFF; 4 * 4 * 4]);

    let created = device.events().into_iter().find_map(|event| match event {
        DeviceEvent::CreateArray { label, .. } => Some(label),
        _ => None,
    });
    assert_eq!(created.as_deref(), Some("placeholder"));
}

#[test]
fn array_sampler_is_bilinear_wrap_and_shared() {
    use dynamic_texture_array::bindings::sampler::SamplerConfig;

    let context = GraphicsContext::new("sampler_test");
    let device = Arc::new(SoftDevice::new());
    let first = array(&context, &device, vec![solid(&device, "a", 4, 1, 1)]);
    let second = array(&context, &device, vec![solid(&device, "b", 8, 1, 1)]);
    test_executors::sleep_on(context.fence());

    let a = first.binding().current().unwrap().sampler;
    let b = second.binding().current().unwrap().sampler;
    assert_eq!(a.config, SamplerConfig::BILINEAR_WRAP);
    assert_eq!(a, b);
}
