// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
A device that keeps textures in CPU memory.

Copies are byte-exact, so slice content can be read back and compared.  Every
device call is recorded in an event log; tests use it to check what happened on
the graphics context and in which order.
*/

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::array::descriptor::ArrayDescriptor;
use crate::array::source::StaticImage;
use crate::bindings::sampler::SamplerConfig;
use crate::device::{CopyRegion, Device, Extent, ImageInfo, TextureKind};
use crate::error::Error;
use crate::pixel_formats::PixelFormat;

/// Resource limits of a [`SoftDevice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftLimits {
    pub max_edge: u32,
    pub max_array_layers: u32,
}

impl Default for SoftLimits {
    fn default() -> Self {
        SoftLimits {
            max_edge: 8192,
            max_array_layers: 256,
        }
    }
}

/// One recorded device call.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    CreateArray {
        texture: u64,
        label: String,
        descriptor: ArrayDescriptor,
    },
    CreateImage {
        texture: u64,
        label: String,
        info: ImageInfo,
    },
    Release {
        texture: u64,
    },
    Copy {
        source: u64,
        destination: u64,
        source_mip: u32,
        dest_mip: u32,
        dest_slice: u32,
        extent: Extent,
    },
    CreateSampler {
        config: SamplerConfig,
    },
}

struct SoftTextureInner {
    id: u64,
    label: String,
    kind: TextureKind,
    extent: Extent,
    format: PixelFormat,
    mip_count: u32,
    slices: u32,
    released: AtomicBool,
    //indexed by slice * mip_count + mip
    levels: Mutex<Vec<Vec<u8>>>,
}

/// Handle to a texture on a [`SoftDevice`].
#[derive(Clone)]
pub struct SoftTexture(Arc<SoftTextureInner>);

impl SoftTexture {
    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn label(&self) -> &str {
        &self.0.label
    }

    pub fn kind(&self) -> TextureKind {
        self.0.kind
    }

    pub fn extent(&self) -> Extent {
        self.0.extent
    }

    pub fn format(&self) -> PixelFormat {
        self.0.format
    }

    pub fn mip_count(&self) -> u32 {
        self.0.mip_count
    }

    pub fn slices(&self) -> u32 {
        self.0.slices
    }

    pub fn is_released(&self) -> bool {
        self.0.released.load(Ordering::Acquire)
    }

    /**
    Reads back one mip level of one slice, tightly packed.

    # Panics
    Panics if `slice` or `mip` is out of range.
    */
    pub fn read(&self, slice: u32, mip: u32) -> Vec<u8> {
        assert!(slice < self.0.slices, "slice {slice} out of range");
        assert!(mip < self.0.mip_count, "mip {mip} out of range");
        let levels = self
            .0
            .levels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        levels[self.level_index(slice, mip)].clone()
    }

    fn level_index(&self, slice: u32, mip: u32) -> usize {
        (slice * self.0.mip_count + mip) as usize
    }
}

impl PartialEq for SoftTexture {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Debug for SoftTexture {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftTexture")
            .field("id", &self.0.id)
            .field("label", &self.0.label)
            .field("kind", &self.0.kind)
            .field("extent", &self.0.extent)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftSampler {
    pub id: u64,
    pub config: SamplerConfig,
}

#[derive(Debug)]
pub struct SoftDevice {
    limits: SoftLimits,
    next_id: AtomicU64,
    live_arrays: AtomicUsize,
    events: Mutex<Vec<DeviceEvent>>,
    samplers: Mutex<HashMap<SamplerConfig, SoftSampler>>,
}

impl SoftDevice {
    pub fn new() -> Self {
        Self::with_limits(SoftLimits::default())
    }

    pub fn with_limits(limits: SoftLimits) -> Self {
        SoftDevice {
            limits,
            next_id: AtomicU64::new(1),
            live_arrays: AtomicUsize::new(0),
            events: Mutex::new(Vec::new()),
            samplers: Mutex::new(HashMap::new()),
        }
    }

    /// Every device call so far, oldest first.
    pub fn events(&self) -> Vec<DeviceEvent> {
        self.lock_events().clone()
    }

    pub fn clear_events(&self) {
        self.lock_events().clear();
    }

    /// Number of array textures created and not yet released.
    pub fn live_arrays(&self) -> usize {
        self.live_arrays.load(Ordering::Acquire)
    }

    /**
    Creates an image whose every byte, in every mip, is `fill`.

    Useful as a source whose slice content is easy to recognize.
    */
    pub fn solid_image(
        &self,
        name: &str,
        edge: u32,
        format: PixelFormat,
        mip_count: u32,
        fill: u8,
    ) -> Result<Arc<StaticImage<SoftDevice>>, Error> {
        let info = ImageInfo {
            extent: Extent::square(edge),
            format,
            mip_count,
        };
        let mips: Vec<Vec<u8>> = (0..mip_count)
            .map(|mip| vec![fill; info.mip_byte_len(mip)])
            .collect();
        StaticImage::from_pixels(self, name, info, &mips)
    }

    fn lock_events(&self) -> std::sync::MutexGuard<'_, Vec<DeviceEvent>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, event: DeviceEvent) {
        self.lock_events().push(event);
    }

    fn check_edge(&self, extent: Extent) -> Result<(), Error> {
        if extent.width == 0 || extent.height == 0 {
            return Err(Error::EmptyExtent);
        }
        let edge = extent.width.max(extent.height);
        if edge > self.limits.max_edge {
            return Err(Error::TooLarge {
                edge,
                limit: self.limits.max_edge,
            });
        }
        Ok(())
    }

    fn new_texture(
        &self,
        label: &str,
        kind: TextureKind,
        info: &ImageInfo,
        slices: u32,
        levels: Vec<Vec<u8>>,
    ) -> SoftTexture {
        SoftTexture(Arc::new(SoftTextureInner {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            label: label.to_string(),
            kind,
            extent: info.extent,
            format: info.format,
            mip_count: info.mip_count,
            slices,
            released: AtomicBool::new(false),
            levels: Mutex::new(levels),
        }))
    }
}

impl Default for SoftDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for SoftDevice {
    type Texture = SoftTexture;
    type Sampler = SoftSampler;

    fn create_array_texture(
        &self,
        descriptor: &ArrayDescriptor,
        debug_name: &str,
    ) -> Result<SoftTexture, Error> {
        self.check_edge(descriptor.extent())?;
        if descriptor.slice_count > self.limits.max_array_layers {
            return Err(Error::TooManySlices {
                slices: descriptor.slice_count,
                limit: self.limits.max_array_layers,
            });
        }
        let info = ImageInfo {
            extent: descriptor.extent(),
            format: descriptor.allocation_format(),
            mip_count: descriptor.mip_count,
        };
        let mut levels = Vec::with_capacity((descriptor.slice_count * info.mip_count) as usize);
        for _ in 0..descriptor.slice_count {
            for mip in 0..info.mip_count {
                levels.push(vec![0; info.mip_byte_len(mip)]);
            }
        }
        let texture = self.new_texture(
            debug_name,
            TextureKind::Array2D,
            &info,
            descriptor.slice_count,
            levels,
        );
        self.live_arrays.fetch_add(1, Ordering::AcqRel);
        self.record(DeviceEvent::CreateArray {
            texture: texture.id(),
            label: debug_name.to_string(),
            descriptor: *descriptor,
        });
        Ok(texture)
    }

    fn create_image(
        &self,
        info: &ImageInfo,
        mips: &[Vec<u8>],
        debug_name: &str,
    ) -> Result<SoftTexture, Error> {
        self.check_edge(info.extent)?;
        for mip in 0..info.mip_count {
            let expected = info.mip_byte_len(mip);
            let actual = mips.get(mip as usize).map_or(0, Vec::len);
            if actual != expected {
                return Err(Error::PixelDataSize {
                    mip,
                    expected,
                    actual,
                });
            }
        }
        let levels = mips[..info.mip_count as usize].to_vec();
        let texture = self.new_texture(debug_name, TextureKind::Image2D, info, 1, levels);
        self.record(DeviceEvent::CreateImage {
            texture: texture.id(),
            label: debug_name.to_string(),
            info: *info,
        });
        Ok(texture)
    }

    fn release_texture(&self, texture: SoftTexture) {
        if texture.0.released.swap(true, Ordering::AcqRel) {
            logwise::warn_sync!("soft texture {id} released twice", id = texture.id());
            return;
        }
        if texture.kind() == TextureKind::Array2D {
            self.live_arrays.fetch_sub(1, Ordering::AcqRel);
        }
        self.record(DeviceEvent::Release {
            texture: texture.id(),
        });
    }

    fn sampler(&self, config: &SamplerConfig) -> SoftSampler {
        let mut samplers = self
            .samplers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(sampler) = samplers.get(config) {
            return sampler.clone();
        }
        let sampler = SoftSampler {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            config: *config,
        };
        samplers.insert(*config, sampler.clone());
        drop(samplers);
        self.record(DeviceEvent::CreateSampler { config: *config });
        sampler
    }

    fn copy_regions(&self, destination: &SoftTexture, regions: &[CopyRegion<SoftTexture>]) {
        for region in regions {
            if region.source == *destination {
                logwise::error_sync!(
                    "soft copy from texture {id} into itself",
                    id = destination.id()
                );
                continue;
            }
            let bytes_per_pixel = destination.format().bytes_per_pixel() as usize;
            let source_extent = region.source.extent().mip(region.source_mip);
            let dest_extent = destination.extent().mip(region.dest_mip);
            let width = region.extent.width.min(source_extent.width).min(dest_extent.width) as usize;
            let height =
                region.extent.height.min(source_extent.height).min(dest_extent.height) as usize;
            let row_bytes = width * bytes_per_pixel;
            let source_stride = source_extent.width as usize * bytes_per_pixel;
            let dest_stride = dest_extent.width as usize * bytes_per_pixel;

            let source_levels = region
                .source
                .0
                .levels
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let mut dest_levels = destination
                .0
                .levels
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let source_level = &source_levels[region.source.level_index(0, region.source_mip)];
            let dest_level =
                &mut dest_levels[destination.level_index(region.dest_slice, region.dest_mip)];
            for row in 0..height {
                let from = row * source_stride;
                let to = row * dest_stride;
                dest_level[to..to + row_bytes]
                    .copy_from_slice(&source_level[from..from + row_bytes]);
            }
            drop(dest_levels);
            drop(source_levels);

            self.record(DeviceEvent::Copy {
                source: region.source.id(),
                destination: destination.id(),
                source_mip: region.source_mip,
                dest_mip: region.dest_mip,
                dest_slice: region.dest_slice,
                extent: region.extent,
            });
        }
    }
}

/// A resident test image filled with `fill`.
#[cfg(test)]
pub(crate) fn test_image(
    device: &SoftDevice,
    name: &str,
    edge: u32,
    format: PixelFormat,
    mip_count: u32,
    fill: u8,
) -> Arc<dyn crate::array::source::SourceImage<SoftDevice>> {
    device
        .solid_image(name, edge, format, mip_count, fill)
        .expect("test image")
}
