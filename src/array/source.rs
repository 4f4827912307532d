// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Source images and the references that name them.

The array does not own its sources.  Callers hand it [`SourceRef`]s: either an image
that is already loaded, or a path the [`ImageStore`] can resolve.  When a reference
is adopted into the collection it is resolved (blocking if needed) and the image is
pinned resident so its device texture stays available as a copy source.
*/

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::device::{Device, Extent, ImageInfo, TextureKind, TextureResource};
use crate::error::Error;
use crate::pixel_formats::PixelFormat;

/**
A 2D image that can be copied into an array slice.
*/
pub trait SourceImage<D: Device>: TextureResource<D> {
    fn name(&self) -> &str;

    /// Whether texel values should be read as sRGB.
    fn is_srgb(&self) -> bool {
        self.format().is_srgb()
    }

    /**
    Forces the image to stay fully resident, disabling streaming eviction.

    Idempotent.  Returns `true` only for the call that actually changed the policy.
    */
    fn pin_resident(&self) -> bool;

    fn is_pinned(&self) -> bool;
}

/**
Resolves paths to images.

Resolution happens on the caller's thread and may block, for example while the image
is loaded from disk.
*/
pub trait ImageStore<D: Device>: Send + Sync {
    fn load_synchronous(&self, path: &str) -> Option<Arc<dyn SourceImage<D>>>;
}

/**
A possibly-unloaded reference to a source image.

A reference holding neither a path nor an image is null.
*/
pub struct SourceRef<D: Device> {
    path: Option<String>,
    image: Option<Arc<dyn SourceImage<D>>>,
}

impl<D: Device> SourceRef<D> {
    pub fn null() -> Self {
        SourceRef {
            path: None,
            image: None,
        }
    }

    /// A reference that will be resolved through the [`ImageStore`].
    pub fn path(path: impl Into<String>) -> Self {
        SourceRef {
            path: Some(path.into()),
            image: None,
        }
    }

    /// A reference to an image that is already loaded.
    pub fn loaded(image: Arc<dyn SourceImage<D>>) -> Self {
        SourceRef {
            path: Some(image.name().to_string()),
            image: Some(image),
        }
    }

    pub fn is_null(&self) -> bool {
        self.path.is_none() && self.image.is_none()
    }

    pub fn path_str(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Loads the image if needed.  May block.
    pub fn resolve(&self, store: &dyn ImageStore<D>) -> Option<Arc<dyn SourceImage<D>>> {
        if let Some(image) = &self.image {
            return Some(image.clone());
        }
        let path = self.path.as_deref()?;
        let image = store.load_synchronous(path);
        if image.is_none() {
            logwise::warn_sync!(
                "source image {path} could not be loaded",
                path = logwise::privacy::LogIt(path)
            );
        }
        image
    }
}

impl<D: Device> Clone for SourceRef<D> {
    fn clone(&self) -> Self {
        SourceRef {
            path: self.path.clone(),
            image: self.image.clone(),
        }
    }
}

impl<D: Device> Debug for SourceRef<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRef")
            .field("path", &self.path)
            .field("loaded", &self.image.is_some())
            .finish()
    }
}

/**
One slot of the source collection: the reference the caller gave us, and the image it
resolved to at adoption time.

Slots whose reference did not resolve still occupy a slice.
*/
pub struct SourceEntry<D: Device> {
    source: SourceRef<D>,
    image: Option<Arc<dyn SourceImage<D>>>,
}

impl<D: Device> SourceEntry<D> {
    /**
    Resolves `source` and pins the result.  May block.
    */
    pub(crate) fn adopt(source: SourceRef<D>, store: &dyn ImageStore<D>) -> Self {
        let image = source.resolve(store);
        if let Some(image) = &image {
            if image.pin_resident() {
                logwise::trace_sync!(
                    "pinned {name} resident",
                    name = logwise::privacy::LogIt(image.name())
                );
            }
        }
        SourceEntry { source, image }
    }

    #[cfg(test)]
    pub(crate) fn resolved(image: Arc<dyn SourceImage<D>>) -> Self {
        SourceEntry {
            source: SourceRef::loaded(image.clone()),
            image: Some(image),
        }
    }

    #[cfg(test)]
    pub(crate) fn unresolved() -> Self {
        SourceEntry {
            source: SourceRef::null(),
            image: None,
        }
    }

    pub fn source(&self) -> &SourceRef<D> {
        &self.source
    }

    pub fn image(&self) -> Option<&Arc<dyn SourceImage<D>>> {
        self.image.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.image.is_some()
    }
}

impl<D: Device> Clone for SourceEntry<D> {
    fn clone(&self) -> Self {
        SourceEntry {
            source: self.source.clone(),
            image: self.image.clone(),
        }
    }
}

impl<D: Device> Debug for SourceEntry<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceEntry")
            .field("source", &self.source)
            .field("resolved", &self.image.as_ref().map(|i| i.name().to_string()))
            .finish()
    }
}

/**
An image whose device texture is created up front, or supplied later.

A `StaticImage` created with [`StaticImage::pending`] has no texture yet; it resolves
and can be adopted, but copies from it are skipped until [`StaticImage::provide`] is
called, the same way a streamed image behaves before its data arrives.
*/
pub struct StaticImage<D: Device> {
    name: String,
    info: ImageInfo,
    srgb: bool,
    pinned: AtomicBool,
    texture: Mutex<Option<D::Texture>>,
}

impl<D: Device> StaticImage<D> {
    /**
    Creates the image on `device` from tightly packed pixel data, one buffer per mip.
    */
    pub fn from_pixels(
        device: &D,
        name: &str,
        info: ImageInfo,
        mips: &[Vec<u8>],
    ) -> Result<Arc<Self>, Error> {
        let texture = device.create_image(&info, mips, name)?;
        Ok(Arc::new(StaticImage {
            name: name.to_string(),
            info,
            srgb: info.format.is_srgb(),
            pinned: AtomicBool::new(false),
            texture: Mutex::new(Some(texture)),
        }))
    }

    /**
    A single-mip image filled with opaque white.
    */
    pub fn white(device: &D, name: &str, edge: u32, format: PixelFormat) -> Result<Arc<Self>, Error> {
        let info = ImageInfo {
            extent: Extent::square(edge),
            format,
            mip_count: 1,
        };
        let pixels = format.white_pixel().repeat(info.extent.pixel_count());
        Self::from_pixels(device, name, info, &[pixels])
    }

    /// An image whose device texture is not resident yet.
    pub fn pending(name: &str, info: ImageInfo) -> Arc<Self> {
        Arc::new(StaticImage {
            name: name.to_string(),
            info,
            srgb: info.format.is_srgb(),
            pinned: AtomicBool::new(false),
            texture: Mutex::new(None),
        })
    }

    /// Makes `texture` the resident data of a [`StaticImage::pending`] image.
    pub fn provide(&self, texture: D::Texture) {
        *self
            .texture
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(texture);
    }

    pub fn info(&self) -> ImageInfo {
        self.info
    }
}

impl<D: Device> Debug for StaticImage<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticImage")
            .field("name", &self.name)
            .field("info", &self.info)
            .field("pinned", &self.is_pinned())
            .finish()
    }
}

impl<D: Device> TextureResource<D> for StaticImage<D> {
    fn kind(&self) -> TextureKind {
        TextureKind::Image2D
    }

    fn extent(&self) -> Extent {
        self.info.extent
    }

    fn mip_count(&self) -> u32 {
        self.info.mip_count
    }

    fn format(&self) -> PixelFormat {
        self.info.format
    }

    fn bind(&self) -> Option<D::Texture> {
        self.texture
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl<D: Device> SourceImage<D> for StaticImage<D> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_srgb(&self) -> bool {
        self.srgb
    }

    fn pin_resident(&self) -> bool {
        !self.pinned.swap(true, Ordering::AcqRel)
    }

    fn is_pinned(&self) -> bool {
        self.pinned.load(Ordering::Acquire)
    }
}

/**
An [`ImageStore`] backed by a map of images registered ahead of time.
*/
pub struct MemoryImageStore<D: Device> {
    images: Mutex<HashMap<String, Arc<dyn SourceImage<D>>>>,
}

impl<D: Device> MemoryImageStore<D> {
    pub fn new() -> Self {
        MemoryImageStore {
            images: Mutex::new(HashMap::new()),
        }
    }

    /// Registers `image` under its name, replacing any earlier image of that name.
    pub fn insert(&self, image: Arc<dyn SourceImage<D>>) {
        self.images
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(image.name().to_string(), image);
    }
}

impl<D: Device> Default for MemoryImageStore<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Device> ImageStore<D> for MemoryImageStore<D> {
    fn load_synchronous(&self, path: &str) -> Option<Arc<dyn SourceImage<D>>> {
        self.images
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(path)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imp::soft::{SoftDevice, test_image};

    #[test]
    fn adopting_pins_exactly_once() {
        let device = SoftDevice::new();
        let image = test_image(&device, "a", 8, PixelFormat::Rgba8Unorm, 1, 1);
        let store = MemoryImageStore::new();
        assert!(!image.is_pinned());
        let entry = SourceEntry::adopt(SourceRef::loaded(image.clone()), &store);
        assert!(entry.is_resolved());
        assert!(image.is_pinned());
        assert!(!image.pin_resident());
    }

    #[test]
    fn path_references_resolve_through_the_store() {
        let device = SoftDevice::new();
        let store = MemoryImageStore::new();
        store.insert(test_image(&device, "textures/grass", 8, PixelFormat::Rgba8Unorm, 1, 7));
        let entry = SourceEntry::adopt(SourceRef::path("textures/grass"), &store);
        assert_eq!(entry.image().unwrap().name(), "textures/grass");
        assert!(entry.image().unwrap().is_pinned());

        let missing = SourceEntry::adopt(SourceRef::path("textures/missing"), &store);
        assert!(!missing.is_resolved());
        assert_eq!(missing.source().path_str(), Some("textures/missing"));
    }

    #[test]
    fn null_reference_stays_unresolved() {
        let store = MemoryImageStore::<SoftDevice>::new();
        let reference = SourceRef::null();
        assert!(reference.is_null());
        assert!(!SourceEntry::adopt(reference, &store).is_resolved());
    }

    #[test]
    fn pending_image_binds_once_provided() {
        let device = SoftDevice::new();
        let info = ImageInfo {
            extent: Extent::square(4),
            format: PixelFormat::R8Unorm,
            mip_count: 1,
        };
        let pending = StaticImage::<SoftDevice>::pending("late", info);
        assert!(pending.bind().is_none());
        let texture = device.create_image(&info, &[vec![9; 16]], "late").unwrap();
        pending.provide(texture);
        assert!(pending.bind().is_some());
    }

    #[test]
    fn color_space_is_fixed_by_the_format() {
        let device = SoftDevice::new();
        let srgb = device
            .solid_image("srgb", 4, PixelFormat::Rgba8UnormSrgb, 1, 0)
            .unwrap();
        let shared = srgb.clone();
        assert!(srgb.is_srgb());
        assert!(shared.is_srgb());

        let white = StaticImage::white(&device, "white", 4, PixelFormat::Bgra8Unorm).unwrap();
        assert!(!white.is_srgb());
        let pending = StaticImage::<SoftDevice>::pending(
            "pending",
            ImageInfo {
                extent: Extent::square(4),
                format: PixelFormat::Bgra8UnormSrgb,
                mip_count: 1,
            },
        );
        assert!(pending.is_srgb());
    }
}
