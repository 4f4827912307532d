// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The shader-visible handle for an array texture.

Materials and bind groups hold a [`TextureReference`] rather than the device
texture itself.  When the array is reallocated, the graphics context repoints the
reference at the new allocation in one step, so a reader either sees the old
binding or the new one, never a half-updated pair.  Readers never write through
the reference.
*/

use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::array::descriptor::ArrayDescriptor;
use crate::device::Device;

/// What a [`TextureReference`] currently points at.
pub struct BoundArray<D: Device> {
    pub texture: D::Texture,
    pub sampler: D::Sampler,
    pub descriptor: ArrayDescriptor,
}

impl<D: Device> Clone for BoundArray<D> {
    fn clone(&self) -> Self {
        BoundArray {
            texture: self.texture.clone(),
            sampler: self.sampler.clone(),
            descriptor: self.descriptor,
        }
    }
}

impl<D: Device> Debug for BoundArray<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundArray")
            .field("texture", &self.texture)
            .field("sampler", &self.sampler)
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

struct Shared<D: Device> {
    target: RwLock<Option<BoundArray<D>>>,
    //bumped on every redirect
    generation: AtomicU64,
}

/**
Non-owning, clonable reference to whatever allocation currently backs an array.

Clones observe the same target.
*/
pub struct TextureReference<D: Device> {
    shared: Arc<Shared<D>>,
}

impl<D: Device> TextureReference<D> {
    pub(crate) fn new() -> Self {
        TextureReference {
            shared: Arc::new(Shared {
                target: RwLock::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// The allocation currently bound, if any.
    pub fn current(&self) -> Option<BoundArray<D>> {
        self.shared
            .target
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /**
    Number of times the reference has been redirected.

    Useful to notice that a bind group built from an earlier target is out of date.
    */
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::Acquire)
    }

    pub(crate) fn redirect(&self, target: Option<BoundArray<D>>) {
        let mut guard = self
            .shared
            .target
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = target;
        self.shared.generation.fetch_add(1, Ordering::AcqRel);
    }
}

impl<D: Device> Clone for TextureReference<D> {
    fn clone(&self) -> Self {
        TextureReference {
            shared: self.shared.clone(),
        }
    }
}

impl<D: Device> PartialEq for TextureReference<D> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl<D: Device> Debug for TextureReference<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureReference")
            .field("generation", &self.generation())
            .field("target", &self.current())
            .finish()
    }
}
