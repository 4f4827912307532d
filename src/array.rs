// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Dynamic texture arrays.

A [`DynamicTextureArray`] composites an ordered list of independently owned 2D
images into one array texture, one image per slice.  Slices can be replaced and
refreshed individually without rebuilding the whole array.

# Two sides

The array is split between the caller and the [`GraphicsContext`]:

* The caller side owns the source collection.  Mutations resolve their references
  (possibly blocking), derive the new [`ArrayDescriptor`], and submit commands.
  They return as soon as the commands are queued.
* The graphics side owns the device allocation.  It reconciles the allocation
  against the submitted descriptor, allocating or reallocating as needed, and
  executes copy requests.

Commands from one array are submitted while its caller-side lock is held, so the
graphics context sees them in exactly the order the mutations happened, and a
reallocation always lands before the copy that follows it.

# Example

```
use std::sync::Arc;
use dynamic_texture_array::{ArrayConfig, DynamicTextureArray, GraphicsContext, SourceRef};
use dynamic_texture_array::array::source::MemoryImageStore;
use dynamic_texture_array::imp::soft::SoftDevice;
use dynamic_texture_array::pixel_formats::PixelFormat;

let context = GraphicsContext::new("graphics");
let device = Arc::new(SoftDevice::new());
let store = Arc::new(MemoryImageStore::<SoftDevice>::new());
let grass = device.solid_image("grass", 64, PixelFormat::Rgba8Unorm, 1, 0x20).unwrap();
let rock = device.solid_image("rock", 64, PixelFormat::Rgba8Unorm, 1, 0x80).unwrap();

let array = DynamicTextureArray::new(
    context,
    device,
    store,
    vec![SourceRef::loaded(grass), SourceRef::loaded(rock)],
    ArrayConfig::new("terrain"),
);
assert_eq!(array.slice_count(), 2);
assert_eq!(array.edge_size(), Some(64));
```
*/

pub mod config;
pub mod copy;
pub mod descriptor;
pub(crate) mod resource;
pub mod scheduler;
pub mod source;

use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::sync::Arc;

use wasm_safe_mutex::Mutex;

use crate::bindings::TextureReference;
use crate::context::GraphicsContext;
use crate::device::{Device, Extent, TextureKind, TextureResource};
use crate::error::Error;
use crate::pixel_formats::PixelFormat;
use config::{ArrayConfig, PLACEHOLDER_FORMAT};
use copy::{CopyRequest, UpdateTarget};
use descriptor::ArrayDescriptor;
pub use resource::ResourceState;
use resource::ArrayResource;
use scheduler::Decision;
use source::{ImageStore, SourceEntry, SourceRef, StaticImage};

struct CallerState<D: Device> {
    sources: Vec<SourceEntry<D>>,
    descriptor: Option<ArrayDescriptor>,
}

/**
An array texture whose slices mirror a collection of source images.

All methods take `&self`; the array can be shared between threads behind an `Arc`.
Mutations may block while references are resolved, and never block on the
graphics context.
*/
pub struct DynamicTextureArray<D: Device> {
    context: GraphicsContext,
    store: Arc<dyn ImageStore<D>>,
    config: ArrayConfig,
    binding: TextureReference<D>,
    state: Mutex<CallerState<D>>,
    resource: Arc<Mutex<ArrayResource<D>>>,
}

impl<D: Device> DynamicTextureArray<D> {
    /**
    Creates an array from an initial list of sources.

    The references are resolved and pinned before this returns; allocation and the
    initial copy are queued on `context`.
    */
    pub fn new(
        context: GraphicsContext,
        device: Arc<D>,
        store: Arc<dyn ImageStore<D>>,
        sources: Vec<SourceRef<D>>,
        config: ArrayConfig,
    ) -> Self {
        let binding = TextureReference::new();
        let resource = ArrayResource::new(
            device,
            config.debug_name.clone(),
            binding.clone(),
        );
        let array = DynamicTextureArray {
            context,
            store,
            config,
            binding,
            state: Mutex::new(CallerState {
                sources: Vec::new(),
                descriptor: None,
            }),
            resource: Arc::new(Mutex::new(resource)),
        };
        array.set_sources(sources);
        array
    }

    /**
    Creates an array holding a single opaque white image.

    The placeholder is `config.placeholder_edge` pixels square.
    */
    pub fn with_placeholder(
        context: GraphicsContext,
        device: Arc<D>,
        store: Arc<dyn ImageStore<D>>,
        config: ArrayConfig,
    ) -> Result<Self, Error> {
        let name = format!("{} placeholder", config.debug_name);
        let white =
            StaticImage::white(&*device, &name, config.placeholder_edge, PLACEHOLDER_FORMAT)?;
        Ok(Self::new(
            context,
            device,
            store,
            vec![SourceRef::loaded(white)],
            config,
        ))
    }

    /**
    Replaces the whole source collection and refreshes every slice.

    Every reference is resolved, blocking if it is not loaded yet, and every image it
    resolves to is pinned resident.  References that do not resolve still reserve a
    slice, which is left with whatever content it had.
    */
    pub fn set_sources(&self, sources: Vec<SourceRef<D>>) {
        let entries: Vec<SourceEntry<D>> = sources
            .into_iter()
            .map(|source| SourceEntry::adopt(source, &*self.store))
            .collect();
        let mut state = self.state.lock_sync();
        state.sources = entries;
        logwise::trace_sync!(
            "{name}: {count} sources set",
            name = logwise::privacy::LogIt(&self.config.debug_name),
            count = state.sources.len()
        );
        self.schedule(&mut state, false, Some(UpdateTarget::All));
    }

    /**
    Replaces the source at `index` and refreshes that slice.

    Indices outside the collection, including `-1`, are ignored entirely.  A null
    reference keeps the current source but the slice is still refreshed.
    */
    pub fn set_source(&self, source: SourceRef<D>, index: i32) {
        if index < 0 {
            return;
        }
        let index = index as usize;
        if index >= self.state.lock_sync().sources.len() {
            return;
        }
        let entry = if source.is_null() {
            None
        } else {
            Some(SourceEntry::adopt(source, &*self.store))
        };
        let mut state = self.state.lock_sync();
        // the collection may have shrunk while we resolved
        if index >= state.sources.len() {
            return;
        }
        if let Some(entry) = entry {
            state.sources[index] = entry;
        }
        self.schedule(&mut state, false, Some(UpdateTarget::Slice(index)));
    }

    /// Reconciles the allocation and refreshes every slice.
    pub fn update_resource(&self) {
        let mut state = self.state.lock_sync();
        self.schedule(&mut state, false, Some(UpdateTarget::All));
    }

    /**
    Reconciles the allocation and refreshes one slice, or every slice for `-1`.

    Other negative or out-of-range indices refresh nothing.
    */
    pub fn update_slice(&self, index: i32) {
        let mut state = self.state.lock_sync();
        let target = UpdateTarget::from_index(index).filter(|target| match target {
            UpdateTarget::All => true,
            UpdateTarget::Slice(slice) => *slice < state.sources.len(),
        });
        self.schedule(&mut state, false, target);
    }

    /**
    Rebuilds the allocation even if its shape still matches, then refreshes every slice.

    Calling this twice in a row leaves the array in the same state as calling it once.
    */
    pub fn force_update(&self) {
        let mut state = self.state.lock_sync();
        self.schedule(&mut state, true, Some(UpdateTarget::All));
    }

    /**
    Returns the references that resolve to an image.  May block.
    */
    pub fn valid_sources(&self, sources: &[SourceRef<D>]) -> Vec<SourceRef<D>> {
        sources
            .iter()
            .filter(|source| source.resolve(&*self.store).is_some())
            .cloned()
            .collect()
    }

    /// The shape the sources currently ask for.
    pub fn descriptor(&self) -> Option<ArrayDescriptor> {
        self.state.lock_sync().descriptor
    }

    pub fn edge_size(&self) -> Option<u32> {
        self.descriptor().map(|d| d.edge_size)
    }

    pub fn mip_count(&self) -> Option<u32> {
        self.descriptor().map(|d| d.mip_count)
    }

    /// Number of slices, which is the number of sources.
    pub fn slice_count(&self) -> u32 {
        self.state.lock_sync().sources.len() as u32
    }

    pub fn pixel_format(&self) -> Option<PixelFormat> {
        self.descriptor().map(|d| d.format)
    }

    /// A snapshot of the source collection.
    pub fn sources(&self) -> Vec<SourceEntry<D>> {
        self.state.lock_sync().sources.clone()
    }

    /// The shader-visible reference, redirected whenever the array is reallocated.
    pub fn binding(&self) -> TextureReference<D> {
        self.binding.clone()
    }

    /// Resolves once every command submitted so far has run.
    pub fn fence(&self) -> impl Future<Output = ()> + use<D> {
        self.context.fence()
    }

    /// The shape of the allocation that is live on the graphics context.
    pub fn live_descriptor(&self) -> impl Future<Output = Option<ArrayDescriptor>> + use<D> {
        let resource = self.resource.clone();
        self.context
            .run("live_descriptor", move || resource.lock_sync().descriptor())
    }

    /// The lifecycle state of the allocation on the graphics context.
    pub fn live_state(&self) -> impl Future<Output = ResourceState> + use<D> {
        let resource = self.resource.clone();
        self.context
            .run("live_state", move || resource.lock_sync().state())
    }

    /**
    Recomputes the descriptor and queues a reconcile, then a copy for `target`.

    Runs with the caller-side lock held.
    */
    fn schedule(&self, state: &mut CallerState<D>, force: bool, target: Option<UpdateTarget>) {
        let descriptor = ArrayDescriptor::from_sources(&state.sources);
        state.descriptor = descriptor;

        let resource = self.resource.clone();
        self.context.submit("reconcile", move || {
            let mut resource = resource.lock_sync();
            let live = resource.descriptor();
            let decision = Decision::reconcile(live.as_ref(), descriptor.as_ref(), force);
            resource.apply(decision);
        });

        let Some(target) = target else {
            return;
        };
        let request = CopyRequest {
            target,
            sources: state
                .sources
                .iter()
                .map(|entry| entry.image().cloned())
                .collect(),
        };
        let resource = self.resource.clone();
        self.context.submit("copy", move || {
            resource.lock_sync().copy(&request);
        });
    }
}

impl<D: Device> Drop for DynamicTextureArray<D> {
    fn drop(&mut self) {
        let resource = self.resource.clone();
        self.context.submit("release", move || {
            resource.lock_sync().release();
        });
    }
}

impl<D: Device> Debug for DynamicTextureArray<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicTextureArray")
            .field("name", &self.config.debug_name)
            .field("descriptor", &self.descriptor())
            .field("binding", &self.binding)
            .finish()
    }
}

/**
The array as a bindable texture.

Values describe the allocation the binding currently points at; an array with no
allocation reports an empty extent and no mips.
*/
impl<D: Device> TextureResource<D> for DynamicTextureArray<D> {
    fn kind(&self) -> TextureKind {
        TextureKind::Array2D
    }

    fn extent(&self) -> Extent {
        self.binding
            .current()
            .map_or(Extent::square(0), |bound| bound.descriptor.extent())
    }

    fn mip_count(&self) -> u32 {
        self.binding
            .current()
            .map_or(0, |bound| bound.descriptor.mip_count)
    }

    fn format(&self) -> PixelFormat {
        self.binding
            .current()
            .map_or(PLACEHOLDER_FORMAT, |bound| bound.descriptor.allocation_format())
    }

    fn bind(&self) -> Option<D::Texture> {
        self.binding.current().map(|bound| bound.texture)
    }
}
