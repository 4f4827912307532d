/*! dynamic_texture_array keeps a GPU 2D texture array in sync with a changing list of
source images.

Shaders often want to sample many logically distinct images through a single
binding: terrain layers, decal atlases, material variations.  A texture array does
that, but it is an awkward thing to maintain by hand.  Its slice count, edge size and
format are fixed at allocation, every slice has to be filled by copying from some
other texture, and all of that has to happen on the thread that owns the graphics
device.

[`DynamicTextureArray`] handles the bookkeeping:

| You do                              | It does                                                      |
|-------------------------------------|--------------------------------------------------------------|
| [`DynamicTextureArray::set_sources`] | Resolve and pin every image, rebuild the array if its shape changed, copy every slice |
| [`DynamicTextureArray::set_source`]  | Resolve and pin one image, copy only that slice                |
| [`DynamicTextureArray::update_slice`] | Re-copy one slice (or all, with `-1`)                        |
| [`DynamicTextureArray::force_update`] | Rebuild unconditionally and re-copy everything               |

All of the shape comes from source 0: edge size, pixel format, mip count and color
space.  Each source gets a slice, so the slice count is the number of sources.

# Threads

Device work happens on a [`GraphicsContext`], a dedicated thread with a FIFO
queue.  Mutating calls return once their commands are queued, and the context
executes commands strictly in the order they were queued.  Use
[`DynamicTextureArray::fence`] to wait for them.

Shaders bind the [`TextureReference`] from [`DynamicTextureArray::binding`]; it is
repointed at the new allocation whenever the array is rebuilt.

# Backends

Devices implement [`device::Device`].  Two are provided:

* [`imp::soft::SoftDevice`] keeps textures in CPU memory and records every call.
  It is always available and is what the tests run against.
* `imp::wgpu::WgpuDevice`, behind the default `backend_wgpu` feature, drives a
  real GPU through [wgpu](https://wgpu.rs).
*/

logwise::declare_logging_domain!();

pub mod array;
pub mod bindings;
pub mod context;
pub mod device;
pub mod error;
pub mod imp;
pub mod pixel_formats;

pub use array::config::ArrayConfig;
pub use array::descriptor::ArrayDescriptor;
pub use array::source::{ImageStore, SourceImage, SourceRef};
pub use array::{DynamicTextureArray, ResourceState};
pub use bindings::TextureReference;
pub use context::GraphicsContext;
pub use error::Error;
