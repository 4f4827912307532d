// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The device-side array texture and its lifecycle.

```text
Uninitialized ──allocate──▶ Allocated ──release──▶ Released
                                ▲                      │
                                └──────allocate────────┘
```

An allocation whose shape no longer matches its sources is stale.  Staleness is
settled within the reconcile job that detects it: the allocation is released and a
new one is created, so no job ever observes a stale allocation.  Every transition
happens on the graphics context.
*/

use std::sync::Arc;

use crate::array::copy::CopyRequest;
use crate::array::descriptor::ArrayDescriptor;
use crate::array::scheduler::Decision;
use crate::bindings::sampler::SamplerConfig;
use crate::bindings::{BoundArray, TextureReference};
use crate::device::Device;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    Uninitialized,
    Allocated,
    Released,
}

struct Allocation<D: Device> {
    texture: D::Texture,
    descriptor: ArrayDescriptor,
}

/**
Owns at most one device allocation for an array.

Lives on the graphics context.  The array handle never touches it directly; it
submits jobs that do.
*/
pub(crate) struct ArrayResource<D: Device> {
    device: Arc<D>,
    debug_name: String,
    binding: TextureReference<D>,
    state: ResourceState,
    allocation: Option<Allocation<D>>,
}

impl<D: Device> ArrayResource<D> {
    pub(crate) fn new(
        device: Arc<D>,
        debug_name: String,
        binding: TextureReference<D>,
    ) -> Self {
        ArrayResource {
            device,
            debug_name,
            binding,
            state: ResourceState::Uninitialized,
            allocation: None,
        }
    }

    pub(crate) fn state(&self) -> ResourceState {
        self.state
    }

    pub(crate) fn descriptor(&self) -> Option<ArrayDescriptor> {
        self.allocation.as_ref().map(|a| a.descriptor)
    }

    /// Carries out a scheduling decision.
    pub(crate) fn apply(&mut self, decision: Decision) {
        logwise::trace_sync!(
            "{name}: applying {decision}",
            name = logwise::privacy::LogIt(&self.debug_name),
            decision = logwise::privacy::LogIt(&decision)
        );
        match decision {
            Decision::RemainAbsent | Decision::Keep => {}
            Decision::Allocate(descriptor) => {
                // never leak a texture the caller did not know about
                self.release();
                self.allocate(descriptor);
            }
            Decision::Reallocate(descriptor) => {
                self.release();
                self.allocate(descriptor);
            }
            Decision::Release => self.release(),
        }
    }

    fn allocate(&mut self, descriptor: ArrayDescriptor) {
        debug_assert!(self.allocation.is_none());
        let texture = match self
            .device
            .create_array_texture(&descriptor, &self.debug_name)
        {
            Ok(texture) => texture,
            Err(err) => {
                logwise::error_sync!(
                    "{name}: could not allocate array texture: {err}",
                    name = logwise::privacy::LogIt(&self.debug_name),
                    err = logwise::privacy::LogIt(&err)
                );
                return;
            }
        };
        let sampler = self.device.sampler(&SamplerConfig::BILINEAR_WRAP);
        self.binding.redirect(Some(BoundArray {
            texture: texture.clone(),
            sampler,
            descriptor,
        }));
        logwise::info_sync!(
            "{name}: allocated {edge}x{edge} x {slices} slices, {mips} mips, {format}",
            name = logwise::privacy::LogIt(&self.debug_name),
            edge = descriptor.edge_size,
            slices = descriptor.slice_count,
            mips = descriptor.mip_count,
            format = logwise::privacy::LogIt(&descriptor.allocation_format())
        );
        self.allocation = Some(Allocation {
            texture,
            descriptor,
        });
        self.state = ResourceState::Allocated;
    }

    /// Frees the allocation and unbinds it.  A no-op when nothing is allocated.
    pub(crate) fn release(&mut self) {
        let Some(allocation) = self.allocation.take() else {
            return;
        };
        self.binding.redirect(None);
        self.device.release_texture(allocation.texture);
        self.state = ResourceState::Released;
        logwise::info_sync!(
            "{name}: released array texture",
            name = logwise::privacy::LogIt(&self.debug_name)
        );
    }

    /**
    Executes a copy request against the live allocation.

    Dropped when there is nothing allocated or the snapshot is empty.
    */
    pub(crate) fn copy(&self, request: &CopyRequest<D>) {
        let Some(allocation) = &self.allocation else {
            logwise::trace_sync!(
                "{name}: no allocation, dropping copy",
                name = logwise::privacy::LogIt(&self.debug_name)
            );
            return;
        };
        if request.sources.is_empty() {
            return;
        }
        let _copy_guard = logwise::profile_begin!("array_copy");
        let plan = request.plan(&allocation.descriptor);
        for (slice, mip, reason) in &plan.skipped {
            logwise::warn_sync!(
                "{name}: skipped slice {slice} mip {mip}: {reason}",
                name = logwise::privacy::LogIt(&self.debug_name),
                slice = *slice,
                mip = *mip,
                reason = logwise::privacy::LogIt(reason)
            );
        }
        if plan.regions.is_empty() {
            return;
        }
        logwise::trace_sync!(
            "{name}: copying {count} regions for {target}",
            name = logwise::privacy::LogIt(&self.debug_name),
            count = plan.regions.len(),
            target = logwise::privacy::LogIt(&request.target)
        );
        self.device.copy_regions(&allocation.texture, &plan.regions);
    }
}

impl<D: Device> Drop for ArrayResource<D> {
    fn drop(&mut self) {
        self.release();
    }
}
