// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Copy requests and their expansion into per-(slice, mip) device copies.

A request carries an immutable snapshot of the source collection taken when it was
submitted.  Residency is only checked when the request runs on the graphics context,
so an image that finishes streaming in between is still picked up.
*/

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::array::descriptor::ArrayDescriptor;
use crate::array::source::SourceImage;
use crate::device::{CopyRegion, Device};

/// Which slices a copy request covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateTarget {
    All,
    Slice(usize),
}

impl UpdateTarget {
    /**
    Interprets a caller-facing index, where `-1` means every slice.

    Other negative values name no slice and yield `None`.
    */
    pub fn from_index(index: i32) -> Option<UpdateTarget> {
        match index {
            -1 => Some(UpdateTarget::All),
            i if i >= 0 => Some(UpdateTarget::Slice(i as usize)),
            _ => None,
        }
    }
}

/// One logical update, queued for the graphics context.
pub(crate) struct CopyRequest<D: Device> {
    pub(crate) target: UpdateTarget,
    pub(crate) sources: Vec<Option<Arc<dyn SourceImage<D>>>>,
}

impl<D: Device> Debug for CopyRequest<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CopyRequest")
            .field("target", &self.target)
            .field("sources", &self.sources.len())
            .finish()
    }
}

/// Why a (slice, mip) pair was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Skip {
    Unresolved,
    NotResident,
    Incompatible,
    NoSuchMip,
}

/// The device copies for a request, plus what was skipped.
pub(crate) struct CopyPlan<D: Device> {
    pub(crate) regions: Vec<CopyRegion<D::Texture>>,
    pub(crate) skipped: Vec<(u32, u32, Skip)>,
}

impl<D: Device> CopyRequest<D> {
    /**
    Expands the request against the live allocation's shape.

    Slices ascend, and within a slice mips ascend.  Each copy covers the source's own
    mip extent, placed at the slice origin.  A source that is unresolved, not resident,
    of an incompatible format, or larger than the slice at that mip contributes nothing
    there and the slice keeps its previous content.
    */
    pub(crate) fn plan(&self, descriptor: &ArrayDescriptor) -> CopyPlan<D> {
        let slices = match self.target {
            UpdateTarget::All => 0..self.sources.len(),
            UpdateTarget::Slice(index) if index < self.sources.len() => index..index + 1,
            UpdateTarget::Slice(_) => 0..0,
        };
        let mut plan = CopyPlan {
            regions: Vec::new(),
            skipped: Vec::new(),
        };
        for slice in slices {
            let dest_slice = slice as u32;
            if dest_slice >= descriptor.slice_count {
                break;
            }
            for mip in 0..descriptor.mip_count {
                let Some(image) = &self.sources[slice] else {
                    plan.skipped.push((dest_slice, mip, Skip::Unresolved));
                    continue;
                };
                if !image.format().copy_compatible(descriptor.format) {
                    plan.skipped.push((dest_slice, mip, Skip::Incompatible));
                    continue;
                }
                if mip >= image.mip_count() {
                    plan.skipped.push((dest_slice, mip, Skip::NoSuchMip));
                    continue;
                }
                let extent = image.extent().mip(mip);
                let room = descriptor.extent().mip(mip);
                if extent.width > room.width || extent.height > room.height {
                    plan.skipped.push((dest_slice, mip, Skip::Incompatible));
                    continue;
                }
                let Some(source) = image.bind() else {
                    plan.skipped.push((dest_slice, mip, Skip::NotResident));
                    continue;
                };
                plan.regions.push(CopyRegion {
                    source,
                    source_mip: mip,
                    dest_mip: mip,
                    dest_slice,
                    extent,
                });
            }
        }
        plan
    }
}
