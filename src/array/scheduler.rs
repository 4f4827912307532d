// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Decides whether an array texture has to be reallocated.

Array textures cannot change slice count, dimensions or format in place, so any of
those changing means a new allocation.  Everything else is a content update and
reuses the live allocation.
*/

use crate::array::descriptor::ArrayDescriptor;

/// What has to happen to the device allocation before content is copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No allocation exists and none is needed.
    RemainAbsent,
    /// Allocate for the first time.
    Allocate(ArrayDescriptor),
    /// Release the current allocation, then allocate a new one.
    Reallocate(ArrayDescriptor),
    /// The sources no longer define a shape; release the current allocation.
    Release,
    /// The current allocation is still valid.
    Keep,
}

impl Decision {
    /**
    Applies the reconcile rule.

    `live` is the shape of the allocation that will be current once previously
    submitted work has run; `target` is the shape the sources now ask for.
    */
    pub fn reconcile(
        live: Option<&ArrayDescriptor>,
        target: Option<&ArrayDescriptor>,
        force_rebuild: bool,
    ) -> Decision {
        match (live, target) {
            (None, None) => Decision::RemainAbsent,
            (None, Some(target)) => Decision::Allocate(*target),
            (Some(_), None) => Decision::Release,
            (Some(live), Some(target)) => {
                if force_rebuild || live != target {
                    Decision::Reallocate(*target)
                } else {
                    Decision::Keep
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_formats::PixelFormat;

    fn shape(edge_size: u32, slice_count: u32) -> ArrayDescriptor {
        ArrayDescriptor {
            edge_size,
            format: PixelFormat::Rgba8Unorm,
            mip_count: 1,
            slice_count,
            srgb: false,
        }
    }

    #[test]
    fn absent_stays_absent_without_sources() {
        assert_eq!(Decision::reconcile(None, None, false), Decision::RemainAbsent);
        assert_eq!(Decision::reconcile(None, None, true), Decision::RemainAbsent);
    }

    #[test]
    fn first_shape_allocates() {
        let target = shape(256, 2);
        assert_eq!(
            Decision::reconcile(None, Some(&target), false),
            Decision::Allocate(target)
        );
        // forcing has nothing to release
        assert_eq!(
            Decision::reconcile(None, Some(&target), true),
            Decision::Allocate(target)
        );
    }

    #[test]
    fn shape_changes_reallocate() {
        let live = shape(256, 2);
        for target in [
            shape(128, 2),
            shape(256, 3),
            ArrayDescriptor {
                format: PixelFormat::Bgra8Unorm,
                ..live
            },
            ArrayDescriptor { mip_count: 4, ..live },
            ArrayDescriptor { srgb: true, ..live },
        ] {
            assert_eq!(
                Decision::reconcile(Some(&live), Some(&target), false),
                Decision::Reallocate(target)
            );
        }
    }

    #[test]
    fn same_shape_keeps_unless_forced() {
        let live = shape(256, 2);
        assert_eq!(
            Decision::reconcile(Some(&live), Some(&live), false),
            Decision::Keep
        );
        assert_eq!(
            Decision::reconcile(Some(&live), Some(&live), true),
            Decision::Reallocate(live)
        );
    }

    #[test]
    fn losing_the_shape_releases() {
        let live = shape(64, 1);
        assert_eq!(Decision::reconcile(Some(&live), None, false), Decision::Release);
    }
}
