//! Helper functions that don't particularly belong to any concrete module.

/// It aligns `to_be_aligned` using `alignment`, which must be a power of two.
///
/// Used to round region mapping lengths up to a multiple of
/// [`crate::platform::page_size`], since the operating system hands out
/// whole pages anyway.
pub(crate) fn align(to_be_aligned: usize, alignment: usize) -> usize {
    (to_be_aligned + alignment - 1) & !(alignment - 1)
}
