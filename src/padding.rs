//! Page alignment helpers.
//!
//! Page sizes must be nonzero powers of two. Anything else returns `None`
//! instead of producing a bogus mask.

/// Calculate the amount of padding needed after `size` bytes to reach a
/// multiple of `page_size`.
pub fn padding(size: u64, page_size: u64) -> Option<u64> {
    if !page_size.is_power_of_two() {
        return None;
    }

    Some((page_size - (size & (page_size - 1))) & (page_size - 1))
}

/// Round `size` up to the next multiple of `page_size`.
pub fn align_up(size: u64, page_size: u64) -> Option<u64> {
    size.checked_add(padding(size, page_size)?)
}
