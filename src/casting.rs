//! Safe numeric casting utilities for pixel coordinate handling.
//!
//! This module provides checked conversion functions and documents our
//! assumptions about numeric ranges in the warp loops.
//!
//! # Design Decisions
//!
//! ## Pixel Coordinates (`f64` → `usize`)
//! Float-to-integer conversions for pixel indices require bounds checking
//! because a transformed coordinate may be negative, out of window, or NaN.
//! Truncation equals floor here since negatives are rejected first, which
//! sidesteps the asymmetric-truncation anomaly around zero (`-0.5 as usize`
//! would be 0).
//!
//! ## Kernel Tap Offsets (`isize` → `usize`)
//! Resampling kernels address neighbours at signed offsets from a floored
//! center; taps left of or above the window become negative and must be
//! rejected, not wrapped.

/// Convert a float coordinate to a pixel index, returning `None` if out of
/// bounds.
///
/// This function handles:
/// - Negative values (returns `None`)
/// - Values reaching `max_value` (returns `None`)
/// - NaN values (returns `None`)
///
/// # Arguments
/// * `value` - The floating point coordinate
/// * `max_value` - The maximum valid index (exclusive)
#[inline]
#[must_use]
pub fn f64_to_pixel_index(value: f64, max_value: usize) -> Option<usize> {
    if value.is_nan() || value < 0.0 {
        return None;
    }
    // Safety: we've already checked value >= 0 and is not NaN above
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let index = value as usize;
    if index >= max_value {
        None
    } else {
        Some(index)
    }
}

/// Convert a signed tap coordinate to unsigned, returning `None` if negative.
#[inline]
#[must_use]
pub fn isize_to_usize(value: isize) -> Option<usize> {
    if value < 0 {
        None
    } else {
        // Safety: we've already checked value >= 0 above
        #[allow(clippy::cast_sign_loss)]
        Some(value as usize)
    }
}
