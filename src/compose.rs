//! Destination windows and contribution writeback.
//!
//! The compositor is the single place where a sampled contribution touches
//! destination state: the band value goes through the codec store, the
//! density plane keeps the strongest contribution seen for the pixel, and
//! the validity plane records that the pixel has been written.

use crate::mask;
use crate::pixel::DstView;
use crate::sample::Sampled;

/// Writable destination window with its optional validity and density layers.
#[derive(Debug)]
pub struct DstWindow<'a> {
    /// Window width in pixels.
    pub width: usize,
    /// Window height in pixels.
    pub height: usize,
    /// X offset of the window in the overall destination image.
    pub x_off: isize,
    /// Y offset of the window in the overall destination image.
    pub y_off: isize,
    /// One view per band, all of the same format and size.
    pub bands: Vec<DstView<'a>>,
    /// Optional validity mask; a set bit marks a pixel as already written.
    pub valid: Option<&'a mut [u32]>,
    /// Optional density plane updated with each pixel's strongest
    /// contribution.
    pub density: Option<&'a mut [f32]>,
}

impl DstWindow<'_> {
    /// Pixel count of the window.
    #[inline]
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// True if the validity mask is present and already records pixel `i` as
    /// written. Without a mask no pixel counts as written.
    #[inline]
    #[must_use]
    pub fn pixel_written(&self, i: usize) -> bool {
        match &self.valid {
            Some(words) => mask::is_valid(Some(words), i),
            None => false,
        }
    }

    /// Merge a sampled contribution into pixel `i` of `band`.
    #[inline]
    pub fn compose(&mut self, band: usize, i: usize, sampled: &Sampled) {
        self.bands[band].store(i, sampled.real, sampled.imag);

        if let Some(density) = self.density.as_deref_mut() {
            #[allow(clippy::cast_possible_truncation)]
            let d = sampled.density as f32;
            density[i] = density[i].max(d);
        }

        if let Some(valid) = self.valid.as_deref_mut() {
            mask::set_valid(valid, i);
        }
    }
}
