//! Source windows and the resampling kernels.
//!
//! A [`SrcWindow`] is a read-only rectangle of source imagery plus its
//! optional validity and density layers. Sampling it at a fractional
//! coordinate either produces a [`Sampled`] contribution or nothing at all:
//! out-of-window taps, invalid pixels, and zero-density pixels simply do not
//! contribute, and a sample with no contributing taps yields `None` so the
//! caller leaves the destination pixel untouched.
//!
//! Coordinates are continuous window-local pixel coordinates in which integer
//! values fall on pixel corners and `(x + 0.5, y + 0.5)` is the center of
//! pixel `(x, y)`. Nearest-neighbour therefore truncates directly, while the
//! interpolating kernels shift by half a pixel to work between pixel centers.

use crate::casting;
use crate::mask;
use crate::pixel::SrcView;

/// Resampling method for the warp.
///
/// Controls how source pixel values are interpolated when a destination
/// pixel center maps to a fractional source coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResampleMethod {
    /// Nearest neighbour - fastest, but can produce blocky results.
    /// Uses the value of the source pixel containing the coordinate.
    #[default]
    Nearest,
    /// Bilinear interpolation - smoother results, good balance of quality
    /// and speed. Weights the 4 nearest source pixels.
    Bilinear,
    /// Cubic convolution - highest quality, but slower.
    /// Weights a 4x4 grid of source pixels.
    Cubic,
}

impl ResampleMethod {
    /// Half-width of the kernel support in whole pixels: how far beyond the
    /// central pixel the method may reach for taps.
    #[inline]
    #[must_use]
    pub fn kernel_radius(self) -> usize {
        match self {
            Self::Nearest => 0,
            Self::Bilinear => 1,
            Self::Cubic => 2,
        }
    }
}

/// One resolved source contribution: a density weight in `(0, 1]` and the
/// interpolated value as a `(real, imag)` pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampled {
    pub density: f64,
    pub real: f64,
    pub imag: f64,
}

/// Cubic convolution weight with sharpness parameter a = -0.5.
///
/// Partitions unity on the integer grid: for any fractional offset t the
/// four weights c(-1-t), c(-t), c(1-t), c(2-t) sum to 1.
#[inline(always)]
fn cubic_weight(t: f64) -> f64 {
    const A: f64 = -0.5;

    let t = t.abs();
    if t <= 1.0 {
        let t2 = t * t;
        (A + 2.0) * t2 * t - (A + 3.0) * t2 + 1.0
    } else if t <= 2.0 {
        let t2 = t * t;
        A * t2 * t - 5.0 * A * t2 + 8.0 * A * t - 4.0 * A
    } else {
        0.0
    }
}

/// Weighted accumulator shared by the interpolating kernels.
///
/// Each tap's effective weight is its spatial weight times its density, so
/// the running weight sum doubles as the output density (clamped to 1).
#[derive(Debug, Default)]
struct Accum {
    real: f64,
    imag: f64,
    weight: f64,
}

impl Accum {
    #[inline]
    fn add(&mut self, spatial: f64, density: f64, real: f64, imag: f64) {
        let w = spatial * density;
        self.real += w * real;
        self.imag += w * imag;
        self.weight += w;
    }

    #[inline]
    fn finish(self) -> Option<Sampled> {
        if self.weight > 0.0 {
            Some(Sampled {
                density: self.weight.min(1.0),
                real: self.real / self.weight,
                imag: self.imag / self.weight,
            })
        } else {
            None
        }
    }
}

/// Read-only source window with its optional validity and density layers.
///
/// `x_off` / `y_off` locate the window inside the overall image coordinate
/// space; sampling coordinates are window-local (offsets already removed).
#[derive(Debug)]
pub struct SrcWindow<'a> {
    /// Window width in pixels.
    pub width: usize,
    /// Window height in pixels.
    pub height: usize,
    /// X offset of the window in the overall source image.
    pub x_off: isize,
    /// Y offset of the window in the overall source image.
    pub y_off: isize,
    /// One view per band, all of the same format and size.
    pub bands: Vec<SrcView<'a>>,
    /// Optional per-band validity masks; entries may individually be absent.
    pub band_valid: Option<Vec<Option<&'a [u32]>>>,
    /// Optional validity mask applying to all bands at once.
    pub unified_valid: Option<&'a [u32]>,
    /// Optional density plane applying to all bands at once.
    pub unified_density: Option<&'a [f32]>,
}

impl SrcWindow<'_> {
    /// Pixel count of the window.
    #[inline]
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Combined validity of pixel `i` for `band`: the unified mask and the
    /// band's own mask must both assert the pixel, with absent layers
    /// counting as valid.
    #[inline]
    #[must_use]
    pub fn pixel_valid(&self, band: usize, i: usize) -> bool {
        let band_mask = self
            .band_valid
            .as_ref()
            .and_then(|masks| masks.get(band).copied().flatten());
        mask::is_valid(self.unified_valid, i) && mask::is_valid(band_mask, i)
    }

    /// Sample the window at a fractional window-local coordinate.
    ///
    /// Returns `None` when nothing contributes: every tap is off-window,
    /// invalid, or has zero density.
    #[must_use]
    pub fn sample(
        &self,
        band: usize,
        fx: f64,
        fy: f64,
        method: ResampleMethod,
    ) -> Option<Sampled> {
        match method {
            ResampleMethod::Nearest => self.sample_nearest(band, fx, fy),
            ResampleMethod::Bilinear => self.sample_bilinear(band, fx, fy),
            ResampleMethod::Cubic => self.sample_cubic(band, fx, fy),
        }
    }

    fn sample_nearest(&self, band: usize, fx: f64, fy: f64) -> Option<Sampled> {
        let x = casting::f64_to_pixel_index(fx, self.width)?;
        let y = casting::f64_to_pixel_index(fy, self.height)?;
        let (density, real, imag) = self.tap_at(band, y * self.width + x)?;
        Some(Sampled {
            density,
            real,
            imag,
        })
    }

    fn sample_bilinear(&self, band: usize, fx: f64, fy: f64) -> Option<Sampled> {
        // Interpolate between pixel centers.
        let cx = fx - 0.5;
        let cy = fy - 0.5;
        let x0 = cx.floor();
        let y0 = cy.floor();
        let alpha = cx - x0;
        let beta = cy - y0;
        #[allow(clippy::cast_possible_truncation)]
        let (x0, y0) = (x0 as isize, y0 as isize);

        let taps = [
            (x0, y0, (1.0 - alpha) * (1.0 - beta)),
            (x0 + 1, y0, alpha * (1.0 - beta)),
            (x0, y0 + 1, (1.0 - alpha) * beta),
            (x0 + 1, y0 + 1, alpha * beta),
        ];

        let mut acc = Accum::default();
        for (tx, ty, spatial) in taps {
            if spatial == 0.0 {
                continue;
            }
            if let Some((density, real, imag)) = self.tap(band, tx, ty) {
                acc.add(spatial, density, real, imag);
            }
        }
        acc.finish()
    }

    fn sample_cubic(&self, band: usize, fx: f64, fy: f64) -> Option<Sampled> {
        let cx = fx - 0.5;
        let cy = fy - 0.5;
        let x0 = cx.floor();
        let y0 = cy.floor();
        let alpha = cx - x0;
        let beta = cy - y0;
        #[allow(clippy::cast_possible_truncation)]
        let (x0, y0) = (x0 as isize, y0 as isize);

        let mut acc = Accum::default();
        for j in -1..=2_isize {
            #[allow(clippy::cast_precision_loss)]
            let wy = cubic_weight(j as f64 - beta);
            if wy == 0.0 {
                continue;
            }
            for i in -1..=2_isize {
                #[allow(clippy::cast_precision_loss)]
                let spatial = cubic_weight(i as f64 - alpha) * wy;
                if spatial == 0.0 {
                    continue;
                }
                if let Some((density, real, imag)) = self.tap(band, x0 + i, y0 + j) {
                    acc.add(spatial, density, real, imag);
                }
            }
        }
        acc.finish()
    }

    /// Resolve one tap at integer coordinates, re-verifying window bounds.
    fn tap(&self, band: usize, x: isize, y: isize) -> Option<(f64, f64, f64)> {
        let x = casting::isize_to_usize(x)?;
        let y = casting::isize_to_usize(y)?;
        if x >= self.width || y >= self.height {
            return None;
        }
        self.tap_at(band, y * self.width + x)
    }

    /// Resolve one tap at a pixel index already known to be in-window.
    ///
    /// Zero density means absent contribution, not a valid sample of
    /// weight zero.
    fn tap_at(&self, band: usize, i: usize) -> Option<(f64, f64, f64)> {
        if !self.pixel_valid(band, i) {
            return None;
        }
        let density = mask::density(self.unified_density, i);
        if density <= 0.0 {
            return None;
        }
        let (real, imag) = self.bands[band].load(i);
        Some((density, real, imag))
    }
}
