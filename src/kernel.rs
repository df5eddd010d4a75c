//! The warp parameter record, validation, and scanline driver.
//!
//! A [`WarpKernel`] describes one unit of warp work: a source window, a
//! destination window, a resampling method, and the coordinate transform
//! that ties them together. [`WarpKernel::perform`] validates the record,
//! then walks the destination row by row: each row's pixel centers are
//! transformed to source coordinates in one batch, and every successfully
//! mapped pixel is sampled and composed band by band.
//!
//! Per-pixel misses are not errors. A pixel whose coordinate fails to map,
//! falls outside the source window, or resolves to masked-out data is simply
//! skipped; the warp succeeds as long as every row completes without
//! cancellation or transformer failure.

use tracing::{debug, warn};

use crate::compose::DstWindow;
use crate::mask;
use crate::pixel::ElementFormat;
use crate::progress::ProgressReport;
use crate::sample::{ResampleMethod, SrcWindow};
use crate::transform::CoordTransform;

/// Error type for warp execution.
#[derive(Debug)]
pub enum WarpError {
    /// The parameter record is inconsistent; reported before any work.
    Config(String),
    /// Band views do not share a single element format.
    FormatMismatch {
        expected: ElementFormat,
        found: ElementFormat,
    },
    /// The coordinate transform reported overall failure for a row.
    TransformFailed { row: usize },
    /// The progress sink requested cancellation.
    Cancelled,
}

impl std::fmt::Display for WarpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid warp configuration: {e}"),
            Self::FormatMismatch { expected, found } => {
                write!(f, "band format mismatch: expected {expected:?}, found {found:?}")
            }
            Self::TransformFailed { row } => {
                write!(f, "coordinate transform failed on row {row}")
            }
            Self::Cancelled => write!(f, "warp cancelled by progress callback"),
        }
    }
}

impl std::error::Error for WarpError {}

/// One unit of warp work over in-memory windows.
///
/// The caller owns every buffer and keeps them alive for the duration of the
/// call; the kernel owns only its transient per-scanline coordinate arrays.
pub struct WarpKernel<'a> {
    /// Resampling method used for every band.
    pub resample: ResampleMethod,
    /// Read-only source window.
    pub src: SrcWindow<'a>,
    /// Writable destination window.
    pub dst: DstWindow<'a>,
    /// Maps destination pixel coordinates to source pixel coordinates.
    pub transformer: &'a mut dyn CoordTransform,
    /// Optional progress sink; absent means "accept every report".
    pub progress: Option<&'a mut dyn ProgressReport>,
    /// Offset applied to reported progress fractions.
    pub progress_base: f64,
    /// Scale applied to reported progress fractions.
    pub progress_scale: f64,
}

impl std::fmt::Debug for WarpKernel<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarpKernel")
            .field("resample", &self.resample)
            .field("src", &self.src)
            .field("dst", &self.dst)
            .field("progress_base", &self.progress_base)
            .field("progress_scale", &self.progress_scale)
            .finish_non_exhaustive()
    }
}

impl WarpKernel<'_> {
    /// The common element format of all bands, if any band is present.
    #[must_use]
    pub fn element_format(&self) -> Option<ElementFormat> {
        self.src.bands.first().map(crate::pixel::SrcView::format)
    }

    /// Check the parameter record for consistency without doing any work.
    ///
    /// # Errors
    /// Returns [`WarpError::Config`] for structural problems (band counts,
    /// buffer sizes, mask sizes) and [`WarpError::FormatMismatch`] when the
    /// band views disagree on element format.
    pub fn validate(&self) -> Result<(), WarpError> {
        let band_count = self.src.bands.len();
        if band_count == 0 {
            return Err(WarpError::Config("at least one band is required".into()));
        }
        if self.dst.bands.len() != band_count {
            return Err(WarpError::Config(format!(
                "source has {band_count} bands but destination has {}",
                self.dst.bands.len()
            )));
        }

        let format = self.src.bands[0].format();
        let src_pixels = self.src.pixel_count();
        for (band, view) in self.src.bands.iter().enumerate() {
            if view.format() != format {
                return Err(WarpError::FormatMismatch {
                    expected: format,
                    found: view.format(),
                });
            }
            if view.len() != src_pixels {
                return Err(WarpError::Config(format!(
                    "source band {band} has {} elements, expected {src_pixels}",
                    view.len()
                )));
            }
        }

        let dst_pixels = self.dst.pixel_count();
        for (band, view) in self.dst.bands.iter().enumerate() {
            if view.format() != format {
                return Err(WarpError::FormatMismatch {
                    expected: format,
                    found: view.format(),
                });
            }
            if view.len() != dst_pixels {
                return Err(WarpError::Config(format!(
                    "destination band {band} has {} elements, expected {dst_pixels}",
                    view.len()
                )));
            }
        }

        let src_words = mask::words_for(src_pixels);
        if let Some(words) = self.src.unified_valid {
            if words.len() != src_words {
                return Err(WarpError::Config(format!(
                    "unified source validity mask has {} words, expected {src_words}",
                    words.len()
                )));
            }
        }
        if let Some(masks) = &self.src.band_valid {
            if masks.len() != band_count {
                return Err(WarpError::Config(format!(
                    "per-band validity has {} entries for {band_count} bands",
                    masks.len()
                )));
            }
            for (band, words) in masks.iter().enumerate() {
                if let Some(words) = words {
                    if words.len() != src_words {
                        return Err(WarpError::Config(format!(
                            "band {band} validity mask has {} words, expected {src_words}",
                            words.len()
                        )));
                    }
                }
            }
        }
        if let Some(plane) = self.src.unified_density {
            if plane.len() != src_pixels {
                return Err(WarpError::Config(format!(
                    "source density plane has {} entries, expected {src_pixels}",
                    plane.len()
                )));
            }
        }

        let dst_words = mask::words_for(dst_pixels);
        if let Some(words) = &self.dst.valid {
            if words.len() != dst_words {
                return Err(WarpError::Config(format!(
                    "destination validity mask has {} words, expected {dst_words}",
                    words.len()
                )));
            }
        }
        if let Some(plane) = &self.dst.density {
            if plane.len() != dst_pixels {
                return Err(WarpError::Config(format!(
                    "destination density plane has {} entries, expected {dst_pixels}",
                    plane.len()
                )));
            }
        }

        Ok(())
    }

    /// Execute the warp.
    ///
    /// On failure the destination reflects every row completed before the
    /// abort; later rows are untouched.
    ///
    /// # Errors
    /// Validation errors are returned before any work. Mid-run,
    /// [`WarpError::Cancelled`] is returned when the progress sink declines
    /// to continue and [`WarpError::TransformFailed`] when the transformer
    /// reports overall failure for a row.
    #[allow(clippy::too_many_lines)]
    pub fn perform(&mut self) -> Result<(), WarpError> {
        self.validate()?;

        debug!(
            dst_width = self.dst.width,
            dst_height = self.dst.height,
            bands = self.src.bands.len(),
            resample = ?self.resample,
            "starting warp"
        );

        // Empty windows warp successfully to nothing.
        if self.src.width == 0
            || self.src.height == 0
            || self.dst.width == 0
            || self.dst.height == 0
        {
            return Ok(());
        }

        if !self.report(0.0) {
            return Err(WarpError::Cancelled);
        }

        let (dst_width, dst_height) = (self.dst.width, self.dst.height);
        let (src_width, src_height) = (self.src.width, self.src.height);
        let band_count = self.src.bands.len();

        #[allow(clippy::cast_precision_loss)]
        let src_x_off = self.src.x_off as f64;
        #[allow(clippy::cast_precision_loss)]
        let src_y_off = self.src.y_off as f64;
        #[allow(clippy::cast_precision_loss)]
        let dst_x_off = self.dst.x_off as f64;
        #[allow(clippy::cast_precision_loss)]
        let dst_y_off = self.dst.y_off as f64;

        // One scanline's worth of coordinates, reused across rows.
        let mut xs = vec![0.0_f64; dst_width];
        let mut ys = vec![0.0_f64; dst_width];
        let mut zs = vec![0.0_f64; dst_width];
        let mut ok = vec![false; dst_width];

        for dst_y in 0..dst_height {
            // Destination pixel centers in overall-image coordinates.
            for (dst_x, x) in xs.iter_mut().enumerate() {
                #[allow(clippy::cast_precision_loss)]
                {
                    *x = dst_x as f64 + 0.5 + dst_x_off;
                }
            }
            #[allow(clippy::cast_precision_loss)]
            ys.fill(dst_y as f64 + 0.5 + dst_y_off);
            zs.fill(0.0);

            if !self
                .transformer
                .transform(true, &mut xs, &mut ys, &mut zs, &mut ok)
            {
                warn!(row = dst_y, "coordinate transform reported overall failure");
                return Err(WarpError::TransformFailed { row: dst_y });
            }

            for dst_x in 0..dst_width {
                if !ok[dst_x] {
                    continue;
                }

                let sx = xs[dst_x] - src_x_off;
                let sy = ys[dst_x] - src_y_off;

                // Test against the float values before truncation: -0.5
                // would cast to 0. NaN coordinates survive the cast but are
                // re-rejected per tap inside the sampler.
                if sx < 0.0 || sy < 0.0 {
                    continue;
                }
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let (ix, iy) = (sx as usize, sy as usize);
                if ix >= src_width || iy >= src_height {
                    continue;
                }

                let dst_i = dst_y * dst_width + dst_x;
                if self.dst.pixel_written(dst_i) {
                    continue;
                }

                for band in 0..band_count {
                    let Some(sampled) = self.src.sample(band, sx, sy, self.resample) else {
                        continue;
                    };
                    self.dst.compose(band, dst_i, &sampled);
                }
            }

            #[allow(clippy::cast_precision_loss)]
            let local = (dst_y + 1) as f64 / dst_height as f64;
            if !self.report(local) {
                return Err(WarpError::Cancelled);
            }
        }

        Ok(())
    }

    /// Remap a local fraction through the base/scale bookkeeping and hand it
    /// to the progress sink. Absent sinks accept everything.
    fn report(&mut self, local_fraction: f64) -> bool {
        let fraction = self.progress_base + self.progress_scale * local_fraction;
        match &mut self.progress {
            Some(p) => p.report(fraction, ""),
            None => true,
        }
    }
}
