//! Drive the warp kernel with a real projection pipeline.
//!
//! The source raster sits on a one-degree lon/lat grid and the destination
//! on a Web Mercator grid covering the same area; proj4rs supplies the
//! destination-to-source coordinate mapping, the way a reprojecting caller
//! would wire the kernel up.

use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use rewarp::{DstView, DstWindow, ResampleMethod, SrcView, SrcWindow, WarpKernel};

const GRID: usize = 8;
/// Western / northern edge of the source grid in degrees.
const LON_WEST: f64 = 0.0;
const LAT_NORTH: f64 = 56.0;
const LAT_SOUTH: f64 = 48.0;

fn proj_for(epsg: u16) -> Proj {
    let def = crs_definitions::from_code(epsg).expect("EPSG code in database");
    Proj::from_proj_string(def.proj4).expect("valid proj string")
}

fn lonlat_to_merc(lonlat: &Proj, merc: &Proj, lon: f64, lat: f64) -> (f64, f64) {
    let mut point = (lon.to_radians(), lat.to_radians(), 0.0);
    transform(lonlat, merc, &mut point).expect("forward projection");
    (point.0, point.1)
}

#[test]
fn test_nearest_reprojection_from_mercator_grid() {
    // Row-major source values srow * 8 + scol on one-degree pixels.
    let src_pixels: Vec<u8> = (0..(GRID * GRID) as u8).collect();

    let merc = proj_for(3857);
    let lonlat = proj_for(4326);

    let (min_x, min_y) = lonlat_to_merc(&lonlat, &merc, LON_WEST, LAT_SOUTH);
    let (max_x, max_y) = lonlat_to_merc(&lonlat, &merc, LON_WEST + GRID as f64, LAT_NORTH);
    let x_res = (max_x - min_x) / GRID as f64;
    let y_res = (max_y - min_y) / GRID as f64;

    // Destination pixel -> Mercator -> lon/lat -> source pixel.
    let mut transformer = |_dst_to_src: bool,
                           x: &mut [f64],
                           y: &mut [f64],
                           _z: &mut [f64],
                           success: &mut [bool]|
     -> bool {
        for k in 0..x.len() {
            let merc_x = min_x + x[k] * x_res;
            let merc_y = max_y - y[k] * y_res;
            let mut point = (merc_x, merc_y, 0.0);
            if transform(&merc, &lonlat, &mut point).is_err() {
                success[k] = false;
                continue;
            }
            let (lon, lat) = (point.0.to_degrees(), point.1.to_degrees());
            x[k] = lon - LON_WEST;
            y[k] = LAT_NORTH - lat;
            success[k] = true;
        }
        true
    };

    let mut dst = vec![255_u8; GRID * GRID];
    let mut kernel = WarpKernel {
        resample: ResampleMethod::Nearest,
        src: SrcWindow {
            width: GRID,
            height: GRID,
            x_off: 0,
            y_off: 0,
            bands: vec![SrcView::Byte(&src_pixels)],
            band_valid: None,
            unified_valid: None,
            unified_density: None,
        },
        dst: DstWindow {
            width: GRID,
            height: GRID,
            x_off: 0,
            y_off: 0,
            bands: vec![DstView::Byte(&mut dst)],
            valid: None,
            density: None,
        },
        transformer: &mut transformer,
        progress: None,
        progress_base: 0.0,
        progress_scale: 1.0,
    };
    kernel.perform().unwrap();
    drop(kernel);

    // Longitude is linear in Mercator x, so columns map across exactly.
    // Latitude is not, so each destination row samples a single source row
    // that advances monotonically southwards.
    let mut prev_src_row = 0;
    for row in 0..GRID {
        let src_row = dst[row * GRID] / GRID as u8;
        for col in 0..GRID {
            let v = dst[row * GRID + col];
            assert_ne!(v, 255, "pixel ({row}, {col}) was never written");
            assert_eq!(v % GRID as u8, col as u8, "column mismatch at ({row}, {col})");
            assert_eq!(v / GRID as u8, src_row, "row {row} mixes source rows");
        }
        assert!(src_row >= prev_src_row, "source rows regressed at row {row}");
        prev_src_row = src_row;
    }
    assert_eq!(dst[0] / GRID as u8, 0, "top row should sample the northern edge");
    assert_eq!(
        dst[(GRID - 1) * GRID] / GRID as u8,
        GRID as u8 - 1,
        "bottom row should sample the southern edge"
    );
}

#[test]
fn test_bilinear_reprojection_stays_in_value_range() {
    let src_pixels: Vec<u8> = (0..(GRID * GRID) as u8).collect();

    let merc = proj_for(3857);
    let lonlat = proj_for(4326);

    let (min_x, _) = lonlat_to_merc(&lonlat, &merc, LON_WEST, LAT_SOUTH);
    let (max_x, max_y) = lonlat_to_merc(&lonlat, &merc, LON_WEST + GRID as f64, LAT_NORTH);
    let x_res = (max_x - min_x) / GRID as f64;
    let y_res = {
        let (_, min_y) = lonlat_to_merc(&lonlat, &merc, LON_WEST, LAT_SOUTH);
        (max_y - min_y) / GRID as f64
    };

    let mut transformer = |_dst_to_src: bool,
                           x: &mut [f64],
                           y: &mut [f64],
                           _z: &mut [f64],
                           success: &mut [bool]|
     -> bool {
        for k in 0..x.len() {
            let mut point = (min_x + x[k] * x_res, max_y - y[k] * y_res, 0.0);
            if transform(&merc, &lonlat, &mut point).is_err() {
                success[k] = false;
                continue;
            }
            x[k] = point.0.to_degrees() - LON_WEST;
            y[k] = LAT_NORTH - point.1.to_degrees();
            success[k] = true;
        }
        true
    };

    let mut dst = vec![0_u8; GRID * GRID];
    let mut written = vec![0_u32; rewarp::mask::words_for(GRID * GRID)];
    let mut kernel = WarpKernel {
        resample: ResampleMethod::Bilinear,
        src: SrcWindow {
            width: GRID,
            height: GRID,
            x_off: 0,
            y_off: 0,
            bands: vec![SrcView::Byte(&src_pixels)],
            band_valid: None,
            unified_valid: None,
            unified_density: None,
        },
        dst: DstWindow {
            width: GRID,
            height: GRID,
            x_off: 0,
            y_off: 0,
            bands: vec![DstView::Byte(&mut dst)],
            valid: Some(&mut written),
            density: None,
        },
        transformer: &mut transformer,
        progress: None,
        progress_base: 0.0,
        progress_scale: 1.0,
    };
    kernel.perform().unwrap();
    drop(kernel);

    let written_count = written
        .iter()
        .map(|w| w.count_ones() as usize)
        .sum::<usize>();
    assert_eq!(written_count, GRID * GRID, "interior coverage should be complete");
    for (i, &v) in dst.iter().enumerate() {
        assert!(v <= 63, "pixel {i} interpolated outside the source range: {v}");
    }
}
