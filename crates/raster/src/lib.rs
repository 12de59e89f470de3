//! Georeferenced raster processing: colorization, GeoTIFF I/O,
//! boundary clipping, and CRS reprojection.

pub mod classify;
pub mod clip;
pub mod error;
pub mod geotiff;
pub mod surface;
pub mod warp;

pub use classify::{
    classify_quantile, palette_for_field, Classified, LegendEntry, Rgb, DEFAULT_PALETTE,
};
pub use clip::{clip_rgb, clip_scalar};
pub use error::RasterError;
pub use geotiff::{
    decode, encode_rgb, encode_scalar, read_file, write_rgb_file, write_scalar_file, DecodedRaster,
};
pub use surface::{RgbRaster, ScalarRaster};
pub use warp::{reproject_rgb, reproject_scalar, DEFAULT_TARGET_RESOLUTION};
