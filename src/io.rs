//! Thin PNG codec seam around the `image` crate. Encoding/decoding
//! failures propagate unmodified through [`ToastError`](crate::ToastError).

use std::path::Path;

use image::{ImageBuffer, Luma, RgbImage};

use crate::tiles::types::{Tile, TilePixel};
use crate::Result;

/// Saves a tile as a PNG at `path`
pub fn save_png<P: TilePixel>(path: impl AsRef<Path>, tile: &Tile<P>) -> Result<()> {
    let size = tile.size() as u32;
    image::save_buffer(path, &tile.to_bytes(), size, size, P::color_type())?;
    Ok(())
}

/// Loads an image as 8-bit RGB. Despite the name this accepts any format
/// the `image` crate can sniff, matching what tiling inputs look like in
/// the wild.
pub fn read_png(path: impl AsRef<Path>) -> Result<RgbImage> {
    Ok(image::open(path)?.to_rgb8())
}

/// Loads an image as 16-bit grayscale, the raw-data input to the
/// normalization pipeline
pub fn read_luma16(path: impl AsRef<Path>) -> Result<ImageBuffer<Luma<u16>, Vec<u16>>> {
    Ok(image::open(path)?.to_luma16())
}
