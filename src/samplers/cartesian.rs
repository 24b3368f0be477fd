use std::f64::consts::{FRAC_PI_2, PI, TAU};

use image::{ImageBuffer, Luma, RgbImage};

use crate::samplers::Sampler;
use crate::{Result, ToastError};

/// Sampler over an equirectangular (plate carrée) raster.
///
/// The raster must be exactly twice as wide as it is tall. Columns follow
/// the astronomical east-left convention: longitude increases toward the
/// left edge. Lookup is nearest-pixel with truncation, rows and columns
/// clamped to the raster.
#[derive(Debug, Clone)]
pub struct CartesianSampler<P> {
    data: Vec<P>,
    width: usize,
    height: usize,
}

impl<P> CartesianSampler<P> {
    /// Wraps a row-major buffer; errors unless `width == 2 * height`
    pub fn from_values(data: Vec<P>, width: usize, height: usize) -> Result<Self> {
        if width != height * 2 {
            return Err(ToastError::InvalidRaster(format!(
                "equirectangular raster must be twice as wide as it is tall, got {width}x{height}"
            )));
        }
        if data.len() != width * height {
            return Err(ToastError::InvalidRaster(format!(
                "raster buffer holds {} values, expected {}",
                data.len(),
                width * height
            )));
        }
        Ok(Self { data, width, height })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }
}

impl CartesianSampler<[u8; 3]> {
    /// Wraps an RGB image, row 0 at latitude +π/2
    pub fn from_rgb(image: &RgbImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        let data = image.pixels().map(|p| p.0).collect();
        Self::from_values(data, width as usize, height as usize)
    }
}

impl CartesianSampler<f64> {
    /// Wraps a 16-bit grayscale image as raw data values, the usual input
    /// to a [`Normalizer`](crate::samplers::Normalizer) stack
    pub fn from_luma16(image: &ImageBuffer<Luma<u16>, Vec<u16>>) -> Result<Self> {
        let (width, height) = image.dimensions();
        let data = image.pixels().map(|p| f64::from(p.0[0])).collect();
        Self::from_values(data, width as usize, height as usize)
    }
}

impl<P: Copy + Send + Sync + 'static> Sampler for CartesianSampler<P> {
    type Output = P;

    fn sample(&self, lon: &[f64], lat: &[f64]) -> Vec<P> {
        let nx = self.width as f64;
        let ny = self.height as f64;

        lon.iter()
            .zip(lat)
            .map(|(&l, &b)| {
                let l = l.rem_euclid(TAU);
                let col = (nx * (1.0 - l / TAU)).clamp(0.0, nx - 1.0) as usize;
                let row = (ny * (1.0 - (b + FRAC_PI_2) / PI)).clamp(0.0, ny - 1.0) as usize;
                self.data[row * self.width + col]
            })
            .collect()
    }
}
