use std::f64::consts::{FRAC_PI_2, TAU};
use std::str::FromStr;

use cdshealpix::nested::{get, Layer};

use crate::samplers::Sampler;
use crate::{Result, ToastError};

/// Pixel ordering of a HEALPix map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelOrder {
    Nested,
    Ring,
}

/// Interpolation mode for HEALPix lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    /// Direct lookup of the pixel containing the coordinate
    Nearest,
    /// Weighted interpolation across the four neighboring pixels
    Bilinear,
}

impl FromStr for Interpolation {
    type Err = ToastError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "nearest" => Ok(Interpolation::Nearest),
            "bilinear" => Ok(Interpolation::Bilinear),
            other => Err(ToastError::Unsupported(format!(
                "interpolation '{other}': expected 'nearest' or 'bilinear'"
            ))),
        }
    }
}

/// Coordinate frame tag of a HEALPix map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordSys {
    Celestial,
    Galactic,
}

impl FromStr for CoordSys {
    type Err = ToastError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "C" | "c" => Ok(CoordSys::Celestial),
            "G" | "g" => Ok(CoordSys::Galactic),
            other => Err(ToastError::Unsupported(format!(
                "coordinate system '{other}': expected 'C' or 'G'"
            ))),
        }
    }
}

/// Sampler over a 1-D HEALPix map.
///
/// The map length fixes the resolution: it must equal 12·nside² for a
/// power-of-two nside. Only celestial maps are supported; a galactic tag is
/// rejected at construction rather than silently sampling the wrong frame.
pub struct HealpixSampler {
    data: Vec<f64>,
    depth: u8,
    layer: &'static Layer,
    order: PixelOrder,
    interpolation: Interpolation,
}

impl std::fmt::Debug for HealpixSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealpixSampler")
            .field("data", &self.data)
            .field("depth", &self.depth)
            .field("order", &self.order)
            .field("interpolation", &self.interpolation)
            .finish_non_exhaustive()
    }
}

impl HealpixSampler {
    pub fn new(
        data: Vec<f64>,
        order: PixelOrder,
        coord: CoordSys,
        interpolation: Interpolation,
    ) -> Result<Self> {
        if coord == CoordSys::Galactic {
            return Err(ToastError::Unsupported(
                "galactic HEALPix maps are not supported; reproject to celestial first".into(),
            ));
        }

        let depth = Self::depth_for(data.len())?;
        Ok(Self { data, depth, layer: get(depth), order, interpolation })
    }

    /// HEALPix depth for a map length, or an error if the length is not a
    /// valid pixel count
    fn depth_for(npix: usize) -> Result<u8> {
        let invalid = || {
            ToastError::InvalidRaster(format!(
                "HEALPix map length {npix} is not 12*nside^2 for a power-of-two nside"
            ))
        };

        if npix == 0 || npix % 12 != 0 {
            return Err(invalid());
        }
        let nside = ((npix / 12) as f64).sqrt().round() as u64;
        if nside == 0 || !nside.is_power_of_two() || (nside * nside * 12) as usize != npix {
            return Err(invalid());
        }
        Ok(nside.trailing_zeros() as u8)
    }

    pub fn nside(&self) -> u32 {
        1u32 << self.depth
    }

    /// Value of the map at a pixel given by its nested-scheme index
    fn value_at(&self, nested_hash: u64) -> f64 {
        let index = match self.order {
            PixelOrder::Nested => nested_hash,
            PixelOrder::Ring => self.layer.to_ring(nested_hash),
        };
        self.data[index as usize]
    }
}

impl Sampler for HealpixSampler {
    type Output = f64;

    fn sample(&self, lon: &[f64], lat: &[f64]) -> Vec<f64> {
        lon.iter()
            .zip(lat)
            .map(|(&l, &b)| {
                let l = l.rem_euclid(TAU);
                let b = b.clamp(-FRAC_PI_2, FRAC_PI_2);
                match self.interpolation {
                    Interpolation::Nearest => self.value_at(self.layer.hash(l, b)),
                    Interpolation::Bilinear => self
                        .layer
                        .bilinear_interpolation(l, b)
                        .iter()
                        .map(|&(hash, weight)| weight * self.value_at(hash))
                        .sum(),
                }
            })
            .collect()
    }
}
