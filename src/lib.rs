//! # skytoast
//!
//! A TOAST tile pyramid generator for all-sky imagery.
//!
//! skytoast turns a whole-sky raster (an equirectangular image or a
//! HEALPix-indexed map) into the multi-resolution quad-tree of 256×256
//! PNG tiles consumed by sky-visualization clients such as WorldWide
//! Telescope. The library is organized around three seams: a spherical
//! geometry kernel, a [`samplers::Sampler`] abstraction that maps
//! coordinates to pixels, and a tiling engine that walks the quad tree
//! and emits `(address, tile)` pairs.
//!
//! ```no_run
//! use skytoast::prelude::*;
//!
//! # fn main() -> skytoast::Result<()> {
//! let raster = skytoast::io::read_png("allsky.png")?;
//! let sampler = CartesianSampler::from_rgb(&raster)?;
//! let opts = BuildOptions { depth: 3, ..Default::default() };
//! build_pyramid(&sampler, &opts, "tiles")?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod io;
pub mod norm;
pub mod prelude;
pub mod samplers;
pub mod tiles;
#[cfg(feature = "preview")]
pub mod viewer;
pub mod wtml;

pub use crate::core::constants;

// Re-export public API
pub use crate::core::geo::{CoordGrid, CornerQuad, SphericalPoint, TileAddress};
pub use crate::norm::{normalize, Scaling, Stretch};
pub use crate::samplers::{CartesianSampler, Normalizer, Sampler};
pub use crate::tiles::{build_pyramid, iter_tiles, BuildOptions, Tile};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, ToastError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum ToastError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid raster: {0}")]
    InvalidRaster(String),

    #[error("unrecognized scaling '{0}': expected one of linear, squared, sqrt, power, log, arcsinh")]
    InvalidScaling(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("not found: {0}")]
    NotFound(String),
}

/// Error type alias for convenience
pub type Error = ToastError;
