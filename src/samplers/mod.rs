//! Samplers turn spherical coordinates into pixel values.
//!
//! A sampler is a pure function from coordinate arrays to value arrays;
//! concrete samplers close over an immutable backing raster. Variants are
//! composed by wrapping (see [`Normalizer`]), not by subtyping.

pub mod cartesian;
#[cfg(feature = "healpix")]
pub mod healpix;
pub mod normalize;

// Re-exports for convenience
pub use cartesian::CartesianSampler;
#[cfg(feature = "healpix")]
pub use healpix::HealpixSampler;
pub use normalize::Normalizer;

/// Trait representing anything that can turn (lon, lat) coordinates into
/// sampled values.
///
/// `sample` takes flat, equally-long slices so callers can vectorize any
/// grid shape; the returned vector matches the input length element for
/// element. Implementations must be pure: no side effects, no mutation of
/// the backing raster. `Send + Sync` so traversal branches can fan out
/// over a shared sampler.
pub trait Sampler: Send + Sync {
    /// Value produced per coordinate: a display pixel or a raw data value
    type Output: Copy + Send + Sync + 'static;

    /// Sample the backing dataset at each (lon\[i\], lat\[i\]), in radians
    fn sample(&self, lon: &[f64], lat: &[f64]) -> Vec<Self::Output>;
}
