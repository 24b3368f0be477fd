pub mod constants;
pub mod geo;

// Re-exports for convenience
pub use geo::{CoordGrid, CornerQuad, SphericalPoint, TileAddress};
