//! The quad-tree tiling engine: tile buffers, the traversal iterator, and
//! the on-disk pyramid builders.

pub mod builder;
pub mod pyramid;
pub mod types;

// Re-exports for convenience
pub use builder::{build_pyramid, BuildOptions, BuildSummary};
pub use pyramid::{iter_tiles, iter_tiles_flat, RootStrategy, TileIter, TileNode};
pub use types::{Tile, TilePixel};
