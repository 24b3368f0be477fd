//! Prelude module for common skytoast types and traits
//!
//! Re-exports the types most builds touch, for easy importing with
//! `use skytoast::prelude::*;`

pub use crate::core::constants::{MAX_DEPTH, TILE_SIZE};
pub use crate::core::geo::{CoordGrid, CornerQuad, SphericalPoint, TileAddress};

pub use crate::norm::{normalize, Scaling, Stretch};

pub use crate::samplers::{CartesianSampler, Normalizer, Sampler};

#[cfg(feature = "healpix")]
pub use crate::samplers::healpix::{CoordSys, HealpixSampler, Interpolation, PixelOrder};

pub use crate::tiles::{
    build_pyramid, iter_tiles, iter_tiles_flat, BuildOptions, BuildSummary, RootStrategy, Tile,
    TileIter, TilePixel,
};

pub use crate::wtml::{gen_wtml, infer_max_depth, WtmlMeta};

pub use crate::{Error as ToastError, Result};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet, FxHasher};
