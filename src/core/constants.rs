//! Engine-wide constants in one place.

/// Square tile edge length in pixels, fixed by the TOAST tile contract.
pub const TILE_SIZE: usize = 256;

/// Deepest pyramid level the 32-bit tile addressing supports.
pub const MAX_DEPTH: u8 = 31;
