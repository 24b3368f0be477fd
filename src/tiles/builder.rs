//! Builds a tile pyramid on disk, serially or with the four top-level
//! branches fanned out across threads.

use std::fs;
use std::path::Path;
use std::thread;

use crossbeam_channel::unbounded;
use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::constants::{MAX_DEPTH, TILE_SIZE};
use crate::core::geo::TileAddress;
use crate::io;
use crate::samplers::Sampler;
use crate::tiles::pyramid::{self, compose_root, RootStrategy, TileIter};
use crate::tiles::types::{Tile, TilePixel};
use crate::{Result, ToastError};

/// Options for a pyramid build.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Deepest level to tile; 4ⁿ tiles are produced at level n
    pub depth: u8,
    /// Fan the four top-level branches out across threads
    pub parallel: bool,
    /// How the level-0 tile is produced
    pub root: RootStrategy,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            depth: 3,
            parallel: false,
            root: RootStrategy::Synthesized,
        }
    }
}

/// What a finished build wrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSummary {
    pub depth: u8,
    pub tiles_written: usize,
}

/// Builds the full pyramid under `out_dir`, one PNG per tile at
/// `"{level}/{y}/{y}_{x}.png"`.
///
/// Any I/O failure aborts the build; there is no partial-pyramid resume.
pub fn build_pyramid<S>(
    sampler: &S,
    opts: &BuildOptions,
    out_dir: impl AsRef<Path>,
) -> Result<BuildSummary>
where
    S: Sampler,
    S::Output: TilePixel,
{
    let out_dir = out_dir.as_ref();
    if opts.depth > MAX_DEPTH {
        return Err(ToastError::Unsupported(format!(
            "depth {} exceeds the supported maximum of {MAX_DEPTH}",
            opts.depth
        )));
    }
    fs::create_dir_all(out_dir)?;
    log::info!(
        "tiling to depth {} under {} ({})",
        opts.depth,
        out_dir.display(),
        if opts.parallel { "parallel" } else { "serial" }
    );

    let summary = if opts.parallel {
        build_parallel(sampler, opts, out_dir)
    } else {
        build_serial(sampler, opts, out_dir)
    }?;

    log::info!("wrote {} tiles", summary.tiles_written);
    Ok(summary)
}

fn write_tile<P: TilePixel>(out_dir: &Path, addr: &TileAddress, tile: &Tile<P>) -> Result<()> {
    let path = out_dir.join(addr.path());
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    io::save_png(&path, tile)?;
    log::debug!("wrote {}", addr.path());
    Ok(())
}

fn build_serial<S>(sampler: &S, opts: &BuildOptions, out_dir: &Path) -> Result<BuildSummary>
where
    S: Sampler,
    S::Output: TilePixel,
{
    let mut tiles_written = 0;
    for (addr, tile) in TileIter::new(sampler, opts.depth, opts.root) {
        write_tile(out_dir, &addr, &tile)?;
        tiles_written += 1;
    }
    Ok(BuildSummary { depth: opts.depth, tiles_written })
}

/// Parallel build: one worker per level-1 branch, streaming sampled tiles
/// to this thread, which owns all I/O. Buffering the four level-1 tiles for
/// root synthesis is the only cross-branch synchronization.
fn build_parallel<S>(sampler: &S, opts: &BuildOptions, out_dir: &Path) -> Result<BuildSummary>
where
    S: Sampler,
    S::Output: TilePixel,
{
    let depth = opts.depth;
    let (tx, rx) = unbounded::<(TileAddress, Tile<S::Output>)>();

    thread::scope(|scope| {
        if depth >= 1 || opts.root == RootStrategy::Synthesized {
            for seed in pyramid::seeds() {
                let tx = tx.clone();
                scope.spawn(move || {
                    let mut todo = vec![*seed];
                    while let Some(node) = todo.pop() {
                        let grid = node.quad.subsample(TILE_SIZE, node.increasing);
                        let tile = Tile::new(TILE_SIZE, sampler.sample(&grid.lon, &grid.lat));
                        if node.addr.level < depth {
                            todo.extend(node.children());
                        }
                        // The writer hanging up means the build failed;
                        // stop sampling this branch.
                        if tx.send((node.addr, tile)).is_err() {
                            return;
                        }
                    }
                });
            }
        }
        drop(tx);

        let mut level1: FxHashMap<(u32, u32), Tile<S::Output>> = FxHashMap::default();
        let mut tiles_written = 0;
        for (addr, tile) in rx.iter() {
            if addr.level == 1 {
                if opts.root == RootStrategy::Synthesized {
                    level1.insert((addr.x, addr.y), tile.clone());
                }
                if depth == 0 {
                    continue;
                }
            }
            write_tile(out_dir, &addr, &tile)?;
            tiles_written += 1;
        }

        let root = match opts.root {
            RootStrategy::Synthesized => compose_root(&mut level1).decimate(),
            RootStrategy::Sampled => pyramid::sample_root(sampler),
        };
        write_tile(out_dir, &TileAddress::root(), &root)?;
        tiles_written += 1;

        Ok(BuildSummary { depth, tiles_written })
    })
}
