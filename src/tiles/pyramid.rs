//! Quad-tree traversal over the TOAST projection.
//!
//! Traversal starts from the four fixed level-1 tiles (the faces of the
//! projected octahedron) and works an explicit list of value-typed nodes.
//! The level-0 tile plays by special rules: it is synthesized from the four
//! level-1 images once all of them exist, never sampled on its own. The flat
//! variant is the exception and samples every level independently.

use fxhash::FxHashMap;
use once_cell::sync::Lazy;

use crate::core::constants::TILE_SIZE;
use crate::core::geo::{CornerQuad, SphericalPoint, TileAddress};
use crate::samplers::Sampler;
use crate::tiles::types::Tile;

/// One pending unit of traversal work: an address, the corner quad it
/// covers, and the branch's diagonal orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileNode {
    pub addr: TileAddress,
    pub quad: CornerQuad,
    pub increasing: bool,
}

impl TileNode {
    /// The four child nodes, quadrant-split and inheriting the orientation
    pub fn children(&self) -> [TileNode; 4] {
        let quads = self.quad.split(self.increasing);
        let addrs = self.addr.children();
        [
            TileNode { addr: addrs[0], quad: quads[0], increasing: self.increasing },
            TileNode { addr: addrs[1], quad: quads[1], increasing: self.increasing },
            TileNode { addr: addrs[2], quad: quads[2], increasing: self.increasing },
            TileNode { addr: addrs[3], quad: quads[3], increasing: self.increasing },
        ]
    }
}

/// The four level-1 seed tiles: the projected octahedron faces, with the
/// diagonal orientation fixed per branch.
static LEVEL1: Lazy<[TileNode; 4]> = Lazy::new(|| {
    let deg = SphericalPoint::from_degrees;
    let seed = |x, y, corners: [SphericalPoint; 4], increasing| TileNode {
        addr: TileAddress::new(1, x, y),
        quad: CornerQuad::new(corners[0], corners[1], corners[2], corners[3]),
        increasing,
    };

    [
        seed(
            0,
            0,
            [deg(0.0, -90.0), deg(90.0, 0.0), deg(0.0, 90.0), deg(180.0, 0.0)],
            true,
        ),
        seed(
            1,
            0,
            [deg(90.0, 0.0), deg(0.0, -90.0), deg(0.0, 0.0), deg(0.0, 90.0)],
            false,
        ),
        seed(
            1,
            1,
            [deg(0.0, 90.0), deg(0.0, 0.0), deg(0.0, -90.0), deg(270.0, 0.0)],
            true,
        ),
        seed(
            0,
            1,
            [deg(180.0, 0.0), deg(0.0, 90.0), deg(270.0, 0.0), deg(0.0, -90.0)],
            false,
        ),
    ]
});

/// The four fixed level-1 seed nodes
pub fn seeds() -> &'static [TileNode; 4] {
    &LEVEL1
}

/// How the level-0 tile is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootStrategy {
    /// Compose the four level-1 images 2×2 and decimate by two
    Synthesized,
    /// Sample the root grid directly, skipping cross-branch buffering
    Sampled,
}

/// Samples one node's tile at full resolution
fn sample_node<S: Sampler>(sampler: &S, node: &TileNode) -> Tile<S::Output> {
    let grid = node.quad.subsample(TILE_SIZE, node.increasing);
    Tile::new(TILE_SIZE, sampler.sample(&grid.lon, &grid.lat))
}

/// Samples the level-0 tile directly: the four seed quads at half
/// resolution, assembled into one 256×256 grid
pub fn sample_root<S: Sampler>(sampler: &S) -> Tile<S::Output> {
    let half = TILE_SIZE / 2;
    let mut quadrants: FxHashMap<(u32, u32), Tile<S::Output>> = FxHashMap::default();
    for node in seeds() {
        let grid = node.quad.subsample(half, node.increasing);
        let tile = Tile::new(half, sampler.sample(&grid.lon, &grid.lat));
        quadrants.insert((node.addr.x, node.addr.y), tile);
    }
    compose_root(&mut quadrants)
}

/// Assembles the four level-1 quadrant tiles (keyed by their x, y) into a
/// single tile of twice the quadrant edge length
pub(crate) fn compose_root<P: Copy>(quadrants: &mut FxHashMap<(u32, u32), Tile<P>>) -> Tile<P> {
    let mut take = |x, y| {
        quadrants
            .remove(&(x, y))
            .expect("all four level-1 tiles buffered before root synthesis")
    };
    let (ul, ur, ll, lr) = (take(0, 0), take(1, 0), take(0, 1), take(1, 1));
    Tile::compose_quadrants(&ul, &ur, &ll, &lr)
}

/// Hook applied to every tile before emission; returning `None` suppresses
/// the tile.
pub type PostProcess<'a, P> = Box<dyn Fn(&TileAddress, Tile<P>) -> Option<Tile<P>> + 'a>;

/// Iterator over the tile pyramid, yielding `(address, tile)` pairs.
///
/// Yields every tile from level 1 down to the requested depth, then the
/// level-0 tile last. At depth 0 only the level-0 tile is yielded; the four
/// level-1 tiles are still computed when the root is synthesized from them.
pub struct TileIter<'a, S: Sampler> {
    sampler: &'a S,
    depth: u8,
    root: RootStrategy,
    todo: Vec<TileNode>,
    level1: FxHashMap<(u32, u32), Tile<S::Output>>,
    post: Option<PostProcess<'a, S::Output>>,
    root_pending: bool,
}

impl<'a, S: Sampler> TileIter<'a, S> {
    pub fn new(sampler: &'a S, depth: u8, root: RootStrategy) -> Self {
        // With a sampled root at depth 0 there is nothing to traverse
        let todo = if depth >= 1 || root == RootStrategy::Synthesized {
            seeds().to_vec()
        } else {
            Vec::new()
        };

        Self {
            sampler,
            depth,
            root,
            todo,
            level1: FxHashMap::default(),
            post: None,
            root_pending: true,
        }
    }

    /// Installs a post-process hook applied to every emitted tile,
    /// including the level-0 tile
    pub fn with_post<F>(mut self, post: F) -> Self
    where
        F: Fn(&TileAddress, Tile<S::Output>) -> Option<Tile<S::Output>> + 'a,
    {
        self.post = Some(Box::new(post));
        self
    }

    fn emit(
        &self,
        addr: TileAddress,
        tile: Tile<S::Output>,
    ) -> Option<(TileAddress, Tile<S::Output>)> {
        match &self.post {
            Some(post) => post(&addr, tile).map(|tile| (addr, tile)),
            None => Some((addr, tile)),
        }
    }
}

impl<'a, S: Sampler> Iterator for TileIter<'a, S> {
    type Item = (TileAddress, Tile<S::Output>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.todo.pop() {
            let tile = sample_node(self.sampler, &node);
            if node.addr.level < self.depth {
                self.todo.extend(node.children());
            }

            if self.root == RootStrategy::Synthesized && node.addr.level == 1 {
                self.level1.insert((node.addr.x, node.addr.y), tile.clone());
                if self.depth == 0 {
                    // Computed for root synthesis only, not emitted
                    continue;
                }
            }

            if let Some(item) = self.emit(node.addr, tile) {
                return Some(item);
            }
        }

        if self.root_pending {
            self.root_pending = false;
            let root = match self.root {
                RootStrategy::Synthesized => compose_root(&mut self.level1).decimate(),
                RootStrategy::Sampled => sample_root(self.sampler),
            };
            if let Some(item) = self.emit(TileAddress::root(), root) {
                return Some(item);
            }
        }

        None
    }
}

/// Iterates the pyramid with the level-0 tile synthesized from its four
/// level-1 children
pub fn iter_tiles<S: Sampler>(sampler: &S, depth: u8) -> TileIter<'_, S> {
    TileIter::new(sampler, depth, RootStrategy::Synthesized)
}

/// Iterates the pyramid with every tile, the level-0 one included, sampled
/// independently, with no cross-branch compositing
pub fn iter_tiles_flat<S: Sampler>(sampler: &S, depth: u8) -> TileIter<'_, S> {
    TileIter::new(sampler, depth, RootStrategy::Sampled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::HashSet;
    use std::f64::consts::TAU;

    struct ConstSampler(u8);

    impl Sampler for ConstSampler {
        type Output = u8;

        fn sample(&self, lon: &[f64], _lat: &[f64]) -> Vec<u8> {
            vec![self.0; lon.len()]
        }
    }

    /// Sampler whose pixels vary with position, for compositing checks
    struct GradientSampler;

    impl Sampler for GradientSampler {
        type Output = [u8; 3];

        fn sample(&self, lon: &[f64], lat: &[f64]) -> Vec<[u8; 3]> {
            lon.iter()
                .zip(lat)
                .map(|(&l, &b)| {
                    let l = l.rem_euclid(TAU) / TAU;
                    let b = (b / std::f64::consts::FRAC_PI_2 + 1.0) / 2.0;
                    [(l * 255.0) as u8, (b * 255.0) as u8, 128]
                })
                .collect()
        }
    }

    fn expected_paths(depth: u8) -> HashSet<String> {
        let mut paths = HashSet::default();
        paths.insert(TileAddress::root().path());
        for level in 1..=depth {
            for y in 0..(1u32 << level) {
                for x in 0..(1u32 << level) {
                    paths.insert(TileAddress::new(level, x, y).path());
                }
            }
        }
        paths
    }

    #[test]
    fn test_emits_one_tile_per_address() {
        for depth in [0u8, 1, 2] {
            let produced: Vec<String> = iter_tiles(&ConstSampler(9), depth)
                .map(|(addr, _)| addr.path())
                .collect();
            let unique: HashSet<String> = produced.iter().cloned().collect();
            assert_eq!(produced.len(), unique.len(), "duplicate emissions at depth {depth}");
            assert_eq!(unique, expected_paths(depth));
        }
    }

    #[test]
    fn test_depth_zero_emits_only_root() {
        let tiles: Vec<_> = iter_tiles(&ConstSampler(3), 0).collect();
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].0, TileAddress::root());
        assert_eq!(tiles[0].1.size(), TILE_SIZE);
    }

    #[test]
    fn test_tile_count_at_depth_two() {
        assert_eq!(iter_tiles(&ConstSampler(0), 2).count(), 1 + 4 + 16);
        assert_eq!(iter_tiles_flat(&ConstSampler(0), 2).count(), 1 + 4 + 16);
    }

    #[test]
    fn test_root_is_decimated_composite_of_level1() {
        let mut level1 = FxHashMap::default();
        let mut root = None;
        for (addr, tile) in iter_tiles(&GradientSampler, 1) {
            if addr.level == 1 {
                level1.insert((addr.x, addr.y), tile);
            } else {
                root = Some(tile);
            }
        }

        let root = root.expect("root tile emitted");
        assert_eq!(level1.len(), 4);
        let expected = compose_root(&mut level1).decimate();
        assert_eq!(root, expected);
    }

    #[test]
    fn test_flat_root_is_directly_sampled() {
        let (addr, root) = iter_tiles_flat(&GradientSampler, 1)
            .find(|(addr, _)| addr.level == 0)
            .expect("root tile emitted");
        assert_eq!(addr, TileAddress::root());

        // The root's upper-left quadrant is the (0, 0) seed quad sampled at
        // half resolution
        let half = TILE_SIZE / 2;
        let node = seeds().iter().find(|n| (n.addr.x, n.addr.y) == (0, 0)).unwrap();
        let grid = node.quad.subsample(half, node.increasing);
        let pixels = GradientSampler.sample(&grid.lon, &grid.lat);
        let quadrant = Tile::new(half, pixels);
        for y in 0..half {
            for x in 0..half {
                assert_eq!(root.get(x, y), quadrant.get(x, y));
            }
        }
    }

    #[test]
    fn test_post_hook_suppresses_tiles() {
        let emitted: Vec<_> = iter_tiles(&ConstSampler(1), 2)
            .with_post(|addr, tile| (addr.level < 2).then_some(tile))
            .collect();
        // Four level-1 tiles plus the synthesized root survive
        assert_eq!(emitted.len(), 5);
        assert!(emitted.iter().all(|(addr, _)| addr.level <= 1));
    }

    #[test]
    fn test_post_hook_sees_root() {
        let tinted: Vec<_> = iter_tiles(&ConstSampler(10), 0)
            .with_post(|_, tile| Some(Tile::filled(tile.size(), 77u8)))
            .collect();
        assert_eq!(tinted.len(), 1);
        assert!(tinted[0].1.pixels().iter().all(|&p| p == 77));
    }

    #[test]
    fn test_seed_orientations() {
        let by_addr: FxHashMap<(u32, u32), bool> =
            seeds().iter().map(|n| ((n.addr.x, n.addr.y), n.increasing)).collect();
        assert!(by_addr[&(0, 0)]);
        assert!(!by_addr[&(1, 0)]);
        assert!(by_addr[&(1, 1)]);
        assert!(!by_addr[&(0, 1)]);
    }

    #[test]
    fn test_children_inherit_orientation() {
        for seed in seeds() {
            for child in seed.children() {
                assert_eq!(child.increasing, seed.increasing);
                assert_eq!(child.addr.level, 2);
            }
        }
    }
}
