use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};

/// A point on the celestial sphere, in radians.
///
/// Latitude is confined to [−π/2, π/2]; longitude is unbounded and wrapped
/// modulo 2π wherever it is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphericalPoint {
    pub lon: f64,
    pub lat: f64,
}

impl SphericalPoint {
    /// Creates a new point from radians
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Creates a new point from degrees
    pub fn from_degrees(lon: f64, lat: f64) -> Self {
        Self::new(lon.to_radians(), lat.to_radians())
    }

    /// Validates that the coordinates are finite and latitude is in range
    pub fn is_valid(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite() && self.lat.abs() <= FRAC_PI_2
    }

    /// Wraps a longitude into [0, 2π)
    pub fn wrap_lon(lon: f64) -> f64 {
        lon.rem_euclid(TAU)
    }

    /// Converts to a unit direction vector
    pub fn to_unit_vector(&self) -> [f64; 3] {
        let (sin_lat, cos_lat) = self.lat.sin_cos();
        let (sin_lon, cos_lon) = self.lon.sin_cos();
        [cos_lat * cos_lon, cos_lat * sin_lon, sin_lat]
    }

    /// Projects a direction vector (not necessarily unit length) back to
    /// (lon, lat), with longitude wrapped into [0, 2π).
    pub fn from_vector(v: [f64; 3]) -> Self {
        let [x, y, z] = v;
        let norm = (x * x + y * y + z * z).sqrt();
        let mut lon = y.atan2(x);
        if lon < 0.0 {
            lon += TAU;
        }
        let lat = (z / norm).clamp(-1.0, 1.0).asin();
        Self::new(lon, lat)
    }

    /// Point on the great-circle arc equidistant from `self` and `other`,
    /// computed by summing the unit vectors and renormalizing rather than
    /// averaging (lon, lat) pairs. Symmetric, and the identity on equal
    /// inputs; undefined only for exact antipodes, which the tiling never
    /// produces.
    pub fn midpoint(&self, other: &SphericalPoint) -> SphericalPoint {
        let a = self.to_unit_vector();
        let b = other.to_unit_vector();
        Self::from_vector([a[0] + b[0], a[1] + b[1], a[2] + b[2]])
    }
}

impl Default for SphericalPoint {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// The four corners of a curved TOAST tile, in
/// (upper-left, upper-right, lower-right, lower-left) order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CornerQuad {
    pub ul: SphericalPoint,
    pub ur: SphericalPoint,
    pub lr: SphericalPoint,
    pub ll: SphericalPoint,
}

impl CornerQuad {
    pub fn new(
        ul: SphericalPoint,
        ur: SphericalPoint,
        lr: SphericalPoint,
        ll: SphericalPoint,
    ) -> Self {
        Self { ul, ur, lr, ll }
    }

    /// Splits the quad into its four children: the four edge midpoints plus
    /// the center point, with the center taken on the ll–ur diagonal when
    /// `increasing`, on the ul–lr diagonal otherwise. Children are returned
    /// in (upper-left, upper-right, lower-left, lower-right) order, matching
    /// [`TileAddress::children`].
    pub fn split(&self, increasing: bool) -> [CornerQuad; 4] {
        let top = self.ul.midpoint(&self.ur);
        let right = self.ur.midpoint(&self.lr);
        let bottom = self.lr.midpoint(&self.ll);
        let left = self.ll.midpoint(&self.ul);
        let center = if increasing {
            self.ll.midpoint(&self.ur)
        } else {
            self.ul.midpoint(&self.lr)
        };

        [
            CornerQuad::new(self.ul, top, center, left),
            CornerQuad::new(top, self.ur, right, center),
            CornerQuad::new(left, center, bottom, self.ll),
            CornerQuad::new(center, right, self.lr, bottom),
        ]
    }

    /// Returns a `resolution × resolution` grid of (lon, lat) covering the
    /// quad, inclusive of all four corners.
    ///
    /// The quad is split into two triangles along the diagonal selected by
    /// `increasing` and sample directions are interpolated barycentrically
    /// in unit-vector space within each triangle, then renormalized. This is
    /// the same construction as [`SphericalPoint::midpoint`], so child-tile
    /// corners land exactly on parent edges. Grid values along an edge
    /// depend only on that edge's endpoints, which makes adjacent tiles
    /// sample identical boundary coordinates and keeps the poles and the
    /// longitude wraparound free of undefined values.
    pub fn subsample(&self, resolution: usize, increasing: bool) -> CoordGrid {
        assert!(resolution >= 2, "subsample needs at least a 2x2 grid");

        let ul = self.ul.to_unit_vector();
        let ur = self.ur.to_unit_vector();
        let lr = self.lr.to_unit_vector();
        let ll = self.ll.to_unit_vector();

        let step = 1.0 / (resolution - 1) as f64;
        let mut lon = Vec::with_capacity(resolution * resolution);
        let mut lat = Vec::with_capacity(resolution * resolution);

        for i in 0..resolution {
            let v = i as f64 * step;
            for j in 0..resolution {
                let u = j as f64 * step;

                // Barycentric weights of the triangle containing (u, v).
                let (a, wa, b, wb, c, wc) = if increasing {
                    if u + v <= 1.0 {
                        (ul, 1.0 - u - v, ur, u, ll, v)
                    } else {
                        (lr, u + v - 1.0, ur, 1.0 - v, ll, 1.0 - u)
                    }
                } else if u >= v {
                    (ul, 1.0 - u, ur, u - v, lr, v)
                } else {
                    (ul, 1.0 - v, lr, u, ll, v - u)
                };

                let point = SphericalPoint::from_vector([
                    a[0] * wa + b[0] * wb + c[0] * wc,
                    a[1] * wa + b[1] * wb + c[1] * wc,
                    a[2] * wa + b[2] * wb + c[2] * wc,
                ]);
                lon.push(point.lon);
                lat.push(point.lat);
            }
        }

        CoordGrid { resolution, lon, lat }
    }
}

/// A square grid of sample coordinates, row-major from the upper-left.
#[derive(Debug, Clone)]
pub struct CoordGrid {
    resolution: usize,
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
}

impl CoordGrid {
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn len(&self) -> usize {
        self.lon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lon.is_empty()
    }

    /// The (lon, lat) sample at grid position (x, y)
    pub fn get(&self, x: usize, y: usize) -> SphericalPoint {
        let idx = y * self.resolution + x;
        SphericalPoint::new(self.lon[idx], self.lat[idx])
    }
}

/// Address of one tile in the quad-tree pyramid.
///
/// Level 0 has exactly one address; every level-n tile has four children at
/// level n+1. Plain value type so addresses can key maps and cross threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileAddress {
    pub level: u8,
    pub x: u32,
    pub y: u32,
}

impl TileAddress {
    pub fn new(level: u8, x: u32, y: u32) -> Self {
        Self { level, x, y }
    }

    /// The single level-0 address
    pub const fn root() -> Self {
        Self { level: 0, x: 0, y: 0 }
    }

    /// Relative tile path under the pyramid root: `"{level}/{y}/{y}_{x}.png"`
    pub fn path(&self) -> String {
        format!("{}/{}/{}_{}.png", self.level, self.y, self.y, self.x)
    }

    /// The four child addresses, in (upper-left, upper-right, lower-left,
    /// lower-right) order
    pub fn children(&self) -> [TileAddress; 4] {
        let (level, x, y) = (self.level + 1, self.x * 2, self.y * 2);
        [
            TileAddress::new(level, x, y),
            TileAddress::new(level, x + 1, y),
            TileAddress::new(level, x, y + 1),
            TileAddress::new(level, x + 1, y + 1),
        ]
    }

    /// The parent address at the level above
    pub fn parent(&self) -> Option<TileAddress> {
        if self.level == 0 {
            None
        } else {
            Some(TileAddress::new(self.level - 1, self.x / 2, self.y / 2))
        }
    }

    /// Checks that x and y are inside the level's 2ⁿ × 2ⁿ grid
    pub fn is_valid(&self) -> bool {
        if self.level >= 32 {
            return false;
        }
        let side = 1u64 << self.level;
        (self.x as u64) < side && (self.y as u64) < side
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    /// Angular longitude difference, ignoring the 0/2π seam
    fn lon_diff(a: f64, b: f64) -> f64 {
        let d = (a - b).rem_euclid(TAU);
        d.min(TAU - d)
    }

    #[test]
    fn test_midpoint_known_values() {
        let m = SphericalPoint::new(0.0, 0.0).midpoint(&SphericalPoint::new(FRAC_PI_2, 0.0));
        assert_close(m.lon, FRAC_PI_4);
        assert_close(m.lat, 0.0);

        let m = SphericalPoint::new(0.0, 0.0).midpoint(&SphericalPoint::new(0.0, 1.0));
        assert_close(m.lon, 0.0);
        assert_close(m.lat, 0.5);
    }

    #[test]
    fn test_midpoint_identity_and_symmetry() {
        let points = [
            SphericalPoint::new(0.3, -0.4),
            SphericalPoint::new(5.1, 1.2),
            SphericalPoint::new(0.0, -FRAC_PI_2),
        ];
        for p in points {
            let m = p.midpoint(&p);
            assert_close(m.lon, p.lon);
            assert_close(m.lat, p.lat);
        }

        let a = SphericalPoint::new(1.0, 0.2);
        let b = SphericalPoint::new(2.5, -0.7);
        let ab = a.midpoint(&b);
        let ba = b.midpoint(&a);
        assert_close(ab.lon, ba.lon);
        assert_close(ab.lat, ba.lat);
    }

    #[test]
    fn test_midpoint_across_wraparound() {
        // Midpoint of points straddling the 0/2π seam stays near the seam
        let a = SphericalPoint::from_degrees(350.0, 0.0);
        let b = SphericalPoint::from_degrees(10.0, 0.0);
        let m = a.midpoint(&b);
        assert_close(m.lon, 0.0);
        assert_close(m.lat, 0.0);
    }

    fn sample_quad() -> CornerQuad {
        CornerQuad::new(
            SphericalPoint::from_degrees(0.0, -90.0),
            SphericalPoint::from_degrees(90.0, 0.0),
            SphericalPoint::from_degrees(0.0, 90.0),
            SphericalPoint::from_degrees(180.0, 0.0),
        )
    }

    #[test]
    fn test_subsample_exact_at_corners() {
        for increasing in [true, false] {
            let quad = sample_quad();
            let n = 9;
            let grid = quad.subsample(n, increasing);
            for (corner, (x, y)) in [
                (quad.ul, (0, 0)),
                (quad.ur, (n - 1, 0)),
                (quad.ll, (0, n - 1)),
                (quad.lr, (n - 1, n - 1)),
            ] {
                let got = grid.get(x, y);
                assert!(lon_diff(got.lon, SphericalPoint::wrap_lon(corner.lon)) < 1e-9);
                assert_close(got.lat, corner.lat);
            }
        }
    }

    #[test]
    fn test_subsample_diagonal_matches_center() {
        // The grid center sits on the split diagonal, so it must agree with
        // the great-circle midpoint used by `split`.
        let quad = sample_quad();
        let grid = quad.subsample(5, true);
        let center = grid.get(2, 2);
        let expected = quad.ll.midpoint(&quad.ur);
        assert!(lon_diff(center.lon, expected.lon) < 1e-9);
        assert_close(center.lat, expected.lat);
    }

    #[test]
    fn test_sibling_tiles_share_edge_coordinates() {
        let n = 8;
        for increasing in [true, false] {
            let quad = sample_quad();
            let [ul, ur, ll, lr] = quad.split(increasing);

            // Right edge of the UL child vs left edge of the UR child
            let left = ul.subsample(n, increasing);
            let right = ur.subsample(n, increasing);
            for row in 0..n {
                let a = left.get(n - 1, row);
                let b = right.get(0, row);
                assert!(lon_diff(a.lon, b.lon) < 1e-9);
                assert_close(a.lat, b.lat);
            }

            // Right edge of the LL child vs left edge of the LR child
            let left = ll.subsample(n, increasing);
            let right = lr.subsample(n, increasing);
            for row in 0..n {
                let a = left.get(n - 1, row);
                let b = right.get(0, row);
                assert!(lon_diff(a.lon, b.lon) < 1e-9);
                assert_close(a.lat, b.lat);
            }
        }
    }

    #[test]
    fn test_split_edges_are_midpoints() {
        let quad = sample_quad();
        let [ul_child, ur_child, ll_child, lr_child] = quad.split(true);

        let top = quad.ul.midpoint(&quad.ur);
        let center = quad.ll.midpoint(&quad.ur);

        assert_eq!(ul_child.ul, quad.ul);
        assert_eq!(ul_child.ur, top);
        assert_eq!(ur_child.ur, quad.ur);
        assert_eq!(ll_child.ll, quad.ll);
        assert_eq!(lr_child.lr, quad.lr);
        assert_eq!(ul_child.lr, center);
        assert_eq!(ur_child.ll, center);
        assert_eq!(ll_child.ur, center);
        assert_eq!(lr_child.ul, center);
    }

    #[test]
    fn test_address_path_format() {
        assert_eq!(TileAddress::new(1, 0, 1).path(), "1/1/1_0.png");
        assert_eq!(TileAddress::root().path(), "0/0/0_0.png");
        assert_eq!(TileAddress::new(3, 5, 2).path(), "3/2/2_5.png");
    }

    #[test]
    fn test_address_children_and_parent() {
        let addr = TileAddress::new(2, 1, 3);
        let children = addr.children();
        assert_eq!(children[0], TileAddress::new(3, 2, 6));
        assert_eq!(children[1], TileAddress::new(3, 3, 6));
        assert_eq!(children[2], TileAddress::new(3, 2, 7));
        assert_eq!(children[3], TileAddress::new(3, 3, 7));
        for child in children {
            assert_eq!(child.parent(), Some(addr));
        }
        assert_eq!(TileAddress::root().parent(), None);
    }

    #[test]
    fn test_address_validity() {
        assert!(TileAddress::root().is_valid());
        assert!(TileAddress::new(2, 3, 3).is_valid());
        assert!(!TileAddress::new(2, 4, 0).is_valid());
        assert!(!TileAddress::new(0, 0, 1).is_valid());
    }

    #[test]
    fn test_pole_projection_is_defined() {
        let pole = SphericalPoint::new(0.0, FRAC_PI_2);
        let v = pole.to_unit_vector();
        let back = SphericalPoint::from_vector(v);
        assert_close(back.lat, FRAC_PI_2);
        assert!(back.lon.is_finite());

        // A quad with two pole corners still yields finite samples
        let grid = sample_quad().subsample(16, true);
        assert!(grid.lon.iter().all(|l| l.is_finite()));
        assert!(grid.lat.iter().all(|b| b.is_finite() && b.abs() <= FRAC_PI_2 + 1e-12));
    }
}
