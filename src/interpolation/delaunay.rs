//! Delaunay triangulation (Bowyer-Watson)
//!
//! Points are shifted to the origin and divided by one common scale before
//! triangulating, which keeps the incircle tests well conditioned without
//! changing which triangulation is Delaunay.

use std::collections::{BTreeSet, HashMap};

use crate::core::{SurfaceError, SurfaceResult};

/// Relative tolerance below which a point set counts as collinear
const COLLINEAR_TOL: f64 = 1e-10;

/// Barycentric slack allowed when locating a point on a triangle edge
const LOCATE_TOL: f64 = 1e-12;

/// Super-triangle size relative to the normalised extent
const SUPER_SCALE: f64 = 100.0;

/// Triangulation of a planar point set
#[derive(Debug, Clone)]
pub struct Triangulation {
    /// Normalised vertex coordinates
    points: Vec<[f64; 2]>,
    /// Counter-clockwise vertex triples
    triangles: Vec<[usize; 3]>,
    /// Sorted neighbour lists per vertex
    neighbors: Vec<Vec<usize>>,
    origin: [f64; 2],
    scale: f64,
}

impl Triangulation {
    /// Triangulate `(x, y)` points. Fails on fewer than three points or a
    /// collinear set, where no triangle exists.
    pub fn new(raw: &[[f64; 2]]) -> SurfaceResult<Self> {
        if raw.len() < 3 {
            return Err(SurfaceError::numerical(format!(
                "Triangulation needs at least 3 points, got {}",
                raw.len()
            )));
        }
        if raw.iter().any(|p| !(p[0].is_finite() && p[1].is_finite())) {
            return Err(SurfaceError::numerical("Non-finite coordinate"));
        }

        let (origin, scale) = normalisation(raw);
        let points: Vec<[f64; 2]> = raw
            .iter()
            .map(|p| [(p[0] - origin[0]) / scale, (p[1] - origin[1]) / scale])
            .collect();

        if is_collinear(&points) {
            return Err(SurfaceError::numerical("Points are collinear"));
        }

        let triangles = bowyer_watson(&points);
        if triangles.is_empty() {
            return Err(SurfaceError::numerical("Triangulation produced no triangles"));
        }

        let neighbors = build_neighbors(points.len(), &triangles);

        Ok(Self {
            points,
            triangles,
            neighbors,
            origin,
            scale,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Normalised coordinates of vertex `i`
    pub fn point(&self, i: usize) -> [f64; 2] {
        self.points[i]
    }

    /// Vertices sharing an edge with vertex `i`
    pub fn neighbors(&self, i: usize) -> &[usize] {
        &self.neighbors[i]
    }

    /// Map a raw coordinate into the normalised frame
    pub fn normalise(&self, x: f64, y: f64) -> [f64; 2] {
        [(x - self.origin[0]) / self.scale, (y - self.origin[1]) / self.scale]
    }

    /// Containing triangle and barycentric weights for a raw coordinate,
    /// `None` outside the convex hull
    pub fn locate(&self, x: f64, y: f64) -> Option<(usize, [f64; 3])> {
        let p = self.normalise(x, y);

        self.triangles.iter().enumerate().find_map(|(ti, tri)| {
            let a = self.points[tri[0]];
            let b = self.points[tri[1]];
            let c = self.points[tri[2]];

            if p[0] < a[0].min(b[0]).min(c[0]) - LOCATE_TOL
                || p[0] > a[0].max(b[0]).max(c[0]) + LOCATE_TOL
                || p[1] < a[1].min(b[1]).min(c[1]) - LOCATE_TOL
                || p[1] > a[1].max(b[1]).max(c[1]) + LOCATE_TOL
            {
                return None;
            }

            let w = barycentric(a, b, c, p)?;
            if w.iter().all(|&l| l >= -LOCATE_TOL) {
                Some((ti, w))
            } else {
                None
            }
        })
    }
}

/// Origin and common scale mapping the point set into the unit box
fn normalisation(points: &[[f64; 2]]) -> ([f64; 2], f64) {
    let mut min = [f64::INFINITY; 2];
    let mut max = [f64::NEG_INFINITY; 2];
    for p in points {
        for axis in 0..2 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }

    let extent = (max[0] - min[0]).max(max[1] - min[1]);
    let scale = if extent > 0.0 { extent } else { 1.0 };
    (min, scale)
}

fn is_collinear(points: &[[f64; 2]]) -> bool {
    let p0 = points[0];
    let far = points
        .iter()
        .copied()
        .max_by(|a, b| {
            dist2(p0, *a)
                .partial_cmp(&dist2(p0, *b))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(p0);

    let base = dist2(p0, far).sqrt();
    if base <= COLLINEAR_TOL {
        return true;
    }

    points
        .iter()
        .all(|&p| (orient(p0, far, p) / base).abs() <= COLLINEAR_TOL)
}

fn dist2(a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)
}

/// Twice the signed area of (a, b, c); positive when counter-clockwise
pub(crate) fn orient(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

/// Positive when `d` lies inside the circumcircle of counter-clockwise (a, b, c)
fn incircle(a: [f64; 2], b: [f64; 2], c: [f64; 2], d: [f64; 2]) -> f64 {
    let (adx, ady) = (a[0] - d[0], a[1] - d[1]);
    let (bdx, bdy) = (b[0] - d[0], b[1] - d[1]);
    let (cdx, cdy) = (c[0] - d[0], c[1] - d[1]);

    let ad = adx * adx + ady * ady;
    let bd = bdx * bdx + bdy * bdy;
    let cd = cdx * cdx + cdy * cdy;

    ad * (bdx * cdy - cdx * bdy) - bd * (adx * cdy - cdx * ady) + cd * (adx * bdy - bdx * ady)
}

/// Barycentric weights of `p` in triangle (a, b, c)
pub(crate) fn barycentric(a: [f64; 2], b: [f64; 2], c: [f64; 2], p: [f64; 2]) -> Option<[f64; 3]> {
    let area = orient(a, b, c);
    if area.abs() < f64::EPSILON {
        return None;
    }

    let wa = orient(p, b, c) / area;
    let wb = orient(a, p, c) / area;
    Some([wa, wb, 1.0 - wa - wb])
}

fn ccw(points: &[[f64; 2]], tri: [usize; 3]) -> [usize; 3] {
    if orient(points[tri[0]], points[tri[1]], points[tri[2]]) < 0.0 {
        [tri[0], tri[2], tri[1]]
    } else {
        tri
    }
}

fn bowyer_watson(points: &[[f64; 2]]) -> Vec<[usize; 3]> {
    let n = points.len();

    // Normalised points live in [0, 1] x [0, 1]
    let mut all = points.to_vec();
    all.push([0.5 - SUPER_SCALE, 0.5 - SUPER_SCALE]);
    all.push([0.5 + SUPER_SCALE, 0.5 - SUPER_SCALE]);
    all.push([0.5, 0.5 + SUPER_SCALE]);

    let mut triangles: Vec<[usize; 3]> = vec![ccw(&all, [n, n + 1, n + 2])];

    for i in 0..n {
        let p = all[i];

        let (bad, good): (Vec<[usize; 3]>, Vec<[usize; 3]>) = triangles
            .into_iter()
            .partition(|t| incircle(all[t[0]], all[t[1]], all[t[2]], p) > 0.0);

        // Cavity boundary: edges owned by exactly one bad triangle
        let mut edge_count: HashMap<(usize, usize), usize> = HashMap::new();
        for t in &bad {
            for (a, b) in [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])] {
                *edge_count.entry((a.min(b), a.max(b))).or_insert(0) += 1;
            }
        }

        triangles = good;
        for t in &bad {
            for (a, b) in [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])] {
                if edge_count.get(&(a.min(b), a.max(b))) == Some(&1)
                    && orient(all[a], all[b], p).abs() > f64::EPSILON
                {
                    triangles.push(ccw(&all, [a, b, i]));
                }
            }
        }
    }

    triangles
        .into_iter()
        .filter(|t| t.iter().all(|&v| v < n))
        .filter(|t| orient(points[t[0]], points[t[1]], points[t[2]]).abs() > f64::EPSILON)
        .collect()
}

fn build_neighbors(n: usize, triangles: &[[usize; 3]]) -> Vec<Vec<usize>> {
    let mut sets: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
    for t in triangles {
        for (a, b) in [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])] {
            sets[a].insert(b);
            sets[b].insert(a);
        }
    }
    sets.into_iter().map(|s| s.into_iter().collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total_area(tri: &Triangulation) -> f64 {
        tri.triangles()
            .iter()
            .map(|t| 0.5 * orient(tri.point(t[0]), tri.point(t[1]), tri.point(t[2])))
            .sum::<f64>()
            * tri.scale
            * tri.scale
    }

    #[test]
    fn test_square_with_center() {
        let pts = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.5, 0.5]];
        let tri = Triangulation::new(&pts).unwrap();

        assert_eq!(tri.triangles().len(), 4);
        assert!((total_area(&tri) - 1.0).abs() < 1e-12);
        // Centre touches every corner
        assert_eq!(tri.neighbors(4), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_triangles_are_ccw() {
        let pts = [[3.0, 100.0], [10.0, 90.0], [52.0, 120.0], [20.0, 105.0], [40.0, 95.0]];
        let tri = Triangulation::new(&pts).unwrap();

        for t in tri.triangles() {
            assert!(orient(tri.point(t[0]), tri.point(t[1]), tri.point(t[2])) > 0.0);
        }
    }

    #[test]
    fn test_regular_grid_covers_hull() {
        let mut pts = Vec::new();
        for t in [2.0, 6.0, 10.0, 20.0] {
            for k in [80.0, 90.0, 100.0, 110.0, 120.0] {
                pts.push([t, k]);
            }
        }
        let tri = Triangulation::new(&pts).unwrap();

        // Hull is the rectangle [2, 20] x [80, 120]
        assert!((total_area(&tri) - 18.0 * 40.0).abs() < 1e-6);
        assert_eq!(tri.triangles().len(), 2 * 3 * 4);
    }

    #[test]
    fn test_locate() {
        let pts = [[0.0, 0.0], [4.0, 0.0], [0.0, 4.0]];
        let tri = Triangulation::new(&pts).unwrap();

        let (_, w) = tri.locate(1.0, 1.0).unwrap();
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(w.iter().all(|&l| l > 0.0));

        // On an edge and on a vertex
        assert!(tri.locate(2.0, 2.0).is_some());
        assert!(tri.locate(0.0, 0.0).is_some());

        // Outside the hull
        assert!(tri.locate(3.0, 3.0).is_none());
        assert!(tri.locate(-0.1, 1.0).is_none());
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(Triangulation::new(&[[1.0, 100.0]]).is_err());
        assert!(Triangulation::new(&[[1.0, 100.0], [2.0, 105.0]]).is_err());
        assert!(Triangulation::new(&[[1.0, 100.0], [2.0, 100.0], [5.0, 100.0]]).is_err());
        assert!(Triangulation::new(&[[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]]).is_err());
        assert!(Triangulation::new(&[[1.0, f64::NAN], [2.0, 2.0], [3.0, 1.0]]).is_err());
    }
}
