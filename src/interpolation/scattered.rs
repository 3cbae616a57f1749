//! Scattered-data interpolants over (time, strike) samples
//!
//! - [`LinearInterpolant`]: barycentric weights on the Delaunay triangle
//! - [`CubicInterpolant`]: cubic Bézier triangle per Delaunay triangle,
//!   control net from vertex values and least-squares vertex gradients
//! - [`NearestInterpolant`]: value of the closest sample
//!
//! Triangle-based interpolants are undefined outside the convex hull.

use crate::core::{SurfacePoint, SurfaceResult};

use super::delaunay::Triangulation;

/// Point-wise evaluation of an interpolant
pub trait Interpolant {
    /// Value at raw (time, strike), `None` where the method has no value
    fn evaluate(&self, time: f64, strike: f64) -> Option<f64>;
}

/// Barycentric interpolation on the triangulation
pub struct LinearInterpolant<'a> {
    tri: &'a Triangulation,
    values: &'a [f64],
}

impl<'a> LinearInterpolant<'a> {
    pub fn new(tri: &'a Triangulation, values: &'a [f64]) -> Self {
        Self { tri, values }
    }
}

impl Interpolant for LinearInterpolant<'_> {
    fn evaluate(&self, time: f64, strike: f64) -> Option<f64> {
        let (ti, w) = self.tri.locate(time, strike)?;
        let t = self.tri.triangles()[ti];
        Some(w[0] * self.values[t[0]] + w[1] * self.values[t[1]] + w[2] * self.values[t[2]])
    }
}

/// Piecewise cubic interpolation on the triangulation
pub struct CubicInterpolant<'a> {
    tri: &'a Triangulation,
    values: &'a [f64],
    /// Gradients in the triangulation's normalised frame
    gradients: Vec<[f64; 2]>,
}

impl<'a> CubicInterpolant<'a> {
    pub fn new(tri: &'a Triangulation, values: &'a [f64]) -> Self {
        let gradients = (0..tri.len())
            .map(|i| estimate_gradient(tri, values, i))
            .collect();

        Self {
            tri,
            values,
            gradients,
        }
    }

    /// Edge control point next to vertex `i` in the direction of vertex `j`
    fn edge_control(&self, i: usize, j: usize) -> f64 {
        let pi = self.tri.point(i);
        let pj = self.tri.point(j);
        let g = self.gradients[i];
        self.values[i] + (g[0] * (pj[0] - pi[0]) + g[1] * (pj[1] - pi[1])) / 3.0
    }
}

impl Interpolant for CubicInterpolant<'_> {
    fn evaluate(&self, time: f64, strike: f64) -> Option<f64> {
        let (ti, [u, v, w]) = self.tri.locate(time, strike)?;
        let [a, b, c] = self.tri.triangles()[ti];

        let b300 = self.values[a];
        let b030 = self.values[b];
        let b003 = self.values[c];

        let b210 = self.edge_control(a, b);
        let b120 = self.edge_control(b, a);
        let b021 = self.edge_control(b, c);
        let b012 = self.edge_control(c, b);
        let b102 = self.edge_control(c, a);
        let b201 = self.edge_control(a, c);

        // Centre point lifted from the edge controls
        let e = (b210 + b120 + b021 + b012 + b102 + b201) / 6.0;
        let centroid = (b300 + b030 + b003) / 3.0;
        let b111 = e + (e - centroid) / 2.0;

        Some(
            b300 * u * u * u
                + b030 * v * v * v
                + b003 * w * w * w
                + 3.0 * b210 * u * u * v
                + 3.0 * b120 * u * v * v
                + 3.0 * b021 * v * v * w
                + 3.0 * b012 * v * w * w
                + 3.0 * b102 * u * w * w
                + 3.0 * b201 * u * u * w
                + 6.0 * b111 * u * v * w,
        )
    }
}

/// Inverse-distance weighted least-squares plane through a vertex and its
/// neighbours. Zero when the neighbourhood does not span two directions.
fn estimate_gradient(tri: &Triangulation, values: &[f64], i: usize) -> [f64; 2] {
    let p = tri.point(i);
    let (mut sxx, mut sxy, mut syy, mut sxf, mut syf) = (0.0, 0.0, 0.0, 0.0, 0.0);

    for &j in tri.neighbors(i) {
        let q = tri.point(j);
        let dx = q[0] - p[0];
        let dy = q[1] - p[1];
        let d2 = dx * dx + dy * dy;
        if d2 <= 0.0 {
            continue;
        }
        let wgt = 1.0 / d2;
        let df = values[j] - values[i];

        sxx += wgt * dx * dx;
        sxy += wgt * dx * dy;
        syy += wgt * dy * dy;
        sxf += wgt * dx * df;
        syf += wgt * dy * df;
    }

    let det = sxx * syy - sxy * sxy;
    if det.abs() < 1e-12 * (sxx * syy).max(f64::MIN_POSITIVE) {
        return [0.0, 0.0];
    }

    [(syy * sxf - sxy * syf) / det, (sxx * syf - sxy * sxf) / det]
}

/// Closest-sample lookup
pub struct NearestInterpolant<'a> {
    samples: &'a [SurfacePoint],
}

impl<'a> NearestInterpolant<'a> {
    pub fn new(samples: &'a [SurfacePoint]) -> Self {
        Self { samples }
    }
}

impl Interpolant for NearestInterpolant<'_> {
    fn evaluate(&self, time: f64, strike: f64) -> Option<f64> {
        self.samples
            .iter()
            .map(|s| {
                let dt = s.time - time;
                let dk = s.strike - strike;
                (dt * dt + dk * dk, s.vol)
            })
            .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(_, vol)| vol)
    }
}

/// Triangulate samples for the triangle-based interpolants
pub fn triangulate(samples: &[SurfacePoint]) -> SurfaceResult<(Triangulation, Vec<f64>)> {
    let coords: Vec<[f64; 2]> = samples.iter().map(|s| [s.time, s.strike]).collect();
    let tri = Triangulation::new(&coords)?;
    let values = samples.iter().map(|s| s.vol).collect();
    Ok((tri, values))
}
