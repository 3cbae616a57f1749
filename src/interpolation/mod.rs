//! Surface interpolation
//!
//! Turns scattered (weeks, strike, vol) samples into a regular [`Grid`].
//!
//! Tiers are tried in order until one yields at least one defined node:
//! 1. **Cubic**: Bézier triangles over a Delaunay triangulation
//! 2. **Linear**: barycentric interpolation on the same triangulation
//! 3. **Nearest**: closest sample, defined everywhere
//!
//! A tier that cannot run (no triangulation for fewer than three distinct or
//! collinear samples) is skipped. With no samples at all a flat placeholder
//! surface is returned together with a notice.

mod delaunay;
mod scattered;

pub use delaunay::Triangulation;
pub use scattered::*;

use std::collections::HashMap;

use crate::core::{linspace, Grid, InterpolationMethod, SurfaceError, SurfacePoint, SurfaceResult};

/// Default grid nodes per axis
pub const DEFAULT_RESOLUTION: usize = 50;

/// Default tier order
pub const DEFAULT_TIERS: [InterpolationMethod; 3] = [
    InterpolationMethod::Cubic,
    InterpolationMethod::Linear,
    InterpolationMethod::Nearest,
];

/// Placeholder surface volatility
pub const PLACEHOLDER_VOL: f64 = 0.5;

/// Placeholder grid nodes per axis
pub const PLACEHOLDER_RESOLUTION: usize = 10;

/// Placeholder time axis in weeks
pub const PLACEHOLDER_WEEKS: (f64, f64) = (1.0, 52.0);

/// Placeholder strike band as fractions of spot
pub const PLACEHOLDER_STRIKE_FRACTIONS: (f64, f64) = (0.8, 1.2);

/// Notice shown when the placeholder replaces real data
pub const PLACEHOLDER_NOTICE: &str =
    "No valid options data available, displaying placeholder graph.";

/// Interpolated grid plus any user-facing notice
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceBuild {
    pub grid: Grid,
    pub notice: Option<String>,
}

/// Tiered scattered-data interpolator
#[derive(Debug, Clone)]
pub struct SurfaceInterpolator {
    resolution: usize,
    tiers: Vec<InterpolationMethod>,
}

impl Default for SurfaceInterpolator {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLUTION)
    }
}

impl SurfaceInterpolator {
    /// Default tiers at the given resolution
    pub fn new(resolution: usize) -> Self {
        Self {
            resolution: resolution.max(2),
            tiers: DEFAULT_TIERS.to_vec(),
        }
    }

    /// Custom tier order
    pub fn with_tiers(mut self, tiers: Vec<InterpolationMethod>) -> Self {
        self.tiers = tiers;
        self
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn tiers(&self) -> &[InterpolationMethod] {
        &self.tiers
    }

    /// Grid for the samples, or the placeholder around `spot` if there are none
    pub fn build(&self, points: &[SurfacePoint], spot: f64) -> SurfaceResult<SurfaceBuild> {
        if points.is_empty() {
            tracing::info!("No surface points; substituting placeholder surface");
            return Ok(SurfaceBuild {
                grid: placeholder_grid(spot),
                notice: Some(PLACEHOLDER_NOTICE.to_string()),
            });
        }

        Ok(SurfaceBuild {
            grid: self.interpolate(points)?,
            notice: None,
        })
    }

    /// Interpolate non-empty samples onto a grid spanning their ranges
    pub fn interpolate(&self, points: &[SurfacePoint]) -> SurfaceResult<Grid> {
        let samples = merge_coincident(points);
        if samples.is_empty() {
            return Err(SurfaceError::no_data("No finite surface points to interpolate"));
        }

        let (t_min, t_max) = min_max(samples.iter().map(|s| s.time));
        let (k_min, k_max) = min_max(samples.iter().map(|s| s.strike));
        let times = linspace(t_min, t_max, self.resolution);
        let strikes = linspace(k_min, k_max, self.resolution);

        // Shared by the cubic and linear tiers
        let mut triangulation: Option<SurfaceResult<(Triangulation, Vec<f64>)>> = None;

        for &method in &self.tiers {
            let grid = match method {
                InterpolationMethod::Cubic | InterpolationMethod::Linear => {
                    let built = triangulation.get_or_insert_with(|| triangulate(&samples));
                    let (tri, values) = match built {
                        Ok(ok) => (&ok.0, &ok.1),
                        Err(e) => {
                            tracing::debug!("{} interpolation unavailable: {}", method, e);
                            continue;
                        }
                    };

                    if method == InterpolationMethod::Cubic {
                        evaluate_grid(&CubicInterpolant::new(tri, values), &times, &strikes, method)
                    } else {
                        evaluate_grid(&LinearInterpolant::new(tri, values), &times, &strikes, method)
                    }
                }
                InterpolationMethod::Nearest => {
                    evaluate_grid(&NearestInterpolant::new(&samples), &times, &strikes, method)
                }
                InterpolationMethod::Placeholder => continue,
            };

            tracing::debug!(
                "{} interpolation: {}/{} nodes defined",
                method,
                grid.defined_count(),
                grid.vols.len()
            );

            if !grid.is_all_undefined() {
                return Ok(grid);
            }
        }

        Err(SurfaceError::numerical(
            "No interpolation tier produced a defined value",
        ))
    }
}

fn evaluate_grid<I: Interpolant>(
    interpolant: &I,
    times: &[f64],
    strikes: &[f64],
    method: InterpolationMethod,
) -> Grid {
    Grid::from_fn(times.to_vec(), strikes.to_vec(), method, |t, k| {
        interpolant.evaluate(t, k)
    })
}

/// Flat placeholder surface around `spot`
pub fn placeholder_grid(spot: f64) -> Grid {
    let (lo, hi) = PLACEHOLDER_STRIKE_FRACTIONS;
    Grid::flat(
        linspace(PLACEHOLDER_WEEKS.0, PLACEHOLDER_WEEKS.1, PLACEHOLDER_RESOLUTION),
        linspace(spot * lo, spot * hi, PLACEHOLDER_RESOLUTION),
        PLACEHOLDER_VOL,
        InterpolationMethod::Placeholder,
    )
}

/// Average the vols of samples sharing a coordinate; drop non-finite samples
fn merge_coincident(points: &[SurfacePoint]) -> Vec<SurfacePoint> {
    let mut index: HashMap<(u64, u64), usize> = HashMap::new();
    let mut merged: Vec<(SurfacePoint, usize)> = Vec::new();

    for p in points {
        if !(p.time.is_finite() && p.strike.is_finite() && p.vol.is_finite()) {
            continue;
        }

        let key = (p.time.to_bits(), p.strike.to_bits());
        match index.get(&key) {
            Some(&i) => {
                merged[i].0.vol += p.vol;
                merged[i].1 += 1;
            }
            None => {
                index.insert(key, merged.len());
                merged.push((*p, 1));
            }
        }
    }

    merged
        .into_iter()
        .map(|(mut p, n)| {
            p.vol /= n as f64;
            p
        })
        .collect()
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smile_samples() -> Vec<SurfacePoint> {
        let mut points = Vec::new();
        for &t in &[2.0, 6.0, 14.0, 30.0, 52.0] {
            for i in 0..9 {
                let k = 80.0 + 5.0 * i as f64;
                let m = (k / 100.0_f64).ln();
                let vol = 0.25 + 0.4 * m * m - 0.05 * m + 0.02 / (t / 52.0 + 0.5);
                points.push(SurfacePoint::new(t, k, vol));
            }
        }
        points
    }

    #[test]
    fn test_cubic_on_rich_data() {
        let grid = SurfaceInterpolator::default().interpolate(&smile_samples()).unwrap();

        assert_eq!(grid.method, InterpolationMethod::Cubic);
        assert_eq!(grid.dim(), (50, 50));
        // Samples fill a rectangle, so the hull covers the whole grid
        assert!(grid.is_fully_defined());

        let (lo, hi) = grid.vol_range().unwrap();
        assert!(lo > 0.2 && hi < 0.4);
    }

    #[test]
    fn test_grid_spans_sample_ranges() {
        let points = vec![
            SurfacePoint::new(3.0, 95.0, 0.30),
            SurfacePoint::new(40.0, 82.5, 0.35),
            SurfacePoint::new(12.0, 131.0, 0.28),
            SurfacePoint::new(25.0, 104.0, 0.26),
        ];
        let grid = SurfaceInterpolator::new(20).interpolate(&points).unwrap();

        assert_eq!(grid.time_range(), Some((3.0, 40.0)));
        assert_eq!(grid.strike_range(), Some((82.5, 131.0)));
        assert_eq!(grid.times.len(), 20);
        assert_eq!(grid.strikes.len(), 20);
        // Corners of the box fall outside the hull
        assert!(!grid.is_fully_defined());
    }

    #[test]
    fn test_single_point_falls_back_to_nearest() {
        let points = vec![SurfacePoint::new(5.2, 100.0, 0.37)];
        let grid = SurfaceInterpolator::default().interpolate(&points).unwrap();

        assert_eq!(grid.method, InterpolationMethod::Nearest);
        assert!(grid.is_fully_defined());
        assert!(grid.vols.iter().all(|v| *v == Some(0.37)));
        assert_eq!(grid.time_range(), Some((5.2, 5.2)));
        assert_eq!(grid.strike_range(), Some((100.0, 100.0)));
    }

    #[test]
    fn test_collinear_points_fall_back_to_nearest() {
        // A single expiry: every sample shares the same time
        let points: Vec<SurfacePoint> = (0..5)
            .map(|i| SurfacePoint::new(4.0, 90.0 + 5.0 * i as f64, 0.2 + 0.01 * i as f64))
            .collect();
        let grid = SurfaceInterpolator::new(10).interpolate(&points).unwrap();

        assert_eq!(grid.method, InterpolationMethod::Nearest);
        assert!(grid.is_fully_defined());
        assert!((grid.value(0, 0).unwrap() - 0.2).abs() < 1e-12);
        assert!((grid.value(9, 9).unwrap() - 0.24).abs() < 1e-12);
    }

    #[test]
    fn test_linear_tier_when_cubic_disabled() {
        let grid = SurfaceInterpolator::new(10)
            .with_tiers(vec![InterpolationMethod::Linear, InterpolationMethod::Nearest])
            .interpolate(&smile_samples())
            .unwrap();
        assert_eq!(grid.method, InterpolationMethod::Linear);
    }

    #[test]
    fn test_no_usable_tier() {
        let points = vec![SurfacePoint::new(1.0, 100.0, 0.3)];
        let result = SurfaceInterpolator::new(10)
            .with_tiers(vec![InterpolationMethod::Cubic, InterpolationMethod::Linear])
            .interpolate(&points);
        assert!(result.is_err());
    }

    #[test]
    fn test_coincident_points_are_averaged() {
        // Call and put at the same strike and expiry
        let points = vec![
            SurfacePoint::new(4.0, 100.0, 0.30),
            SurfacePoint::new(4.0, 100.0, 0.34),
        ];
        let merged = merge_coincident(&points);
        assert_eq!(merged.len(), 1);
        assert!((merged[0].vol - 0.32).abs() < 1e-12);

        let grid = SurfaceInterpolator::new(5).interpolate(&points).unwrap();
        assert_eq!(grid.method, InterpolationMethod::Nearest);
        assert!((grid.value(2, 2).unwrap() - 0.32).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input_gives_placeholder() {
        let build = SurfaceInterpolator::default().build(&[], 200.0).unwrap();

        assert_eq!(build.notice.as_deref(), Some(PLACEHOLDER_NOTICE));
        let grid = build.grid;
        assert_eq!(grid.method, InterpolationMethod::Placeholder);
        assert_eq!(grid.dim(), (10, 10));
        assert!(grid.vols.iter().all(|v| *v == Some(0.5)));
        assert_eq!(grid.time_range(), Some((1.0, 52.0)));
        let (k_lo, k_hi) = grid.strike_range().unwrap();
        assert!((k_lo - 160.0).abs() < 1e-9);
        assert!((k_hi - 240.0).abs() < 1e-9);
    }

    #[test]
    fn test_build_with_points_has_no_notice() {
        let build = SurfaceInterpolator::new(8).build(&smile_samples(), 100.0).unwrap();
        assert!(build.notice.is_none());
        assert_eq!(build.grid.method, InterpolationMethod::Cubic);
    }
}
