//! Volatility Surface
//!
//! Scattered surface samples and the regular grid they are interpolated onto.
//! The grid is indexed `[strike, time]`, time measured in weeks to maturity.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// One (time, strike, vol) sample taken from a priced contract
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfacePoint {
    /// Time to maturity in weeks
    pub time: f64,
    /// Strike price
    pub strike: f64,
    /// Implied volatility
    pub vol: f64,
}

impl SurfacePoint {
    pub fn new(time: f64, strike: f64, vol: f64) -> Self {
        Self { time, strike, vol }
    }
}

/// Interpolation tier that produced a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterpolationMethod {
    /// Cubic Bézier patches over a Delaunay triangulation
    Cubic,
    /// Barycentric interpolation over a Delaunay triangulation
    Linear,
    /// Value of the closest sample
    Nearest,
    /// Flat surface substituted when no samples exist
    Placeholder,
}

impl InterpolationMethod {
    pub fn label(&self) -> &'static str {
        match self {
            InterpolationMethod::Cubic => "cubic",
            InterpolationMethod::Linear => "linear",
            InterpolationMethod::Nearest => "nearest",
            InterpolationMethod::Placeholder => "placeholder",
        }
    }
}

impl std::fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Rectangular volatility grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    /// Time axis in weeks (ascending)
    pub times: Vec<f64>,
    /// Strike axis (ascending)
    pub strikes: Vec<f64>,
    /// Volatility grid [strike, time] -> vol, `None` where undefined
    pub vols: Array2<Option<f64>>,
    /// Tier that produced the values
    pub method: InterpolationMethod,
}

impl Grid {
    /// Build a grid by evaluating `f(time, strike)` at every node
    pub fn from_fn<F>(
        times: Vec<f64>,
        strikes: Vec<f64>,
        method: InterpolationMethod,
        mut f: F,
    ) -> Self
    where
        F: FnMut(f64, f64) -> Option<f64>,
    {
        let vols = Array2::from_shape_fn((strikes.len(), times.len()), |(si, ti)| {
            f(times[ti], strikes[si]).filter(|v| v.is_finite())
        });

        Self {
            times,
            strikes,
            vols,
            method,
        }
    }

    /// Constant surface
    pub fn flat(times: Vec<f64>, strikes: Vec<f64>, vol: f64, method: InterpolationMethod) -> Self {
        Self::from_fn(times, strikes, method, |_, _| Some(vol))
    }

    /// (strikes, times)
    pub fn dim(&self) -> (usize, usize) {
        self.vols.dim()
    }

    /// Volatility at node (strike index, time index)
    pub fn value(&self, si: usize, ti: usize) -> Option<f64> {
        self.vols.get([si, ti]).copied().flatten()
    }

    pub fn defined_count(&self) -> usize {
        self.vols.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_fully_defined(&self) -> bool {
        self.defined_count() == self.vols.len()
    }

    pub fn is_all_undefined(&self) -> bool {
        self.defined_count() == 0
    }

    /// (min, max) of the time axis
    pub fn time_range(&self) -> Option<(f64, f64)> {
        axis_range(&self.times)
    }

    /// (min, max) of the strike axis
    pub fn strike_range(&self) -> Option<(f64, f64)> {
        axis_range(&self.strikes)
    }

    /// (min, max) over defined volatilities
    pub fn vol_range(&self) -> Option<(f64, f64)> {
        self.vols.iter().flatten().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Defined (strike, vol) pairs along one time column
    pub fn smile(&self, ti: usize) -> Vec<(f64, f64)> {
        if ti >= self.times.len() {
            return Vec::new();
        }

        self.strikes
            .iter()
            .enumerate()
            .filter_map(|(si, &strike)| self.value(si, ti).map(|v| (strike, v)))
            .collect()
    }

    /// Index of the time column closest to `weeks`
    pub fn nearest_time_index(&self, weeks: f64) -> Option<usize> {
        self.times
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (*a - weeks)
                    .abs()
                    .partial_cmp(&(*b - weeks).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
    }
}

fn axis_range(axis: &[f64]) -> Option<(f64, f64)> {
    let first = *axis.first()?;
    let last = *axis.last()?;
    Some((first.min(last), first.max(last)))
}

/// `n` evenly spaced values from `start` to `end` inclusive
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut values: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            // Pin the end point against rounding drift
            values[n - 1] = end;
            values
        }
    }
}

/// Axis titles handed to a renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisLabels {
    pub x: String,
    pub y: String,
    pub z: String,
}

impl Default for AxisLabels {
    fn default() -> Self {
        Self {
            x: "Time to Expiration (Weeks)".to_string(),
            y: "Strike Price".to_string(),
            z: "Implied Volatility".to_string(),
        }
    }
}
