//! Surface rendering
//!
//! Renderers are presentation-only: the pipeline hands them the finished grid
//! and consumes nothing back except an I/O failure.

mod colormap;
mod json;
mod table;

pub use colormap::*;
pub use json::*;
pub use table::*;

use crate::core::{AxisLabels, Grid, SurfaceResult};

/// Default surface title
pub const SURFACE_TITLE: &str = "Implied Volatility Surface";

/// Draws a volatility grid
pub trait SurfaceRenderer {
    fn render_surface(&mut self, grid: &Grid, labels: &AxisLabels, title: &str) -> SurfaceResult<()>;
}

/// Fan a grid out to several renderers in order
impl SurfaceRenderer for Vec<Box<dyn SurfaceRenderer>> {
    fn render_surface(&mut self, grid: &Grid, labels: &AxisLabels, title: &str) -> SurfaceResult<()> {
        for renderer in self.iter_mut() {
            renderer.render_surface(grid, labels, title)?;
        }
        Ok(())
    }
}

/// Keeps the last rendered grid in memory
#[derive(Debug, Clone, Default)]
pub struct CapturedSurface {
    pub grid: Option<Grid>,
    pub labels: Option<AxisLabels>,
    pub title: Option<String>,
}

impl SurfaceRenderer for CapturedSurface {
    fn render_surface(&mut self, grid: &Grid, labels: &AxisLabels, title: &str) -> SurfaceResult<()> {
        self.grid = Some(grid.clone());
        self.labels = Some(labels.clone());
        self.title = Some(title.to_string());
        Ok(())
    }
}
