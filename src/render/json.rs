//! JSON surface export

use std::io::Write;

use serde::Serialize;

use crate::core::{AxisLabels, Grid, SurfaceError, SurfaceResult};

use super::SurfaceRenderer;

#[derive(Serialize)]
struct SurfaceDocument<'a> {
    title: &'a str,
    labels: &'a AxisLabels,
    method: String,
    grid: &'a Grid,
}

/// Writes the grid as a single JSON document
pub struct JsonRenderer<W: Write> {
    out: W,
    pretty: bool,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, pretty: true }
    }

    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SurfaceRenderer for JsonRenderer<W> {
    fn render_surface(&mut self, grid: &Grid, labels: &AxisLabels, title: &str) -> SurfaceResult<()> {
        let doc = SurfaceDocument {
            title,
            labels,
            method: grid.method.label().to_string(),
            grid,
        };

        let written = if self.pretty {
            serde_json::to_writer_pretty(&mut self.out, &doc)
        } else {
            serde_json::to_writer(&mut self.out, &doc)
        };
        written.map_err(|e| SurfaceError::Serialization(e.to_string()))?;

        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InterpolationMethod;

    #[test]
    fn test_json_document() {
        let grid = Grid::from_fn(
            vec![1.0, 2.0],
            vec![90.0, 110.0],
            InterpolationMethod::Cubic,
            |t, k| if k > 100.0 && t > 1.5 { None } else { Some(0.3) },
        );

        let mut renderer = JsonRenderer::new(Vec::new()).compact();
        renderer
            .render_surface(&grid, &AxisLabels::default(), "Implied Volatility Surface")
            .unwrap();
        let bytes = renderer.into_inner();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["title"], "Implied Volatility Surface");
        assert_eq!(value["labels"]["x"], "Time to Expiration (Weeks)");
        assert_eq!(value["method"], InterpolationMethod::Cubic.label());
        assert_eq!(value["grid"]["times"][1], 2.0);

        let round: Grid = serde_json::from_value(value["grid"].clone()).unwrap();
        assert_eq!(round.value(1, 1), None);
        assert_eq!(round.value(0, 1), Some(0.3));
    }
}
