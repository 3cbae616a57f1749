//! Plain-text surface table
//!
//! Prints a down-sampled view of the grid, strikes down and maturities
//! across, vols in percent.

use std::io::Write;

use crate::core::{AxisLabels, Grid, SurfaceResult};

use super::SurfaceRenderer;

/// ASCII table renderer
pub struct TableRenderer<W: Write> {
    out: W,
    max_rows: usize,
    max_cols: usize,
}

impl<W: Write> TableRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            max_rows: 15,
            max_cols: 8,
        }
    }

    /// Cap on printed strike rows and maturity columns
    pub fn with_limits(mut self, max_rows: usize, max_cols: usize) -> Self {
        self.max_rows = max_rows.max(1);
        self.max_cols = max_cols.max(1);
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Evenly spread indices into `0..len`, first and last always included
fn sample_indices(len: usize, max: usize) -> Vec<usize> {
    if len <= max {
        return (0..len).collect();
    }
    if max == 1 {
        return vec![0];
    }

    let mut idx: Vec<usize> = (0..max)
        .map(|i| ((i * (len - 1)) as f64 / (max - 1) as f64).round() as usize)
        .collect();
    idx.dedup();
    idx
}

impl<W: Write> SurfaceRenderer for TableRenderer<W> {
    fn render_surface(&mut self, grid: &Grid, labels: &AxisLabels, title: &str) -> SurfaceResult<()> {
        let (n_strikes, n_times) = grid.dim();
        let rows = sample_indices(n_strikes, self.max_rows);
        let cols = sample_indices(n_times, self.max_cols);

        writeln!(self.out, "{}", title)?;
        writeln!(self.out, "{}", "=".repeat(title.len()))?;
        writeln!(
            self.out,
            "{} (%) by {} (rows) and {} (columns), {} interpolation",
            labels.z, labels.y, labels.x, grid.method
        )?;
        writeln!(self.out)?;

        write!(self.out, "{:>10} |", "K \\ T")?;
        for &ti in &cols {
            write!(self.out, " {:>7.1}", grid.times[ti])?;
        }
        writeln!(self.out)?;
        writeln!(self.out, "{}-+{}", "-".repeat(10), "-".repeat(8 * cols.len()))?;

        for &si in rows.iter().rev() {
            write!(self.out, "{:>10.2} |", grid.strikes[si])?;
            for &ti in &cols {
                match grid.value(si, ti) {
                    Some(v) => write!(self.out, " {:>7.2}", v * 100.0)?,
                    None => write!(self.out, " {:>7}", "-")?,
                }
            }
            writeln!(self.out)?;
        }

        writeln!(self.out)?;
        writeln!(
            self.out,
            "{} of {} nodes defined",
            grid.defined_count(),
            grid.vols.len()
        )?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{linspace, InterpolationMethod};

    #[test]
    fn test_sample_indices() {
        assert_eq!(sample_indices(4, 10), vec![0, 1, 2, 3]);
        assert_eq!(sample_indices(50, 5), vec![0, 12, 25, 37, 49]);
        assert_eq!(sample_indices(50, 1), vec![0]);
    }

    #[test]
    fn test_table_output() {
        let grid = Grid::from_fn(
            linspace(1.0, 52.0, 10),
            linspace(80.0, 120.0, 10),
            InterpolationMethod::Linear,
            |t, _| if t > 50.0 { None } else { Some(0.25) },
        );

        let mut renderer = TableRenderer::new(Vec::new()).with_limits(3, 4);
        renderer
            .render_surface(&grid, &AxisLabels::default(), "Implied Volatility Surface")
            .unwrap();
        let text = String::from_utf8(renderer.into_inner()).unwrap();

        assert!(text.starts_with("Implied Volatility Surface\n"));
        assert!(text.contains("linear interpolation"));
        assert!(text.contains("25.00"));
        assert!(text.contains("-"));
        assert!(text.contains("90 of 100 nodes defined"));
        // Highest strike printed first
        let first_row = text.lines().find(|l| l.contains("120.00")).unwrap();
        let last_row = text.lines().find(|l| l.contains(" 80.00")).unwrap();
        assert!(text.find(first_row).unwrap() < text.find(last_row).unwrap());
    }
}
