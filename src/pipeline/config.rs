//! Configuration for a surface run

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{SurfaceError, SurfaceResult};

/// Permitted range for the minimum strike fraction
pub const MIN_FRACTION_RANGE: (f64, f64) = (0.5, 1.9);

/// Permitted range for the maximum strike fraction
pub const MAX_FRACTION_RANGE: (f64, f64) = (0.6, 2.0);

/// Permitted strike bounds relative to spot, re-checked once spot is known
pub const SPOT_FRACTION_RANGE: (f64, f64) = (0.5, 2.0);

/// Parameters for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceParams {
    /// Underlying ticker symbol
    pub ticker: String,
    /// Continuously compounded risk-free rate
    pub risk_free_rate: f64,
    /// Strike band as fractions of spot
    pub strike_band: StrikeBand,
    /// Expiration window in days from the evaluation date
    pub expiration_window: ExpirationWindow,
    /// Grid nodes per axis
    pub resolution: usize,
}

impl Default for SurfaceParams {
    fn default() -> Self {
        Self {
            ticker: "NFLX".to_string(),
            risk_free_rate: 0.05,
            strike_band: StrikeBand::default(),
            expiration_window: ExpirationWindow::default(),
            resolution: 50,
        }
    }
}

impl SurfaceParams {
    /// Defaults for a given ticker
    pub fn for_ticker(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            ..Default::default()
        }
    }

    /// Load from a TOML file; missing keys keep their defaults
    pub fn from_toml_file(path: impl AsRef<Path>) -> SurfaceResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> SurfaceResult<Self> {
        toml::from_str(text).map_err(|e| SurfaceError::Serialization(e.to_string()))
    }

    /// Trimmed, upper-cased ticker
    pub fn normalized_ticker(&self) -> SurfaceResult<String> {
        let ticker = self.ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(SurfaceError::invalid_input("Enter a ticker symbol."));
        }
        Ok(ticker)
    }

    /// Checks that need no market data
    pub fn validate(&self) -> SurfaceResult<()> {
        self.normalized_ticker()?;

        if !self.risk_free_rate.is_finite() || self.risk_free_rate < 0.0 {
            return Err(SurfaceError::config(
                "Risk-free rate must be a non-negative number.",
            ));
        }

        self.strike_band.validate()?;
        self.expiration_window.validate()?;

        if self.resolution < 2 {
            return Err(SurfaceError::config(
                "Grid resolution must be at least 2 nodes per axis.",
            ));
        }

        Ok(())
    }
}

/// Strike band expressed as fractions of spot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrikeBand {
    pub min_fraction: f64,
    pub max_fraction: f64,
}

impl Default for StrikeBand {
    fn default() -> Self {
        Self {
            min_fraction: 0.8,
            max_fraction: 1.2,
        }
    }
}

impl StrikeBand {
    pub fn new(min_fraction: f64, max_fraction: f64) -> Self {
        Self {
            min_fraction,
            max_fraction,
        }
    }

    /// Input-range checks on the fractions themselves
    pub fn validate(&self) -> SurfaceResult<()> {
        let (lo, hi) = MIN_FRACTION_RANGE;
        if !(lo..=hi).contains(&self.min_fraction) {
            return Err(SurfaceError::config(format!(
                "Minimum strike must be between {:.0}% and {:.0}% of the spot price.",
                lo * 100.0,
                hi * 100.0
            )));
        }

        let (lo, hi) = MAX_FRACTION_RANGE;
        if !(lo..=hi).contains(&self.max_fraction) {
            return Err(SurfaceError::config(format!(
                "Maximum strike must be between {:.0}% and {:.0}% of the spot price.",
                lo * 100.0,
                hi * 100.0
            )));
        }

        if self.min_fraction >= self.max_fraction {
            return Err(SurfaceError::config(
                "Minimum strike must be below the maximum strike.",
            ));
        }

        Ok(())
    }

    /// Absolute (lower, upper) strike bounds for a spot price
    pub fn bounds(&self, spot: f64) -> (f64, f64) {
        (self.min_fraction * spot, self.max_fraction * spot)
    }

    /// Spot-relative re-check of the absolute bounds
    pub fn check_against_spot(&self, spot: f64) -> SurfaceResult<(f64, f64)> {
        let (lower, upper) = self.bounds(spot);
        let (lo, hi) = SPOT_FRACTION_RANGE;

        if lower < lo * spot || upper > hi * spot {
            return Err(SurfaceError::config(
                "Strike price must be between 50% and 200% of the spot price.",
            ));
        }

        Ok((lower, upper))
    }
}

/// Inclusive expiration window in days from the evaluation date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirationWindow {
    pub min_days: i64,
    pub max_days: i64,
}

impl Default for ExpirationWindow {
    fn default() -> Self {
        Self {
            min_days: 7,
            max_days: 730,
        }
    }
}

impl ExpirationWindow {
    pub fn validate(&self) -> SurfaceResult<()> {
        if self.min_days < 0 || self.min_days > self.max_days {
            return Err(SurfaceError::config(format!(
                "Invalid expiration window: {} to {} days.",
                self.min_days, self.max_days
            )));
        }
        Ok(())
    }

    pub fn contains_days(&self, days: i64) -> bool {
        (self.min_days..=self.max_days).contains(&days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let params = SurfaceParams::default();
        assert_eq!(params.ticker, "NFLX");
        assert_eq!(params.risk_free_rate, 0.05);
        assert_eq!(params.strike_band, StrikeBand::new(0.8, 1.2));
        assert_eq!(params.expiration_window, ExpirationWindow { min_days: 7, max_days: 730 });
        assert_eq!(params.resolution, 50);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_ticker_normalization() {
        let params = SurfaceParams::for_ticker("  aapl ");
        assert_eq!(params.normalized_ticker().unwrap(), "AAPL");

        let blank = SurfaceParams::for_ticker("   ");
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_rate_must_be_non_negative() {
        let params = SurfaceParams {
            risk_free_rate: -0.01,
            ..Default::default()
        };
        assert!(matches!(params.validate(), Err(SurfaceError::Config(_))));
    }

    #[test]
    fn test_strike_band_ranges() {
        // Edges of both input ranges are accepted
        assert!(StrikeBand::new(0.5, 2.0).validate().is_ok());
        assert!(StrikeBand::new(1.9, 2.0).validate().is_ok());
        assert!(StrikeBand::new(0.5, 0.6).validate().is_ok());

        assert!(StrikeBand::new(0.49, 1.2).validate().is_err());
        assert!(StrikeBand::new(1.95, 2.0).validate().is_err());
        assert!(StrikeBand::new(0.8, 2.01).validate().is_err());
        assert!(StrikeBand::new(0.5, 0.55).validate().is_err());
    }

    #[test]
    fn test_strike_band_inverted() {
        let err = StrikeBand::new(1.5, 1.2).validate().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("below the maximum"));

        assert!(StrikeBand::new(1.2, 1.2).validate().is_err());
    }

    #[test]
    fn test_spot_recheck() {
        let (lower, upper) = StrikeBand::new(0.8, 1.2).check_against_spot(100.0).unwrap();
        assert!((lower - 80.0).abs() < 1e-12);
        assert!((upper - 120.0).abs() < 1e-12);

        // Fractions that slipped past the input checks still fail here
        let err = StrikeBand::new(0.4, 1.2).check_against_spot(100.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Strike price must be between 50% and 200% of the spot price."
        );
    }

    #[test]
    fn test_expiration_window() {
        let window = ExpirationWindow::default();
        assert!(window.contains_days(7));
        assert!(window.contains_days(730));
        assert!(!window.contains_days(6));
        assert!(!window.contains_days(731));

        assert!(ExpirationWindow { min_days: 30, max_days: 10 }.validate().is_err());
    }

    #[test]
    fn test_toml_partial_override() {
        let params = SurfaceParams::from_toml_str(
            r#"
            ticker = "SPY"
            risk_free_rate = 0.04

            [strike_band]
            min_fraction = 0.9
            max_fraction = 1.1
            "#,
        )
        .unwrap();

        assert_eq!(params.ticker, "SPY");
        assert_eq!(params.risk_free_rate, 0.04);
        assert_eq!(params.strike_band, StrikeBand::new(0.9, 1.1));
        assert_eq!(params.resolution, 50);
    }

    #[test]
    fn test_toml_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("surface.toml");
        std::fs::write(&path, "ticker = \"qqq\"\nresolution = 30\n").unwrap();

        let params = SurfaceParams::from_toml_file(&path).unwrap();
        assert_eq!(params.normalized_ticker().unwrap(), "QQQ");
        assert_eq!(params.resolution, 30);

        assert!(SurfaceParams::from_toml_file(dir.path().join("missing.toml")).is_err());
        assert!(SurfaceParams::from_toml_str("resolution = \"many\"").is_err());
    }
}
