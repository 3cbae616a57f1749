//! # IV Surface - Implied Volatility Surface Builder
//!
//! Builds an implied volatility surface for one underlying from listed option
//! asks.
//!
//! ## Overview
//!
//! A run flows strictly forward:
//!
//! 1. **Fetch**: spot price, listed expirations and one chain per expiration
//!    (Yahoo Finance, or an in-memory gateway)
//! 2. **Filter**: strikes inside a band around spot, expiries 7 to 730 days out
//! 3. **Price**: Black-Scholes inversion of every ask, in parallel
//! 4. **Interpolate**: scattered (weeks, strike, vol) samples onto a regular
//!    grid, cubic first, then linear, then nearest
//! 5. **Render**: table, JSON, or the interactive 3D view
//!
//! ## Usage
//!
//! ```rust,no_run
//! use iv_surface::prelude::*;
//!
//! let params = SurfaceParams::for_ticker("NFLX");
//! let mut pipeline = SurfacePipeline::new(YahooClient::new().unwrap());
//! let mut table = TableRenderer::new(std::io::stdout());
//!
//! match pipeline.run(&params, &mut table) {
//!     Ok(run) => println!("{} interpolation", run.grid.method),
//!     Err(failure) => eprintln!("halted while {}: {}", failure.stage, failure.message()),
//! }
//! ```
//!
//! ## Limitations
//!
//! - European Black-Scholes with no dividend yield
//! - Asks only; bids and mids are ignored
//! - No caching, retries or timeouts beyond the HTTP client defaults

pub mod core;
pub mod data;
pub mod interpolation;
pub mod models;
pub mod pipeline;
pub mod render;

/// Prelude with commonly used types
pub mod prelude {
    // Core types
    pub use crate::core::{
        AxisLabels, Contract, Grid, InterpolationMethod, OptionQuote, OptionType,
        PricedContract, QuoteChain, SurfaceError, SurfacePoint, SurfaceResult,
    };

    // Market data
    pub use crate::data::{MarketDataGateway, StaticGateway, YahooClient};

    // Models
    pub use crate::models::{implied_volatility, norm_cdf, norm_pdf, price as bs_price};

    // Interpolation
    pub use crate::interpolation::{placeholder_grid, SurfaceBuild, SurfaceInterpolator};

    // Pipeline
    pub use crate::pipeline::{
        ContractFilter, ExpirationWindow, PipelineFailure, PipelineStage, StrikeBand,
        SurfaceParams, SurfacePipeline, SurfaceRun,
    };

    // Rendering
    pub use crate::render::{
        CapturedSurface, JsonRenderer, SurfaceRenderer, TableRenderer, SURFACE_TITLE,
    };
}

// Re-export main types at crate root
pub use crate::core::{SurfaceError, SurfaceResult};
pub use crate::pipeline::{SurfaceParams, SurfacePipeline};
