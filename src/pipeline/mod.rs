//! Surface pipeline
//!
//! One run walks a fixed sequence of stages:
//!
//! ```text
//! AwaitingInput -> Fetching -> Filtering -> Pricing -> Interpolating -> Rendered
//! ```
//!
//! Any stage may halt the run. The failure carries the stage it halted at and
//! a message fit to show the user. Nothing is retried and nothing is kept
//! between runs.

mod config;
mod extractor;
mod filter;

pub use config::*;
pub use extractor::*;
pub use filter::*;

use chrono::NaiveDate;
use thiserror::Error;

use crate::core::{AxisLabels, Contract, Grid, PricedContract, QuoteChain, SurfaceError, SurfaceResult};
use crate::data::MarketDataGateway;
use crate::interpolation::SurfaceInterpolator;
use crate::render::{SurfaceRenderer, SURFACE_TITLE};

/// Message when no expiration falls inside the window
pub const NO_EXPIRATIONS_MESSAGE: &str = "No available options expiring after a week.";

/// Message when filtering leaves nothing to price
pub const NO_CONTRACTS_MESSAGE: &str = "No valid options data available for plotting.";

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    AwaitingInput,
    Fetching,
    Filtering,
    Pricing,
    Interpolating,
    Rendered,
    Error,
}

impl PipelineStage {
    pub fn label(&self) -> &'static str {
        match self {
            PipelineStage::AwaitingInput => "awaiting input",
            PipelineStage::Fetching => "fetching",
            PipelineStage::Filtering => "filtering",
            PipelineStage::Pricing => "pricing",
            PipelineStage::Interpolating => "interpolating",
            PipelineStage::Rendered => "rendered",
            PipelineStage::Error => "error",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A halted run
#[derive(Error, Debug)]
#[error("{error}")]
pub struct PipelineFailure {
    /// Stage the run halted at
    pub stage: PipelineStage,
    #[source]
    pub error: SurfaceError,
}

impl PipelineFailure {
    pub fn new(stage: PipelineStage, error: SurfaceError) -> Self {
        Self { stage, error }
    }

    /// User-facing message
    pub fn message(&self) -> String {
        self.error.to_string()
    }
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct SurfaceRun {
    pub ticker: String,
    pub spot: f64,
    pub evaluation_date: NaiveDate,
    /// One entry per filtered contract, in filter order
    pub contracts: Vec<PricedContract>,
    pub grid: Grid,
    /// Set when the placeholder surface stands in for real data
    pub notice: Option<String>,
}

impl SurfaceRun {
    pub fn defined_count(&self) -> usize {
        self.contracts.iter().filter(|c| c.is_defined()).count()
    }
}

/// Spot price, absolute strike bounds and the chains that could be read
#[derive(Debug, Clone)]
struct MarketSnapshot {
    spot: f64,
    bounds: (f64, f64),
    chains: Vec<QuoteChain>,
}

/// Drives runs against one market data gateway
pub struct SurfacePipeline<G: MarketDataGateway> {
    gateway: G,
    evaluation_date: Option<NaiveDate>,
    labels: AxisLabels,
    title: String,
    stage: PipelineStage,
}

impl<G: MarketDataGateway> SurfacePipeline<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            evaluation_date: None,
            labels: AxisLabels::default(),
            title: SURFACE_TITLE.to_string(),
            stage: PipelineStage::AwaitingInput,
        }
    }

    /// Fix the evaluation date instead of using today's local date
    pub fn with_evaluation_date(mut self, date: NaiveDate) -> Self {
        self.evaluation_date = Some(date);
        self
    }

    /// Stage reached by the latest run
    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Run every stage and hand the grid to `renderer`
    pub fn run<R>(
        &mut self,
        params: &SurfaceParams,
        renderer: &mut R,
    ) -> Result<SurfaceRun, PipelineFailure>
    where
        R: SurfaceRenderer + ?Sized,
    {
        self.enter(PipelineStage::AwaitingInput);
        let evaluation_date = self
            .evaluation_date
            .unwrap_or_else(|| chrono::Local::now().date_naive());

        let ticker = self.attempt(params.validate().and_then(|_| params.normalized_ticker()))?;

        self.enter(PipelineStage::Fetching);
        let market = self.attempt(self.fetch(&ticker, params, evaluation_date))?;

        self.enter(PipelineStage::Filtering);
        let contracts = self.attempt(Self::filter(&market, params, evaluation_date))?;

        self.enter(PipelineStage::Pricing);
        let priced = price_contracts(contracts, market.spot, params.risk_free_rate);
        let points = surface_points(&priced);
        tracing::info!(
            "Priced {} contracts, {} with a defined implied volatility",
            priced.len(),
            points.len()
        );

        self.enter(PipelineStage::Interpolating);
        let build = self.attempt(SurfaceInterpolator::new(params.resolution).build(&points, market.spot))?;
        if let Some(notice) = &build.notice {
            tracing::warn!("{}", notice);
        }

        self.enter(PipelineStage::Rendered);
        self.attempt(renderer.render_surface(&build.grid, &self.labels, &self.title))?;

        Ok(SurfaceRun {
            ticker,
            spot: market.spot,
            evaluation_date,
            contracts: priced,
            grid: build.grid,
            notice: build.notice,
        })
    }

    fn enter(&mut self, stage: PipelineStage) {
        tracing::info!("Pipeline: {} -> {}", self.stage, stage);
        self.stage = stage;
    }

    /// Halt at the current stage on error
    fn attempt<T>(&mut self, result: SurfaceResult<T>) -> Result<T, PipelineFailure> {
        result.map_err(|error| {
            let halted = self.stage;
            tracing::error!("Pipeline halted while {}: {}", halted, error);
            self.stage = PipelineStage::Error;
            PipelineFailure::new(halted, error)
        })
    }

    fn fetch(
        &self,
        ticker: &str,
        params: &SurfaceParams,
        evaluation_date: NaiveDate,
    ) -> SurfaceResult<MarketSnapshot> {
        let spot = self.gateway.spot_price(ticker)?;
        tracing::info!("{} spot {:.2} on {}", ticker, spot, evaluation_date);

        // Band is settled before any chain is requested
        let bounds = params.strike_band.check_against_spot(spot)?;

        let listed = self.gateway.expirations(ticker).unwrap_or_else(|e| {
            tracing::warn!("No expirations for {}: {}", ticker, e);
            Vec::new()
        });

        let selected = select_expirations(&listed, evaluation_date, &params.expiration_window);
        if selected.is_empty() {
            return Err(SurfaceError::config(NO_EXPIRATIONS_MESSAGE));
        }
        tracing::debug!("{} of {} expirations inside the window", selected.len(), listed.len());

        let chains = selected
            .into_iter()
            .filter_map(|expiry| match self.gateway.option_chain(ticker, expiry) {
                Ok(chain) => Some(chain),
                Err(e) => {
                    tracing::warn!("Skipping {} chain expiring {}: {}", ticker, expiry, e);
                    None
                }
            })
            .collect();

        Ok(MarketSnapshot {
            spot,
            bounds,
            chains,
        })
    }

    fn filter(
        market: &MarketSnapshot,
        params: &SurfaceParams,
        evaluation_date: NaiveDate,
    ) -> SurfaceResult<Vec<Contract>> {
        let bounds = market.bounds;
        let filter = ContractFilter::new(bounds, params.expiration_window, evaluation_date);

        let contracts = filter.filter(&market.chains);
        if contracts.is_empty() {
            return Err(SurfaceError::no_data(NO_CONTRACTS_MESSAGE));
        }

        tracing::info!(
            "{} contracts with strikes in [{:.2}, {:.2}]",
            contracts.len(),
            bounds.0,
            bounds.1
        );
        Ok(contracts)
    }
}
