//! IV Surface CLI
//!
//! Builds the implied volatility surface for one ticker from live Yahoo
//! Finance quotes and prints it as a table.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use iv_surface::prelude::*;

/// Implied volatility surface builder
#[derive(Parser)]
#[command(name = "iv-surface")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Ticker symbol
    #[arg(short, long)]
    ticker: Option<String>,

    /// Risk-free rate (e.g. 0.05 for 5%)
    #[arg(short, long)]
    rate: Option<f64>,

    /// Minimum strike as a fraction of spot
    #[arg(long)]
    min_strike: Option<f64>,

    /// Maximum strike as a fraction of spot
    #[arg(long)]
    max_strike: Option<f64>,

    /// Grid nodes per axis
    #[arg(long)]
    resolution: Option<usize>,

    /// TOML file with run parameters; flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Yahoo Finance host, for mirrors or proxies
    #[arg(long)]
    base_url: Option<String>,

    /// Also write the grid as JSON to this path
    #[arg(long)]
    json: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn params(&self) -> anyhow::Result<SurfaceParams> {
        let mut params = match &self.config {
            Some(path) => SurfaceParams::from_toml_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => SurfaceParams::default(),
        };

        if let Some(ticker) = &self.ticker {
            params.ticker = ticker.clone();
        }
        if let Some(rate) = self.rate {
            params.risk_free_rate = rate;
        }
        if let Some(min) = self.min_strike {
            params.strike_band.min_fraction = min;
        }
        if let Some(max) = self.max_strike {
            params.strike_band.max_fraction = max;
        }
        if let Some(resolution) = self.resolution {
            params.resolution = resolution;
        }

        Ok(params)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let params = cli.params()?;

    let mut renderers: Vec<Box<dyn SurfaceRenderer>> =
        vec![Box::new(TableRenderer::new(std::io::stdout()))];
    if let Some(path) = &cli.json {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        renderers.push(Box::new(JsonRenderer::new(BufWriter::new(file))));
    }

    let mut client = YahooClient::new()?;
    if let Some(url) = &cli.base_url {
        client = client.with_base_url(url.as_str());
    }
    let mut pipeline = SurfacePipeline::new(client);

    match pipeline.run(&params, &mut renderers) {
        Ok(run) => {
            println!();
            println!(
                "{}: spot ${:.2}, {} of {} contracts priced",
                run.ticker,
                run.spot,
                run.defined_count(),
                run.contracts.len()
            );
            if let Some(notice) = &run.notice {
                println!("{}", notice);
            }
            if let Some(path) = &cli.json {
                println!("Surface written to {}", path.display());
            }
            Ok(())
        }
        Err(failure) => {
            eprintln!("Error ({}): {}", failure.stage, failure.message());
            std::process::exit(1);
        }
    }
}
