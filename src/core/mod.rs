//! Core data types for the volatility surface pipeline
//!
//! Defines fundamental types:
//! - OptionQuote / QuoteChain: raw market quotes per expiry
//! - Contract / PricedContract: filtered contracts and their implied vols
//! - SurfacePoint / Grid: scattered samples and the interpolated surface

pub mod option;
pub mod quote;
pub mod surface;
pub mod error;

pub use option::*;
pub use quote::*;
pub use surface::*;
pub use error::*;
