//! Pricing Models
//!
//! Implements:
//! - Black-Scholes (European pricing, implied volatility inversion)

pub mod black_scholes;

pub use black_scholes::*;
