//! Market data
//!
//! Handles:
//! - The gateway trait the pipeline reads through
//! - Yahoo Finance spot prices and option chains
//! - An in-memory gateway for offline runs

pub mod gateway;
pub mod yahoo;

pub use gateway::*;
pub use yahoo::*;
