//! Error types for the volatility surface pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SurfaceError {
    #[error("{0}")]
    NotFound(String),

    #[error("Data unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    NoData(String),

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type SurfaceResult<T> = Result<T, SurfaceError>;

impl SurfaceError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn no_data(msg: impl Into<String>) -> Self {
        Self::NoData(msg.into())
    }

    pub fn numerical(msg: impl Into<String>) -> Self {
        Self::Numerical(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Configuration problems halt a run before any pricing happens
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_) | Self::InvalidInput(_))
    }
}
