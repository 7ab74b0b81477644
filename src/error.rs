//! Error taxonomy for the safety pipeline.
//!
//! None of these errors ever reach a consumer of the monitor. Each one is
//! recovered where it occurs by falling back to the next data source or to a
//! documented default value. They exist so the recovery sites can log what
//! went wrong and so the individual sources can be tested in isolation.

use thiserror::Error;

/// Errors raised inside the safety pipeline.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SafetyError {
    /// No position could be obtained (permission denied, timeout, no fix).
    #[error("location unavailable: {0}")]
    LocationUnavailable(String),

    /// A position was obtained but its coordinates are not usable.
    #[error("invalid location: latitude {latitude}, longitude {longitude}")]
    LocationInvalid { latitude: f64, longitude: f64 },

    /// A remote query failed (network error, timeout, non-success status).
    #[error("remote source unavailable: {0}")]
    RemoteUnavailable(String),

    /// A remote vessel record carried out-of-range or missing fields.
    #[error("malformed vessel data: {0}")]
    MalformedVesselData(String),
}

impl From<reqwest::Error> for SafetyError {
    fn from(err: reqwest::Error) -> Self {
        SafetyError::RemoteUnavailable(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for SafetyError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        SafetyError::RemoteUnavailable("request timed out".to_string())
    }
}
