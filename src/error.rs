//! Error types for the living map engine

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while analysing or laying out a map
#[derive(Error, Debug)]
pub enum MapError {
    /// Two nodes in one snapshot share an id
    #[error("Duplicate node id: {0}")]
    DuplicateNodeId(String),

    /// A layout option is out of range
    #[error("Invalid layout option: {0}")]
    InvalidLayoutOption(String),

    /// A layout produced NaN or infinite coordinates
    #[error("Layout produced a non-finite position for node {0}")]
    NonFinitePosition(String),

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The background execution context is not running
    #[error("Background worker unavailable: {0}")]
    WorkerUnavailable(String),

    /// The background execution context answered with an error
    #[error("Background request {request_id} failed: {message}")]
    WorkerFailed { request_id: Uuid, message: String },

    /// A newer request for the same graph superseded this one
    #[error("Response for request {0} is stale")]
    StaleResponse(Uuid),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type MapResult<T> = Result<T, MapError>;
