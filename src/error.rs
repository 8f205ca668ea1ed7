//! Request-scoped error taxonomy for the prediction pipeline

use thiserror::Error;

/// Error raised by a pipeline stage while serving a single request.
///
/// Client-facing variants map to HTTP 400; `Internal` maps to HTTP 500.
/// Startup failures are not represented here, they surface as
/// `anyhow::Error` from the artifact loader and abort the process.
#[derive(Debug, Error)]
pub enum PredictError {
    /// A feature required by the model is absent from the request
    #[error("Missing field: {0}")]
    MissingField(String),

    /// A categorical value outside the trained vocabulary
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    /// The request body could not be parsed as JSON
    #[error("Invalid JSON body: {0}")]
    MalformedBody(String),

    /// Any other failure during encoding, scaling, inference or formatting
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl PredictError {
    /// Whether the client caused the failure
    pub fn is_client_error(&self) -> bool {
        !matches!(self, PredictError::Internal(_))
    }

    /// Short label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            PredictError::MissingField(_) => "missing_field",
            PredictError::InvalidValue(_) => "invalid_value",
            PredictError::MalformedBody(_) => "malformed_body",
            PredictError::Internal(_) => "internal",
        }
    }
}
