use thiserror::Error;

/// Why a single scan attempt did not produce a presence mark.
///
/// Every variant is terminal to the attempt only; the scanner stays armed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("invalid QR payload: no matricule field found")]
    InvalidPayload,
    #[error("matricule is empty")]
    EmptyIdentity,
    #[error("network error: {0}")]
    NetworkFailure(String),
    #[error("{0}")]
    ApplicationError(String),
}

/// Failures talking to the attendance service.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}
