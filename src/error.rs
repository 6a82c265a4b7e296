use thiserror::Error;

/// A `listing_created` payload that could not be decoded. The message is
/// skipped.
#[derive(Debug, Error)]
#[error("malformed listing event: {0}")]
pub struct ParseError(#[from] pub serde_json::Error);

/// An outbound call to an analysis service or the catalog failed. Callers
/// log it and fall back; it never stops the consumer loop.
#[derive(Debug, Error)]
pub enum DependencyError {
    #[error("{service} timed out")]
    Timeout { service: &'static str },
    #[error("{service} request failed: {message}")]
    Request {
        service: &'static str,
        message: String,
    },
    #[error("{service} answered HTTP {status}")]
    Status { service: &'static str, status: u16 },
    #[error("{service} returned an invalid body: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
}

impl DependencyError {
    pub fn from_reqwest(service: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout { service }
        } else if err.is_decode() {
            Self::Decode {
                service,
                message: err.to_string(),
            }
        } else {
            Self::Request {
                service,
                message: err.to_string(),
            }
        }
    }

    pub fn service(&self) -> &'static str {
        match self {
            Self::Timeout { service }
            | Self::Request { service, .. }
            | Self::Status { service, .. }
            | Self::Decode { service, .. } => service,
        }
    }
}

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("broker connection failed: {0}")]
    Connection(String),
    #[error("broker command failed: {0}")]
    Command(String),
}

impl From<redis::RedisError> for BrokerError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_dropped() || err.is_connection_refusal() || err.is_io_error() {
            Self::Connection(err.to_string())
        } else {
            Self::Command(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("catalog backend unavailable: {0}")]
    Backend(String),
    #[error("stored record for `{product_id}` is corrupt: {detail}")]
    Corrupt { product_id: String, detail: String },
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        Self::Backend(err.to_string())
    }
}
