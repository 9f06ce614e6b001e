use thiserror::Error;

/// Everything a single fetch-and-parse round trip can fail with.
///
/// `fetch()` is the only error boundary: callers get either a fully formed
/// snapshot or one of these, never a partially populated record.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection-level failure or a non-2xx response from the endpoint.
    #[error("tracker request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body missing a required tag, or a timestamp present but
    /// not matching the fixed `%Y-%m-%dT%H:%M:%S` format.
    #[error("malformed tracker response: {detail}")]
    MalformedResponse { detail: String },
}

impl FetchError {
    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedResponse { detail: detail.into() }
    }
}
