use reqwest::StatusCode;
use thiserror::Error;

/// Failures surfaced to callers of the claim fetcher.
///
/// An absent response is not listed here: the fetcher absorbs it and returns
/// an empty list instead.
#[derive(Debug, Error)]
pub enum ClaimsError {
    /// The request never produced a readable response.
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned {status}; body preview: {preview}")]
    Status {
        endpoint: String,
        status: StatusCode,
        preview: String,
    },

    /// Body was not JSON, or not a JSON array.
    #[error("failed to decode {endpoint} payload: {reason}")]
    Decode { endpoint: String, reason: String },

    /// A claim record without a string `Type` field.
    #[error("claim record {index} is malformed: {reason}")]
    MalformedRecord { index: usize, reason: String },
}

const PREVIEW_CHARS: usize = 200;

pub(crate) fn body_preview(body: &[u8]) -> String {
    String::from_utf8_lossy(body)
        .chars()
        .take(PREVIEW_CHARS)
        .collect()
}
