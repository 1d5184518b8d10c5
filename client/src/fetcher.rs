use bytes::Bytes;
use futures::stream::{self, StreamExt};
use sdtd_shared::{Claim, RESET_REGION, refine_claims};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ClaimsError, body_preview};
use crate::source::{ClaimSource, Endpoint};

/// What a single fetch produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClaimFetch {
    /// Reset regions, exactly as the backend sent them.
    ResetRegions(Vec<serde_json::Value>),
    Claims(Vec<Claim>),
}

impl ClaimFetch {
    pub fn len(&self) -> usize {
        match self {
            Self::ResetRegions(regions) => regions.len(),
            Self::Claims(claims) => claims.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_claims(self) -> Option<Vec<Claim>> {
        match self {
            Self::Claims(claims) => Some(claims),
            Self::ResetRegions(_) => None,
        }
    }
}

/// Fetches claims of one type, correcting the backend's substring matching.
///
/// Every call issues exactly one request. Nothing is cached.
#[derive(Debug, Clone)]
pub struct ClaimFetcher<S> {
    source: S,
}

impl<S: ClaimSource + Sync> ClaimFetcher<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn fetch_claims(&self, requested: &str) -> Result<ClaimFetch, ClaimsError> {
        if requested == RESET_REGION {
            return self.fetch_reset_regions().await.map(ClaimFetch::ResetRegions);
        }
        self.fetch_typed(requested).await.map(ClaimFetch::Claims)
    }

    pub async fn fetch_reset_regions(&self) -> Result<Vec<serde_json::Value>, ClaimsError> {
        let endpoint = Endpoint::ResetRegions;
        let body = self.source.get(endpoint).await?;
        let regions = decode_records(endpoint, body)?;
        info!(received = regions.len(), "fetched reset regions");
        Ok(regions)
    }

    /// Claims whose `Type` starts with `requested`, in backend order.
    pub async fn fetch_typed(&self, requested: &str) -> Result<Vec<Claim>, ClaimsError> {
        let endpoint = Endpoint::AdvClaims { requested };
        let body = self.source.get(endpoint).await?;
        let records = decode_records(endpoint, body)?;
        let received = records.len();

        let claims = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                serde_json::from_value::<Claim>(record).map_err(|e| {
                    ClaimsError::MalformedRecord {
                        index,
                        reason: e.to_string(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let refined = refine_claims(claims, requested);
        info!(
            requested,
            received,
            kept = refined.len(),
            "fetched claims"
        );
        Ok(refined)
    }

    /// Fetches several types with at most `concurrency` requests in flight.
    ///
    /// Results come back in request order; one type failing does not stop the
    /// others.
    pub async fn fetch_all<I, T>(
        &self,
        requested: I,
        concurrency: usize,
    ) -> Vec<(String, Result<ClaimFetch, ClaimsError>)>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let requested: Vec<String> = requested
            .into_iter()
            .map(|kind| kind.as_ref().to_string())
            .collect();

        stream::iter(requested)
            .map(|kind| async move {
                let result = self.fetch_claims(&kind).await;
                (kind, result)
            })
            .buffered(concurrency.max(1))
            .collect()
            .await
    }
}

fn decode_records(
    endpoint: Endpoint<'_>,
    body: Option<Bytes>,
) -> Result<Vec<serde_json::Value>, ClaimsError> {
    let Some(body) = body else {
        debug!(%endpoint, "no response body; treating as empty");
        return Ok(Vec::new());
    };

    let payload: serde_json::Value =
        serde_json::from_slice(&body).map_err(|e| ClaimsError::Decode {
            endpoint: endpoint.to_string(),
            reason: format!("{e}; body preview: {}", body_preview(&body)),
        })?;

    match payload {
        serde_json::Value::Array(records) => Ok(records),
        serde_json::Value::Null => {
            debug!(%endpoint, "null payload; treating as empty");
            Ok(Vec::new())
        }
        other => Err(ClaimsError::Decode {
            endpoint: endpoint.to_string(),
            reason: format!("expected a JSON array, got {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
