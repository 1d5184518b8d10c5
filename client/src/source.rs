use std::fmt;
use std::future::Future;

use bytes::Bytes;
use reqwest::Url;
use tracing::{debug, warn};

use crate::config::{ConfigError, DashboardConfig};
use crate::error::{ClaimsError, body_preview};

pub const RESET_REGIONS_PATH: &str = "/api/getresetregions";
pub const ADV_CLAIMS_PATH: &str = "/api/getadvclaims";

/// The two backend reads the fetcher knows how to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    ResetRegions,
    AdvClaims { requested: &'a str },
}

impl Endpoint<'_> {
    pub fn path(&self) -> &'static str {
        match self {
            Self::ResetRegions => RESET_REGIONS_PATH,
            Self::AdvClaims { .. } => ADV_CLAIMS_PATH,
        }
    }
}

impl fmt::Display for Endpoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResetRegions => f.write_str(RESET_REGIONS_PATH),
            Self::AdvClaims { requested } => write!(f, "{ADV_CLAIMS_PATH}?type={requested}"),
        }
    }
}

/// Raw access to the claims backend.
///
/// `Ok(None)` means the transport produced no response body at all.
pub trait ClaimSource {
    fn get(
        &self,
        endpoint: Endpoint<'_>,
    ) -> impl Future<Output = Result<Option<Bytes>, ClaimsError>> + Send;
}

/// Reads claims from the game server's web API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpClaimSource {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpClaimSource {
    pub fn new(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    pub fn from_config(config: &DashboardConfig) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder().user_agent("sdtd-claims/0.1");
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        Ok(Self::new(builder.build()?, config.dashboard_url.clone()))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: Endpoint<'_>) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(endpoint.path());
        url.set_query(None);
        if let Endpoint::AdvClaims { requested } = endpoint {
            url.query_pairs_mut().append_pair("type", requested);
        }
        url
    }
}

impl ClaimSource for HttpClaimSource {
    async fn get(&self, endpoint: Endpoint<'_>) -> Result<Option<Bytes>, ClaimsError> {
        let url = self.endpoint_url(endpoint);
        debug!(%url, "requesting claims");

        let transport = |source: reqwest::Error| ClaimsError::Transport {
            endpoint: endpoint.to_string(),
            source,
        };

        let resp = self.client.get(url).send().await.map_err(transport)?;
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(transport)?;

        let is_blank = bytes.iter().all(u8::is_ascii_whitespace);

        // A failed status still counts when its body is a JSON payload.
        if !status.is_success() {
            if is_blank || !is_json(&bytes) {
                return Err(ClaimsError::Status {
                    endpoint: endpoint.to_string(),
                    status,
                    preview: body_preview(&bytes),
                });
            }
            warn!(%endpoint, %status, "using JSON body of failed response");
            return Ok(Some(bytes));
        }

        if is_blank {
            return Ok(None);
        }
        Ok(Some(bytes))
    }
}

fn is_json(body: &[u8]) -> bool {
    serde_json::from_slice::<serde::de::IgnoredAny>(body).is_ok()
}
