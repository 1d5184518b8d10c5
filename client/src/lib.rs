pub mod config;
pub mod error;
pub mod fetcher;
pub mod source;

pub use config::{AllocsMap, ConfigError, DashboardConfig};
pub use error::ClaimsError;
pub use fetcher::{ClaimFetch, ClaimFetcher};
pub use source::{ClaimSource, Endpoint, HttpClaimSource};
