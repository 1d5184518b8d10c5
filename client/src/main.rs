use std::io::Write as _;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sdtd_client::{ClaimFetcher, DashboardConfig, HttpClaimSource};
use sdtd_shared::RESET_REGION;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Read claims from a 7 Days to Die server dashboard.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Dashboard base URL (defaults to SDTD_DASHBOARD_URL, then http://localhost:8082)
    #[arg(short, long)]
    url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch claims of one type, or `resetregion` for reset regions
    Fetch { claim_type: String },
    /// Fetch every known claim type plus reset regions
    All,
    /// List the known claim types
    Types,
    /// Print the map tile server endpoint derived from the dashboard URL
    Map,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match DashboardConfig::from_env(cli.url.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::Types => {
            let mut names: Vec<&str> = config
                .claim_types
                .iter()
                .map(|kind| kind.as_str())
                .collect();
            names.push(RESET_REGION);
            print_lines(&names)
        }
        Command::Map => print_lines(&[config.allocs_map.base_url()]),
        Command::Fetch { claim_type } => {
            let Some(fetcher) = build_fetcher(&config) else {
                return ExitCode::FAILURE;
            };
            match fetcher.fetch_claims(&claim_type).await {
                Ok(fetched) => print_json(&fetched),
                Err(e) => {
                    tracing::error!(error = %e, claim_type = %claim_type, "failed to fetch claims");
                    ExitCode::FAILURE
                }
            }
        }
        Command::All => {
            let Some(fetcher) = build_fetcher(&config) else {
                return ExitCode::FAILURE;
            };
            fetch_everything(&fetcher, &config).await
        }
    }
}

fn build_fetcher(config: &DashboardConfig) -> Option<ClaimFetcher<HttpClaimSource>> {
    match HttpClaimSource::from_config(config) {
        Ok(source) => {
            tracing::info!(url = %source.base_url(), "using dashboard");
            Some(ClaimFetcher::new(source))
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to set up HTTP client");
            None
        }
    }
}

async fn fetch_everything(
    fetcher: &ClaimFetcher<HttpClaimSource>,
    config: &DashboardConfig,
) -> ExitCode {
    let requested = config
        .claim_types
        .iter()
        .map(|kind| kind.as_str())
        .chain(std::iter::once(RESET_REGION));

    let results = fetcher.fetch_all(requested, config.fetch_concurrency).await;

    let mut failed = 0usize;
    let mut output = serde_json::Map::new();
    for (kind, result) in results {
        let value = match result.map(serde_json::to_value) {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                failed += 1;
                tracing::warn!(error = %e, claim_type = %kind, "failed to serialize claims");
                serde_json::json!({ "error": e.to_string() })
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(error = %e, claim_type = %kind, "failed to fetch claims");
                serde_json::json!({ "error": e.to_string() })
            }
        };
        output.insert(kind, value);
    }

    let printed = print_json(&output);
    if failed > 0 {
        tracing::error!(failed, "some claim types could not be fetched");
        return ExitCode::FAILURE;
    }
    printed
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    let mut stdout = std::io::stdout().lock();
    let written = serde_json::to_writer_pretty(&mut stdout, value)
        .map_err(std::io::Error::from)
        .and_then(|()| writeln!(stdout));
    match written {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "failed to write output");
            ExitCode::FAILURE
        }
    }
}

fn print_lines<T: AsRef<str>>(lines: &[T]) -> ExitCode {
    let mut stdout = std::io::stdout().lock();
    for line in lines {
        if let Err(e) = writeln!(stdout, "{}", line.as_ref()) {
            tracing::error!(error = %e, "failed to write output");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
