use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use discogs_xlsx::catalog::{CatalogFetcher, ProgressObserver};
use discogs_xlsx::cli::Cli;
use discogs_xlsx::config::{ExportConfig, Verbosity};
use discogs_xlsx::export::XlsxWriter;
use discogs_xlsx::shutdown::{SharedShutdown, ShutdownCoordinator};
use discogs_xlsx::{DiscogsError, Result};

fn init_tracing(verbosity: Verbosity) {
    // Check if JSON output is requested via environment variable
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Drives an `indicatif` bar from fetch progress.
struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressObserver for ProgressReporter {
    fn advanced(&self, current: u64, total: u64) {
        if self.bar.length() != Some(total) {
            self.bar.set_length(total);
        }
        self.bar.set_position(current);
    }

    fn finished(&self) {
        self.bar.finish_and_clear();
    }
}

fn create_progress_bar(config: &ExportConfig) -> ProgressBar {
    if config.verbosity == Verbosity::Quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("hardcoded template is valid")
            .progress_chars("#>-"),
    );
    pb.set_message(format!("Fetching {}", config.options.kind));
    pb
}

async fn run(config: &ExportConfig, shutdown: SharedShutdown) -> Result<()> {
    let session = config.session()?;
    let bar = create_progress_bar(config);

    let mut fetcher = CatalogFetcher::new(session, config.options)
        .with_shutdown(shutdown.clone())
        .with_progress(Arc::new(ProgressReporter { bar: bar.clone() }));
    if let Some(username) = &config.username {
        fetcher = fetcher.with_username(username.as_str());
    }

    let result = tokio::select! {
        result = fetcher.fetch() => result?,
        _ = shutdown.wait_for_shutdown() => {
            bar.abandon();
            return Err(DiscogsError::Cancelled);
        }
    };

    XlsxWriter::new(&config.output).write(&result)?;
    if config.verbosity != Verbosity::Quiet {
        println!(
            "Exported {} items from the {} of {} to {}",
            result.len(),
            result.summary().kind,
            result.summary().username,
            config.output.display()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ExportConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(e.category().exit_code());
        }
    };
    init_tracing(config.verbosity);

    if config.verbosity != Verbosity::Quiet {
        println!("discogs2xlsx {}", env!("CARGO_PKG_VERSION"));
    }

    // Install Ctrl+C handler
    let shutdown = ShutdownCoordinator::shared();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Ctrl+C received, stopping");
                shutdown.request_shutdown();
            }
        }
    });

    info!(
        kind = %config.options.kind,
        currency = %config.options.currency,
        details = config.options.details,
        prices = config.options.prices,
        output = %config.output.display(),
        "Starting export"
    );

    match run(&config, shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let category = e.category();
            error!(%category, "Export failed: {}", e);
            ExitCode::from(category.exit_code())
        }
    }
}
