//! Validated run configuration.

use std::path::{Path, PathBuf};

use crate::auth::Credentials;
use crate::catalog::FetchOptions;
use crate::cli::Cli;
use crate::error::{DiscogsError, Result};
use crate::rate_limit::RateLimitConfig;
use crate::rest::{DISCOGS_BASE_URL, DiscogsSession, MAX_PAGE_SIZE};
use crate::types::ListKind;

/// How much the binary logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Errors only, no progress bar
    Quiet,
    /// Info and above
    #[default]
    Normal,
    /// Debug and above
    Debug,
}

impl Verbosity {
    /// Default `tracing` directive for this level.
    pub fn filter_directive(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "discogs_xlsx=error,discogs2xlsx=error",
            Verbosity::Normal => "discogs_xlsx=info,discogs2xlsx=info",
            Verbosity::Debug => "discogs_xlsx=debug,discogs2xlsx=debug",
        }
    }
}

/// Everything one export run needs, checked once at construction.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Token and user agent
    pub credentials: Credentials,
    /// What to fetch
    pub options: FetchOptions,
    /// Rate limiter settings
    pub rate_limit: RateLimitConfig,
    /// Spreadsheet path
    pub output: PathBuf,
    /// Retries for failed requests
    pub max_retries: u32,
    /// API base URL
    pub base_url: String,
    /// Export this user's lists instead of the token owner's
    pub username: Option<String>,
    /// Logging level of the binary
    pub verbosity: Verbosity,
}

impl ExportConfig {
    /// Create a configuration with default limits.
    ///
    /// Without an explicit `output`, the file is named after the list kind.
    pub fn new(
        credentials: Credentials,
        options: FetchOptions,
        output: Option<PathBuf>,
    ) -> Result<Self> {
        let output = output.unwrap_or_else(|| Self::default_output(options.kind));
        let config = Self {
            credentials,
            options,
            rate_limit: RateLimitConfig::default(),
            output,
            max_retries: 3,
            base_url: DISCOGS_BASE_URL.to_string(),
            username: None,
            verbosity: Verbosity::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Build the configuration from parsed command-line arguments.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut credentials = Credentials::new(cli.token.trim());
        if let Some(user_agent) = &cli.user_agent {
            credentials = credentials.with_user_agent(user_agent);
        }
        let options = FetchOptions {
            kind: if cli.wantlist {
                ListKind::Wantlist
            } else {
                ListKind::Collection
            },
            currency: cli.currency,
            details: cli.details,
            prices: cli.prices,
            per_page: cli.page_size,
        };

        let mut config = Self::new(credentials, options, cli.file.clone())?;
        config.max_retries = cli.max_retries;
        config.username = cli.username.clone().filter(|name| !name.trim().is_empty());
        config.verbosity = if cli.debug {
            Verbosity::Debug
        } else if cli.quiet {
            Verbosity::Quiet
        } else {
            Verbosity::Normal
        };
        Ok(config)
    }

    /// Default spreadsheet name for a list kind.
    pub fn default_output(kind: ListKind) -> PathBuf {
        PathBuf::from(format!("discogs-{kind}.xlsx"))
    }

    /// Build the API session described by this configuration.
    pub fn session(&self) -> Result<DiscogsSession> {
        DiscogsSession::builder()
            .base_url(self.base_url.as_str())
            .credentials(self.credentials.clone())
            .max_retries(self.max_retries)
            .rate_limit(self.rate_limit.clone())
            .build()
    }

    fn validate(&self) -> Result<()> {
        if self.credentials.expose_token().trim().is_empty() {
            return Err(DiscogsError::InvalidConfig(
                "a Discogs personal access token is required".to_string(),
            ));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.options.per_page) {
            return Err(DiscogsError::InvalidConfig(format!(
                "page size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.options.per_page
            )));
        }
        validate_output(&self.output)?;
        self.rate_limit.validate()
    }
}

fn validate_output(path: &Path) -> Result<()> {
    let is_xlsx = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));
    if !is_xlsx {
        return Err(DiscogsError::InvalidConfig(format!(
            "output file must end in .xlsx: {}",
            path.display()
        )));
    }
    if path.is_dir() {
        return Err(DiscogsError::InvalidConfig(format!(
            "output path is a directory: {}",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Currency;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["discogs2xlsx", "-t", "abc"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_default_output_follows_list_kind() {
        let config = ExportConfig::from_cli(&parse(&[])).unwrap();
        assert_eq!(config.output, PathBuf::from("discogs-collection.xlsx"));
        assert_eq!(config.options.kind, ListKind::Collection);

        let config = ExportConfig::from_cli(&parse(&["-w"])).unwrap();
        assert_eq!(config.output, PathBuf::from("discogs-wantlist.xlsx"));
        assert_eq!(config.options.kind, ListKind::Wantlist);
    }

    #[test]
    fn test_explicit_output_wins() {
        let config = ExportConfig::from_cli(&parse(&["-w", "-f", "mine.XLSX"])).unwrap();
        assert_eq!(config.output, PathBuf::from("mine.XLSX"));
    }

    #[test]
    fn test_options_are_carried_over() {
        let config =
            ExportConfig::from_cli(&parse(&["-c", "GBP", "-d", "-p", "--page-size", "50"])).unwrap();
        assert_eq!(config.options.currency, Currency::Gbp);
        assert!(config.options.details);
        assert!(config.options.prices);
        assert_eq!(config.options.per_page, 50);
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(
            ExportConfig::from_cli(&parse(&["--debug"])).unwrap().verbosity,
            Verbosity::Debug
        );
        assert_eq!(
            ExportConfig::from_cli(&parse(&["-q"])).unwrap().verbosity,
            Verbosity::Quiet
        );
        assert_eq!(
            ExportConfig::from_cli(&parse(&[])).unwrap().verbosity,
            Verbosity::Normal
        );
    }

    #[test]
    fn test_rejects_blank_token() {
        let result = ExportConfig::new(Credentials::new(" "), FetchOptions::default(), None);
        assert!(matches!(result, Err(DiscogsError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_non_xlsx_output() {
        let result = ExportConfig::new(
            Credentials::new("abc"),
            FetchOptions::default(),
            Some(PathBuf::from("collection.csv")),
        );
        assert!(matches!(result, Err(DiscogsError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_out_of_range_page_size() {
        let options = FetchOptions {
            per_page: 0,
            ..FetchOptions::default()
        };
        let result = ExportConfig::new(Credentials::new("abc"), options, None);
        assert!(matches!(result, Err(DiscogsError::InvalidConfig(_))));
    }

    #[test]
    fn test_session_from_config() {
        let config = ExportConfig::from_cli(&parse(&["--max-retries", "1"])).unwrap();
        let session = config.session().unwrap();
        assert_eq!(session.base_url(), DISCOGS_BASE_URL);
    }
}
