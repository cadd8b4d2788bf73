//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::auth::TOKEN_ENV_VAR;
use crate::rest::MAX_PAGE_SIZE;
use crate::types::Currency;

/// Export your Discogs collection or wantlist to an xlsx spreadsheet.
#[derive(Parser, Clone)]
#[command(name = "discogs2xlsx")]
#[command(about = "Export a Discogs collection or wantlist to xlsx", long_about = None)]
#[command(version, disable_version_flag = true)]
pub struct Cli {
    /// Discogs personal access token
    #[arg(short, long, env = TOKEN_ENV_VAR, hide_env_values = true)]
    pub token: String,

    /// Currency for marketplace values
    #[arg(short, long, value_enum, default_value_t = Currency::Eur)]
    pub currency: Currency,

    /// Export the wantlist instead of the collection
    #[arg(short, long)]
    pub wantlist: bool,

    /// Look up release details (have/want, notes, lowest price) for every item
    #[arg(short, long)]
    pub details: bool,

    /// Look up suggested prices per condition for every item
    #[arg(short, long)]
    pub prices: bool,

    /// Output file [default: discogs-collection.xlsx or discogs-wantlist.xlsx]
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Export the public lists of another user instead of the token owner
    #[arg(short, long)]
    pub username: Option<String>,

    /// Entries requested per listing page
    #[arg(long, default_value_t = MAX_PAGE_SIZE, value_parser = clap::value_parser!(u32).range(1..=MAX_PAGE_SIZE as i64))]
    pub page_size: u32,

    /// Custom user agent
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Retries for failed requests
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(0..=10))]
    pub max_retries: u32,

    /// Log debug messages
    #[arg(long, conflicts_with = "quiet")]
    pub debug: bool,

    /// Only log errors and hide the progress bar
    #[arg(short, long)]
    pub quiet: bool,

    /// Print version
    #[arg(short = 'v', long, action = clap::ArgAction::Version)]
    pub version: Option<bool>,
}

impl std::fmt::Debug for Cli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cli")
            .field("token", &"[REDACTED]")
            .field("currency", &self.currency)
            .field("wantlist", &self.wantlist)
            .field("details", &self.details)
            .field("prices", &self.prices)
            .field("file", &self.file)
            .field("username", &self.username)
            .field("page_size", &self.page_size)
            .field("debug", &self.debug)
            .field("quiet", &self.quiet)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["discogs2xlsx", "-t", "abc"]).unwrap();
        assert_eq!(cli.token, "abc");
        assert_eq!(cli.currency, Currency::Eur);
        assert!(!cli.wantlist && !cli.details && !cli.prices);
        assert_eq!(cli.file, None);
        assert_eq!(cli.page_size, 100);
        assert_eq!(cli.max_retries, 3);
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::try_parse_from([
            "discogs2xlsx",
            "-t",
            "abc",
            "-c",
            "USD",
            "-w",
            "-d",
            "-p",
            "-f",
            "wants.xlsx",
        ])
        .unwrap();
        assert_eq!(cli.currency, Currency::Usd);
        assert!(cli.wantlist && cli.details && cli.prices);
        assert_eq!(cli.file, Some(PathBuf::from("wants.xlsx")));
    }

    #[test]
    fn test_debug_and_quiet_conflict() {
        let result = Cli::try_parse_from(["discogs2xlsx", "-t", "abc", "--debug", "-q"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_currency_is_rejected() {
        let result = Cli::try_parse_from(["discogs2xlsx", "-t", "abc", "-c", "BTC"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_page_size_bounds() {
        assert!(Cli::try_parse_from(["discogs2xlsx", "-t", "abc", "--page-size", "0"]).is_err());
        assert!(Cli::try_parse_from(["discogs2xlsx", "-t", "abc", "--page-size", "101"]).is_err());
    }

    #[test]
    fn test_debug_output_redacts_token() {
        let cli = Cli::try_parse_from(["discogs2xlsx", "-t", "super_secret"]).unwrap();
        assert!(!format!("{cli:?}").contains("super_secret"));
    }
}
