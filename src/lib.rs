//! # Discogs to xlsx
//!
//! Export a Discogs collection or wantlist into an xlsx spreadsheet.
//!
//! ## Features
//!
//! - Authenticated, rate-limited access to the Discogs REST API
//! - Lazy pagination over collection and wantlist listings
//! - Optional per-release enrichment with community stats, marketplace
//!   values and suggested prices per condition
//! - Financial precision with `rust_decimal`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use discogs_xlsx::auth::Credentials;
//! use discogs_xlsx::catalog::{CatalogFetcher, FetchOptions};
//! use discogs_xlsx::export::XlsxWriter;
//! use discogs_xlsx::rest::DiscogsSession;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = DiscogsSession::builder()
//!         .credentials(Credentials::new("my-token"))
//!         .build()?;
//!
//!     let result = CatalogFetcher::new(session, FetchOptions::default())
//!         .fetch()
//!         .await?;
//!     XlsxWriter::new("discogs-collection.xlsx").write(&result)?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod rate_limit;
pub mod rest;
pub mod shutdown;
pub mod types;

// Re-export commonly used types at crate root
pub use config::ExportConfig;
pub use error::{DiscogsError, ErrorCategory, Result};
pub use types::common::{Condition, Currency, ListKind};
