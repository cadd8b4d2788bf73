//! Trait definition for the Discogs calls the exporter makes.
//!
//! The [`CatalogApi`] trait abstracts the handful of endpoints the
//! [`Paginator`](crate::rest::Paginator) and the
//! [`CatalogFetcher`](crate::catalog::CatalogFetcher) need, so both can run
//! against in-memory fakes in tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use discogs_xlsx::rest::{CatalogApi, DiscogsSession};
//!
//! async fn whoami<C: CatalogApi>(client: &C) -> discogs_xlsx::Result<()> {
//!     let identity = client.identity().await?;
//!     println!("Token belongs to {}", identity.username);
//!     Ok(())
//! }
//! ```

use std::future::Future;

use crate::error::Result;
use crate::rest::types::{Identity, Listing, ListingPage, PriceSuggestions, ReleaseDetails};
use crate::types::Currency;

/// Discogs operations used by an export.
///
/// All methods are async and return [`Result`]. Lookups of a single release
/// return `Ok(None)` when Discogs answers 404.
pub trait CatalogApi: Send + Sync {
    /// Resolve the user owning the token.
    fn identity(&self) -> impl Future<Output = Result<Identity>> + Send;

    /// Fetch one page of a listing.
    fn listing_page(
        &self,
        listing: &Listing,
        page: u32,
        per_page: u32,
    ) -> impl Future<Output = Result<ListingPage>> + Send;

    /// Fetch release details, with marketplace values in `currency`.
    fn release(
        &self,
        release_id: u64,
        currency: Currency,
    ) -> impl Future<Output = Result<Option<ReleaseDetails>>> + Send;

    /// Fetch suggested prices per condition.
    fn price_suggestions(
        &self,
        release_id: u64,
    ) -> impl Future<Output = Result<Option<PriceSuggestions>>> + Send;

    /// Number of HTTP calls issued so far, retries included.
    fn calls_issued(&self) -> u64;
}
