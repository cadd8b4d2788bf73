//! Discogs REST API access.
//!
//! [`DiscogsSession`] issues authenticated, rate-limited GET requests and
//! maps status codes to typed outcomes. [`Paginator`] walks listing
//! endpoints page by page.
//!
//! # Trait-based API
//!
//! The [`CatalogApi`] trait abstracts the endpoints an export needs, so the
//! paginator and the fetcher run unchanged against test doubles:
//!
//! ```rust,ignore
//! use discogs_xlsx::rest::{CatalogApi, Listing, Paginator};
//!
//! async fn count<C: CatalogApi>(client: &C) -> discogs_xlsx::Result<usize> {
//!     let identity = client.identity().await?;
//!     let entries = Paginator::new(client, Listing::collection(identity.username), 100)
//!         .collect_all()
//!         .await?;
//!     Ok(entries.len())
//! }
//! ```

mod client;
pub mod endpoints;
#[cfg(test)]
pub(crate) mod fake;
mod paginator;
mod traits;
pub mod types;

pub use client::{DiscogsSession, DiscogsSessionBuilder};
pub use endpoints::{DISCOGS_BASE_URL, DISCOGS_MEDIA_TYPE, MAX_PAGE_SIZE};
pub use paginator::Paginator;
pub use traits::CatalogApi;
pub use types::*;
