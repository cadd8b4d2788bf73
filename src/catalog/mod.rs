//! Building an export from the Discogs API.
//!
//! [`CatalogFetcher`] drives a [`Paginator`](crate::rest::Paginator) over the
//! user's collection or wantlist, turns every entry into a [`CatalogItem`],
//! optionally enriches it, and collects the items into an [`ExportResult`].

mod fetcher;
mod item;
mod progress;
mod result;

pub use fetcher::{CatalogFetcher, FetchOptions};
pub use item::{CatalogItem, FormatCount, clean_artist_name};
pub use progress::{NoProgress, ProgressObserver};
pub use result::{ExportResult, ExportSummary};
