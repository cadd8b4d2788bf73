//! One exported row.

use std::sync::LazyLock;

use regex::Regex;
use time::OffsetDateTime;

use crate::rest::types::{ArtistRef, FormatRef, ListingEntry, PriceSuggestions, ReleaseDetails};

/// Discogs disambiguation suffix, e.g. the " (2)" in "Nirvana (2)".
static DISAMBIGUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(\d+\)").expect("disambiguation regex is valid"));

/// Total quantity of one format on a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatCount {
    /// Upper-cased format name, e.g. "VINYL"
    pub name: String,
    /// Items of this format, summed over all format entries
    pub quantity: u32,
}

/// A collection or wantlist entry, ready to be written.
///
/// Built from a raw [`ListingEntry`]. Release details and price suggestions
/// are attached at most once each.
#[derive(Debug, Clone)]
pub struct CatalogItem {
    /// Collection instance id, or the release id for wantlist entries
    pub key: u64,
    /// Release id
    pub release_id: u64,
    /// Collection instance id (collections only)
    pub instance_id: Option<u64>,
    /// Credited artists joined with " - "
    pub artist: String,
    /// Release title
    pub title: String,
    /// Release year, if known
    pub year: Option<u32>,
    /// Label names, in credit order
    pub labels: Vec<String>,
    /// Catalog numbers, in label order
    pub catalog_numbers: Vec<String>,
    /// Formats with summed quantities, in first-seen order
    pub formats: Vec<FormatCount>,
    /// Genres
    pub genres: Vec<String>,
    /// Styles
    pub styles: Vec<String>,
    /// User rating (1 to 5), if rated
    pub rating: Option<u8>,
    /// When the entry was added
    pub date_added: Option<OffsetDateTime>,
    /// API URL of the release
    pub resource_url: String,
    details: Option<ReleaseDetails>,
    prices: Option<PriceSuggestions>,
}

impl CatalogItem {
    /// Build an item from a listing entry.
    pub fn from_entry(entry: ListingEntry) -> Self {
        let info = entry.basic_information;
        Self {
            key: entry.instance_id.unwrap_or(entry.id),
            release_id: entry.id,
            instance_id: entry.instance_id,
            artist: join_artists(&info.artists),
            title: info.title.trim().to_string(),
            year: (info.year > 0).then_some(info.year),
            labels: info
                .labels
                .iter()
                .map(|label| label.name.trim().to_string())
                .collect(),
            catalog_numbers: info
                .labels
                .iter()
                .map(|label| label.catno.trim().to_uppercase())
                .filter(|catno| !catno.is_empty())
                .collect(),
            formats: count_formats(&info.formats),
            genres: trimmed(info.genres),
            styles: trimmed(info.styles),
            rating: (entry.rating > 0).then_some(entry.rating),
            date_added: entry.date_added,
            resource_url: info.resource_url,
            details: None,
            prices: None,
        }
    }

    /// Attached release details.
    pub fn details(&self) -> Option<&ReleaseDetails> {
        self.details.as_ref()
    }

    /// Attached price suggestions.
    pub fn prices(&self) -> Option<&PriceSuggestions> {
        self.prices.as_ref()
    }

    /// Attach release details. Returns `false` if details were already set.
    pub fn attach_details(&mut self, details: ReleaseDetails) -> bool {
        if self.details.is_some() {
            return false;
        }
        self.details = Some(details);
        true
    }

    /// Attach price suggestions. Returns `false` if prices were already set.
    pub fn attach_prices(&mut self, prices: PriceSuggestions) -> bool {
        if self.prices.is_some() {
            return false;
        }
        self.prices = Some(prices);
        true
    }

    /// Format names, e.g. "VINYL - CD".
    pub fn format_names(&self) -> String {
        self.formats
            .iter()
            .map(|format| format.name.as_str())
            .collect::<Vec<_>>()
            .join(" - ")
    }

    /// Quantities matching [`format_names`](Self::format_names), e.g. "2 - 1".
    pub fn format_quantities(&self) -> String {
        self.formats
            .iter()
            .map(|format| format.quantity.to_string())
            .collect::<Vec<_>>()
            .join(" - ")
    }

    /// Catalog numbers joined with " - ".
    pub fn catalog_number(&self) -> String {
        self.catalog_numbers.join(" - ")
    }

    /// Web page of the release, known once details are attached.
    pub fn web_url(&self) -> Option<&str> {
        self.details.as_ref().and_then(|details| details.uri.as_deref())
    }
}

/// Remove disambiguation suffixes such as " (2)" from an artist name.
pub fn clean_artist_name(name: &str) -> String {
    DISAMBIGUATION.replace_all(name, "").trim().to_string()
}

fn join_artists(artists: &[ArtistRef]) -> String {
    artists
        .iter()
        .map(|artist| clean_artist_name(&artist.name))
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(" - ")
}

fn count_formats(formats: &[FormatRef]) -> Vec<FormatCount> {
    let mut counts: Vec<FormatCount> = Vec::new();
    for format in formats {
        let name = format.name.trim().to_uppercase();
        match counts.iter_mut().find(|count| count.name == name) {
            Some(count) => count.quantity += format.qty,
            None => counts.push(FormatCount {
                name,
                quantity: format.qty,
            }),
        }
    }
    counts
}

fn trimmed(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::fake::entry;
    use crate::rest::types::{Community, LabelRef};

    #[test]
    fn test_clean_artist_name() {
        assert_eq!(clean_artist_name("Nirvana (2)"), "Nirvana");
        assert_eq!(clean_artist_name("Dead Can Dance"), "Dead Can Dance");
        assert_eq!(clean_artist_name("Live (12) Band"), "Live Band");
        assert_eq!(clean_artist_name("Sunn O)))"), "Sunn O)))");
    }

    #[test]
    fn test_from_collection_entry() {
        let item = CatalogItem::from_entry(entry(7));
        assert_eq!(item.key, 70);
        assert_eq!(item.release_id, 7);
        assert_eq!(item.artist, "Artist 7");
        assert_eq!(item.title, "Album 7");
        assert_eq!(item.year, Some(2007));
        assert_eq!(item.catalog_number(), "CAT-7");
        assert_eq!(item.format_names(), "VINYL");
        assert_eq!(item.rating, None);
        assert!(item.details().is_none());
        assert!(item.prices().is_none());
    }

    #[test]
    fn test_wantlist_entry_is_keyed_by_release() {
        let mut raw = entry(7);
        raw.instance_id = None;
        raw.basic_information.year = 0;
        let item = CatalogItem::from_entry(raw);
        assert_eq!(item.key, 7);
        assert_eq!(item.year, None);
    }

    #[test]
    fn test_multiple_artists_and_labels() {
        let mut raw = entry(1);
        raw.basic_information.artists = vec![
            ArtistRef {
                id: 1,
                name: "Brian Eno (3)".to_string(),
            },
            ArtistRef {
                id: 2,
                name: "David Byrne".to_string(),
            },
        ];
        raw.basic_information.labels = vec![
            LabelRef {
                name: "Sire".to_string(),
                catno: "sre 6093".to_string(),
            },
            LabelRef {
                name: "Not On Label".to_string(),
                catno: " ".to_string(),
            },
        ];
        let item = CatalogItem::from_entry(raw);
        assert_eq!(item.artist, "Brian Eno - David Byrne");
        assert_eq!(item.catalog_number(), "SRE 6093");
        assert_eq!(item.labels, vec!["Sire", "Not On Label"]);
    }

    #[test]
    fn test_formats_are_aggregated_by_name() {
        let mut raw = entry(1);
        raw.basic_information.formats = vec![
            FormatRef {
                name: "Vinyl".to_string(),
                qty: 2,
            },
            FormatRef {
                name: "CD".to_string(),
                qty: 1,
            },
            FormatRef {
                name: "vinyl ".to_string(),
                qty: 1,
            },
        ];
        let item = CatalogItem::from_entry(raw);
        assert_eq!(item.format_names(), "VINYL - CD");
        assert_eq!(item.format_quantities(), "3 - 1");
    }

    #[test]
    fn test_enrichment_attaches_once() {
        let mut item = CatalogItem::from_entry(entry(1));
        let details = ReleaseDetails {
            id: 1,
            uri: Some("https://www.discogs.com/release/1".to_string()),
            community: Community { have: 5, want: 3 },
            ..ReleaseDetails::default()
        };
        assert!(item.attach_details(details.clone()));
        assert!(!item.attach_details(ReleaseDetails::default()));
        assert_eq!(item.details(), Some(&details));
        assert_eq!(item.web_url(), Some("https://www.discogs.com/release/1"));

        assert!(item.attach_prices(PriceSuggestions::default()));
        assert!(!item.attach_prices(PriceSuggestions::default()));
    }
}
