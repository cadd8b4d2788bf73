//! Discogs REST API endpoint constants.

use url::form_urlencoded::byte_serialize;

/// Base URL for the Discogs REST API.
pub const DISCOGS_BASE_URL: &str = "https://api.discogs.com";

/// Media type requesting v2 plaintext bodies.
pub const DISCOGS_MEDIA_TYPE: &str = "application/vnd.discogs.v2.plaintext+json";

/// Resolve the user owning the token.
pub const IDENTITY: &str = "/oauth/identity";

/// Largest page size the listing endpoints accept.
pub const MAX_PAGE_SIZE: u32 = 100;

/// The folder holding every release of a collection.
pub const ALL_FOLDER: u64 = 0;

// Form encoding writes spaces as '+', which a path would keep literally.
fn encode(segment: &str) -> String {
    byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Releases in one collection folder.
pub fn collection_releases(username: &str, folder: u64) -> String {
    format!(
        "/users/{}/collection/folders/{folder}/releases",
        encode(username)
    )
}

/// Releases in a user's wantlist.
pub fn wants(username: &str) -> String {
    format!("/users/{}/wants", encode(username))
}

/// One release.
pub fn release(release_id: u64) -> String {
    format!("/releases/{release_id}")
}

/// Suggested marketplace prices for one release, per condition.
pub fn price_suggestions(release_id: u64) -> String {
    format!("/marketplace/price_suggestions/{release_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_paths() {
        assert_eq!(
            collection_releases("dummy", ALL_FOLDER),
            "/users/dummy/collection/folders/0/releases"
        );
        assert_eq!(wants("dummy"), "/users/dummy/wants");
    }

    #[test]
    fn test_username_is_escaped() {
        assert_eq!(wants("dj shadow/x"), "/users/dj%20shadow%2Fx/wants");
    }

    #[test]
    fn test_release_paths() {
        assert_eq!(release(249504), "/releases/249504");
        assert_eq!(
            price_suggestions(249504),
            "/marketplace/price_suggestions/249504"
        );
    }
}
