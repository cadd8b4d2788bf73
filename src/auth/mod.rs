//! Authentication for the Discogs API.
//!
//! Discogs personal access tokens are sent in the `Authorization` header as
//! `Discogs token=<token>`. The token is held in a [`secrecy::SecretString`] and
//! never printed by `Debug`.

mod credentials;

pub use credentials::{Credentials, TOKEN_ENV_VAR};
