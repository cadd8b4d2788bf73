//! Discogs REST session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::{RetryDecision, RetryPolicy};
use reqwest_tracing::TracingMiddleware;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use crate::auth::Credentials;
use crate::error::{DiscogsError, Result};
use crate::rate_limit::{RateLimitConfig, RateLimiter, ServerBudget};
use crate::rest::endpoints::{self, DISCOGS_BASE_URL, DISCOGS_MEDIA_TYPE};
use crate::rest::traits::CatalogApi;
use crate::rest::types::{
    ApiMessage, Identity, Listing, ListingPage, PriceSuggestions, ReleaseDetails,
};
use crate::types::Currency;

/// An authenticated, rate-limited session against the Discogs API.
///
/// Every request goes through the session's [`RateLimiter`]; the session
/// issues one request at a time. A 429 response puts the limiter into a
/// cooldown and the request is repeated once. Transport errors and other
/// non-2xx responses are retried with exponential backoff.
///
/// # Example
///
/// ```rust,no_run
/// use discogs_xlsx::auth::Credentials;
/// use discogs_xlsx::rest::{CatalogApi, DiscogsSession};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let session = DiscogsSession::builder()
///         .credentials(Credentials::new("my-token"))
///         .build()?;
///
///     let identity = session.identity().await?;
///     println!("Logged in as {}", identity.username);
///
///     Ok(())
/// }
/// ```
pub struct DiscogsSession {
    http_client: ClientWithMiddleware,
    base_url: String,
    limiter: RateLimiter,
    retry_policy: ExponentialBackoff,
    call_gate: Mutex<()>,
    calls_issued: AtomicU64,
}

impl DiscogsSession {
    /// Create a new session builder.
    pub fn builder() -> DiscogsSessionBuilder {
        DiscogsSessionBuilder::new()
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The session's rate limiter.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Issue a GET request and parse the JSON body.
    ///
    /// # Errors
    ///
    /// - [`DiscogsError::Authentication`] on 401/403
    /// - [`DiscogsError::NotFound`] on 404
    /// - [`DiscogsError::Throttled`] on a second consecutive 429
    /// - [`DiscogsError::RequestFailed`] once retries are exhausted
    pub async fn get<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let query_string = serde_urlencoded::to_string(query)
            .map_err(|e| DiscogsError::InvalidConfig(e.to_string()))?;
        let url = if query_string.is_empty() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?{}", self.base_url, path, query_string)
        };

        let _gate = self.call_gate.lock().await;
        let started = SystemTime::now();
        let mut retries = 0u32;
        let mut throttled = false;

        loop {
            self.limiter.before_call().await;
            let calls = self.calls_issued.fetch_add(1, Ordering::Relaxed) + 1;
            debug!(path, attempt = retries + 1, calls, "GET");

            let failure = match self.http_client.get(&url).send().await {
                Err(error) => {
                    self.limiter.record(&ServerBudget::default()).await;
                    error.to_string()
                }
                Ok(response) => {
                    self.limiter
                        .record(&ServerBudget::from_headers(response.headers()))
                        .await;
                    let status = response.status();
                    if status.is_success() {
                        return self.parse_response(path, response).await;
                    }
                    match status {
                        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                            return Err(DiscogsError::Authentication {
                                status: status.as_u16(),
                                message: error_message(response).await,
                            });
                        }
                        StatusCode::NOT_FOUND => {
                            return Err(DiscogsError::NotFound {
                                path: path.to_string(),
                            });
                        }
                        StatusCode::TOO_MANY_REQUESTS => {
                            if throttled {
                                return Err(DiscogsError::Throttled {
                                    path: path.to_string(),
                                });
                            }
                            throttled = true;
                            self.limiter.throttled().await;
                            continue;
                        }
                        _ => format!("HTTP {}: {}", status, error_message(response).await),
                    }
                }
            };
            throttled = false;

            match self.retry_policy.should_retry(started, retries) {
                RetryDecision::Retry { execute_after } => {
                    let wait = execute_after
                        .duration_since(SystemTime::now())
                        .unwrap_or(Duration::ZERO);
                    retries += 1;
                    warn!(
                        path,
                        attempt = retries,
                        wait_ms = wait.as_millis() as u64,
                        reason = %failure,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                }
                RetryDecision::DoNotRetry => {
                    return Err(DiscogsError::RequestFailed {
                        path: path.to_string(),
                        attempts: retries + 1,
                        reason: failure,
                    });
                }
            }
        }
    }

    /// Like [`get`](Self::get), mapping 404 to `None`.
    pub async fn get_optional<T, Q>(&self, path: &str, query: &Q) -> Result<Option<T>>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        match self.get(path, query).await {
            Ok(body) => Ok(Some(body)),
            Err(error) if error.is_not_found() => {
                debug!(path, "Resource not found");
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    async fn parse_response<T>(&self, path: &str, response: reqwest::Response) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            DiscogsError::InvalidResponse(format!(
                "Failed to parse response from {}: {}. Body: {}",
                path,
                e,
                truncate(&body)
            ))
        })
    }
}

/// Extract the `message` of an error body, falling back to the raw text.
async fn error_message(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ApiMessage>(&body) {
        Ok(parsed) => parsed.message,
        Err(_) => truncate(&body).to_string(),
    }
}

fn truncate(body: &str) -> &str {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}

impl std::fmt::Debug for DiscogsSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscogsSession")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .field("calls_issued", &self.calls_issued.load(Ordering::Relaxed))
            .finish()
    }
}

/// Builder for [`DiscogsSession`].
pub struct DiscogsSessionBuilder {
    base_url: String,
    credentials: Option<Credentials>,
    user_agent: Option<String>,
    max_retries: u32,
    min_retry_interval: Duration,
    max_retry_interval: Duration,
    timeout: Duration,
    rate_limit: RateLimitConfig,
}

impl DiscogsSessionBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            base_url: DISCOGS_BASE_URL.to_string(),
            credentials: None,
            user_agent: None,
            max_retries: 3,
            min_retry_interval: Duration::from_secs(1),
            max_retry_interval: Duration::from_secs(30),
            timeout: Duration::from_secs(30),
            rate_limit: RateLimitConfig::default(),
        }
    }

    /// Set the base URL (useful for testing with a mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the token used for every request.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set a custom user agent, overriding the one carried by the credentials.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the maximum number of retries for transient failures.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the bounds of the exponential backoff between retries.
    pub fn retry_bounds(mut self, min: Duration, max: Duration) -> Self {
        self.min_retry_interval = min;
        self.max_retry_interval = max;
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the rate limiter configuration.
    pub fn rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = config;
        self
    }

    /// Set only the cooldown applied after a 429.
    pub fn throttle_cooldown(mut self, cooldown: Duration) -> Self {
        self.rate_limit.throttle_cooldown = cooldown;
        self
    }

    /// Build the session.
    pub fn build(self) -> Result<DiscogsSession> {
        let credentials = self.credentials.ok_or_else(|| {
            DiscogsError::InvalidConfig("a Discogs personal access token is required".to_string())
        })?;
        if credentials.expose_token().trim().is_empty() {
            return Err(DiscogsError::InvalidConfig(
                "the Discogs token is empty".to_string(),
            ));
        }
        if self.min_retry_interval > self.max_retry_interval {
            return Err(DiscogsError::InvalidConfig(
                "minimum retry interval exceeds the maximum".to_string(),
            ));
        }
        self.rate_limit.validate()?;

        let base_url = Url::parse(&self.base_url)?;
        let base_url = base_url.as_str().trim_end_matches('/').to_string();

        let user_agent = self
            .user_agent
            .or_else(|| credentials.user_agent.clone())
            .unwrap_or_else(|| format!("discogs-xlsx/{}", env!("CARGO_PKG_VERSION")));
        let user_agent = HeaderValue::from_str(&user_agent)
            .map_err(|e| DiscogsError::InvalidConfig(format!("invalid user agent: {e}")))?;
        let mut authorization = HeaderValue::from_str(&credentials.authorization())
            .map_err(|_| DiscogsError::InvalidConfig("invalid Discogs token".to_string()))?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, user_agent);
        headers.insert(ACCEPT, HeaderValue::from_static(DISCOGS_MEDIA_TYPE));
        headers.insert(AUTHORIZATION, authorization);

        let reqwest_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(self.timeout)
            .build()?;

        let http_client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .build();

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(self.min_retry_interval, self.max_retry_interval)
            .build_with_max_retries(self.max_retries);

        Ok(DiscogsSession {
            http_client,
            base_url,
            limiter: RateLimiter::new(self.rate_limit),
            retry_policy,
            call_gate: Mutex::new(()),
            calls_issued: AtomicU64::new(0),
        })
    }
}

impl Default for DiscogsSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogApi for DiscogsSession {
    async fn identity(&self) -> Result<Identity> {
        self.get(endpoints::IDENTITY, &()).await
    }

    async fn listing_page(&self, listing: &Listing, page: u32, per_page: u32) -> Result<ListingPage> {
        self.get(&listing.path(), &[("page", page), ("per_page", per_page)])
            .await
    }

    async fn release(&self, release_id: u64, currency: Currency) -> Result<Option<ReleaseDetails>> {
        self.get_optional(
            &endpoints::release(release_id),
            &[("curr_abbr", currency.code())],
        )
        .await
    }

    async fn price_suggestions(&self, release_id: u64) -> Result<Option<PriceSuggestions>> {
        self.get_optional(&endpoints::price_suggestions(release_id), &())
            .await
    }

    fn calls_issued(&self) -> u64 {
        self.calls_issued.load(Ordering::Relaxed)
    }
}
