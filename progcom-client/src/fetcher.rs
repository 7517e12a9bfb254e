//! Paginated fetcher for the CfP service
//!
//! One operation: GET a resource (collection page or single record) given a
//! relative path and query parameters. Every request carries the bearer
//! credential, the version-pinning header and a JSON accept header, and
//! passes through a process-wide token bucket. 429 and 5xx responses are
//! retried with bounded exponential backoff and jitter; other 4xx fail
//! immediately.
//!
//! The upstream answers trailing-slash redirects on the same origin;
//! reqwest follows those transparently and the default headers (version pin
//! included) ride along.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use progcom_common::config::UpstreamConfig;
use progcom_common::{Error, Result};

/// Header pinning the wire version the client expects. Header names are
/// case-insensitive on the wire; this one must stay lowercase so it can
/// be registered as a static header name.
pub const VERSION_HEADER: &str = "cfp-version";

/// Envelope shape of paginated list responses.
#[derive(Debug, Clone, Deserialize)]
pub struct PageEnvelope {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<Value>,
}

impl PageEnvelope {
    /// Some instances answer bounded listings with a bare JSON array; fold
    /// that into the envelope shape.
    pub fn from_value(value: Value, path: &str) -> Result<PageEnvelope> {
        match value {
            Value::Array(results) => Ok(PageEnvelope {
                count: results.len() as u64,
                next: None,
                previous: None,
                results,
            }),
            other => serde_json::from_value(other).map_err(|e| Error::WireError {
                path: path.to_string(),
                cause: format!("not a pagination envelope: {e}"),
            }),
        }
    }
}

/// Bounded exponential backoff with jitter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first request.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay before the given retry (attempt is 1-based; called after
    /// attempt N failed). Half the exponential step is fixed, the other
    /// half is uniform jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let exp = self
            .base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay);
        let half_ms = (exp.as_millis() as u64) / 2;
        let jitter_ms = rand::thread_rng().gen_range(0..=half_ms.max(1));
        Duration::from_millis(half_ms + jitter_ms)
    }
}

type DirectLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Source of paginated follow-up pages. The seam lets the lazy cursor be
/// exercised without a network.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page behind an absolute `next` URL.
    async fn next_page(&self, url: &str) -> Result<PageEnvelope>;
}

/// Source of single-record fetches and bulk listings, used by the
/// expansion layer.
#[async_trait]
pub trait DetailSource: Send + Sync {
    /// GET `/api/events/{event}/{resource}/{id}/`.
    async fn detail(&self, event: &str, resource: &str, id: &str) -> Result<Value>;

    /// Drain a whole listing (used for bulk cache pre-population).
    async fn list_all(
        &self,
        event: &str,
        resource: &str,
        params: &[(String, String)],
    ) -> Result<Vec<Value>>;
}

/// Rate-limited, version-pinned HTTP fetcher.
pub struct Fetcher {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
    limiter: DirectLimiter,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl Fetcher {
    pub fn new(config: &UpstreamConfig) -> Result<Fetcher> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            VERSION_HEADER,
            HeaderValue::from_str(&config.api_version)
                .map_err(|e| Error::Config(format!("invalid api_version: {e}")))?,
        );

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("cannot build HTTP client: {e}")))?;

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::Config(format!("invalid base_url: {e}")))?;

        let rate = NonZeroU32::new(config.rate_limit.max(1)).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.burst.max(1)).unwrap_or(NonZeroU32::MIN);
        let limiter = RateLimiter::direct(Quota::per_second(rate).allow_burst(burst));

        Ok(Fetcher {
            http,
            base_url,
            token: config.token.clone(),
            limiter,
            retry: RetryPolicy::default(),
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Install a cancellation token; cancelled fetches abort the in-flight
    /// request and surface [`Error::Cancelled`].
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn build_url(&self, path: &str, params: &[(String, String)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| Error::Config(format!("invalid path {path}: {e}")))?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// GET a single resource or the first page of a listing.
    pub async fn get_value(&self, path: &str, params: &[(String, String)]) -> Result<Value> {
        let url = self.build_url(path, params)?;
        self.get_url(url).await
    }

    /// First page of a listing; folds bare-array responses into the
    /// envelope shape.
    pub async fn first_page(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<PageEnvelope> {
        let value = self.get_value(path, params).await?;
        PageEnvelope::from_value(value, path)
    }

    /// Blocking mode: drain the whole cursor chain before returning.
    pub async fn fetch_all(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<(u64, Vec<Value>)> {
        let mut envelope = self.first_page(path, params).await?;
        let count = envelope.count;
        let mut results = std::mem::take(&mut envelope.results);
        let mut next = envelope.next;
        while let Some(url) = next {
            let mut page = self.next_page(&url).await?;
            results.append(&mut page.results);
            next = page.next;
        }
        if results.len() as u64 != count {
            tracing::warn!(
                path,
                declared = count,
                received = results.len(),
                "upstream truncated listing"
            );
        }
        Ok((count, results))
    }

    /// One GET with rate limiting, cancellation and the retry policy.
    async fn get_url(&self, url: Url) -> Result<Value> {
        let path = url.path().to_string();
        let mut attempt = 0u32;
        let mut last_status: Option<u16> = None;

        loop {
            attempt += 1;
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            self.limiter.until_ready().await;

            tracing::debug!(url = %url, attempt, "GET");

            let mut request = self.http.get(url.clone());
            if let Some(token) = &self.token {
                request = request.header(AUTHORIZATION, format!("Token {token}"));
            }

            let response = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(Error::Cancelled),
                r = request.send() => r,
            };

            match response {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<Value>().await.map_err(|e| Error::WireError {
                            path: path.clone(),
                            cause: format!("invalid JSON body: {e}"),
                        });
                    }
                    if status == StatusCode::NOT_FOUND {
                        return Err(Error::NotFound(path));
                    }
                    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                        last_status = Some(status.as_u16());
                        tracing::warn!(url = %url, status = status.as_u16(), attempt, "retryable upstream status");
                    } else {
                        let body = response.text().await.unwrap_or_default();
                        return Err(Error::UpstreamClientError {
                            status: status.as_u16(),
                            body,
                        });
                    }
                }
                Err(e) if e.is_timeout() => return Err(Error::UpstreamTimeout),
                Err(e) => {
                    last_status = None;
                    tracing::warn!(url = %url, error = %e, attempt, "transport error");
                }
            }

            if attempt >= self.retry.max_attempts {
                return Err(Error::UpstreamUnavailable {
                    attempts: attempt,
                    last_status,
                });
            }

            let delay = self.retry.delay_for(attempt);
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

#[async_trait]
impl PageSource for Fetcher {
    async fn next_page(&self, url: &str) -> Result<PageEnvelope> {
        let url = Url::parse(url)
            .map_err(|e| Error::Config(format!("invalid pagination URL {url}: {e}")))?;
        let path = url.path().to_string();
        let value = self.get_url(url).await?;
        PageEnvelope::from_value(value, &path)
    }
}

#[async_trait]
impl DetailSource for Fetcher {
    async fn detail(&self, event: &str, resource: &str, id: &str) -> Result<Value> {
        let path = format!("/api/events/{event}/{resource}/{id}/");
        self.get_value(&path, &[]).await
    }

    async fn list_all(
        &self,
        event: &str,
        resource: &str,
        params: &[(String, String)],
    ) -> Result<Vec<Value>> {
        let path = format!("/api/events/{event}/{resource}/");
        let (_, results) = self.fetch_all(&path, params).await?;
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> UpstreamConfig {
        UpstreamConfig {
            base_url: "https://cfp.example.org".to_string(),
            token: Some("secret".to_string()),
            api_version: "v1".to_string(),
            timeout_secs: 60,
            rate_limit: 2,
            burst: 5,
        }
    }

    #[test]
    fn test_build_url_with_params() {
        let fetcher = Fetcher::new(&test_config()).unwrap();
        let url = fetcher
            .build_url(
                "/api/events/pycon-2026/submissions/",
                &[
                    ("questions".to_string(), "all".to_string()),
                    ("state".to_string(), "submitted".to_string()),
                ],
            )
            .unwrap();
        assert_eq!(url.path(), "/api/events/pycon-2026/submissions/");
        assert_eq!(url.query(), Some("questions=all&state=submitted"));
    }

    #[test]
    fn test_envelope_from_array_response() {
        let value = serde_json::json!([{"code": "A"}, {"code": "B"}]);
        let envelope = PageEnvelope::from_value(value, "/api/test/").unwrap();
        assert_eq!(envelope.count, 2);
        assert!(envelope.next.is_none());
    }

    #[test]
    fn test_envelope_from_object_response() {
        let value = serde_json::json!({
            "count": 2,
            "next": "https://cfp.example.org/api/x/?page=2",
            "previous": null,
            "results": [{"code": "A"}]
        });
        let envelope = PageEnvelope::from_value(value, "/api/x/").unwrap();
        assert_eq!(envelope.count, 2);
        assert_eq!(envelope.results.len(), 1);
        assert!(envelope.next.is_some());
    }

    #[test]
    fn test_envelope_rejects_scalar() {
        let err = PageEnvelope::from_value(serde_json::json!(42), "/api/x/").unwrap_err();
        assert!(matches!(err, Error::WireError { .. }));
    }

    #[test]
    fn test_retry_delay_grows_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(800),
        };
        // Delay for attempt N lies in [step/2, step] where step is the
        // capped exponential.
        let d1 = policy.delay_for(1);
        assert!(d1 >= Duration::from_millis(50) && d1 <= Duration::from_millis(101));
        let d4 = policy.delay_for(4);
        assert!(d4 >= Duration::from_millis(400) && d4 <= Duration::from_millis(801));
        // Far past the cap the delay stays bounded.
        let d16 = policy.delay_for(16);
        assert!(d16 <= Duration::from_millis(801));
    }

    #[tokio::test]
    async fn test_rate_limiter_spacing() {
        let mut config = test_config();
        config.rate_limit = 2;
        config.burst = 1;
        let fetcher = Fetcher::new(&config).unwrap();

        let start = std::time::Instant::now();
        fetcher.limiter.until_ready().await;
        fetcher.limiter.until_ready().await;
        fetcher.limiter.until_ready().await;
        let elapsed = start.elapsed();

        // 2 req/s with burst 1: third permit needs ~1s of replenishment.
        assert!(
            elapsed >= Duration::from_millis(900),
            "expected throttling, got {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_request() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let fetcher = Fetcher::new(&test_config()).unwrap().with_cancel(cancel);
        let err = fetcher.get_value("/api/me", &[]).await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
