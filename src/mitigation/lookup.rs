// Mitigation lookup: fetches flavor content for enforcement announcements.
//
// The ImageLookup trait hides the provider. GiphyLookup asks Giphy's random
// endpoint for a GIF matching a tag; NoopLookup is used when no API key is
// configured. `resolve_mitigation` is the containment boundary: whatever the
// provider does (error, slow response, rate limit) it returns postable text.
//
// API docs: https://developers.giphy.com/docs/api/endpoint#random

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::time::Duration;
use tracing::{debug, warn};

use super::rate_limiter::RateLimiter;
use crate::router::responses::MitigationNotice;

/// Default public Giphy API endpoint.
pub const DEFAULT_GIPHY_API_URL: &str = "https://api.giphy.com";

/// Shown in place of an image when the lookup fails.
pub const FALLBACK_TEXT: &str = "(Dominator feed unavailable. Proceed on the Sibyl System's judgment.)";

/// Trait for fetching a piece of flavor content (an image URL) for a query.
#[async_trait]
pub trait ImageLookup: Send + Sync {
    async fn lookup(&self, query: &str) -> Result<String>;
}

/// Lookup used when image lookups are disabled. Always fails, so callers
/// fall back to plain text.
pub struct NoopLookup;

#[async_trait]
impl ImageLookup for NoopLookup {
    async fn lookup(&self, _query: &str) -> Result<String> {
        anyhow::bail!("Image lookup disabled (GIPHY_API_KEY not set)")
    }
}

/// Giphy random-GIF lookup.
pub struct GiphyLookup {
    client: Client,
    api_key: String,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl GiphyLookup {
    pub fn new(api_key: String, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent("sibyl/0.1 (psycho-pass)")
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            // Free beta keys allow roughly 100 calls per hour
            rate_limiter: RateLimiter::new(Duration::from_secs(36)),
        })
    }
}

#[async_trait]
impl ImageLookup for GiphyLookup {
    async fn lookup(&self, query: &str) -> Result<String> {
        if !self.rate_limiter.try_acquire().await {
            let wait = self.rate_limiter.wait_time().await;
            anyhow::bail!("Giphy lookup rate limited for another {:?}", wait);
        }

        let url = format!("{}/v1/gifs/random", self.base_url);
        debug!(query = query, "Giphy random lookup");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("tag", query),
                ("rating", "pg-13"),
            ])
            .send()
            .await
            .context("Failed to call Giphy API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Giphy API returned {}: {}", status, body);
        }

        let result: GiphyRandomResponse = response
            .json()
            .await
            .context("Failed to parse Giphy API response")?;

        extract_image_url(&result).context("Giphy response had no image")
    }
}

/// Build the final announcement for a threshold crossing.
///
/// Never fails and never waits longer than `timeout`. Errors and timeouts
/// are logged and replaced by FALLBACK_TEXT.
pub async fn resolve_mitigation(
    lookup: &dyn ImageLookup,
    notice: &MitigationNotice,
    query: &str,
    timeout: Duration,
) -> String {
    let base = notice.base_text();
    match tokio::time::timeout(timeout, lookup.lookup(query)).await {
        Ok(Ok(url)) => format!("{base}\n{url}"),
        Ok(Err(e)) => {
            warn!(channel = %notice.channel, error = %e, "Mitigation lookup failed");
            format!("{base}\n{FALLBACK_TEXT}")
        }
        Err(_) => {
            warn!(
                channel = %notice.channel,
                timeout_ms = timeout.as_millis() as u64,
                "Mitigation lookup timed out"
            );
            format!("{base}\n{FALLBACK_TEXT}")
        }
    }
}

fn extract_image_url(response: &GiphyRandomResponse) -> Option<String> {
    let data = response.data.as_ref()?;
    data.images
        .as_ref()
        .and_then(|images| images.original.as_ref())
        .map(|original| original.url.clone())
        .or_else(|| data.url.clone())
        .filter(|url| !url.is_empty())
}

// --- Giphy API response types ---

#[derive(Deserialize)]
struct GiphyRandomResponse {
    // Giphy returns `"data": []` instead of an object when nothing matches
    #[serde(default, deserialize_with = "object_or_empty")]
    data: Option<GiphyGif>,
}

#[derive(Deserialize)]
struct GiphyGif {
    url: Option<String>,
    images: Option<GiphyImages>,
}

#[derive(Deserialize)]
struct GiphyImages {
    original: Option<GiphyImage>,
}

#[derive(Deserialize)]
struct GiphyImage {
    url: String,
}

fn object_or_empty<'de, D>(deserializer: D) -> std::result::Result<Option<GiphyGif>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_object() {
        serde_json::from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom)
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::policy::Score;

    struct FixedLookup(&'static str);

    #[async_trait]
    impl ImageLookup for FixedLookup {
        async fn lookup(&self, _query: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct SlowLookup;

    #[async_trait]
    impl ImageLookup for SlowLookup {
        async fn lookup(&self, _query: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("https://example.invalid/late.gif".to_string())
        }
    }

    fn notice() -> MitigationNotice {
        MitigationNotice {
            channel: "C1".into(),
            channel_name: "general".into(),
            score: Score(130.0),
        }
    }

    #[tokio::test]
    async fn test_successful_lookup_appends_url() {
        let lookup = FixedLookup("https://media.giphy.com/dominator.gif");
        let text = resolve_mitigation(&lookup, &notice(), "dominator", Duration::from_secs(1)).await;
        assert!(text.starts_with(&notice().base_text()));
        assert!(text.ends_with("https://media.giphy.com/dominator.gif"));
    }

    #[tokio::test]
    async fn test_failed_lookup_uses_fallback() {
        let text = resolve_mitigation(&NoopLookup, &notice(), "dominator", Duration::from_secs(1)).await;
        assert!(text.ends_with(FALLBACK_TEXT));
    }

    #[tokio::test]
    async fn test_slow_lookup_times_out_to_fallback() {
        let text =
            resolve_mitigation(&SlowLookup, &notice(), "dominator", Duration::from_millis(20)).await;
        assert!(text.ends_with(FALLBACK_TEXT));
    }

    #[test]
    fn test_parse_random_response() {
        let json = r#"{"data":{"url":"https://giphy.com/gifs/x","images":{"original":{"url":"https://media.giphy.com/x.gif"}}}}"#;
        let parsed: GiphyRandomResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            extract_image_url(&parsed).as_deref(),
            Some("https://media.giphy.com/x.gif")
        );
    }

    #[test]
    fn test_parse_empty_random_response() {
        let parsed: GiphyRandomResponse = serde_json::from_str(r#"{"data":[]}"#).unwrap();
        assert_eq!(extract_image_url(&parsed), None);
    }
}
