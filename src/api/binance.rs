use crate::models::Kline;
use anyhow::{Context, Result};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;

const BINANCE_FAPI_BASE: &str = "https://fapi.binance.com";
const RATE_LIMIT_RPM: u32 = 120; // Well under the futures weight budget
const MAX_RETRIES: u32 = 3;

// Type alias for the rate limiter to simplify signatures
type BinanceRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Raw kline row exactly as the USD-M futures API returns it: a
/// 12-element array, prices and volumes as decimal strings
#[allow(dead_code)]
#[derive(Debug, Deserialize)]
struct RawKline(
    i64,    // open time (ms)
    String, // open
    String, // high
    String, // low
    String, // close
    String, // volume
    i64,    // close time (ms)
    String, // quote asset volume
    u64,    // number of trades
    String, // taker buy base volume
    String, // taker buy quote volume
    String, // ignore
);

impl From<RawKline> for Kline {
    fn from(raw: RawKline) -> Self {
        Self {
            open_time: raw.0,
            open: raw.1,
            high: raw.2,
            low: raw.3,
            close: raw.4,
            volume: raw.5,
        }
    }
}

/// Binance USD-M futures klines client with rate limiting
///
/// The klines endpoint is public, so no API key is involved. This
/// struct is cloneable to allow sharing across async tasks; all clones
/// share the same rate limiter.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
    rate_limiter: Arc<BinanceRateLimiter>,
}

impl BinanceClient {
    /// Create a client against the production Binance futures API
    pub fn new() -> Result<Self> {
        Self::with_base_url(BINANCE_FAPI_BASE.to_string())
    }

    /// Create a client against a custom base URL (used by tests)
    pub fn with_base_url(base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        let quota = Quota::per_minute(NonZeroU32::new(RATE_LIMIT_RPM).unwrap());
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self {
            client,
            base_url,
            rate_limiter,
        })
    }

    /// Fetch minute candles for a closed time window
    ///
    /// # Arguments
    /// * `symbol` - Futures pair, e.g. "XRPUSDT"
    /// * `interval` - Candle interval, e.g. "1m"
    /// * `start_time` / `end_time` - Window bounds in epoch ms, inclusive
    /// * `limit` - Max rows per request (the API caps this at 1500)
    pub async fn fetch_klines(
        &self,
        symbol: &str,
        interval: &str,
        start_time: i64,
        end_time: i64,
        limit: u32,
    ) -> Result<Vec<Kline>> {
        let url = format!(
            "{}/fapi/v1/klines?symbol={}&interval={}&startTime={}&endTime={}&limit={}",
            self.base_url, symbol, interval, start_time, end_time, limit
        );

        tracing::debug!("Fetching klines: {} {} [{}, {}]", symbol, interval, start_time, end_time);

        let response = self.make_request(&url).await?;

        let raw: Vec<RawKline> = response
            .json()
            .await
            .context("Failed to parse klines response")?;

        let klines: Vec<Kline> = raw.into_iter().map(Kline::from).collect();

        tracing::debug!("Fetched {} klines for {}", klines.len(), symbol);

        Ok(klines)
    }

    /// Make a rate-limited API request with retry logic
    async fn make_request(&self, url: &str) -> Result<reqwest::Response> {
        for attempt in 1..=MAX_RETRIES {
            // Wait for rate limiter
            self.rate_limiter.until_ready().await;

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response);
                    }

                    // Handle rate limit errors
                    if status.as_u16() == 429 {
                        let backoff_secs = 2u64.pow(attempt);
                        tracing::warn!(
                            "Rate limited by Binance (429), backing off for {}s (attempt {}/{})",
                            backoff_secs,
                            attempt,
                            MAX_RETRIES
                        );
                        tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                        continue;
                    }

                    // Handle server errors (5xx)
                    if status.is_server_error() {
                        let backoff_secs = 2u64.pow(attempt);
                        tracing::warn!(
                            "Server error {} from Binance, retrying in {}s (attempt {}/{})",
                            status,
                            backoff_secs,
                            attempt,
                            MAX_RETRIES
                        );
                        tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                        continue;
                    }

                    // Other errors (4xx) - don't retry
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    anyhow::bail!("Binance API error ({}): {}", status, error_text);
                }
                Err(e) if attempt < MAX_RETRIES => {
                    let backoff_secs = 2u64.pow(attempt);
                    tracing::warn!(
                        "Network error: {}, retrying in {}s (attempt {}/{})",
                        e,
                        backoff_secs,
                        attempt,
                        MAX_RETRIES
                    );
                    tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                }
                Err(e) => anyhow::bail!("Network error after {} retries: {}", MAX_RETRIES, e),
            }
        }

        anyhow::bail!("Failed after {} retries", MAX_RETRIES)
    }
}
