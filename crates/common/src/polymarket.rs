use crate::types::{ActivityOrder, ActivityRecord, ApiPosition, ApiTrade};
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Errors from a single Data API request. Callers decide whether a failure is
/// fatal; the forensics path folds every variant into a fallback value.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid request url: {0}")]
    Url(String),
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("upstream returned HTTP {status}")]
    Status { status: u16 },
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("request failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Status {
                status: status.as_u16(),
            }
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Low-cardinality label for metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    Timeout,
    Connect,
    RateLimited,
    Http4xx,
    Http5xx,
    Decode,
    Other,
}

impl ApiErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::RateLimited => "rate_limited",
            Self::Http4xx => "http_4xx",
            Self::Http5xx => "http_5xx",
            Self::Decode => "decode",
            Self::Other => "other",
        }
    }
}

impl ApiError {
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            Self::Timeout => ApiErrorKind::Timeout,
            Self::Connect(_) => ApiErrorKind::Connect,
            Self::Status { status: 429 } => ApiErrorKind::RateLimited,
            Self::Status { status } if (400..500).contains(status) => ApiErrorKind::Http4xx,
            Self::Status { status } if *status >= 500 => ApiErrorKind::Http5xx,
            Self::Decode(_) => ApiErrorKind::Decode,
            Self::Url(_) | Self::Status { .. } | Self::Transport(_) => ApiErrorKind::Other,
        }
    }
}

/// Query for `/trades`: recent taker trades at or above a cash size.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeQuery {
    pub min_spend_usd: f64,
    pub limit: u32,
}

/// Query for one wallet's `/activity` page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityQuery {
    pub limit: u32,
    pub order: ActivityOrder,
}

/// Polymarket Data API client. One instance (and one connection pool) is
/// shared read-only by every concurrent request of a scan.
pub struct PolymarketClient {
    data_api_url: String,
    client: reqwest::Client,
}

impl PolymarketClient {
    /// `request_timeout` bounds each request end to end.
    pub fn new(data_api_url: &str, request_timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self::with_client(data_api_url, client))
    }

    pub fn with_client(data_api_url: &str, client: reqwest::Client) -> Self {
        Self {
            data_api_url: data_api_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn data_api_url(&self) -> &str {
        &self.data_api_url
    }

    pub fn trades_url(&self, query: &TradeQuery) -> Result<Url, ApiError> {
        let mut url = parse_url(&format!("{}/trades", self.data_api_url))?;
        url.query_pairs_mut()
            .append_pair("filterType", "CASH")
            .append_pair("filterAmount", &query.min_spend_usd.to_string())
            .append_pair("limit", &query.limit.to_string())
            .append_pair("takerOnly", "true");
        Ok(url)
    }

    pub fn activity_url(&self, user: &str, query: &ActivityQuery) -> Result<Url, ApiError> {
        let mut url = parse_url(&format!("{}/activity", self.data_api_url))?;
        url.query_pairs_mut()
            .append_pair("user", user)
            .append_pair("sortBy", "TIMESTAMP")
            .append_pair("sortDirection", query.order.as_str())
            .append_pair("limit", &query.limit.to_string());
        Ok(url)
    }

    pub fn positions_url(&self, user: &str) -> Result<Url, ApiError> {
        let mut url = parse_url(&format!("{}/positions", self.data_api_url))?;
        url.query_pairs_mut().append_pair("user", user);
        Ok(url)
    }

    pub async fn fetch_trades(&self, query: &TradeQuery) -> Result<Vec<ApiTrade>, ApiError> {
        let url = self.trades_url(query)?;
        self.get_json(url).await
    }

    /// Exactly one request: first page only, no retry.
    pub async fn fetch_activity(
        &self,
        user: &str,
        query: &ActivityQuery,
    ) -> Result<Vec<ActivityRecord>, ApiError> {
        let url = self.activity_url(user, query)?;
        self.get_json(url).await
    }

    pub async fn fetch_positions(&self, user: &str) -> Result<Vec<ApiPosition>, ApiError> {
        let url = self.positions_url(user)?;
        self.get_json(url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        debug!(url = %url, "data api request");
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
            });
        }
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn parse_url(raw: &str) -> Result<Url, ApiError> {
    Url::parse(raw).map_err(|e| ApiError::Url(e.to_string()))
}
