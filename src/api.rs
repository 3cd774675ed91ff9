/// Authenticated backend client.
///
/// Every request carries the session bearer token. A 401 triggers exactly
/// one forced token refresh and one retry; a second 401 surfaces as an
/// auth error so the caller can drop back to the login flow. Non-2xx
/// responses keep their status and body for display.
use reqwest::{ Method, StatusCode };
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::TokenProvider;
use crate::errors::{ DashboardError, Result };
use crate::logger::{ self, LogTag };
use crate::types::{
    ActionResponse,
    ApiInfo,
    BotConfig,
    BotStatusResponse,
    DashboardData,
    Position,
    Profile,
    Stats,
    TradingPair,
};

/// Decoded response body. JSON when the server says so, raw text otherwise.
#[derive(Debug)]
pub enum ApiPayload {
    Json(Value),
    Text(String),
}

pub struct ApiClient<P: TokenProvider> {
    http: reqwest::Client,
    base_url: String,
    provider: Arc<P>,
}

impl<P: TokenProvider> ApiClient<P> {
    pub fn new(base_url: &str, provider: Arc<P>, timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            provider,
        })
    }

    /// Core request path: token, send, retry-once-on-401, decode
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiPayload> {
        let url = format!("{}{}", self.base_url, path);
        let mut token = self.provider.bearer_token().await?;

        logger::debug(LogTag::Api, &format!("{} {}", method, path));

        let mut response = self.send(&method, &url, &token, body).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            logger::warning(LogTag::Api, &format!("🔒 401 on {}, refreshing token", path));
            token = self.provider.force_refresh().await?;
            response = self.send(&method, &url, &token, body).await?;
            if response.status() == StatusCode::UNAUTHORIZED {
                return Err(DashboardError::Auth(
                    "authentication failed, please login again".to_string(),
                ));
            }
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DashboardError::Http { status: status.as_u16(), body });
        }

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("application/json"))
            .unwrap_or(false);

        if is_json {
            Ok(ApiPayload::Json(response.json().await?))
        } else {
            Ok(ApiPayload::Text(response.text().await.unwrap_or_default()))
        }
    }

    async fn send(
        &self,
        method: &Method,
        url: &str,
        token: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Response> {
        let mut request = self.http.request(method.clone(), url).bearer_auth(token);
        if let Some(json) = body {
            request = request.json(json);
        }
        Ok(request.send().await?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        match self.call(Method::GET, path, None).await? {
            ApiPayload::Json(value) => Ok(serde_json::from_value(value)?),
            ApiPayload::Text(text) => {
                Err(DashboardError::Parse(format!("expected JSON from {}: {}", path, text)))
            }
        }
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        match self.call(Method::POST, path, Some(body)).await? {
            ApiPayload::Json(value) => Ok(serde_json::from_value(value)?),
            ApiPayload::Text(text) => {
                Err(DashboardError::Parse(format!("expected JSON from {}: {}", path, text)))
            }
        }
    }

    // ── Typed endpoints ──────────────────────────────────────────────

    pub async fn get_dashboard_data(&self) -> Result<DashboardData> {
        self.get_json("/api/user/dashboard-data").await
    }

    pub async fn get_profile(&self) -> Result<Profile> {
        self.get_json("/api/user/profile").await
    }

    pub async fn get_stats(&self) -> Result<Stats> {
        self.get_json("/api/user/stats").await
    }

    pub async fn get_positions(&self) -> Result<Vec<Position>> {
        self.get_json("/api/user/positions").await
    }

    pub async fn get_trading_pairs(&self) -> Result<Vec<TradingPair>> {
        self.get_json("/api/bot/trading-pairs").await
    }

    pub async fn get_bot_status(&self) -> Result<BotStatusResponse> {
        self.get_json("/api/bot/status").await
    }

    pub async fn get_api_info(&self) -> Result<ApiInfo> {
        self.get_json("/api/user/api-info").await
    }

    pub async fn start_bot(&self, config: &BotConfig) -> Result<ActionResponse> {
        let body = serde_json::to_value(config)?;
        self.post_json("/api/bot/start", &body).await
    }

    pub async fn stop_bot(&self) -> Result<ActionResponse> {
        self.post_json("/api/bot/stop", &Value::Null).await
    }

    pub async fn close_position(&self, symbol: &str, position_side: &str) -> Result<ActionResponse> {
        let body = serde_json::json!({ "symbol": symbol, "positionSide": position_side });
        self.post_json("/api/user/close-position", &body).await
    }

    pub async fn save_api_keys(
        &self,
        api_key: &str,
        api_secret: &str,
        use_testnet: bool,
    ) -> Result<ActionResponse> {
        let body = serde_json::json!({
            "api_key": api_key,
            "api_secret": api_secret,
            "testnet": use_testnet,
        });
        self.post_json("/api/user/api-keys", &body).await
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{ AtomicUsize, Ordering };

    use super::testkit::{ scripted_server, StaticProvider };

    struct CountingProvider {
        refreshes: AtomicUsize,
    }

    impl CountingProvider {
        fn new() -> Arc<Self> {
            Arc::new(Self { refreshes: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl TokenProvider for CountingProvider {
        async fn bearer_token(&self) -> Result<String> {
            Ok("stale-token".to_string())
        }

        async fn force_refresh(&self) -> Result<String> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            Ok("fresh-token".to_string())
        }
    }

    #[test]
    fn test_client_builds_with_timeout() {
        assert!(ApiClient::new("http://127.0.0.1:1", Arc::new(StaticProvider), 5).is_ok());
    }

    #[tokio::test]
    async fn test_401_triggers_exactly_one_refresh_and_retry() {
        let base = scripted_server(vec![
            (401, r#"{"detail": "expired"}"#),
            (200, r#"{"success": true, "status": {}}"#),
        ])
        .await;

        let provider = CountingProvider::new();
        let client = ApiClient::new(&base, Arc::clone(&provider), 5).unwrap();

        let response = client.get_bot_status().await.unwrap();
        assert!(response.success);
        assert_eq!(provider.refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_401_becomes_auth_error() {
        let base = scripted_server(vec![
            (401, r#"{"detail": "expired"}"#),
            (401, r#"{"detail": "still expired"}"#),
        ])
        .await;

        let provider = CountingProvider::new();
        let client = ApiClient::new(&base, Arc::clone(&provider), 5).unwrap();

        let err = client.get_bot_status().await.unwrap_err();
        assert!(err.is_auth());
        // One refresh, never a second
        assert_eq!(provider.refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_401_error_keeps_status_and_body() {
        let base = scripted_server(vec![(402, r#"{"detail": "subscription expired"}"#)]).await;

        let provider = CountingProvider::new();
        let client = ApiClient::new(&base, Arc::clone(&provider), 5).unwrap();

        let err = client.get_dashboard_data().await.unwrap_err();
        match err {
            DashboardError::Http { status, body } => {
                assert_eq!(status, 402);
                assert!(body.contains("subscription expired"));
            }
            other => panic!("expected Http error, got {:?}", other),
        }
        assert_eq!(provider.refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_parses_typed_payload() {
        let base = scripted_server(vec![(
            200,
            r#"{"profile": {"email": "trader@ezyago.com"}, "stats": {"totalTrades": 7}}"#,
        )])
        .await;

        let provider = CountingProvider::new();
        let client = ApiClient::new(&base, provider, 5).unwrap();

        let data = client.get_dashboard_data().await.unwrap();
        assert_eq!(data.profile.email.as_deref(), Some("trader@ezyago.com"));
        assert_eq!(data.stats.total_trades, 7);
    }
}
