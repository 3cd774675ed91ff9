/// Firebase session management.
///
/// Sign-in goes through the Identity Toolkit REST API; the session keeps
/// the id token plus refresh token and a background loop swaps the id
/// token before its one-hour expiry. Every API call pulls the current
/// bearer token from here.
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{ Mutex, RwLock };
use tokio::task::JoinHandle;

use crate::errors::{ DashboardError, Result };
use crate::global::SHUTDOWN;
use crate::logger::{ self, LogTag };
use crate::utils::check_shutdown_or_delay;

const SIGN_IN_URL: &str =
    "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword";
const REFRESH_URL: &str = "https://securetoken.googleapis.com/v1/token";

/// Anything that can hand out a bearer token. The API client only talks to
/// this trait, so tests can count refreshes without a live Firebase project.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<String>;
    async fn force_refresh(&self) -> Result<String>;
}

/// signInWithPassword response (camelCase)
#[derive(Debug, Deserialize)]
pub struct SignInResponse {
    #[serde(rename = "idToken")]
    pub id_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
    #[serde(rename = "localId")]
    pub local_id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// securetoken refresh response (snake_case)
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub id_token: String,
    pub refresh_token: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
struct FirebaseErrorBody {
    #[serde(default)]
    error: FirebaseErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct FirebaseErrorDetail {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone)]
struct SessionState {
    uid: String,
    email: String,
    id_token: String,
    refresh_token: String,
}

/// Owned Firebase session. Holds the tokens behind an async RwLock so the
/// refresh loop and API calls never race on a half-updated pair.
pub struct AuthSession {
    http: reqwest::Client,
    api_key: String,
    state: RwLock<Option<SessionState>>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl AuthSession {
    pub fn new(api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.to_string(),
            state: RwLock::new(None),
            refresh_task: Mutex::new(None),
        }
    }

    /// Exchange email/password for a fresh token pair
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<()> {
        let url = format!("{}?key={}", SIGN_IN_URL, self.api_key);
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });

        let response = self.http.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(DashboardError::Auth(firebase_error_message(&text)));
        }

        let parsed: SignInResponse = response.json().await?;
        let mut state = self.state.write().await;
        *state = Some(SessionState {
            uid: parsed.local_id,
            email: parsed.email.unwrap_or_else(|| email.to_string()),
            id_token: parsed.id_token,
            refresh_token: parsed.refresh_token,
        });

        logger::success(LogTag::Auth, &format!("🔑 Signed in as {}", email));
        Ok(())
    }

    pub async fn uid(&self) -> Option<String> {
        self.state.read().await.as_ref().map(|s| s.uid.clone())
    }

    pub async fn email(&self) -> Option<String> {
        self.state.read().await.as_ref().map(|s| s.email.clone())
    }

    pub async fn is_signed_in(&self) -> bool {
        self.state.read().await.is_some()
    }

    /// Background refresh loop. Best-effort: a failed refresh is logged and
    /// retried on the next interval, the session keeps its old tokens.
    pub async fn start_refresh_loop(self: &Arc<Self>, interval_minutes: u64) {
        let session = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let interval = Duration::from_secs(interval_minutes * 60);
            loop {
                if check_shutdown_or_delay(&SHUTDOWN, interval).await {
                    break;
                }
                match session.force_refresh_impl().await {
                    Ok(_) => {
                        logger::debug(LogTag::Auth, "Token refreshed on schedule");
                    }
                    Err(e) => {
                        logger::warning(
                            LogTag::Auth,
                            &format!("⚠️ Scheduled token refresh failed: {}", e),
                        );
                    }
                }
            }
        });

        let mut task = self.refresh_task.lock().await;
        if let Some(old) = task.replace(handle) {
            old.abort();
        }
        logger::info(
            LogTag::Auth,
            &format!("🔄 Token refresh loop started ({}m interval)", interval_minutes),
        );
    }

    async fn force_refresh_impl(&self) -> Result<String> {
        let refresh_token = {
            let state = self.state.read().await;
            match state.as_ref() {
                Some(s) => s.refresh_token.clone(),
                None => {
                    return Err(DashboardError::Auth("no active session".to_string()));
                }
            }
        };

        let url = format!("{}?key={}", REFRESH_URL, self.api_key);
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
        ];

        let response = self.http.post(&url).form(&form).send().await?;
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(DashboardError::Auth(firebase_error_message(&text)));
        }

        let parsed: RefreshResponse = response.json().await?;
        let mut state = self.state.write().await;
        if let Some(s) = state.as_mut() {
            s.id_token = parsed.id_token.clone();
            s.refresh_token = parsed.refresh_token;
            s.uid = parsed.user_id;
        }
        Ok(parsed.id_token)
    }

    /// Drop tokens and stop the refresh loop
    pub async fn sign_out(&self) {
        let mut task = self.refresh_task.lock().await;
        if let Some(handle) = task.take() {
            handle.abort();
        }
        let mut state = self.state.write().await;
        *state = None;
        logger::info(LogTag::Auth, "👋 Signed out");
    }
}

#[async_trait]
impl TokenProvider for AuthSession {
    async fn bearer_token(&self) -> Result<String> {
        let state = self.state.read().await;
        match state.as_ref() {
            Some(s) => Ok(s.id_token.clone()),
            None => Err(DashboardError::Auth("not signed in".to_string())),
        }
    }

    async fn force_refresh(&self) -> Result<String> {
        self.force_refresh_impl().await
    }
}

fn firebase_error_message(body: &str) -> String {
    match serde_json::from_str::<FirebaseErrorBody>(body) {
        Ok(parsed) if !parsed.error.message.is_empty() => parsed.error.message,
        _ => "authentication rejected".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_response_parses_camel_case() {
        let json = r#"{
            "idToken": "id-abc",
            "refreshToken": "refresh-xyz",
            "localId": "uid-123",
            "email": "trader@ezyago.com",
            "expiresIn": "3600"
        }"#;
        let parsed: SignInResponse = serde_json::from_str(json).unwrap();

        assert_eq!(parsed.id_token, "id-abc");
        assert_eq!(parsed.refresh_token, "refresh-xyz");
        assert_eq!(parsed.local_id, "uid-123");
        assert_eq!(parsed.email.as_deref(), Some("trader@ezyago.com"));
    }

    #[test]
    fn test_refresh_response_parses_snake_case() {
        let json = r#"{
            "id_token": "id-new",
            "refresh_token": "refresh-new",
            "user_id": "uid-123",
            "expires_in": "3600",
            "token_type": "Bearer"
        }"#;
        let parsed: RefreshResponse = serde_json::from_str(json).unwrap();

        assert_eq!(parsed.id_token, "id-new");
        assert_eq!(parsed.refresh_token, "refresh-new");
        assert_eq!(parsed.user_id, "uid-123");
    }

    #[test]
    fn test_firebase_error_message_extraction() {
        let body = r#"{"error": {"code": 400, "message": "INVALID_PASSWORD"}}"#;
        assert_eq!(firebase_error_message(body), "INVALID_PASSWORD");
        assert_eq!(firebase_error_message("not json"), "authentication rejected");
    }

    #[tokio::test]
    async fn test_bearer_token_requires_session() {
        let session = AuthSession::new("test-key");
        let err = session.bearer_token().await.unwrap_err();
        assert!(err.is_auth());
    }
}
