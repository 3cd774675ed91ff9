/// Firebase Realtime Database writes.
///
/// Support messages and payment notifications bypass the backend API and
/// go straight to the realtime store, authenticated with the session id
/// token. Timestamps use the server-side sentinel so client clock skew
/// never leaks into the records.
use serde_json::{ json, Value };
use uuid::Uuid;

use crate::errors::{ DashboardError, Result };
use crate::logger::{ self, LogTag };

pub struct RealtimeStore {
    http: reqwest::Client,
    base_url: String,
}

fn server_timestamp() -> Value {
    json!({ ".sv": "timestamp" })
}

impl RealtimeStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn push(&self, path: &str, token: &str, record: &Value) -> Result<()> {
        let url = format!("{}/{}.json?auth={}", self.base_url, path, token);
        let response = self.http.post(&url).json(record).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DashboardError::Http { status: status.as_u16(), body });
        }
        Ok(())
    }

    pub async fn push_support_message(
        &self,
        token: &str,
        uid: &str,
        email: &str,
        subject: &str,
        message: &str,
    ) -> Result<()> {
        let record = json!({
            "id": Uuid::new_v4().to_string(),
            "user_id": uid,
            "email": email,
            "subject": subject,
            "message": message,
            "status": "open",
            "created_at": server_timestamp(),
        });
        self.push("support_messages", token, &record).await?;
        logger::success(LogTag::Support, "📨 Support message sent");
        Ok(())
    }

    pub async fn push_payment_notification(
        &self,
        token: &str,
        uid: &str,
        email: &str,
        plan: &str,
        transaction_ref: &str,
    ) -> Result<()> {
        let record = json!({
            "id": Uuid::new_v4().to_string(),
            "user_id": uid,
            "email": email,
            "plan": plan,
            "transaction_ref": transaction_ref,
            "status": "pending",
            "created_at": server_timestamp(),
        });
        self.push("payment_notifications", token, &record).await?;
        logger::success(LogTag::Support, "💳 Payment notification sent");
        Ok(())
    }
}
