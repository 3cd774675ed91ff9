use chrono::{ DateTime, Utc };
use std::time::Duration;
use tokio::sync::Notify;

/// Waits for a delay or shutdown signal. Returns true when shutdown fired.
pub async fn check_shutdown_or_delay(shutdown: &Notify, duration: Duration) -> bool {
    if crate::global::is_shutdown_requested() {
        return true;
    }
    tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        _ = shutdown.notified() => true,
    }
}

/// Format a duration (from Option<DateTime<Utc>>) as a human-readable age string (d h m s)
pub fn format_age_string(since: Option<DateTime<Utc>>) -> String {
    if let Some(dt) = since {
        let now = Utc::now();
        let mut seconds = if now > dt { (now - dt).num_seconds() } else { 0 };
        let days = seconds / 86_400;
        seconds %= 86_400;
        let hours = seconds / 3_600;
        seconds %= 3_600;
        let minutes = seconds / 60;
        seconds %= 60;
        let mut parts = Vec::new();
        if days > 0 {
            parts.push(format!("{}d", days));
        }
        if hours > 0 {
            parts.push(format!("{}h", hours));
        }
        if minutes > 0 {
            parts.push(format!("{}m", minutes));
        }
        if seconds > 0 || parts.is_empty() {
            parts.push(format!("{}s", seconds));
        }
        parts.join(" ")
    } else {
        "unknown".to_string()
    }
}

/// Millisecond epoch timestamps from the backend -> UTC datetime
pub fn millis_to_datetime(millis: Option<i64>) -> Option<DateTime<Utc>> {
    millis.and_then(DateTime::<Utc>::from_timestamp_millis)
}

pub fn format_usd(value: f64) -> String {
    if value < 0.0 {
        format!("-${:.2}", value.abs())
    } else {
        format!("${:.2}", value)
    }
}

pub fn format_signed_usd(value: f64) -> String {
    if value >= 0.0 {
        format!("+${:.2}", value)
    } else {
        format!("-${:.2}", value.abs())
    }
}

pub fn format_pct(value: f64) -> String {
    format!("{:.2}%", value)
}

/// Exchange API keys are 64-character alphanumeric strings
pub fn is_valid_api_key(key: &str) -> bool {
    key.len() == 64 && key.chars().all(|c| c.is_ascii_alphanumeric())
}
