/// User-triggered actions.
///
/// Each action family holds a single-flight guard: while a start request
/// is in flight, further starts return Busy instead of stacking requests.
/// Successful mutations re-sync the affected server state into the
/// snapshot, the client never patches the snapshot from its own guess.
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::Mutex;

use crate::api::ApiClient;
use crate::auth::TokenProvider;
use crate::errors::{ DashboardError, Result };
use crate::logger::{ self, LogTag };
use crate::poller;
use crate::types::BotConfig;
use crate::utils::is_valid_api_key;

static IN_FLIGHT: Lazy<Mutex<HashSet<&'static str>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// RAII guard for one action family. Acquire fails while a previous action
/// of the same family has not finished.
struct ActionGuard {
    family: &'static str,
}

impl ActionGuard {
    fn acquire(family: &'static str) -> Option<Self> {
        let mut in_flight = IN_FLIGHT.lock().ok()?;
        if !in_flight.insert(family) {
            return None;
        }
        Some(Self { family })
    }
}

impl Drop for ActionGuard {
    fn drop(&mut self) {
        if let Ok(mut in_flight) = IN_FLIGHT.lock() {
            in_flight.remove(self.family);
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum ActionOutcome {
    /// Action ran; message from the server (or a local summary)
    Completed(String),
    /// User declined the confirmation step, nothing was sent
    Cancelled,
    /// A previous action of the same family is still in flight
    Busy,
}

pub async fn start_bot<P: TokenProvider>(
    client: &ApiClient<P>,
    config: &BotConfig,
) -> Result<ActionOutcome> {
    let _guard = match ActionGuard::acquire("bot") {
        Some(guard) => guard,
        None => return Ok(ActionOutcome::Busy),
    };

    logger::info(LogTag::Action, &format!("🚀 Starting bot on {}", config.symbol));
    let response = client.start_bot(config).await?;
    if !response.success {
        logger::warning(
            LogTag::Action,
            &format!("⚠️ Start rejected: {}", response.message.clone().unwrap_or_default()),
        );
    }

    poller::poll_bot_status(client).await;
    Ok(ActionOutcome::Completed(
        response.message.unwrap_or_else(|| "Bot started".to_string()),
    ))
}

pub async fn stop_bot<P: TokenProvider>(client: &ApiClient<P>) -> Result<ActionOutcome> {
    let _guard = match ActionGuard::acquire("bot") {
        Some(guard) => guard,
        None => return Ok(ActionOutcome::Busy),
    };

    logger::info(LogTag::Action, "🛑 Stopping bot");
    let response = client.stop_bot().await?;

    poller::poll_bot_status(client).await;
    Ok(ActionOutcome::Completed(
        response.message.unwrap_or_else(|| "Bot stopped".to_string()),
    ))
}

/// Closes an open position. `confirmed` must already be true: confirmation
/// happens in the console before any network traffic, an unconfirmed call
/// is a no-op.
pub async fn close_position<P: TokenProvider>(
    client: &ApiClient<P>,
    symbol: &str,
    position_side: &str,
    confirmed: bool,
) -> Result<ActionOutcome> {
    if !confirmed {
        return Ok(ActionOutcome::Cancelled);
    }

    let _guard = match ActionGuard::acquire("close-position") {
        Some(guard) => guard,
        None => return Ok(ActionOutcome::Busy),
    };

    logger::info(LogTag::Action, &format!("✂️ Closing {} {}", position_side, symbol));
    let response = client.close_position(symbol, position_side).await?;

    // Position list and account figures both changed server-side. Re-sync
    // goes through the sequenced poll fetches so an in-flight poll response
    // issued before the action cannot overwrite this newer data.
    poller::poll_positions(client).await;
    poller::poll_dashboard(client).await;

    Ok(ActionOutcome::Completed(
        response.message.unwrap_or_else(|| format!("Position {} closed", symbol)),
    ))
}

pub async fn save_api_keys<P: TokenProvider>(
    client: &ApiClient<P>,
    api_key: &str,
    api_secret: &str,
    use_testnet: bool,
) -> Result<ActionOutcome> {
    if !is_valid_api_key(api_key) {
        return Err(DashboardError::Validation(
            "API key must be 64 alphanumeric characters".to_string(),
        ));
    }
    if !is_valid_api_key(api_secret) {
        return Err(DashboardError::Validation(
            "API secret must be 64 alphanumeric characters".to_string(),
        ));
    }

    let _guard = match ActionGuard::acquire("api-keys") {
        Some(guard) => guard,
        None => return Ok(ActionOutcome::Busy),
    };

    logger::info(LogTag::Action, "🔑 Saving exchange API keys");
    let response = client.save_api_keys(api_key, api_secret, use_testnet).await?;

    // Read the keys back so the confirmation shows what the server stored
    match client.get_api_info().await {
        Ok(info) if info.has_keys => {
            logger::info(
                LogTag::Action,
                &format!("🔑 Stored key: {}", info.masked_api_key.unwrap_or_default()),
            );
        }
        Ok(_) => logger::warning(LogTag::Action, "⚠️ Server reports no keys after save"),
        Err(e) => logger::warning(LogTag::Action, &format!("⚠️ Key readback failed: {}", e)),
    }

    poller::poll_dashboard(client).await;
    Ok(ActionOutcome::Completed(
        response.message.unwrap_or_else(|| "API keys saved".to_string()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testkit::{ lock_global_state, scripted_server, static_provider };
    use crate::auth::TokenProvider;
    use crate::global;
    use crate::sequencer::SEQUENCERS;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{ AtomicUsize, Ordering };

    struct PanicProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenProvider for PanicProvider {
        async fn bearer_token(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(DashboardError::Auth("no session in test".to_string()))
        }

        async fn force_refresh(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(DashboardError::Auth("no session in test".to_string()))
        }
    }

    #[tokio::test]
    async fn test_unconfirmed_close_makes_no_network_calls() {
        let provider = Arc::new(PanicProvider { calls: AtomicUsize::new(0) });
        let client = ApiClient::new("http://127.0.0.1:1", Arc::clone(&provider), 1).unwrap();

        let outcome = close_position(&client, "BTCUSDT", "LONG", false).await.unwrap();

        assert_eq!(outcome, ActionOutcome::Cancelled);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_guard_is_single_flight_per_family() {
        let first = ActionGuard::acquire("test-family").unwrap();
        assert!(ActionGuard::acquire("test-family").is_none());

        // Different family is unaffected
        let other = ActionGuard::acquire("test-family-b");
        assert!(other.is_some());

        drop(first);
        assert!(ActionGuard::acquire("test-family").is_some());
    }

    #[tokio::test]
    async fn test_invalid_api_keys_rejected_before_network() {
        let provider = Arc::new(PanicProvider { calls: AtomicUsize::new(0) });
        let client = ApiClient::new("http://127.0.0.1:1", Arc::clone(&provider), 1).unwrap();

        let err = save_api_keys(&client, "too-short", &"a".repeat(64), false)
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::Validation(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stop_resync_supersedes_inflight_poll() {
        let _state = lock_global_state();

        let base = scripted_server(vec![
            (200, r#"{"success": true, "message": "Bot stopped"}"#),
            (200, r#"{"success": true, "status": {"is_running": false}}"#),
        ])
        .await;
        let client = ApiClient::new(&base, static_provider(), 5).unwrap();

        // A status poll already in flight when the user hits stop
        let inflight_poll = SEQUENCERS.bot_status.issue();

        let outcome = stop_bot(&client).await.unwrap();
        assert!(matches!(outcome, ActionOutcome::Completed(_)));

        // The re-sync took a newer sequence number, so the slow poll reply
        // is stale on arrival and must be discarded instead of flipping the
        // bot back to running
        assert!(!SEQUENCERS.bot_status.is_current(inflight_poll));
        let snapshot = global::get_snapshot();
        assert_eq!(snapshot.bot_status.map(|s| s.is_running), Some(false));
    }
}
