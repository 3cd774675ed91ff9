/// Startup and orchestration.
///
/// Sign in, take an initial snapshot (with the degraded fallback chain),
/// render once, then hand control to the poller and the interactive
/// console until quit or Ctrl+C.
use anyhow::{ Context, Result };
use std::sync::Arc;

use crate::api::ApiClient;
use crate::arguments;
use crate::auth::{ AuthSession, TokenProvider };
use crate::config::Config;
use crate::console::Console;
use crate::global;
use crate::logger::{ self, LogTag };
use crate::poller::{ self, StatusPoller };
use crate::render;
use crate::types::DashboardData;

pub async fn run() -> Result<()> {
    logger::header("starting");
    arguments::print_debug_info();

    let config_path = arguments::get_config_path();
    let config = Config::load(&config_path)?;
    logger::info(LogTag::Config, &format!("⚙️ Config loaded from {}", config_path));

    let session = Arc::new(AuthSession::new(&config.firebase.api_key));
    session
        .sign_in(&config.firebase.email, &config.firebase.password)
        .await
        .context("Firebase sign-in failed")?;
    session.start_refresh_loop(config.polling.token_refresh_minutes).await;

    let client = Arc::new(
        ApiClient::new(
            &config.backend.base_url,
            Arc::clone(&session),
            config.backend.request_timeout_secs,
        )
        .context("Failed to build HTTP client")?,
    );

    initial_load(&client).await;
    println!("{}", render::render_dashboard(&global::get_snapshot()));

    if arguments::is_once_mode() {
        session.sign_out().await;
        return Ok(());
    }

    ctrlc
        ::set_handler(|| {
            global::request_shutdown();
        })
        .context("Failed to install Ctrl+C handler")?;

    let poller = StatusPoller::new();
    poller.start(Arc::clone(&client), &config.polling);

    let mut console = Console::new(Arc::clone(&client), Arc::clone(&session), &config);
    console.run().await;

    logger::separator();
    logger::info(LogTag::System, "🛑 Shutting down");
    global::request_shutdown();
    poller.stop();
    session.sign_out().await;
    Ok(())
}

/// Initial snapshot with the degraded fallback chain: the aggregate
/// endpoint first, then individual profile/stats fetches, and finally an
/// all-defaults placeholder so the first render always succeeds.
async fn initial_load<P: TokenProvider>(client: &ApiClient<P>) {
    match client.get_dashboard_data().await {
        Ok(data) => {
            global::update_dashboard(data);
        }
        Err(e) => {
            logger::warning(
                LogTag::Api,
                &format!("⚠️ Aggregate dashboard fetch failed, trying piecewise: {}", e),
            );

            let mut partial = DashboardData::default();
            let mut recovered = false;
            match client.get_profile().await {
                Ok(profile) => {
                    partial.profile = profile;
                    recovered = true;
                }
                Err(e) => logger::warning(LogTag::Api, &format!("⚠️ Profile fetch failed: {}", e)),
            }
            match client.get_stats().await {
                Ok(stats) => {
                    partial.stats = stats;
                    recovered = true;
                }
                Err(e) => logger::warning(LogTag::Api, &format!("⚠️ Stats fetch failed: {}", e)),
            }

            if recovered {
                global::update_dashboard(partial);
            } else {
                logger::warning(
                    LogTag::Render,
                    "⚠️ No server data available, rendering placeholder dashboard",
                );
            }
        }
    }

    poller::poll_bot_status(client).await;
    poller::poll_positions(client).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testkit::{ lock_global_state, scripted_server, static_provider };

    #[tokio::test]
    async fn test_initial_load_falls_back_to_profile_and_stats() {
        let _state = lock_global_state();

        // Aggregate endpoint is down; the narrower fetches still work
        let base = scripted_server(vec![
            (500, r#"{"detail": "internal error"}"#),
            (200, r#"{"email": "trader@ezyago.com", "full_name": "Ayşe Demir"}"#),
            (200, r#"{"totalTrades": 42, "totalPnl": 12.5}"#),
        ])
        .await;
        let client = ApiClient::new(&base, static_provider(), 5).unwrap();

        initial_load(&client).await;

        let snapshot = global::get_snapshot();
        let dashboard = snapshot.dashboard.expect("fallback data recorded");
        assert_eq!(dashboard.profile.email.as_deref(), Some("trader@ezyago.com"));
        assert_eq!(dashboard.stats.total_trades, 42);
        assert!((dashboard.stats.total_pnl - 12.5).abs() < f64::EPSILON);
    }
}
