/// Background polling.
///
/// One loop, two cadences: bot status every interval tick, and the full
/// dashboard payload (plus positions) on ticks landing in a wall-clock
/// minute divisible by the dashboard mark. The minute test runs against
/// the clock at tick time, so a tick delayed across a minute boundary
/// resolves against the minute it actually fires in.
///
/// Every fetch is tagged with a per-resource sequence number; a response
/// is dropped when a newer request was issued for that resource while it
/// was in flight.
use chrono::{ Timelike, Utc };
use std::future::Future;
use std::sync::{ Arc, Mutex };
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::api::ApiClient;
use crate::auth::TokenProvider;
use crate::config::PollingConfig;
use crate::global::{ self, SHUTDOWN };
use crate::logger::{ self, LogTag };
use crate::sequencer::SEQUENCERS;
use crate::utils::check_shutdown_or_delay;

pub struct StatusPoller {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl StatusPoller {
    pub fn new() -> Self {
        Self { handle: Mutex::new(None) }
    }

    /// Spawn the polling loop with an arbitrary tick body. `full` is true
    /// on ticks that should refresh the whole dashboard. Starting again
    /// aborts the previous loop first, there is never more than one.
    pub fn start_with<F, Fut>(&self, interval: Duration, minute_mark: u32, mut tick: F)
    where
        F: FnMut(bool) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let task = tokio::spawn(async move {
            loop {
                let full = minute_mark > 0 && Utc::now().minute() % minute_mark == 0;
                tick(full).await;
                if check_shutdown_or_delay(&SHUTDOWN, interval).await {
                    break;
                }
            }
            logger::debug(LogTag::Poller, "Polling loop exited");
        });

        let mut handle = self.handle.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = handle.replace(task) {
            old.abort();
        }
    }

    /// Wire the real tick against the backend client
    pub fn start<P: TokenProvider + 'static>(
        &self,
        client: Arc<ApiClient<P>>,
        polling: &PollingConfig,
    ) {
        let interval = Duration::from_secs(polling.status_interval_secs);
        logger::info(
            LogTag::Poller,
            &format!(
                "📡 Polling started ({}s status, full dashboard at {}m marks)",
                polling.status_interval_secs, polling.dashboard_minute_mark
            ),
        );
        self.start_with(interval, polling.dashboard_minute_mark, move |full| {
            let client = Arc::clone(&client);
            async move {
                poll_bot_status(&client).await;
                if full {
                    poll_dashboard(&client).await;
                    poll_positions(&client).await;
                }
            }
        });
    }

    pub fn stop(&self) {
        let mut handle = self.handle.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(task) = handle.take() {
            task.abort();
            logger::info(LogTag::Poller, "📡 Polling stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        let handle = self.handle.lock().unwrap_or_else(|e| e.into_inner());
        handle.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }
}

impl Default for StatusPoller {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn poll_bot_status<P: TokenProvider>(client: &ApiClient<P>) {
    let seq = SEQUENCERS.bot_status.issue();
    match client.get_bot_status().await {
        Ok(response) => {
            if SEQUENCERS.bot_status.is_current(seq) {
                global::update_bot_status(response.status);
            } else {
                logger::debug(LogTag::Poller, "Stale bot status response dropped");
            }
        }
        Err(e) => logger::warning(LogTag::Poller, &format!("⚠️ Status poll failed: {}", e)),
    }
}

pub async fn poll_dashboard<P: TokenProvider>(client: &ApiClient<P>) {
    let seq = SEQUENCERS.dashboard.issue();
    match client.get_dashboard_data().await {
        Ok(data) => {
            if SEQUENCERS.dashboard.is_current(seq) {
                global::update_dashboard(data);
            } else {
                logger::debug(LogTag::Poller, "Stale dashboard response dropped");
            }
        }
        Err(e) => logger::warning(LogTag::Poller, &format!("⚠️ Dashboard poll failed: {}", e)),
    }
}

pub async fn poll_positions<P: TokenProvider>(client: &ApiClient<P>) {
    let seq = SEQUENCERS.positions.issue();
    match client.get_positions().await {
        Ok(positions) => {
            if SEQUENCERS.positions.is_current(seq) {
                global::update_positions(positions);
            } else {
                logger::debug(LogTag::Poller, "Stale positions response dropped");
            }
        }
        Err(e) => logger::warning(LogTag::Poller, &format!("⚠️ Positions poll failed: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{ AtomicUsize, Ordering };

    #[tokio::test(flavor = "multi_thread")]
    async fn test_restart_replaces_previous_loop() {
        let poller = StatusPoller::new();

        let first = Arc::new(AtomicUsize::new(0));
        let first_clone = Arc::clone(&first);
        poller.start_with(Duration::from_millis(10), 0, move |_| {
            let counter = Arc::clone(&first_clone);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(first.load(Ordering::SeqCst) >= 1);

        let second = Arc::new(AtomicUsize::new(0));
        let second_clone = Arc::clone(&second);
        poller.start_with(Duration::from_millis(10), 0, move |_| {
            let counter = Arc::clone(&second_clone);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(30)).await;
        let frozen = first.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;

        // The first loop was aborted, only the second keeps ticking
        assert_eq!(first.load(Ordering::SeqCst), frozen);
        assert!(second.load(Ordering::SeqCst) >= 2);

        poller.stop();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stop_halts_ticks() {
        let poller = StatusPoller::new();
        let ticks = Arc::new(AtomicUsize::new(0));
        let ticks_clone = Arc::clone(&ticks);

        poller.start_with(Duration::from_millis(10), 0, move |_| {
            let counter = Arc::clone(&ticks_clone);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(30)).await;
        poller.stop();
        assert!(!poller.is_running() || poller.handle.lock().unwrap().is_none());

        let frozen = ticks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), frozen);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_full_flag_follows_minute_mark() {
        let poller = StatusPoller::new();
        let saw_full = Arc::new(AtomicUsize::new(0));
        let saw_full_clone = Arc::clone(&saw_full);

        // minute_mark = 1 means every wall-clock minute matches
        poller.start_with(Duration::from_millis(10), 1, move |full| {
            let counter = Arc::clone(&saw_full_clone);
            async move {
                if full {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        poller.stop();
        assert!(saw_full.load(Ordering::SeqCst) >= 1);
    }
}
