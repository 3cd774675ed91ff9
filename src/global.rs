use chrono::{ DateTime, Utc };
use once_cell::sync::Lazy;
use std::sync::RwLock;
use std::sync::atomic::{ AtomicBool, Ordering };
use tokio::sync::Notify;

use crate::types::{ BotStatus, DashboardData, Position };

/// Startup timestamp, used for uptime display
pub static STARTUP_TIME: Lazy<DateTime<Utc>> = Lazy::new(|| Utc::now());

/// Shutdown signal shared by every background loop
pub static SHUTDOWN: Lazy<Notify> = Lazy::new(Notify::new);

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

pub fn request_shutdown() {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
    SHUTDOWN.notify_waiters();
}

pub fn is_shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
}

/// Latest server state as fetched by the poller and action re-syncs.
/// Server state is opaque here - consumed and redrawn, never mutated locally.
#[derive(Debug, Clone, Default)]
pub struct DashboardSnapshot {
    pub dashboard: Option<DashboardData>,
    pub positions: Option<Vec<Position>>,
    pub bot_status: Option<BotStatus>,
    pub last_update: Option<DateTime<Utc>>,
}

pub static SNAPSHOT: Lazy<RwLock<DashboardSnapshot>> =
    Lazy::new(|| RwLock::new(DashboardSnapshot::default()));

pub fn update_dashboard(data: DashboardData) {
    if let Ok(mut snapshot) = SNAPSHOT.write() {
        snapshot.bot_status = Some(data.bot_status.clone());
        snapshot.dashboard = Some(data);
        snapshot.last_update = Some(Utc::now());
    }
}

pub fn update_positions(positions: Vec<Position>) {
    if let Ok(mut snapshot) = SNAPSHOT.write() {
        snapshot.positions = Some(positions);
        snapshot.last_update = Some(Utc::now());
    }
}

pub fn update_bot_status(status: BotStatus) {
    if let Ok(mut snapshot) = SNAPSHOT.write() {
        snapshot.bot_status = Some(status);
        snapshot.last_update = Some(Utc::now());
    }
}

pub fn get_snapshot() -> DashboardSnapshot {
    match SNAPSHOT.read() {
        Ok(snapshot) => snapshot.clone(),
        Err(_) => DashboardSnapshot::default(),
    }
}
