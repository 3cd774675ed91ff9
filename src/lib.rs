pub mod actions;
pub mod api;
pub mod arguments;
pub mod auth;
pub mod config;
pub mod console;
pub mod errors;
pub mod global;
pub mod logger;
pub mod poller;
pub mod realtime;
pub mod recommendations;
pub mod render;
pub mod run;
pub mod sequencer;
pub mod types;
pub mod utils;

pub use api::ApiClient;
pub use auth::{ AuthSession, TokenProvider };
pub use config::Config;
pub use errors::{ DashboardError, Result };
pub use poller::StatusPoller;
