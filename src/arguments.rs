/// Centralized argument handling for Ezyago Console
///
/// Consolidates command-line argument parsing and debug flag checking.
/// Arguments are cached once in a thread-safe singleton so every module can
/// query flags without re-reading the environment.
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Global command-line arguments storage
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Sets the global command-line arguments
/// Used by tests to override the default env::args() collection
pub fn set_cmd_args(args: Vec<String>) {
    if let Ok(mut cmd_args) = CMD_ARGS.lock() {
        *cmd_args = args;
    }
}

/// Gets a copy of the current command-line arguments
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => env::args().collect(),
    }
}

/// Checks if a specific argument is present in the command line
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args()
        .iter()
        .any(|a| a == arg)
}

/// Gets the value of a command-line argument that follows a flag
/// Returns None if the flag is not found or has no value
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    for (i, arg) in args.iter().enumerate() {
        if arg == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    None
}

// =============================================================================
// MODE FLAGS
// =============================================================================

/// Single fetch-and-render cycle, then exit (no pollers, no console)
pub fn is_once_mode() -> bool {
    has_arg("--once")
}

pub fn is_help_requested() -> bool {
    has_arg("--help") || has_arg("-h")
}

pub fn is_verbose_mode() -> bool {
    has_arg("--verbose") || has_arg("-v")
}

/// Override path of the JSON config file
pub fn get_config_path() -> String {
    get_arg_value("--config").unwrap_or_else(|| "config.json".to_string())
}

// =============================================================================
// DEBUG FLAG CHECKING FUNCTIONS
// =============================================================================

/// API call debug mode (logs every request/response status)
pub fn is_debug_api_enabled() -> bool {
    has_arg("--debug-api")
}

/// Poller debug mode (logs every tick and sequence decision)
pub fn is_debug_poller_enabled() -> bool {
    has_arg("--debug-poller")
}

/// Auth debug mode (logs sign-in and token refresh outcomes)
pub fn is_debug_auth_enabled() -> bool {
    has_arg("--debug-auth")
}

pub fn is_any_debug_enabled() -> bool {
    is_debug_api_enabled() || is_debug_poller_enabled() || is_debug_auth_enabled()
}

pub fn get_enabled_debug_modes() -> Vec<&'static str> {
    let mut modes = Vec::new();
    if is_debug_api_enabled() {
        modes.push("api");
    }
    if is_debug_poller_enabled() {
        modes.push("poller");
    }
    if is_debug_auth_enabled() {
        modes.push("auth");
    }
    modes
}

/// Print enabled debug modes at startup, if any
pub fn print_debug_info() {
    let modes = get_enabled_debug_modes();
    if !modes.is_empty() {
        crate::logger::info(
            crate::logger::LogTag::System,
            &format!("Debug modes enabled: {}", modes.join(", "))
        );
    }
}

pub fn print_help() {
    println!("Ezyago Console - terminal dashboard for the Ezyago trading bot");
    println!();
    println!("USAGE:");
    println!("    ezyago-console [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --config <path>    Config file path (default: config.json)");
    println!("    --once             Fetch and render the dashboard once, then exit");
    println!("    --verbose, -v      Verbose output");
    println!("    --debug-api        Log every API request and response status");
    println!("    --debug-poller     Log every poll tick and sequencing decision");
    println!("    --debug-auth       Log sign-in and token refresh outcomes");
    println!("    --help, -h         Show this help");
    println!();
    println!("CONSOLE COMMANDS (interactive mode):");
    println!("    status, dashboard, positions, pairs, recommend, config,");
    println!("    timeframe <tf>, sl <pct>, tp <pct>, use-recommended <sl|tp>,");
    println!("    start, stop, close <symbol>, keys <key> <secret> [testnet],");
    println!("    support <message>, paid <note>, help, quit");
}

// Tests across modules share the CMD_ARGS singleton, serialize them
#[cfg(test)]
pub(crate) static CMD_ARGS_TEST_LOCK: Mutex<()> = Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;

    use super::CMD_ARGS_TEST_LOCK as TEST_LOCK;

    #[test]
    fn test_set_and_get_args() {
        let _guard = TEST_LOCK.lock().unwrap();
        let test_args = vec![
            "ezyago-console".to_string(),
            "--debug-api".to_string(),
            "--config".to_string(),
            "custom.json".to_string()
        ];

        set_cmd_args(test_args.clone());
        let retrieved_args = get_cmd_args();

        assert_eq!(retrieved_args, test_args);
    }

    #[test]
    fn test_has_arg_and_value() {
        let _guard = TEST_LOCK.lock().unwrap();
        set_cmd_args(
            vec![
                "ezyago-console".to_string(),
                "--once".to_string(),
                "--config".to_string(),
                "other.json".to_string()
            ]
        );

        assert!(has_arg("--once"));
        assert!(!has_arg("--verbose"));
        assert_eq!(get_arg_value("--config"), Some("other.json".to_string()));
        assert_eq!(get_arg_value("--missing"), None);
        assert_eq!(get_config_path(), "other.json");
    }

    #[test]
    fn test_debug_flags() {
        let _guard = TEST_LOCK.lock().unwrap();
        set_cmd_args(
            vec![
                "ezyago-console".to_string(),
                "--debug-api".to_string(),
                "--debug-poller".to_string()
            ]
        );

        assert!(is_debug_api_enabled());
        assert!(is_debug_poller_enabled());
        assert!(!is_debug_auth_enabled());
        assert!(is_any_debug_enabled());

        let enabled_modes = get_enabled_debug_modes();
        assert!(enabled_modes.contains(&"api"));
        assert!(enabled_modes.contains(&"poller"));
        assert!(!enabled_modes.contains(&"auth"));
    }
}
