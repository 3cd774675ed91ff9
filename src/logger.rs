use chrono::Utc;
use colored::*;
use std::io::{ self, Write };

/// Log category tags, one per subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTag {
    System,
    Auth,
    Api,
    Poller,
    Render,
    Action,
    Support,
    Config,
}

impl LogTag {
    fn emoji(&self) -> &'static str {
        match self {
            LogTag::System => "🤖",
            LogTag::Auth => "🔑",
            LogTag::Api => "🌐",
            LogTag::Poller => "⏱",
            LogTag::Render => "🖥",
            LogTag::Action => "⚡",
            LogTag::Support => "✉️",
            LogTag::Config => "⚙️",
        }
    }

    fn label(&self) -> ColoredString {
        match self {
            LogTag::System => "SYSTEM".green().bold(),
            LogTag::Auth => "AUTH".yellow().bold(),
            LogTag::Api => "API".bright_green().bold(),
            LogTag::Poller => "POLLER".cyan().bold(),
            LogTag::Render => "RENDER".blue().bold(),
            LogTag::Action => "ACTION".magenta().bold(),
            LogTag::Support => "SUPPORT".bright_blue().bold(),
            LogTag::Config => "CONFIG".white().bold(),
        }
    }
}

/// Core log function used by all level helpers
pub fn log(tag: LogTag, level: &str, message: &str) {
    let timestamp = Utc::now().format("%H:%M:%S").to_string();
    let formatted = match level {
        "ERROR" => message.red().to_string(),
        "WARN" => message.yellow().to_string(),
        "SUCCESS" => message.green().to_string(),
        "DEBUG" => message.dimmed().to_string(),
        _ => message.to_string(),
    };
    println!(
        "{} {} {} {}",
        tag.emoji(),
        tag.label(),
        format!("[{}]", timestamp).dimmed(),
        formatted
    );
    io::stdout().flush().ok();
}

pub fn info(tag: LogTag, message: &str) {
    log(tag, "INFO", message);
}

pub fn warning(tag: LogTag, message: &str) {
    log(tag, "WARN", message);
}

pub fn error(tag: LogTag, message: &str) {
    log(tag, "ERROR", message);
}

pub fn success(tag: LogTag, message: &str) {
    log(tag, "SUCCESS", message);
}

/// True when debug output for this tag should be printed. `--verbose`
/// enables every tag; the `--debug-*` flags enable only their subsystem.
pub fn debug_enabled(tag: LogTag) -> bool {
    if crate::arguments::is_verbose_mode() {
        return true;
    }
    match tag {
        LogTag::Api => crate::arguments::is_debug_api_enabled(),
        LogTag::Poller => crate::arguments::is_debug_poller_enabled(),
        LogTag::Auth => crate::arguments::is_debug_auth_enabled(),
        _ => false,
    }
}

pub fn debug(tag: LogTag, message: &str) {
    if debug_enabled(tag) {
        log(tag, "DEBUG", message);
    }
}

pub fn header(title: &str) {
    println!();
    println!(
        "{} {} {}",
        "🤖".green().bold(),
        "Ezyago Console".green().bold(),
        format!("- {}", title).bright_white().bold()
    );
    println!("{}", "─".repeat(50).dimmed());
    io::stdout().flush().ok();
}

pub fn separator() {
    println!("{}", "─".repeat(50).dimmed());
    io::stdout().flush().ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::{ set_cmd_args, CMD_ARGS_TEST_LOCK };

    #[test]
    fn test_debug_gated_per_subsystem_flag() {
        let _guard = CMD_ARGS_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        set_cmd_args(vec!["ezyago-console".to_string(), "--debug-api".to_string()]);

        assert!(debug_enabled(LogTag::Api));
        assert!(!debug_enabled(LogTag::Poller));
        assert!(!debug_enabled(LogTag::Auth));
        assert!(!debug_enabled(LogTag::System));
    }

    #[test]
    fn test_verbose_enables_every_tag() {
        let _guard = CMD_ARGS_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        set_cmd_args(vec!["ezyago-console".to_string(), "--verbose".to_string()]);

        assert!(debug_enabled(LogTag::Api));
        assert!(debug_enabled(LogTag::Poller));
        assert!(debug_enabled(LogTag::Render));
    }
}
