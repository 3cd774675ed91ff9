/// Dashboard rendering.
///
/// Pure snapshot-to-string functions so the console loop and tests share
/// the same output path. Missing server fields fall back to display
/// defaults: zero for numbers, empty string for text, "Kullanıcı" for the
/// account holder name.
use colored::Colorize;
use tabled::{ Tabled, Table, settings::{ Style, Alignment, object::Rows, Modify } };

use crate::global::DashboardSnapshot;
use crate::types::{ Account, ApiInfo, BotStatus, Position, Profile, Stats, Subscription };
use crate::utils::{ format_age_string, format_pct, format_signed_usd, format_usd, millis_to_datetime };

pub const DEFAULT_USER_NAME: &str = "Kullanıcı";

#[derive(Tabled)]
struct ProfileDisplay {
    #[tabled(rename = "👤 Name")]
    name: String,
    #[tabled(rename = "📧 Email")]
    email: String,
    #[tabled(rename = "📋 Plan")]
    plan: String,
    #[tabled(rename = "📅 Days Left")]
    days_remaining: String,
    #[tabled(rename = "🔑 API Keys")]
    api_keys: String,
}

#[derive(Tabled)]
struct StatsDisplay {
    #[tabled(rename = "📊 Total Trades")]
    total_trades: String,
    #[tabled(rename = "💸 Total P&L")]
    total_pnl: String,
    #[tabled(rename = "🎯 Win Rate")]
    win_rate: String,
    #[tabled(rename = "⏰ Bot Uptime")]
    bot_uptime: String,
    #[tabled(rename = "🕐 Last Trade")]
    last_trade: String,
}

#[derive(Tabled)]
struct AccountDisplay {
    #[tabled(rename = "💼 Total Balance")]
    total_balance: String,
    #[tabled(rename = "💵 Available")]
    available_balance: String,
    #[tabled(rename = "📈 Unrealized P&L")]
    unrealized_pnl: String,
}

#[derive(Tabled)]
struct BotStatusDisplay {
    #[tabled(rename = "🤖 Bot")]
    state: String,
    #[tabled(rename = "🏷️ Symbol")]
    symbol: String,
    #[tabled(rename = "📊 Side")]
    side: String,
    #[tabled(rename = "💸 Position P&L")]
    position_pnl: String,
    #[tabled(rename = "💬 Status")]
    message: String,
}

#[derive(Tabled)]
struct PositionDisplay {
    #[tabled(rename = "🏷️ Symbol")]
    symbol: String,
    #[tabled(rename = "📊 Side")]
    side: String,
    #[tabled(rename = "📦 Amount")]
    amount: String,
    #[tabled(rename = "📈 Entry")]
    entry_price: String,
    #[tabled(rename = "💲 Mark")]
    mark_price: String,
    #[tabled(rename = "💸 P&L")]
    pnl: String,
    #[tabled(rename = "📊 P&L (%)")]
    pnl_pct: String,
    #[tabled(rename = "⚖️ Leverage")]
    leverage: String,
}

fn styled(mut table: Table) -> String {
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::center()));
    table.to_string()
}

fn text_or_empty(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

pub fn render_profile(profile: &Profile) -> String {
    let subscription: &Subscription = &profile.subscription;
    let display = ProfileDisplay {
        name: profile
            .full_name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_USER_NAME.to_string()),
        email: text_or_empty(&profile.email),
        plan: text_or_empty(&subscription.plan),
        days_remaining: subscription.days_remaining.to_string(),
        api_keys: if profile.api_keys_set { "✅ set".to_string() } else { "❌ missing".to_string() },
    };
    styled(Table::new(vec![display]))
}

pub fn render_stats(stats: &Stats) -> String {
    let display = StatsDisplay {
        total_trades: stats.total_trades.to_string(),
        total_pnl: format_signed_usd(stats.total_pnl),
        win_rate: format_pct(stats.win_rate),
        bot_uptime: format_age_string(millis_to_datetime(stats.bot_start_time)),
        last_trade: match millis_to_datetime(stats.last_trade_time) {
            Some(dt) => format!("{} ago", format_age_string(Some(dt))),
            None => String::new(),
        },
    };
    styled(Table::new(vec![display]))
}

pub fn render_account(account: &Account) -> String {
    let display = AccountDisplay {
        total_balance: format_usd(account.total_balance),
        available_balance: format_usd(account.available_balance),
        unrealized_pnl: format_signed_usd(account.unrealized_pnl),
    };
    let table = styled(Table::new(vec![display]));
    match &account.message {
        Some(message) if !message.is_empty() => format!("{}\n  ℹ️ {}", table, message),
        _ => table,
    }
}

pub fn render_bot_status(status: &BotStatus) -> String {
    let display = BotStatusDisplay {
        state: if status.is_running {
            "🟢 RUNNING".green().bold().to_string()
        } else {
            "🔴 STOPPED".red().bold().to_string()
        },
        symbol: text_or_empty(&status.symbol),
        side: text_or_empty(&status.position_side),
        position_pnl: format_signed_usd(status.position_pnl),
        message: text_or_empty(&status.status_message),
    };
    styled(Table::new(vec![display]))
}

pub fn render_positions(positions: &[Position]) -> String {
    if positions.is_empty() {
        return "  📭 No open positions".to_string();
    }

    let displays: Vec<PositionDisplay> = positions
        .iter()
        .map(|p| PositionDisplay {
            symbol: p.symbol.clone(),
            side: p.position_side.clone(),
            amount: p.position_amt.clone(),
            entry_price: p.entry_price.clone(),
            mark_price: p.mark_price.clone(),
            pnl: format_signed_usd(p.unrealized_pnl),
            pnl_pct: format_pct(p.percentage),
            leverage: format!("{}x", p.leverage),
        })
        .collect();
    styled(Table::new(displays))
}

pub fn render_api_info(api_info: &ApiInfo) -> String {
    if !api_info.has_keys {
        return "  🔑 No exchange API keys saved".to_string();
    }
    format!(
        "  🔑 API key: {} ({})",
        api_info.masked_api_key.clone().unwrap_or_default(),
        if api_info.use_testnet { "testnet" } else { "live" }
    )
}

/// Full dashboard from the latest snapshot. Sections without data render
/// from defaults so a degraded load still produces a complete screen.
pub fn render_dashboard(snapshot: &DashboardSnapshot) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\n", "═".repeat(70)));
    out.push_str("  📊 Ezyago Dashboard\n");
    out.push_str(&format!("{}\n", "═".repeat(70)));

    let dashboard = snapshot.dashboard.clone().unwrap_or_default();

    out.push_str(&render_profile(&dashboard.profile));
    out.push('\n');
    out.push_str(&render_stats(&dashboard.stats));
    out.push('\n');
    out.push_str(&render_account(&dashboard.account));
    out.push('\n');

    let status = snapshot
        .bot_status
        .clone()
        .unwrap_or_else(|| dashboard.bot_status.clone());
    out.push_str(&render_bot_status(&status));
    out.push('\n');

    let positions = snapshot.positions.clone().unwrap_or_default();
    out.push_str(&render_positions(&positions));
    out.push('\n');

    out.push_str(&render_api_info(&dashboard.api_info));
    out.push('\n');

    if let Some(updated) = snapshot.last_update {
        out.push_str(&format!("  🕐 Updated {} ago\n", format_age_string(Some(updated))));
    }
    out.push_str(&format!("{}\n", "─".repeat(70)));
    out
}
