/// Typed models for the Ezyago backend payloads.
///
/// Every field carries a serde default so a partial or degraded backend
/// response still deserializes; renderers substitute display defaults on top.
use serde::{ Deserialize, Serialize };

/// Aggregate payload from GET /api/user/dashboard-data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardData {
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub stats: Stats,
    #[serde(default)]
    pub api_info: ApiInfo,
    #[serde(default)]
    pub account: Account,
    #[serde(default)]
    pub bot_status: BotStatus,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub subscription: Subscription,
    #[serde(default)]
    pub api_keys_set: bool,
    #[serde(default)]
    pub bot_active: bool,
    #[serde(default)]
    pub total_trades: i64,
    #[serde(default)]
    pub total_pnl: f64,
    #[serde(default)]
    pub account_balance: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default, rename = "expiryDate")]
    pub expiry_date: Option<String>,
    #[serde(default, rename = "daysRemaining")]
    pub days_remaining: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default, rename = "totalTrades")]
    pub total_trades: i64,
    #[serde(default, rename = "totalPnl")]
    pub total_pnl: f64,
    #[serde(default, rename = "winRate")]
    pub win_rate: f64,
    #[serde(default, rename = "botStartTime")]
    pub bot_start_time: Option<i64>,
    #[serde(default, rename = "lastTradeTime")]
    pub last_trade_time: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiInfo {
    #[serde(default, rename = "hasKeys")]
    pub has_keys: bool,
    #[serde(default, rename = "maskedApiKey")]
    pub masked_api_key: Option<String>,
    #[serde(default, rename = "useTestnet")]
    pub use_testnet: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Account {
    #[serde(default, rename = "totalBalance")]
    pub total_balance: f64,
    #[serde(default, rename = "availableBalance")]
    pub available_balance: f64,
    #[serde(default, rename = "unrealizedPnl")]
    pub unrealized_pnl: f64,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotStatus {
    #[serde(default)]
    pub is_running: bool,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub position_side: Option<String>,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub account_balance: f64,
    #[serde(default)]
    pub position_pnl: f64,
    #[serde(default)]
    pub total_trades: i64,
    #[serde(default)]
    pub total_pnl: f64,
    #[serde(default)]
    pub last_check_time: Option<String>,
}

/// Wrapper around GET /api/bot/status
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BotStatusResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub status: BotStatus,
}

/// One open futures position as reported by the backend (always an array)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub symbol: String,
    #[serde(default, rename = "positionSide")]
    pub position_side: String,
    #[serde(default, rename = "positionAmt")]
    pub position_amt: String,
    #[serde(default, rename = "entryPrice")]
    pub entry_price: String,
    #[serde(default, rename = "markPrice")]
    pub mark_price: String,
    #[serde(default, rename = "unrealizedPnl")]
    pub unrealized_pnl: f64,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub leverage: String,
    #[serde(default, rename = "marginType")]
    pub margin_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingPair {
    pub symbol: String,
    #[serde(rename = "baseAsset")]
    pub base_asset: String,
    #[serde(rename = "quoteAsset")]
    pub quote_asset: String,
}

/// Fallback pair list used when the trading-pairs fetch fails
pub fn default_trading_pairs() -> Vec<TradingPair> {
    const PAIRS: [(&str, &str); 10] = [
        ("BTCUSDT", "BTC"),
        ("ETHUSDT", "ETH"),
        ("BNBUSDT", "BNB"),
        ("ADAUSDT", "ADA"),
        ("DOTUSDT", "DOT"),
        ("LINKUSDT", "LINK"),
        ("SOLUSDT", "SOL"),
        ("AVAXUSDT", "AVAX"),
        ("MATICUSDT", "MATIC"),
        ("XRPUSDT", "XRP"),
    ];
    PAIRS.iter()
        .map(|(symbol, base)| TradingPair {
            symbol: symbol.to_string(),
            base_asset: base.to_string(),
            quote_asset: "USDT".to_string(),
        })
        .collect()
}

/// Bot configuration sent once per start action, assembled in the console
/// and never retained after submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub symbol: String,
    pub timeframe: String,
    pub leverage: u32,
    pub order_size: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub max_daily_trades: u32,
    pub trailing_stop: bool,
    pub auto_restart: bool,
    pub compound_profits: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            timeframe: "15m".to_string(),
            leverage: 10,
            order_size: 35.0,
            stop_loss: 2.0,
            take_profit: 4.0,
            max_daily_trades: 10,
            trailing_stop: false,
            auto_restart: false,
            compound_profits: false,
        }
    }
}

/// Generic action acknowledgement from POST endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_data_tolerates_partial_payload() {
        // Degraded backend responses omit whole sections
        let json = r#"{"profile": {"email": "trader@ezyago.com"}}"#;
        let data: DashboardData = serde_json::from_str(json).unwrap();

        assert_eq!(data.profile.email.as_deref(), Some("trader@ezyago.com"));
        assert_eq!(data.stats.total_trades, 0);
        assert!(!data.api_info.has_keys);
        assert!(!data.bot_status.is_running);
    }

    #[test]
    fn test_position_field_mapping() {
        let json = r#"{
            "symbol": "BTCUSDT",
            "positionSide": "LONG",
            "positionAmt": "0.002",
            "entryPrice": "61250.50",
            "markPrice": "61900.00",
            "unrealizedPnl": 1.30,
            "percentage": 3.71,
            "leverage": "10",
            "marginType": "ISOLATED"
        }"#;
        let position: Position = serde_json::from_str(json).unwrap();

        assert_eq!(position.symbol, "BTCUSDT");
        assert_eq!(position.position_side, "LONG");
        assert_eq!(position.leverage, "10");
        assert!((position.unrealized_pnl - 1.30).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bot_config_serializes_snake_case() {
        let config = BotConfig::default();
        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(json["symbol"], "BTCUSDT");
        assert_eq!(json["timeframe"], "15m");
        assert_eq!(json["order_size"], 35.0);
        assert_eq!(json["trailing_stop"], false);
        assert_eq!(json["max_daily_trades"], 10);
    }

    #[test]
    fn test_default_trading_pairs() {
        let pairs = default_trading_pairs();
        assert_eq!(pairs.len(), 10);
        assert!(pairs.iter().all(|p| p.quote_asset == "USDT"));
        assert!(pairs.iter().any(|p| p.symbol == "BTCUSDT"));
    }
}
