/// Interactive console loop.
///
/// Reads commands from stdin, renders snapshot views, edits the pending
/// bot configuration, and dispatches actions. Destructive commands go
/// through an inline confirmation prompt; the network is only touched
/// after the user types "yes".
use std::io::Write as _;
use std::sync::Arc;
use tokio::io::{ AsyncBufReadExt, BufReader, Lines, Stdin };

use crate::actions::{ self, ActionOutcome };
use crate::api::ApiClient;
use crate::auth::AuthSession;
use crate::config::Config;
use crate::errors::Result;
use crate::global::{ self, SHUTDOWN };
use crate::logger::{ self, LogTag };
use crate::realtime::RealtimeStore;
use crate::recommendations::{ BotConfigDraft, RECOMMENDATIONS };
use crate::render;
use crate::types::default_trading_pairs;

/// Parsed console command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Status,
    Dashboard,
    Positions,
    Pairs,
    Recommend,
    ShowConfig,
    Timeframe(String),
    StopLoss(f64),
    TakeProfit(f64),
    UseRecommended(RecommendedField),
    Start,
    Stop,
    Close(String),
    Keys { api_key: String, api_secret: String, use_testnet: bool },
    Support(String),
    Paid(String),
    Help,
    Quit,
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecommendedField {
    StopLoss,
    TakeProfit,
}

pub fn parse_command(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut parts = trimmed.split_whitespace();
    let head = parts.next().unwrap_or_default().to_lowercase();
    let rest: Vec<&str> = parts.collect();

    let command = match head.as_str() {
        "status" => Command::Status,
        "dashboard" | "dash" => Command::Dashboard,
        "positions" | "pos" => Command::Positions,
        "pairs" => Command::Pairs,
        "recommend" | "rec" => Command::Recommend,
        "config" => Command::ShowConfig,
        "timeframe" | "tf" => match rest.first() {
            Some(tf) => Command::Timeframe(tf.to_string()),
            None => Command::Unknown("timeframe needs a value, e.g. timeframe 1h".to_string()),
        },
        "sl" => match rest.first().and_then(|v| v.parse::<f64>().ok()) {
            Some(value) if value > 0.0 => Command::StopLoss(value),
            _ => Command::Unknown("sl needs a positive percentage, e.g. sl 1.5".to_string()),
        },
        "tp" => match rest.first().and_then(|v| v.parse::<f64>().ok()) {
            Some(value) if value > 0.0 => Command::TakeProfit(value),
            _ => Command::Unknown("tp needs a positive percentage, e.g. tp 3.0".to_string()),
        },
        "use-recommended" => match rest.first() {
            Some(&"sl") => Command::UseRecommended(RecommendedField::StopLoss),
            Some(&"tp") => Command::UseRecommended(RecommendedField::TakeProfit),
            _ => Command::Unknown("use-recommended takes sl or tp".to_string()),
        },
        "start" => Command::Start,
        "stop" => Command::Stop,
        "close" => match rest.first() {
            Some(symbol) => Command::Close(symbol.to_uppercase()),
            None => Command::Unknown("close needs a symbol, e.g. close BTCUSDT".to_string()),
        },
        "keys" => {
            if rest.len() < 2 {
                Command::Unknown("keys needs <key> <secret> [testnet]".to_string())
            } else {
                Command::Keys {
                    api_key: rest[0].to_string(),
                    api_secret: rest[1].to_string(),
                    use_testnet: rest.get(2).map(|v| *v == "testnet").unwrap_or(false),
                }
            }
        }
        "support" => {
            if rest.is_empty() {
                Command::Unknown("support needs a message".to_string())
            } else {
                Command::Support(rest.join(" "))
            }
        }
        "paid" => {
            if rest.is_empty() {
                Command::Unknown("paid needs a payment reference".to_string())
            } else {
                Command::Paid(rest.join(" "))
            }
        }
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => Command::Unknown(format!("unknown command: {}", other)),
    };
    Some(command)
}

pub struct Console {
    client: Arc<ApiClient<AuthSession>>,
    session: Arc<AuthSession>,
    store: RealtimeStore,
    draft: BotConfigDraft,
    plan: String,
}

impl Console {
    pub fn new(client: Arc<ApiClient<AuthSession>>, session: Arc<AuthSession>, config: &Config) -> Self {
        Self {
            client,
            session,
            store: RealtimeStore::new(&config.firebase.database_url),
            draft: BotConfigDraft::new(),
            plan: "monthly".to_string(),
        }
    }

    /// REPL until quit or shutdown
    pub async fn run(&mut self) {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!("Type 'help' for commands.");

        loop {
            print!("> ");
            let _ = std::io::stdout().flush();

            let line = tokio::select! {
                line = lines.next_line() => line,
                _ = SHUTDOWN.notified() => break,
            };

            let line = match line {
                Ok(Some(line)) => line,
                Ok(None) | Err(_) => break,
            };

            if global::is_shutdown_requested() {
                break;
            }

            let command = match parse_command(&line) {
                Some(command) => command,
                None => continue,
            };

            if command == Command::Quit {
                break;
            }
            self.dispatch(command, &mut lines).await;
        }
    }

    async fn dispatch(&mut self, command: Command, lines: &mut Lines<BufReader<Stdin>>) {
        match command {
            Command::Status => {
                let snapshot = global::get_snapshot();
                let status = snapshot.bot_status.unwrap_or_default();
                println!("{}", render::render_bot_status(&status));
            }
            Command::Dashboard => {
                println!("{}", render::render_dashboard(&global::get_snapshot()));
            }
            Command::Positions => {
                let snapshot = global::get_snapshot();
                let positions = snapshot.positions.unwrap_or_default();
                println!("{}", render::render_positions(&positions));
            }
            Command::Pairs => self.show_pairs().await,
            Command::Recommend => {
                for r in &RECOMMENDATIONS {
                    println!(
                        "  {:>4}  {:<22} SL {:.1}%  TP {:.1}%  ~{}% win  {}  (max {}m)",
                        r.timeframe, r.name, r.stop_loss, r.take_profit, r.win_rate,
                        r.risk_level, r.max_hold_minutes
                    );
                }
            }
            Command::ShowConfig => {
                let c = &self.draft.config;
                println!(
                    "  {} {} | leverage {}x | order ${:.0} | SL {:.1}%{} | TP {:.1}%{} | max {}/day",
                    c.symbol,
                    c.timeframe,
                    c.leverage,
                    c.order_size,
                    c.stop_loss,
                    if self.draft.overrides.stop_loss { " (manual)" } else { "" },
                    c.take_profit,
                    if self.draft.overrides.take_profit { " (manual)" } else { "" },
                    c.max_daily_trades
                );
            }
            Command::Timeframe(tf) => match self.draft.select_timeframe(&tf) {
                Some(r) => println!(
                    "  {} selected: {} (SL {:.1}% / TP {:.1}%, {})",
                    r.timeframe, r.name, r.stop_loss, r.take_profit, r.risk_level
                ),
                None => println!("  Unknown timeframe, choose one of: 5m 15m 30m 1h 4h"),
            },
            Command::StopLoss(value) => {
                self.draft.set_stop_loss(value);
                println!("  Stop loss set to {:.1}% (manual)", value);
            }
            Command::TakeProfit(value) => {
                self.draft.set_take_profit(value);
                println!("  Take profit set to {:.1}% (manual)", value);
            }
            Command::UseRecommended(field) => {
                match field {
                    RecommendedField::StopLoss => self.draft.use_recommended_stop_loss(),
                    RecommendedField::TakeProfit => self.draft.use_recommended_take_profit(),
                }
                println!("  Field back under recommendation control");
            }
            Command::Start => self.report(actions::start_bot(&self.client, &self.draft.config).await),
            Command::Stop => self.report(actions::stop_bot(&self.client).await),
            Command::Close(symbol) => {
                // Side comes from the last known position snapshot
                let snapshot = global::get_snapshot();
                let side = snapshot
                    .positions
                    .unwrap_or_default()
                    .iter()
                    .find(|p| p.symbol == symbol)
                    .map(|p| p.position_side.clone());
                let side = match side {
                    Some(side) => side,
                    None => {
                        println!("  No open position for {}", symbol);
                        return;
                    }
                };

                println!("  ⚠️ Close {} {} at market price? Type 'yes' to confirm:", side, symbol);
                let confirmed = matches!(lines.next_line().await, Ok(Some(answer)) if answer.trim().eq_ignore_ascii_case("yes"));
                self.report(actions::close_position(&self.client, &symbol, &side, confirmed).await);
            }
            Command::Keys { api_key, api_secret, use_testnet } => {
                self.report(actions::save_api_keys(&self.client, &api_key, &api_secret, use_testnet).await);
            }
            Command::Support(message) => self.send_support(&message).await,
            Command::Paid(reference) => self.send_payment(&reference).await,
            Command::Help => crate::arguments::print_help(),
            Command::Unknown(reason) => println!("  {}", reason),
            Command::Quit => {}
        }
    }

    fn report(&self, outcome: Result<ActionOutcome>) {
        match outcome {
            Ok(ActionOutcome::Completed(message)) => {
                logger::success(LogTag::Action, &format!("✅ {}", message));
            }
            Ok(ActionOutcome::Cancelled) => println!("  Cancelled."),
            Ok(ActionOutcome::Busy) => println!("  A previous action is still running, try again."),
            Err(e) => logger::error(LogTag::Action, &format!("❌ Action failed: {}", e)),
        }
    }

    async fn show_pairs(&self) {
        let pairs = match self.client.get_trading_pairs().await {
            Ok(pairs) if !pairs.is_empty() => pairs,
            Ok(_) | Err(_) => {
                logger::warning(LogTag::Api, "⚠️ Pair list unavailable, using defaults");
                default_trading_pairs()
            }
        };
        for pair in pairs {
            println!("  {} ({}/{})", pair.symbol, pair.base_asset, pair.quote_asset);
        }
    }

    async fn send_support(&self, message: &str) {
        let (token, uid, email) = match self.identity().await {
            Some(identity) => identity,
            None => return,
        };
        if let Err(e) = self
            .store
            .push_support_message(&token, &uid, &email, "Console support request", message)
            .await
        {
            logger::error(LogTag::Support, &format!("❌ Support message failed: {}", e));
        }
    }

    async fn send_payment(&self, reference: &str) {
        let (token, uid, email) = match self.identity().await {
            Some(identity) => identity,
            None => return,
        };
        if let Err(e) = self
            .store
            .push_payment_notification(&token, &uid, &email, &self.plan, reference)
            .await
        {
            logger::error(LogTag::Support, &format!("❌ Payment notification failed: {}", e));
        }
    }

    async fn identity(&self) -> Option<(String, String, String)> {
        use crate::auth::TokenProvider;
        let token = match self.session.bearer_token().await {
            Ok(token) => token,
            Err(e) => {
                logger::error(LogTag::Auth, &format!("❌ No session token: {}", e));
                return None;
            }
        };
        let uid = self.session.uid().await.unwrap_or_default();
        let email = self.session.email().await.unwrap_or_default();
        Some((token, uid, email))
    }
}
