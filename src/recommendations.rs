/// Per-timeframe recommended bot settings.
///
/// Selecting a timeframe applies its stop-loss/take-profit to the pending
/// bot configuration, but only for fields the user has not taken manual
/// control of. A manual edit raises the field's override flag; the flag is
/// cleared only by the explicit "use recommended" action for that field.
use crate::types::BotConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recommendation {
    pub timeframe: &'static str,
    pub name: &'static str,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Expected win rate in percent
    pub win_rate: u8,
    pub risk_level: &'static str,
    pub max_hold_minutes: u32,
}

pub const RECOMMENDATIONS: [Recommendation; 5] = [
    Recommendation {
        timeframe: "5m",
        name: "Hızlı Scalping",
        stop_loss: 0.5,
        take_profit: 1.0,
        win_rate: 75,
        risk_level: "YÜKSEK RİSK",
        max_hold_minutes: 30,
    },
    Recommendation {
        timeframe: "15m",
        name: "Dengeli Swing",
        stop_loss: 0.8,
        take_profit: 1.2,
        win_rate: 70,
        risk_level: "ORTA RİSK",
        max_hold_minutes: 120,
    },
    Recommendation {
        timeframe: "30m",
        name: "Aktif Trend",
        stop_loss: 1.0,
        take_profit: 2.0,
        win_rate: 65,
        risk_level: "ORTA RİSK",
        max_hold_minutes: 300,
    },
    Recommendation {
        timeframe: "1h",
        name: "İstikrarlı Pozisyon",
        stop_loss: 1.5,
        take_profit: 3.0,
        win_rate: 60,
        risk_level: "ORTA RİSK",
        max_hold_minutes: 720,
    },
    Recommendation {
        timeframe: "4h",
        name: "Büyük Hareketler",
        stop_loss: 2.5,
        take_profit: 5.0,
        win_rate: 55,
        risk_level: "DÜŞÜK RİSK",
        max_hold_minutes: 2880,
    },
];

pub fn recommendation_for(timeframe: &str) -> Option<&'static Recommendation> {
    RECOMMENDATIONS.iter().find(|r| r.timeframe == timeframe)
}

/// Per-field manual override flags
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OverrideFlags {
    pub stop_loss: bool,
    pub take_profit: bool,
}

/// The pending bot configuration being assembled in the console, together
/// with the override flags gating recommendation writes.
#[derive(Debug, Clone, Default)]
pub struct BotConfigDraft {
    pub config: BotConfig,
    pub overrides: OverrideFlags,
}

impl BotConfigDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a timeframe, applying its recommended stop-loss/take-profit to
    /// every field still under recommendation control.
    pub fn select_timeframe(&mut self, timeframe: &str) -> Option<&'static Recommendation> {
        let recommendation = recommendation_for(timeframe)?;
        self.config.timeframe = timeframe.to_string();
        if !self.overrides.stop_loss {
            self.config.stop_loss = recommendation.stop_loss;
        }
        if !self.overrides.take_profit {
            self.config.take_profit = recommendation.take_profit;
        }
        Some(recommendation)
    }

    /// Manual edit: takes the field away from the recommendation engine
    pub fn set_stop_loss(&mut self, value: f64) {
        self.config.stop_loss = value;
        self.overrides.stop_loss = true;
    }

    pub fn set_take_profit(&mut self, value: f64) {
        self.config.take_profit = value;
        self.overrides.take_profit = true;
    }

    /// Explicit reset back to the recommended value for the current timeframe
    pub fn use_recommended_stop_loss(&mut self) {
        self.overrides.stop_loss = false;
        if let Some(recommendation) = recommendation_for(&self.config.timeframe) {
            self.config.stop_loss = recommendation.stop_loss;
        }
    }

    pub fn use_recommended_take_profit(&mut self) {
        self.overrides.take_profit = false;
        if let Some(recommendation) = recommendation_for(&self.config.timeframe) {
            self.config.take_profit = recommendation.take_profit;
        }
    }
}
