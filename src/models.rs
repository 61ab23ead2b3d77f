use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// -----------------------------------------------
// NSE WIRE FORMAT
// -----------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractInfo {
    #[serde(rename = "expiryDates")]
    pub expiry_dates: Vec<String>,

    #[serde(rename = "strikePrice", default)]
    pub strike_prices: Vec<String>,
}

/// Main response structure from NSE option chain API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionChain {
    pub records: Records,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Records {
    #[serde(default)]
    pub timestamp: String,

    #[serde(rename = "underlyingValue")]
    pub underlying_value: f64,

    #[serde(default)]
    pub data: Vec<OptionData>,

    #[serde(rename = "expiryDates", default)]
    pub expiry_dates: Vec<String>,
}

/// One strike row carrying the CE and PE sides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionData {
    #[serde(rename = "expiryDates", alias = "expiryDate")]
    pub expiry_date: Option<String>,

    #[serde(rename = "strikePrice")]
    pub strike_price: Option<f64>,

    #[serde(rename = "CE")]
    pub call: Option<OptionDetail>,

    #[serde(rename = "PE")]
    pub put: Option<OptionDetail>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionDetail {
    #[serde(rename = "strikePrice")]
    pub strike_price: Option<f64>,

    #[serde(rename = "expiryDate")]
    pub expiry_date: Option<String>,

    #[serde(rename = "impliedVolatility")]
    pub implied_volatility: Option<f64>,

    #[serde(rename = "lastPrice")]
    pub last_price: Option<f64>,

    #[serde(rename = "totalTradedVolume")]
    pub total_traded_volume: Option<f64>,

    #[serde(rename = "openInterest")]
    pub open_interest: Option<f64>,
}

// -----------------------------------------------
// DOMAIN TYPES
// -----------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionKind {
    Call,
    Put,
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OptionKind::Call => write!(f, "CALL"),
            OptionKind::Put => write!(f, "PUT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    Up,
    Down,
    Sideways,
}

impl Trend {
    /// Whether a contract of `kind` trades in the direction of this trend
    pub fn admits(&self, kind: OptionKind) -> bool {
        match self {
            Trend::Up => kind == OptionKind::Call,
            Trend::Down => kind == OptionKind::Put,
            Trend::Sideways => true,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Trend::Up => write!(f, "UP"),
            Trend::Down => write!(f, "DOWN"),
            Trend::Sideways => write!(f, "SIDEWAYS"),
        }
    }
}

/// Trend label per symbol for one run
pub type TrendMap = HashMap<String, Trend>;

/// One OHLCV sample of an index proxy, stamped in exchange time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<FixedOffset>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    pub symbol: String,
    pub expiry: String,
    pub strike: f64,
    pub kind: OptionKind,
    /// Annualized, in percentage points as quoted by the exchange
    pub implied_volatility: f64,
    pub last_traded_price: f64,
    pub total_traded_volume: f64,
}

impl OptionQuote {
    /// Implied volatility as a fraction, the form the pricing model takes
    pub fn volatility(&self) -> f64 {
        self.implied_volatility / 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingResult {
    pub theoretical_price: f64,
    pub delta: f64,
    /// Per calendar day
    pub theta: f64,
    /// Per 1 vol point
    pub vega: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredContract {
    pub quote: OptionQuote,
    pub pricing: PricingResult,
    pub score: f64,
    pub stop_loss: f64,
    pub target: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub contract: ScoredContract,
    pub trend: Trend,
}
