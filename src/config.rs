use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

// -----------------------------------------------
// NSE API ENDPOINTS
// -----------------------------------------------
pub const NSE_BASE_URL: &str = "https://www.nseindia.com";

pub fn nse_contract_info_url(symbol: &str) -> String {
    format!(
        "{}/api/option-chain-contract-info?symbol={}",
        NSE_BASE_URL,
        urlencoding::encode(symbol)
    )
}

pub fn nse_option_chain_url(symbol: &str, expiry: &str) -> String {
    format!(
        "{}/api/option-chain-v3?type=Indices&symbol={}&expiry={}",
        NSE_BASE_URL,
        urlencoding::encode(symbol),
        urlencoding::encode(expiry)
    )
}

// -----------------------------------------------
// YAHOO CHART API (intraday bars for index proxies)
// -----------------------------------------------
pub const YAHOO_CHART_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
pub const YAHOO_RANGE: &str = "1d";
pub const YAHOO_INTERVAL: &str = "1m";

pub fn yahoo_chart_url(ticker: &str) -> String {
    format!(
        "{}/{}?range={}&interval={}",
        YAHOO_CHART_BASE_URL,
        urlencoding::encode(ticker),
        YAHOO_RANGE,
        YAHOO_INTERVAL
    )
}

/// ETF proxy used for intraday trend detection of an index
pub fn index_proxy_ticker(symbol: &str) -> &'static str {
    if symbol == "NIFTY" {
        "NIFTYBEES.NS"
    } else {
        "BANKBEES.NS"
    }
}

// -----------------------------------------------
// TELEGRAM
// -----------------------------------------------
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub const TELEGRAM_TIMEOUT: Duration = Duration::from_secs(10);

pub fn telegram_send_message_url(bot_token: &str) -> String {
    format!("{}/bot{}/sendMessage", TELEGRAM_API_BASE, bot_token)
}

// -----------------------------------------------
// SYMBOLS
// -----------------------------------------------
pub const DEFAULT_SYMBOLS: &[&str] = &["NIFTY", "BANKNIFTY"];

// -----------------------------------------------
// HTTP CLIENT CONFIG
// -----------------------------------------------
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                               AppleWebKit/537.36 (KHTML, like Gecko) \
                               Chrome/131.0.0.0 Safari/537.36";

pub const ACCEPT_LANGUAGES: &[&str] = &[
    "en-US,en;q=0.9",
    "en-GB,en;q=0.8",
    "en-IN,en;q=0.9",
];

pub const HTTP_TIMEOUT: Duration = Duration::from_secs(20);

// -----------------------------------------------
// SESSION WARMUP
// -----------------------------------------------
pub const WARMUP_DELAY_MS: u64 = 200;

// -----------------------------------------------
// RETRY CONFIG
// -----------------------------------------------
pub const RETRY_BASE_DELAY_MS: u64 = 200;
pub const RETRY_FACTOR: u64 = 3;
pub const RETRY_MAX_DELAY_SECS: u64 = 5;
pub const RETRY_MAX_ATTEMPTS: usize = 5;

// -----------------------------------------------
// HTTP HEADERS
// -----------------------------------------------
pub const HEADER_REFERER: &str = "https://www.nseindia.com/";
pub const HEADER_X_REQUESTED_WITH: &str = "XMLHttpRequest";
pub const HEADER_ACCEPT_HTML: &str = "text/html";

// -----------------------------------------------
// MARKET CLOCK
// -----------------------------------------------
/// IST is UTC+05:30
pub const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;
pub const EXPIRY_DATE_FORMAT: &str = "%d-%b-%Y";
pub const DAYS_PER_YEAR: f64 = 365.0;

// -----------------------------------------------
// ENGINE DEFAULTS
// -----------------------------------------------
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.068;
pub const DEFAULT_IV_THRESHOLD: f64 = 25.0;
pub const DEFAULT_STRIKE_BAND: f64 = 200.0;
pub const DEFAULT_TREND_UP_THRESHOLD: f64 = 0.3;
pub const DEFAULT_TREND_DOWN_THRESHOLD: f64 = -0.3;
pub const DEFAULT_MIN_BARS: usize = 5;
pub const DEFAULT_STOP_LOSS_FRACTION: f64 = 0.8;
pub const DEFAULT_REWARD_MULTIPLE: f64 = 2.0;

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

/// Bars outside this window are ignored by the trend classifier
pub fn default_trend_session() -> SessionWindow {
    SessionWindow::new(hm(9, 15), hm(15, 25))
}

/// Market hours used by the optional trading-window gate
pub fn default_trading_window() -> SessionWindow {
    SessionWindow::new(hm(9, 30), hm(15, 15))
}

// -----------------------------------------------
// ENGINE CONFIGURATION
// -----------------------------------------------

/// Inclusive time-of-day window, IST
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl SessionWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        time >= self.start && time <= self.end
    }
}

/// Additive weights of the contract score.
///
/// These are informally tuned and deliberately unnormalized; the terms live on
/// different scales (0..30, 0..20, -20..20, unbounded vega and theta).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub underpriced_bonus: f64,
    pub volume_divisor: f64,
    pub volume_cap: f64,
    pub delta_weight: f64,
    pub vega_weight: f64,
    pub theta_weight: f64,
    pub iv_crush_penalty: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            underpriced_bonus: 30.0,
            volume_divisor: 1000.0,
            volume_cap: 20.0,
            delta_weight: 20.0,
            vega_weight: 10.0,
            theta_weight: 5.0,
            iv_crush_penalty: 20.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// IV (percentage points) above which the crush penalty applies
    pub iv_threshold: f64,
    /// Max absolute distance between strike and spot
    pub strike_band: f64,
    pub stop_loss_fraction: f64,
    pub reward_multiple: f64,
    pub weights: ScoreWeights,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            iv_threshold: DEFAULT_IV_THRESHOLD,
            strike_band: DEFAULT_STRIKE_BAND,
            stop_loss_fraction: DEFAULT_STOP_LOSS_FRACTION,
            reward_multiple: DEFAULT_REWARD_MULTIPLE,
            weights: ScoreWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendConfig {
    pub up_threshold: f64,
    pub down_threshold: f64,
    pub min_bars: usize,
    pub session: SessionWindow,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            up_threshold: DEFAULT_TREND_UP_THRESHOLD,
            down_threshold: DEFAULT_TREND_DOWN_THRESHOLD,
            min_bars: DEFAULT_MIN_BARS,
            session: default_trend_session(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub risk_free_rate: f64,
    pub scoring: ScoringConfig,
    pub trend: TrendConfig,
    /// Market hours checked when OPT_ENFORCE_TRADING_WINDOW is set
    pub trading_window: SessionWindow,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            scoring: ScoringConfig::default(),
            trend: TrendConfig::default(),
            trading_window: default_trading_window(),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by OPT_* environment variables
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply OPT_* overrides from `lookup`; unparsable values keep the current setting
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let num = |key: &str, current: f64| parse_or(lookup(key), current);
        let time = |key: &str, current: NaiveTime| time_or(lookup(key), current);

        self.risk_free_rate = num("OPT_RISK_FREE_RATE", self.risk_free_rate);
        self.scoring.iv_threshold = num("OPT_IV_THRESHOLD", self.scoring.iv_threshold);
        self.scoring.strike_band = num("OPT_STRIKE_BAND", self.scoring.strike_band);
        self.scoring.stop_loss_fraction =
            num("OPT_STOP_LOSS_FRACTION", self.scoring.stop_loss_fraction);
        self.scoring.reward_multiple = num("OPT_REWARD_MULTIPLE", self.scoring.reward_multiple);
        self.trend.up_threshold = num("OPT_TREND_UP_THRESHOLD", self.trend.up_threshold);
        self.trend.down_threshold = num("OPT_TREND_DOWN_THRESHOLD", self.trend.down_threshold);
        self.trend.min_bars = parse_or(lookup("OPT_MIN_BARS"), self.trend.min_bars);
        self.trend.session.start = time("OPT_SESSION_START", self.trend.session.start);
        self.trend.session.end = time("OPT_SESSION_END", self.trend.session.end);
        self.trading_window.start = time("OPT_TRADING_START", self.trading_window.start);
        self.trading_window.end = time("OPT_TRADING_END", self.trading_window.end);
        self
    }
}

// -----------------------------------------------
// RUNTIME CONFIGURATION
// -----------------------------------------------

/// Get the execution mode from environment or default to run
pub fn get_execution_mode() -> String {
    std::env::var("OPT_MODE").unwrap_or_else(|_| "run".to_string())
}

/// Comma-separated OPT_SYMBOLS, or the default index list
pub fn get_symbols() -> Vec<String> {
    match std::env::var("OPT_SYMBOLS") {
        Ok(raw) => parse_symbols(&raw),
        Err(_) => DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Skip symbols outside market hours when set
pub fn enforce_trading_window() -> bool {
    matches!(
        std::env::var("OPT_ENFORCE_TRADING_WINDOW").as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

pub fn get_telegram_token() -> Option<String> {
    std::env::var("TELEGRAM_SECRET_TOKEN").ok().filter(|t| !t.is_empty())
}

pub fn get_telegram_chat_id() -> Option<String> {
    std::env::var("TELEGRAM_CHAT_ID").ok().filter(|c| !c.is_empty())
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|val| val.trim().parse::<T>().ok()).unwrap_or(default)
}

fn time_or(raw: Option<String>, default: NaiveTime) -> NaiveTime {
    raw.and_then(|val| NaiveTime::parse_from_str(val.trim(), "%H:%M").ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_deployment() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.risk_free_rate, 0.068);
        assert_eq!(cfg.scoring.iv_threshold, 25.0);
        assert_eq!(cfg.scoring.strike_band, 200.0);
        assert_eq!(cfg.scoring.stop_loss_fraction, 0.8);
        assert_eq!(cfg.scoring.reward_multiple, 2.0);
        assert_eq!(cfg.trend.min_bars, 5);
        assert_eq!(cfg.trend.up_threshold, 0.3);
        assert_eq!(cfg.trend.down_threshold, -0.3);
        assert_eq!(cfg.trend.session.start, hm(9, 15));
        assert_eq!(cfg.trend.session.end, hm(15, 25));
        assert_eq!(cfg.trading_window, SessionWindow::new(hm(9, 30), hm(15, 15)));
    }

    #[test]
    fn test_overrides_reach_trading_window() {
        let vars: std::collections::HashMap<&str, &str> = [
            ("OPT_TRADING_START", "09:20"),
            ("OPT_TRADING_END", " 15:29 "),
            ("OPT_SESSION_END", "15:00"),
            ("OPT_IV_THRESHOLD", "30"),
            ("OPT_MIN_BARS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let cfg = EngineConfig::default().with_overrides(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(cfg.trading_window, SessionWindow::new(hm(9, 20), hm(15, 29)));
        assert!(cfg.trading_window.contains(hm(15, 20)));
        assert_eq!(cfg.trend.session.end, hm(15, 0));
        assert_eq!(cfg.scoring.iv_threshold, 30.0);
        assert_eq!(cfg.trend.min_bars, DEFAULT_MIN_BARS);
    }

    #[test]
    fn test_session_window_is_inclusive() {
        let window = default_trend_session();
        assert!(window.contains(hm(9, 15)));
        assert!(window.contains(hm(15, 25)));
        assert!(!window.contains(hm(9, 14)));
        assert!(!window.contains(hm(15, 26)));
    }

    #[test]
    fn test_parse_symbols() {
        assert_eq!(parse_symbols(" nifty, BANKNIFTY ,,"), vec!["NIFTY", "BANKNIFTY"]);
        assert!(parse_symbols("").is_empty());
    }

    #[test]
    fn test_urls_are_encoded() {
        assert_eq!(
            nse_option_chain_url("NIFTY", "28-Mar-2024"),
            "https://www.nseindia.com/api/option-chain-v3?type=Indices&symbol=NIFTY&expiry=28-Mar-2024"
        );
        assert_eq!(
            yahoo_chart_url("NIFTYBEES.NS"),
            "https://query1.finance.yahoo.com/v8/finance/chart/NIFTYBEES.NS?range=1d&interval=1m"
        );
        assert_eq!(index_proxy_ticker("NIFTY"), "NIFTYBEES.NS");
        assert_eq!(index_proxy_ticker("BANKNIFTY"), "BANKBEES.NS");
    }
}
