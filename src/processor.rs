use crate::config::{EngineConfig, DAYS_PER_YEAR, EXPIRY_DATE_FORMAT};
use crate::error::AnalyzerError;
use crate::models::{
    OptionChain, OptionDetail, OptionKind, OptionQuote, PriceBar, Recommendation, Trend, TrendMap,
};
use crate::selector::{self, MarketContext, SymbolBest};
use crate::trend;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

const SECONDS_PER_DAY: i64 = 86_400;

/// Everything fetched for one symbol in one run
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub expiry: String,
    pub bars: Vec<PriceBar>,
    pub chain: OptionChain,
}

/// Outcome of evaluating one symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolEvaluation {
    pub symbol: String,
    pub expiry: String,
    pub spot: f64,
    pub days_to_expiry: i64,
    pub time_to_expiry_years: f64,
    pub trend: Trend,
    pub best: SymbolBest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolFailure {
    pub symbol: String,
    pub error: String,
}

/// Result collection and trend map of one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub evaluations: Vec<SymbolEvaluation>,
    pub failures: Vec<SymbolFailure>,
    pub trends: TrendMap,
    pub recommendation: Option<Recommendation>,
}

impl RunReport {
    pub fn has_contracts(&self) -> bool {
        self.evaluations
            .iter()
            .any(|e| e.best.call.is_some() || e.best.put.is_some())
    }
}

/// Whole days from `now` until the start of the expiry date ("28-Mar-2024").
///
/// The partial current day is dropped and the count is floored, so it is
/// already -1 during the expiry session.
pub fn calculate_days_to_expiry(expiry_date_str: &str, now: DateTime<FixedOffset>) -> Result<i64> {
    let expiry_date = NaiveDate::parse_from_str(expiry_date_str, EXPIRY_DATE_FORMAT)
        .map_err(|e| anyhow!("Failed to parse expiry date '{}': {}", expiry_date_str, e))?;
    let expiry_start = expiry_date
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.and_local_timezone(*now.offset()).single())
        .ok_or_else(|| anyhow!("Invalid expiry start for '{}'", expiry_date_str))?;

    Ok((expiry_start - now).num_seconds().div_euclid(SECONDS_PER_DAY))
}

/// Year fraction for the pricing model, floored at one day
pub fn time_to_expiry_years(days_to_expiry: i64) -> f64 {
    days_to_expiry.max(1) as f64 / DAYS_PER_YEAR
}

/// Nearest expiry that has not passed yet
pub fn select_expiry(expiry_dates: &[String], today: NaiveDate) -> Result<String> {
    if expiry_dates.is_empty() {
        return Err(anyhow!("No expiry dates found"));
    }

    let mut parsed: Vec<(NaiveDate, usize)> = Vec::with_capacity(expiry_dates.len());
    for (idx, s) in expiry_dates.iter().enumerate() {
        let d = NaiveDate::parse_from_str(s, EXPIRY_DATE_FORMAT)
            .with_context(|| format!("Failed to parse expiry date: {}", s))?;
        parsed.push((d, idx));
    }
    parsed.sort_by_key(|(d, _)| *d);

    parsed
        .into_iter()
        .find(|(d, _)| *d >= today)
        .map(|(_, idx)| expiry_dates[idx].clone())
        .ok_or_else(|| anyhow!("No valid expiry found (all in the past)"))
}

/// Flatten the CE/PE sides of every strike row for `expiry` into quotes.
///
/// Missing IV, price or volume read as zero so the contract fails eligibility;
/// a row without a strike makes the whole chain unusable.
pub fn chain_to_quotes(
    symbol: &str,
    chain: &OptionChain,
    expiry: &str,
) -> Result<Vec<OptionQuote>, AnalyzerError> {
    let mut quotes = Vec::new();

    for row in &chain.records.data {
        if let Some(row_expiry) = row.expiry_date.as_deref() {
            if row_expiry != expiry {
                continue;
            }
        }

        let strike = row
            .strike_price
            .or_else(|| row.call.as_ref().and_then(|c| c.strike_price))
            .or_else(|| row.put.as_ref().and_then(|p| p.strike_price))
            .ok_or_else(|| AnalyzerError::Parse(format!("{}: strike row without strikePrice", symbol)))?;

        let sides = [(OptionKind::Call, &row.call), (OptionKind::Put, &row.put)];
        for (kind, detail) in sides {
            if let Some(detail) = detail {
                quotes.push(to_quote(symbol, expiry, strike, kind, detail));
            }
        }
    }

    Ok(quotes)
}

fn to_quote(symbol: &str, expiry: &str, strike: f64, kind: OptionKind, detail: &OptionDetail) -> OptionQuote {
    OptionQuote {
        symbol: symbol.to_string(),
        expiry: expiry.to_string(),
        strike,
        kind,
        implied_volatility: detail.implied_volatility.unwrap_or(0.0),
        last_traded_price: detail.last_price.unwrap_or(0.0),
        total_traded_volume: detail.total_traded_volume.unwrap_or(0.0),
    }
}

/// Classify the trend and pick the best call and put of one symbol
pub fn evaluate_symbol(
    snapshot: &MarketSnapshot,
    now: DateTime<FixedOffset>,
    config: &EngineConfig,
) -> Result<SymbolEvaluation> {
    let symbol = snapshot.symbol.as_str();

    // Step 1: Trend from the proxy's intraday bars
    let trend = trend::classify(symbol, &snapshot.bars, &config.trend);

    // Step 2: Market context for the chosen expiry
    let spot = snapshot.chain.records.underlying_value;
    let days_to_expiry = calculate_days_to_expiry(&snapshot.expiry, now)?;
    let time_to_expiry_years = time_to_expiry_years(days_to_expiry);
    info!(
        symbol,
        spot,
        expiry = %snapshot.expiry,
        t = %format!("{:.4}", time_to_expiry_years),
        "Evaluating option chain"
    );

    // Step 3: Score every eligible contract
    let quotes = chain_to_quotes(symbol, &snapshot.chain, &snapshot.expiry)?;
    let market = MarketContext {
        spot,
        time_to_expiry_years,
    };
    let best = selector::select_best(symbol, &quotes, &market, config)
        .with_context(|| format!("Failed to score {} chain", symbol))?;

    Ok(SymbolEvaluation {
        symbol: symbol.to_string(),
        expiry: snapshot.expiry.clone(),
        spot,
        days_to_expiry,
        time_to_expiry_years,
        trend,
        best,
    })
}

/// Collect per-symbol outcomes and run the trend-aware final selection.
///
/// A failed symbol is recorded and skipped, never fatal to the run.
pub fn build_report(outcomes: Vec<(String, Result<SymbolEvaluation>)>) -> RunReport {
    let mut report = RunReport::default();

    for (symbol, outcome) in outcomes {
        match outcome {
            Ok(evaluation) => {
                report.trends.insert(symbol, evaluation.trend);
                report.evaluations.push(evaluation);
            }
            Err(e) => {
                error!(symbol = %symbol, error = %format!("{:#}", e), "Failed to process symbol");
                report.failures.push(SymbolFailure {
                    symbol,
                    error: format!("{:#}", e),
                });
            }
        }
    }

    let bests: Vec<SymbolBest> = report.evaluations.iter().map(|e| e.best.clone()).collect();
    report.recommendation = selector::select_final(&bests, &report.trends);

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, EXPIRY_DATE_FORMAT).unwrap()
    }

    fn ist(d: &str, h: u32, m: u32) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(crate::config::IST_OFFSET_SECS).unwrap();
        date(d)
            .and_hms_opt(h, m, 0)
            .unwrap()
            .and_local_timezone(offset)
            .unwrap()
    }

    #[test]
    fn test_calculate_days_to_expiry() {
        // partial trading day is not counted
        assert_eq!(calculate_days_to_expiry("28-Mar-2024", ist("21-Mar-2024", 10, 0)).unwrap(), 6);
        assert_eq!(calculate_days_to_expiry("28-Mar-2024", ist("21-Mar-2024", 0, 0)).unwrap(), 7);
        assert_eq!(calculate_days_to_expiry("22-Mar-2024", ist("21-Mar-2024", 15, 25)).unwrap(), 0);
        assert_eq!(calculate_days_to_expiry("21-Mar-2024", ist("21-Mar-2024", 10, 0)).unwrap(), -1);
        assert_eq!(calculate_days_to_expiry("20-Mar-2024", ist("21-Mar-2024", 10, 0)).unwrap(), -2);
        assert!(calculate_days_to_expiry("2024-03-28", ist("21-Mar-2024", 10, 0)).is_err());
    }

    #[test]
    fn test_time_to_expiry_is_floored_at_one_day() {
        assert_eq!(time_to_expiry_years(7), 7.0 / 365.0);
        assert_eq!(time_to_expiry_years(0), 1.0 / 365.0);
        assert_eq!(time_to_expiry_years(-3), 1.0 / 365.0);
    }

    #[test]
    fn test_select_expiry_skips_past_dates() {
        let dates = vec![
            "04-Apr-2024".to_string(),
            "21-Mar-2024".to_string(),
            "28-Mar-2024".to_string(),
        ];
        assert_eq!(select_expiry(&dates, date("22-Mar-2024")).unwrap(), "28-Mar-2024");
        assert_eq!(select_expiry(&dates, date("21-Mar-2024")).unwrap(), "21-Mar-2024");
        assert!(select_expiry(&dates, date("05-Apr-2024")).is_err());
        assert!(select_expiry(&[], date("05-Apr-2024")).is_err());
    }
}
