use crate::config::TrendConfig;
use crate::models::{PriceBar, Trend};
use tracing::{info, warn};

/// Label the intraday trend of `symbol` from its proxy's bars.
///
/// Only bars inside the configured session window count. Too few of them is
/// not an error: the symbol is treated as sideways.
pub fn classify(symbol: &str, bars: &[PriceBar], config: &TrendConfig) -> Trend {
    let session: Vec<&PriceBar> = session_bars(bars, config).collect();

    if session.len() < config.min_bars {
        warn!(
            symbol,
            bars = session.len(),
            min_bars = config.min_bars,
            "Not enough data to detect trend, defaulting to sideways"
        );
        return Trend::Sideways;
    }

    // Non-empty here since min_bars guards it, unless min_bars is 0
    let (Some(first), Some(last)) = (session.first(), session.last()) else {
        return Trend::Sideways;
    };
    let Some(pct_change) = percent_change(first.open, last.close) else {
        warn!(symbol, open = first.open, "Session open is not positive, defaulting to sideways");
        return Trend::Sideways;
    };

    let trend = label(pct_change, config);
    info!(symbol, %trend, pct_change = %format!("{:.2}", pct_change), "Trend detected");
    trend
}

/// Bars whose exchange-local time of day falls inside the session window
pub fn session_bars<'a>(
    bars: &'a [PriceBar],
    config: &'a TrendConfig,
) -> impl Iterator<Item = &'a PriceBar> + 'a {
    bars.iter()
        .filter(move |bar| config.session.contains(bar.timestamp.time()))
}

/// Percent move from `open` to `close`, None when `open` is not positive
pub fn percent_change(open: f64, close: f64) -> Option<f64> {
    if open > 0.0 {
        Some((close - open) / open * 100.0)
    } else {
        None
    }
}

fn label(pct_change: f64, config: &TrendConfig) -> Trend {
    if pct_change > config.up_threshold {
        Trend::Up
    } else if pct_change < config.down_threshold {
        Trend::Down
    } else {
        Trend::Sideways
    }
}
