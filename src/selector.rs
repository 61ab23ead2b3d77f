use crate::config::EngineConfig;
use crate::error::AnalyzerError;
use crate::models::{OptionKind, OptionQuote, Recommendation, ScoredContract, Trend, TrendMap};
use crate::{pricing, scorer};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Spot and time to expiry shared by every contract of one chain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    pub spot: f64,
    pub time_to_expiry_years: f64,
}

/// Highest-scoring call and put of one symbol
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolBest {
    pub symbol: String,
    pub call: Option<ScoredContract>,
    pub put: Option<ScoredContract>,
}

impl SymbolBest {
    /// Call first, then put
    pub fn contracts(&self) -> impl Iterator<Item = &ScoredContract> {
        self.call.iter().chain(self.put.iter())
    }
}

/// Price and score one eligible quote
pub fn score_contract(
    quote: &OptionQuote,
    market: &MarketContext,
    config: &EngineConfig,
) -> Result<ScoredContract, AnalyzerError> {
    let pricing = pricing::price(
        market.spot,
        quote.strike,
        market.time_to_expiry_years,
        config.risk_free_rate,
        quote.volatility(),
        quote.kind,
    )?;
    let scored = scorer::score(quote, &pricing, &config.scoring);

    Ok(ScoredContract {
        quote: quote.clone(),
        pricing,
        score: scored.score,
        stop_loss: scored.stop_loss,
        target: scored.target,
    })
}

/// Best call and best put among the eligible contracts of `symbol`.
///
/// Ties keep the contract seen first.
pub fn select_best(
    symbol: &str,
    contracts: &[OptionQuote],
    market: &MarketContext,
    config: &EngineConfig,
) -> Result<SymbolBest, AnalyzerError> {
    let mut best = SymbolBest {
        symbol: symbol.to_string(),
        ..Default::default()
    };

    for quote in contracts {
        if !scorer::is_eligible(quote, market.spot, &config.scoring) {
            continue;
        }

        let scored = score_contract(quote, market, config)?;
        debug!(
            symbol,
            strike = quote.strike,
            kind = %quote.kind,
            score = scored.score,
            "Scored contract"
        );

        let slot = match quote.kind {
            OptionKind::Call => &mut best.call,
            OptionKind::Put => &mut best.put,
        };
        keep_higher(slot, scored);
    }

    Ok(best)
}

fn keep_higher(slot: &mut Option<ScoredContract>, candidate: ScoredContract) {
    let replace = match slot {
        Some(current) => candidate.score > current.score,
        None => true,
    };
    if replace {
        *slot = Some(candidate);
    }
}

/// Per-symbol bests whose kind agrees with the symbol's trend.
///
/// Symbols without a trend label count as sideways.
pub fn final_candidates<'a>(
    per_symbol: &'a [SymbolBest],
    trends: &TrendMap,
) -> Vec<(&'a ScoredContract, Trend)> {
    per_symbol
        .iter()
        .flat_map(|best| {
            let trend = trends.get(&best.symbol).copied().unwrap_or(Trend::Sideways);
            best.contracts()
                .filter(move |c| trend.admits(c.quote.kind))
                .map(move |c| (c, trend))
        })
        .collect()
}

/// Highest-scoring trend-consistent contract across all symbols
pub fn select_final(per_symbol: &[SymbolBest], trends: &TrendMap) -> Option<Recommendation> {
    let mut winner: Option<(&ScoredContract, Trend)> = None;

    for (contract, trend) in final_candidates(per_symbol, trends) {
        let replace = match winner {
            Some((current, _)) => contract.score > current.score,
            None => true,
        };
        if replace {
            winner = Some((contract, trend));
        }
    }

    winner.map(|(contract, trend)| Recommendation {
        contract: contract.clone(),
        trend,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PricingResult;

    fn scored(symbol: &str, kind: OptionKind, score: f64) -> ScoredContract {
        ScoredContract {
            quote: OptionQuote {
                symbol: symbol.to_string(),
                expiry: "28-Mar-2024".to_string(),
                strike: 22000.0,
                kind,
                implied_volatility: 15.0,
                last_traded_price: 100.0,
                total_traded_volume: 1000.0,
            },
            pricing: PricingResult {
                theoretical_price: 100.0,
                delta: 0.5,
                theta: -1.0,
                vega: 1.0,
            },
            score,
            stop_loss: 80.0,
            target: 140.0,
        }
    }

    #[test]
    fn test_keep_higher_is_strict() {
        let mut slot = None;
        let mut first = scored("NIFTY", OptionKind::Call, 40.0);
        first.quote.strike = 21900.0;
        keep_higher(&mut slot, first);
        keep_higher(&mut slot, scored("NIFTY", OptionKind::Call, 40.0));
        assert_eq!(slot.as_ref().unwrap().quote.strike, 21900.0);

        keep_higher(&mut slot, scored("NIFTY", OptionKind::Call, 41.0));
        assert_eq!(slot.as_ref().unwrap().quote.strike, 22000.0);
    }

    #[test]
    fn test_missing_trend_counts_as_sideways() {
        let per_symbol = vec![SymbolBest {
            symbol: "FINNIFTY".to_string(),
            call: Some(scored("FINNIFTY", OptionKind::Call, 10.0)),
            put: Some(scored("FINNIFTY", OptionKind::Put, 12.0)),
        }];
        let candidates = final_candidates(&per_symbol, &TrendMap::new());
        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(|(_, t)| *t == Trend::Sideways));
    }

    #[test]
    fn test_candidates_outlive_trend_map() {
        let per_symbol = vec![SymbolBest {
            symbol: "NIFTY".to_string(),
            call: Some(scored("NIFTY", OptionKind::Call, 50.0)),
            put: Some(scored("NIFTY", OptionKind::Put, 40.0)),
        }];
        let candidates = {
            let mut trends = TrendMap::new();
            trends.insert("NIFTY".to_string(), Trend::Down);
            final_candidates(&per_symbol, &trends)
        };
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].0.quote.kind, OptionKind::Put);
        assert_eq!(candidates[0].1, Trend::Down);
    }

    #[test]
    fn test_final_tie_keeps_first_symbol() {
        let per_symbol = vec![
            SymbolBest {
                symbol: "NIFTY".to_string(),
                call: Some(scored("NIFTY", OptionKind::Call, 60.0)),
                put: None,
            },
            SymbolBest {
                symbol: "BANKNIFTY".to_string(),
                call: Some(scored("BANKNIFTY", OptionKind::Call, 60.0)),
                put: None,
            },
        ];
        let pick = select_final(&per_symbol, &TrendMap::new()).unwrap();
        assert_eq!(pick.contract.quote.symbol, "NIFTY");
    }
}
