use crate::config::ScoringConfig;
use crate::models::{OptionKind, OptionQuote, PricingResult};
use serde::{Deserialize, Serialize};

/// Score and risk levels for one contract
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContractScore {
    pub score: f64,
    pub stop_loss: f64,
    pub target: f64,
}

/// Whether a quote may be priced and scored at all.
///
/// Zero IV, volume or price means the contract did not trade; far strikes are
/// outside the band around spot.
pub fn is_eligible(quote: &OptionQuote, spot: f64, config: &ScoringConfig) -> bool {
    quote.implied_volatility > 0.0
        && quote.total_traded_volume > 0.0
        && quote.last_traded_price > 0.0
        && (quote.strike - spot).abs() <= config.strike_band
}

/// Additive attractiveness score plus a fixed-ratio stop and target
pub fn score(quote: &OptionQuote, pricing: &PricingResult, config: &ScoringConfig) -> ContractScore {
    let w = &config.weights;
    let ltp = quote.last_traded_price;
    let mut score = 0.0;

    // Model says the market is underpricing it
    if pricing.theoretical_price > ltp {
        score += w.underpriced_bonus;
    }

    score += (quote.total_traded_volume / w.volume_divisor).min(w.volume_cap);

    score += match quote.kind {
        OptionKind::Call => pricing.delta * w.delta_weight,
        OptionKind::Put => pricing.delta.abs() * w.delta_weight,
    };

    score += pricing.vega * w.vega_weight;
    score -= pricing.theta * w.theta_weight;

    // IV crush risk
    if quote.implied_volatility > config.iv_threshold {
        score -= w.iv_crush_penalty;
    }

    let (stop_loss, target) = risk_levels(ltp, config);

    ContractScore {
        score,
        stop_loss,
        target,
    }
}

/// Stop at a fixed fraction of the price, target at `reward_multiple` times the risk
pub fn risk_levels(ltp: f64, config: &ScoringConfig) -> (f64, f64) {
    let stop_loss = round2(ltp * config.stop_loss_fraction);
    let target = round2(ltp + config.reward_multiple * (ltp - stop_loss));
    (stop_loss, target)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(kind: OptionKind, strike: f64, iv: f64, ltp: f64, volume: f64) -> OptionQuote {
        OptionQuote {
            symbol: "NIFTY".to_string(),
            expiry: "28-Mar-2024".to_string(),
            strike,
            kind,
            implied_volatility: iv,
            last_traded_price: ltp,
            total_traded_volume: volume,
        }
    }

    fn flat_pricing(theoretical_price: f64, delta: f64) -> PricingResult {
        PricingResult {
            theoretical_price,
            delta,
            theta: 0.0,
            vega: 0.0,
        }
    }

    #[test]
    fn test_eligibility() {
        let cfg = ScoringConfig::default();
        let spot = 22000.0;
        assert!(is_eligible(&quote(OptionKind::Call, 22000.0, 15.0, 150.0, 10.0), spot, &cfg));
        // Band is inclusive
        assert!(is_eligible(&quote(OptionKind::Call, 22200.0, 15.0, 150.0, 10.0), spot, &cfg));
        assert!(!is_eligible(&quote(OptionKind::Call, 22250.0, 15.0, 150.0, 10.0), spot, &cfg));
        assert!(!is_eligible(&quote(OptionKind::Put, 22000.0, 0.0, 150.0, 10.0), spot, &cfg));
        assert!(!is_eligible(&quote(OptionKind::Put, 22000.0, 15.0, 0.0, 10.0), spot, &cfg));
        assert!(!is_eligible(&quote(OptionKind::Put, 22000.0, 15.0, 150.0, 0.0), spot, &cfg));
    }

    #[test]
    fn test_volume_bonus_is_capped() {
        let cfg = ScoringConfig::default();
        let thin = score(&quote(OptionKind::Call, 22000.0, 15.0, 150.0, 5000.0), &flat_pricing(0.0, 0.0), &cfg);
        let deep = score(&quote(OptionKind::Call, 22000.0, 15.0, 150.0, 900_000.0), &flat_pricing(0.0, 0.0), &cfg);
        assert!((thin.score - 5.0).abs() < 1e-9);
        assert!((deep.score - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_put_delta_is_sign_normalized() {
        let cfg = ScoringConfig::default();
        let put = score(&quote(OptionKind::Put, 22000.0, 15.0, 150.0, 0.0), &flat_pricing(0.0, -0.4), &cfg);
        let call = score(&quote(OptionKind::Call, 22000.0, 15.0, 150.0, 0.0), &flat_pricing(0.0, 0.4), &cfg);
        assert!((put.score - 8.0).abs() < 1e-9);
        assert!((call.score - put.score).abs() < 1e-9);
    }

    #[test]
    fn test_iv_crush_penalty_and_underpricing_bonus() {
        let cfg = ScoringConfig::default();
        let calm = score(&quote(OptionKind::Call, 22000.0, 25.0, 150.0, 0.0), &flat_pricing(151.0, 0.0), &cfg);
        let hot = score(&quote(OptionKind::Call, 22000.0, 25.5, 150.0, 0.0), &flat_pricing(151.0, 0.0), &cfg);
        assert!((calm.score - 30.0).abs() < 1e-9);
        assert!((hot.score - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_theta_and_vega_terms() {
        let cfg = ScoringConfig::default();
        let pricing = PricingResult {
            theoretical_price: 0.0,
            delta: 0.0,
            theta: -2.0,
            vega: 1.5,
        };
        let res = score(&quote(OptionKind::Call, 22000.0, 15.0, 150.0, 0.0), &pricing, &cfg);
        // 10 * 1.5 - 5 * (-2.0)
        assert!((res.score - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_risk_levels() {
        let cfg = ScoringConfig::default();
        assert_eq!(risk_levels(150.0, &cfg), (120.0, 210.0));
        assert_eq!(risk_levels(85.35, &cfg), (68.28, 119.49));
    }
}
