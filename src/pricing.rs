//! Black-Scholes pricing with the Greeks the scorer consumes.

use crate::config::DAYS_PER_YEAR;
use crate::error::AnalyzerError;
use crate::models::{OptionKind, PricingResult};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

/// Price a European option and its delta, theta and vega.
///
/// The put leg is derived from the call through put-call parity so both
/// deltas at one strike always differ by exactly 1. Theta is the per-day
/// decay term `-S·φ(d1)·σ / (2√T) / 365`, shared by both kinds. Vega is
/// per 1 vol point.
pub fn price(
    spot: f64,
    strike: f64,
    time_to_expiry_years: f64,
    risk_free_rate: f64,
    volatility: f64,
    kind: OptionKind,
) -> Result<PricingResult, AnalyzerError> {
    ensure_positive("spot", spot)?;
    ensure_positive("strike", strike)?;
    ensure_positive("time_to_expiry", time_to_expiry_years)?;
    ensure_positive("volatility", volatility)?;
    if !risk_free_rate.is_finite() {
        return Err(AnalyzerError::InvalidInput(format!(
            "risk_free_rate must be finite, got {}",
            risk_free_rate
        )));
    }

    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AnalyzerError::InvalidInput(format!("standard normal: {}", e)))?;

    let sqrt_t = time_to_expiry_years.sqrt();
    let vol_sqrt_t = volatility * sqrt_t;
    let d1 = ((spot / strike).ln()
        + (risk_free_rate + 0.5 * volatility * volatility) * time_to_expiry_years)
        / vol_sqrt_t;
    let d2 = d1 - vol_sqrt_t;

    let discounted_strike = strike * (-risk_free_rate * time_to_expiry_years).exp();
    let call_price = spot * normal.cdf(d1) - discounted_strike * normal.cdf(d2);
    let call_delta = normal.cdf(d1);

    let (theoretical_price, delta) = match kind {
        OptionKind::Call => (call_price, call_delta),
        OptionKind::Put => (call_price - spot + discounted_strike, call_delta - 1.0),
    };

    let density = normal.pdf(d1);
    let theta = -spot * density * volatility / (2.0 * sqrt_t) / DAYS_PER_YEAR;
    let vega = spot * density * sqrt_t / 100.0;

    Ok(PricingResult {
        theoretical_price,
        delta,
        theta,
        vega,
    })
}

fn ensure_positive(name: &str, value: f64) -> Result<(), AnalyzerError> {
    // NaN fails the comparison as well
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(AnalyzerError::InvalidInput(format!(
            "{} must be positive and finite, got {}",
            name, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T_WEEK: f64 = 7.0 / 365.0;

    #[test]
    fn test_atm_weekly_call() {
        let res = price(22000.0, 22000.0, T_WEEK, 0.068, 0.15, OptionKind::Call).unwrap();
        assert!(res.theoretical_price > 180.0 && res.theoretical_price < 210.0);
        assert!((res.delta - 0.529).abs() < 0.005);
        assert!(res.theta < 0.0);
        assert!(res.vega > 0.0);
    }

    #[test]
    fn test_put_call_parity() {
        let (s, k, t, r, v) = (22150.0, 22000.0, 0.05, 0.068, 0.18);
        let call = price(s, k, t, r, v, OptionKind::Call).unwrap();
        let put = price(s, k, t, r, v, OptionKind::Put).unwrap();
        let parity = s - k * (-r * t).exp();
        assert!((call.theoretical_price - put.theoretical_price - parity).abs() < 1e-6);
        assert!((call.delta - put.delta - 1.0).abs() < 1e-12);
        assert_eq!(call.theta, put.theta);
        assert_eq!(call.vega, put.vega);
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        assert!(matches!(
            price(22000.0, 22000.0, T_WEEK, 0.068, 0.0, OptionKind::Call),
            Err(AnalyzerError::InvalidInput(_))
        ));
        assert!(price(22000.0, 22000.0, 0.0, 0.068, 0.15, OptionKind::Put).is_err());
        assert!(price(-1.0, 22000.0, T_WEEK, 0.068, 0.15, OptionKind::Call).is_err());
        assert!(price(22000.0, 0.0, T_WEEK, 0.068, 0.15, OptionKind::Call).is_err());
        assert!(price(22000.0, 22000.0, T_WEEK, 0.068, f64::NAN, OptionKind::Call).is_err());
        assert!(price(22000.0, 22000.0, T_WEEK, f64::INFINITY, 0.15, OptionKind::Call).is_err());
    }
}
