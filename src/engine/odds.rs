//! American/decimal odds conversion and parlay price combination.
//!
//! Legs are treated as independent: the combined decimal price is the plain
//! product of the per-leg decimal prices.

use crate::error::{ParlayError, Result};
use serde::{Deserialize, Serialize};

/// Positive odds (e.g. +120): decimal = odds / 100 + 1
/// Negative odds (e.g. -110): decimal = 100 / |odds| + 1
pub fn american_to_decimal(odds: i32) -> Result<f64> {
    if odds == 0 {
        return Err(ParlayError::InvalidOdds("American odds cannot be 0".to_string()));
    }
    if odds > 0 {
        Ok(odds as f64 / 100.0 + 1.0)
    } else {
        Ok(100.0 / (odds as f64).abs() + 1.0)
    }
}

/// Inverse of [`american_to_decimal`], rounded to the nearest whole price.
///
/// Long parlays price far beyond `i32`, so the result is `i64`. A price
/// that does not fit even there is an error rather than a clamped value.
pub fn decimal_to_american(decimal: f64) -> Result<i64> {
    if !decimal.is_finite() || decimal <= 1.0 {
        return Err(ParlayError::InvalidOdds(format!(
            "decimal odds must be greater than 1.0, got {decimal}"
        )));
    }
    let american = if decimal >= 2.0 {
        ((decimal - 1.0) * 100.0).round()
    } else {
        (-100.0 / (decimal - 1.0)).round()
    };
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range
    if american.abs() >= i64::MAX as f64 {
        return Err(ParlayError::InvalidOdds(format!(
            "decimal odds {decimal} have no American equivalent in range"
        )));
    }
    Ok(american as i64)
}

/// Implied probability (0-1) of American odds, vig included.
/// Positive odds (e.g., +150): prob = 100 / (odds + 100)
/// Negative odds (e.g., -150): prob = |odds| / (|odds| + 100)
pub fn implied_probability(odds: i32) -> Result<f64> {
    if odds == 0 {
        return Err(ParlayError::InvalidOdds("American odds cannot be 0".to_string()));
    }
    let odds = odds as f64;
    if odds > 0.0 {
        Ok(100.0 / (odds + 100.0))
    } else {
        let abs = odds.abs();
        Ok(abs / (abs + 100.0))
    }
}

/// Combined price and payout for a set of legs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombinedOdds {
    pub decimal: f64,
    pub american: i64,
    pub wager: f64,
    /// Profit if every leg hits: wager * decimal - wager.
    pub potential_win: f64,
    /// Total returned if every leg hits: wager * decimal.
    pub payout: f64,
}

/// Product of the per-leg decimal odds.
pub fn combined_decimal(legs: &[i32]) -> Result<f64> {
    if legs.is_empty() {
        return Err(ParlayError::InvalidInput("no legs to combine".to_string()));
    }
    legs.iter()
        .try_fold(1.0, |acc, &odds| Ok(acc * american_to_decimal(odds)?))
}

pub fn combine(legs: &[i32], wager: f64) -> Result<CombinedOdds> {
    if !wager.is_finite() || wager <= 0.0 {
        return Err(ParlayError::InvalidInput(format!("wager must be positive, got {wager}")));
    }
    let decimal = combined_decimal(legs)?;
    let payout = wager * decimal;
    Ok(CombinedOdds {
        decimal,
        american: decimal_to_american(decimal)?,
        wager,
        potential_win: payout - wager,
        payout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_american_to_decimal() {
        assert!((american_to_decimal(-110).unwrap() - 1.909).abs() < 0.001);
        assert!((american_to_decimal(120).unwrap() - 2.2).abs() < 1e-12);
        assert!((american_to_decimal(100).unwrap() - 2.0).abs() < 1e-12);
        assert!((american_to_decimal(-200).unwrap() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_odds_rejected() {
        assert!(matches!(american_to_decimal(0), Err(ParlayError::InvalidOdds(_))));
        assert!(matches!(implied_probability(0), Err(ParlayError::InvalidOdds(_))));
        assert!(matches!(combine(&[-110, 0], 10.0), Err(ParlayError::InvalidOdds(_))));
    }

    #[test]
    fn test_decimal_to_american_inverts() {
        for odds in [-300, -150, -110, 100, 120, 250, 600] {
            let decimal = american_to_decimal(odds).unwrap();
            assert_eq!(decimal_to_american(decimal).unwrap(), i64::from(odds), "odds {odds}");
        }
        assert!(decimal_to_american(1.0).is_err());
        assert!(decimal_to_american(f64::NAN).is_err());
    }

    #[test]
    fn test_implied_probability() {
        assert!((implied_probability(-150).unwrap() - 0.6).abs() < 0.001);
        assert!((implied_probability(150).unwrap() - 0.4).abs() < 0.001);
    }

    #[test]
    fn test_combined_decimal_is_exact_product() {
        let legs = [-110, 120, -200];
        let expected = american_to_decimal(-110).unwrap()
            * american_to_decimal(120).unwrap()
            * american_to_decimal(-200).unwrap();
        assert_eq!(combined_decimal(&legs).unwrap(), expected);
    }

    #[test]
    fn test_combine_payout() {
        // 2.2 * 2.0 = 4.4 -> +340, $10 returns $44 for a $34 profit
        let combined = combine(&[120, 100], 10.0).unwrap();
        assert!((combined.decimal - 4.4).abs() < 1e-9);
        assert_eq!(combined.american, 340);
        assert!((combined.payout - 44.0).abs() < 1e-9);
        assert!((combined.potential_win - 34.0).abs() < 1e-9);
    }

    #[test]
    fn test_long_parlay_price_does_not_saturate() {
        // ten +900 legs: 10^10 decimal
        let combined = combine(&[900; 10], 10.0).unwrap();
        assert!((combined.decimal - 1e10).abs() < 1e-3);
        assert_eq!(combined.american, 999_999_999_900);
        assert!(combined.american > i64::from(i32::MAX));
    }

    #[test]
    fn test_price_beyond_i64_is_rejected() {
        assert!(matches!(decimal_to_american(1e300), Err(ParlayError::InvalidOdds(_))));
        assert!(matches!(combine(&[i32::MAX; 8], 10.0), Err(ParlayError::InvalidOdds(_))));
    }

    #[test]
    fn test_combine_rejects_bad_wager_and_empty_legs() {
        assert!(matches!(combine(&[-110], 0.0), Err(ParlayError::InvalidInput(_))));
        assert!(matches!(combine(&[], 10.0), Err(ParlayError::InvalidInput(_))));
    }
}
