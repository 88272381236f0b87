//! Prices

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, iso};

/// Express `amount` as Indian rupees, rounded half-up to the paisa.
///
/// Returns `None` when the amount is too large to represent in minor units.
pub fn inr(amount: Decimal) -> Option<Money<'static, iso::Currency>> {
    let minor = amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(Decimal::ONE_HUNDRED)?
        .to_i64()?;

    Some(Money::from_minor(minor, iso::INR))
}

/// Render `amount` for display, e.g. `₹250.00`.
pub fn format_inr(amount: Decimal) -> String {
    inr(amount).map_or_else(|| format!("₹{amount:.2}"), |money| money.to_string())
}

/// Render a weight in kilograms with gram precision, e.g. `1.250 kg`.
pub fn format_weight(kilograms: Decimal) -> String {
    format!(
        "{:.3} kg",
        kilograms.round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
    )
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn inr_converts_to_paise() -> TestResult {
        let money = inr(Decimal::new(2505, 1)).ok_or("overflow")?;

        assert_eq!(money, Money::from_minor(25_050, iso::INR));

        Ok(())
    }

    #[test]
    fn inr_rounds_half_up() -> TestResult {
        let money = inr(Decimal::new(10_005, 3)).ok_or("overflow")?;

        assert_eq!(money, Money::from_minor(1_001, iso::INR));

        Ok(())
    }

    #[test]
    fn format_inr_uses_rupee_symbol() {
        let formatted = format_inr(Decimal::new(250, 0));

        assert!(formatted.starts_with('₹'), "unexpected format: {formatted}");
        assert!(formatted.ends_with("250.00"), "unexpected format: {formatted}");
    }

    #[test]
    fn format_inr_falls_back_when_out_of_range() {
        assert_eq!(format_inr(Decimal::MAX), format!("₹{:.2}", Decimal::MAX));
    }

    #[test]
    fn format_weight_shows_grams() {
        assert_eq!(format_weight(Decimal::new(125, 2)), "1.250 kg");
        assert_eq!(format_weight(Decimal::ZERO), "0.000 kg");
        assert_eq!(format_weight(Decimal::new(12_345, 4)), "1.235 kg");
    }
}
