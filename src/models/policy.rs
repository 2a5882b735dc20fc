use rust_decimal::Decimal;
use serde::Deserialize;

/// Late-return penalty: a flat amount per day overdue, capped per loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FinePolicy {
    pub daily_rate: Decimal,
    pub cap: Decimal,
}

impl FinePolicy {
    pub fn new(daily_rate: Decimal, cap: Decimal) -> Self {
        Self { daily_rate, cap }
    }

    /// Amount owed for `days` days late, rounded to cents.
    pub fn fine_for(&self, days: i64) -> Decimal {
        if days <= 0 {
            return Decimal::ZERO;
        }
        (Decimal::from(days) * self.daily_rate)
            .min(self.cap)
            .round_dp(2)
    }
}

impl Default for FinePolicy {
    /// €0.50 a day, at most €10.00 per loan.
    fn default() -> Self {
        Self {
            daily_rate: Decimal::new(50, 2),
            cap: Decimal::new(1000, 2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_charges_fifty_cents_a_day() {
        let policy = FinePolicy::default();
        assert_eq!(policy.fine_for(5), Decimal::new(250, 2));
        assert_eq!(policy.fine_for(19), Decimal::new(950, 2));
    }

    #[test]
    fn fine_is_capped() {
        let policy = FinePolicy::default();
        assert_eq!(policy.fine_for(20), Decimal::new(1000, 2));
        assert_eq!(policy.fine_for(25), Decimal::new(1000, 2));
        assert_eq!(policy.fine_for(400), Decimal::new(1000, 2));
    }

    #[test]
    fn nothing_owed_when_not_late() {
        let policy = FinePolicy::default();
        assert_eq!(policy.fine_for(0), Decimal::ZERO);
        assert_eq!(policy.fine_for(-3), Decimal::ZERO);
    }

    #[test]
    fn custom_rate_and_cap() {
        let policy = FinePolicy::new(Decimal::new(25, 2), Decimal::new(500, 2));
        assert_eq!(policy.fine_for(4), Decimal::ONE);
        assert_eq!(policy.fine_for(30), Decimal::new(5, 0));
    }
}
