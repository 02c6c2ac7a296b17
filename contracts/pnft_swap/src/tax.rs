//! Per-account escalating swap tax.
//!
//! Uninitialised ─initialize─► Active ─on_swap─► Active (rate +100, cap 3000)
//!                                  └──reset (≥ 24 h since last reset)──► rate 500

use crate::constants::{
    BPS_DENOMINATOR, INITIAL_TAX_BPS, TAX_CAP_BPS, TAX_INCREMENT_BPS, TAX_RESET_PERIOD_MS,
};
use crate::errors::Error;
use crate::{Balance, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(
    feature = "std",
    derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout)
)]
pub struct UserTaxState {
    pub tax_rate_bps: u16,
    /// Lifetime count of taxed swaps. Survives resets.
    pub swap_count: u32,
    pub last_reset_time: Timestamp,
}

/// Split of a taxed payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxQuote {
    pub tax: Balance,
    pub net: Balance,
}

impl UserTaxState {
    pub fn new(now: Timestamp) -> Self {
        Self {
            tax_rate_bps: INITIAL_TAX_BPS,
            swap_count: 0,
            last_reset_time: now,
        }
    }

    /// Advance after a taxed swap. The rate saturates at the cap.
    pub fn on_swap(&mut self) {
        self.swap_count = self.swap_count.saturating_add(1);
        self.tax_rate_bps = self
            .tax_rate_bps
            .saturating_add(TAX_INCREMENT_BPS)
            .min(TAX_CAP_BPS);
    }

    pub fn reset(&mut self, now: Timestamp) -> Result<(), Error> {
        let unlocks_at = self
            .last_reset_time
            .checked_add(TAX_RESET_PERIOD_MS)
            .ok_or(Error::Overflow)?;
        if now < unlocks_at {
            return Err(Error::TaxResetTooEarly);
        }
        self.tax_rate_bps = INITIAL_TAX_BPS;
        self.last_reset_time = now;
        Ok(())
    }

    /// `tax = price × rate / 10 000` (truncating), `net = price − tax`.
    pub fn quote(&self, price: Balance) -> Result<TaxQuote, Error> {
        let tax = price
            .checked_mul(Balance::from(self.tax_rate_bps))
            .ok_or(Error::Overflow)?
            .checked_div(BPS_DENOMINATOR)
            .ok_or(Error::Overflow)?;
        let net = price.checked_sub(tax).ok_or(Error::Overflow)?;
        Ok(TaxQuote { tax, net })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Timestamp = 24 * 60 * 60 * 1_000;

    #[test]
    fn starts_at_five_percent() {
        let s = UserTaxState::new(1_000);
        assert_eq!(s.tax_rate_bps, 500);
        assert_eq!(s.swap_count, 0);
        assert_eq!(s.last_reset_time, 1_000);
    }

    #[test]
    fn one_swap_adds_one_percent() {
        let mut s = UserTaxState::new(0);
        s.on_swap();
        assert_eq!(s.tax_rate_bps, 600);
        assert_eq!(s.swap_count, 1);
    }

    #[test]
    fn rate_saturates_at_cap() {
        let mut s = UserTaxState::new(0);
        for _ in 0..100 {
            s.on_swap();
            assert!((INITIAL_TAX_BPS..=TAX_CAP_BPS).contains(&s.tax_rate_bps));
        }
        assert_eq!(s.tax_rate_bps, TAX_CAP_BPS);
        assert_eq!(s.swap_count, 100);
    }

    #[test]
    fn reset_gated_by_a_day() {
        let mut s = UserTaxState::new(0);
        s.on_swap();
        assert_eq!(s.reset(DAY - 1), Err(Error::TaxResetTooEarly));
        assert_eq!(s.tax_rate_bps, 600);

        s.reset(DAY + 1_000).unwrap();
        assert_eq!(s.tax_rate_bps, 500);
        assert_eq!(s.last_reset_time, DAY + 1_000);
        assert_eq!(s.swap_count, 1, "swap count is historical");
    }

    #[test]
    fn reset_window_restarts_from_last_reset() {
        let mut s = UserTaxState::new(0);
        s.reset(DAY).unwrap();
        assert_eq!(s.reset(2 * DAY - 1), Err(Error::TaxResetTooEarly));
        s.reset(2 * DAY).unwrap();
    }

    #[test]
    fn quote_truncates() {
        let s = UserTaxState::new(0);
        assert_eq!(s.quote(200).unwrap(), TaxQuote { tax: 10, net: 190 });
        // 199 × 500 / 10 000 = 9.95 → 9
        assert_eq!(s.quote(199).unwrap(), TaxQuote { tax: 9, net: 190 });
        assert_eq!(s.quote(0).unwrap(), TaxQuote { tax: 0, net: 0 });
    }

    #[test]
    fn quote_overflow_is_reported() {
        let s = UserTaxState::new(0);
        assert_eq!(s.quote(Balance::MAX), Err(Error::Overflow));
    }
}
