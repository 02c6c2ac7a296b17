//! Cliff-and-linear vesting grants.
//!
//! ```text
//!   vested(t) = 0                                   t < start + cliff   (claims rejected)
//!             = total × (t − start) / duration      otherwise, t < start + duration
//!             = total                               t ≥ start + duration
//!   releasable = vested − released
//! ```
//!
//! `total_amount` starts at the principal and grows when a randomness bonus
//! resolves. A reroll drops the bonus again but never below what was already
//! released, so `released ≤ total_amount` holds across every transition.

use crate::constants::BPS_DENOMINATOR;
use crate::errors::Error;
use crate::randomness::RequestId;
use crate::{Balance, Timestamp, TokenId};
use ink::primitives::AccountId;

pub type GrantId = u64;

/// The entry point that opened a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(
    feature = "std",
    derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout)
)]
pub enum GrantSource {
    Og { token_id: TokenId },
    Current { tier: u8, token_id: TokenId },
    Airdrop,
}

impl GrantSource {
    pub fn token_id(&self) -> Option<TokenId> {
        match self {
            GrantSource::Og { token_id } | GrantSource::Current { token_id, .. } => {
                Some(*token_id)
            }
            GrantSource::Airdrop => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(
    feature = "std",
    derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout)
)]
pub struct VestingGrant {
    pub account: AccountId,
    pub source: GrantSource,
    pub principal: Balance,
    pub total_amount: Balance,
    pub start_time: Timestamp,
    pub cliff_duration: Timestamp,
    pub vesting_duration: Timestamp,
    pub released: Balance,
    /// Bonus currently folded into `total_amount`.
    pub bonus_bps: u16,
    /// Randomness request whose answer has not been applied yet.
    pub pending_request: Option<RequestId>,
}

impl VestingGrant {
    pub fn open(
        account: AccountId,
        source: GrantSource,
        principal: Balance,
        now: Timestamp,
        cliff_duration: Timestamp,
        vesting_duration: Timestamp,
    ) -> Result<Self, Error> {
        if vesting_duration == 0 {
            return Err(Error::InvalidInput);
        }
        Ok(Self {
            account,
            source,
            principal,
            total_amount: principal,
            start_time: now,
            cliff_duration,
            vesting_duration,
            released: 0,
            bonus_bps: 0,
            pending_request: None,
        })
    }

    pub fn cliff_end(&self) -> Timestamp {
        self.start_time.saturating_add(self.cliff_duration)
    }

    pub fn vested_at(&self, now: Timestamp) -> Result<Balance, Error> {
        let elapsed = now.saturating_sub(self.start_time);
        if elapsed >= self.vesting_duration {
            return Ok(self.total_amount);
        }
        self.total_amount
            .checked_mul(Balance::from(elapsed))
            .ok_or(Error::Overflow)?
            .checked_div(Balance::from(self.vesting_duration))
            .ok_or(Error::Overflow)
    }

    /// Amount a claim at `now` would release; zero inside the cliff.
    pub fn releasable_at(&self, now: Timestamp) -> Result<Balance, Error> {
        if now < self.cliff_end() {
            return Ok(0);
        }
        Ok(self.vested_at(now)?.saturating_sub(self.released))
    }

    /// Mark the releasable amount as paid out and return it.
    pub fn claim(&mut self, now: Timestamp) -> Result<Balance, Error> {
        if now < self.cliff_end() {
            return Err(Error::StillInCliff);
        }
        let releasable = self.releasable_at(now)?;
        if releasable == 0 {
            return Err(Error::NothingToClaim);
        }
        self.released = self
            .released
            .checked_add(releasable)
            .ok_or(Error::Overflow)?;
        Ok(releasable)
    }

    /// Grow the grant by `principal × bonus_bps / 10 000`; returns the bonus.
    pub fn apply_bonus(&mut self, bonus_bps: u16) -> Result<Balance, Error> {
        let bonus = self
            .principal
            .checked_mul(Balance::from(bonus_bps))
            .ok_or(Error::Overflow)?
            .checked_div(BPS_DENOMINATOR)
            .ok_or(Error::Overflow)?;
        self.total_amount = self
            .total_amount
            .checked_add(bonus)
            .ok_or(Error::Overflow)?;
        self.bonus_bps = bonus_bps;
        self.pending_request = None;
        Ok(bonus)
    }

    /// Forfeit the current bonus and restart the schedule at `now`, ahead of
    /// a fresh bonus draw.
    pub fn restart(&mut self, now: Timestamp) -> Result<(), Error> {
        if self.pending_request.is_some() {
            return Err(Error::BonusPending);
        }
        if self.released >= self.total_amount {
            return Err(Error::NothingToClaim);
        }
        self.total_amount = self.principal.max(self.released);
        self.bonus_bps = 0;
        self.start_time = now;
        Ok(())
    }

    /// Principal not yet paid out. Released bonus counts against it.
    pub fn refundable(&self) -> Balance {
        self.principal.saturating_sub(self.released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Timestamp = 24 * 60 * 60 * 1_000;
    const CLIFF: Timestamp = 2 * DAY;
    const DURATION: Timestamp = 90 * DAY;
    const START: Timestamp = 10 * DAY;

    fn grant(total: Balance) -> VestingGrant {
        VestingGrant::open(
            AccountId::from([1; 32]),
            GrantSource::Og { token_id: 7 },
            total,
            START,
            CLIFF,
            DURATION,
        )
        .unwrap()
    }

    #[test]
    fn zero_duration_rejected() {
        let r = VestingGrant::open(AccountId::from([1; 32]), GrantSource::Airdrop, 10, 0, 0, 0);
        assert_eq!(r, Err(Error::InvalidInput));
    }

    #[test]
    fn claim_inside_cliff_rejected() {
        let mut g = grant(9_000);
        assert_eq!(g.claim(START), Err(Error::StillInCliff));
        assert_eq!(g.claim(START + CLIFF - 1), Err(Error::StillInCliff));
        assert_eq!(g.released, 0);
        assert_eq!(g.releasable_at(START + CLIFF - 1).unwrap(), 0);
    }

    #[test]
    fn linear_release_after_cliff() {
        let mut g = grant(9_000);
        // 2 / 90 of 9 000 = 200
        assert_eq!(g.claim(START + CLIFF).unwrap(), 200);
        // 45 / 90 of 9 000 = 4 500, minus 200 already released
        assert_eq!(g.claim(START + 45 * DAY).unwrap(), 4_300);
        assert_eq!(g.released, 4_500);
    }

    #[test]
    fn second_claim_in_same_instant_has_nothing() {
        let mut g = grant(9_000);
        g.claim(START + 30 * DAY).unwrap();
        assert_eq!(g.claim(START + 30 * DAY), Err(Error::NothingToClaim));
    }

    #[test]
    fn fully_released_at_end_and_never_more() {
        let mut g = grant(1_001);
        g.claim(START + 3 * DAY).unwrap();
        g.claim(START + DURATION).unwrap();
        assert_eq!(g.released, g.total_amount);
        assert_eq!(g.claim(START + 10 * DURATION), Err(Error::NothingToClaim));
        assert_eq!(g.released, 1_001);
    }

    #[test]
    fn released_never_exceeds_total_over_many_claims() {
        let mut g = grant(7_777);
        let mut t = START + CLIFF;
        while t <= START + DURATION + DAY {
            let _ = g.claim(t);
            assert!(g.released <= g.total_amount);
            t += DAY / 3;
        }
        assert_eq!(g.released, g.total_amount);
    }

    #[test]
    fn bonus_grows_total_but_not_principal() {
        let mut g = grant(10_000);
        assert_eq!(g.apply_bonus(1_500).unwrap(), 1_500);
        assert_eq!(g.total_amount, 11_500);
        assert_eq!(g.principal, 10_000);
    }

    #[test]
    fn late_bonus_is_claimable_after_full_release() {
        let mut g = grant(10_000);
        assert_eq!(g.claim(START + DURATION).unwrap(), 10_000);
        g.apply_bonus(30_000).unwrap();
        assert_eq!(g.claim(START + DURATION + 1).unwrap(), 30_000);
        assert_eq!(g.released, g.total_amount);
    }

    #[test]
    fn bonus_clears_pending_request() {
        let mut g = grant(10_000);
        g.pending_request = Some(4);
        g.apply_bonus(2_000).unwrap();
        assert_eq!(g.pending_request, None);
        assert_eq!(g.bonus_bps, 2_000);
    }

    #[test]
    fn restart_drops_bonus_and_resets_clock() {
        let mut g = grant(9_000);
        g.apply_bonus(5_000).unwrap();
        g.claim(START + 45 * DAY).unwrap();
        assert_eq!(g.released, 6_750);

        g.restart(START + 50 * DAY).unwrap();
        assert_eq!(g.total_amount, 9_000);
        assert_eq!(g.bonus_bps, 0);
        assert_eq!(g.start_time, START + 50 * DAY);
        assert_eq!(g.released, 6_750);
        assert_eq!(
            g.claim(START + 50 * DAY + CLIFF - 1),
            Err(Error::StillInCliff)
        );
        g.claim(START + 50 * DAY + DURATION).unwrap();
        assert_eq!(g.released, 9_000);
    }

    #[test]
    fn restart_never_drops_below_released() {
        let mut g = grant(1_000);
        g.apply_bonus(30_000).unwrap();
        g.claim(START + 60 * DAY).unwrap();
        assert!(g.released > g.principal);

        g.restart(START + 61 * DAY).unwrap();
        assert_eq!(g.total_amount, g.released);
        assert!(g.released <= g.total_amount);
    }

    #[test]
    fn restart_blocked_while_bonus_pending_or_fully_released() {
        let mut g = grant(1_000);
        g.pending_request = Some(1);
        assert_eq!(g.restart(START + DAY), Err(Error::BonusPending));

        g.apply_bonus(0).unwrap();
        g.claim(START + DURATION).unwrap();
        assert_eq!(g.restart(START + DURATION), Err(Error::NothingToClaim));
    }

    #[test]
    fn refundable_is_unreleased_principal() {
        let mut g = grant(9_000);
        assert_eq!(g.refundable(), 9_000);
        g.claim(START + 45 * DAY).unwrap();
        assert_eq!(g.refundable(), 4_500);
        g.apply_bonus(30_000).unwrap();
        g.claim(START + DURATION).unwrap();
        assert_eq!(g.refundable(), 0);
    }

    #[test]
    fn source_exposes_token_id() {
        assert_eq!(GrantSource::Og { token_id: 3 }.token_id(), Some(3));
        assert_eq!(GrantSource::Current { tier: 2, token_id: 8 }.token_id(), Some(8));
        assert_eq!(GrantSource::Airdrop.token_id(), None);
    }
}
