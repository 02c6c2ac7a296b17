//! Bonus randomness requests.
//!
//! A request is stored when a swap asks the coordinator for a random word and
//! is resolved later, in a separate call, by [`RandomnessRequest::fulfill`] or
//! (once stale) by [`RandomnessRequest::expire`].
//!
//! ```text
//!   Pending ─fulfill(word)─► Fulfilled(min + word mod (max − min + 1))
//!      └────expire (≥ 24 h)──► Fulfilled(min)
//! ```

use crate::constants::RANDOMNESS_TIMEOUT_MS;
use crate::errors::Error;
use crate::vesting::GrantId;
use crate::Timestamp;
use ink::primitives::AccountId;

pub type RequestId = u64;
pub type RandomWord = [u8; 32];

#[derive(Debug, Clone, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(
    feature = "std",
    derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout)
)]
pub struct RandomnessRequest {
    pub request_id: RequestId,
    pub account: AccountId,
    pub tier: u8,
    /// Grant that receives the bonus once resolved.
    pub grant_id: GrantId,
    pub min_bonus_bps: u16,
    pub max_bonus_bps: u16,
    pub requested_at: Timestamp,
    pub fulfilled: bool,
    pub result_bonus_bps: u16,
}

impl RandomnessRequest {
    pub fn new(
        request_id: RequestId,
        account: AccountId,
        tier: u8,
        grant_id: GrantId,
        min_bonus_bps: u16,
        max_bonus_bps: u16,
        now: Timestamp,
    ) -> Result<Self, Error> {
        if min_bonus_bps > max_bonus_bps {
            return Err(Error::InvalidBonusRange);
        }
        Ok(Self {
            request_id,
            account,
            tier,
            grant_id,
            min_bonus_bps,
            max_bonus_bps,
            requested_at: now,
            fulfilled: false,
            result_bonus_bps: 0,
        })
    }

    /// Resolve with the oracle's word. Returns the bonus in bps.
    pub fn fulfill(&mut self, word: &RandomWord) -> Result<u16, Error> {
        if self.fulfilled {
            return Err(Error::AlreadyFulfilled);
        }
        let range = self.max_bonus_bps - self.min_bonus_bps;
        let bonus = if range == 0 {
            self.min_bonus_bps
        } else {
            // range + 1 ≤ 65 536, so the remainder fits back into u16.
            let offset = reduce_word(word, u32::from(range) + 1) as u16;
            self.min_bonus_bps + offset
        };
        self.settle(bonus);
        Ok(bonus)
    }

    /// Resolve a stale request to the floor of its range.
    pub fn expire(&mut self, now: Timestamp) -> Result<u16, Error> {
        if self.fulfilled {
            return Err(Error::AlreadyFulfilled);
        }
        if now < self.expires_at() {
            return Err(Error::RequestNotExpired);
        }
        let bonus = self.min_bonus_bps;
        self.settle(bonus);
        Ok(bonus)
    }

    pub fn expires_at(&self) -> Timestamp {
        self.requested_at.saturating_add(RANDOMNESS_TIMEOUT_MS)
    }

    fn settle(&mut self, bonus: u16) {
        self.fulfilled = true;
        self.result_bonus_bps = bonus;
    }
}

/// `word mod modulus`, reading the word as a big-endian 256-bit integer.
pub fn reduce_word(word: &RandomWord, modulus: u32) -> u32 {
    if modulus == 0 {
        return 0;
    }
    let m = u64::from(modulus);
    let rem = word
        .iter()
        .fold(0u64, |acc, byte| ((acc << 8) | u64::from(*byte)) % m);
    rem as u32
}
