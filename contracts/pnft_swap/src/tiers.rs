//! Five-tier price and supply table.
//!
//! ```text
//!   tier 0 ─┬─ reserved pool   (allowlist claims only)   = reserved
//!           └─ general pool    (paid swaps only)         = supply_cap − reserved
//!   tier 1-4 ── general pool                             = supply_cap
//! ```
//!
//! `minted` counts both pools; `reserved_minted` is the allowlist share of it.

use crate::constants::{BONUS_RANGES, TIER_COUNT};
use crate::errors::Error;
use crate::Balance;

pub type Count = u32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(
    feature = "std",
    derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout)
)]
pub struct Tier {
    pub index: u8,
    pub price: Balance,
    pub supply_cap: Count,
    /// Allowlist sub-allocation. Always zero outside tier 0.
    pub reserved: Count,
    pub minted: Count,
    pub reserved_minted: Count,
}

impl Tier {
    fn pool_remaining(&self, via_allowlist: bool) -> Count {
        if via_allowlist {
            self.reserved.saturating_sub(self.reserved_minted)
        } else {
            let general_cap = self.supply_cap.saturating_sub(self.reserved);
            let general_minted = self.minted.saturating_sub(self.reserved_minted);
            general_cap.saturating_sub(general_minted)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(
    feature = "std",
    derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout)
)]
pub struct TierTable {
    tiers: [Tier; TIER_COUNT],
}

impl TierTable {
    /// Table with prices set and every cap at zero. Supplies arrive later via
    /// [`TierTable::configure`].
    pub fn new(prices: [Balance; TIER_COUNT]) -> Self {
        let mut tiers = [Tier::default(); TIER_COUNT];
        for (i, tier) in tiers.iter_mut().enumerate() {
            tier.index = i as u8;
            tier.price = prices[i];
        }
        Self { tiers }
    }

    pub fn configure(
        &mut self,
        supplies: [Count; TIER_COUNT],
        og_reserved: Count,
    ) -> Result<(), Error> {
        if og_reserved > supplies[0] {
            return Err(Error::InvalidInput);
        }
        for (i, tier) in self.tiers.iter_mut().enumerate() {
            tier.supply_cap = supplies[i];
            tier.reserved = if i == 0 { og_reserved } else { 0 };
            tier.minted = 0;
            tier.reserved_minted = 0;
        }
        Ok(())
    }

    pub fn get(&self, tier: u8) -> Result<&Tier, Error> {
        self.tiers.get(tier as usize).ok_or(Error::InvalidTier)
    }

    pub fn price_of(&self, tier: u8) -> Result<Balance, Error> {
        Ok(self.get(tier)?.price)
    }

    pub fn capacity_remaining(&self, tier: u8, via_allowlist: bool) -> Result<Count, Error> {
        Ok(self.get(tier)?.pool_remaining(via_allowlist))
    }

    /// Draw `count` units from the pool selected by `via_allowlist`.
    pub fn record_mint(&mut self, tier: u8, count: Count, via_allowlist: bool) -> Result<(), Error> {
        let entry = self
            .tiers
            .get_mut(tier as usize)
            .ok_or(Error::InvalidTier)?;
        if count == 0 {
            return Err(Error::InvalidInput);
        }
        if entry.pool_remaining(via_allowlist) < count {
            return Err(Error::SupplyExhausted);
        }

        entry.minted = entry.minted.checked_add(count).ok_or(Error::Overflow)?;
        if via_allowlist {
            entry.reserved_minted = entry
                .reserved_minted
                .checked_add(count)
                .ok_or(Error::Overflow)?;
        }
        Ok(())
    }

    /// Replace all five prices at once.
    pub fn update_prices(&mut self, prices: [Balance; TIER_COUNT]) {
        for (tier, price) in self.tiers.iter_mut().zip(prices) {
            tier.price = price;
        }
    }

    pub fn prices(&self) -> [Balance; TIER_COUNT] {
        let mut out = [0; TIER_COUNT];
        for (slot, tier) in out.iter_mut().zip(self.tiers.iter()) {
            *slot = tier.price;
        }
        out
    }
}

/// Inclusive bonus range in bps for `tier`.
pub fn bonus_range(tier: u8) -> Result<(u16, u16), Error> {
    BONUS_RANGES
        .get(tier as usize)
        .copied()
        .ok_or(Error::InvalidTier)
}
