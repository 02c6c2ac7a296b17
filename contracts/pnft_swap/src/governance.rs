//! Two-phase admin handover: the owner proposes, the proposed account accepts
//! once the timelock has run.

use crate::constants::ADMIN_TIMELOCK_MS;
use crate::errors::Error;
use crate::Timestamp;
use ink::primitives::AccountId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(
    feature = "std",
    derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout)
)]
pub struct AdminChangeProposal {
    pub proposed_admin: AccountId,
    pub proposed_at: Timestamp,
}

impl AdminChangeProposal {
    pub fn new(proposed_admin: AccountId, now: Timestamp) -> Self {
        Self {
            proposed_admin,
            proposed_at: now,
        }
    }

    pub fn unlocks_at(&self) -> Timestamp {
        self.proposed_at.saturating_add(ADMIN_TIMELOCK_MS)
    }

    pub fn ensure_acceptable(&self, caller: AccountId, now: Timestamp) -> Result<(), Error> {
        if caller != self.proposed_admin {
            return Err(Error::NotProposedAdmin);
        }
        if now < self.unlocks_at() {
            return Err(Error::TimelockNotExpired);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Timestamp = 60 * 60 * 1_000;

    #[test]
    fn boundary_is_exactly_48_hours() {
        let bob = AccountId::from([2; 32]);
        let p = AdminChangeProposal::new(bob, 5_000);
        assert_eq!(
            p.ensure_acceptable(bob, 5_000 + 48 * HOUR - 1),
            Err(Error::TimelockNotExpired)
        );
        assert_eq!(p.ensure_acceptable(bob, 5_000 + 48 * HOUR), Ok(()));
        assert_eq!(p.ensure_acceptable(bob, 5_000 + 480 * HOUR), Ok(()));
    }

    #[test]
    fn only_proposed_admin_accepts() {
        let p = AdminChangeProposal::new(AccountId::from([2; 32]), 0);
        assert_eq!(
            p.ensure_acceptable(AccountId::from([9; 32]), 100 * HOUR),
            Err(Error::NotProposedAdmin)
        );
    }
}
