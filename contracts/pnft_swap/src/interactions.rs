//! Cross-contract effects: PSP22 token movements, NFT mints and burns, and
//! randomness requests.
//!
//! Every call uses `try_invoke` so a failing collaborator surfaces as an
//! engine [`Error`] instead of trapping. The engine calls these only after its
//! own state is written.
//!
//! Unit tests cannot dispatch cross-contract calls off-chain, so under
//! `cfg(test)` the same functions append to a per-thread [`recorder`] instead.

use ink::prelude::string::String;
use ink::primitives::AccountId;

use crate::errors::Error;
use crate::randomness::RequestId;
use crate::{Balance, TokenId};

/// Error shape returned by PSP22 token contracts.
#[derive(Debug, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
pub enum Psp22Error {
    Custom(String),
    InsufficientBalance,
    InsufficientAllowance,
    ZeroRecipientAddress,
    ZeroSenderAddress,
    SafeTransferCheckFailed(String),
}

/// Error shape returned by the PSP34 collection.
#[derive(Debug, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
pub enum Psp34Error {
    Custom(String),
    SelfApprove,
    NotApproved,
    TokenExists,
    TokenNotExists,
    SafeTransferCheckFailed(String),
}

#[cfg(not(test))]
mod onchain {
    use super::*;
    use ink::env::call::{build_call, ExecutionInput, Selector};
    use ink::env::DefaultEnvironment;
    use ink::prelude::vec::Vec;

    pub fn transfer_from(
        token: AccountId,
        from: AccountId,
        to: AccountId,
        value: Balance,
    ) -> Result<(), Error> {
        let result = build_call::<DefaultEnvironment>()
            .call(token)
            .exec_input(
                ExecutionInput::new(Selector::new(ink::selector_bytes!("PSP22::transfer_from")))
                    .push_arg(from)
                    .push_arg(to)
                    .push_arg(value)
                    .push_arg(Vec::<u8>::new()),
            )
            .returns::<Result<(), Psp22Error>>()
            .try_invoke();

        match result {
            Ok(Ok(Ok(()))) => Ok(()),
            _ => Err(Error::TransferFailed),
        }
    }

    pub fn transfer(token: AccountId, to: AccountId, value: Balance) -> Result<(), Error> {
        let result = build_call::<DefaultEnvironment>()
            .call(token)
            .exec_input(
                ExecutionInput::new(Selector::new(ink::selector_bytes!("PSP22::transfer")))
                    .push_arg(to)
                    .push_arg(value)
                    .push_arg(Vec::<u8>::new()),
            )
            .returns::<Result<(), Psp22Error>>()
            .try_invoke();

        match result {
            Ok(Ok(Ok(()))) => Ok(()),
            _ => Err(Error::TransferFailed),
        }
    }

    pub fn mint_tier(
        collection: AccountId,
        to: AccountId,
        token_id: TokenId,
        tier: u8,
    ) -> Result<(), Error> {
        let result = build_call::<DefaultEnvironment>()
            .call(collection)
            .exec_input(
                ExecutionInput::new(Selector::new(ink::selector_bytes!("mint_tier")))
                    .push_arg(to)
                    .push_arg(token_id)
                    .push_arg(tier),
            )
            .returns::<Result<(), Psp34Error>>()
            .try_invoke();

        match result {
            Ok(Ok(Ok(()))) => Ok(()),
            _ => Err(Error::MintFailed),
        }
    }

    pub fn burn_tier(
        collection: AccountId,
        from: AccountId,
        token_id: TokenId,
    ) -> Result<(), Error> {
        let result = build_call::<DefaultEnvironment>()
            .call(collection)
            .exec_input(
                ExecutionInput::new(Selector::new(ink::selector_bytes!("burn_tier")))
                    .push_arg(from)
                    .push_arg(token_id),
            )
            .returns::<Result<(), Psp34Error>>()
            .try_invoke();

        match result {
            Ok(Ok(Ok(()))) => Ok(()),
            _ => Err(Error::BurnFailed),
        }
    }

    pub fn request_randomness(
        coordinator: AccountId,
        request_id: RequestId,
        key_hash: [u8; 32],
        subscription_id: u64,
    ) -> Result<(), Error> {
        let result = build_call::<DefaultEnvironment>()
            .call(coordinator)
            .exec_input(
                ExecutionInput::new(Selector::new(ink::selector_bytes!("request_randomness")))
                    .push_arg(request_id)
                    .push_arg(key_hash)
                    .push_arg(subscription_id),
            )
            .returns::<()>()
            .try_invoke();

        match result {
            Ok(Ok(())) => Ok(()),
            _ => Err(Error::RandomnessRequestFailed),
        }
    }
}

#[cfg(not(test))]
pub use onchain::*;

#[cfg(test)]
pub use recorder::{burn_tier, mint_tier, request_randomness, transfer, transfer_from};

/// In-memory stand-in for the collaborators, used by unit tests.
#[cfg(test)]
pub mod recorder {
    use super::*;
    use core::cell::RefCell;
    use std::vec::Vec;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Interaction {
        TransferFrom {
            token: AccountId,
            from: AccountId,
            to: AccountId,
            value: Balance,
        },
        Transfer {
            token: AccountId,
            to: AccountId,
            value: Balance,
        },
        Mint {
            collection: AccountId,
            to: AccountId,
            token_id: TokenId,
            tier: u8,
        },
        Burn {
            collection: AccountId,
            from: AccountId,
            token_id: TokenId,
        },
        RandomnessRequested {
            coordinator: AccountId,
            request_id: RequestId,
        },
    }

    #[derive(Default)]
    struct Recorder {
        log: Vec<Interaction>,
        fail_transfers: bool,
        fail_mints: bool,
        fail_burns: bool,
        fail_randomness: bool,
    }

    std::thread_local! {
        static RECORDER: RefCell<Recorder> = RefCell::new(Recorder::default());
    }

    fn push(entry: Interaction) {
        RECORDER.with(|r| r.borrow_mut().log.push(entry));
    }

    pub fn transfer_from(
        token: AccountId,
        from: AccountId,
        to: AccountId,
        value: Balance,
    ) -> Result<(), Error> {
        if RECORDER.with(|r| r.borrow().fail_transfers) {
            return Err(Error::TransferFailed);
        }
        push(Interaction::TransferFrom { token, from, to, value });
        Ok(())
    }

    pub fn transfer(token: AccountId, to: AccountId, value: Balance) -> Result<(), Error> {
        if RECORDER.with(|r| r.borrow().fail_transfers) {
            return Err(Error::TransferFailed);
        }
        push(Interaction::Transfer { token, to, value });
        Ok(())
    }

    pub fn mint_tier(
        collection: AccountId,
        to: AccountId,
        token_id: TokenId,
        tier: u8,
    ) -> Result<(), Error> {
        if RECORDER.with(|r| r.borrow().fail_mints) {
            return Err(Error::MintFailed);
        }
        push(Interaction::Mint { collection, to, token_id, tier });
        Ok(())
    }

    pub fn burn_tier(
        collection: AccountId,
        from: AccountId,
        token_id: TokenId,
    ) -> Result<(), Error> {
        if RECORDER.with(|r| r.borrow().fail_burns) {
            return Err(Error::BurnFailed);
        }
        push(Interaction::Burn { collection, from, token_id });
        Ok(())
    }

    pub fn request_randomness(
        coordinator: AccountId,
        request_id: RequestId,
        _key_hash: [u8; 32],
        _subscription_id: u64,
    ) -> Result<(), Error> {
        if RECORDER.with(|r| r.borrow().fail_randomness) {
            return Err(Error::RandomnessRequestFailed);
        }
        push(Interaction::RandomnessRequested { coordinator, request_id });
        Ok(())
    }

    /// Everything recorded so far, oldest first.
    pub fn log() -> Vec<Interaction> {
        RECORDER.with(|r| r.borrow().log.clone())
    }

    pub fn fail_transfers(on: bool) {
        RECORDER.with(|r| r.borrow_mut().fail_transfers = on);
    }

    pub fn fail_mints(on: bool) {
        RECORDER.with(|r| r.borrow_mut().fail_mints = on);
    }

    pub fn fail_burns(on: bool) {
        RECORDER.with(|r| r.borrow_mut().fail_burns = on);
    }

    pub fn fail_randomness(on: bool) {
        RECORDER.with(|r| r.borrow_mut().fail_randomness = on);
    }

    /// Total of `token` moved to `to` by either transfer kind.
    pub fn credited(token: AccountId, to: AccountId) -> Balance {
        log()
            .iter()
            .map(|entry| match entry {
                Interaction::TransferFrom { token: t, to: dest, value, .. }
                | Interaction::Transfer { token: t, to: dest, value }
                    if *t == token && *dest == to =>
                {
                    *value
                }
                _ => 0,
            })
            .sum()
    }

    pub fn mints() -> Vec<(AccountId, TokenId, u8)> {
        log()
            .into_iter()
            .filter_map(|entry| match entry {
                Interaction::Mint { to, token_id, tier, .. } => Some((to, token_id, tier)),
                _ => None,
            })
            .collect()
    }

    pub fn burns() -> Vec<(AccountId, TokenId)> {
        log()
            .into_iter()
            .filter_map(|entry| match entry {
                Interaction::Burn { from, token_id, .. } => Some((from, token_id)),
                _ => None,
            })
            .collect()
    }
}
