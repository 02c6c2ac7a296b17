//! Error type shared by every ledger and by the contract messages.
//!
//! Returning `Err` from an ink! message reverts all storage writes made during
//! that call, so a failed entry point never leaves a ledger half-updated.

#[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
pub enum Error {
    // ── Access control ────────────────────────────────────────────────────
    /// Caller is not the contract owner.
    NotOwner,
    /// Caller is not the address named in the pending admin change.
    NotProposedAdmin,
    /// Caller is not the configured randomness coordinator.
    NotCoordinator,
    /// Caller does not own the vesting grant.
    NotGrantOwner,

    // ── State conflicts ───────────────────────────────────────────────────
    /// One-time initialisation has already happened.
    AlreadyInitialized,
    /// The allowlist claim for this account has already been made.
    AlreadyClaimed,
    /// The randomness request has already been resolved.
    AlreadyFulfilled,
    /// `pause` called while already paused.
    AlreadyPaused,
    /// `unpause` called while not paused.
    NotPaused,
    /// The token id was already minted through the engine.
    TokenIdTaken,
    /// A state-mutating entry point was re-entered.
    ReentrantCall,

    // ── Timing gates ──────────────────────────────────────────────────────
    /// Less than 24 h since the last tax reset.
    TaxResetTooEarly,
    /// The vesting cliff has not elapsed.
    StillInCliff,
    /// Less than 48 h since the admin change was proposed.
    TimelockNotExpired,
    /// The randomness request is still inside its fulfilment window.
    RequestNotExpired,
    /// The grant still waits on a randomness answer.
    BonusPending,

    // ── Resource exhaustion ───────────────────────────────────────────────
    /// The applicable tier pool has no capacity left.
    SupplyExhausted,

    // ── Validation ────────────────────────────────────────────────────────
    /// The inclusion proof does not resolve to the configured root.
    InvalidProof,
    /// No randomness request exists with this id.
    UnknownRequest,
    /// `min_bonus_bps > max_bonus_bps`.
    InvalidBonusRange,
    /// Tier index outside `0..5`.
    InvalidTier,
    /// Malformed configuration input.
    InvalidInput,
    /// Token is neither the legacy nor the current token.
    InvalidToken,
    /// The caller has not initialised their tax record.
    TaxNotInitialized,
    /// `initialize_collection` has not been called yet.
    CollectionNotInitialized,
    /// No admin change is pending.
    NoPendingAdminChange,
    /// Nothing is releasable for this grant right now.
    NothingToClaim,
    /// No vesting grant exists with this id.
    UnknownGrant,
    /// The grant carries no bonus that could be drawn again.
    NotRerollable,
    /// Only grants opened by a current-token swap can be redeemed.
    NotRedeemable,
    /// An arithmetic operation overflowed.
    Overflow,

    // ── Operational gates ─────────────────────────────────────────────────
    /// Contract is paused.
    ContractPaused,
    /// A PSP22 transfer on a token contract failed.
    TransferFailed,
    /// The NFT collection refused the mint.
    MintFailed,
    /// The randomness coordinator rejected the request.
    RandomnessRequestFailed,
    /// The NFT collection refused the burn.
    BurnFailed,
}

/// Coarse classification callers use to decide between retrying later,
/// changing parameters, or giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
pub enum ErrorClass {
    AccessControl,
    StateConflict,
    TimingGate,
    ResourceExhaustion,
    ValidationFailure,
    OperationalGate,
}

impl Error {
    pub fn class(&self) -> ErrorClass {
        use Error::*;
        match self {
            NotOwner | NotProposedAdmin | NotCoordinator | NotGrantOwner => {
                ErrorClass::AccessControl
            }
            AlreadyInitialized | AlreadyClaimed | AlreadyFulfilled | AlreadyPaused
            | NotPaused | TokenIdTaken | ReentrantCall => ErrorClass::StateConflict,
            TaxResetTooEarly | StillInCliff | TimelockNotExpired | RequestNotExpired
            | BonusPending => ErrorClass::TimingGate,
            SupplyExhausted => ErrorClass::ResourceExhaustion,
            InvalidProof | UnknownRequest | InvalidBonusRange | InvalidTier | InvalidInput
            | InvalidToken | TaxNotInitialized | CollectionNotInitialized
            | NoPendingAdminChange | NothingToClaim | UnknownGrant | NotRerollable
            | NotRedeemable | Overflow => {
                ErrorClass::ValidationFailure
            }
            ContractPaused | TransferFailed | MintFailed | RandomnessRequestFailed
            | BurnFailed => ErrorClass::OperationalGate,
        }
    }

    /// `true` when the same call may succeed later without changing arguments.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.class(),
            ErrorClass::TimingGate | ErrorClass::OperationalGate
        )
    }
}
