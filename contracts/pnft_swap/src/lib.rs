#![cfg_attr(not(feature = "std"), no_std, no_main)]

pub mod allowlist;
pub mod errors;
pub mod governance;
pub mod interactions;
pub mod randomness;
pub mod tax;
pub mod tiers;
pub mod vesting;

pub type Balance = u128;
/// Milliseconds since the Unix epoch, as reported by the chain.
pub type Timestamp = u64;
pub type TokenId = u128;

pub mod constants {
    use crate::Timestamp;

    const HOUR_MS: Timestamp = 60 * 60 * 1_000;
    const DAY_MS: Timestamp = 24 * HOUR_MS;

    pub const TIER_COUNT: usize = 5;

    /// Denominator for all basis-point calculations.
    pub const BPS_DENOMINATOR: u128 = 10_000;

    // ── Swap tax ──────────────────────────────────────────────────────────────

    pub const INITIAL_TAX_BPS: u16 = 500;
    pub const TAX_INCREMENT_BPS: u16 = 100;
    pub const TAX_CAP_BPS: u16 = 3_000;
    pub const TAX_RESET_PERIOD_MS: Timestamp = DAY_MS;

    // ── Vesting ───────────────────────────────────────────────────────────────

    pub const VESTING_CLIFF_MS: Timestamp = 2 * DAY_MS;
    pub const VESTING_DURATION_MS: Timestamp = 90 * DAY_MS;

    // ── Governance / randomness ───────────────────────────────────────────────

    pub const ADMIN_TIMELOCK_MS: Timestamp = 48 * HOUR_MS;

    /// After this long an unfulfilled bonus request may be settled at its floor.
    pub const RANDOMNESS_TIMEOUT_MS: Timestamp = DAY_MS;

    /// Upper bound on ids returned by one `grants_of` page.
    pub const MAX_GRANTS_PAGE: u32 = 100;

    /// Inclusive `(min, max)` bonus per tier, in bps of the vested principal.
    ///
    /// ```text
    ///   tier 0 │   0 % ─   0 %
    ///   tier 1 │   0 % ─  15 %
    ///   tier 2 │  15 % ─  50 %
    ///   tier 3 │  20 % ─ 100 %
    ///   tier 4 │  50 % ─ 300 %
    /// ```
    pub const BONUS_RANGES: [(u16, u16); TIER_COUNT] = [
        (0, 0),
        (0, 1_500),
        (1_500, 5_000),
        (2_000, 10_000),
        (5_000, 30_000),
    ];
}

/// # pNFT Swap Engine
///
/// Converts legacy and current DeFAI tokens into tiered pNFTs. Every paid or
/// allowlisted mint also opens a vesting grant paid out of the engine's
/// current-token escrow.
///
/// ## Swap paths
///
/// ```text
///   OG allowlist   proof(caller, amount) ─► tier-0 reserve ─► grant(amount)         no tax
///   current token  price ─┬─ tax ─► treasury                                         rate 5 % → 30 %
///                         └─ net ─► escrow ─► grant(net) ─► bonus request (tier > 0)
///   legacy token   price ─► escrow                                                   no tax, no grant
///   airdrop        proof(caller, amount) ─► grant(amount)                           no NFT
/// ```
///
/// Current-token grants can later be rerolled for a fee at the caller's tax
/// rate, or redeemed: the NFT is burned and unreleased principal refunded.
///
/// ## Ordering
///
/// Messages validate, then write every ledger, then call out to the token,
/// collection and coordinator contracts. A failing collaborator returns
/// `Err`, which reverts the whole call.
///
/// ## Governance
///
/// Ownership moves only through `propose_admin_change` →
/// `accept_admin_change`, called by the proposed account at least 48 h later.
#[ink::contract]
mod pnft_swap {
    use ink::prelude::vec::Vec;
    use ink::storage::{Lazy, Mapping};

    use crate::allowlist::{self, AllowlistRoots, Node};
    use crate::constants::{MAX_GRANTS_PAGE, TIER_COUNT, VESTING_CLIFF_MS, VESTING_DURATION_MS};
    use crate::errors::Error;
    use crate::governance::AdminChangeProposal;
    use crate::interactions;
    use crate::randomness::{RandomWord, RandomnessRequest, RequestId};
    use crate::tax::UserTaxState;
    use crate::tiers::{self, Count, Tier, TierTable};
    use crate::vesting::{GrantId, GrantSource, VestingGrant};
    use crate::TokenId;

    /// Which swap entry point produced a mint.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
    #[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
    pub enum SwapPath {
        Og,
        Current,
        Legacy,
    }

    // =========================================================================
    // STORAGE
    // =========================================================================

    #[ink(storage)]
    pub struct PnftSwap {
        owner: AccountId,
        treasury: AccountId,
        legacy_token: AccountId,
        current_token: AccountId,
        collection: AccountId,
        coordinator: AccountId,
        subscription_id: u64,
        key_hash: [u8; 32],

        tiers: TierTable,
        roots: AllowlistRoots,
        collection_initialized: bool,
        paused: bool,
        /// Set while a state-mutating message is in flight. Kept in its own
        /// cell so the write lands in contract storage before any call out.
        locked: Lazy<bool>,

        tax_states: Mapping<AccountId, UserTaxState>,
        og_claimed: Mapping<AccountId, bool>,
        airdrop_claimed: Mapping<AccountId, bool>,

        grants: Mapping<GrantId, VestingGrant>,
        grant_count: Mapping<AccountId, u32>,
        /// `(account, n)` → id of the account's n-th grant.
        account_grants: Mapping<(AccountId, u32), GrantId>,
        next_grant_id: GrantId,

        bonus_requests: Mapping<RequestId, RandomnessRequest>,
        next_request_id: RequestId,

        minted_token_ids: Mapping<TokenId, AccountId>,
        pending_admin: Option<AdminChangeProposal>,
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    #[ink(event)]
    pub struct CollectionInitialized {
        supplies: [Count; TIER_COUNT],
        og_reserved: Count,
        og_root: Node,
        airdrop_root: Node,
    }

    #[ink(event)]
    pub struct SwapExecuted {
        #[ink(topic)]
        account: AccountId,
        #[ink(topic)]
        token_id: TokenId,
        tier: u8,
        path: SwapPath,
        price: Balance,
        tax: Balance,
        grant_id: Option<GrantId>,
    }

    #[ink(event)]
    pub struct AirdropClaimed {
        #[ink(topic)]
        account: AccountId,
        amount: Balance,
        grant_id: GrantId,
    }

    #[ink(event)]
    pub struct VestingClaimed {
        #[ink(topic)]
        account: AccountId,
        #[ink(topic)]
        grant_id: GrantId,
        amount: Balance,
        released_total: Balance,
    }

    #[ink(event)]
    pub struct TaxInitialized {
        #[ink(topic)]
        account: AccountId,
        tax_rate_bps: u16,
    }

    #[ink(event)]
    pub struct TaxReset {
        #[ink(topic)]
        account: AccountId,
        swap_count: u32,
    }

    #[ink(event)]
    pub struct BonusRequested {
        #[ink(topic)]
        request_id: RequestId,
        #[ink(topic)]
        account: AccountId,
        tier: u8,
        grant_id: GrantId,
        min_bonus_bps: u16,
        max_bonus_bps: u16,
    }

    #[ink(event)]
    pub struct BonusFulfilled {
        #[ink(topic)]
        request_id: RequestId,
        #[ink(topic)]
        grant_id: GrantId,
        bonus_bps: u16,
        bonus_amount: Balance,
    }

    /// A stale request settled at its minimum instead of an oracle word.
    #[ink(event)]
    pub struct BonusExpired {
        #[ink(topic)]
        request_id: RequestId,
        #[ink(topic)]
        grant_id: GrantId,
        bonus_bps: u16,
        bonus_amount: Balance,
    }

    /// A grant's bonus was forfeited and drawn again.
    #[ink(event)]
    pub struct BonusRerolled {
        #[ink(topic)]
        account: AccountId,
        #[ink(topic)]
        grant_id: GrantId,
        request_id: RequestId,
        fee: Balance,
        tax_rate_bps: u16,
    }

    #[ink(event)]
    pub struct Redeemed {
        #[ink(topic)]
        account: AccountId,
        #[ink(topic)]
        grant_id: GrantId,
        token_id: TokenId,
        refund: Balance,
    }

    #[ink(event)]
    pub struct PricesUpdated {
        prices: [Balance; TIER_COUNT],
    }

    #[ink(event)]
    pub struct TreasuryUpdated {
        old_treasury: AccountId,
        new_treasury: AccountId,
    }

    #[ink(event)]
    pub struct PauseChanged {
        paused: bool,
    }

    #[ink(event)]
    pub struct AdminChangeProposed {
        #[ink(topic)]
        proposed_admin: AccountId,
        unlocks_at: Timestamp,
    }

    #[ink(event)]
    pub struct AdminChangeCancelled {
        #[ink(topic)]
        proposed_admin: AccountId,
    }

    #[ink(event)]
    pub struct AdminChanged {
        #[ink(topic)]
        old_admin: AccountId,
        #[ink(topic)]
        new_admin: AccountId,
    }

    #[ink(event)]
    pub struct Withdrawn {
        #[ink(topic)]
        token: AccountId,
        #[ink(topic)]
        to: AccountId,
        amount: Balance,
    }

    // =========================================================================
    // IMPLEMENTATION
    // =========================================================================

    impl PnftSwap {
        #[ink(constructor)]
        #[allow(clippy::too_many_arguments)]
        pub fn new(
            legacy_token: AccountId,
            current_token: AccountId,
            collection: AccountId,
            treasury: AccountId,
            tier_prices: [Balance; TIER_COUNT],
            coordinator: AccountId,
            subscription_id: u64,
            key_hash: [u8; 32],
        ) -> Self {
            Self {
                owner: Self::env().caller(),
                treasury,
                legacy_token,
                current_token,
                collection,
                coordinator,
                subscription_id,
                key_hash,
                tiers: TierTable::new(tier_prices),
                roots: AllowlistRoots::default(),
                collection_initialized: false,
                paused: false,
                locked: Lazy::new(),
                tax_states: Mapping::default(),
                og_claimed: Mapping::default(),
                airdrop_claimed: Mapping::default(),
                grants: Mapping::default(),
                grant_count: Mapping::default(),
                account_grants: Mapping::default(),
                next_grant_id: 0,
                bonus_requests: Mapping::default(),
                next_request_id: 0,
                minted_token_ids: Mapping::default(),
                pending_admin: None,
            }
        }

        // =====================================================================
        // COLLECTION SETUP
        // =====================================================================

        /// One-time: tier supplies, the tier-0 OG reserve, and both allowlist
        /// roots.
        #[ink(message)]
        pub fn initialize_collection(
            &mut self,
            supplies: [Count; TIER_COUNT],
            og_root: Node,
            airdrop_root: Node,
            og_reserved_supply: Count,
        ) -> Result<(), Error> {
            self.assert_not_locked()?;
            self.only_owner()?;
            if self.collection_initialized {
                return Err(Error::AlreadyInitialized);
            }

            self.tiers.configure(supplies, og_reserved_supply)?;
            self.roots = AllowlistRoots {
                og: og_root,
                airdrop: airdrop_root,
            };
            self.collection_initialized = true;

            self.env().emit_event(CollectionInitialized {
                supplies,
                og_reserved: og_reserved_supply,
                og_root,
                airdrop_root,
            });
            Ok(())
        }

        // =====================================================================
        // SWAPS
        // =====================================================================

        /// Allowlisted tier-0 claim. Draws from the OG reserve, mints
        /// `token_id`, and vests the allowlisted `amount`.
        #[ink(message)]
        pub fn swap_og_tier0_for_nft(
            &mut self,
            amount: Balance,
            proof: Vec<Node>,
            token_id: TokenId,
        ) -> Result<GrantId, Error> {
            self.guarded(|this| {
                this.assert_not_paused()?;
                this.assert_collection_initialized()?;
                let caller = this.env().caller();

                if this.og_claimed.get(caller).unwrap_or(false) {
                    return Err(Error::AlreadyClaimed);
                }
                allowlist::ensure_included(&this.roots.og, &caller, amount, &proof)?;
                this.assert_token_id_free(token_id)?;

                // ── Effects ──
                this.tiers.record_mint(0, 1, true)?;
                this.og_claimed.insert(caller, &true);
                this.minted_token_ids.insert(token_id, &caller);
                let grant_id = this.open_grant(caller, GrantSource::Og { token_id }, amount)?;

                this.env().emit_event(SwapExecuted {
                    account: caller,
                    token_id,
                    tier: 0,
                    path: SwapPath::Og,
                    price: 0,
                    tax: 0,
                    grant_id: Some(grant_id),
                });

                // ── Interactions ──
                interactions::mint_tier(this.collection, caller, token_id, 0)?;
                Ok(grant_id)
            })
        }

        /// Paid swap in the current token. Tax goes to the treasury, the net
        /// amount into escrow and a vesting grant, and a bonus is requested
        /// for tiers with a non-zero bonus ceiling.
        #[ink(message)]
        pub fn swap_defai_for_nft(&mut self, tier: u8, token_id: TokenId) -> Result<GrantId, Error> {
            self.guarded(|this| {
                this.assert_not_paused()?;
                this.assert_collection_initialized()?;
                let caller = this.env().caller();

                let mut tax_state = this
                    .tax_states
                    .get(caller)
                    .ok_or(Error::TaxNotInitialized)?;
                let price = this.tiers.price_of(tier)?;
                let quote = tax_state.quote(price)?;
                let (min_bonus, max_bonus) = tiers::bonus_range(tier)?;
                this.assert_token_id_free(token_id)?;

                // ── Effects ──
                this.tiers.record_mint(tier, 1, false)?;
                this.minted_token_ids.insert(token_id, &caller);
                tax_state.on_swap();
                this.tax_states.insert(caller, &tax_state);
                let grant_id =
                    this.open_grant(caller, GrantSource::Current { tier, token_id }, quote.net)?;

                let request_id = if max_bonus > 0 {
                    Some(this.open_bonus_request(caller, tier, grant_id, min_bonus, max_bonus)?)
                } else {
                    None
                };

                this.env().emit_event(SwapExecuted {
                    account: caller,
                    token_id,
                    tier,
                    path: SwapPath::Current,
                    price,
                    tax: quote.tax,
                    grant_id: Some(grant_id),
                });

                // ── Interactions ──
                let escrow = this.env().account_id();
                if quote.tax > 0 {
                    interactions::transfer_from(this.current_token, caller, this.treasury, quote.tax)?;
                }
                if quote.net > 0 {
                    interactions::transfer_from(this.current_token, caller, escrow, quote.net)?;
                }
                interactions::mint_tier(this.collection, caller, token_id, tier)?;
                if let Some(request_id) = request_id {
                    interactions::request_randomness(
                        this.coordinator,
                        request_id,
                        this.key_hash,
                        this.subscription_id,
                    )?;
                }
                Ok(grant_id)
            })
        }

        /// Paid swap in the legacy token: full price into escrow, no tax, no
        /// vesting.
        #[ink(message)]
        pub fn swap_old_defai_for_nft(&mut self, tier: u8, token_id: TokenId) -> Result<(), Error> {
            self.guarded(|this| {
                this.assert_not_paused()?;
                this.assert_collection_initialized()?;
                let caller = this.env().caller();

                let price = this.tiers.price_of(tier)?;
                this.assert_token_id_free(token_id)?;

                // ── Effects ──
                this.tiers.record_mint(tier, 1, false)?;
                this.minted_token_ids.insert(token_id, &caller);

                this.env().emit_event(SwapExecuted {
                    account: caller,
                    token_id,
                    tier,
                    path: SwapPath::Legacy,
                    price,
                    tax: 0,
                    grant_id: None,
                });

                // ── Interactions ──
                if price > 0 {
                    let escrow = this.env().account_id();
                    interactions::transfer_from(this.legacy_token, caller, escrow, price)?;
                }
                interactions::mint_tier(this.collection, caller, token_id, tier)
            })
        }

        // =====================================================================
        // AIRDROP & VESTING
        // =====================================================================

        /// Vest an allowlisted airdrop `amount` for the caller. No NFT.
        #[ink(message)]
        pub fn claim_airdrop(&mut self, amount: Balance, proof: Vec<Node>) -> Result<GrantId, Error> {
            self.guarded(|this| {
                this.assert_not_paused()?;
                this.assert_collection_initialized()?;
                let caller = this.env().caller();

                if this.airdrop_claimed.get(caller).unwrap_or(false) {
                    return Err(Error::AlreadyClaimed);
                }
                allowlist::ensure_included(&this.roots.airdrop, &caller, amount, &proof)?;

                this.airdrop_claimed.insert(caller, &true);
                let grant_id = this.open_grant(caller, GrantSource::Airdrop, amount)?;

                this.env().emit_event(AirdropClaimed {
                    account: caller,
                    amount,
                    grant_id,
                });
                Ok(grant_id)
            })
        }

        /// Release whatever `grant_id` has vested since the last claim.
        #[ink(message)]
        pub fn claim_vested(&mut self, grant_id: GrantId) -> Result<Balance, Error> {
            self.guarded(|this| {
                this.assert_not_paused()?;
                let caller = this.env().caller();
                let now = this.env().block_timestamp();

                let mut grant = this.grants.get(grant_id).ok_or(Error::UnknownGrant)?;
                if grant.account != caller {
                    return Err(Error::NotGrantOwner);
                }
                let amount = grant.claim(now)?;

                // State update before transfer
                this.grants.insert(grant_id, &grant);

                this.env().emit_event(VestingClaimed {
                    account: caller,
                    grant_id,
                    amount,
                    released_total: grant.released,
                });

                interactions::transfer(this.current_token, caller, amount)?;
                Ok(amount)
            })
        }

        /// Forfeit the bonus on a current-token grant and draw a new one. The
        /// fee is the tier's current price at the caller's tax rate, paid to
        /// the treasury, and counts as a swap for the rate. The vesting
        /// schedule restarts from now.
        #[ink(message)]
        pub fn reroll_bonus(&mut self, grant_id: GrantId) -> Result<RequestId, Error> {
            self.guarded(|this| {
                this.assert_not_paused()?;
                let caller = this.env().caller();
                let now = this.env().block_timestamp();

                let mut grant = this.grants.get(grant_id).ok_or(Error::UnknownGrant)?;
                if grant.account != caller {
                    return Err(Error::NotGrantOwner);
                }
                let GrantSource::Current { tier, .. } = grant.source else {
                    return Err(Error::NotRerollable);
                };
                let (min_bonus, max_bonus) = tiers::bonus_range(tier)?;
                if max_bonus == 0 {
                    return Err(Error::NotRerollable);
                }
                let mut tax_state = this
                    .tax_states
                    .get(caller)
                    .ok_or(Error::TaxNotInitialized)?;
                let fee = tax_state.quote(this.tiers.price_of(tier)?)?.tax;
                grant.restart(now)?;

                // ── Effects ──
                tax_state.on_swap();
                this.tax_states.insert(caller, &tax_state);
                this.grants.insert(grant_id, &grant);
                let request_id =
                    this.open_bonus_request(caller, tier, grant_id, min_bonus, max_bonus)?;

                this.env().emit_event(BonusRerolled {
                    account: caller,
                    grant_id,
                    request_id,
                    fee,
                    tax_rate_bps: tax_state.tax_rate_bps,
                });

                // ── Interactions ──
                if fee > 0 {
                    interactions::transfer_from(this.current_token, caller, this.treasury, fee)?;
                }
                interactions::request_randomness(
                    this.coordinator,
                    request_id,
                    this.key_hash,
                    this.subscription_id,
                )?;
                Ok(request_id)
            })
        }

        /// Burn a current-token pNFT and refund its unreleased principal from
        /// escrow. The grant is closed.
        #[ink(message)]
        pub fn redeem(&mut self, grant_id: GrantId) -> Result<Balance, Error> {
            self.guarded(|this| {
                this.assert_not_paused()?;
                let caller = this.env().caller();

                let grant = this.grants.get(grant_id).ok_or(Error::UnknownGrant)?;
                if grant.account != caller {
                    return Err(Error::NotGrantOwner);
                }
                let GrantSource::Current { token_id, .. } = grant.source else {
                    return Err(Error::NotRedeemable);
                };
                if grant.pending_request.is_some() {
                    return Err(Error::BonusPending);
                }
                let refund = grant.refundable();

                // ── Effects ──
                this.grants.remove(grant_id);

                this.env().emit_event(Redeemed {
                    account: caller,
                    grant_id,
                    token_id,
                    refund,
                });

                // ── Interactions ──
                interactions::burn_tier(this.collection, caller, token_id)?;
                if refund > 0 {
                    interactions::transfer(this.current_token, caller, refund)?;
                }
                Ok(refund)
            })
        }

        // =====================================================================
        // SWAP TAX
        // =====================================================================

        #[ink(message)]
        pub fn initialize_user_tax(&mut self) -> Result<(), Error> {
            self.assert_not_locked()?;
            let caller = self.env().caller();
            if self.tax_states.contains(caller) {
                return Err(Error::AlreadyInitialized);
            }
            let state = UserTaxState::new(self.env().block_timestamp());
            self.tax_states.insert(caller, &state);

            self.env().emit_event(TaxInitialized {
                account: caller,
                tax_rate_bps: state.tax_rate_bps,
            });
            Ok(())
        }

        /// Drop the caller's rate back to 5 %, at most once per 24 h.
        #[ink(message)]
        pub fn reset_user_tax(&mut self) -> Result<(), Error> {
            self.assert_not_locked()?;
            let caller = self.env().caller();
            let mut state = self
                .tax_states
                .get(caller)
                .ok_or(Error::TaxNotInitialized)?;
            state.reset(self.env().block_timestamp())?;
            self.tax_states.insert(caller, &state);

            self.env().emit_event(TaxReset {
                account: caller,
                swap_count: state.swap_count,
            });
            Ok(())
        }

        // =====================================================================
        // RANDOMNESS
        // =====================================================================

        /// Coordinator callback. Settles the request and grows its grant.
        #[ink(message)]
        pub fn fulfill_randomness(
            &mut self,
            request_id: RequestId,
            random_word: RandomWord,
        ) -> Result<u16, Error> {
            self.guarded(|this| {
                if this.env().caller() != this.coordinator {
                    return Err(Error::NotCoordinator);
                }
                let mut request = this
                    .bonus_requests
                    .get(request_id)
                    .ok_or(Error::UnknownRequest)?;
                let bonus_bps = request.fulfill(&random_word)?;
                this.bonus_requests.insert(request_id, &request);
                let bonus_amount = this.credit_bonus(request.grant_id, bonus_bps)?;

                this.env().emit_event(BonusFulfilled {
                    request_id,
                    grant_id: request.grant_id,
                    bonus_bps,
                    bonus_amount,
                });
                Ok(bonus_bps)
            })
        }

        /// Settle a request the coordinator never answered at its minimum
        /// bonus. Open to the requesting account and the owner once the
        /// timeout has passed.
        #[ink(message)]
        pub fn expire_bonus_request(&mut self, request_id: RequestId) -> Result<u16, Error> {
            self.guarded(|this| {
                let caller = this.env().caller();
                let mut request = this
                    .bonus_requests
                    .get(request_id)
                    .ok_or(Error::UnknownRequest)?;
                if caller != request.account && caller != this.owner {
                    return Err(Error::NotOwner);
                }
                let bonus_bps = request.expire(this.env().block_timestamp())?;
                this.bonus_requests.insert(request_id, &request);
                let bonus_amount = this.credit_bonus(request.grant_id, bonus_bps)?;

                this.env().emit_event(BonusExpired {
                    request_id,
                    grant_id: request.grant_id,
                    bonus_bps,
                    bonus_amount,
                });
                Ok(bonus_bps)
            })
        }

        // =====================================================================
        // ADMIN
        // =====================================================================

        /// Replace all five tier prices at once.
        #[ink(message)]
        pub fn update_prices(&mut self, new_prices: [Balance; TIER_COUNT]) -> Result<(), Error> {
            self.assert_not_locked()?;
            self.only_owner()?;
            self.tiers.update_prices(new_prices);
            self.env().emit_event(PricesUpdated { prices: new_prices });
            Ok(())
        }

        #[ink(message)]
        pub fn set_treasury(&mut self, new_treasury: AccountId) -> Result<(), Error> {
            self.assert_not_locked()?;
            self.only_owner()?;
            let old_treasury = self.treasury;
            self.treasury = new_treasury;
            self.env().emit_event(TreasuryUpdated {
                old_treasury,
                new_treasury,
            });
            Ok(())
        }

        #[ink(message)]
        pub fn pause(&mut self) -> Result<(), Error> {
            self.assert_not_locked()?;
            self.only_owner()?;
            if self.paused {
                return Err(Error::AlreadyPaused);
            }
            self.paused = true;
            self.env().emit_event(PauseChanged { paused: true });
            Ok(())
        }

        #[ink(message)]
        pub fn unpause(&mut self) -> Result<(), Error> {
            self.assert_not_locked()?;
            self.only_owner()?;
            if !self.paused {
                return Err(Error::NotPaused);
            }
            self.paused = false;
            self.env().emit_event(PauseChanged { paused: false });
            Ok(())
        }

        /// Move escrowed legacy or current tokens out of the engine.
        #[ink(message)]
        pub fn withdraw(&mut self, token: AccountId, to: AccountId, amount: Balance) -> Result<(), Error> {
            self.guarded(|this| {
                this.only_owner()?;
                if token != this.legacy_token && token != this.current_token {
                    return Err(Error::InvalidToken);
                }
                if amount == 0 {
                    return Err(Error::InvalidInput);
                }
                this.env().emit_event(Withdrawn { token, to, amount });
                interactions::transfer(token, to, amount)
            })
        }

        // ── Admin handover ────────────────────────────────────────────────────

        /// Start (or restart) the 48 h handover timelock.
        #[ink(message)]
        pub fn propose_admin_change(&mut self, new_admin: AccountId) -> Result<(), Error> {
            self.assert_not_locked()?;
            self.only_owner()?;
            let proposal = AdminChangeProposal::new(new_admin, self.env().block_timestamp());
            self.pending_admin = Some(proposal);
            self.env().emit_event(AdminChangeProposed {
                proposed_admin: new_admin,
                unlocks_at: proposal.unlocks_at(),
            });
            Ok(())
        }

        #[ink(message)]
        pub fn cancel_admin_change(&mut self) -> Result<(), Error> {
            self.assert_not_locked()?;
            self.only_owner()?;
            let proposal = self
                .pending_admin
                .take()
                .ok_or(Error::NoPendingAdminChange)?;
            self.env().emit_event(AdminChangeCancelled {
                proposed_admin: proposal.proposed_admin,
            });
            Ok(())
        }

        #[ink(message)]
        pub fn accept_admin_change(&mut self) -> Result<(), Error> {
            self.assert_not_locked()?;
            let caller = self.env().caller();
            let proposal = self.pending_admin.ok_or(Error::NoPendingAdminChange)?;
            proposal.ensure_acceptable(caller, self.env().block_timestamp())?;

            let old_admin = self.owner;
            self.owner = caller;
            self.pending_admin = None;
            self.env().emit_event(AdminChanged {
                old_admin,
                new_admin: caller,
            });
            Ok(())
        }

        // =====================================================================
        // VIEW FUNCTIONS
        // =====================================================================

        #[ink(message)]
        pub fn owner(&self) -> AccountId { self.owner }

        #[ink(message)]
        pub fn treasury(&self) -> AccountId { self.treasury }

        #[ink(message)]
        pub fn paused(&self) -> bool { self.paused }

        #[ink(message)]
        pub fn tier_price(&self, tier: u8) -> Option<Balance> {
            self.tiers.price_of(tier).ok()
        }

        #[ink(message)]
        pub fn tier_prices(&self) -> [Balance; TIER_COUNT] { self.tiers.prices() }

        #[ink(message)]
        pub fn tier(&self, tier: u8) -> Option<Tier> {
            self.tiers.get(tier).ok().copied()
        }

        #[ink(message)]
        pub fn capacity_remaining(&self, tier: u8, via_allowlist: bool) -> Option<Count> {
            self.tiers.capacity_remaining(tier, via_allowlist).ok()
        }

        #[ink(message)]
        pub fn bonus_range(&self, tier: u8) -> Option<(u16, u16)> {
            tiers::bonus_range(tier).ok()
        }

        #[ink(message)]
        pub fn user_tax_state(&self, account: AccountId) -> Option<UserTaxState> {
            self.tax_states.get(account)
        }

        #[ink(message)]
        pub fn og_tier0_claimed(&self, account: AccountId) -> bool {
            self.og_claimed.get(account).unwrap_or(false)
        }

        #[ink(message)]
        pub fn airdrop_claimed(&self, account: AccountId) -> bool {
            self.airdrop_claimed.get(account).unwrap_or(false)
        }

        #[ink(message)]
        pub fn vesting_grant(&self, grant_id: GrantId) -> Option<VestingGrant> {
            self.grants.get(grant_id)
        }

        /// Number of grants ever opened for `account`, redeemed ones included.
        #[ink(message)]
        pub fn grant_count(&self, account: AccountId) -> u32 {
            self.grant_count.get(account).unwrap_or(0)
        }

        /// Live grant ids of `account` among its `offset..offset + limit`
        /// opened grants, oldest first. `limit` is capped at
        /// `MAX_GRANTS_PAGE`; redeemed grants are skipped.
        #[ink(message)]
        pub fn grants_of(&self, account: AccountId, offset: u32, limit: u32) -> Vec<GrantId> {
            let end = offset
                .saturating_add(limit.min(MAX_GRANTS_PAGE))
                .min(self.grant_count(account));
            (offset..end)
                .filter_map(|n| self.account_grants.get((account, n)))
                .filter(|grant_id| self.grants.contains(grant_id))
                .collect()
        }

        /// What `claim_vested` would pay right now.
        #[ink(message)]
        pub fn releasable(&self, grant_id: GrantId) -> Result<Balance, Error> {
            let grant = self.grants.get(grant_id).ok_or(Error::UnknownGrant)?;
            grant.releasable_at(self.env().block_timestamp())
        }

        #[ink(message)]
        pub fn bonus_request(&self, request_id: RequestId) -> Option<RandomnessRequest> {
            self.bonus_requests.get(request_id)
        }

        #[ink(message)]
        pub fn pending_admin(&self) -> Option<AdminChangeProposal> { self.pending_admin }

        #[ink(message)]
        pub fn allowlist_roots(&self) -> AllowlistRoots { self.roots }

        // =====================================================================
        // INTERNAL
        // =====================================================================

        fn open_grant(
            &mut self,
            account: AccountId,
            source: GrantSource,
            principal: Balance,
        ) -> Result<GrantId, Error> {
            let grant_id = self.next_grant_id;
            let grant = VestingGrant::open(
                account,
                source,
                principal,
                self.env().block_timestamp(),
                VESTING_CLIFF_MS,
                VESTING_DURATION_MS,
            )?;
            self.next_grant_id = grant_id.checked_add(1).ok_or(Error::Overflow)?;
            self.grants.insert(grant_id, &grant);

            let n = self.grant_count(account);
            self.account_grants.insert((account, n), &grant_id);
            self.grant_count
                .insert(account, &n.checked_add(1).ok_or(Error::Overflow)?);
            Ok(grant_id)
        }

        fn open_bonus_request(
            &mut self,
            account: AccountId,
            tier: u8,
            grant_id: GrantId,
            min_bonus_bps: u16,
            max_bonus_bps: u16,
        ) -> Result<RequestId, Error> {
            let request_id = self.next_request_id;
            let request = RandomnessRequest::new(
                request_id,
                account,
                tier,
                grant_id,
                min_bonus_bps,
                max_bonus_bps,
                self.env().block_timestamp(),
            )?;
            self.next_request_id = request_id.checked_add(1).ok_or(Error::Overflow)?;
            self.bonus_requests.insert(request_id, &request);

            let mut grant = self.grants.get(grant_id).ok_or(Error::UnknownGrant)?;
            grant.pending_request = Some(request_id);
            self.grants.insert(grant_id, &grant);

            self.env().emit_event(BonusRequested {
                request_id,
                account,
                tier,
                grant_id,
                min_bonus_bps,
                max_bonus_bps,
            });
            Ok(request_id)
        }

        fn credit_bonus(&mut self, grant_id: GrantId, bonus_bps: u16) -> Result<Balance, Error> {
            let mut grant = self.grants.get(grant_id).ok_or(Error::UnknownGrant)?;
            let bonus = grant.apply_bonus(bonus_bps)?;
            self.grants.insert(grant_id, &grant);
            Ok(bonus)
        }

        /// Run `f` with the reentrancy flag held.
        ///
        /// The flag is a `Lazy` cell, so `set` writes straight to contract
        /// storage rather than waiting for the root struct to be flushed when
        /// the message returns. A nested message loads the root struct afresh
        /// and still reads the flag from storage.
        fn guarded<T>(
            &mut self,
            f: impl FnOnce(&mut Self) -> Result<T, Error>,
        ) -> Result<T, Error> {
            self.assert_not_locked()?;
            self.locked.set(&true);
            let result = f(self);
            self.locked.set(&false);
            result
        }

        // =====================================================================
        // ACCESS CONTROL
        // =====================================================================

        fn assert_not_locked(&self) -> Result<(), Error> {
            if self.locked.get().unwrap_or(false) {
                return Err(Error::ReentrantCall);
            }
            Ok(())
        }

        fn only_owner(&self) -> Result<(), Error> {
            if self.env().caller() != self.owner {
                return Err(Error::NotOwner);
            }
            Ok(())
        }

        fn assert_not_paused(&self) -> Result<(), Error> {
            if self.paused {
                return Err(Error::ContractPaused);
            }
            Ok(())
        }

        fn assert_collection_initialized(&self) -> Result<(), Error> {
            if !self.collection_initialized {
                return Err(Error::CollectionNotInitialized);
            }
            Ok(())
        }

        fn assert_token_id_free(&self, token_id: TokenId) -> Result<(), Error> {
            if self.minted_token_ids.contains(token_id) {
                return Err(Error::TokenIdTaken);
            }
            Ok(())
        }
    }

    // =========================================================================
    // UNIT TESTS
    // =========================================================================

}
