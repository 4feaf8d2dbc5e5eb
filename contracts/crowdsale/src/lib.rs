//! # Crowdsale Contract
//!
//! A token crowdsale with phased pricing and time-gated issuance caps.
//! The single Soroban contract `Crowdsale` exposes:
//!
//! | Area          | Entry Point(s)                                              |
//! |---------------|-------------------------------------------------------------|
//! | Bootstrap     | [`Crowdsale::init`]                                         |
//! | Purchase      | [`Crowdsale::buy_tokens`]                                   |
//! | Sale state    | `pause`, `unpause`, `set_cap_mode`                          |
//! | Admin         | `add_admin`, `remove_admin`, `set_contracts`, `transfer_token_ownership` |
//! | Queries       | `list_rates`, `list_caps`, `milestone_total_supply`, `rate_at`, `cap_at`, ... |
//!
//! ## Architecture
//!
//! Schedule resolution is pure and lives in [`schedule`]. Authorization and the
//! admin list live in [`admin`]. Storage access is delegated to [`storage`] and
//! event emission to [`events`]. This file holds the entry points and the
//! order in which a purchase is checked and applied.
//!
//! ## Purchase atomicity
//!
//! A purchase either succeeds completely or fails with one [`Error`]; a failed
//! invocation rolls back every storage write, payment transfer and mint.
//! Soroban executes invocations one at a time, so the milestone supply read
//! and the write that follows cannot interleave with another purchase.

#![no_std]

use soroban_sdk::{
    contract, contracterror, contractimpl, panic_with_error, token, Address, Env, Vec,
};

pub mod admin;
mod events;
pub mod schedule;
mod storage;
mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_events;

pub use events::{
    AdminChanged, CapModeChanged, ContractsUpdated, SaleInitialized, TokenOwnershipTransferred,
    TokenPurchase,
};
pub use types::{ActiveCap, CapMode, CapWindow, Phase, Receipt, SaleConfig, SaleParams, SaleState};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized     = 1,
    NotInitialized         = 2,
    InvalidConfiguration   = 3,
    SaleNotActive          = 4,
    CapExceeded            = 5,
    InvalidContribution    = 6,
    NotAuthorized          = 7,
    SaleNotPaused          = 8,
    InvalidStateTransition = 9,
    AdminExists            = 10,
    AdminNotFound          = 11,
    Overflow               = 12,
}

/// Unwrap a resolver result or abort the invocation with its error.
fn ok_or_panic<T>(env: &Env, result: Result<T, Error>) -> T {
    result.unwrap_or_else(|error| panic_with_error!(env, error))
}

#[contract]
pub struct Crowdsale;

#[contractimpl]
impl Crowdsale {
    // ─────────────────────────────────────────────────────────
    // Initialisation
    // ─────────────────────────────────────────────────────────

    /// Configure the sale. Must be called exactly once after deployment.
    ///
    /// - `owner` signs and becomes the first admin.
    /// - The schedules are validated before anything is written, so a
    ///   rejected configuration leaves the contract uninitialised.
    /// - The sale starts `Paused` with caps `Unlimited`.
    ///
    /// The crowdsale must be made admin of `params.token` for purchases to mint.
    pub fn init(env: Env, owner: Address, params: SaleParams) {
        owner.require_auth();
        if storage::is_initialized(&env) {
            panic_with_error!(&env, Error::AlreadyInitialized);
        }

        let phases = ok_or_panic(
            &env,
            schedule::build_phases(&env, params.start_time, &params.end_times, &params.rates),
        );
        let caps = ok_or_panic(
            &env,
            schedule::build_caps(&env, params.start_time, &params.cap_times, &params.caps),
        );

        let config = SaleConfig {
            start_time: params.start_time,
            token: params.token,
            payment_token: params.payment_token,
            wallet: params.wallet,
        };
        validate_addresses(&env, &config);

        storage::save_sale(&env, &config, &phases, &caps, &owner);

        events::emit_initialized(
            &env,
            SaleInitialized {
                owner,
                start_time: config.start_time,
                token: config.token,
                payment_token: config.payment_token,
                wallet: config.wallet,
                phases: phases.len(),
                windows: caps.len(),
            },
        );
    }

    // ─────────────────────────────────────────────────────────
    // Purchase
    // ─────────────────────────────────────────────────────────

    /// Buy sale tokens for `beneficiary`, paid by `buyer`.
    ///
    /// `amount` payment units move from `buyer` to the wallet and
    /// `amount * rate` sale tokens are minted to `beneficiary`. Checks, in order:
    ///
    /// 1. the sale is `Active` (`SaleNotActive`);
    /// 2. `amount > 0` and the beneficiary is not this contract (`InvalidContribution`);
    /// 3. the ledger time falls inside a phase (`SaleNotActive`);
    /// 4. the cap window still has room for the whole purchase (`CapExceeded`).
    pub fn buy_tokens(env: Env, buyer: Address, beneficiary: Address, amount: i128) -> Receipt {
        buyer.require_auth();

        if storage::load_state(&env) != SaleState::Active {
            panic_with_error!(&env, Error::SaleNotActive);
        }
        if amount <= 0 || beneficiary == env.current_contract_address() {
            panic_with_error!(&env, Error::InvalidContribution);
        }

        let config = storage::load_config(&env);
        let now = env.ledger().timestamp();

        let phases = storage::load_phases(&env);
        let (phase, rate) = ok_or_panic(&env, schedule::phase_at(config.start_time, &phases, now));
        let tokens = ok_or_panic(&env, schedule::tokens_for(amount, rate));

        let caps = storage::load_caps(&env);
        let cap = ok_or_panic(&env, schedule::cap_at(storage::load_cap_mode(&env), &caps, now));
        let supply = storage::load_milestone_supply(&env, cap.window);
        let supply = ok_or_panic(&env, schedule::supply_after(supply, tokens, &cap));

        let total_raised = ok_or_panic(
            &env,
            storage::load_total_raised(&env).checked_add(amount).ok_or(Error::Overflow),
        );
        let tokens_sold = ok_or_panic(
            &env,
            storage::load_tokens_sold(&env).checked_add(tokens).ok_or(Error::Overflow),
        );

        token::Client::new(&env, &config.payment_token).transfer(&buyer, &config.wallet, &amount);
        token::StellarAssetClient::new(&env, &config.token).mint(&beneficiary, &tokens);

        storage::save_milestone_supply(&env, cap.window, supply);
        storage::save_totals(&env, total_raised, tokens_sold);

        let receipt = Receipt {
            tokens,
            phase,
            rate,
            window: cap.window,
        };
        events::emit_purchase(&env, &buyer, &beneficiary, amount, &receipt);
        receipt
    }

    // ─────────────────────────────────────────────────────────
    // Sale state
    // ─────────────────────────────────────────────────────────

    /// Stop accepting purchases. `caller` must be an admin.
    pub fn pause(env: Env, caller: Address) {
        admin::require_admin(&env, &caller);
        let next = ok_or_panic(&env, storage::load_state(&env).transition(SaleState::Paused));
        storage::save_state(&env, next);
        events::emit_paused(&env, &caller);
    }

    /// Resume accepting purchases. `caller` must be an admin.
    pub fn unpause(env: Env, caller: Address) {
        admin::require_admin(&env, &caller);
        let next = ok_or_panic(&env, storage::load_state(&env).transition(SaleState::Active));
        storage::save_state(&env, next);
        events::emit_unpaused(&env, &caller);
    }

    /// Switch cap enforcement on (`Enforced`) or off (`Unlimited`).
    ///
    /// Milestone supply is tracked in both modes, so enforcing caps mid-sale
    /// counts every token already issued in the current window.
    pub fn set_cap_mode(env: Env, caller: Address, mode: CapMode) {
        admin::require_admin(&env, &caller);
        storage::save_cap_mode(&env, mode);
        events::emit_cap_mode(&env, &caller, mode);
    }

    // ─────────────────────────────────────────────────────────
    // Administration
    // ─────────────────────────────────────────────────────────

    pub fn add_admin(env: Env, caller: Address, admin: Address) {
        admin::add_admin(&env, &caller, &admin);
        events::emit_admin_added(&env, &caller, &admin);
    }

    /// Remove a non-owner admin.
    pub fn remove_admin(env: Env, caller: Address, admin: Address) {
        admin::remove_admin(&env, &caller, &admin);
        events::emit_admin_removed(&env, &caller, &admin);
    }

    /// Replace the sale token and the wallet. Only while paused.
    pub fn set_contracts(env: Env, caller: Address, token: Address, wallet: Address) {
        admin::require_admin(&env, &caller);
        admin::require_paused(&env);

        let mut config = storage::load_config(&env);
        config.token = token;
        config.wallet = wallet;
        validate_addresses(&env, &config);
        storage::save_config(&env, &config);

        events::emit_contracts_updated(&env, &caller, &config.token, &config.wallet);
    }

    /// Hand the sale token's admin role to `new_owner`. Only while paused.
    ///
    /// After this call purchases can no longer mint until the role is
    /// handed back or a new token is configured.
    pub fn transfer_token_ownership(env: Env, caller: Address, new_owner: Address) {
        admin::require_admin(&env, &caller);
        admin::require_paused(&env);

        let config = storage::load_config(&env);
        token::StellarAssetClient::new(&env, &config.token).set_admin(&new_owner);

        events::emit_token_ownership(&env, &caller, &config.token, &new_owner);
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    /// Rate schedule as ordered `(end_time, rate)` entries.
    pub fn list_rates(env: Env) -> Vec<Phase> {
        storage::load_phases(&env)
    }

    /// Cap schedule as ordered `(cap_time, ceiling)` entries.
    pub fn list_caps(env: Env) -> Vec<CapWindow> {
        storage::load_caps(&env)
    }

    /// Tokens issued so far in cap window `window`.
    pub fn milestone_total_supply(env: Env, window: u32) -> i128 {
        storage::load_milestone_supply(&env, window)
    }

    /// Rate applicable at `timestamp`; fails with `SaleNotActive` outside the sale.
    pub fn rate_at(env: Env, timestamp: u64) -> u32 {
        let config = storage::load_config(&env);
        let phases = storage::load_phases(&env);
        ok_or_panic(&env, schedule::rate_at(config.start_time, &phases, timestamp))
    }

    /// Rate applicable at the current ledger time.
    pub fn current_rate(env: Env) -> u32 {
        let now = env.ledger().timestamp();
        Self::rate_at(env, now)
    }

    /// Cap window and ceiling in force at `timestamp` under the current cap mode.
    pub fn cap_at(env: Env, timestamp: u64) -> ActiveCap {
        let caps = storage::load_caps(&env);
        ok_or_panic(
            &env,
            schedule::cap_at(storage::load_cap_mode(&env), &caps, timestamp),
        )
    }

    pub fn start_time(env: Env) -> u64 {
        storage::load_config(&env).start_time
    }

    pub fn token(env: Env) -> Address {
        storage::load_config(&env).token
    }

    pub fn payment_token(env: Env) -> Address {
        storage::load_config(&env).payment_token
    }

    pub fn wallet(env: Env) -> Address {
        storage::load_config(&env).wallet
    }

    pub fn sale_state(env: Env) -> SaleState {
        storage::load_state(&env)
    }

    pub fn cap_mode(env: Env) -> CapMode {
        storage::load_cap_mode(&env)
    }

    /// Payment units forwarded to the wallet across all purchases.
    pub fn total_raised(env: Env) -> i128 {
        storage::load_total_raised(&env)
    }

    /// Sale tokens minted across all purchases.
    pub fn tokens_sold(env: Env) -> i128 {
        storage::load_tokens_sold(&env)
    }

    /// Admin list, owner first.
    pub fn admins(env: Env) -> Vec<Address> {
        storage::load_admins(&env)
    }

    pub fn is_admin(env: Env, address: Address) -> bool {
        admin::is_admin(&env, &address)
    }

    /// Payment-token balance held by the wallet.
    pub fn wallet_balance(env: Env) -> i128 {
        let config = storage::load_config(&env);
        token::Client::new(&env, &config.payment_token).balance(&config.wallet)
    }

    /// Sale-token balance of `address`.
    pub fn token_balance(env: Env, address: Address) -> i128 {
        let config = storage::load_config(&env);
        token::Client::new(&env, &config.token).balance(&address)
    }
}

/// Reject address combinations that would strand funds or tokens.
///
/// Soroban has no zero address; the contract's own address plays that role
/// here, since nothing can move tokens or payments out of it.
fn validate_addresses(env: &Env, config: &SaleConfig) {
    let this = env.current_contract_address();
    let invalid = config.wallet == this
        || config.token == this
        || config.payment_token == this
        || config.token == config.payment_token
        || config.token == config.wallet;
    if invalid {
        panic_with_error!(env, Error::InvalidConfiguration);
    }
}
