//! # Storage
//!
//! Typed helpers over the two Soroban storage tiers used by the crowdsale.
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key            | Type              | Description                          |
//! |----------------|-------------------|--------------------------------------|
//! | `Config`       | `SaleConfig`      | Start time, token, payment token, wallet |
//! | `Phases`       | `Vec<Phase>`      | Rate schedule                        |
//! | `Caps`         | `Vec<CapWindow>`  | Cap schedule                         |
//! | `State`        | `SaleState`       | Active / Paused                      |
//! | `CapMode`      | `CapMode`         | Dilution toggle                      |
//! | `Admins`       | `Vec<Address>`    | Admin list, owner first              |
//! | `TotalRaised`  | `i128`            | Payment units forwarded to the wallet |
//! | `TokensSold`   | `i128`            | Sale tokens minted                   |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                    | Type   | Description                          |
//! |------------------------|--------|--------------------------------------|
//! | `MilestoneSupply(idx)` | `i128` | Tokens issued in cap window `idx`    |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.
//!
//! Milestone entries are created on the first purchase in a window; an absent
//! entry reads as zero.

use soroban_sdk::{contracttype, panic_with_error, Address, Env, Vec};

use crate::types::{CapMode, CapWindow, Phase, SaleConfig, SaleState};
use crate::Error;

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Config,
    Phases,
    Caps,
    State,
    CapMode,
    Admins,
    TotalRaised,
    TokensSold,
    /// Tokens issued in a cap window (Persistent).
    MilestoneSupply(u32),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Config)
}

/// Write every initial entry in one go. Callers validate beforehand.
pub fn save_sale(
    env: &Env,
    config: &SaleConfig,
    phases: &Vec<Phase>,
    caps: &Vec<CapWindow>,
    owner: &Address,
) {
    let instance = env.storage().instance();
    instance.set(&DataKey::Config, config);
    instance.set(&DataKey::Phases, phases);
    instance.set(&DataKey::Caps, caps);
    instance.set(&DataKey::State, &SaleState::Paused);
    instance.set(&DataKey::CapMode, &CapMode::Unlimited);
    instance.set(&DataKey::Admins, &Vec::from_array(env, [owner.clone()]));
    instance.set(&DataKey::TotalRaised, &0i128);
    instance.set(&DataKey::TokensSold, &0i128);
    bump_instance(env);
}

/// Load a required instance entry, failing with `NotInitialized` when absent.
fn load_instance<V>(env: &Env, key: &DataKey) -> V
where
    V: soroban_sdk::TryFromVal<Env, soroban_sdk::Val>,
{
    bump_instance(env);
    env.storage()
        .instance()
        .get(key)
        .unwrap_or_else(|| panic_with_error!(env, Error::NotInitialized))
}

pub fn load_config(env: &Env) -> SaleConfig {
    load_instance(env, &DataKey::Config)
}

pub fn save_config(env: &Env, config: &SaleConfig) {
    env.storage().instance().set(&DataKey::Config, config);
    bump_instance(env);
}

pub fn load_phases(env: &Env) -> Vec<Phase> {
    load_instance(env, &DataKey::Phases)
}

pub fn load_caps(env: &Env) -> Vec<CapWindow> {
    load_instance(env, &DataKey::Caps)
}

pub fn load_state(env: &Env) -> SaleState {
    load_instance(env, &DataKey::State)
}

pub fn save_state(env: &Env, state: SaleState) {
    env.storage().instance().set(&DataKey::State, &state);
    bump_instance(env);
}

pub fn load_cap_mode(env: &Env) -> CapMode {
    load_instance(env, &DataKey::CapMode)
}

pub fn save_cap_mode(env: &Env, mode: CapMode) {
    env.storage().instance().set(&DataKey::CapMode, &mode);
    bump_instance(env);
}

pub fn load_admins(env: &Env) -> Vec<Address> {
    load_instance(env, &DataKey::Admins)
}

pub fn save_admins(env: &Env, admins: &Vec<Address>) {
    env.storage().instance().set(&DataKey::Admins, admins);
    bump_instance(env);
}

pub fn load_total_raised(env: &Env) -> i128 {
    load_instance(env, &DataKey::TotalRaised)
}

pub fn load_tokens_sold(env: &Env) -> i128 {
    load_instance(env, &DataKey::TokensSold)
}

/// Store the running sale totals after a purchase.
pub fn save_totals(env: &Env, total_raised: i128, tokens_sold: i128) {
    let instance = env.storage().instance();
    instance.set(&DataKey::TotalRaised, &total_raised);
    instance.set(&DataKey::TokensSold, &tokens_sold);
    bump_instance(env);
}

// ── Persistent Storage Helpers ───────────────────────────────────────

fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

/// Tokens issued in cap window `window`; zero until the first purchase there.
pub fn load_milestone_supply(env: &Env, window: u32) -> i128 {
    let key = DataKey::MilestoneSupply(window);
    match env.storage().persistent().get(&key) {
        Some(supply) => {
            bump_persistent(env, &key);
            supply
        }
        None => 0,
    }
}

pub fn save_milestone_supply(env: &Env, window: u32, supply: i128) {
    let key = DataKey::MilestoneSupply(window);
    env.storage().persistent().set(&key, &supply);
    bump_persistent(env, &key);
}
