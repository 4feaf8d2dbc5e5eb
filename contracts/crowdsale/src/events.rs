//! Contract events.
//!
//! Every state change publishes one event. The leading topic is a short
//! symbol the off-chain indexer keys on:
//!
//! | Topic       | Extra topic   | Data                        |
//! |-------------|---------------|-----------------------------|
//! | `init`      |               | [`SaleInitialized`]         |
//! | `purchase`  | beneficiary   | [`TokenPurchase`]           |
//! | `paused`    |               | caller `Address`            |
//! | `unpaused`  |               | caller `Address`            |
//! | `cap_mode`  |               | [`CapModeChanged`]          |
//! | `contracts` |               | [`ContractsUpdated`]        |
//! | `tok_own`   |               | [`TokenOwnershipTransferred`] |
//! | `adm_add`   | admin         | [`AdminChanged`]            |
//! | `adm_del`   | admin         | [`AdminChanged`]            |

use soroban_sdk::{contracttype, symbol_short, Address, Env};

use crate::types::{CapMode, Receipt};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SaleInitialized {
    pub owner: Address,
    pub start_time: u64,
    pub token: Address,
    pub payment_token: Address,
    pub wallet: Address,
    pub phases: u32,
    pub windows: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenPurchase {
    pub buyer: Address,
    pub beneficiary: Address,
    pub amount: i128,
    pub tokens: i128,
    pub phase: u32,
    pub window: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CapModeChanged {
    pub caller: Address,
    pub mode: CapMode,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContractsUpdated {
    pub caller: Address,
    pub token: Address,
    pub wallet: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenOwnershipTransferred {
    pub caller: Address,
    pub token: Address,
    pub new_owner: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AdminChanged {
    pub caller: Address,
    pub admin: Address,
}

pub fn emit_initialized(env: &Env, data: SaleInitialized) {
    env.events().publish((symbol_short!("init"),), data);
}

pub fn emit_purchase(env: &Env, buyer: &Address, beneficiary: &Address, amount: i128, receipt: &Receipt) {
    env.events().publish(
        (symbol_short!("purchase"), beneficiary.clone()),
        TokenPurchase {
            buyer: buyer.clone(),
            beneficiary: beneficiary.clone(),
            amount,
            tokens: receipt.tokens,
            phase: receipt.phase,
            window: receipt.window,
        },
    );
}

pub fn emit_paused(env: &Env, caller: &Address) {
    env.events().publish((symbol_short!("paused"),), caller.clone());
}

pub fn emit_unpaused(env: &Env, caller: &Address) {
    env.events().publish((symbol_short!("unpaused"),), caller.clone());
}

pub fn emit_cap_mode(env: &Env, caller: &Address, mode: CapMode) {
    env.events().publish(
        (symbol_short!("cap_mode"),),
        CapModeChanged {
            caller: caller.clone(),
            mode,
        },
    );
}

pub fn emit_contracts_updated(env: &Env, caller: &Address, token: &Address, wallet: &Address) {
    env.events().publish(
        (symbol_short!("contracts"),),
        ContractsUpdated {
            caller: caller.clone(),
            token: token.clone(),
            wallet: wallet.clone(),
        },
    );
}

pub fn emit_token_ownership(env: &Env, caller: &Address, token: &Address, new_owner: &Address) {
    env.events().publish(
        (symbol_short!("tok_own"),),
        TokenOwnershipTransferred {
            caller: caller.clone(),
            token: token.clone(),
            new_owner: new_owner.clone(),
        },
    );
}

pub fn emit_admin_added(env: &Env, caller: &Address, admin: &Address) {
    env.events().publish(
        (symbol_short!("adm_add"), admin.clone()),
        AdminChanged {
            caller: caller.clone(),
            admin: admin.clone(),
        },
    );
}

pub fn emit_admin_removed(env: &Env, caller: &Address, admin: &Address) {
    env.events().publish(
        (symbol_short!("adm_del"), admin.clone()),
        AdminChanged {
            caller: caller.clone(),
            admin: admin.clone(),
        },
    );
}
