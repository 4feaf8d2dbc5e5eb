//! # Admin
//!
//! Admin list maintenance and authorization guards.
//!
//! The owner passed to `init` is stored at index 0 of the admin list and
//! cannot be removed. Every other admin may be added or removed by any admin.
//! All admins hold the same powers: pausing, toggling cap enforcement,
//! replacing the token and wallet, and handing over token ownership.

use soroban_sdk::{panic_with_error, Address, Env};

use crate::storage::{load_admins, load_state, save_admins};
use crate::types::SaleState;
use crate::Error;

/// Returns `true` if `address` is on the admin list.
pub fn is_admin(env: &Env, address: &Address) -> bool {
    load_admins(env).iter().any(|admin| &admin == address)
}

/// Require `caller` to sign and to be an admin.
pub fn require_admin(env: &Env, caller: &Address) {
    caller.require_auth();
    if !is_admin(env, caller) {
        panic_with_error!(env, Error::NotAuthorized);
    }
}

/// Require the sale to be paused; reconfiguration is only allowed then.
pub fn require_paused(env: &Env) {
    if load_state(env) != SaleState::Paused {
        panic_with_error!(env, Error::SaleNotPaused);
    }
}

/// Append `admin` to the list. `caller` must already be an admin.
pub fn add_admin(env: &Env, caller: &Address, admin: &Address) {
    require_admin(env, caller);

    let mut admins = load_admins(env);
    if admins.iter().any(|existing| &existing == admin) {
        panic_with_error!(env, Error::AdminExists);
    }
    admins.push_back(admin.clone());
    save_admins(env, &admins);
}

/// Remove `admin` from the list. The owner at index 0 stays.
pub fn remove_admin(env: &Env, caller: &Address, admin: &Address) {
    require_admin(env, caller);

    let mut admins = load_admins(env);
    let index = admins
        .iter()
        .position(|existing| &existing == admin)
        .unwrap_or_else(|| panic_with_error!(env, Error::AdminNotFound));
    if index == 0 {
        panic_with_error!(env, Error::NotAuthorized);
    }
    admins.remove(index as u32);
    save_admins(env, &admins);
}
