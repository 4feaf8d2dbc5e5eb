//! # Types
//!
//! Shared data structures used across the crowdsale modules.
//!
//! ## Sale state as a two-state machine
//!
//! [`SaleState`] gates both purchases and administrative reconfiguration:
//!
//! ```text
//! Paused ──unpause──► Active
//!    ▲                  │
//!    └──────pause───────┘
//! ```
//!
//! A sale is created `Paused`. Purchases require `Active`; replacing the token
//! or wallet and handing over token ownership require `Paused`. Same-state
//! transitions are rejected.
//!
//! ## Schedules
//!
//! The rate schedule ([`Phase`]) and the cap schedule ([`CapWindow`]) are
//! independent ordered sequences. Both are validated once at initialisation
//! and never mutated afterwards.

use soroban_sdk::{contracttype, Address, Vec};

use crate::Error;

/// Operational state of the sale.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SaleState {
    /// Purchases are accepted.
    Active,
    /// Purchases are rejected; token and wallet may be reconfigured.
    Paused,
}

impl SaleState {
    /// Move to `next`, rejecting a transition into the current state.
    pub fn transition(self, next: SaleState) -> Result<SaleState, Error> {
        if self == next {
            return Err(Error::InvalidStateTransition);
        }
        Ok(next)
    }
}

/// Cap enforcement toggle ("dilution").
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CapMode {
    /// No ceiling is applied to any cap window.
    Unlimited,
    /// Each cap window's ceiling bounds its milestone supply.
    Enforced,
}

/// One pricing phase. Ends (exclusive) at `end_time`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Phase {
    pub end_time: u64,
    /// Sale tokens minted per payment unit.
    pub rate: u32,
}

/// One cap window. Ends (exclusive) at `cap_time`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CapWindow {
    pub cap_time: u64,
    /// Maximum tokens issued within this window.
    pub ceiling: i128,
}

/// Cap window resolved for a point in time.
///
/// `ceiling` is `None` when the sale is uncapped.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ActiveCap {
    pub window: u32,
    pub ceiling: Option<i128>,
}

/// Parameters supplied once to `init`.
///
/// `end_times`/`rates` and `cap_times`/`caps` are parallel arrays.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SaleParams {
    pub start_time: u64,
    pub end_times: Vec<u64>,
    pub rates: Vec<u32>,
    /// Sale token (Stellar Asset Contract administered by the crowdsale).
    pub token: Address,
    /// Asset buyers pay with.
    pub payment_token: Address,
    /// Custodial wallet receiving every contribution.
    pub wallet: Address,
    pub cap_times: Vec<u64>,
    pub caps: Vec<i128>,
}

/// Addresses and start time, written at initialisation.
///
/// `token` and `wallet` may be replaced while the sale is paused.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SaleConfig {
    pub start_time: u64,
    pub token: Address,
    pub payment_token: Address,
    pub wallet: Address,
}

/// Outcome of an accepted purchase.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Receipt {
    pub tokens: i128,
    pub phase: u32,
    pub rate: u32,
    pub window: u32,
}
