//! # Schedule
//!
//! Pure resolvers over the rate and cap schedules. Nothing in here touches
//! storage, so every function is usable from tests without a deployed
//! contract.
//!
//! Both schedules are half-open: an entry covers `[previous_end, end)`.
//! A timestamp equal to an entry's end belongs to the next entry.

use soroban_sdk::{Env, Vec};

use crate::types::{ActiveCap, CapMode, CapWindow, Phase};
use crate::Error;

/// Build the rate schedule from parallel `end_times` / `rates` arrays.
///
/// Rejects empty or mismatched arrays, end times that are not strictly
/// ascending (the first must be after `start_time`) and zero rates.
pub fn build_phases(
    env: &Env,
    start_time: u64,
    end_times: &Vec<u64>,
    rates: &Vec<u32>,
) -> Result<Vec<Phase>, Error> {
    if end_times.is_empty() || end_times.len() != rates.len() {
        return Err(Error::InvalidConfiguration);
    }

    let mut phases = Vec::new(env);
    let mut previous = start_time;
    for (end_time, rate) in end_times.iter().zip(rates.iter()) {
        if end_time <= previous || rate == 0 {
            return Err(Error::InvalidConfiguration);
        }
        phases.push_back(Phase { end_time, rate });
        previous = end_time;
    }
    Ok(phases)
}

/// Build the cap schedule from parallel `cap_times` / `caps` arrays.
///
/// Same ordering rules as [`build_phases`]; every ceiling must be positive.
pub fn build_caps(
    env: &Env,
    start_time: u64,
    cap_times: &Vec<u64>,
    caps: &Vec<i128>,
) -> Result<Vec<CapWindow>, Error> {
    if cap_times.is_empty() || cap_times.len() != caps.len() {
        return Err(Error::InvalidConfiguration);
    }

    let mut windows = Vec::new(env);
    let mut previous = start_time;
    for (cap_time, ceiling) in cap_times.iter().zip(caps.iter()) {
        if cap_time <= previous || ceiling <= 0 {
            return Err(Error::InvalidConfiguration);
        }
        windows.push_back(CapWindow { cap_time, ceiling });
        previous = cap_time;
    }
    Ok(windows)
}

/// Resolve the phase covering `now`, returning `(phase_index, rate)`.
pub fn phase_at(start_time: u64, phases: &Vec<Phase>, now: u64) -> Result<(u32, u32), Error> {
    if now < start_time {
        return Err(Error::SaleNotActive);
    }
    phases
        .iter()
        .enumerate()
        .find(|(_, phase)| phase.end_time > now)
        .map(|(index, phase)| (index as u32, phase.rate))
        .ok_or(Error::SaleNotActive)
}

/// Rate applicable at `now`.
pub fn rate_at(start_time: u64, phases: &Vec<Phase>, now: u64) -> Result<u32, Error> {
    phase_at(start_time, phases, now).map(|(_, rate)| rate)
}

/// Cap window covering `now`, returning `(window_index, ceiling)`.
///
/// Past the last cap time the last window keeps applying.
pub fn window_at(windows: &Vec<CapWindow>, now: u64) -> Result<(u32, i128), Error> {
    let last = windows.last().ok_or(Error::InvalidConfiguration)?;
    let resolved = windows
        .iter()
        .enumerate()
        .find(|(_, window)| window.cap_time > now)
        .map(|(index, window)| (index as u32, window.ceiling))
        .unwrap_or((windows.len() - 1, last.ceiling));
    Ok(resolved)
}

/// Cap in force at `now` under `mode`.
pub fn cap_at(mode: CapMode, windows: &Vec<CapWindow>, now: u64) -> Result<ActiveCap, Error> {
    let (window, ceiling) = window_at(windows, now)?;
    let ceiling = match mode {
        CapMode::Enforced => Some(ceiling),
        CapMode::Unlimited => None,
    };
    Ok(ActiveCap { window, ceiling })
}

/// Tokens minted for `amount` payment units at `rate`.
pub fn tokens_for(amount: i128, rate: u32) -> Result<i128, Error> {
    amount
        .checked_mul(i128::from(rate))
        .ok_or(Error::Overflow)
}

/// Milestone supply after issuing `tokens` on top of `supply`.
///
/// Rejects the whole issuance when it would cross the ceiling.
pub fn supply_after(supply: i128, tokens: i128, cap: &ActiveCap) -> Result<i128, Error> {
    let next = supply.checked_add(tokens).ok_or(Error::Overflow)?;
    match cap.ceiling {
        Some(ceiling) if next > ceiling => Err(Error::CapExceeded),
        _ => Ok(next),
    }
}
