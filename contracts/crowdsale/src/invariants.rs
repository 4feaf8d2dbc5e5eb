#![allow(dead_code)]

extern crate std;

use soroban_sdk::{Address, Vec};

use crate::{CapMode, CapWindow, CrowdsaleClient, Phase};

/// Ledger-visible effects of the sale, captured around a call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Snapshot {
    pub wallet_balance: i128,
    pub beneficiary_tokens: i128,
    pub milestone_supply: std::vec::Vec<i128>,
    pub total_raised: i128,
    pub tokens_sold: i128,
}

impl Snapshot {
    pub fn take(client: &CrowdsaleClient, beneficiary: &Address) -> Self {
        let windows = client.list_caps().len();
        Snapshot {
            wallet_balance: client.wallet_balance(),
            beneficiary_tokens: client.token_balance(beneficiary),
            milestone_supply: (0..windows)
                .map(|window| client.milestone_total_supply(&window))
                .collect(),
            total_raised: client.total_raised(),
            tokens_sold: client.tokens_sold(),
        }
    }
}

/// INV-1: rate schedule end times strictly ascend and every rate is positive.
pub fn assert_schedule_ordered(start_time: u64, phases: &Vec<Phase>) {
    let mut previous = start_time;
    for (index, phase) in phases.iter().enumerate() {
        assert!(
            phase.end_time > previous,
            "INV-1 violated: phase {} ends at {} which is not after {}",
            index,
            phase.end_time,
            previous
        );
        assert!(phase.rate > 0, "INV-1 violated: phase {} has zero rate", index);
        previous = phase.end_time;
    }
}

/// INV-2: with caps enforced, no window's milestone supply exceeds its ceiling.
pub fn assert_supply_within_ceilings(client: &CrowdsaleClient) {
    if client.cap_mode() != CapMode::Enforced {
        return;
    }
    let caps: Vec<CapWindow> = client.list_caps();
    for (index, window) in caps.iter().enumerate() {
        let supply = client.milestone_total_supply(&(index as u32));
        assert!(
            supply <= window.ceiling,
            "INV-2 violated: window {} supply {} exceeds ceiling {}",
            index,
            supply,
            window.ceiling
        );
    }
}

/// INV-3: tokens minted by the sale equal the sum of milestone supplies.
pub fn assert_milestones_sum_to_tokens_sold(client: &CrowdsaleClient) {
    let windows = client.list_caps().len();
    let sum: i128 = (0..windows)
        .map(|window| client.milestone_total_supply(&window))
        .sum();
    assert_eq!(
        sum,
        client.tokens_sold(),
        "INV-3 violated: milestone supplies sum to {} but {} tokens were sold",
        sum,
        client.tokens_sold()
    );
}

/// INV-4: a rejected call changes nothing.
pub fn assert_unchanged(before: &Snapshot, after: &Snapshot) {
    assert_eq!(before, after, "INV-4 violated: rejected call left side effects");
}

/// INV-5: milestone supply never decreases.
pub fn assert_supply_monotonic(before: &Snapshot, after: &Snapshot) {
    for (index, (old, new)) in before
        .milestone_supply
        .iter()
        .zip(after.milestone_supply.iter())
        .enumerate()
    {
        assert!(
            new >= old,
            "INV-5 violated: window {} supply decreased from {} to {}",
            index,
            old,
            new
        );
    }
}

/// Run every stateless sale invariant.
pub fn assert_all_sale_invariants(client: &CrowdsaleClient) {
    assert_schedule_ordered(client.start_time(), &client.list_rates());
    assert_supply_within_ceilings(client);
    assert_milestones_sum_to_tokens_sold(client);
}
