//! Sale totals reconstructed from indexed purchase events.
//!
//! Contract amounts are `i128`, which overflows SQLite integers, so the
//! aggregation is done here instead of in SQL. Rows whose amounts did not
//! decode are left out of the totals and counted in `skipped`.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::errors::{IndexerError, Result};
use crate::events::EventRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowSupply {
    pub window: i64,
    /// Tokens issued in this cap window, as a decimal string.
    pub tokens: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleSummary {
    pub purchases: usize,
    /// Purchase rows left out because an amount was missing or malformed.
    pub skipped: usize,
    pub total_raised: String,
    pub tokens_sold: String,
    pub windows: Vec<WindowSupply>,
}

fn invalid(record: &EventRecord, reason: String) -> IndexerError {
    IndexerError::InvalidPurchase {
        event_id: record.event_id.clone(),
        reason,
    }
}

fn parse_amount(record: &EventRecord, field: &str, value: Option<&str>) -> Result<i128> {
    let raw = value.ok_or_else(|| invalid(record, format!("has no {field}")))?;
    raw.parse::<i128>()
        .map_err(|e| invalid(record, format!("invalid {field} {raw:?}: {e}")))
}

fn checked_sum(record: &EventRecord, total: i128, value: i128, field: &str) -> Result<i128> {
    total
        .checked_add(value)
        .ok_or_else(|| invalid(record, format!("{field} total overflows i128")))
}

/// Fold purchase records into sale totals and per-window milestone supply.
///
/// Fails only when a total overflows `i128`.
pub fn summarize(purchases: &[EventRecord]) -> Result<SaleSummary> {
    let mut total_raised = 0i128;
    let mut tokens_sold = 0i128;
    let mut windows: BTreeMap<i64, i128> = BTreeMap::new();
    let mut skipped = 0usize;

    for record in purchases {
        let parsed = parse_amount(record, "amount", record.amount.as_deref()).and_then(|amount| {
            parse_amount(record, "tokens", record.tokens.as_deref()).map(|tokens| (amount, tokens))
        });
        let (amount, tokens) = match parsed {
            Ok(values) => values,
            Err(e) => {
                warn!("Skipping purchase in summary: {e}");
                skipped += 1;
                continue;
            }
        };

        total_raised = checked_sum(record, total_raised, amount, "amount")?;
        tokens_sold = checked_sum(record, tokens_sold, tokens, "tokens")?;

        if let Some(window) = record.cap_window {
            let supply = windows.entry(window).or_insert(0);
            *supply = checked_sum(record, *supply, tokens, "window")?;
        }
    }

    Ok(SaleSummary {
        purchases: purchases.len() - skipped,
        skipped,
        total_raised: total_raised.to_string(),
        tokens_sold: tokens_sold.to_string(),
        windows: windows
            .into_iter()
            .map(|(window, tokens)| WindowSupply {
                window,
                tokens: tokens.to_string(),
            })
            .collect(),
    })
}
