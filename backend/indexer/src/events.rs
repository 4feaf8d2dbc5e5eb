//! Canonical event types emitted by the crowdsale contract.
//!
//! These mirror the Soroban contract events defined in
//! `contracts/crowdsale/src/events.rs`.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from the crowdsale contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The sale was configured (`init` topic).
    SaleInitialized,
    /// Tokens were bought (`purchase` topic).
    TokenPurchase,
    /// The sale was paused (`paused` topic).
    SalePaused,
    /// The sale was unpaused (`unpaused` topic).
    SaleUnpaused,
    /// Cap enforcement was toggled (`cap_mode` topic).
    CapModeChanged,
    /// Token and wallet were replaced (`contracts` topic).
    ContractsUpdated,
    /// Sale-token admin role was handed over (`tok_own` topic).
    TokenOwnershipTransferred,
    /// An admin was added (`adm_add` topic).
    AdminAdded,
    /// An admin was removed (`adm_del` topic).
    AdminRemoved,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

impl EventKind {
    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "init" => Self::SaleInitialized,
            "purchase" => Self::TokenPurchase,
            "paused" => Self::SalePaused,
            "unpaused" => Self::SaleUnpaused,
            "cap_mode" => Self::CapModeChanged,
            "contracts" => Self::ContractsUpdated,
            "tok_own" => Self::TokenOwnershipTransferred,
            "adm_add" => Self::AdminAdded,
            "adm_del" => Self::AdminRemoved,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SaleInitialized => "sale_initialized",
            Self::TokenPurchase => "token_purchase",
            Self::SalePaused => "sale_paused",
            Self::SaleUnpaused => "sale_unpaused",
            Self::CapModeChanged => "cap_mode_changed",
            Self::ContractsUpdated => "contracts_updated",
            Self::TokenOwnershipTransferred => "token_ownership_transferred",
            Self::AdminAdded => "admin_added",
            Self::AdminRemoved => "admin_removed",
            Self::Unknown => "unknown",
        }
    }
}

/// A fully decoded crowdsale event, ready to be stored in the database.
///
/// `subject` is the address the event is about (the beneficiary of a
/// purchase, the admin added or removed); `actor` is who caused it.
/// Amounts are decimal strings because contract values are `i128`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleEvent {
    pub event_id: String,
    pub event_type: String,
    pub subject: Option<String>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub tokens: Option<String>,
    pub cap_window: Option<i64>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

/// A raw event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_id: String,
    pub event_type: String,
    pub subject: Option<String>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub tokens: Option<String>,
    pub cap_window: Option<i64>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_topics_map_to_kinds() {
        let cases = [
            ("init", EventKind::SaleInitialized),
            ("purchase", EventKind::TokenPurchase),
            ("paused", EventKind::SalePaused),
            ("unpaused", EventKind::SaleUnpaused),
            ("cap_mode", EventKind::CapModeChanged),
            ("contracts", EventKind::ContractsUpdated),
            ("tok_own", EventKind::TokenOwnershipTransferred),
            ("adm_add", EventKind::AdminAdded),
            ("adm_del", EventKind::AdminRemoved),
        ];
        for (topic, kind) in cases {
            assert_eq!(EventKind::from_topic(topic), kind, "topic {topic}");
        }
        assert_eq!(EventKind::from_topic("transfer"), EventKind::Unknown);
    }

    #[test]
    fn stored_names_match_serde_names() {
        for kind in [
            EventKind::TokenPurchase,
            EventKind::SalePaused,
            EventKind::TokenOwnershipTransferred,
            EventKind::Unknown,
        ] {
            let json = serde_json::to_value(&kind).unwrap();
            assert_eq!(json, serde_json::Value::from(kind.as_str()));
        }
    }
}
