//! `getEvents` polling against a Soroban RPC node, plus decoding of the
//! crowdsale contract's events into [`SaleEvent`] rows.
//!
//! Network failures, HTTP 429/5xx and server-side JSON-RPC errors are
//! retried with exponential back-off capped at [`MAX_BACKOFF`]. Malformed
//! requests are reported straight away.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::db::Checkpoint;
use crate::errors::{IndexerError, Result};
use crate::events::{EventKind, SaleEvent};

const FIRST_BACKOFF: Duration = Duration::from_secs(2);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// JSON-RPC codes for requests the node will never accept.
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Deserialize)]
struct Envelope {
    result: Option<EventPage>,
    error: Option<RpcFault>,
}

#[derive(Debug, Deserialize)]
struct RpcFault {
    code: i64,
    message: String,
}

/// One page of `getEvents` output.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
    #[serde(default)]
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    pub latest_ledger: Option<u64>,
}

impl EventPage {
    /// Checkpoint to resume from once this page, fetched at `from`, is stored.
    pub fn next_checkpoint(&self, from: &Checkpoint) -> Checkpoint {
        let latest = self
            .latest_ledger
            .and_then(|l| u32::try_from(l).ok())
            .unwrap_or(from.ledger);
        Checkpoint {
            ledger: latest.max(from.ledger),
            cursor: self.cursor.clone().or_else(|| from.cursor.clone()),
        }
    }
}

/// An event as the RPC returns it; topics and value are already decoded
/// from XDR into JSON by the node.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    pub id: Option<String>,
    pub topic: Vec<String>,
    pub value: Value,
    pub contract_id: Option<String>,
    pub tx_hash: Option<String>,
    pub ledger: Option<u64>,
    pub ledger_closed_at: Option<String>,
    pub in_successful_contract_call: Option<bool>,
}

/// Doubling delay between retries.
struct Backoff {
    next: Duration,
}

impl Backoff {
    fn new() -> Self {
        Self { next: FIRST_BACKOFF }
    }

    fn step(&mut self) -> Duration {
        let current = self.next;
        self.next = (current * 2).min(MAX_BACKOFF);
        current
    }
}

enum Attempt {
    Done(EventPage),
    Retry(String),
}

/// `getEvents` client bound to a single contract.
pub struct RpcClient {
    http: Client,
    url: String,
    contract_id: String,
    page_size: u32,
}

impl RpcClient {
    pub fn new(http: Client, config: &Config) -> Self {
        Self {
            http,
            url: config.rpc_url.clone(),
            contract_id: config.contract_id.clone(),
            page_size: config.events_per_page,
        }
    }

    pub fn contract_id(&self) -> &str {
        &self.contract_id
    }

    /// Fetch the page that follows `from`, retrying until the node answers.
    pub async fn events_page(&self, from: &Checkpoint) -> Result<EventPage> {
        let mut backoff = Backoff::new();
        loop {
            match self.attempt(from).await? {
                Attempt::Done(page) => {
                    debug!(
                        events = page.events.len(),
                        latest_ledger = ?page.latest_ledger,
                        "getEvents page received"
                    );
                    return Ok(page);
                }
                Attempt::Retry(reason) => {
                    let delay = backoff.step();
                    warn!(delay_secs = delay.as_secs(), "getEvents failed, retrying: {reason}");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn attempt(&self, from: &Checkpoint) -> Result<Attempt> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getEvents",
            "params": request_params(&self.contract_id, from, self.page_size),
        });

        let response = match self.http.post(&self.url).json(&request).send().await {
            Ok(response) => response,
            Err(e) => return Ok(Attempt::Retry(e.to_string())),
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Ok(Attempt::Retry(format!("HTTP {status}")));
        }

        let envelope: Envelope = response.json().await?;
        if let Some(fault) = envelope.error {
            if matches!(fault.code, INVALID_REQUEST | METHOD_NOT_FOUND | INVALID_PARAMS) {
                return Err(IndexerError::Rpc {
                    code: fault.code,
                    message: fault.message,
                });
            }
            return Ok(Attempt::Retry(format!("{} {}", fault.code, fault.message)));
        }

        envelope
            .result
            .map(Attempt::Done)
            .ok_or_else(|| IndexerError::EventParse("getEvents returned no result".to_string()))
    }
}

/// The node rejects `startLedger` together with a cursor, so only one is sent.
fn request_params(contract_id: &str, from: &Checkpoint, limit: u32) -> Value {
    let mut pagination = json!({ "limit": limit });
    let mut params = json!({
        "filters": [{ "type": "contract", "contractIds": [contract_id] }],
    });

    match &from.cursor {
        Some(cursor) => pagination["cursor"] = json!(cursor),
        None => params["startLedger"] = json!(from.ledger),
    }
    params["pagination"] = pagination;
    params
}

/// Turn a page of raw events into rows.
///
/// Events from failed invocations are skipped since their effects were
/// rolled back, as are events with no topic at all.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<SaleEvent> {
    raw.iter()
        .filter(|ev| ev.in_successful_contract_call != Some(false))
        .filter_map(|ev| decode_event(ev, contract_id))
        .collect()
}

/// Per-kind fields taken from an event's data value.
#[derive(Debug, Default)]
struct Payload {
    actor: Option<String>,
    amount: Option<String>,
    tokens: Option<String>,
    cap_window: Option<i64>,
}

fn decode_event(raw: &RawEvent, contract_id: &str) -> Option<SaleEvent> {
    let kind = EventKind::from_topic(&scval_text(raw.topic.first()?));
    let subject = raw.topic.get(1).map(|t| scval_text(t));
    let payload = payload(&raw.value, &kind);
    let ledger = raw.ledger.map_or(0, |l| l as i64);

    let event_id = match &raw.id {
        Some(id) => id.clone(),
        None => format!(
            "{ledger}-{}-{}-{}",
            raw.tx_hash.as_deref().unwrap_or("-"),
            kind.as_str(),
            subject.as_deref().unwrap_or("-"),
        ),
    };

    Some(SaleEvent {
        event_id,
        event_type: kind.as_str().to_string(),
        subject,
        actor: payload.actor,
        amount: payload.amount,
        tokens: payload.tokens,
        cap_window: payload.cap_window,
        ledger,
        timestamp: raw.ledger_closed_at.as_deref().map_or(0, unix_seconds),
        contract_id: raw.contract_id.as_deref().unwrap_or(contract_id).to_string(),
        tx_hash: raw.tx_hash.clone(),
    })
}

fn payload(value: &Value, kind: &EventKind) -> Payload {
    match kind {
        EventKind::SaleInitialized => Payload {
            actor: field(value, "owner"),
            ..Payload::default()
        },
        EventKind::TokenPurchase => Payload {
            actor: field(value, "buyer"),
            amount: field(value, "amount"),
            tokens: field(value, "tokens"),
            cap_window: field(value, "window").and_then(|w| w.parse().ok()),
        },
        // Pause and unpause publish the caller address as the whole value.
        EventKind::SalePaused | EventKind::SaleUnpaused => Payload {
            actor: value.as_str().map(String::from).or_else(|| field(value, "caller")),
            ..Payload::default()
        },
        EventKind::CapModeChanged
        | EventKind::ContractsUpdated
        | EventKind::TokenOwnershipTransferred
        | EventKind::AdminAdded
        | EventKind::AdminRemoved => Payload {
            actor: field(value, "caller"),
            ..Payload::default()
        },
        EventKind::Unknown => Payload::default(),
    }
}

/// Look `key` up in the event data, searching nested maps as well.
/// Strings and numbers are returned as text.
fn field(value: &Value, key: &str) -> Option<String> {
    let map = value.as_object()?;
    if let Some(found) = map.get(key).and_then(scalar_text) {
        return Some(found);
    }
    map.values().find_map(|nested| field(nested, key))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(_) => value.get("value").and_then(scalar_text),
        _ => None,
    }
}

/// A topic arrives either as `{"type":"symbol","value":"purchase"}` or as
/// the bare value.
fn scval_text(raw: &str) -> String {
    serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|v| v.get("value").and_then(scalar_text))
        .unwrap_or_else(|| raw.to_string())
}

fn unix_seconds(rfc3339: &str) -> i64 {
    chrono::DateTime::parse_from_rfc3339(rfc3339).map_or(0, |dt| dt.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(topic: &[&str], value: Value) -> RawEvent {
        RawEvent {
            id: Some("0000004294967296-0000000001".to_string()),
            topic: topic.iter().map(|t| t.to_string()).collect(),
            value,
            contract_id: Some("CSALE".to_string()),
            tx_hash: Some("TX1".to_string()),
            ledger: Some(1000),
            ledger_closed_at: Some("2024-01-01T00:00:00Z".to_string()),
            in_successful_contract_call: Some(true),
        }
    }

    const PURCHASE: &str = r#"{"type":"symbol","value":"purchase"}"#;

    #[test]
    fn purchase_fields_are_extracted() {
        let raw = event(
            &[PURCHASE, r#"{"type":"address","value":"GBENEFICIARY"}"#],
            json!({
                "buyer": "GBUYER",
                "beneficiary": "GBENEFICIARY",
                "amount": "5000",
                "tokens": "5000000",
                "phase": 0,
                "window": 1
            }),
        );

        let rows = decode_events(&[raw], "CSALE");
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.event_type, "token_purchase");
        assert_eq!(row.subject.as_deref(), Some("GBENEFICIARY"));
        assert_eq!(row.actor.as_deref(), Some("GBUYER"));
        assert_eq!(row.amount.as_deref(), Some("5000"));
        assert_eq!(row.tokens.as_deref(), Some("5000000"));
        assert_eq!(row.cap_window, Some(1));
        assert_eq!(row.ledger, 1000);
        assert_eq!(row.timestamp, 1_704_067_200);
        assert_eq!(row.event_id, "0000004294967296-0000000001");
    }

    #[test]
    fn typed_scalars_inside_data_are_unwrapped() {
        let raw = event(
            &[PURCHASE],
            json!({
                "buyer": { "type": "address", "value": "GBUYER" },
                "amount": { "type": "i128", "value": "12" },
                "window": { "type": "u32", "value": 0 }
            }),
        );

        let row = &decode_events(&[raw], "CSALE")[0];
        assert_eq!(row.actor.as_deref(), Some("GBUYER"));
        assert_eq!(row.amount.as_deref(), Some("12"));
        assert_eq!(row.cap_window, Some(0));
    }

    #[test]
    fn pause_actor_is_the_bare_value() {
        let raw = event(&[r#"{"type":"symbol","value":"paused"}"#], json!("GADMIN"));

        let rows = decode_events(&[raw], "CSALE");
        assert_eq!(rows[0].event_type, "sale_paused");
        assert_eq!(rows[0].actor.as_deref(), Some("GADMIN"));
        assert_eq!(rows[0].subject, None);
    }

    #[test]
    fn admin_change_names_caller_and_subject() {
        let raw = event(
            &["adm_add", r#"{"type":"address","value":"GNEWADMIN"}"#],
            json!({ "caller": "GOWNER", "admin": "GNEWADMIN" }),
        );

        let rows = decode_events(&[raw], "CSALE");
        assert_eq!(rows[0].event_type, "admin_added");
        assert_eq!(rows[0].subject.as_deref(), Some("GNEWADMIN"));
        assert_eq!(rows[0].actor.as_deref(), Some("GOWNER"));
    }

    #[test]
    fn rolled_back_and_topicless_events_are_skipped() {
        let mut failed = event(&[PURCHASE], json!({ "amount": "1" }));
        failed.in_successful_contract_call = Some(false);
        let empty = event(&[], json!(null));

        assert!(decode_events(&[failed, empty], "CSALE").is_empty());
    }

    #[test]
    fn missing_id_uses_composite_key() {
        let mut raw = event(&[PURCHASE, "GBEN"], json!({ "amount": "1" }));
        raw.id = None;
        raw.contract_id = None;

        let row = &decode_events(&[raw], "CSALE")[0];
        assert_eq!(row.event_id, "1000-TX1-token_purchase-GBEN");
        assert_eq!(row.contract_id, "CSALE");
    }

    #[test]
    fn params_send_cursor_or_start_ledger() {
        let fresh = Checkpoint { ledger: 77, cursor: None };
        let params = request_params("CSALE", &fresh, 50);
        assert_eq!(params["startLedger"], json!(77));
        assert_eq!(params["pagination"]["limit"], json!(50));
        assert!(params["pagination"].get("cursor").is_none());

        let resumed = Checkpoint { ledger: 77, cursor: Some("c-1".to_string()) };
        let params = request_params("CSALE", &resumed, 50);
        assert!(params.get("startLedger").is_none());
        assert_eq!(params["pagination"]["cursor"], json!("c-1"));
        assert_eq!(params["filters"][0]["contractIds"][0], json!("CSALE"));
    }

    #[test]
    fn checkpoint_advances_to_latest_ledger() {
        let from = Checkpoint { ledger: 100, cursor: None };
        let page = EventPage {
            events: Vec::new(),
            cursor: Some("c-2".to_string()),
            latest_ledger: Some(120),
        };
        let expected = Checkpoint { ledger: 120, cursor: Some("c-2".to_string()) };
        assert_eq!(page.next_checkpoint(&from), expected);

        let stale = EventPage { latest_ledger: Some(90), ..EventPage::default() };
        assert_eq!(stale.next_checkpoint(&from), from);
    }

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        let mut backoff = Backoff::new();
        assert_eq!(backoff.step(), Duration::from_secs(2));
        assert_eq!(backoff.step(), Duration::from_secs(4));
        for _ in 0..10 {
            backoff.step();
        }
        assert_eq!(backoff.step(), MAX_BACKOFF);
    }

    #[test]
    fn bad_timestamp_is_zero() {
        assert_eq!(unix_seconds("yesterday"), 0);
    }
}
