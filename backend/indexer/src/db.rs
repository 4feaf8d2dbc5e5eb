//! SQLite storage for indexed sale events and the indexer checkpoint.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::errors::Result;
use crate::events::{EventKind, EventRecord, SaleEvent};

const EVENT_COLUMNS: &str = "id, event_id, event_type, subject, actor, amount, tokens, \
     cap_window, ledger, timestamp, contract_id, tx_hash, created_at";

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    connect(database_url, 5).await
}

/// Open a pool with at most `max_connections` and apply migrations.
///
/// An in-memory database lives per connection, so callers using
/// `sqlite::memory:` must pass `1`.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };

    // Make sure the file is created if it doesn't exist yet.
    let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

/// Where the indexer left off: the next ledger to scan and, when a page
/// was cut short, the RPC pagination cursor inside that range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checkpoint {
    pub ledger: u32,
    pub cursor: Option<String>,
}

/// Read the saved checkpoint, `None` until the first poll stores one.
pub async fn load_checkpoint(pool: &SqlitePool) -> Result<Option<Checkpoint>> {
    let row: Option<(i64, Option<String>)> =
        sqlx::query_as("SELECT last_ledger, last_cursor FROM indexer_cursor WHERE id = 1")
            .fetch_optional(pool)
            .await?;

    Ok(row
        .filter(|(ledger, cursor)| *ledger > 0 || cursor.is_some())
        .map(|(ledger, cursor)| Checkpoint {
            ledger: u32::try_from(ledger).unwrap_or(u32::MAX),
            cursor,
        }))
}

/// Store a batch of events and the checkpoint that follows it in one
/// transaction, so a crash never skips or half-writes a page.
///
/// Events already stored under the same `event_id` are ignored. Returns
/// the number of new rows.
pub async fn commit_page(
    pool: &SqlitePool,
    events: &[SaleEvent],
    checkpoint: &Checkpoint,
) -> Result<usize> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0usize;

    for ev in events {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO events
                (event_id, event_type, subject, actor, amount, tokens, cap_window,
                 ledger, timestamp, contract_id, tx_hash)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&ev.event_id)
        .bind(&ev.event_type)
        .bind(&ev.subject)
        .bind(&ev.actor)
        .bind(&ev.amount)
        .bind(&ev.tokens)
        .bind(ev.cap_window)
        .bind(ev.ledger)
        .bind(ev.timestamp)
        .bind(&ev.contract_id)
        .bind(&ev.tx_hash)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected() as usize;
    }

    sqlx::query("UPDATE indexer_cursor SET last_ledger = ?1, last_cursor = ?2 WHERE id = 1")
        .bind(i64::from(checkpoint.ledger))
        .bind(checkpoint.cursor.as_deref())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(inserted)
}

// ─────────────────────────────────────────────────────────
// Event reads
// ─────────────────────────────────────────────────────────

/// Fetch all events about a given address (beneficiary or admin),
/// ordered by ledger ascending.
pub async fn get_events_for_subject(pool: &SqlitePool, subject: &str) -> Result<Vec<EventRecord>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE subject = ?1 ORDER BY ledger ASC, id ASC"
    );
    let rows = sqlx::query_as::<_, EventRecord>(&sql)
        .bind(subject)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Fetch every indexed purchase, ordered by ledger ascending.
pub async fn get_purchases(pool: &SqlitePool) -> Result<Vec<EventRecord>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE event_type = ?1 ORDER BY ledger ASC, id ASC"
    );
    let rows = sqlx::query_as::<_, EventRecord>(&sql)
        .bind(EventKind::TokenPurchase.as_str())
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Fetch all events, ordered by ledger ascending.
pub async fn get_all_events(pool: &SqlitePool) -> Result<Vec<EventRecord>> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY ledger ASC, id ASC");
    let rows = sqlx::query_as::<_, EventRecord>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
