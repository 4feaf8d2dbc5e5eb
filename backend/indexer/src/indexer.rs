//! Background task that follows the contract's event stream into SQLite.

use std::time::Duration;

use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::db::{self, Checkpoint};
use crate::errors::{IndexerError, Result};
use crate::rpc::{self, RpcClient};

pub struct Indexer {
    pub pool: SqlitePool,
    pub rpc: RpcClient,
    pub poll_interval: Duration,
    pub start_ledger: u32,
}

impl Indexer {
    /// Poll until `shutdown` fires.
    ///
    /// A request the RPC node rejects outright cannot succeed on retry. The
    /// indexer then cancels `shutdown`, taking the HTTP server down with it,
    /// and returns the error.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let mut checkpoint = match db::load_checkpoint(&self.pool).await {
            Ok(Some(saved)) => saved,
            Ok(None) => Checkpoint {
                ledger: self.start_ledger,
                cursor: None,
            },
            Err(e) => {
                warn!("Could not read checkpoint, starting from ledger {}: {e}", self.start_ledger);
                Checkpoint {
                    ledger: self.start_ledger,
                    cursor: None,
                }
            }
        };
        info!(
            contract = self.rpc.contract_id(),
            ledger = checkpoint.ledger,
            "Indexer started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                outcome = self.poll_once(&checkpoint) => match outcome {
                    Ok(next) => checkpoint = next,
                    Err(e @ IndexerError::Rpc { .. }) => {
                        error!(ledger = checkpoint.ledger, "Indexer halted: {e}");
                        shutdown.cancel();
                        return Err(e);
                    }
                    Err(e) => error!("Poll failed: {e}"),
                },
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        info!(ledger = checkpoint.ledger, "Indexer stopped");
        Ok(())
    }

    /// Fetch one page after `from`, store it, and return the new checkpoint.
    async fn poll_once(&self, from: &Checkpoint) -> Result<Checkpoint> {
        let page = self.rpc.events_page(from).await?;
        let rows = rpc::decode_events(&page.events, self.rpc.contract_id());
        let next = page.next_checkpoint(from);

        let inserted = db::commit_page(&self.pool, &rows, &next).await?;
        if !page.events.is_empty() {
            info!(
                received = page.events.len(),
                stored = inserted,
                ledger = next.ledger,
                "Indexed events"
            );
        }
        Ok(next)
    }
}
