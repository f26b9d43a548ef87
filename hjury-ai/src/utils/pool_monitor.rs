//! Connection pool monitoring utilities
//!
//! Instrumented transactions that log how long a connection waited in the
//! pool and how long it was held, to diagnose lock contention during layer
//! persistence.

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::time::Instant;
use hjury_common::Result;

/// Transaction wrapper that logs acquisition and hold timing
///
/// Dropping it without calling `commit` rolls the transaction back.
pub struct MonitoredTransaction {
    tx: Transaction<'static, Sqlite>,
    caller: &'static str,
    acquired_at: Instant,
}

impl MonitoredTransaction {
    /// Connection to run statements on
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    /// Commit the transaction and log how long the connection was held
    pub async fn commit(self) -> Result<()> {
        let held_ms = self.acquired_at.elapsed().as_millis();
        self.tx.commit().await?;

        if held_ms > 2000 {
            tracing::warn!(
                caller = self.caller,
                held_ms,
                "LONG TRANSACTION - connection held for extended period"
            );
        } else {
            tracing::debug!(caller = self.caller, held_ms, "Connection released (commit)");
        }

        Ok(())
    }
}

/// Begin a transaction, logging slow pool acquisition
pub async fn begin_monitored(
    pool: &SqlitePool,
    caller: &'static str,
) -> Result<MonitoredTransaction> {
    let start = Instant::now();
    let tx = pool.begin().await?;
    let wait_ms = start.elapsed().as_millis();

    if wait_ms > 1000 {
        tracing::warn!(
            caller,
            wait_ms,
            "SLOW CONNECTION ACQUISITION - pool may be saturated"
        );
    } else {
        tracing::debug!(caller, wait_ms, "Connection acquired");
    }

    Ok(MonitoredTransaction {
        tx,
        caller,
        acquired_at: Instant::now(),
    })
}
