//! Reentrant transactions by a level counter (spec §5): level 0 to level 1
//! starts a real transaction, level N to N+1 opens a savepoint named by
//! level. A scoped acquisition guarantees commit or rollback on exit.

use crate::connection::Connection;

#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("transaction level mismatch: requested {requested}, current level is {actual}")]
    LevelMismatch { requested: u32, actual: u32 },

    #[error("driver error: {0}")]
    Driver(String),
}

fn savepoint_name(level: u32) -> String {
    format!("sp_level_{level}")
}

/// A handle to one nesting level of a connection's transaction. Dropping
/// it without calling [`Transaction::commit`] or [`Transaction::rollback`]
/// rolls back, matching the scoped-acquisition guarantee.
pub struct Transaction<'c> {
    connection: &'c Connection,
    level: u32,
    finished: bool,
}

impl<'c> Transaction<'c> {
    pub fn begin(connection: &'c Connection) -> Result<Self, TransactionError> {
        let level = connection.push_level();
        let statement = if level == 1 { "BEGIN".to_owned() } else { format!("SAVEPOINT {}", savepoint_name(level)) };
        connection.execute_statement(&statement)?;
        tracing::debug!(level, "transaction opened");
        Ok(Transaction { connection, level, finished: false })
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn commit(mut self) -> Result<(), TransactionError> {
        self.finish(true)
    }

    pub fn rollback(mut self) -> Result<(), TransactionError> {
        self.finish(false)
    }

    fn finish(&mut self, commit: bool) -> Result<(), TransactionError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        let closed = self.connection.pop_at_or_above(self.level)?;
        tracing::debug!(level = self.level, closed_cursors = closed.len(), commit, "closing transaction level");

        let statement = match (self.level, commit) {
            (1, true) => "COMMIT".to_owned(),
            (1, false) => "ROLLBACK".to_owned(),
            (_, true) => format!("RELEASE SAVEPOINT {}", savepoint_name(self.level)),
            (_, false) => format!("ROLLBACK TO SAVEPOINT {}", savepoint_name(self.level)),
        };
        self.connection.execute_statement(&statement)
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(err) = self.finish(false) {
                tracing::error!(level = self.level, error = %err, "implicit rollback on drop failed");
            }
        }
    }
}

/// Run `body` inside a freshly begun transaction level on `connection`,
/// committing on `Ok` and rolling back on `Err` (spec §5, "scoped
/// acquisition guarantees either commit or rollback on exit").
pub fn with_transaction<'c, T, E>(connection: &'c Connection, body: impl FnOnce(&Transaction<'c>) -> Result<T, E>) -> Result<T, E>
where
    E: From<TransactionError>,
{
    let tx = Transaction::begin(connection)?;
    match body(&tx) {
        Ok(value) => {
            tx.commit()?;
            Ok(value)
        }
        Err(err) => {
            let _ = tx.rollback();
            Err(err)
        }
    }
}
