//! The async pool variant (spec §5): no reaper task and no std
//! synchronous mutex on the hot path - periodic collection is the owner's
//! responsibility via [`AsyncPool::reap`].

use std::collections::VecDeque;
use std::ops::Deref;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::connection::Connection;
use crate::driver::ThreadSafetyLevel;
use crate::pool::{PoolConfig, PoolError};

pub struct AsyncPool {
    config: PoolConfig,
    idle: Mutex<VecDeque<Connection>>,
}

impl AsyncPool {
    pub fn new(config: PoolConfig) -> Self {
        AsyncPool { config, idle: Mutex::new(VecDeque::new()) }
    }

    pub async fn checkout(&self, new_connection: impl FnOnce() -> Result<Connection, PoolError>) -> Result<AsyncPooledConnection<'_>, PoolError> {
        {
            let mut idle = self.idle.lock().await;
            if let Some(conn) = idle.pop_front() {
                return Ok(AsyncPooledConnection { pool: self, connection: Some(conn) });
            }
        }

        let conn = new_connection()?;
        if conn.thread_safety_level() < ThreadSafetyLevel::THREADS {
            return Err(PoolError::UnsafeDriver(conn.thread_safety_level()));
        }
        Ok(AsyncPooledConnection { pool: self, connection: Some(conn) })
    }

    async fn checkin(&self, connection: Connection) {
        if connection.thread_safety_level() < ThreadSafetyLevel::FULL {
            connection.close();
            return;
        }

        let mut idle = self.idle.lock().await;
        if idle.len() < self.config.max_size {
            idle.push_back(connection);
        } else {
            drop(idle);
            connection.close();
        }
    }

    /// Close every idle connection older than `max_age`. Unlike the
    /// synchronous [`crate::Pool`], nothing calls this on a timer; the
    /// owning task is expected to tick it (spec §5, "delegating periodic
    /// collection to the owner").
    pub async fn reap(&self) {
        let mut idle = self.idle.lock().await;
        let max_age = self.config.max_age;
        let before = idle.len();
        idle.retain_mut(|conn| {
            if conn.age() > max_age {
                conn.close();
                false
            } else {
                true
            }
        });
        let reaped = before - idle.len();
        if reaped > 0 {
            tracing::info!(reaped, "owner-driven reap closed aged-out connections");
        }
    }

    pub async fn idle_count(&self) -> usize {
        self.idle.lock().await.len()
    }
}

/// The reap cadence the owner should use: `max_age / 10`, floored at 1s,
/// matching the synchronous pool's reaper interval (spec §5).
pub fn reap_interval(max_age: Duration) -> Duration {
    (max_age / 10).max(Duration::from_secs(1))
}

pub struct AsyncPooledConnection<'p> {
    pool: &'p AsyncPool,
    connection: Option<Connection>,
}

impl AsyncPooledConnection<'_> {
    pub async fn release(mut self) {
        if let Some(conn) = self.connection.take() {
            self.pool.checkin(conn).await;
        }
    }
}

impl Deref for AsyncPooledConnection<'_> {
    type Target = Connection;
    fn deref(&self) -> &Connection {
        self.connection.as_ref().expect("connection taken before drop")
    }
}

impl Drop for AsyncPooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.connection.take() {
            tracing::warn!("async pooled connection dropped without an explicit release; closing");
            conn.close();
        }
    }
}
