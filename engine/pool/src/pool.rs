//! The synchronous connection pool (spec §5): a thread-safe borrow/return
//! interface backed by a dedicated reaper that closes aged-out idle
//! connections at `max_age / 10` (minimum 1s).

use std::collections::VecDeque;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::connection::Connection;
use crate::driver::ThreadSafetyLevel;

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("driver reports thread-safety level {0:?}, pool requires at least THREADS (1)")]
    UnsafeDriver(ThreadSafetyLevel),

    #[error("failed to open a new connection: {0}")]
    Connect(String),
}

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_size: usize,
    pub max_age: Duration,
}

struct PoolInner {
    config: PoolConfig,
    idle: Mutex<VecDeque<Connection>>,
}

/// A synchronous, thread-safe connection pool with a background reaper.
pub struct Pool {
    inner: Arc<PoolInner>,
    shutdown: Arc<AtomicBool>,
    reaper: Option<thread::JoinHandle<()>>,
}

impl Pool {
    pub fn new(config: PoolConfig) -> Self {
        let reap_interval = (config.max_age / 10).max(Duration::from_secs(1));
        let inner = Arc::new(PoolInner { config, idle: Mutex::new(VecDeque::new()) });
        let shutdown = Arc::new(AtomicBool::new(false));

        let reaper_inner = Arc::clone(&inner);
        let reaper_shutdown = Arc::clone(&shutdown);
        let reaper = thread::spawn(move || reap_loop(reaper_inner, reaper_shutdown, reap_interval));

        Pool { inner, shutdown, reaper: Some(reaper) }
    }

    /// Borrow an idle connection, or build a new one with `new_connection`
    /// when the pool is empty. Rejects drivers below [`ThreadSafetyLevel::THREADS`].
    pub fn checkout(&self, new_connection: impl FnOnce() -> Result<Connection, PoolError>) -> Result<PooledConnection<'_>, PoolError> {
        if let Some(conn) = self.inner.idle.lock().unwrap().pop_front() {
            return Ok(PooledConnection { pool: self, connection: Some(conn) });
        }

        let conn = new_connection()?;
        if conn.thread_safety_level() < ThreadSafetyLevel::THREADS {
            return Err(PoolError::UnsafeDriver(conn.thread_safety_level()));
        }
        Ok(PooledConnection { pool: self, connection: Some(conn) })
    }

    fn checkin(&self, connection: Connection) {
        if connection.thread_safety_level() < ThreadSafetyLevel::FULL {
            connection.close();
            return;
        }

        let mut idle = self.inner.idle.lock().unwrap();
        if idle.len() < self.inner.config.max_size {
            idle.push_back(connection);
        } else {
            drop(idle);
            connection.close();
        }
    }

    pub fn idle_count(&self) -> usize {
        self.inner.idle.lock().unwrap().len()
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.reaper.take() {
            let _ = handle.join();
        }
    }
}

fn reap_loop(inner: Arc<PoolInner>, shutdown: Arc<AtomicBool>, interval: Duration) {
    while !shutdown.load(Ordering::Relaxed) {
        thread::sleep(interval);
        if shutdown.load(Ordering::Relaxed) {
            return;
        }
        let mut idle = inner.idle.lock().unwrap();
        let max_age = inner.config.max_age;
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
            tracing::info!(reaped, "reaper closed aged-out idle connections");
        }
    }
}

/// An RAII borrow from a [`Pool`]. Returning (pooling, or closing if the
/// driver isn't fully thread-safe) happens on drop.
pub struct PooledConnection<'p> {
    pool: &'p Pool,
    connection: Option<Connection>,
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;
    fn deref(&self) -> &Connection {
        self.connection.as_ref().expect("connection taken before drop")
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.connection.take() {
            self.pool.checkin(conn);
        }
    }
}
