//! The connection pool and transaction model (spec §5): a thread-safe
//! borrow/return interface over connections that carry a low-level driver
//! handle, a separate lock for the transaction counter, a stack of open
//! cursors per level, and a creation timestamp.

mod connection;
mod driver;
mod pool;
mod transaction;

#[cfg(feature = "async")]
mod async_pool;

pub use connection::{Connection, CursorId};
pub use driver::{DriverHandle, ThreadSafetyLevel};
pub use pool::{Pool, PoolConfig, PoolError, PooledConnection};
pub use transaction::{with_transaction, Transaction, TransactionError};

#[cfg(feature = "async")]
pub use async_pool::{reap_interval, AsyncPool, AsyncPooledConnection};

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct FakeDriver {
        level: ThreadSafetyLevel,
        closed: bool,
    }

    impl DriverHandle for FakeDriver {
        fn thread_safety_level(&self) -> ThreadSafetyLevel {
            self.level
        }
        fn execute(&mut self, _statement: &str) -> Result<(), String> {
            Ok(())
        }
        fn close(&mut self) {
            self.closed = true;
        }
    }

    fn fully_safe_connection() -> Connection {
        Connection::new(Box::new(FakeDriver { level: ThreadSafetyLevel::FULL, closed: false }))
    }

    #[test]
    fn checkout_rejects_unsafe_drivers() {
        let pool = Pool::new(PoolConfig { max_size: 4, max_age: Duration::from_secs(60) });
        let result = pool.checkout(|| Ok(Connection::new(Box::new(FakeDriver { level: ThreadSafetyLevel::NONE, closed: false }))));
        assert!(matches!(result, Err(PoolError::UnsafeDriver(_))));
    }

    #[test]
    fn returned_connection_is_pooled_when_fully_safe() {
        let pool = Pool::new(PoolConfig { max_size: 4, max_age: Duration::from_secs(60) });
        {
            let _conn = pool.checkout(|| Ok(fully_safe_connection())).unwrap();
        }
        assert_eq!(pool.idle_count(), 1);
    }

    #[test]
    fn below_full_safety_is_closed_instead_of_pooled() {
        let pool = Pool::new(PoolConfig { max_size: 4, max_age: Duration::from_secs(60) });
        {
            let _conn = pool
                .checkout(|| Ok(Connection::new(Box::new(FakeDriver { level: ThreadSafetyLevel::THREADS, closed: false }))))
                .unwrap();
        }
        assert_eq!(pool.idle_count(), 0);
    }

    #[test]
    fn nested_transactions_use_savepoints_and_commit_in_reverse_order() {
        let conn = fully_safe_connection();
        let outer = Transaction::begin(&conn).unwrap();
        assert_eq!(outer.level(), 1);
        let inner = Transaction::begin(&conn).unwrap();
        assert_eq!(inner.level(), 2);

        inner.rollback().unwrap();
        assert_eq!(conn.current_level(), 1);
        outer.commit().unwrap();
        assert_eq!(conn.current_level(), 0);
    }

    #[test]
    fn committing_below_current_level_closes_nested_levels_too() {
        let conn = fully_safe_connection();
        let outer = Transaction::begin(&conn).unwrap();
        let _inner = Transaction::begin(&conn).unwrap();
        assert_eq!(conn.current_level(), 2);

        outer.commit().unwrap();
        assert_eq!(conn.current_level(), 0);
    }

    #[test]
    fn with_transaction_rolls_back_on_error() {
        let conn = fully_safe_connection();
        let result: Result<(), TransactionError> = with_transaction(&conn, |_tx| Err(TransactionError::Driver("boom".into())));
        assert!(result.is_err());
        assert_eq!(conn.current_level(), 0);
    }

    #[test]
    fn with_transaction_commits_on_success() {
        let conn = fully_safe_connection();
        let result: Result<i32, TransactionError> = with_transaction(&conn, |_tx| Ok(42));
        assert_eq!(result.unwrap(), 42);
        assert_eq!(conn.current_level(), 0);
    }
}
