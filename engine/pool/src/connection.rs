//! A pooled connection (spec §5): a driver handle, a separate lock for the
//! transaction counter, a stack of open cursors per transaction level, and
//! a creation timestamp the reaper checks against `max_age`.

use std::sync::Mutex;
use std::time::Instant;

use crate::driver::DriverHandle;

/// An open cursor's identity within a transaction level. Opaque to the
/// pool; the vendor adapter assigns these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorId(pub u64);

struct TransactionState {
    level: u32,
    /// `cursors[i]` holds the cursors opened while `level == i + 1`.
    cursors: Vec<Vec<CursorId>>,
}

impl TransactionState {
    fn new() -> Self {
        TransactionState { level: 0, cursors: Vec::new() }
    }
}

pub struct Connection {
    driver: Mutex<Box<dyn DriverHandle>>,
    tx_state: Mutex<TransactionState>,
    created_at: Instant,
}

impl Connection {
    pub fn new(driver: Box<dyn DriverHandle>) -> Self {
        Connection {
            driver: Mutex::new(driver),
            tx_state: Mutex::new(TransactionState::new()),
            created_at: Instant::now(),
        }
    }

    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }

    pub fn thread_safety_level(&self) -> crate::driver::ThreadSafetyLevel {
        self.driver.lock().unwrap().thread_safety_level()
    }

    pub fn current_level(&self) -> u32 {
        self.tx_state.lock().unwrap().level
    }

    pub(crate) fn execute_statement(&self, statement: &str) -> Result<(), crate::TransactionError> {
        self.driver.lock().unwrap().execute(statement).map_err(crate::TransactionError::Driver)
    }

    pub fn close(&self) {
        self.driver.lock().unwrap().close();
    }

    /// Enter one level of transaction nesting, returning the new level.
    pub(crate) fn push_level(&self) -> u32 {
        let mut state = self.tx_state.lock().unwrap();
        state.level += 1;
        state.cursors.push(Vec::new());
        state.level
    }

    pub(crate) fn open_cursor(&self, cursor: CursorId) {
        let mut state = self.tx_state.lock().unwrap();
        if let Some(top) = state.cursors.last_mut() {
            top.push(cursor);
        }
    }

    /// Pop every cursor opened at or above `level`, then drop that many
    /// nesting frames. Returns the cursors that were closed, in the order
    /// they should be released (innermost first).
    pub(crate) fn pop_at_or_above(&self, level: u32) -> Result<Vec<CursorId>, crate::TransactionError> {
        let mut state = self.tx_state.lock().unwrap();
        if level == 0 || level > state.level {
            return Err(crate::TransactionError::LevelMismatch { requested: level, actual: state.level });
        }
        let mut closed = Vec::new();
        while state.level >= level {
            if let Some(frame) = state.cursors.pop() {
                closed.extend(frame.into_iter().rev());
            }
            state.level -= 1;
        }
        Ok(closed)
    }
}
