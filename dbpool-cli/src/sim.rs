//! Simulated database connections with a shared close ledger.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dbpool_cache::{CloseError, ResourceHandle};

/// Counts opens and closes across every simulated connection.
#[derive(Debug, Default)]
pub struct Ledger {
    opened: AtomicU64,
    closed: AtomicU64,
    double_closed: AtomicU64,
    failed: AtomicU64,
}

impl Ledger {
    /// Opens a new connection that reports into this ledger.
    pub fn open(self: &Arc<Self>, dsn: &str, close_failure_rate: f64) -> SimulatedConnection {
        let id = self.opened.fetch_add(1, Ordering::SeqCst) + 1;
        SimulatedConnection {
            id,
            dsn: dsn.to_string(),
            close_failure_rate,
            closed: AtomicBool::new(false),
            ledger: Arc::clone(self),
        }
    }

    pub fn opened(&self) -> u64 {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> u64 {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn double_closed(&self) -> u64 {
        self.double_closed.load(Ordering::SeqCst)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::SeqCst)
    }

    /// Connections opened but never closed.
    pub fn leaked(&self) -> u64 {
        self.opened().saturating_sub(self.closed())
    }
}

/// Stand-in for a database connection.
#[derive(Debug)]
pub struct SimulatedConnection {
    id: u64,
    dsn: String,
    close_failure_rate: f64,
    closed: AtomicBool,
    ledger: Arc<Ledger>,
}

impl SimulatedConnection {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl ResourceHandle for SimulatedConnection {
    fn close(&self) -> Result<(), CloseError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            self.ledger.double_closed.fetch_add(1, Ordering::SeqCst);
            return Err(CloseError::new(format!("connection #{} already closed", self.id)));
        }
        self.ledger.closed.fetch_add(1, Ordering::SeqCst);

        if self.close_failure_rate > 0.0 && rand::random::<f64>() < self.close_failure_rate {
            self.ledger.failed.fetch_add(1, Ordering::SeqCst);
            return Err(CloseError::new(format!(
                "connection #{} to {}: server did not acknowledge terminate",
                self.id, self.dsn
            )));
        }
        Ok(())
    }
}
