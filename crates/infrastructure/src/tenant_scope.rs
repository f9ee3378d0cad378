use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pagecraft_application::{IsolationScope, ScopeGuard};
use pagecraft_core::{AppError, AppResult};
use pagecraft_domain::TenantContext;

/// Ledger of scope lifecycle events.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScopeLedger {
    /// Contexts currently holding a scope.
    pub active: Vec<TenantContext>,
    /// Guards released in an orderly fashion.
    pub released: usize,
    /// Guards dropped without release.
    pub discarded: usize,
}

/// [`IsolationScope`] that records which tenant contexts are in flight.
///
/// Data scoping itself happens through the explicit `org_id` bound into
/// every repository query; the registry enforces the enter/release
/// lifecycle around each request and never borrows a database resource,
/// so any number of scopes can be active concurrently.
#[derive(Debug, Default, Clone)]
pub struct TenantScopeRegistry {
    ledger: Arc<Mutex<ScopeLedger>>,
}

impl TenantScopeRegistry {
    /// Creates a registry with an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the ledger.
    pub fn ledger(&self) -> AppResult<ScopeLedger> {
        self.ledger
            .lock()
            .map(|ledger| ledger.clone())
            .map_err(|_| AppError::Internal("scope ledger lock poisoned".to_owned()))
    }
}

#[async_trait]
impl IsolationScope for TenantScopeRegistry {
    async fn enter(&self, context: TenantContext) -> AppResult<Box<dyn ScopeGuard>> {
        {
            let mut ledger = self
                .ledger
                .lock()
                .map_err(|_| AppError::Internal("scope ledger lock poisoned".to_owned()))?;
            ledger.active.push(context);
        }

        Ok(Box::new(TenantScopeGuard {
            ledger: self.ledger.clone(),
            context: Some(context),
        }))
    }
}

struct TenantScopeGuard {
    ledger: Arc<Mutex<ScopeLedger>>,
    context: Option<TenantContext>,
}

impl TenantScopeGuard {
    fn clear(&mut self, orderly: bool) {
        let Some(context) = self.context.take() else {
            return;
        };

        if let Ok(mut ledger) = self.ledger.lock() {
            ledger.active.retain(|active| *active != context);
            if orderly {
                ledger.released += 1;
            } else {
                ledger.discarded += 1;
            }
        }
    }
}

#[async_trait]
impl ScopeGuard for TenantScopeGuard {
    async fn release(mut self: Box<Self>) -> AppResult<()> {
        self.clear(true);
        Ok(())
    }
}

impl Drop for TenantScopeGuard {
    fn drop(&mut self) {
        if self.context.is_some() {
            tracing::warn!("tenant scope guard dropped without release");
            self.clear(false);
        }
    }
}
