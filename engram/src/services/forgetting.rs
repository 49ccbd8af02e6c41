use std::sync::Arc;

use chrono::Utc;

use crate::error::Result;
use crate::store::FactStore;

pub const EXPIRY_FORGET_REASON: &str = "auto-forgotten: expired";

/// Periodic soft-delete of facts past their expiry. Driven on an interval by
/// the daemon; `run_once` is also callable directly for tests and manual
/// sweeps.
pub struct ForgettingSweeper {
    store: Arc<dyn FactStore>,
}

impl ForgettingSweeper {
    pub fn new(store: Arc<dyn FactStore>) -> Self {
        Self { store }
    }

    /// Forget every fact whose `expires_at` has passed. A failure on one fact
    /// is logged and does not stop the sweep. Returns the number forgotten.
    pub async fn run_once(&self) -> Result<usize> {
        let candidates = self.store.get_expiry_candidates(Utc::now()).await?;
        if candidates.is_empty() {
            return Ok(0);
        }

        let mut forgotten = 0;
        for fact in candidates {
            match self
                .store
                .forget_fact(&fact.id, Some(EXPIRY_FORGET_REASON))
                .await
            {
                Ok(()) => {
                    tracing::debug!(fact_id = %fact.id, "Expired fact forgotten");
                    forgotten += 1;
                }
                Err(e) => {
                    tracing::warn!(fact_id = %fact.id, error = %e, "Failed to forget expired fact");
                }
            }
        }

        tracing::info!(count = forgotten, "Forgetting sweep complete");
        Ok(forgotten)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MemoryFact;
    use crate::store::InMemoryBackend;
    use chrono::Duration;

    #[tokio::test]
    async fn test_sweeps_only_expired_facts() {
        let store = Arc::new(InMemoryBackend::new());

        let mut expired = MemoryFact::new("f1".into(), "u1".into(), "Standup at 2026-01-05".into());
        expired.expires_at = Some(Utc::now() - Duration::days(1));
        store.create_fact(&expired).await.unwrap();

        let mut upcoming = MemoryFact::new("f2".into(), "u1".into(), "Offsite at 2099-06-01".into());
        upcoming.expires_at = Some(Utc::now() + Duration::days(30));
        store.create_fact(&upcoming).await.unwrap();

        let permanent = MemoryFact::new("f3".into(), "u1".into(), "User lives in Lisbon".into());
        store.create_fact(&permanent).await.unwrap();

        let sweeper = ForgettingSweeper::new(store.clone());
        assert_eq!(sweeper.run_once().await.unwrap(), 1);

        let f1 = store.get_fact_by_id("f1").await.unwrap().unwrap();
        assert!(f1.is_forgotten);
        assert_eq!(f1.forget_reason.as_deref(), Some(EXPIRY_FORGET_REASON));

        assert!(!store.get_fact_by_id("f2").await.unwrap().unwrap().is_forgotten);
        assert!(!store.get_fact_by_id("f3").await.unwrap().unwrap().is_forgotten);
    }

    #[tokio::test]
    async fn test_sweep_is_idempotent() {
        let store = Arc::new(InMemoryBackend::new());
        let mut expired = MemoryFact::new("f1".into(), "u1".into(), "Old deadline".into());
        expired.expires_at = Some(Utc::now() - Duration::hours(1));
        store.create_fact(&expired).await.unwrap();

        let sweeper = ForgettingSweeper::new(store.clone());
        assert_eq!(sweeper.run_once().await.unwrap(), 1);
        // already forgotten: no longer an expiry candidate
        assert_eq!(sweeper.run_once().await.unwrap(), 0);
    }
}
