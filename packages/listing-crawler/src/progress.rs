//! Crawl position over the (role × location) plan.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::StoreResult;
use crate::plan::QueryPlan;
use crate::traits::ProgressStore;
use crate::types::{Checkpoint, CheckpointStatus, StoredCheckpoint};

/// Appends checkpoints and works out where a run should start.
#[derive(Clone)]
pub struct ProgressTracker {
    store: Arc<dyn ProgressStore>,
}

impl ProgressTracker {
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self { store }
    }

    pub async fn record(
        &self,
        location: &str,
        role: &str,
        collected_count: usize,
        status: CheckpointStatus,
    ) -> StoreResult<StoredCheckpoint> {
        let stored = self
            .store
            .append(&Checkpoint::new(location, role, collected_count, status))
            .await?;
        debug!(
            seq = stored.seq,
            location,
            role,
            collected_count,
            status = %status,
            "Checkpoint recorded"
        );
        Ok(stored)
    }

    pub async fn last_in_progress(&self) -> StoreResult<Option<StoredCheckpoint>> {
        self.store.last_in_progress().await
    }

    /// Index of the role a run should start with.
    ///
    /// The role of the last `in_progress` row is re-run unless every plan
    /// location settled it afterwards, in which case the next role starts
    /// (wrapping to the first once the plan is exhausted).
    pub async fn resume_index(&self, plan: &QueryPlan) -> StoreResult<usize> {
        let Some(last) = self.store.last_in_progress().await? else {
            info!("No previous progress, starting from the first role");
            return Ok(0);
        };

        let Some(index) = plan.role_index(&last.role) else {
            warn!(role = %last.role, "Last role is not in the plan, starting from the first role");
            return Ok(0);
        };

        let settled: HashSet<String> = self
            .store
            .since(last.seq)
            .await?
            .into_iter()
            .filter(|row| row.role == last.role && row.status.is_settled())
            .map(|row| row.location)
            .collect();

        let finished = plan
            .locations()
            .iter()
            .all(|location| settled.contains(&location.city));

        if finished {
            let next = (index + 1) % plan.len();
            info!(
                finished_role = %last.role,
                next_role = %plan.roles()[next].role.title,
                "Resuming after finished role"
            );
            Ok(next)
        } else {
            info!(role = %last.role, "Resuming interrupted role");
            Ok(index)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::config::CrawlerConfig;
    use crate::storage::MemoryStore;
    use crate::types::Role;

    fn plan() -> QueryPlan {
        let roles = vec![
            Role::new("Chef", 1.0),
            Role::new("Barista", 1.0),
            Role::new("Welder", 1.0),
        ];
        QueryPlan::build(roles, catalog::default_locations(), &CrawlerConfig::new()).unwrap()
    }

    fn tracker() -> ProgressTracker {
        ProgressTracker::new(Arc::new(MemoryStore::new()))
    }

    async fn start_role(tracker: &ProgressTracker, role: &str) {
        for city in ["Sydney", "Melbourne", "Brisbane"] {
            tracker.record(city, role, 0, CheckpointStatus::InProgress).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_fresh_log_starts_at_zero() {
        assert_eq!(tracker().resume_index(&plan()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_interrupted_role_is_rerun() {
        let tracker = tracker();
        start_role(&tracker, "Barista").await;
        tracker.record("Sydney", "Barista", 5, CheckpointStatus::Completed).await.unwrap();
        tracker.record("Brisbane", "Barista", 2, CheckpointStatus::Error).await.unwrap();

        assert_eq!(tracker.resume_index(&plan()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_finished_role_advances() {
        let tracker = tracker();
        start_role(&tracker, "Chef").await;
        tracker.record("Sydney", "Chef", 5, CheckpointStatus::Completed).await.unwrap();
        tracker.record("Melbourne", "Chef", 0, CheckpointStatus::Error).await.unwrap();
        tracker.record("Brisbane", "Chef", 5, CheckpointStatus::Completed).await.unwrap();

        assert_eq!(tracker.resume_index(&plan()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_finished_plan_wraps_to_first_role() {
        let tracker = tracker();
        start_role(&tracker, "Welder").await;
        for city in ["Sydney", "Melbourne", "Brisbane"] {
            tracker.record(city, "Welder", 5, CheckpointStatus::Completed).await.unwrap();
        }

        assert_eq!(tracker.resume_index(&plan()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_role_starts_at_zero() {
        let tracker = tracker();
        start_role(&tracker, "Astronaut").await;

        assert_eq!(tracker.resume_index(&plan()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_settled_rows_before_restart_do_not_count() {
        let tracker = tracker();
        // an earlier pass over Barista finished...
        start_role(&tracker, "Barista").await;
        for city in ["Sydney", "Melbourne", "Brisbane"] {
            tracker.record(city, "Barista", 5, CheckpointStatus::Completed).await.unwrap();
        }
        // ...then a later pass was interrupted before anything settled
        start_role(&tracker, "Barista").await;

        assert_eq!(tracker.resume_index(&plan()).await.unwrap(), 1);
    }
}
