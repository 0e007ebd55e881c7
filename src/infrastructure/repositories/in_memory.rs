use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::{sync::RwLock, time::Instant};
use uuid::Uuid;

use crate::domain::{errors::DomainError, models::TaskStatus, repositories::TaskStatusStore};

struct StatusEntry {
    status: TaskStatus,
    updated_at: Instant,
}

/// Status store for a single process. Entries older than the retention
/// window are dropped on the next write.
pub struct InMemoryTaskStatusStore {
    entries: Arc<RwLock<HashMap<Uuid, StatusEntry>>>,
    retention: Duration,
}

impl Default for InMemoryTaskStatusStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600))
    }
}

impl InMemoryTaskStatusStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            retention,
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl TaskStatusStore for InMemoryTaskStatusStore {
    async fn get(&self, task_id: Uuid) -> Result<Option<TaskStatus>, DomainError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&task_id)
            .filter(|entry| entry.updated_at.elapsed() < self.retention)
            .map(|entry| entry.status.clone()))
    }

    async fn set(&self, task_id: Uuid, status: TaskStatus) -> Result<(), DomainError> {
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.updated_at.elapsed() < self.retention);

        if let Some(existing) = entries.get(&task_id) {
            if existing.status.is_terminal() {
                return Err(DomainError::AlreadyTerminal(task_id));
            }
        }

        entries.insert(
            task_id,
            StatusEntry {
                status,
                updated_at: Instant::now(),
            },
        );
        Ok(())
    }
}
