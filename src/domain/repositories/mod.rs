use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{errors::DomainError, models::TaskStatus};

/// Point lookups of task status keyed by task id.
///
/// A task starts as `Pending` and moves to a terminal status exactly once.
/// Implementations reject any write to a task that is already terminal with
/// [`DomainError::AlreadyTerminal`]; an unreachable backend surfaces as
/// [`DomainError::StoreUnavailable`].
#[async_trait]
pub trait TaskStatusStore: Send + Sync {
    async fn get(&self, task_id: Uuid) -> Result<Option<TaskStatus>, DomainError>;

    async fn set(&self, task_id: Uuid, status: TaskStatus) -> Result<(), DomainError>;
}
