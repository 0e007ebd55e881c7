use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{errors::DomainError, models::TaskStatus, repositories::TaskStatusStore};

pub struct GetTaskStatusUseCase {
    status_store: Arc<dyn TaskStatusStore>,
}

impl GetTaskStatusUseCase {
    pub fn new(status_store: Arc<dyn TaskStatusStore>) -> Self {
        Self { status_store }
    }

    pub async fn execute(&self, task_id: Uuid) -> Result<TaskStatus, DomainError> {
        self.status_store
            .get(task_id)
            .await?
            .ok_or(DomainError::NotFound(task_id))
    }
}
