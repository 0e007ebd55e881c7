use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    application::services::task_queue::TaskQueue,
    domain::{
        errors::DomainError,
        models::{EmailTask, TaskStatus},
        repositories::TaskStatusStore,
        value_objects::Recipient,
    },
};

#[derive(Clone)]
pub struct EnqueueEmailConfig {
    pub timeout: Duration,
}

impl Default for EnqueueEmailConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }
}

pub struct EnqueueEmailUseCase {
    queue: Arc<dyn TaskQueue>,
    status_store: Arc<dyn TaskStatusStore>,
    config: EnqueueEmailConfig,
}

pub struct EnqueueEmailRequest {
    pub recipient: String,
}

#[derive(Debug)]
pub struct EnqueueEmailResponse {
    pub task_id: Uuid,
}

impl EnqueueEmailUseCase {
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        status_store: Arc<dyn TaskStatusStore>,
        config: EnqueueEmailConfig,
    ) -> Self {
        Self {
            queue,
            status_store,
            config,
        }
    }

    pub async fn execute(
        &self,
        request: EnqueueEmailRequest,
    ) -> Result<EnqueueEmailResponse, DomainError> {
        let recipient = Recipient::parse(&request.recipient)?;
        let task = EmailTask::new(recipient);

        // Pending must be readable before any worker can report a result.
        self.status_store.set(task.id, TaskStatus::Pending).await?;

        let outcome = tokio::time::timeout(self.config.timeout, self.queue.enqueue(&task)).await;
        let reason = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(err)) => {
                warn!(task_id = %task.id, error = %err, "failed to enqueue email task");
                Some(err.to_string())
            }
            Err(_) => {
                warn!(task_id = %task.id, timeout = ?self.config.timeout, "enqueue timed out");
                Some(format!("enqueue timed out after {:?}", self.config.timeout))
            }
        };

        if let Some(reason) = reason {
            self.abandon(task.id, &reason).await;
            return Err(DomainError::QueueUnavailable(reason));
        }

        info!(task_id = %task.id, recipient = %task.recipient, "email task enqueued");

        Ok(EnqueueEmailResponse { task_id: task.id })
    }

    /// Closes out the Pending entry of a task that never reached the queue.
    /// A late publish then finds it terminal and is skipped by the worker.
    async fn abandon(&self, task_id: Uuid, reason: &str) {
        let status = TaskStatus::Failed {
            reason: format!("not queued: {reason}"),
        };
        if let Err(err) = self.status_store.set(task_id, status).await {
            warn!(task_id = %task_id, error = %err, "failed to mark unqueued task as failed");
        }
    }
}
