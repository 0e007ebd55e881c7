use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::Recipient;

/// One deferred email send. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailTask {
    pub id: Uuid,
    pub recipient: Recipient,
    pub enqueued_at: DateTime<Utc>,
}

impl EmailTask {
    pub fn new(recipient: Recipient) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient,
            enqueued_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Succeeded,
    Failed { reason: String },
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Pending)
    }
}
