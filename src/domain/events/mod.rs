use serde::Serialize;

use crate::domain::models::TaskStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusEventKind {
    Pending,
    Completed,
    Failed,
    Timeout,
}

/// What a status stream tells its client on each tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEvent {
    pub status: StatusEventKind,
    pub message: String,
}

impl StatusEvent {
    pub fn pending() -> Self {
        Self {
            status: StatusEventKind::Pending,
            message: "in progress".to_string(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: StatusEventKind::Failed,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            status: StatusEventKind::Timeout,
            message: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status != StatusEventKind::Pending
    }
}

impl From<&TaskStatus> for StatusEvent {
    fn from(status: &TaskStatus) -> Self {
        match status {
            TaskStatus::Pending => StatusEvent::pending(),
            TaskStatus::Succeeded => StatusEvent {
                status: StatusEventKind::Completed,
                message: "sent".to_string(),
            },
            TaskStatus::Failed { reason } => StatusEvent::failed(reason.clone()),
        }
    }
}
