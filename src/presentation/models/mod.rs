use poem_openapi::Enum;

use crate::domain::{events::StatusEventKind, models::TaskStatus};

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum TaskStateKind {
    #[oai(rename = "pending")]
    Pending,
    #[oai(rename = "succeeded")]
    Succeeded,
    #[oai(rename = "failed")]
    Failed,
}

impl From<&TaskStatus> for TaskStateKind {
    fn from(value: &TaskStatus) -> Self {
        match value {
            TaskStatus::Pending => TaskStateKind::Pending,
            TaskStatus::Succeeded => TaskStateKind::Succeeded,
            TaskStatus::Failed { .. } => TaskStateKind::Failed,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum StreamStatusKind {
    #[oai(rename = "PENDING")]
    Pending,
    #[oai(rename = "COMPLETED")]
    Completed,
    #[oai(rename = "FAILED")]
    Failed,
    #[oai(rename = "TIMEOUT")]
    Timeout,
}

impl From<StatusEventKind> for StreamStatusKind {
    fn from(value: StatusEventKind) -> Self {
        match value {
            StatusEventKind::Pending => StreamStatusKind::Pending,
            StatusEventKind::Completed => StreamStatusKind::Completed,
            StatusEventKind::Failed => StreamStatusKind::Failed,
            StatusEventKind::Timeout => StreamStatusKind::Timeout,
        }
    }
}
