use poem_openapi::Object;
use uuid::Uuid;

use crate::presentation::models::{StreamStatusKind, TaskStateKind};

#[derive(Object)]
pub struct EnqueueEmailResponseDto {
    pub task_id: Uuid,
}

#[derive(Object)]
pub struct TaskStatusDto {
    pub task_id: Uuid,
    pub state: TaskStateKind,
    pub reason: Option<String>,
}

/// One server-sent event on a status stream.
#[derive(Object, Debug, Clone, PartialEq, Eq)]
pub struct StatusEventDto {
    pub status: StreamStatusKind,
    pub message: String,
}
