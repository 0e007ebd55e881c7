use uuid::Uuid;

use crate::{
    domain::{events::StatusEvent, models::TaskStatus},
    presentation::http::responses::{StatusEventDto, TaskStatusDto},
};

pub fn map_status(task_id: Uuid, status: &TaskStatus) -> TaskStatusDto {
    TaskStatusDto {
        task_id,
        state: status.into(),
        reason: match status {
            TaskStatus::Failed { reason } => Some(reason.clone()),
            _ => None,
        },
    }
}

pub fn map_event(event: StatusEvent) -> StatusEventDto {
    StatusEventDto {
        status: event.status.into(),
        message: event.message,
    }
}
