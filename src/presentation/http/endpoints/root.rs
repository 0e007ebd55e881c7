use std::sync::Arc;

use poem_openapi::Tags;

use crate::application::{
    handlers::status_stream::StatusStreamEmitter,
    usecases::{enqueue_email::EnqueueEmailUseCase, get_task_status::GetTaskStatusUseCase},
};

#[derive(Clone)]
pub struct ApiState {
    pub enqueue_email_usecase: Arc<EnqueueEmailUseCase>,
    pub get_task_status_usecase: Arc<GetTaskStatusUseCase>,
    pub status_stream: StatusStreamEmitter,
}

/// Enum of API sections (tags)
#[derive(Tags)]
pub enum EndpointsTags {
    Health,
    Emails,
}
