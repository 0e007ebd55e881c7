use std::sync::Arc;

use futures::stream::{BoxStream, StreamExt};
use poem::{Result as PoemResult, http::StatusCode};
use poem_openapi::{
    OpenApi,
    param::{Path, Query},
    payload::{EventStream, Json},
};
use uuid::Uuid;

use crate::{
    application::usecases::enqueue_email::EnqueueEmailRequest,
    domain::errors::DomainError,
    presentation::http::{
        endpoints::root::{ApiState, EndpointsTags},
        mappers::{map_event, map_status},
        requests::EnqueueEmailRequestDto,
        responses::{EnqueueEmailResponseDto, StatusEventDto, TaskStatusDto},
    },
};

type StatusEvents = EventStream<BoxStream<'static, StatusEventDto>>;

#[derive(Clone)]
pub struct EmailsEndpoints {
    state: Arc<ApiState>,
}

impl EmailsEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }

    fn events(&self, task_id: Uuid) -> StatusEvents {
        EventStream::new(self.state.status_stream.watch(task_id).map(map_event).boxed())
    }

    async fn enqueue(&self, recipient: String) -> PoemResult<Uuid> {
        let response = self
            .state
            .enqueue_email_usecase
            .execute(EnqueueEmailRequest { recipient })
            .await
            .map_err(domain_error)?;
        Ok(response.task_id)
    }
}

#[OpenApi]
impl EmailsEndpoints {
    /// Queues a send and streams its status until it finishes.
    #[oai(path = "/sendmail", method = "get", tag = EndpointsTags::Emails)]
    pub async fn send_and_watch(&self, recipient: Query<String>) -> PoemResult<StatusEvents> {
        let task_id = self.enqueue(recipient.0).await?;
        Ok(self.events(task_id))
    }

    #[oai(path = "/emails", method = "post", tag = EndpointsTags::Emails)]
    pub async fn enqueue_email(
        &self,
        request: Json<EnqueueEmailRequestDto>,
    ) -> PoemResult<Json<EnqueueEmailResponseDto>> {
        let task_id = self.enqueue(request.0.recipient).await?;
        Ok(Json(EnqueueEmailResponseDto { task_id }))
    }

    #[oai(path = "/emails/:task_id", method = "get", tag = EndpointsTags::Emails)]
    pub async fn get_email_status(&self, task_id: Path<Uuid>) -> PoemResult<Json<TaskStatusDto>> {
        let status = self
            .state
            .get_task_status_usecase
            .execute(task_id.0)
            .await
            .map_err(domain_error)?;

        Ok(Json(map_status(task_id.0, &status)))
    }

    #[oai(path = "/emails/:task_id/events", method = "get", tag = EndpointsTags::Emails)]
    pub async fn watch_email(&self, task_id: Path<Uuid>) -> StatusEvents {
        self.events(task_id.0)
    }
}

fn domain_error(err: DomainError) -> poem::Error {
    let status = match &err {
        DomainError::InvalidRecipient(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::QueueUnavailable(_) | DomainError::StoreUnavailable(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    poem::Error::from_string(err.to_string(), status)
}
