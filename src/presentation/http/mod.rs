pub mod endpoints;
pub mod mappers;
pub mod requests;
pub mod responses;

use std::sync::Arc;

use poem::{Endpoint, EndpointExt, Route, middleware::Tracing};
use poem_openapi::OpenApiService;

use crate::presentation::http::endpoints::{
    emails::EmailsEndpoints, health::HealthEndpoints, root::ApiState,
};

/// The API under `/api` and the Swagger UI at `/`.
pub fn routes(state: Arc<ApiState>, server_url: &str) -> impl Endpoint + use<> {
    let api_service = OpenApiService::new(
        (HealthEndpoints, EmailsEndpoints::new(state)),
        "Mailstream API",
        env!("CARGO_PKG_VERSION"),
    )
    .server(format!("{server_url}/api"));
    let ui = api_service.swagger_ui();

    Route::new()
        .nest("/api", api_service)
        .nest("/", ui)
        .with(Tracing)
}
