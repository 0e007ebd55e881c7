use chrono::Local;
use poem_openapi::{OpenApi, payload::PlainText};
use tracing::info;

use crate::presentation::http::endpoints::root::EndpointsTags;

pub struct HealthEndpoints;

#[OpenApi]
impl HealthEndpoints {
    #[oai(path = "/health", method = "get", tag = EndpointsTags::Health)]
    pub async fn health(&self) -> PlainText<&'static str> {
        PlainText("OK")
    }

    /// Writes a timestamped line to the log and echoes the time back.
    #[oai(path = "/talktome", method = "get", tag = EndpointsTags::Health)]
    pub async fn talk_to_me(&self) -> PlainText<String> {
        let now = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        info!(at = %now, "talktome request received");
        PlainText(format!("Logged current time: {now}"))
    }
}
