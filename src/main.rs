use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_nats::jetstream;
use poem::{Server, listener::TcpListener};
use tokio::{main, sync::watch};
use tracing::{info, warn};

use mailstream::{
    application::{
        handlers::{
            email_dispatcher::{EmailDispatchConfig, EmailDispatchHandler, EmailWorker},
            status_stream::{StatusStreamConfig, StatusStreamEmitter},
        },
        services::task_queue::{TaskConsumer, TaskQueue},
        usecases::{
            enqueue_email::{EnqueueEmailConfig, EnqueueEmailUseCase},
            get_task_status::GetTaskStatusUseCase,
        },
    },
    config::Config,
    domain::repositories::TaskStatusStore,
    infrastructure::{
        mail::smtp::SmtpMailTransport,
        messaging::{in_memory::InMemoryTaskQueue, jetstream::JetstreamTaskQueue},
        repositories::{in_memory::InMemoryTaskStatusStore, jetstream_kv::JetstreamStatusStore},
    },
    presentation::http::{endpoints::root::ApiState, routes},
    telemetry,
};

struct Backend {
    queue: Arc<dyn TaskQueue>,
    status_store: Arc<dyn TaskStatusStore>,
    consumers: Vec<Box<dyn TaskConsumer>>,
}

async fn connect_backend(config: &Config, workers: usize) -> anyhow::Result<Backend> {
    match &config.jetstream {
        Some(jetstream_config) => {
            let client = async_nats::connect(&jetstream_config.url)
                .await
                .with_context(|| format!("failed to connect to {}", jetstream_config.url))?;
            let context = jetstream::new(client);

            let queue = JetstreamTaskQueue::new(context.clone(), jetstream_config).await?;
            let status_store =
                JetstreamStatusStore::new(&context, &config.status_bucket, config.status_retention)
                    .await?;
            let consumers = (0..workers)
                .map(|_| Box::new(queue.consumer()) as Box<dyn TaskConsumer>)
                .collect();

            Ok(Backend {
                queue: Arc::new(queue),
                status_store: Arc::new(status_store),
                consumers,
            })
        }
        None => {
            let queue = InMemoryTaskQueue::new();
            let consumers = (0..workers)
                .map(|_| Box::new(queue.consumer()) as Box<dyn TaskConsumer>)
                .collect();

            Ok(Backend {
                queue: Arc::new(queue),
                status_store: Arc::new(InMemoryTaskStatusStore::new(config.status_retention)),
                consumers,
            })
        }
    }
}

#[main]
async fn main() -> anyhow::Result<()> {
    let config = Config::try_parse()?;
    telemetry::init_tracing(config.production, config.audit_log_path.as_deref())?;

    let workers = if config.run_mode.runs_workers() {
        config.worker_concurrency
    } else {
        0
    };
    if config.jetstream.is_none() && workers == 0 {
        warn!("no workers and no shared queue: queued emails will never be sent");
    }

    let backend = connect_backend(&config, workers).await?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut worker_handles = Vec::new();
    if !backend.consumers.is_empty() {
        let transport = Arc::new(SmtpMailTransport::new(&config.smtp)?);
        let handler = Arc::new(EmailDispatchHandler::new(
            transport,
            backend.status_store.clone(),
            EmailDispatchConfig {
                template: config.template.clone(),
                send_timeout: config.smtp.timeout,
            },
        ));
        for (index, consumer) in backend.consumers.into_iter().enumerate() {
            let worker = EmailWorker::new(format!("email-worker-{index}"), consumer, handler.clone());
            worker_handles.push(worker.spawn(shutdown_rx.clone()));
        }
    }

    if config.run_mode.serves_api() {
        let state = Arc::new(ApiState {
            enqueue_email_usecase: Arc::new(EnqueueEmailUseCase::new(
                backend.queue.clone(),
                backend.status_store.clone(),
                EnqueueEmailConfig {
                    timeout: config.enqueue_timeout,
                },
            )),
            get_task_status_usecase: Arc::new(GetTaskStatusUseCase::new(
                backend.status_store.clone(),
            )),
            status_stream: StatusStreamEmitter::new(
                backend.status_store.clone(),
                StatusStreamConfig {
                    poll_interval: config.poll_interval,
                    max_wait: config.max_stream_wait,
                },
            ),
        });

        let server_url = config.server_url();
        info!(%server_url, "starting server");

        Server::new(TcpListener::bind(format!("{}:{}", config.host, config.port)))
            .run_with_graceful_shutdown(
                routes(state, &server_url),
                async {
                    let _ = tokio::signal::ctrl_c().await;
                },
                Some(Duration::from_secs(5)),
            )
            .await?;
    } else {
        info!(workers = worker_handles.len(), "running workers only");
        tokio::signal::ctrl_c().await?;
    }

    info!("shutting down");
    let _ = shutdown_tx.send(true);
    for handle in worker_handles {
        let _ = handle.await;
    }

    Ok(())
}
