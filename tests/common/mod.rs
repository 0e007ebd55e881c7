#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::{sync::Mutex, sync::watch, task::JoinHandle};

use mailstream::{
    application::{
        handlers::{
            email_dispatcher::{EmailDispatchConfig, EmailDispatchHandler, EmailWorker},
            status_stream::{StatusStreamConfig, StatusStreamEmitter},
        },
        services::mailer::MailTransport,
        usecases::{
            enqueue_email::{EnqueueEmailConfig, EnqueueEmailUseCase},
            get_task_status::GetTaskStatusUseCase,
        },
    },
    domain::models::{EmailMessage, MessageTemplate},
    infrastructure::{
        messaging::in_memory::InMemoryTaskQueue,
        repositories::in_memory::InMemoryTaskStatusStore,
    },
    presentation::http::endpoints::root::ApiState,
};

/// Records every message it is asked to send; fails with a fixed reason when
/// configured to.
pub struct RecordingTransport {
    sent: Mutex<Vec<EmailMessage>>,
    fail_with: Option<String>,
    delay: Duration,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with: None,
            delay: Duration::ZERO,
        }
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            fail_with: Some(reason.into()),
            ..Self::new()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new()
        }
    }

    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_to(&self, recipient: &str) -> usize {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.to.as_str() == recipient)
            .count()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.sent.lock().await.push(message.clone());
        match &self.fail_with {
            Some(reason) => anyhow::bail!("{reason}"),
            None => Ok(()),
        }
    }
}

pub struct Harness {
    pub queue: InMemoryTaskQueue,
    pub store: Arc<InMemoryTaskStatusStore>,
    pub transport: Arc<RecordingTransport>,
    pub handler: Arc<EmailDispatchHandler>,
    pub state: Arc<ApiState>,
    shutdown: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
}

impl Harness {
    pub fn new(transport: RecordingTransport) -> Self {
        let queue = InMemoryTaskQueue::new();
        let store = Arc::new(InMemoryTaskStatusStore::default());
        let transport = Arc::new(transport);

        let handler = Arc::new(EmailDispatchHandler::new(
            transport.clone(),
            store.clone(),
            EmailDispatchConfig {
                template: MessageTemplate {
                    from: "sender@example.com".to_string(),
                    ..MessageTemplate::default()
                },
                send_timeout: Duration::from_secs(5),
            },
        ));

        let state = Arc::new(ApiState {
            enqueue_email_usecase: Arc::new(EnqueueEmailUseCase::new(
                Arc::new(queue.clone()),
                store.clone(),
                EnqueueEmailConfig::default(),
            )),
            get_task_status_usecase: Arc::new(GetTaskStatusUseCase::new(store.clone())),
            status_stream: StatusStreamEmitter::new(
                store.clone(),
                StatusStreamConfig {
                    poll_interval: Duration::from_millis(10),
                    max_wait: Some(Duration::from_secs(10)),
                },
            ),
        });

        let (shutdown, _) = watch::channel(false);

        Self {
            queue,
            store,
            transport,
            handler,
            state,
            shutdown,
            workers: Vec::new(),
        }
    }

    pub fn start_workers(&mut self, count: usize) {
        for index in 0..count {
            let worker = EmailWorker::new(
                format!("test-worker-{index}"),
                Box::new(self.queue.consumer()),
                self.handler.clone(),
            );
            self.workers.push(worker.spawn(self.shutdown.subscribe()));
        }
    }

    pub async fn stop_workers(&mut self) {
        let _ = self.shutdown.send(true);
        for handle in self.workers.drain(..) {
            let _ = handle.await;
        }
    }
}
