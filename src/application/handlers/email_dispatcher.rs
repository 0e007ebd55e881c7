use std::sync::Arc;
use std::time::Duration;

use tokio::{sync::watch, task::JoinHandle};
use tracing::{error, info, warn};

use crate::{
    application::services::{
        mailer::MailTransport,
        task_queue::{Delivery, TaskConsumer},
    },
    domain::{
        errors::DomainError,
        models::{EmailMessage, EmailTask, MessageTemplate, TaskStatus},
        repositories::TaskStatusStore,
    },
};

#[derive(Clone)]
pub struct EmailDispatchConfig {
    pub template: MessageTemplate,
    pub send_timeout: Duration,
}

/// Performs one send attempt per delivery and reports its outcome.
pub struct EmailDispatchHandler {
    transport: Arc<dyn MailTransport>,
    status_store: Arc<dyn TaskStatusStore>,
    config: EmailDispatchConfig,
}

impl EmailDispatchHandler {
    pub fn new(
        transport: Arc<dyn MailTransport>,
        status_store: Arc<dyn TaskStatusStore>,
        config: EmailDispatchConfig,
    ) -> Self {
        Self {
            transport,
            status_store,
            config,
        }
    }

    /// Sends, records the status, then acknowledges. A delivery whose task is
    /// already terminal is acknowledged without sending again.
    pub async fn handle(&self, delivery: Box<dyn Delivery>) -> anyhow::Result<TaskStatus> {
        let task = delivery.task().clone();

        if delivery.delivery_count() > 1 {
            warn!(
                task_id = %task.id,
                delivery_count = delivery.delivery_count(),
                "task redelivered"
            );
        }

        match self.status_store.get(task.id).await {
            Ok(Some(status)) if status.is_terminal() => {
                info!(task_id = %task.id, "task already reported, skipping send");
                delivery.ack().await?;
                return Ok(status);
            }
            Ok(_) => {}
            // Sending is still correct without the dedup check.
            Err(err) => warn!(task_id = %task.id, error = %err, "status lookup failed"),
        }

        let status = self.send(&task).await;

        match self.status_store.set(task.id, status.clone()).await {
            Ok(()) => {}
            Err(DomainError::AlreadyTerminal(_)) => {
                warn!(task_id = %task.id, "terminal status already recorded, keeping it");
            }
            Err(err) => {
                error!(task_id = %task.id, error = %err, "failed to record task status");
            }
        }

        delivery.ack().await?;

        Ok(status)
    }

    async fn send(&self, task: &EmailTask) -> TaskStatus {
        let message = EmailMessage::for_task(task, &self.config.template);

        let result = match tokio::time::timeout(
            self.config.send_timeout,
            self.transport.send(&message),
        )
        .await
        {
            Ok(result) => result.map_err(|err| DomainError::Transport(format!("{err:#}"))),
            Err(_) => Err(DomainError::Transport(format!(
                "send timed out after {:?}",
                self.config.send_timeout
            ))),
        };

        match result {
            Ok(()) => {
                info!(
                    target: "audit",
                    task_id = %task.id,
                    recipient = %task.recipient,
                    transport = self.transport.name(),
                    outcome = "sent",
                    "email sent"
                );
                TaskStatus::Succeeded
            }
            Err(err) => {
                let reason = err.to_string();
                error!(
                    target: "audit",
                    task_id = %task.id,
                    recipient = %task.recipient,
                    transport = self.transport.name(),
                    outcome = "failed",
                    reason = %reason,
                    "email send failed"
                );
                TaskStatus::Failed { reason }
            }
        }
    }
}

/// Pulls deliveries one at a time and hands them to the dispatch handler.
pub struct EmailWorker {
    name: String,
    consumer: Box<dyn TaskConsumer>,
    handler: Arc<EmailDispatchHandler>,
}

impl EmailWorker {
    pub fn new(
        name: impl Into<String>,
        consumer: Box<dyn TaskConsumer>,
        handler: Arc<EmailDispatchHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            consumer,
            handler,
        }
    }

    /// Runs until `shutdown` flips to true. A delivery already being handled
    /// is finished before the worker stops.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let name = self.name.clone();
            info!(worker = %name, "email worker started");
            if let Err(err) = self.run(&mut shutdown).await {
                error!(worker = %name, error = %err, "email worker stopped");
                return;
            }
            info!(worker = %name, "email worker stopped");
        })
    }

    async fn run(mut self, shutdown: &mut watch::Receiver<bool>) -> anyhow::Result<()> {
        loop {
            if *shutdown.borrow() {
                return Ok(());
            }

            let delivery = tokio::select! {
                _ = shutdown.changed() => return Ok(()),
                delivery = self.consumer.dequeue() => delivery,
            };

            match delivery {
                Ok(delivery) => {
                    let task_id = delivery.task().id;
                    if let Err(err) = self.handler.handle(delivery).await {
                        error!(worker = %self.name, task_id = %task_id, error = %err, "failed to process task");
                    }
                }
                Err(err) => {
                    error!(worker = %self.name, error = %err, "dequeue failed");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }
}
