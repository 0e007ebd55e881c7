use std::time::Duration;

use async_nats::jetstream::{
    self, AckKind,
    consumer::{AckPolicy, PullConsumer, pull},
};
use async_trait::async_trait;
use tokio_stream::StreamExt;
use tracing::{info, warn};

use crate::{
    application::services::task_queue::{Delivery, TaskConsumer, TaskQueue},
    domain::models::EmailTask,
};

#[derive(Clone, Debug)]
pub struct JetstreamConfig {
    pub url: String,
    pub stream: String,
    pub subject: String,
    pub durable: String,
    pub ack_wait_seconds: u64,
    pub max_deliver: i64,
    pub fetch_expiry: Duration,
}

/// Durable email task queue on a JetStream work stream.
///
/// Every worker pulls from one shared durable consumer with explicit acks, so
/// a delivery is owned by a single worker until it acks or `ack_wait` runs
/// out, after which the broker redelivers it.
pub struct JetstreamTaskQueue {
    context: jetstream::Context,
    consumer: PullConsumer,
    subject: String,
    fetch_expiry: Duration,
}

impl JetstreamTaskQueue {
    pub async fn new(context: jetstream::Context, config: &JetstreamConfig) -> anyhow::Result<Self> {
        let stream = context
            .get_or_create_stream(jetstream::stream::Config {
                name: config.stream.clone(),
                subjects: vec![config.subject.clone()],
                retention: jetstream::stream::RetentionPolicy::WorkQueue,
                ..Default::default()
            })
            .await?;

        let consumer = stream
            .get_or_create_consumer(
                &config.durable,
                pull::Config {
                    durable_name: Some(config.durable.clone()),
                    ack_policy: AckPolicy::Explicit,
                    ack_wait: Duration::from_secs(config.ack_wait_seconds),
                    max_deliver: config.max_deliver,
                    ..Default::default()
                },
            )
            .await?;

        info!(stream = %config.stream, durable = %config.durable, "jetstream task queue ready");

        Ok(Self {
            context,
            consumer,
            subject: config.subject.clone(),
            fetch_expiry: config.fetch_expiry,
        })
    }

    pub fn consumer(&self) -> JetstreamTaskConsumer {
        JetstreamTaskConsumer {
            consumer: self.consumer.clone(),
            fetch_expiry: self.fetch_expiry,
        }
    }
}

#[async_trait]
impl TaskQueue for JetstreamTaskQueue {
    async fn enqueue(&self, task: &EmailTask) -> anyhow::Result<()> {
        let payload = serde_json::to_vec(task)?;
        // The second await waits for the stream to persist the message.
        self.context
            .publish(self.subject.clone(), payload.into())
            .await?
            .await?;
        Ok(())
    }
}

pub struct JetstreamTaskConsumer {
    consumer: PullConsumer,
    fetch_expiry: Duration,
}

#[async_trait]
impl TaskConsumer for JetstreamTaskConsumer {
    async fn dequeue(&mut self) -> anyhow::Result<Box<dyn Delivery>> {
        loop {
            let mut batch = self
                .consumer
                .batch()
                .max_messages(1)
                .expires(self.fetch_expiry)
                .messages()
                .await?;

            while let Some(message) = batch.next().await {
                let message =
                    message.map_err(|err| anyhow::anyhow!("jetstream batch error: {err}"))?;

                let task: EmailTask = match serde_json::from_slice(&message.payload) {
                    Ok(task) => task,
                    Err(err) => {
                        warn!(error = %err, "dropping undecodable email task");
                        if let Err(err) = message.ack_with(AckKind::Term).await {
                            warn!(error = %err, "failed to terminate undecodable message");
                        }
                        continue;
                    }
                };

                let delivery_count = message
                    .info()
                    .map(|info| info.delivered.max(1) as u64)
                    .unwrap_or(1);

                return Ok(Box::new(JetstreamDelivery {
                    message,
                    task,
                    delivery_count,
                }));
            }
        }
    }
}

struct JetstreamDelivery {
    message: jetstream::Message,
    task: EmailTask,
    delivery_count: u64,
}

#[async_trait]
impl Delivery for JetstreamDelivery {
    fn task(&self) -> &EmailTask {
        &self.task
    }

    fn delivery_count(&self) -> u64 {
        self.delivery_count
    }

    async fn ack(self: Box<Self>) -> anyhow::Result<()> {
        self.message
            .ack()
            .await
            .map_err(|err| anyhow::anyhow!("failed to ack message: {err}"))
    }
}
