use async_trait::async_trait;

use crate::domain::models::EmailTask;

/// Producer side of the durable task channel.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn enqueue(&self, task: &EmailTask) -> anyhow::Result<()>;
}

/// Worker side of the task channel. Each consumer holds at most one
/// unacknowledged delivery at a time.
#[async_trait]
pub trait TaskConsumer: Send {
    /// Waits until a task is visible to this consumer.
    async fn dequeue(&mut self) -> anyhow::Result<Box<dyn Delivery>>;
}

/// A task handed to exactly one worker until it is acknowledged. Dropping a
/// delivery without acknowledging it makes the task eligible for redelivery.
#[async_trait]
pub trait Delivery: Send {
    fn task(&self) -> &EmailTask;

    /// 1 for the first delivery, higher once the queue has redelivered it.
    fn delivery_count(&self) -> u64;

    async fn ack(self: Box<Self>) -> anyhow::Result<()>;
}
