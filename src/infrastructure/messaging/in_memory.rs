use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;
use tracing::debug;

use crate::{
    application::services::task_queue::{Delivery, TaskConsumer, TaskQueue},
    domain::models::EmailTask,
};

struct QueuedTask {
    task: EmailTask,
    delivery_count: u64,
}

#[derive(Default)]
struct Shared {
    ready: Mutex<VecDeque<QueuedTask>>,
    available: Notify,
}

impl Shared {
    fn ready(&self) -> MutexGuard<'_, VecDeque<QueuedTask>> {
        self.ready.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Process-local queue. A delivery dropped before `ack` goes back to the
/// front of the queue, which is how a crashed worker is modelled.
#[derive(Clone, Default)]
pub struct InMemoryTaskQueue {
    shared: Arc<Shared>,
}

impl InMemoryTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consumer(&self) -> InMemoryTaskConsumer {
        InMemoryTaskConsumer {
            shared: self.shared.clone(),
        }
    }

    /// Tasks waiting for a worker, excluding in-flight deliveries.
    pub fn ready_len(&self) -> usize {
        self.shared.ready().len()
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn enqueue(&self, task: &EmailTask) -> anyhow::Result<()> {
        self.shared.ready().push_back(QueuedTask {
            task: task.clone(),
            delivery_count: 0,
        });
        self.shared.available.notify_one();
        Ok(())
    }
}

pub struct InMemoryTaskConsumer {
    shared: Arc<Shared>,
}

#[async_trait]
impl TaskConsumer for InMemoryTaskConsumer {
    async fn dequeue(&mut self) -> anyhow::Result<Box<dyn Delivery>> {
        loop {
            let next = self.shared.ready().pop_front();
            if let Some(queued) = next {
                return Ok(Box::new(InMemoryDelivery {
                    shared: self.shared.clone(),
                    task: queued.task,
                    delivery_count: queued.delivery_count + 1,
                    acked: false,
                }));
            }
            self.shared.available.notified().await;
        }
    }
}

struct InMemoryDelivery {
    shared: Arc<Shared>,
    task: EmailTask,
    delivery_count: u64,
    acked: bool,
}

#[async_trait]
impl Delivery for InMemoryDelivery {
    fn task(&self) -> &EmailTask {
        &self.task
    }

    fn delivery_count(&self) -> u64 {
        self.delivery_count
    }

    async fn ack(self: Box<Self>) -> anyhow::Result<()> {
        let mut delivery = self;
        delivery.acked = true;
        Ok(())
    }
}

impl Drop for InMemoryDelivery {
    fn drop(&mut self) {
        if self.acked {
            return;
        }
        debug!(task_id = %self.task.id, "unacknowledged delivery returned to queue");
        self.shared.ready().push_front(QueuedTask {
            task: self.task.clone(),
            delivery_count: self.delivery_count,
        });
        self.shared.available.notify_one();
    }
}
