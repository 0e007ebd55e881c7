use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{events::StatusEvent, repositories::TaskStatusStore};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Clone)]
pub struct StatusStreamConfig {
    /// Raised to one millisecond when smaller.
    pub poll_interval: Duration,
    /// Upper bound on how long a stream watches one task. `None` watches
    /// until the task is terminal.
    pub max_wait: Option<Duration>,
}

impl Default for StatusStreamConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_wait: Some(Duration::from_secs(300)),
        }
    }
}

/// Turns task status into a live event sequence for one client.
///
/// Each stream polls the store once per tick and ends right after its first
/// terminal event. Dropping the stream (client disconnect) stops polling; the
/// task itself is unaffected.
#[derive(Clone)]
pub struct StatusStreamEmitter {
    status_store: Arc<dyn TaskStatusStore>,
    config: StatusStreamConfig,
}

struct Watch {
    task_id: Uuid,
    status_store: Arc<dyn TaskStatusStore>,
    ticker: Interval,
    deadline: Option<Instant>,
}

impl Watch {
    async fn poll(&mut self) -> StatusEvent {
        self.ticker.tick().await;

        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                warn!(task_id = %self.task_id, "status stream reached its maximum wait");
                return StatusEvent::timeout("gave up waiting for the email task to finish");
            }
        }

        match self.status_store.get(self.task_id).await {
            Ok(Some(status)) => StatusEvent::from(&status),
            Ok(None) => StatusEvent::failed(format!("unknown task {}", self.task_id)),
            Err(err) => {
                warn!(task_id = %self.task_id, error = %err, "status poll failed");
                StatusEvent::failed(err.to_string())
            }
        }
    }
}

impl StatusStreamEmitter {
    pub fn new(status_store: Arc<dyn TaskStatusStore>, config: StatusStreamConfig) -> Self {
        Self {
            status_store,
            config,
        }
    }

    pub fn watch(&self, task_id: Uuid) -> BoxStream<'static, StatusEvent> {
        let mut ticker = tokio::time::interval(self.config.poll_interval.max(MIN_POLL_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let watch = Watch {
            task_id,
            status_store: self.status_store.clone(),
            ticker,
            deadline: self.config.max_wait.map(|wait| Instant::now() + wait),
        };

        // `None` is the Done state.
        stream::unfold(Some(watch), |state| async move {
            let mut watch = state?;
            let event = watch.poll().await;
            if event.is_terminal() {
                debug!(task_id = %watch.task_id, status = ?event.status, "status stream finished");
                Some((event, None))
            } else {
                Some((event, Some(watch)))
            }
        })
        .boxed()
    }
}
