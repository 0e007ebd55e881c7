use std::time::Duration;

use async_nats::jetstream::{self, kv};
use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::domain::{errors::DomainError, models::TaskStatus, repositories::TaskStatusStore};

/// Task status kept in a JetStream key-value bucket, one key per task.
///
/// Terminal writes go through a revision check, so two writers racing on the
/// same task cannot both move it out of `Pending`.
pub struct JetstreamStatusStore {
    kv: kv::Store,
}

impl JetstreamStatusStore {
    pub async fn new(
        context: &jetstream::Context,
        bucket: &str,
        retention: Duration,
    ) -> anyhow::Result<Self> {
        let kv = match context.get_key_value(bucket).await {
            Ok(kv) => kv,
            Err(_) => {
                context
                    .create_key_value(kv::Config {
                        bucket: bucket.to_string(),
                        history: 1,
                        max_age: retention,
                        ..Default::default()
                    })
                    .await?
            }
        };

        info!(bucket, "jetstream status store ready");

        Ok(Self { kv })
    }

    async fn current(&self, task_id: Uuid) -> Result<Option<(TaskStatus, u64)>, DomainError> {
        let entry = self
            .kv
            .entry(task_id.to_string())
            .await
            .map_err(|err| DomainError::StoreUnavailable(err.to_string()))?;

        match entry {
            Some(entry) if matches!(entry.operation, kv::Operation::Put) => {
                let status = decode(&entry.value)?;
                Ok(Some((status, entry.revision)))
            }
            _ => Ok(None),
        }
    }

    /// Explains a failed conditional write: a terminal status won the race,
    /// or the store itself failed.
    async fn write_conflict(&self, task_id: Uuid, err: String) -> DomainError {
        match self.current(task_id).await {
            Ok(Some((status, _))) if status.is_terminal() => DomainError::AlreadyTerminal(task_id),
            _ => DomainError::StoreUnavailable(err),
        }
    }
}

fn decode(value: &[u8]) -> Result<TaskStatus, DomainError> {
    serde_json::from_slice(value)
        .map_err(|err| DomainError::StoreUnavailable(format!("corrupt status entry: {err}")))
}

#[async_trait]
impl TaskStatusStore for JetstreamStatusStore {
    async fn get(&self, task_id: Uuid) -> Result<Option<TaskStatus>, DomainError> {
        let value = self
            .kv
            .get(task_id.to_string())
            .await
            .map_err(|err| DomainError::StoreUnavailable(err.to_string()))?;

        value.map(|bytes| decode(&bytes)).transpose()
    }

    async fn set(&self, task_id: Uuid, status: TaskStatus) -> Result<(), DomainError> {
        let key = task_id.to_string();
        let value = serde_json::to_vec(&status).map_err(anyhow::Error::from)?;

        match self.current(task_id).await? {
            Some((existing, _)) if existing.is_terminal() => {
                Err(DomainError::AlreadyTerminal(task_id))
            }
            Some((_, revision)) => match self.kv.update(&key, value.into(), revision).await {
                Ok(_) => Ok(()),
                Err(err) => Err(self.write_conflict(task_id, err.to_string()).await),
            },
            None => match self.kv.create(&key, value.into()).await {
                Ok(_) => Ok(()),
                Err(err) => Err(self.write_conflict(task_id, err.to_string()).await),
            },
        }
    }
}
