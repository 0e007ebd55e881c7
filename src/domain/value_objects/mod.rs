use std::fmt;

use lettre::Address;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// A syntactically valid mailbox address, checked before a task reaches the queue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recipient(String);

impl Recipient {
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidRecipient(
                "recipient must not be empty".to_string(),
            ));
        }

        trimmed
            .parse::<Address>()
            .map_err(|err| DomainError::InvalidRecipient(format!("{trimmed}: {err}")))?;

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
