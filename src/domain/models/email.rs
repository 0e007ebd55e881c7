use crate::domain::{models::EmailTask, value_objects::Recipient};

/// Fixed parts of every outgoing message.
#[derive(Debug, Clone)]
pub struct MessageTemplate {
    pub from: String,
    pub subject: String,
    pub body: String,
}

impl Default for MessageTemplate {
    fn default() -> Self {
        Self {
            from: String::new(),
            subject: "Test Email".to_string(),
            body: "This is a test email".to_string(),
        }
    }
}

/// Built from a task for a single send attempt, never stored.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub from: String,
    pub to: Recipient,
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    pub fn for_task(task: &EmailTask, template: &MessageTemplate) -> Self {
        Self {
            from: template.from.clone(),
            to: task.recipient.clone(),
            subject: template.subject.clone(),
            body: template.body.clone(),
        }
    }
}
