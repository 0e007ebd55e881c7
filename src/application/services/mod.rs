pub mod mailer;
pub mod task_queue;
