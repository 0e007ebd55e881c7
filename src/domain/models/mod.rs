pub mod email;
pub mod task;

pub use email::{EmailMessage, MessageTemplate};
pub use task::{EmailTask, TaskStatus};
