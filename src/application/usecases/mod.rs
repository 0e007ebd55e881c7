pub mod enqueue_email;
pub mod get_task_status;
