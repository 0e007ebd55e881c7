pub mod email_dispatcher;
pub mod status_stream;
