pub mod mail;
pub mod messaging;
pub mod repositories;
