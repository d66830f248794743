pub mod commands;
pub mod thread;
