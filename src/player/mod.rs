pub mod commands;
pub mod events;
pub mod service;
pub mod thread;
pub mod time;
pub mod url;
pub mod widget;
