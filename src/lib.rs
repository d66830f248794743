//! Headless video player client for a record-collection browser: playlist and
//! volume preferences, video metadata fetching, and a ticking playback clock.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod input;
pub mod player;
pub mod prefs;

pub use error::{Error, Result};
