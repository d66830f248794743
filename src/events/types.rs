use crate::api::models::VideoListResponse;
use crate::input::commands::InputCommand;
use crate::player::time::PlayerTime;

#[derive(Debug, Clone)]
pub enum AppEvent {
    // From input thread
    Input(InputCommand),
    InputClosed,

    // From playback clock thread
    TimeUpdate(u64, PlayerTime),
    ClockFinished(u64),
    PlayerError(String),

    // From API thread
    VideosLoaded(Vec<String>, VideoListResponse),
    ApiError(String),
}
