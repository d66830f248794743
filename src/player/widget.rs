use tracing::{debug, info};

use crate::player::commands::{PlayerState, WidgetEvent};
use crate::player::events::{EventBus, Subscription};

/// The embedded player of the video platform.
pub trait VideoWidget {
    fn set_volume(&mut self, volume: u8);
    fn cue_video_by_id(&mut self, id: &str);
    fn play_video(&mut self);
    fn pause_video(&mut self);
    fn events(&self) -> Subscription<WidgetEvent>;
}

/// Widget without a video surface: keeps the player's state and reports
/// the same events a real embed would.
#[derive(Debug, Default)]
pub struct HeadlessWidget {
    bus: EventBus<WidgetEvent>,
    volume: u8,
    cued: Option<String>,
    state: Option<PlayerState>,
}

impl HeadlessWidget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn cued(&self) -> Option<&str> {
        self.cued.as_deref()
    }

    pub fn state(&self) -> Option<PlayerState> {
        self.state
    }

    pub fn mark_ready(&self) {
        self.bus.publish(WidgetEvent::Ready);
    }

    /// Reports the current video as finished.
    pub fn end(&mut self) {
        if self.cued.is_some() {
            self.change_state(PlayerState::Ended);
        }
    }

    fn change_state(&mut self, state: PlayerState) {
        self.state = Some(state);
        self.bus.publish(WidgetEvent::StateChange(state));
    }
}

impl VideoWidget for HeadlessWidget {
    fn set_volume(&mut self, volume: u8) {
        debug!("Widget volume set to {}", volume);
        self.volume = volume;
    }

    fn cue_video_by_id(&mut self, id: &str) {
        info!("Cued video {}", id);
        self.cued = Some(id.to_string());
        self.change_state(PlayerState::Cued);
    }

    fn play_video(&mut self) {
        if self.cued.is_some() && self.state != Some(PlayerState::Playing) {
            self.change_state(PlayerState::Playing);
        }
    }

    fn pause_video(&mut self) {
        if self.state == Some(PlayerState::Playing) {
            self.change_state(PlayerState::Paused);
        }
    }

    fn events(&self) -> Subscription<WidgetEvent> {
        self.bus.subscribe()
    }
}
