use tracing::{debug, info, warn};

use crate::api::models::{PlayerSettings, SelectedVideo};
use crate::error::Result;
use crate::player::commands::{PlayerState, WidgetEvent};
use crate::player::events::{EventBus, Subscription};
use crate::player::time::{Projection, StartTime, project};
use crate::player::url::video_id_from_url;
use crate::player::widget::VideoWidget;
use crate::prefs::{ACTIVE_VIDEO, PLAYER_VIDEOS, PLAYER_VOLUME, PreferenceStore, PreferenceStoreExt};

pub const DEFAULT_VOLUME: u8 = 50;

/// Keeps the video widget and the stored player preferences in step.
pub struct VideoService<S: PreferenceStore, W: VideoWidget> {
    store: S,
    widget: W,
    settings: Option<PlayerSettings>,
    widget_events: Option<Subscription<WidgetEvent>>,
    playback_ended: EventBus<()>,
}

impl<S: PreferenceStore, W: VideoWidget> VideoService<S, W> {
    pub fn new(store: S, widget: W) -> Self {
        Self {
            store,
            widget,
            settings: None,
            widget_events: None,
            playback_ended: EventBus::new(),
        }
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn get_id_from_url(&self, url: &str) -> Result<String> {
        video_id_from_url(url)
    }

    /// Applies the volume to the widget, persisting it unless `store` is false.
    pub fn set_volume(&mut self, value: u8, store: bool) -> Result<()> {
        let value = value.min(100);
        self.widget.set_volume(value);
        if let Some(ref mut settings) = self.settings {
            settings.volume = value;
        }
        if store {
            self.store.set_as(PLAYER_VOLUME, &value)?;
        }
        Ok(())
    }

    pub fn get_stored_volume(&self) -> Result<Option<u8>> {
        self.store.get_as(PLAYER_VOLUME)
    }

    pub fn set_selected_video(&mut self, selected: &SelectedVideo) -> Result<()> {
        if let Some(ref mut settings) = self.settings {
            settings.active_video = Some(selected.clone());
        }
        self.store.set_as(ACTIVE_VIDEO, selected)
    }

    pub fn get_player_settings(&self) -> Result<PlayerSettings> {
        Ok(PlayerSettings {
            volume: self.get_stored_volume()?.unwrap_or(DEFAULT_VOLUME),
            active_video: self.store.get_as(ACTIVE_VIDEO)?,
        })
    }

    pub fn set_playlist(&mut self, videos: &[SelectedVideo]) -> Result<()> {
        self.store.set_as(PLAYER_VIDEOS, &videos)
    }

    pub fn get_playlist(&self) -> Result<Vec<SelectedVideo>> {
        Ok(self.store.get_as(PLAYER_VIDEOS)?.unwrap_or_default())
    }

    /// Starts listening to the widget. Replaces any earlier subscription.
    pub fn init_player(&mut self, settings: PlayerSettings) {
        if let Some(mut previous) = self.widget_events.take() {
            previous.unsubscribe();
        }
        self.widget_events = Some(self.widget.events());
        self.settings = Some(settings);
    }

    /// Handles widget events received since the last call and returns them.
    pub fn process_widget_events(&mut self) -> Vec<WidgetEvent> {
        let events = match self.widget_events {
            Some(ref mut sub) => sub.drain(),
            None => return Vec::new(),
        };

        for event in &events {
            match event {
                WidgetEvent::Ready => self.on_ready(),
                WidgetEvent::StateChange(PlayerState::Ended) => {
                    let listeners = self.playback_ended.publish(());
                    debug!("Playback ended, notified {} listeners", listeners);
                }
                WidgetEvent::StateChange(state) => {
                    debug!("Player state changed to {:?}", state);
                }
            }
        }

        events
    }

    fn on_ready(&mut self) {
        let Some(settings) = self.settings.clone() else {
            return;
        };

        self.widget.set_volume(settings.volume);
        match settings.active_video {
            Some(ref selected) => self.widget.cue_video_by_id(&selected.video.id),
            None => info!("Player ready, no active video"),
        }
    }

    /// Every call returns an independent listener.
    pub fn playback_ended(&self) -> Subscription<()> {
        self.playback_ended.subscribe()
    }

    pub fn player_time(&self, start: StartTime) -> Result<Projection> {
        project(start)
    }

    pub fn shutdown(&mut self) {
        if let Some(mut sub) = self.widget_events.take() {
            sub.unsubscribe();
        } else {
            warn!("Player was never initialised");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::VideoItem;
    use crate::error::Error;
    use crate::player::widget::HeadlessWidget;
    use crate::prefs::MemoryStore;

    fn selected(id: &str, index: usize) -> SelectedVideo {
        SelectedVideo {
            video: VideoItem {
                id: id.to_string(),
                snippet: None,
                content_details: None,
            },
            index,
        }
    }

    fn service() -> VideoService<MemoryStore, HeadlessWidget> {
        VideoService::new(MemoryStore::new(), HeadlessWidget::new())
    }

    #[test]
    fn empty_store_gives_default_settings() {
        let service = service();
        let settings = service.get_player_settings().unwrap();
        assert_eq!(settings.volume, 50);
        assert_eq!(settings.active_video, None);
        assert!(service.get_playlist().unwrap().is_empty());
    }

    #[test]
    fn stored_volume_round_trips() {
        let mut service = service();
        service.set_volume(75, true).unwrap();
        assert_eq!(service.get_stored_volume().unwrap(), Some(75));
        assert_eq!(service.widget().volume(), 75);
        assert_eq!(service.get_player_settings().unwrap().volume, 75);
    }

    #[test]
    fn unstored_volume_only_reaches_the_widget() {
        let mut service = service();
        service.set_volume(20, false).unwrap();
        assert_eq!(service.widget().volume(), 20);
        assert_eq!(service.get_stored_volume().unwrap(), None);
    }

    #[test]
    fn volume_is_capped_at_100() {
        let mut service = service();
        service.set_volume(180, true).unwrap();
        assert_eq!(service.get_stored_volume().unwrap(), Some(100));
    }

    #[test]
    fn playlist_and_active_video_persist() {
        let mut service = service();
        let videos = vec![selected("a", 0), selected("b", 1)];

        service.set_playlist(&videos).unwrap();
        service.set_selected_video(&videos[1]).unwrap();

        assert_eq!(service.get_playlist().unwrap(), videos);
        assert_eq!(
            service.get_player_settings().unwrap().active_video,
            Some(videos[1].clone())
        );
    }

    #[test]
    fn ready_cues_the_active_video_with_stored_volume() {
        let mut service = service();
        service.set_volume(30, true).unwrap();
        service.set_selected_video(&selected("abc123", 0)).unwrap();

        let settings = service.get_player_settings().unwrap();
        service.init_player(settings);
        service.widget().mark_ready();

        let events = service.process_widget_events();
        assert_eq!(events, vec![WidgetEvent::Ready]);
        assert_eq!(service.widget().cued(), Some("abc123"));
        assert_eq!(service.widget().volume(), 30);
    }

    #[test]
    fn ready_without_active_video_cues_nothing() {
        let mut service = service();
        let settings = service.get_player_settings().unwrap();
        service.init_player(settings);
        service.widget().mark_ready();

        service.process_widget_events();
        assert_eq!(service.widget().cued(), None);
    }

    #[test]
    fn ended_is_broadcast_to_every_listener() {
        let mut service = service();
        let mut first = service.playback_ended();
        let mut second = service.playback_ended();

        service.init_player(service.get_player_settings().unwrap());
        service.widget_mut().cue_video_by_id("abc123");
        service.widget_mut().play_video();
        service.widget_mut().end();
        service.process_widget_events();

        assert_eq!(first.try_next(), Some(()));
        assert_eq!(second.try_next(), Some(()));
        assert_eq!(first.try_next(), None);
    }

    #[test]
    fn events_are_ignored_after_shutdown() {
        let mut service = service();
        let mut ended = service.playback_ended();
        service.init_player(service.get_player_settings().unwrap());
        service.shutdown();
        service.shutdown();

        service.widget_mut().cue_video_by_id("abc123");
        service.widget_mut().end();

        assert!(service.process_widget_events().is_empty());
        assert_eq!(ended.try_next(), None);
    }

    #[test]
    fn unreadable_link_is_reported() {
        let service = service();
        assert!(matches!(
            service.get_id_from_url("not-a-url"),
            Err(Error::NoMatch { .. })
        ));
    }

    #[tokio::test]
    async fn player_time_formats_offsets() {
        let service = service();
        let mut projection = service.player_time(StartTime::at(65.0)).unwrap();
        assert_eq!(projection.next().await.unwrap().formatted, "1:05");
        assert!(projection.next().await.is_none());
    }
}
