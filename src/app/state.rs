use std::sync::mpsc;

use tracing::{debug, info, warn};

use crate::api::models::{SelectedVideo, VideoListResponse, group_by_channel};
use crate::api::thread::ApiCommand;
use crate::app::notifications::NotificationManager;
use crate::app::{decrement, increment};
use crate::error::Error;
use crate::input::commands::{HELP, InputCommand};
use crate::player::commands::{PlayerCommand, PlayerState, WidgetEvent};
use crate::player::events::Subscription;
use crate::player::service::VideoService;
use crate::player::time::{PlayerTime, StartTime};
use crate::player::widget::{HeadlessWidget, VideoWidget};
use crate::prefs::PreferenceStore;

pub struct App<S: PreferenceStore> {
    // Data
    pub video: VideoService<S, HeadlessWidget>,
    pub playlist: Vec<SelectedVideo>,
    pub active_index: Option<usize>,

    // Playback state
    pub player_state: Option<PlayerState>,
    pub current_time: Option<PlayerTime>,
    resume_from: f64,
    clock: u64,
    playback_ended: Subscription<()>,

    // Communication
    pub player_tx: mpsc::Sender<PlayerCommand>,
    pub api_tx: mpsc::Sender<ApiCommand>,

    // Notifications
    pub notifications: NotificationManager,

    // Control
    pub should_quit: bool,
}

impl<S: PreferenceStore> App<S> {
    pub fn new(
        mut video: VideoService<S, HeadlessWidget>,
        player_tx: mpsc::Sender<PlayerCommand>,
        api_tx: mpsc::Sender<ApiCommand>,
    ) -> Result<Self, Error> {
        let settings = video.get_player_settings()?;
        let playlist = video.get_playlist()?;

        let active_index = settings.active_video.as_ref().and_then(|active| {
            playlist
                .iter()
                .position(|v| v.video.id == active.video.id)
        });

        info!(
            "Restored {} playlist entries, volume {}",
            playlist.len(),
            settings.volume
        );

        video.init_player(settings);
        let playback_ended = video.playback_ended();

        Ok(Self {
            video,
            playlist,
            active_index,

            player_state: None,
            current_time: None,
            resume_from: 0.0,
            clock: 0,
            playback_ended,

            player_tx,
            api_tx,

            notifications: NotificationManager::new(),

            should_quit: false,
        })
    }

    /// Signals the widget as ready, which cues the stored active video.
    pub fn start(&mut self) {
        self.video.widget().mark_ready();
        self.tick();
    }

    pub fn active_video(&self) -> Option<&SelectedVideo> {
        self.active_index.and_then(|i| self.playlist.get(i))
    }

    /// Id of the clock whose events are currently accepted.
    pub fn clock_id(&self) -> u64 {
        self.clock
    }

    fn start_clock(&mut self, start: StartTime) {
        self.clock += 1;
        let _ = self.player_tx.send(PlayerCommand::StartClock {
            clock: self.clock,
            start,
        });
    }

    // Events already queued by the stopped clock no longer match.
    fn stop_clock(&mut self) {
        self.clock += 1;
        let _ = self.player_tx.send(PlayerCommand::StopClock);
    }

    pub fn handle_input(&mut self, cmd: InputCommand) {
        match cmd {
            InputCommand::Add(url) => self.add_link(&url),
            InputCommand::Play => {
                if self.active_index.is_none() && !self.playlist.is_empty() {
                    self.select(0);
                }
                self.video.widget_mut().play_video();
            }
            InputCommand::Pause => self.video.widget_mut().pause_video(),
            InputCommand::Next => {
                if let Some(index) = self.active_index {
                    self.select(increment(index, self.playlist.len(), true));
                }
            }
            InputCommand::Previous => {
                if let Some(index) = self.active_index {
                    self.select(decrement(index, self.playlist.len(), true));
                }
            }
            InputCommand::Volume(value) => {
                if let Err(e) = self.video.set_volume(value, true) {
                    self.notifications.error(e.to_string());
                } else {
                    self.notifications.info(format!("Volume {}", value));
                }
            }
            InputCommand::End => self.video.widget_mut().end(),
            InputCommand::List => self.list_playlist(),
            InputCommand::Help => self.notifications.info(HELP),
            InputCommand::Quit => {
                self.stop_clock();
                self.video.shutdown();
                self.should_quit = true;
            }
        }
        self.tick();
    }

    fn add_link(&mut self, url: &str) {
        match self.video.get_id_from_url(url) {
            Ok(id) => {
                debug!("Requesting metadata for {}", id);
                let _ = self.api_tx.send(ApiCommand::FetchVideos(vec![id]));
            }
            Err(Error::NoMatch { .. }) => {
                self.notifications.warning(format!("Could not read link: {}", url));
            }
            Err(e) => self.notifications.error(e.to_string()),
        }
    }

    fn list_playlist(&mut self) {
        if self.playlist.is_empty() {
            self.notifications.info("Playlist is empty");
            return;
        }

        let mut lines = Vec::new();
        for (channel, entries) in group_by_channel(&self.playlist) {
            lines.push(channel);
            for entry in entries {
                let marker = if Some(entry.index) == self.active_index {
                    ">"
                } else {
                    " "
                };
                lines.push(format!(
                    "{} {:02}. {}",
                    marker,
                    entry.index + 1,
                    entry.video.title()
                ));
            }
        }
        self.notifications.info(lines.join("\n"));
    }

    fn select(&mut self, index: usize) {
        let Some(entry) = self.playlist.get(index).cloned() else {
            return;
        };

        self.stop_clock();
        self.active_index = Some(index);
        self.current_time = None;
        self.resume_from = 0.0;

        if let Err(e) = self.video.set_selected_video(&entry) {
            self.notifications.error(e.to_string());
        }
        self.video.widget_mut().cue_video_by_id(&entry.video.id);
        self.notifications
            .info(format!("Selected {}", entry.video.title()));
    }

    /// Processes widget events and playback-ended notifications.
    pub fn tick(&mut self) {
        loop {
            let events = self.video.process_widget_events();
            for event in &events {
                if let WidgetEvent::StateChange(state) = event {
                    self.on_player_state_changed(*state);
                }
            }

            let mut ended = false;
            while self.playback_ended.try_next().is_some() {
                ended = true;
                self.on_playback_ended();
            }

            if events.is_empty() && !ended {
                break;
            }
        }
    }

    fn on_player_state_changed(&mut self, state: PlayerState) {
        let previous = self.player_state.replace(state);

        match state {
            PlayerState::Playing => {
                if previous == Some(PlayerState::Playing) {
                    return;
                }
                let Some(entry) = self.active_video() else {
                    return;
                };
                let start = match entry.video.iso_duration() {
                    Some(duration) => StartTime::with_iso_duration(self.resume_from, duration),
                    None => Ok(StartTime::at(self.resume_from)),
                };
                let start = start.unwrap_or_else(|e| {
                    warn!("{}, clock shows the offset only", e);
                    StartTime::at(self.resume_from)
                });
                self.start_clock(start);
            }
            PlayerState::Paused => {
                self.stop_clock();
                if let Some(ref time) = self.current_time {
                    self.resume_from = time.seconds;
                }
            }
            PlayerState::Ended => {
                self.stop_clock();
                self.resume_from = 0.0;
            }
            PlayerState::Unstarted | PlayerState::Buffering | PlayerState::Cued => {}
        }
    }

    fn on_playback_ended(&mut self) {
        let next = self.active_index.map(|i| i + 1).unwrap_or(0);
        if next < self.playlist.len() {
            self.select(next);
            self.video.widget_mut().play_video();
        } else {
            self.notifications.info("Playlist finished");
        }
    }

    pub fn on_videos_loaded(&mut self, ids: Vec<String>, response: VideoListResponse) {
        let first_new = self.playlist.len();

        for id in ids {
            match response.find(&id) {
                Some(item) => {
                    self.notifications.info(format!("Added {}", item.title()));
                    self.playlist.push(SelectedVideo {
                        video: item.clone(),
                        index: self.playlist.len(),
                    });
                }
                None => self
                    .notifications
                    .warning(format!("No video found for {}", id)),
            }
        }

        if self.playlist.len() == first_new {
            return;
        }

        if let Err(e) = self.video.set_playlist(&self.playlist) {
            self.notifications.error(e.to_string());
        }

        if self.active_index.is_none() {
            self.select(first_new);
        }
        self.tick();
    }

    pub fn on_time_update(&mut self, clock: u64, time: PlayerTime) {
        if clock != self.clock {
            debug!("Dropping tick from stale clock {}", clock);
            return;
        }
        self.current_time = Some(time);
    }

    /// A counting clock runs out when the track does. Without a known
    /// duration (or a zero one, as live streams report) the clock only
    /// reports the offset once.
    pub fn on_clock_finished(&mut self, clock: u64) {
        if clock != self.clock {
            debug!("Ignoring finish of stale clock {}", clock);
            return;
        }

        let has_duration = self
            .active_video()
            .and_then(|entry| entry.video.duration_ms())
            .is_some_and(|ms| ms > 0);

        if has_duration {
            self.video.widget_mut().end();
            self.tick();
        }
    }

    pub fn on_player_error(&mut self, e: String) {
        self.notifications.error(format!("Player error: {}", e));
    }

    pub fn on_api_error(&mut self, e: String) {
        self.notifications.error(format!("Could not load videos: {}", e));
    }

    pub fn now_playing(&self) -> Option<String> {
        let entry = self.active_video()?;
        let time = self.current_time.as_ref()?;
        Some(format!("{} {}", entry.video.title(), time.formatted))
    }
}
