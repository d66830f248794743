use std::{sync::mpsc, time::Duration};

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use digger::{
    api::{self, thread::ApiCommand},
    app::state::App,
    config,
    events::types::AppEvent,
    input::{self, commands::InputCommand},
    player::{self, commands::PlayerCommand, service::VideoService, widget::HeadlessWidget},
    prefs::FileStore,
};

fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let config = config::load_or_create_config().context("Failed to load config")?;
    init_logging(&config.log_level);

    let store_path = config.preferences_path()?;
    let store = FileStore::open(&store_path)
        .with_context(|| format!("Failed to open preferences at {}", store_path.display()))?;
    info!("Preferences stored at {}", store.path().display());

    let mut video = VideoService::new(store, HeadlessWidget::new());
    if video.get_stored_volume()?.is_none() {
        video.set_volume(config.default_volume, true)?;
    }

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>();
    let (player_cmd_tx, player_cmd_rx) = mpsc::channel::<PlayerCommand>();
    let (api_cmd_tx, api_cmd_rx) = mpsc::channel::<ApiCommand>();

    let _input_handle = input::thread::spawn(event_tx.clone());
    let player_handle = player::thread::spawn(player_cmd_rx, event_tx.clone());
    let _api_handle = api::thread::spawn(config.clone(), api_cmd_rx, event_tx.clone());

    let mut app = App::new(video, player_cmd_tx, api_cmd_tx)?;
    app.start();
    info!("Connected to {}", config.server_url);
    println!("Type 'help' for commands.");

    let mut last_line: Option<String> = None;

    loop {
        for notification in app.notifications.take() {
            println!("{}", notification);
        }

        if let Some(line) = app.now_playing() {
            if last_line.as_ref() != Some(&line) {
                println!("> {}", line);
                last_line = Some(line);
            }
        }

        if app.should_quit {
            break;
        }

        match event_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(event) => match event {
                AppEvent::Input(cmd) => app.handle_input(cmd),
                AppEvent::InputClosed => app.handle_input(InputCommand::Quit),
                AppEvent::TimeUpdate(clock, time) => app.on_time_update(clock, time),
                AppEvent::ClockFinished(clock) => app.on_clock_finished(clock),
                AppEvent::PlayerError(e) => app.on_player_error(e),
                AppEvent::VideosLoaded(ids, response) => app.on_videos_loaded(ids, response),
                AppEvent::ApiError(err) => app.on_api_error(err),
            },
            Err(mpsc::RecvTimeoutError::Timeout) => app.tick(),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                anyhow::bail!("Event channel disconnected");
            }
        }
    }

    drop(app);
    let _ = player_handle.join();
    Ok(())
}
