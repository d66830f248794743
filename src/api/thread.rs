use std::sync::mpsc;

use tracing::warn;

use crate::api::client::ApiClient;
use crate::events::types::AppEvent;

pub enum ApiCommand {
    FetchVideos(Vec<String>),
}

pub fn spawn(
    config: crate::config::Config,
    cmd_rx: mpsc::Receiver<ApiCommand>,
    event_tx: mpsc::Sender<AppEvent>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let client = ApiClient::new(&config);

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                ApiCommand::FetchVideos(ids) => match client.get_list_data(&ids) {
                    Ok(response) => {
                        let _ = event_tx.send(AppEvent::VideosLoaded(ids, response));
                    }
                    Err(e) => {
                        warn!("Video metadata request failed: {}", e);
                        let _ = event_tx.send(AppEvent::ApiError(e.to_string()));
                    }
                },
            }
        }
    })
}
