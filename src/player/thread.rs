use std::sync::mpsc;
use std::thread::JoinHandle;

use tracing::{debug, error};

use crate::events::types::AppEvent;
use crate::player::commands::PlayerCommand;
use crate::player::time::{Detach, project};

/// Runs the playback clock. At most one projection is live; starting a new
/// clock detaches the previous one.
pub fn spawn(
    cmd_rx: mpsc::Receiver<PlayerCommand>,
    event_tx: mpsc::Sender<AppEvent>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("playback-clock")
            .enable_time()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("Failed to start playback clock runtime: {}", e);
                let _ = event_tx.send(AppEvent::PlayerError(e.to_string()));
                return;
            }
        };

        let mut current: Option<Detach> = None;

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                PlayerCommand::StartClock { clock, start } => {
                    if let Some(previous) = current.take() {
                        previous.detach();
                    }

                    let mut projection = match project(start) {
                        Ok(projection) => projection,
                        Err(e) => {
                            let _ = event_tx.send(AppEvent::PlayerError(e.to_string()));
                            continue;
                        }
                    };

                    debug!("Starting playback clock {} at {}s", clock, start.seconds);
                    current = Some(projection.detacher());

                    let tx = event_tx.clone();
                    runtime.spawn(async move {
                        while let Some(time) = projection.next().await {
                            if tx.send(AppEvent::TimeUpdate(clock, time)).is_err() {
                                return;
                            }
                        }
                        if !projection.is_detached() {
                            let _ = tx.send(AppEvent::ClockFinished(clock));
                        }
                    });
                }

                PlayerCommand::StopClock => {
                    if let Some(previous) = current.take() {
                        previous.detach();
                    }
                }
            }
        }

        if let Some(previous) = current.take() {
            previous.detach();
        }
        runtime.shutdown_background();
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::time::StartTime;
    use std::time::Duration;

    #[test]
    fn static_clock_reports_one_value_then_finishes() {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let handle = spawn(cmd_rx, event_tx);

        cmd_tx
            .send(PlayerCommand::StartClock {
                clock: 7,
                start: StartTime::at(65.0),
            })
            .unwrap();

        match event_rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            AppEvent::TimeUpdate(clock, time) => {
                assert_eq!(clock, 7);
                assert_eq!(time.formatted, "1:05");
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(matches!(
            event_rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            AppEvent::ClockFinished(7)
        ));

        drop(cmd_tx);
        handle.join().unwrap();
    }

    #[test]
    fn invalid_start_is_reported_as_player_error() {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let handle = spawn(cmd_rx, event_tx);

        cmd_tx
            .send(PlayerCommand::StartClock {
                clock: 1,
                start: StartTime::at(-3.0),
            })
            .unwrap();

        assert!(matches!(
            event_rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            AppEvent::PlayerError(_)
        ));

        drop(cmd_tx);
        handle.join().unwrap();
    }

    #[test]
    fn stopped_clock_does_not_report_finished() {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let handle = spawn(cmd_rx, event_tx);

        cmd_tx
            .send(PlayerCommand::StartClock {
                clock: 1,
                start: StartTime::with_duration(0.0, 600_000.0),
            })
            .unwrap();
        assert!(matches!(
            event_rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            AppEvent::TimeUpdate(1, _)
        ));

        cmd_tx.send(PlayerCommand::StopClock).unwrap();
        cmd_tx.send(PlayerCommand::StopClock).unwrap();

        let leftover: Vec<AppEvent> = std::iter::from_fn(|| {
            event_rx.recv_timeout(Duration::from_millis(1500)).ok()
        })
        .collect();
        assert!(
            leftover
                .iter()
                .all(|e| matches!(e, AppEvent::TimeUpdate(1, _)))
        );
        assert!(leftover.len() <= 1);

        drop(cmd_tx);
        handle.join().unwrap();
    }
}
