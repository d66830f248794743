use std::io::{self, BufRead};
use std::{sync::mpsc, thread::JoinHandle};

use crate::events::types::AppEvent;
use crate::input::commands::InputCommand;

pub fn spawn(event_tx: mpsc::Sender<AppEvent>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let stdin = io::stdin();

        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(_) => break,
            };

            match InputCommand::parse(&line) {
                Ok(cmd) => {
                    if event_tx.send(AppEvent::Input(cmd)).is_err() {
                        return;
                    }
                }
                Err(msg) if msg.is_empty() => {}
                Err(msg) => eprintln!("{}", msg),
            }
        }

        let _ = event_tx.send(AppEvent::InputClosed);
    })
}
