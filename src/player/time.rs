use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::debug;

use crate::api::models::parse_iso8601_duration;
use crate::error::{Error, Result};

const TICK: Duration = Duration::from_millis(1000);
const GRACE_MS: f64 = 1000.0;

/// Offset into a track, with the total track length in milliseconds when known.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StartTime {
    pub seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl StartTime {
    pub fn at(seconds: f64) -> Self {
        Self {
            seconds,
            duration: None,
        }
    }

    pub fn with_duration(seconds: f64, duration_ms: f64) -> Self {
        Self {
            seconds,
            duration: Some(duration_ms),
        }
    }

    /// Builds a start time from an ISO-8601 duration such as `PT4M13S`.
    pub fn with_iso_duration(seconds: f64, duration: &str) -> Result<Self> {
        let ms = parse_iso8601_duration(duration).ok_or_else(|| {
            Error::InvalidStartTime(format!("unreadable duration '{}'", duration))
        })?;
        Ok(Self::with_duration(seconds, ms as f64))
    }

    /// Track length in milliseconds, if known. Live streams report zero,
    /// which counts as unknown.
    pub fn known_duration(&self) -> Option<f64> {
        self.duration.filter(|ms| *ms > 0.0)
    }

    fn validate(&self) -> Result<()> {
        if !self.seconds.is_finite() || self.seconds < 0.0 {
            return Err(Error::InvalidStartTime(format!(
                "seconds must be a non-negative number, got {}",
                self.seconds
            )));
        }
        if let Some(duration) = self.duration {
            if !duration.is_finite() || duration < 0.0 {
                return Err(Error::InvalidStartTime(format!(
                    "duration must be a non-negative number of milliseconds, got {}",
                    duration
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerTime {
    pub formatted: String,
    pub seconds: f64,
}

impl PlayerTime {
    pub fn from_seconds(seconds: f64) -> Self {
        Self {
            formatted: format_duration(seconds),
            seconds,
        }
    }
}

/// Renders `m:ss`. Minutes are not split into hours.
pub fn format_duration(seconds: f64) -> String {
    let whole = seconds.max(0.0).trunc() as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}

/// Number of ticks a counting projection emits before it stops.
pub fn tick_budget(start: &StartTime) -> u64 {
    match start.known_duration() {
        Some(duration) => {
            let window = duration - start.seconds * 1000.0 + GRACE_MS;
            if window <= 0.0 {
                0
            } else {
                (window / 1000.0).floor() as u64
            }
        }
        None => 1,
    }
}

enum State {
    Static(Option<PlayerTime>),
    Counting {
        start_seconds: f64,
        tick: u64,
        budget: u64,
        interval: Option<Interval>,
    },
}

/// Lazy sequence of [`PlayerTime`] values produced by [`project`].
///
/// The periodic timer is created on the first call to [`Projection::next`]
/// and dropped as soon as the sequence ends or is detached.
pub struct Projection {
    state: State,
    detach_tx: Arc<watch::Sender<bool>>,
    detach_rx: watch::Receiver<bool>,
}

/// Handle that stops a running projection. Detaching more than once is a no-op.
#[derive(Debug, Clone)]
pub struct Detach {
    tx: Arc<watch::Sender<bool>>,
}

impl Detach {
    pub fn detach(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_detached(&self) -> bool {
        *self.tx.borrow()
    }
}

pub fn project(start: StartTime) -> Result<Projection> {
    start.validate()?;

    let state = match start.known_duration() {
        None => State::Static(Some(PlayerTime::from_seconds(start.seconds))),
        Some(_) => State::Counting {
            start_seconds: start.seconds,
            tick: 0,
            budget: tick_budget(&start),
            interval: None,
        },
    };

    let (detach_tx, detach_rx) = watch::channel(false);
    Ok(Projection {
        state,
        detach_tx: Arc::new(detach_tx),
        detach_rx,
    })
}

impl Projection {
    pub fn detacher(&self) -> Detach {
        Detach {
            tx: self.detach_tx.clone(),
        }
    }

    pub fn is_counting(&self) -> bool {
        matches!(self.state, State::Counting { .. })
    }

    pub fn is_detached(&self) -> bool {
        *self.detach_rx.borrow()
    }

    pub async fn next(&mut self) -> Option<PlayerTime> {
        if self.is_detached() {
            self.release();
            return None;
        }

        match &mut self.state {
            State::Static(value) => value.take(),
            State::Counting {
                start_seconds,
                tick,
                budget,
                interval,
            } => {
                if *tick >= *budget {
                    if interval.take().is_some() {
                        debug!("Playback clock finished after {} ticks", tick);
                    }
                    return None;
                }

                let timer = interval.get_or_insert_with(|| {
                    let mut timer = tokio::time::interval(TICK);
                    timer.set_missed_tick_behavior(MissedTickBehavior::Burst);
                    timer
                });

                tokio::select! {
                    biased;
                    _ = self.detach_rx.wait_for(|detached| *detached) => {
                        *interval = None;
                        debug!("Playback clock detached at tick {}", tick);
                        return None;
                    }
                    _ = timer.tick() => {}
                }

                let value = PlayerTime::from_seconds(*start_seconds + *tick as f64);
                *tick += 1;
                Some(value)
            }
        }
    }

    fn release(&mut self) {
        match &mut self.state {
            State::Static(value) => *value = None,
            State::Counting { interval, .. } => *interval = None,
        }
    }
}
