use crate::player::time::StartTime;

/// Requests handled by the playback clock thread. `clock` is echoed on every
/// event the clock sends so stale ticks can be told apart.
#[derive(Debug, Clone)]
pub enum PlayerCommand {
    StartClock { clock: u64, start: StartTime },
    StopClock,
}

/// State codes reported by the embedded video player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

impl PlayerState {
    pub fn code(self) -> i32 {
        match self {
            PlayerState::Unstarted => -1,
            PlayerState::Ended => 0,
            PlayerState::Playing => 1,
            PlayerState::Paused => 2,
            PlayerState::Buffering => 3,
            PlayerState::Cued => 5,
        }
    }
}

impl TryFrom<i32> for PlayerState {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            -1 => Ok(PlayerState::Unstarted),
            0 => Ok(PlayerState::Ended),
            1 => Ok(PlayerState::Playing),
            2 => Ok(PlayerState::Paused),
            3 => Ok(PlayerState::Buffering),
            5 => Ok(PlayerState::Cued),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetEvent {
    Ready,
    StateChange(PlayerState),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_codes_round_trip() {
        for state in [
            PlayerState::Unstarted,
            PlayerState::Ended,
            PlayerState::Playing,
            PlayerState::Paused,
            PlayerState::Buffering,
            PlayerState::Cued,
        ] {
            assert_eq!(PlayerState::try_from(state.code()), Ok(state));
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert_eq!(PlayerState::try_from(4), Err(4));
        assert_eq!(PlayerState::try_from(42), Err(42));
    }
}
