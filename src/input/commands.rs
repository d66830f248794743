#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    Add(String),
    Play,
    Pause,
    Next,
    Previous,
    Volume(u8),
    End,
    List,
    Help,
    Quit,
}

impl InputCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word {
            "add" | "a" if !rest.is_empty() => Ok(InputCommand::Add(rest.to_string())),
            "add" | "a" => Err("Usage: add <link>".to_string()),
            "play" | "p" => Ok(InputCommand::Play),
            "pause" => Ok(InputCommand::Pause),
            "next" | "n" => Ok(InputCommand::Next),
            "prev" => Ok(InputCommand::Previous),
            "vol" | "v" => rest
                .parse::<u8>()
                .ok()
                .filter(|v| *v <= 100)
                .map(InputCommand::Volume)
                .ok_or_else(|| "Usage: vol <0-100>".to_string()),
            "end" => Ok(InputCommand::End),
            "list" | "ls" => Ok(InputCommand::List),
            "help" | "?" => Ok(InputCommand::Help),
            "quit" | "q" => Ok(InputCommand::Quit),
            "" => Err(String::new()),
            other => Err(format!("Unknown command: {}", other)),
        }
    }
}

pub const HELP: &str = "\
add <link>   queue a video link
play         play the active video
pause        pause playback
next, prev   move through the playlist
vol <0-100>  set the volume
end          mark the active video as finished
list         show the playlist
quit         exit";
