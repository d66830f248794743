use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

impl NotificationLevel {
    pub fn prefix(&self) -> &'static str {
        match self {
            NotificationLevel::Info => "INFO",
            NotificationLevel::Warning => "WARN",
            NotificationLevel::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub text: String,
}

/// Messages for the user, collected until the event loop prints them.
#[derive(Debug, Default)]
pub struct NotificationManager {
    notifications: Vec<Notification>,
}

impl NotificationManager {
    pub fn new() -> Self {
        Self {
            notifications: Vec::new(),
        }
    }

    pub fn notify(&mut self, level: NotificationLevel, text: impl Into<String>) {
        let text = text.into();
        debug!("[{}] {}", level.prefix(), text);
        self.notifications.push(Notification { level, text });
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.notify(NotificationLevel::Info, text);
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        let text = text.into();
        warn!("{}", text);
        self.notify(NotificationLevel::Warning, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        let text = text.into();
        error!("{}", text);
        self.notify(NotificationLevel::Error, text);
    }

    pub fn take(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.level == NotificationLevel::Info {
            write!(f, "{}", self.text)
        } else {
            write!(f, "{}: {}", self.level.prefix(), self.text)
        }
    }
}
