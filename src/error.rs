use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid start time: {0}")]
    InvalidStartTime(String),

    #[error("Could not read link: {url}")]
    NoMatch { url: String },

    #[error("Preference store unavailable: {0}")]
    StoreUnavailable(String),
}

pub type Result<T> = std::result::Result<T, Error>;
