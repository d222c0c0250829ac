use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid time {0:?}, expected HH:MM")]
    InvalidTime(String),

    #[error("speed rule table must contain at least one rule")]
    EmptyRules,

    #[error("speed rule {index} has a non-finite temperature bound")]
    InvalidRule { index: usize },

    #[error("invalid duty bounds {min}%-{max}%, expected 0 <= min <= max <= 100")]
    InvalidBounds { min: u8, max: u8 },

    #[error("night limit {0}% is outside 0-100")]
    InvalidNightLimit(i32),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("unknown timezone {0:?}")]
    InvalidTimezone(String),

    #[error("malformed config: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}
