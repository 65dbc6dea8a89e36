use std::fmt;

#[derive(Debug)]
pub enum FoodtruckError {
    InvalidConfig(String),
    Network(String),
    Decode(String),
    Http { status: u16, body: String },
    /// User text lacks a required argument. Displays as the bare reply text.
    MissingParameter(String),
    /// Empty result set. Displays as the bare reply text.
    NotFound(String),
    Telegram(String),
    InvalidAuth,
}

impl fmt::Display for FoodtruckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "config error: {msg}"),
            Self::Network(msg) => write!(f, "network error: {msg}"),
            Self::Decode(msg) => write!(f, "decode error: {msg}"),
            Self::Http { status, body } => write!(f, "http error ({status}): {body}"),
            Self::MissingParameter(msg) => write!(f, "{msg}"),
            Self::NotFound(msg) => write!(f, "{msg}"),
            Self::Telegram(msg) => write!(f, "telegram error: {msg}"),
            Self::InvalidAuth => write!(f, "invalid chat credentials"),
        }
    }
}

impl std::error::Error for FoodtruckError {}

impl From<serde_json::Error> for FoodtruckError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FoodtruckError>;
