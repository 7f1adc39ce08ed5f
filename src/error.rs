use crate::tree::NodeId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NavigatorError>;

#[derive(Debug, Error)]
pub enum NavigatorError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid move: {0}")]
    InvalidMove(String),

    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Error: {0}")]
    Generic(String),
}

impl NavigatorError {
    pub fn status(&self) -> Option<u16> {
        match self {
            NavigatorError::Http { status, .. } => Some(*status),
            NavigatorError::Transport(e) => e.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// Short text shown next to the control that triggered the failure
    pub fn user_message(&self) -> String {
        match self.status() {
            Some(401) => "No access: please sign in again".to_string(),
            Some(403) => "Insufficient rights for this action".to_string(),
            Some(404) => "Not found: it may have been removed".to_string(),
            Some(status) if (500..600).contains(&status) => {
                "Server error, please try again later".to_string()
            }
            _ => match self {
                NavigatorError::Http { message, .. } => message.clone(),
                NavigatorError::InvalidMove(message) | NavigatorError::Generic(message) => {
                    message.clone()
                }
                other => other.to_string(),
            },
        }
    }
}

impl From<toml::de::Error> for NavigatorError {
    fn from(error: toml::de::Error) -> Self {
        NavigatorError::Config(error.to_string())
    }
}

impl From<String> for NavigatorError {
    fn from(error: String) -> Self {
        NavigatorError::Generic(error)
    }
}

impl From<&str> for NavigatorError {
    fn from(error: &str) -> Self {
        NavigatorError::Generic(error.to_string())
    }
}
