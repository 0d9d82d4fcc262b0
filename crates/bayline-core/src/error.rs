use thiserror::Error;

#[derive(Debug, Error)]
pub enum BaylineError {
    #[error("bay not found: {0}")]
    BayNotFound(String),

    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("invalid session status: {0}")]
    InvalidStatus(String),

    #[error("invalid membership tier: {0}")]
    InvalidTier(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, BaylineError>;
