use thiserror::Error;

use crate::brief::BriefStatus;

pub type Result<T> = std::result::Result<T, BriefError>;

#[derive(Debug, Error)]
pub enum BriefError {
    #[error("Brief {0} not found")]
    NotFound(String),

    #[error("Brief generation failed: {0}")]
    Generation(String),

    #[error("Brief {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: BriefStatus,
        to: BriefStatus,
    },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BriefError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BriefError::NotFound(_))
    }
}
