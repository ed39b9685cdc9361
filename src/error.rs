use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::chain::ChainFault;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("this voter has already cast a ballot")]
    DuplicateVote,

    #[error("a voter identifier is required")]
    MissingIdentifier,

    #[error("unknown candidate {0:?}")]
    UnknownCandidate(String),

    #[error("vote count for {0:?} cannot grow any further")]
    TallyOverflow(String),

    #[error("failed to read ledger state from {path}: {source}")]
    StorageRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("ledger state in {path} is malformed: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("stored chain failed verification: {0}")]
    Tampered(#[from] ChainFault),

    #[error("failed to write ledger state to {path}: {source}")]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize ledger state: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl LedgerError {
    /// Errors caused by the ballot itself rather than by storage.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            LedgerError::DuplicateVote
                | LedgerError::MissingIdentifier
                | LedgerError::UnknownCandidate(_)
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a valid u16, got {value:?}")]
    InvalidPort { name: &'static str, value: String },

    #[error("at least one candidate must be configured")]
    NoCandidates,

    #[error("candidate {0:?} is listed more than once")]
    DuplicateCandidate(String),
}
