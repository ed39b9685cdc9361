//! Hash-chained vote ledger persisted to a single JSON file, with an HTTP
//! surface for casting ballots and reading the tally.

pub mod api;
pub mod chain;
pub mod config;
pub mod error;
pub mod hashing;
pub mod ledger;
pub mod models;
pub mod store;

pub use chain::{verify_chain, ChainFault};
pub use config::{CandidateSet, Config};
pub use error::{ConfigError, LedgerError, Result};
pub use hashing::{hash_block, voter_digest};
pub use ledger::VoteLedger;
pub use models::{Block, LedgerState, Tally};
pub use store::{FileStore, LedgerStore, MemoryStore};
