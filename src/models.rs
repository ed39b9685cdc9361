use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Candidate name to cumulative vote count. Ordered so iteration is stable.
pub type Tally = BTreeMap<String, u64>;

/// Predecessor hash carried by the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Format used for the informational block timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub index: u64,
    pub timestamp: String,
    pub votes: Tally,
    pub previous_hash: String,
    pub hash: String,
}

impl Block {
    pub fn is_genesis(&self) -> bool {
        self.index == 1
    }
}

/// Everything that is written to storage: the chain plus the voter digests.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerState {
    #[serde(default)]
    pub chain: Vec<Block>,
    #[serde(default)]
    pub voters: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CandidateCount {
    pub candidate: String,
    pub votes: u64,
}
