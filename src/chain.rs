use thiserror::Error;

use crate::hashing::hash_block;
use crate::models::{Block, GENESIS_PREVIOUS_HASH};

/// First inconsistency found while re-walking a chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainFault {
    #[error("block at position {position} has index {found}, expected {expected}")]
    IndexGap {
        position: usize,
        expected: u64,
        found: u64,
    },

    #[error("genesis block has previous hash {found:?}, expected \"0\"")]
    GenesisLink { found: String },

    #[error("block {index} does not link to its predecessor")]
    BrokenLink { index: u64 },

    #[error("block {index} stores hash {stored} but its content hashes to {computed}")]
    HashMismatch {
        index: u64,
        stored: String,
        computed: String,
    },
}

/// Recomputes every block hash and checks each predecessor link.
///
/// An empty chain is valid; it only occurs before genesis is written.
pub fn verify_chain(chain: &[Block]) -> Result<(), ChainFault> {
    chain
        .iter()
        .enumerate()
        .try_fold(None::<&Block>, |previous, (position, block)| {
            let expected = position as u64 + 1;
            if block.index != expected {
                return Err(ChainFault::IndexGap {
                    position,
                    expected,
                    found: block.index,
                });
            }

            if block.is_genesis() {
                if block.previous_hash != GENESIS_PREVIOUS_HASH {
                    return Err(ChainFault::GenesisLink {
                        found: block.previous_hash.clone(),
                    });
                }
            } else if previous.map_or(true, |prev| block.previous_hash != prev.hash) {
                return Err(ChainFault::BrokenLink { index: block.index });
            }

            let computed = hash_block(&block.votes, &block.previous_hash);
            if computed != block.hash {
                return Err(ChainFault::HashMismatch {
                    index: block.index,
                    stored: block.hash.clone(),
                    computed,
                });
            }

            Ok(Some(block))
        })
        .map(|_| ())
}
