use std::collections::HashSet;

use crate::chain::verify_chain;
use crate::config::CandidateSet;
use crate::error::{LedgerError, Result};
use crate::hashing::{hash_block, voter_digest};
use crate::models::{
    Block, CandidateCount, LedgerState, Tally, GENESIS_PREVIOUS_HASH, TIMESTAMP_FORMAT,
};
use crate::store::LedgerStore;

/// Append-only chain of cumulative tallies plus the digests of everyone who
/// has voted. Every accepted vote is written through to the store before it
/// is reported as accepted.
///
/// Not synchronized; callers sharing a ledger must hold a lock around it.
#[derive(Debug)]
pub struct VoteLedger<S> {
    chain: Vec<Block>,
    voters: HashSet<String>,
    candidates: CandidateSet,
    store: S,
}

fn now() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

impl<S: LedgerStore> VoteLedger<S> {
    /// Loads stored state, verifying the chain, or writes a fresh genesis
    /// block when the store is empty.
    pub fn open(store: S, candidates: CandidateSet) -> Result<Self> {
        let stored = store.load()?;
        let first_run = stored.is_none();
        let LedgerState { chain, voters } = stored.unwrap_or_default();

        if let Err(fault) = verify_chain(&chain) {
            log::debug!("refusing ledger at {}: {}", store.location(), fault);
            return Err(fault.into());
        }

        let mut ledger = Self {
            chain,
            voters: voters.into_iter().collect(),
            candidates,
            store,
        };

        if ledger.chain.is_empty() {
            if first_run {
                log::info!("no ledger at {}, starting a new chain", ledger.store.location());
            }
            ledger.append_genesis()?;
        }

        let cast = ledger
            .latest_tally()
            .values()
            .try_fold(0u64, |total, n| total.checked_add(*n));
        match cast {
            Some(cast) if cast == ledger.voters.len() as u64 => {}
            Some(cast) => log::warn!(
                "ledger at {} records {} votes but {} voters",
                ledger.store.location(),
                cast,
                ledger.voters.len()
            ),
            None => log::warn!(
                "ledger at {} records more votes than a u64 can count",
                ledger.store.location()
            ),
        }

        log::info!(
            "ledger ready: {} blocks, {} voters, store {}",
            ledger.height(),
            ledger.voters.len(),
            ledger.store.location()
        );
        Ok(ledger)
    }

    fn append_genesis(&mut self) -> Result<()> {
        let genesis = self.next_block(Tally::new());
        self.chain.push(genesis);
        if let Err(err) = self.persist() {
            self.chain.pop();
            return Err(err);
        }
        Ok(())
    }

    fn next_block(&self, votes: Tally) -> Block {
        let previous_hash = self
            .chain
            .last()
            .map(|b| b.hash.clone())
            .unwrap_or_else(|| GENESIS_PREVIOUS_HASH.to_string());
        Block {
            index: self.chain.len() as u64 + 1,
            timestamp: now(),
            hash: hash_block(&votes, &previous_hash),
            votes,
            previous_hash,
        }
    }

    fn snapshot(&self) -> LedgerState {
        let mut voters: Vec<String> = self.voters.iter().cloned().collect();
        voters.sort();
        LedgerState {
            chain: self.chain.clone(),
            voters,
        }
    }

    fn persist(&mut self) -> Result<()> {
        let state = self.snapshot();
        self.store.save(&state)
    }

    /// Records one ballot. Fails without touching state if the voter has
    /// already voted, the identifier is blank, the candidate is unknown or its
    /// count is already at `u64::MAX`.
    /// A failed write rolls the in-memory append back.
    pub fn cast_vote(&mut self, voter_id: &str, candidate: &str) -> Result<Block> {
        if voter_id.trim().is_empty() {
            return Err(LedgerError::MissingIdentifier);
        }
        if !self.candidates.contains(candidate) {
            return Err(LedgerError::UnknownCandidate(candidate.to_string()));
        }

        let digest = voter_digest(voter_id);
        if self.voters.contains(&digest) {
            log::info!("rejected repeat ballot from voter {}", &digest[..12]);
            return Err(LedgerError::DuplicateVote);
        }

        let mut votes = self.latest_tally();
        let count = votes.entry(candidate.to_string()).or_insert(0);
        *count = count
            .checked_add(1)
            .ok_or_else(|| LedgerError::TallyOverflow(candidate.to_string()))?;
        let block = self.next_block(votes);

        self.chain.push(block.clone());
        self.voters.insert(digest.clone());
        if let Err(err) = self.persist() {
            self.chain.pop();
            self.voters.remove(&digest);
            log::error!("vote for {} rolled back: {}", candidate, err);
            return Err(err);
        }

        log::info!("block {} appended with a vote for {}", block.index, candidate);
        Ok(block)
    }

    pub fn latest_tally(&self) -> Tally {
        self.chain
            .last()
            .map(|b| b.votes.clone())
            .unwrap_or_default()
    }

    /// Latest counts for every configured candidate in display order, zero
    /// when nobody has voted for them yet. Names present in the chain but no
    /// longer configured are kept at the end.
    pub fn tally_view(&self) -> Vec<CandidateCount> {
        let tally = self.latest_tally();
        let mut view: Vec<CandidateCount> = self
            .candidates
            .iter()
            .map(|c| CandidateCount {
                candidate: c.to_string(),
                votes: tally.get(c).copied().unwrap_or(0),
            })
            .collect();
        view.extend(
            tally
                .iter()
                .filter(|(c, _)| !self.candidates.contains(c))
                .map(|(c, n)| CandidateCount {
                    candidate: c.clone(),
                    votes: *n,
                }),
        );
        view
    }

    pub fn has_voted(&self, digest: &str) -> bool {
        self.voters.contains(digest)
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn height(&self) -> usize {
        self.chain.len()
    }

    pub fn voter_count(&self) -> usize {
        self.voters.len()
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}
