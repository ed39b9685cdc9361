use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;

use crate::error::{LedgerError, Result};
use crate::models::LedgerState;

/// Where the ledger keeps its state between runs.
pub trait LedgerStore {
    /// `Ok(None)` means nothing has been stored yet.
    fn load(&self) -> Result<Option<LedgerState>>;

    /// Replaces the stored state wholesale.
    fn save(&mut self, state: &LedgerState) -> Result<()>;

    fn location(&self) -> String;
}

/// JSON file store. Every save writes a sibling temp file and renames it over
/// the target, so a crash mid-write leaves the previous state intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn write_error(&self, source: io::Error) -> LedgerError {
        LedgerError::StorageWrite {
            path: self.path.clone(),
            source,
        }
    }
}

fn to_pretty_json(state: &LedgerState) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    state.serialize(&mut ser).map_err(LedgerError::Serialize)?;
    Ok(buf)
}

impl LedgerStore for FileStore {
    fn load(&self) -> Result<Option<LedgerState>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(LedgerError::StorageRead {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let state = serde_json::from_str(&contents).map_err(|source| LedgerError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(state))
    }

    fn save(&mut self, state: &LedgerState) -> Result<()> {
        let bytes = to_pretty_json(state)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.write_error(e))?;
        tmp.write_all(&bytes).map_err(|e| self.write_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.write_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.write_error(e.error))?;
        #[cfg(unix)]
        fs::File::open(dir)
            .and_then(|d| d.sync_all())
            .map_err(|e| self.write_error(e))?;

        log::debug!(
            "wrote {} bytes of ledger state to {}",
            bytes.len(),
            self.path.display()
        );
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Keeps state in process memory. Used for isolated ledgers in tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    state: Option<LedgerState>,
    fail_writes: bool,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: LedgerState) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }

    /// Makes every following `save` fail with an I/O error.
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn state(&self) -> Option<&LedgerState> {
        self.state.as_ref()
    }

    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<Option<LedgerState>> {
        Ok(self.state.clone())
    }

    fn save(&mut self, state: &LedgerState) -> Result<()> {
        if self.fail_writes {
            return Err(LedgerError::StorageWrite {
                path: PathBuf::from(self.location()),
                source: io::Error::new(io::ErrorKind::Other, "writes disabled"),
            });
        }
        self.state = Some(state.clone());
        self.saves += 1;
        Ok(())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CandidateSet;
    use crate::hashing::hash_block;
    use crate::ledger::VoteLedger;
    use crate::models::{Block, Tally};
    use tempfile::tempdir;

    fn sample_state() -> LedgerState {
        let votes: Tally = [("NOTA".to_string(), 1)].into_iter().collect();
        LedgerState {
            chain: vec![Block {
                index: 1,
                timestamp: "2024-03-01 10:00:00".to_string(),
                hash: hash_block(&votes, "0"),
                votes,
                previous_hash: "0".to_string(),
            }],
            voters: vec!["ab".to_string()],
        }
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("votes.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn saved_state_reloads_identically() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("votes.json"));
        let state = sample_state();
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), Some(state));
    }

    #[test]
    fn file_uses_four_space_indent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("votes.json");
        let mut store = FileStore::new(&path);
        store.save(&sample_state()).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n    \"chain\": ["));
    }

    #[test]
    fn save_leaves_no_temp_files_behind() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("votes.json"));
        store.save(&sample_state()).unwrap();
        store.save(&sample_state()).unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn malformed_file_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("votes.json");
        fs::write(&path, "{\"chain\": [").unwrap();
        let err = FileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, LedgerError::Corrupt { .. }));
    }

    #[test]
    fn unreadable_file_is_a_read_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("votes.json");
        fs::write(&path, [0xff, 0xfe, 0x7b, 0x7d]).unwrap();

        let err = FileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, LedgerError::StorageRead { .. }));

        let err = VoteLedger::open(FileStore::new(&path), CandidateSet::default()).unwrap_err();
        assert!(matches!(err, LedgerError::StorageRead { .. }));
        assert_eq!(fs::read(&path).unwrap(), vec![0xff, 0xfe, 0x7b, 0x7d]);
    }

    #[test]
    fn directory_in_place_of_file_is_a_read_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("votes.json");
        fs::create_dir(&path).unwrap();

        let err = FileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, LedgerError::StorageRead { .. }));
        let err = VoteLedger::open(FileStore::new(&path), CandidateSet::default()).unwrap_err();
        assert!(matches!(err, LedgerError::StorageRead { .. }));
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("votes.json");
        fs::write(&path, "{}").unwrap();
        let state = FileStore::new(&path).load().unwrap().unwrap();
        assert!(state.chain.is_empty());
        assert!(state.voters.is_empty());
    }

    #[test]
    fn memory_store_can_refuse_writes() {
        let mut store = MemoryStore::new();
        store.fail_writes(true);
        assert!(matches!(
            store.save(&sample_state()),
            Err(LedgerError::StorageWrite { .. })
        ));
        assert!(store.state().is_none());
        assert_eq!(store.saves(), 0);
    }
}
