use std::env;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::ConfigError;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 10040;
pub const DEFAULT_LEDGER_PATH: &str = "votes.json";
pub const DEFAULT_CANDIDATES: [&str; 4] = ["BJP", "Shiv Sena", "NCP", "NOTA"];

/// The fixed list of candidates a ballot may name, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CandidateSet(Vec<String>);

impl CandidateSet {
    pub fn new<I, T>(names: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut candidates: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if candidates.contains(&name) {
                return Err(ConfigError::DuplicateCandidate(name));
            }
            candidates.push(name);
        }
        if candidates.is_empty() {
            return Err(ConfigError::NoCandidates);
        }
        Ok(Self(candidates))
    }

    /// Comma separated list; blank entries are skipped.
    pub fn parse(list: &str) -> Result<Self, ConfigError> {
        Self::new(list.split(',').map(str::trim).filter(|s| !s.is_empty()))
    }

    pub fn contains(&self, candidate: &str) -> bool {
        self.0.iter().any(|c| c == candidate)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for CandidateSet {
    fn default() -> Self {
        Self(DEFAULT_CANDIDATES.iter().map(|c| c.to_string()).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub ledger_path: PathBuf,
    pub candidates: CandidateSet,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            ledger_path: PathBuf::from(DEFAULT_LEDGER_PATH),
            candidates: CandidateSet::default(),
        }
    }
}

impl Config {
    /// Reads `SERVER_HOST`, `SERVER_PORT`, `LEDGER_PATH` and `LEDGER_CANDIDATES`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(host) = lookup("SERVER_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            config.port = port.trim().parse::<u16>().map_err(|_| ConfigError::InvalidPort {
                name: "SERVER_PORT",
                value: port.clone(),
            })?;
        }
        if let Some(path) = lookup("LEDGER_PATH") {
            config.ledger_path = PathBuf::from(path);
        }
        if let Some(list) = lookup("LEDGER_CANDIDATES") {
            config.candidates = CandidateSet::parse(&list)?;
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(
            config.candidates.iter().collect::<Vec<_>>(),
            vec!["BJP", "Shiv Sena", "NCP", "NOTA"]
        );
    }

    #[test]
    fn overrides_are_read() {
        let config = Config::from_lookup(lookup_from(&[
            ("SERVER_HOST", "0.0.0.0"),
            ("SERVER_PORT", "9095"),
            ("LEDGER_PATH", "/tmp/ledger.json"),
            ("LEDGER_CANDIDATES", " Red , Blue,, Green "),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr(), ("0.0.0.0", 9095));
        assert_eq!(config.ledger_path, PathBuf::from("/tmp/ledger.json"));
        assert_eq!(
            config.candidates.iter().collect::<Vec<_>>(),
            vec!["Red", "Blue", "Green"]
        );
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("SERVER_PORT", "99999")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidPort {
                name: "SERVER_PORT",
                value: "99999".to_string()
            }
        );
    }

    #[test]
    fn candidate_lists_must_be_unique_and_non_empty() {
        assert_eq!(CandidateSet::parse(" , "), Err(ConfigError::NoCandidates));
        assert_eq!(
            CandidateSet::parse("A,B,A"),
            Err(ConfigError::DuplicateCandidate("A".to_string()))
        );
    }
}
