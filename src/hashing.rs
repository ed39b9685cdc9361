use std::fmt::Write;

use sha2::{Digest, Sha256};

use crate::models::Tally;

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// One-way digest of a self-reported voter identifier.
pub fn voter_digest(voter_id: &str) -> String {
    sha256_hex(voter_id)
}

/// Block hash: SHA-256 over the canonical tally followed by the predecessor hash.
pub fn hash_block(votes: &Tally, previous_hash: &str) -> String {
    let mut payload = canonical_votes(votes);
    payload.push_str(previous_hash);
    sha256_hex(&payload)
}

/// Serializes a tally with sorted keys, `", "` between entries and `": "`
/// between key and value. Non-ASCII characters in keys are escaped as `\uXXXX`.
///
/// Existing ledger files were hashed with exactly this layout, so it must not
/// drift towards serde_json's compact form.
pub fn canonical_votes(votes: &Tally) -> String {
    let mut out = String::from("{");
    for (i, (candidate, count)) in votes.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        push_ascii_json_string(&mut out, candidate);
        let _ = write!(out, ": {}", count);
    }
    out.push('}');
    out
}

fn push_ascii_json_string(out: &mut String, value: &str) {
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(out, "\\u{:04x}", unit);
                }
            }
        }
    }
    out.push('"');
}
