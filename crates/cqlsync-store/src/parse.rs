//! Scraping facts out of cqlsh's human-readable output.
//!
//! These depend on the describe output format staying stable; everything
//! here is pure.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use crate::error::{StoreError, StoreResult};

/// Keyspace names in `DESC KEYSPACES` output. A keyspace is present iff its
/// name appears as a whitespace-delimited token.
pub fn parse_keyspace_list(text: &str) -> BTreeSet<String> {
    name_tokens(text)
}

/// Table names in `DESCRIBE TABLES` output for one keyspace.
pub fn parse_table_list(text: &str) -> BTreeSet<String> {
    name_tokens(text)
}

// Quoted (case-sensitive) names keep their quotes so they never match a
// folded unquoted name.
fn name_tokens(text: &str) -> BTreeSet<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Parse the first `{...}` group as a flat map of quoted keys to values.
pub fn parse_brace_map(text: &str) -> StoreResult<BTreeMap<String, String>> {
    let brace_re = Regex::new(r"\{([^}]*)\}").map_err(|e| StoreError::Parse(e.to_string()))?;
    let caps = brace_re
        .captures(text)
        .ok_or_else(|| StoreError::Parse("no {...} group in describe output".to_string()))?;

    let mut map = BTreeMap::new();
    for pair in caps[1].split(',') {
        if pair.trim().is_empty() {
            continue;
        }
        let (key, value) = pair
            .split_once(':')
            .ok_or_else(|| StoreError::Parse(format!("malformed map entry {:?}", pair.trim())))?;
        map.insert(unquote(key), unquote(value));
    }
    Ok(map)
}

fn unquote(s: &str) -> String {
    s.trim().trim_matches(|c: char| c == '\'' || c == '"').to_string()
}

/// The `replication_factor` out of `DESCRIBE KEYSPACE <name>` output.
pub fn parse_replication_factor(text: &str) -> StoreResult<u32> {
    let map = parse_brace_map(text)?;
    let raw = map
        .get("replication_factor")
        .ok_or_else(|| StoreError::Parse("replication_factor not found in replication map".to_string()))?;
    raw.parse::<u32>()
        .map_err(|_| StoreError::Parse(format!("replication_factor {raw:?} is not an integer")))
}
