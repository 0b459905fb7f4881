//! Identifier and type checks applied before anything is interpolated
//! into a CQL statement.
//!
//! Names are inserted verbatim into DDL text, so only plain unquoted CQL
//! identifiers are accepted: an ASCII letter or underscore followed by
//! letters, digits, or underscores.

/// Longest identifier Cassandra accepts for keyspace and table names.
pub const MAX_IDENTIFIER_LEN: usize = 48;

/// Whether `name` is a plain unquoted CQL identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// The name the store records for an unquoted identifier. Unquoted names
/// are case-insensitive and kept lower-cased, so `Pluto` is listed as
/// `pluto`.
pub fn fold_identifier(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Check an identifier, pushing a described problem onto `problems`.
pub fn check_identifier(kind: &str, name: &str, problems: &mut Vec<String>) {
    if name.is_empty() {
        problems.push(format!("{kind} name is empty"));
    } else if !is_identifier(name) {
        problems.push(format!(
            "{kind} name {name:?} is not a plain identifier (letters, digits, underscore)"
        ));
    } else if name.len() > MAX_IDENTIFIER_LEN {
        problems.push(format!(
            "{kind} name {name:?} is longer than {MAX_IDENTIFIER_LEN} characters"
        ));
    }
}

/// Whether `ty` looks like a CQL column type: `text`, `map<text, int>`,
/// `frozen<list<uuid>>` and so on. Brackets must balance.
pub fn is_cql_type(ty: &str) -> bool {
    let ty = ty.trim();
    if !ty.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return false;
    }

    let mut depth: i32 = 0;
    for c in ty.chars() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            ',' | ' ' => {
                if depth == 0 {
                    return false;
                }
            }
            c if c.is_ascii_alphanumeric() || c == '_' => {}
            _ => return false,
        }
    }
    depth == 0
}
