use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

mod scanner;

use scanner::{State, is_placeholder_start, scan_key_end};

/// Errors produced while substituting `$(key)` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A `$(` was opened at byte offset `position` but never closed.
    #[error("unclosed substitution at position {position}")]
    UnclosedSubstitution { position: usize },

    /// Values were supplied for keys that never appear as a placeholder.
    #[error("placeholder missing for {}", .keys.join(","))]
    UnusedValue { keys: Vec<String> },

    /// Placeholders appear in the statement without a supplied value.
    #[error("key/value missing for {}", .keys.join(","))]
    UnresolvedPlaceholder { keys: Vec<String> },
}

/// Substitute `$(key)` placeholders in `statement` using alternating key/value pairs.
///
/// Placeholders inside a quoted part of the statement (`'...'`, `"..."` or `` `...` ``) are
/// left untouched. A trailing key without a value is ignored. Escaped quotes within a quoted
/// part are not recognized.
///
/// Prefer bind parameters (`?`) wherever the server accepts them. This is meant for the parts
/// it does not, such as schema or table names chosen at runtime.
///
/// ```rust
/// use mysql_middleware::prelude::*;
///
/// let sql = substitute(
///     "SELECT 1 AS $(tblName)_value FROM $(tblName)",
///     &["tblName", "t1"],
/// )?;
/// assert_eq!(sql, "SELECT 1 AS t1_value FROM t1");
/// # Ok::<(), TemplateError>(())
/// ```
///
/// # Errors
///
/// Returns [`TemplateError::UnclosedSubstitution`] when a placeholder lacks its `)`,
/// [`TemplateError::UnusedValue`] when a supplied key is never referenced, and
/// [`TemplateError::UnresolvedPlaceholder`] when a referenced key has no value. The
/// unused-value check runs first.
pub fn substitute<S: AsRef<str>>(
    statement: &str,
    key_value_pairs: &[S],
) -> Result<String, TemplateError> {
    let values: HashMap<&str, &str> = key_value_pairs
        .chunks_exact(2)
        .map(|pair| (pair[0].as_ref(), pair[1].as_ref()))
        .collect();

    let bytes = statement.as_bytes();
    let mut out = String::with_capacity(statement.len());
    let mut state = State::Normal;
    let mut substituted: BTreeSet<&str> = BTreeSet::new();
    let mut not_provided: BTreeSet<&str> = BTreeSet::new();
    // start of the verbatim run not yet written to `out`
    let mut copied = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        if state.step(bytes[idx]) {
            idx += 1;
            continue;
        }

        if state == State::Normal && is_placeholder_start(bytes, idx) {
            let key_start = idx + 2;
            let key_end = scan_key_end(bytes, key_start)
                .ok_or(TemplateError::UnclosedSubstitution { position: idx })?;

            out.push_str(&statement[copied..idx]);
            let key = &statement[key_start..key_end];
            if let Some(value) = values.get(key) {
                out.push_str(value);
                substituted.insert(key);
            } else {
                not_provided.insert(key);
            }

            idx = key_end + 1;
            copied = idx;
            continue;
        }

        idx += 1;
    }
    out.push_str(&statement[copied..]);

    if values.len() != substituted.len() {
        let mut keys: Vec<String> = values
            .keys()
            .filter(|key| !substituted.contains(*key))
            .map(ToString::to_string)
            .collect();
        keys.sort();
        return Err(TemplateError::UnusedValue { keys });
    }

    if !not_provided.is_empty() {
        return Err(TemplateError::UnresolvedPlaceholder {
            keys: not_provided.into_iter().map(ToString::to_string).collect(),
        });
    }

    Ok(out)
}

/// Same as [`substitute`] but panics instead of returning an error.
///
/// Use only when the statement is a constant known to be correct.
///
/// # Panics
///
/// Panics with the [`TemplateError`] message whenever [`substitute`] would fail.
#[must_use]
#[track_caller]
pub fn must_substitute<S: AsRef<str>>(statement: &str, key_value_pairs: &[S]) -> String {
    match substitute(statement, key_value_pairs) {
        Ok(sql) => sql,
        Err(err) => panic!("{err}"),
    }
}
