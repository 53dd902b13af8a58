//! SQL statement with positional parameters.

use std::fmt;

use crate::Value;

const PREVIEW_CHARS: usize = 100;

/// An already-formed SQL string plus its positional parameters.
///
/// The SQL text is passed through to the driver untouched; placeholders
/// follow the backend's native syntax (`?` for SQLite, `$1` for PostgreSQL).
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Parameters in binding order.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// The first 100 characters of the SQL, for log output.
    pub fn preview(&self) -> String {
        self.sql.chars().take(PREVIEW_CHARS).collect()
    }

    /// True if the statement is an `INSERT` or `REPLACE`, including one
    /// introduced by a `WITH` clause.
    pub fn is_insert(&self) -> bool {
        let words = code_words(&self.sql);
        let is_insert_keyword =
            |word: &&str| word.eq_ignore_ascii_case("INSERT") || word.eq_ignore_ascii_case("REPLACE");
        match words.first() {
            Some(first) if first.eq_ignore_ascii_case("WITH") => words.iter().any(is_insert_keyword),
            Some(first) => is_insert_keyword(first),
            None => false,
        }
    }

    /// True if the statement contains a `RETURNING` clause.
    ///
    /// String literals, quoted identifiers and comments are skipped.
    pub fn has_returning_clause(&self) -> bool {
        code_words(&self.sql)
            .iter()
            .any(|word| word.eq_ignore_ascii_case("RETURNING"))
    }
}

/// Identifier-like words of `sql` that lie outside `'...'`, `"..."` and
/// `` `...` `` quotes, `--` line comments and `/* */` block comments.
///
/// A doubled quote inside a literal closes and reopens it, so it needs no
/// special case.
fn code_words(sql: &str) -> Vec<&str> {
    let bytes = sql.as_bytes();
    let mut words = Vec::new();
    let mut word_start = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_alphanumeric() || b == b'_' {
            word_start.get_or_insert(i);
            i += 1;
            continue;
        }
        if let Some(start) = word_start.take() {
            words.push(&sql[start..i]);
        }
        i = match b {
            b'\'' | b'"' | b'`' => sql[i + 1..]
                .find(b as char)
                .map_or(bytes.len(), |end| i + 1 + end + 1),
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                sql[i..].find('\n').map_or(bytes.len(), |end| i + end + 1)
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                sql[i + 2..].find("*/").map_or(bytes.len(), |end| i + 2 + end + 2)
            }
            _ => i + 1,
        };
    }
    if let Some(start) = word_start {
        words.push(&sql[start..]);
    }
    words
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} params)", self.preview(), self.params.len())
    }
}
