//! Substring filters for the grid.
//!
//! Supports expressions of the form `heading LIKE 'pattern' [AND ...]`, where
//! `%` matches any run of characters and `_` exactly one.

use std::fmt;

use dsrows_core::config::Collation;
use dsrows_core::types::FieldValue;

use crate::error::FilterParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeClause {
    pub heading: String,
    pub pattern: String,
}

impl LikeClause {
    /// `heading LIKE '%needle%'`
    pub fn contains(heading: impl Into<String>, needle: &str) -> Self {
        Self {
            heading: heading.into(),
            pattern: format!("%{needle}%"),
        }
    }

    pub fn matches(&self, value: &FieldValue, collation: Collation) -> bool {
        value
            .as_text()
            .is_some_and(|text| like_match(&text, &self.pattern, collation))
    }
}

impl fmt::Display for LikeClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} LIKE '{}'", self.heading, self.pattern.replace('\'', "''"))
    }
}

/// Filter part of a grid query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterExpr {
    /// Built from per-column parameters, AND-combined.
    Clauses(Vec<LikeClause>),
    /// Caller supplied override, parsed by the store when executed.
    Raw(String),
}

impl Default for FilterExpr {
    fn default() -> Self {
        FilterExpr::Clauses(Vec::new())
    }
}

impl FilterExpr {
    pub fn is_empty(&self) -> bool {
        match self {
            FilterExpr::Clauses(c) => c.is_empty(),
            FilterExpr::Raw(s) => trim_join_artifacts(s).is_empty(),
        }
    }

    /// Clauses to evaluate, parsing a raw override if needed.
    pub fn resolve(&self) -> Result<Vec<LikeClause>, FilterParseError> {
        match self {
            FilterExpr::Clauses(c) => Ok(c.clone()),
            FilterExpr::Raw(s) => parse_filter(s),
        }
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterExpr::Clauses(clauses) => {
                for (i, clause) in clauses.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" AND ")?;
                    }
                    write!(f, "{clause}")?;
                }
                Ok(())
            }
            FilterExpr::Raw(s) => f.write_str(trim_join_artifacts(s)),
        }
    }
}

fn is_and_at(bytes: &[u8], i: usize) -> bool {
    bytes.len() >= i + 3
        && bytes[i..i + 3].eq_ignore_ascii_case(b"AND")
        && (i == 0 || bytes[i - 1].is_ascii_whitespace())
        && bytes.get(i + 3).map_or(true, |b| b.is_ascii_whitespace())
}

/// Strip leading and trailing `AND` keywords (and whitespace) left over from
/// clause concatenation. Headings that merely contain the letters are untouched.
pub fn trim_join_artifacts(s: &str) -> &str {
    let mut s = s.trim();
    loop {
        let before = s.len();
        if is_and_at(s.as_bytes(), 0) {
            s = s[3..].trim_start();
        }
        if s.len() >= 3 && is_and_at(s.as_bytes(), s.len() - 3) {
            s = s[..s.len() - 3].trim_end();
        }
        if s.len() == before {
            return s;
        }
    }
}

/// Parse `a LIKE '%x%' AND b LIKE 'y%'` into clauses. Empty input is no clauses.
pub fn parse_filter(expr: &str) -> Result<Vec<LikeClause>, FilterParseError> {
    let expr = trim_join_artifacts(expr);
    if expr.is_empty() {
        return Ok(Vec::new());
    }

    let bytes = expr.as_bytes();
    let mut parts = Vec::new();
    let mut in_quote = false;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            in_quote = !in_quote;
        } else if !in_quote && is_and_at(bytes, i) {
            parts.push(&expr[start..i]);
            start = i + 3;
            i += 3;
            continue;
        }
        i += 1;
    }
    if in_quote {
        return Err(FilterParseError::Unterminated(expr.to_string()));
    }
    parts.push(&expr[start..]);

    parts.into_iter().map(parse_clause).collect()
}

fn parse_clause(part: &str) -> Result<LikeClause, FilterParseError> {
    let part = part.trim();
    let upper = part.to_ascii_uppercase();
    let pos = upper
        .find(" LIKE ")
        .ok_or_else(|| FilterParseError::Clause(part.to_string()))?;

    let heading = part[..pos].trim().trim_matches('`').trim();
    let literal = part[pos + " LIKE ".len()..].trim();
    if heading.is_empty() {
        return Err(FilterParseError::Clause(part.to_string()));
    }
    if literal.len() < 2 || !literal.starts_with('\'') || !literal.ends_with('\'') {
        return Err(FilterParseError::Clause(part.to_string()));
    }

    Ok(LikeClause {
        heading: heading.to_string(),
        pattern: literal[1..literal.len() - 1].replace("''", "'"),
    })
}

/// SQL LIKE matching with `%` and `_` wildcards.
pub fn like_match(text: &str, pattern: &str, collation: Collation) -> bool {
    let (t, p): (Vec<char>, Vec<char>) = match collation {
        Collation::CaseSensitive => (text.chars().collect(), pattern.chars().collect()),
        Collation::CaseInsensitive => (
            text.to_lowercase().chars().collect(),
            pattern.to_lowercase().chars().collect(),
        ),
    };

    let (mut ti, mut pi) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut mark = 0usize;
    while ti < t.len() {
        if pi < p.len() && p[pi] == '%' {
            star = Some(pi);
            mark = ti;
            pi += 1;
        } else if pi < p.len() && (p[pi] == '_' || p[pi] == t[ti]) {
            ti += 1;
            pi += 1;
        } else if let Some(s) = star {
            // Let the last % absorb one more character.
            pi = s + 1;
            mark += 1;
            ti = mark;
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '%' {
        pi += 1;
    }
    pi == p.len()
}
