//! Grid sort order: parsing from request parameters and in-memory application.

use std::cmp::Ordering;
use std::fmt;

use dsrows_core::schema::ColumnSchema;
use dsrows_core::types::{field_cmp, FieldValue, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub heading: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            direction: SortDirection::Desc,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            SortDirection::Asc => write!(f, "`{}`", self.heading),
            SortDirection::Desc => write!(f, "`{}` DESC", self.heading),
        }
    }
}

/// Parse `"Name DESC, City"` into sort keys.
///
/// Headings are matched against `columns` (backticks optional); unknown
/// headings are dropped. A trailing `ASC`/`DESC` sets the direction.
pub fn parse_order(raw: &str, columns: &[ColumnSchema]) -> Vec<SortKey> {
    let mut keys = Vec::new();
    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        let (heading, direction) = match token.rsplit_once(char::is_whitespace) {
            Some((h, d)) if d.eq_ignore_ascii_case("desc") => (h, SortDirection::Desc),
            Some((h, d)) if d.eq_ignore_ascii_case("asc") => (h, SortDirection::Asc),
            _ => (token, SortDirection::Asc),
        };
        let heading = heading.trim().trim_matches('`');

        if columns.iter().any(|c| c.heading == heading) {
            keys.push(SortKey {
                heading: heading.to_string(),
                direction,
            });
        } else {
            tracing::debug!(heading, "ignoring sort on unknown column");
        }
    }
    keys
}

/// Stable sort of `rows` by `keys`; ties (and an empty key list) fall back to row id.
pub fn sort_rows(rows: &mut [Row], keys: &[SortKey]) {
    rows.sort_by(|a, b| {
        for key in keys {
            let x = a.get(&key.heading).unwrap_or(&FieldValue::Null);
            let y = b.get(&key.heading).unwrap_or(&FieldValue::Null);
            let ord = match key.direction {
                SortDirection::Asc => field_cmp(x, y),
                SortDirection::Desc => field_cmp(y, x),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.row_id.cmp(&b.row_id)
    });
}
