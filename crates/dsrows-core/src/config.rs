//! Service configuration that downstream crates can serialize/deserialize.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How substring filters compare text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Collation {
    CaseSensitive,
    #[default]
    CaseInsensitive,
}

impl Collation {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cs" | "case-sensitive" | "binary" => Ok(Collation::CaseSensitive),
            "ci" | "case-insensitive" => Ok(Collation::CaseInsensitive),
            other => Err(Error::Config(format!("unknown collation '{other}'"))),
        }
    }
}

impl fmt::Display for Collation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collation::CaseSensitive => f.write_str("cs"),
            Collation::CaseInsensitive => f.write_str("ci"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Root directory of the filesystem dataset store.
    pub data_dir: String,

    /// Collation applied to grid substring filters.
    pub collation: Collation,

    /// Fixed offset of the local timezone in minutes east of UTC.
    /// `None` uses the host's local offset.
    pub tz_offset_minutes: Option<i32>,

    /// Page size used when a grid request carries no `length`.
    pub default_page_size: Option<usize>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: "/tmp/dsrows".to_string(),
            collation: Collation::default(),
            tz_offset_minutes: None,
            default_page_size: None,
        }
    }
}

impl ServiceConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `DSROWS_DATA_DIR`: filesystem store root
    /// - `DSROWS_COLLATION`: `ci` or `cs`
    /// - `DSROWS_TZ_OFFSET_MINUTES`: local timezone offset in minutes
    /// - `DSROWS_DEFAULT_PAGE_SIZE`: grid page size when none is requested
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("DSROWS_DATA_DIR") {
            cfg.data_dir = s;
        }

        if let Ok(s) = std::env::var("DSROWS_COLLATION") {
            if let Ok(c) = Collation::parse(&s) {
                cfg.collation = c;
            }
        }

        if let Ok(s) = std::env::var("DSROWS_TZ_OFFSET_MINUTES") {
            if let Ok(v) = s.trim().parse::<i32>() {
                cfg.tz_offset_minutes = Some(v);
            }
        }

        if let Ok(s) = std::env::var("DSROWS_DEFAULT_PAGE_SIZE") {
            if let Ok(v) = s.trim().parse::<usize>() {
                cfg.default_page_size = Some(v);
            }
        }

        cfg
    }

    /// Reject offsets chrono cannot represent (more than a day either way).
    pub fn validate(&self) -> Result<()> {
        if let Some(m) = self.tz_offset_minutes {
            if m.unsigned_abs() >= 24 * 60 {
                return Err(Error::Config(format!(
                    "timezone offset {m} minutes is out of range"
                )));
            }
        }
        if self.data_dir.trim().is_empty() {
            return Err(Error::Config("data_dir must not be empty".into()));
        }
        Ok(())
    }
}
