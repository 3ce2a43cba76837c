//! GridQuerySpec builder.
//!
//! Turns filter, sort and paging parameters into a normalized query that a
//! row store executes. Building never fails: absent or malformed input means
//! no filter, no sort, or no limit.

use dsrows_core::config::Collation;
use dsrows_core::schema::{ColumnSchema, ValueKind};

use crate::filter::{FilterExpr, LikeClause};
use crate::sanitize::{sanitize_string, RawParams};
use crate::sort::{parse_order, SortKey};

/// Parameter holding an explicit filter that replaces the per-column one.
pub const FILTER_OVERRIDE_PARAM: &str = "filter";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GridQuerySpec {
    pub filter: FilterExpr,
    /// Empty means store default order.
    pub sort: Vec<SortKey>,
    pub offset: usize,
    /// `None` means no limit.
    pub limit: Option<usize>,
    pub collation: Collation,
}

#[derive(Debug, Clone, Default)]
pub struct SortParams {
    /// Comma separated `heading [ASC|DESC]` list.
    pub order: Option<String>,
}

impl SortParams {
    pub fn from_params(params: &RawParams) -> Self {
        Self {
            order: params.get("order").cloned(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PagingParams {
    pub start: Option<String>,
    pub length: Option<String>,
}

impl PagingParams {
    pub fn from_params(params: &RawParams) -> Self {
        Self {
            start: params.get("start").cloned(),
            length: params.get("length").cloned(),
        }
    }

    /// Offset; anything but a non-negative integer is 0.
    pub fn offset(&self) -> usize {
        self.start
            .as_deref()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(0)
    }

    /// Limit; negative (`-1` means "all"), zero or unparseable is no limit.
    pub fn limit(&self) -> Option<usize> {
        self.length
            .as_deref()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GridQueryBuilder {
    collation: Collation,
}

impl GridQueryBuilder {
    pub fn new(collation: Collation) -> Self {
        Self { collation }
    }

    pub fn build(
        &self,
        columns: &[ColumnSchema],
        filter_params: &RawParams,
        sort: &SortParams,
        paging: &PagingParams,
    ) -> GridQuerySpec {
        let filter = match filter_params.get(FILTER_OVERRIDE_PARAM) {
            // Last writer wins: the override replaces the constructed filter.
            Some(raw) => FilterExpr::Raw(raw.clone()),
            None => FilterExpr::Clauses(Self::column_clauses(columns, filter_params)),
        };

        let sort = sort
            .order
            .as_deref()
            .map(|raw| parse_order(raw, columns))
            .unwrap_or_default();

        GridQuerySpec {
            filter,
            sort,
            offset: paging.offset(),
            limit: paging.limit(),
            collation: self.collation,
        }
    }

    /// Convenience for callers holding one merged parameter bag.
    pub fn build_from_params(&self, columns: &[ColumnSchema], params: &RawParams) -> GridQuerySpec {
        self.build(
            columns,
            params,
            &SortParams::from_params(params),
            &PagingParams::from_params(params),
        )
    }

    fn column_clauses(columns: &[ColumnSchema], params: &RawParams) -> Vec<LikeClause> {
        columns
            .iter()
            .filter(|c| c.is_value() && c.value_kind == ValueKind::String)
            .filter_map(|c| {
                let needle = sanitize_string(params.get(&c.heading)?);
                (!needle.is_empty()).then(|| LikeClause::contains(c.heading.clone(), &needle))
            })
            .collect()
    }
}
