#![forbid(unsafe_code)]
//! dsrows-operators: request-to-spec transformations.
//!
//! Design intent:
//! - Keep this crate pure and synchronous; nothing here touches storage.
//! - `codec` turns untyped request parameters into typed rows.
//! - `grid` turns filter/sort/paging parameters into a `GridQuerySpec`
//!   that any store can execute (see `filter` and `sort` for the pieces).

pub mod codec;
pub mod dates;
pub mod error;
pub mod filter;
pub mod grid;
pub mod sanitize;
pub mod sort;

pub use codec::RowCodec;
pub use dates::DateService;
pub use error::{CodecError, FilterParseError};
pub use filter::{FilterExpr, LikeClause};
pub use grid::{GridQueryBuilder, GridQuerySpec, PagingParams, SortParams};
pub use sanitize::{parse_lenient, RawParams, Sanitizer};
pub use sort::{SortDirection, SortKey};
