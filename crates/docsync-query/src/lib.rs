//! # docsync-query
//!
//! Search queries over document indexes, in the shape of relational queries.
//!
//! ## Features
//! - Immutable [`SearchQuery`] builder: filter, contains, OR, keywords,
//!   ordering, slicing, `none()`
//! - Results as documents or as the stored records behind them, in search order
//! - Translation of relational [`RecordQuery`](docsync_storage::RecordQuery)
//!   trees, failing on constructs search cannot express
//! - Search box input sanitizing onto the corpus field

pub mod error;
pub mod keyword;
pub mod predicate;
pub mod search_query;
pub mod translate;

pub use error::QueryError;
pub use keyword::filter_search;
pub use predicate::Predicate;
pub use search_query::{ResultMode, SearchItem, SearchQuery};
pub use translate::record_query_to_search;
