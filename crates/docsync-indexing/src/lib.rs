//! Index synchronization for docsync.
//!
//! This crate keeps document indexes in step with the record store.
//!
//! ## Key Components
//!
//! - [`Binder`]: attaches record types to document schemas and exposes
//!   [`SearchQuery`](docsync_query::SearchQuery) construction per type
//! - [`BindingRegistry`]: which schema each record type is bound to, and where
//! - [`IndexListener`] / [`UnindexListener`]: post-save upsert and pre-delete removal
//! - [`IndexingContext`]: scoped, nestable suspension of index writes
//! - [`reindex`], [`purge_index`], [`remove_orphaned_documents`]: maintenance
//! - [`init_tracing`]: subscriber setup from [`Settings`](docsync_types::Settings)
//!
//! ## Example
//!
//! ```ignore
//! use docsync_indexing::Binder;
//!
//! let binder = Binder::new(storage.clone(), service);
//! binder.attach("book", book_schema, None)?;
//!
//! storage.create("book", values)?; // indexed
//! let hits = binder.search_query("book")?.filter("title", "Dune")?.count()?;
//! ```

pub mod binder;
pub mod error;
pub mod listener;
pub mod logging;
pub mod maintenance;
pub mod registry;
pub mod suspend;

pub use binder::Binder;
pub use error::IndexingError;
pub use listener::{IndexListener, UnindexListener};
pub use logging::init_tracing;
pub use maintenance::{
    purge_index, reindex, remove_orphaned_documents, MaintenanceConfig, MaintenanceReport,
};
pub use registry::{binding_id, default_index_name, Binding, BindingRegistry};
pub use suspend::{IndexingContext, SuspendGuard};
