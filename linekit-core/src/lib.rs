//! Core library for Linekit: record, field and sublist batch editing over a
//! host record platform.
//!
//! The centerpiece is [`SublistReconciler`], which applies a declarative
//! [`SublistChanges`] (creations, updates, excisions) to one sublist of a
//! record through an injected [`RowAccessor`]. [`Toolkit`] wraps a host and
//! [`Settings`] with one-call helpers, and [`SqliteHost`] is a bundled host
//! that keeps records in a local SQLite file.
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use self::core::{
    changeset::{CreateRequest, ExciseRequest, RecordChanges, SublistChanges, UpdateRequest},
    error::{ErrorKind, LinekitError, Result, LINE_ITEM_MATCH_MESSAGE, MALFORMED_DATA_MESSAGE},
    host::{RecordApi, RowAccessor, SearchApi, SubmitOptions},
    literals::update_literals,
    reconciler::{ReconcileSummary, SublistReconciler},
    record::Record,
    reply::{
        format_exception, format_reply, reply_from_result, ExceptionInfo, Reply, Trace,
        TraceSource,
    },
    search::{
        project_rows, search_column, search_filter, SearchColumn, SearchFilter, SearchOperator,
        SearchResult, SearchSummary, INTERNAL_ID_FIELD,
    },
    settings::{load_settings, save_settings, Settings},
    sqlite_host::{SqliteHost, CREATED_FROM_FIELD},
    storage::Storage,
    toolkit::Toolkit,
    value::{FieldMap, FieldValue, MatchMode},
};
