//! Internal domain modules for the Linekit core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod changeset;
pub mod error;
pub mod host;
pub mod literals;
pub mod reconciler;
pub mod record;
pub mod reply;
pub mod search;
pub mod settings;
pub mod sqlite_host;
pub mod storage;
pub mod toolkit;
pub mod value;

#[doc(inline)]
pub use changeset::{CreateRequest, ExciseRequest, RecordChanges, SublistChanges, UpdateRequest};
#[doc(inline)]
pub use error::{ErrorKind, LinekitError, Result};
#[doc(inline)]
pub use host::{RecordApi, RowAccessor, SearchApi, SubmitOptions};
#[doc(inline)]
pub use literals::update_literals;
#[doc(inline)]
pub use reconciler::{ReconcileSummary, SublistReconciler};
#[doc(inline)]
pub use record::Record;
#[doc(inline)]
pub use reply::{
    format_exception, format_reply, reply_from_result, ExceptionInfo, Reply, Trace, TraceSource,
};
#[doc(inline)]
pub use search::{
    search_column, search_filter, SearchColumn, SearchFilter, SearchOperator, SearchResult,
    SearchSummary,
};
#[doc(inline)]
pub use settings::{load_settings, save_settings, Settings};
#[doc(inline)]
pub use sqlite_host::SqliteHost;
#[doc(inline)]
pub use storage::Storage;
#[doc(inline)]
pub use toolkit::Toolkit;
#[doc(inline)]
pub use value::{FieldMap, FieldValue, MatchMode};
