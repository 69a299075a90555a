//! # Contexts
//!
//! Concrete [`TransformContext`](crate::context::TransformContext)
//! implementations, one per record shape:
//!
//! | Context              | Record           | Extra path roots        |
//! |----------------------|------------------|-------------------------|
//! | [`ResourceContext`]  | a resource       | none                    |
//! | [`SpanContext`]      | a span           | `resource`, `instrumentation_scope` |
//! | [`DataPointContext`] | a metric point   | `resource`, `instrumentation_scope`, `metric` |
//! | [`LogContext`]       | a log record     | `resource`, `instrumentation_scope` |
//!
//! Paths under `resource` and `instrumentation_scope` resolve the same way
//! in every context that carries them; see [`ResourcePath`] and
//! [`ScopePath`].

pub mod common;
pub mod datapoint;
pub mod log;
pub mod resource;
pub mod span;

pub use common::{ResourceAccess, ResourcePath, ScopeAccess, ScopePath};
pub use datapoint::{DataPointContext, DataPointMut, DataPointPath, DataPointRecord, DataPointRef, MetricPath};
pub use log::{LogContext, LogPath, LogRecordRef};
pub use resource::{ResourceContext, ResourceRecord};
pub use span::{SpanContext, SpanPath, SpanRecord};
