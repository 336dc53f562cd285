//! Exploratory execution engine.
//!
//! Given a loaded unit, discovers every invocable surface (free functions and
//! instantiable types), synthesizes arguments from declared signatures, calls
//! each target under a wall-clock budget and follows freshly produced
//! instances of the unit's own types, exploring each type at most once.
//!
//! # Architecture
//!
//! - [`synthetic`]: universal stand-in values for parameters without defaults
//! - [`binder`]: builds and validates an argument set for a signature
//! - [`invoker`]: runs one call on a worker thread under a deadline
//! - [`materializer`]: resolves lazy sequences and deferred results
//! - [`explorer`]: the frontier walk that drives the above
//! - [`log`]: append-only execution log with text and JSONL write-through
//!
//! # Example
//!
//! ```
//! use prober_core::{explore, ExecutionLogSink, ExploreConfig};
//! use prober_types::{Parameter, Signature, Unit, Value};
//!
//! let unit = Unit::builder("sample")
//!     .function(
//!         "greet",
//!         Signature::new(vec![Parameter::positional("name").with_default("world")]),
//!         |_ctx, args| Ok(Value::str(format!("hello {}", args.value("name")?.as_str()?))),
//!     )
//!     .build();
//!
//! let mut sink = ExecutionLogSink::in_memory();
//! let summary = explore(&unit, ExploreConfig::default(), &mut sink).unwrap();
//! assert_eq!(summary.successes, 1);
//! ```

pub mod binder;
pub mod config;
pub mod errors;
pub mod explorer;
pub mod invoker;
pub mod log;
pub mod materializer;
pub mod record;
pub mod synthetic;

pub use binder::{bind, Binding, BindingFault};
pub use config::{ExploreConfig, OutputMode, Traversal, DEFAULT_TIMEOUT};
pub use errors::{EnumerationError, ProbeErrorKind, Stage};
pub use explorer::{explore, Explorer, SeenTypes, SessionSummary, TypeId};
pub use invoker::{BoundedInvoker, Call, Invocation, Verdict};
pub use log::{strip_control_chars, ExecutionLog, ExecutionLogSink, LogEntry, LogFormat};
pub use materializer::{materialize, MaterializeError};
pub use record::{ArgumentRecord, ArgumentSource, CallKind, InvocationRecord, Outcome};
pub use synthetic::SyntheticProvider;
