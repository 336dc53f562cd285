//! Shared types for the package-prober workspace.
//!
//! This crate holds the data model handed between a loader and the
//! exploration engine:
//!
//! - [`Value`] and its dynamic shapes ([`Synthetic`], [`Instance`],
//!   [`LazySeq`], [`AsyncSeq`], [`Deferred`])
//! - [`Signature`], [`Parameter`] and argument binding
//! - [`Unit`], [`Member`], [`Function`], [`TypeDef`], [`Method`]
//! - [`Fault`] and the per-call [`CallContext`]

pub mod context;
pub mod env_utils;
pub mod fault;
pub mod signature;
pub mod synthetic;
pub mod unit;
pub mod value;

pub use context::{Alarm, CallContext};
pub use env_utils::{env_bool, env_string, env_var, env_var_or};
pub use fault::{Fault, EXIT_KIND, INTERRUPTED_KIND, PANIC_KIND};
pub use signature::{ArgumentSet, BindError, BoundArguments, ParamKind, Parameter, Signature};
pub use synthetic::Synthetic;
pub use unit::{
    ConstructorFn, EnumerationError, Function, Member, MemberSource, Method, MethodFn, NativeFn,
    TypeBuilder, TypeDef, TypeKey, Unit, UnitBuilder,
};
pub use value::{AsyncSeq, Deferred, Instance, LazySeq, Value};
