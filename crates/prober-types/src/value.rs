//! Dynamic values exchanged with code under test.
//!
//! [`Value`] is closed over the shapes the engine has to reason about: plain
//! data, synthetic stand-ins, instances of unit-defined types, and the three
//! "not yet a value" shapes (pull-based sequences, asynchronous streams and
//! deferred computations) that the materializer resolves.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{Future, Stream};
use parking_lot::Mutex;

use crate::fault::Fault;
use crate::synthetic::Synthetic;
use crate::unit::{TypeDef, TypeKey};

/// Items produced by a pull-based sequence.
pub type PullIter = Box<dyn Iterator<Item = Result<Value, Fault>> + Send>;

/// Items produced by an asynchronous stream.
pub type AsyncItems = BoxStream<'static, Result<Value, Fault>>;

/// A computation that must be driven to completion by a scheduler.
pub type DeferredFuture = BoxFuture<'static, Result<Value, Fault>>;

#[derive(Clone)]
pub enum Value {
    Nothing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    /// Ordered string-keyed mapping.
    Map(Vec<(String, Value)>),
    Synthetic(Synthetic),
    Instance(Instance),
    Lazy(LazySeq),
    AsyncLazy(AsyncSeq),
    Deferred(Deferred),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    pub fn synthetic(root: &str) -> Self {
        Value::Synthetic(Synthetic::named(root))
    }

    /// Runtime type name, as it appears in fault messages.
    pub fn type_name(&self) -> String {
        match self {
            Value::Nothing => "nothing".into(),
            Value::Bool(_) => "bool".into(),
            Value::Int(_) => "int".into(),
            Value::Float(_) => "float".into(),
            Value::Str(_) => "str".into(),
            Value::Bytes(_) => "bytes".into(),
            Value::List(_) => "list".into(),
            Value::Map(_) => "map".into(),
            Value::Synthetic(_) => "synthetic".into(),
            Value::Instance(inst) => inst.type_key().name.clone(),
            Value::Lazy(_) => "lazy_sequence".into(),
            Value::AsyncLazy(_) => "async_sequence".into(),
            Value::Deferred(_) => "deferred".into(),
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Instance(inst) => Some(inst),
            _ => None,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, Value::Synthetic(_))
    }

    /// Attribute access.
    pub fn attr(&self, name: &str) -> Result<Value, Fault> {
        match self {
            Value::Synthetic(s) => Ok(Value::Synthetic(s.attr(name))),
            Value::Instance(inst) => inst
                .get(name)
                .ok_or_else(|| Fault::attribute_error(&inst.type_key().name, name)),
            Value::Map(entries) => entries
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| Fault::new("KeyError", name.to_string())),
            other => Err(Fault::attribute_error(&other.type_name(), name)),
        }
    }

    /// Invoke the value as a callable.
    pub fn call(&self, args: &[Value]) -> Result<Value, Fault> {
        match self {
            Value::Synthetic(s) => Ok(Value::Synthetic(s.call(args))),
            other => Err(Fault::type_error(format!(
                "'{}' object is not callable",
                other.type_name()
            ))),
        }
    }

    /// Integer view; synthetics convert to 1.
    pub fn as_int(&self) -> Result<i64, Fault> {
        match self {
            Value::Int(v) => Ok(*v),
            Value::Bool(b) => Ok(i64::from(*b)),
            Value::Float(f) if f.is_finite() => Ok(f.trunc() as i64),
            Value::Synthetic(_) => Ok(1),
            other => Err(Fault::type_error(format!(
                "expected int, got '{}'",
                other.type_name()
            ))),
        }
    }

    /// Float view; synthetics convert to 1.0.
    pub fn as_float(&self) -> Result<f64, Fault> {
        match self {
            Value::Float(f) => Ok(*f),
            Value::Int(v) => Ok(*v as f64),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Synthetic(_) => Ok(1.0),
            other => Err(Fault::type_error(format!(
                "expected float, got '{}'",
                other.type_name()
            ))),
        }
    }

    /// String view; synthetics render as their display form.
    pub fn as_str(&self) -> Result<String, Fault> {
        match self {
            Value::Str(s) => Ok(s.clone()),
            Value::Synthetic(s) => Ok(s.to_string()),
            other => Err(Fault::type_error(format!(
                "expected str, got '{}'",
                other.type_name()
            ))),
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Nothing => false,
            Value::Bool(b) => *b,
            Value::Int(v) => *v != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Bytes(b) => !b.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
            _ => true,
        }
    }

    /// Length; synthetics are empty.
    pub fn len(&self) -> Result<usize, Fault> {
        match self {
            Value::Str(s) => Ok(s.chars().count()),
            Value::Bytes(b) => Ok(b.len()),
            Value::List(items) => Ok(items.len()),
            Value::Map(entries) => Ok(entries.len()),
            Value::Synthetic(_) => Ok(0),
            other => Err(Fault::type_error(format!(
                "object of type '{}' has no len()",
                other.type_name()
            ))),
        }
    }

    /// Eager iteration over a container; synthetics iterate as empty.
    pub fn items(&self) -> Result<Vec<Value>, Fault> {
        match self {
            Value::List(items) => Ok(items.clone()),
            Value::Map(entries) => Ok(entries.iter().map(|(k, _)| Value::str(k)).collect()),
            Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
            Value::Bytes(b) => Ok(b.iter().map(|byte| Value::Int(i64::from(*byte))).collect()),
            Value::Synthetic(_) => Ok(Vec::new()),
            other => Err(Fault::type_error(format!(
                "'{}' object is not iterable",
                other.type_name()
            ))),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nothing, Value::Nothing) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Synthetic(a), Value::Synthetic(b)) => a == b,
            (Value::Instance(a), Value::Instance(b)) => a.ptr_eq(b),
            (Value::Lazy(a), Value::Lazy(b)) => Arc::ptr_eq(&a.source, &b.source),
            (Value::AsyncLazy(a), Value::AsyncLazy(b)) => Arc::ptr_eq(&a.stream, &b.stream),
            (Value::Deferred(a), Value::Deferred(b)) => Arc::ptr_eq(&a.future, &b.future),
            _ => false,
        }
    }
}

/// Nesting depth past which containers render as `[...]` / `{...}`.
pub const DISPLAY_DEPTH: usize = 64;

impl Value {
    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        match self {
            Value::List(_) if depth >= DISPLAY_DEPTH => write!(f, "[...]"),
            Value::Map(_) if depth >= DISPLAY_DEPTH => write!(f, "{{...}}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.fmt_nested(f, depth + 1)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k:?}: ")?;
                    v.fmt_nested(f, depth + 1)?;
                }
                write!(f, "}}")
            }
            Value::Nothing => write!(f, "nothing"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Bytes(b) => {
                write!(f, "bytes:")?;
                for byte in b {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Value::Synthetic(s) => write!(f, "{s}"),
            Value::Instance(inst) => write!(f, "<{} instance>", inst.type_key()),
            Value::Lazy(_) => write!(f, "<lazy sequence>"),
            Value::AsyncLazy(_) => write!(f, "<async sequence>"),
            Value::Deferred(_) => write!(f, "<deferred>"),
        }
    }

    fn is_container(&self) -> bool {
        matches!(self, Value::List(_) | Value::Map(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_nested(f, 0)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

// Code under test can hand back arbitrarily deep lists. The derived drop glue
// recurses once per level, so nested containers are flattened onto a heap
// stack and released one at a time.
impl Drop for Value {
    fn drop(&mut self) {
        let mut pending: Vec<Value> = match self {
            Value::List(items) if items.iter().any(Value::is_container) => std::mem::take(items),
            Value::Map(entries) if entries.iter().any(|(_, v)| v.is_container()) => {
                std::mem::take(entries).into_iter().map(|(_, v)| v).collect()
            }
            _ => return,
        };
        while let Some(mut value) = pending.pop() {
            match &mut value {
                Value::List(items) => pending.append(items),
                Value::Map(entries) => {
                    pending.extend(std::mem::take(entries).into_iter().map(|(_, v)| v))
                }
                _ => {}
            }
        }
    }
}

// =============================================================================
// Instances
// =============================================================================

struct InstanceState {
    ty: Arc<TypeDef>,
    fields: Mutex<BTreeMap<String, Value>>,
}

/// An instance of a unit-defined type. Cloning shares the instance.
#[derive(Clone)]
pub struct Instance {
    inner: Arc<InstanceState>,
}

impl Instance {
    pub fn new(ty: Arc<TypeDef>) -> Self {
        Self {
            inner: Arc::new(InstanceState {
                ty,
                fields: Mutex::new(BTreeMap::new()),
            }),
        }
    }

    pub fn type_def(&self) -> &Arc<TypeDef> {
        &self.inner.ty
    }

    pub fn type_key(&self) -> &TypeKey {
        self.inner.ty.key()
    }

    pub fn get(&self, field: &str) -> Option<Value> {
        self.inner.fields.lock().get(field).cloned()
    }

    pub fn set(&self, field: impl Into<String>, value: Value) {
        self.inner.fields.lock().insert(field.into(), value);
    }

    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

// =============================================================================
// Lazy / deferred shapes
// =============================================================================

/// Pull-based sequence (finite or unbounded). One-shot: draining consumes it.
#[derive(Clone)]
pub struct LazySeq {
    source: Arc<Mutex<Option<PullIter>>>,
}

impl LazySeq {
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = Result<Value, Fault>> + Send + 'static,
    {
        Self {
            source: Arc::new(Mutex::new(Some(Box::new(iter)))),
        }
    }

    pub fn from_values<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: Send + 'static,
    {
        Self::new(items.into_iter().map(Ok))
    }

    /// Take the underlying iterator; `None` once already drained.
    pub fn take(&self) -> Option<PullIter> {
        self.source.lock().take()
    }
}

/// Asynchronous stream of values. One-shot.
#[derive(Clone)]
pub struct AsyncSeq {
    stream: Arc<Mutex<Option<AsyncItems>>>,
}

impl AsyncSeq {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Value, Fault>> + Send + 'static,
    {
        Self {
            stream: Arc::new(Mutex::new(Some(Box::pin(stream)))),
        }
    }

    pub fn take(&self) -> Option<AsyncItems> {
        self.stream.lock().take()
    }
}

/// Deferred computation. One-shot.
#[derive(Clone)]
pub struct Deferred {
    future: Arc<Mutex<Option<DeferredFuture>>>,
}

impl Deferred {
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value, Fault>> + Send + 'static,
    {
        Self {
            future: Arc::new(Mutex::new(Some(Box::pin(future)))),
        }
    }

    pub fn take(&self) -> Option<DeferredFuture> {
        self.future.lock().take()
    }
}
