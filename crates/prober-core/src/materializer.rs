//! Result materializer.
//!
//! Normalises "not yet a value" return shapes into concrete values under the
//! call's remaining budget:
//!
//! - lazy sequences are pulled to the end into a list
//! - async streams and deferred computations are driven on a current-thread
//!   tokio runtime owned by the calling worker
//!
//! Anything else passes through unchanged. Materialization is single-level: a
//! deferred that resolves to a lazy sequence is returned as that sequence.
//! A drain cut short by the deadline keeps nothing.

use std::time::Duration;

use futures::TryStreamExt;
use prober_types::{CallContext, Fault, Value};

/// Why materialization produced no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterializeError {
    /// The value resolved to a failure.
    Fault(Fault),
    /// The deadline passed before the value was complete.
    Deadline,
}

impl From<Fault> for MaterializeError {
    fn from(fault: Fault) -> Self {
        MaterializeError::Fault(fault)
    }
}

/// Resolve `raw` into a concrete value under the deadline carried by `ctx`.
pub fn materialize(raw: Value, ctx: &CallContext) -> Result<Value, MaterializeError> {
    match &raw {
        Value::Lazy(seq) => {
            // An already-drained sequence yields nothing more, like an exhausted generator.
            let Some(items) = seq.take() else {
                return Ok(Value::List(Vec::new()));
            };
            let mut drained = Vec::new();
            for item in items {
                if ctx.interrupted() {
                    return Err(MaterializeError::Deadline);
                }
                drained.push(item.map_err(|fault| classify(fault, ctx))?);
            }
            if ctx.interrupted() {
                return Err(MaterializeError::Deadline);
            }
            Ok(Value::List(drained))
        }
        Value::AsyncLazy(seq) => {
            let Some(stream) = seq.take() else {
                return Ok(Value::List(Vec::new()));
            };
            let items = drive(ctx, stream.try_collect::<Vec<Value>>())?;
            Ok(Value::List(items))
        }
        Value::Deferred(deferred) => {
            let Some(future) = deferred.take() else {
                return Err(MaterializeError::Fault(Fault::new(
                    "RuntimeError",
                    "cannot reuse already awaited deferred value",
                )));
            };
            drive(ctx, future)
        }
        _ => Ok(raw),
    }
}

/// Run `future` to completion on a fresh current-thread runtime, bounded by
/// the time left on the call's alarm.
fn drive<F, T>(ctx: &CallContext, future: F) -> Result<T, MaterializeError>
where
    F: std::future::Future<Output = Result<T, Fault>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|e| {
            MaterializeError::Fault(Fault::new(
                "RuntimeError",
                format!("failed to start scheduler: {e}"),
            ))
        })?;

    let outcome = match ctx.remaining() {
        Some(remaining) if remaining.is_zero() => return Err(MaterializeError::Deadline),
        Some(remaining) => runtime.block_on(bounded(remaining, future)),
        None => runtime.block_on(async { Some(future.await) }),
    };

    match outcome {
        Some(Ok(value)) => Ok(value),
        Some(Err(fault)) => Err(classify(fault, ctx)),
        None => Err(MaterializeError::Deadline),
    }
}

async fn bounded<F, T>(budget: Duration, future: F) -> Option<Result<T, Fault>>
where
    F: std::future::Future<Output = Result<T, Fault>>,
{
    tokio::time::timeout(budget, future).await.ok()
}

/// An `Interrupted` fault after the alarm fired is the deadline, not the target.
fn classify(fault: Fault, ctx: &CallContext) -> MaterializeError {
    if fault.is_interrupt() && ctx.interrupted() {
        MaterializeError::Deadline
    } else {
        MaterializeError::Fault(fault)
    }
}
