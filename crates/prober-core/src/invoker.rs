//! Bounded invoker.
//!
//! Runs one callable with a bound argument set under a wall-clock budget and
//! classifies what happened. Nothing the target does escapes as a panic or an
//! error: every fault, panic and timeout becomes a [`Verdict`].
//!
//! Each call runs on its own named worker thread (`prober-call-<n>`). The
//! engine thread waits on a channel until the call's [`Alarm`] deadline. When
//! the deadline passes first the alarm is fired, the verdict is `Timeout` and
//! the worker is abandoned: it stops at its next suspension point, or keeps
//! running in the background if it never reaches one.
//!
//! A panic inside the target is reported through its verdict only. The first
//! invoker installs a process-wide panic hook that keeps worker panics off
//! stderr and hands every other thread's panic to the previous hook.

use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Once};
use std::time::{Duration, Instant};

use prober_types::{
    Alarm, BoundArguments, CallContext, Fault, Function, Instance, Method, Signature, TypeDef,
    Value, PANIC_KIND,
};

use crate::config::OutputMode;
use crate::errors::ProbeErrorKind;
use crate::materializer::{materialize, MaterializeError};
use crate::record::CallKind;

const WORKER_PREFIX: &str = "prober-call-";

static QUIET_WORKER_PANICS: Once = Once::new();

fn quiet_worker_panics() {
    QUIET_WORKER_PANICS.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let on_worker = std::thread::current()
                .name()
                .is_some_and(|name| name.starts_with(WORKER_PREFIX));
            if on_worker {
                tracing::debug!("target panicked: {}", info);
            } else {
                previous(info);
            }
        }));
    });
}

const STAGE_CALLING: u8 = 0;
const STAGE_MATERIALIZING: u8 = 1;

/// Something the engine can invoke.
#[derive(Clone)]
pub enum Call {
    Function(Function),
    Constructor(Arc<TypeDef>),
    Method { receiver: Instance, method: Method },
}

impl Call {
    pub fn kind(&self) -> CallKind {
        match self {
            Call::Function(_) => CallKind::Function,
            Call::Constructor(_) => CallKind::Constructor,
            Call::Method { .. } => CallKind::Method,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Call::Function(f) => f.name(),
            Call::Constructor(ty) => ty.name(),
            Call::Method { method, .. } => method.name(),
        }
    }

    /// Type name for constructors and methods.
    pub fn receiver(&self) -> Option<String> {
        match self {
            Call::Function(_) => None,
            Call::Constructor(ty) => Some(ty.name().to_string()),
            Call::Method { receiver, .. } => Some(receiver.type_key().name.clone()),
        }
    }

    pub fn signature(&self) -> &Signature {
        match self {
            Call::Function(f) => f.signature(),
            Call::Constructor(ty) => ty.constructor_signature(),
            Call::Method { method, .. } => method.signature(),
        }
    }

    fn run(&self, ctx: &CallContext, args: &BoundArguments) -> Result<Value, Fault> {
        match self {
            Call::Function(f) => f.invoke(ctx, args),
            Call::Constructor(ty) => ty.construct(ctx, args),
            Call::Method { receiver, method } => method.invoke(ctx, receiver, args),
        }
    }
}

/// Classified result of one invocation.
#[derive(Debug, Clone)]
pub enum Verdict {
    /// The call returned; the value is already materialized.
    Success(Value),
    /// The target raised (including panics and exit requests).
    Fault(Fault),
    /// The deadline fired, during the call or while materializing.
    Timeout(ProbeErrorKind),
}

impl Verdict {
    pub fn value(&self) -> Option<&Value> {
        match self {
            Verdict::Success(value) => Some(value),
            _ => None,
        }
    }
}

/// One finished invocation.
#[derive(Debug)]
pub struct Invocation {
    pub verdict: Verdict,
    /// Program output captured in [`OutputMode::Log`], in emission order.
    pub output: Vec<String>,
    pub elapsed: Duration,
}

/// Disarms the call's alarm on every exit path.
struct DisarmOnDrop<'a>(&'a Alarm);

impl Drop for DisarmOnDrop<'_> {
    fn drop(&mut self) {
        self.0.disarm();
    }
}

type WorkerResult = std::thread::Result<Result<Value, MaterializeError>>;

/// Executes calls one at a time under a fixed budget.
pub struct BoundedInvoker {
    budget: Duration,
    output: OutputMode,
    calls: u64,
}

impl BoundedInvoker {
    pub fn new(budget: Duration) -> Self {
        quiet_worker_panics();
        Self {
            budget,
            output: OutputMode::Log,
            calls: 0,
        }
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Invoke `call` and materialize its result under one deadline.
    pub fn invoke(&mut self, call: Call, args: BoundArguments) -> Invocation {
        self.calls += 1;
        let seq = self.calls;
        let name = call.name().to_string();

        let (output_tx, output_rx) = match self.output {
            OutputMode::Discard => (None, None),
            OutputMode::Log | OutputMode::Inherit => {
                let (tx, rx) = mpsc::channel();
                (Some(tx), Some(rx))
            }
        };
        let (result_tx, result_rx) = mpsc::channel::<WorkerResult>();
        let stage = Arc::new(AtomicU8::new(STAGE_CALLING));

        let start = Instant::now();
        let alarm = Alarm::arm(self.budget);
        let _disarm = DisarmOnDrop(&alarm);

        let ctx = CallContext::new(alarm.clone(), output_tx);
        let worker_stage = Arc::clone(&stage);
        let spawned = std::thread::Builder::new()
            .name(format!("{WORKER_PREFIX}{seq}"))
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    let raw = call.run(&ctx, &args)?;
                    worker_stage.store(STAGE_MATERIALIZING, Ordering::SeqCst);
                    materialize(raw, &ctx)
                }));
                // The engine may have stopped waiting; a late result is dropped.
                let _ = result_tx.send(result);
            });

        let verdict = match spawned {
            Ok(_handle) => self.await_verdict(&name, &alarm, &stage, &result_rx),
            Err(e) => {
                tracing::warn!("failed to spawn worker for '{}': {}", name, e);
                Verdict::Fault(Fault::new(
                    "WorkerError",
                    format!("failed to start call: {e}"),
                ))
            }
        };
        let elapsed = start.elapsed();

        let mut output = Vec::new();
        if let Some(rx) = output_rx {
            let lines: Vec<String> = rx.try_iter().collect();
            match self.output {
                OutputMode::Inherit => {
                    let stdout = std::io::stdout();
                    let mut handle = stdout.lock();
                    for line in &lines {
                        let _ = writeln!(handle, "{line}");
                    }
                }
                _ => output = lines,
            }
        }

        tracing::debug!(
            "call #{} '{}' finished in {}ms: {:?}",
            seq,
            name,
            elapsed.as_millis(),
            verdict
        );

        Invocation {
            verdict,
            output,
            elapsed,
        }
    }

    fn await_verdict(
        &self,
        name: &str,
        alarm: &Alarm,
        stage: &AtomicU8,
        rx: &mpsc::Receiver<WorkerResult>,
    ) -> Verdict {
        let deadline_kind = || match stage.load(Ordering::SeqCst) {
            STAGE_CALLING => ProbeErrorKind::InvocationTimeout,
            _ => ProbeErrorKind::MaterializationTimeout,
        };

        match rx.recv_timeout(alarm.remaining()) {
            Ok(Ok(Ok(value))) => Verdict::Success(value),
            Ok(Ok(Err(MaterializeError::Deadline))) => Verdict::Timeout(deadline_kind()),
            Ok(Ok(Err(MaterializeError::Fault(fault)))) => {
                if fault.is_interrupt() && alarm.has_fired() {
                    Verdict::Timeout(deadline_kind())
                } else {
                    Verdict::Fault(fault)
                }
            }
            Ok(Err(payload)) => Verdict::Fault(Fault::from_panic(payload)),
            Err(RecvTimeoutError::Timeout) => {
                alarm.fire();
                tracing::warn!(
                    "'{}' exceeded its {}ms budget; abandoning worker",
                    name,
                    self.budget.as_millis()
                );
                Verdict::Timeout(deadline_kind())
            }
            Err(RecvTimeoutError::Disconnected) => Verdict::Fault(Fault::new(
                PANIC_KIND,
                "worker exited without producing a result",
            )),
        }
    }
}
