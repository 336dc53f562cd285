//! Per-call execution context handed to every callable body.
//!
//! The context carries the call's [`Alarm`] and the channel that receives the
//! body's program output. Bodies reach a suspension point by calling
//! [`CallContext::checkpoint`] (directly, or through [`CallContext::sleep`]);
//! once the alarm has fired the checkpoint raises an `Interrupted` fault.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::fault::Fault;

const ARMED: u8 = 0;
const FIRED: u8 = 1;
const DISARMED: u8 = 2;

/// Slice used by [`CallContext::sleep`] between suspension points.
const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// Wall-clock deadline for exactly one call.
///
/// An alarm is armed right before the call and disarmed on every exit path.
/// Once disarmed it can never fire, so a stale alarm cannot interrupt a later,
/// unrelated call.
#[derive(Debug, Clone)]
pub struct Alarm {
    state: Arc<AtomicU8>,
    deadline: Instant,
}

impl Alarm {
    /// Arm a new alarm `budget` from now.
    pub fn arm(budget: Duration) -> Self {
        let now = Instant::now();
        Self {
            state: Arc::new(AtomicU8::new(ARMED)),
            deadline: now.checked_add(budget).unwrap_or(now + Duration::from_secs(86_400)),
        }
    }

    /// Fire the alarm. Has no effect once disarmed.
    pub fn fire(&self) -> bool {
        self.state
            .compare_exchange(ARMED, FIRED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Disarm the alarm. Has no effect once fired.
    pub fn disarm(&self) -> bool {
        self.state
            .compare_exchange(ARMED, DISARMED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// True once the alarm fired, or its deadline passed while still armed.
    pub fn has_fired(&self) -> bool {
        match self.state.load(Ordering::SeqCst) {
            FIRED => true,
            ARMED => Instant::now() >= self.deadline,
            _ => false,
        }
    }

    pub fn is_disarmed(&self) -> bool {
        self.state.load(Ordering::SeqCst) == DISARMED
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left before the deadline (zero once passed).
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// Context passed to callable bodies.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    alarm: Option<Alarm>,
    output: Option<Sender<String>>,
}

impl CallContext {
    pub fn new(alarm: Alarm, output: Option<Sender<String>>) -> Self {
        Self {
            alarm: Some(alarm),
            output,
        }
    }

    /// A context with no deadline whose output is dropped.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn alarm(&self) -> Option<&Alarm> {
        self.alarm.as_ref()
    }

    /// Suspension point: raises `Interrupted` once the alarm has fired.
    pub fn checkpoint(&self) -> Result<(), Fault> {
        if self.interrupted() {
            return Err(Fault::interrupted());
        }
        Ok(())
    }

    pub fn interrupted(&self) -> bool {
        self.alarm.as_ref().is_some_and(Alarm::has_fired)
    }

    /// Time left before the deadline, `None` for detached contexts.
    pub fn remaining(&self) -> Option<Duration> {
        self.alarm.as_ref().map(Alarm::remaining)
    }

    /// Sleep in short slices, checking for interruption between them.
    pub fn sleep(&self, duration: Duration) -> Result<(), Fault> {
        let until = Instant::now() + duration;
        loop {
            self.checkpoint()?;
            let left = until.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return Ok(());
            }
            std::thread::sleep(left.min(SLEEP_SLICE));
        }
    }

    /// Program output of the body (its stdout).
    pub fn print(&self, line: impl Into<String>) {
        if let Some(tx) = &self.output {
            // The receiver is gone once the call's verdict is in; late output is dropped.
            let _ = tx.send(line.into());
        }
    }
}
