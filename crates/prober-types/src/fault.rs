//! Faults raised by code under test.
//!
//! A [`Fault`] is the Rust rendition of "the target raised": a kind (the
//! fault's type name) plus a stringified message. The engine never interprets
//! either field, it only preserves them in the execution log.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;

/// Kind used when a cooperative suspension point observes a fired alarm.
pub const INTERRUPTED_KIND: &str = "Interrupted";

/// Kind used for panics unwinding out of a callable body.
pub const PANIC_KIND: &str = "panic";

/// Kind used for abrupt-exit requests.
pub const EXIT_KIND: &str = "SystemExit";

/// A fault raised while running code under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    /// Type of the fault (e.g. `TypeError`, `panic`, `SystemExit`).
    pub kind: String,
    /// Stringified fault payload.
    pub message: String,
}

impl Fault {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new("TypeError", message)
    }

    pub fn attribute_error(owner: &str, attr: &str) -> Self {
        Self::new(
            "AttributeError",
            format!("'{owner}' object has no attribute '{attr}'"),
        )
    }

    /// Abrupt process-exit request raised by the target.
    pub fn exit(code: i32) -> Self {
        Self::new(EXIT_KIND, code.to_string())
    }

    /// Raised at a suspension point after the call's deadline fired.
    pub fn interrupted() -> Self {
        Self::new(INTERRUPTED_KIND, "deadline exceeded at suspension point")
    }

    /// Convert a `catch_unwind` payload into a fault.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::new(PANIC_KIND, message)
    }

    pub fn is_interrupt(&self) -> bool {
        self.kind == INTERRUPTED_KIND
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Fault {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_payload_str() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        let fault = Fault::from_panic(payload);
        assert_eq!(fault.kind, PANIC_KIND);
        assert_eq!(fault.message, "boom");
    }

    #[test]
    fn test_panic_payload_string() {
        let payload: Box<dyn Any + Send> = Box::new(format!("index {} out of range", 7));
        assert_eq!(Fault::from_panic(payload).message, "index 7 out of range");
    }

    #[test]
    fn test_panic_payload_opaque() {
        let payload: Box<dyn Any + Send> = Box::new(42u32);
        assert_eq!(Fault::from_panic(payload).message, "unknown panic payload");
    }

    #[test]
    fn test_display() {
        assert_eq!(Fault::exit(3).to_string(), "SystemExit: 3");
        assert!(Fault::interrupted().is_interrupt());
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(Fault::type_error("bad operand")).unwrap();
        assert_eq!(json["kind"], "TypeError");
        assert_eq!(json["message"], "bad operand");
    }
}
