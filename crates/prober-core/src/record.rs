//! Record types for the execution log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use prober_types::{Fault, Value};

use crate::errors::ProbeErrorKind;

/// Representations longer than this are cut before they reach the log.
const MAX_REPR_LEN: usize = 1000;

/// How the target was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    Function,
    Constructor,
    Method,
}

/// Where a bound argument value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentSource {
    /// The parameter's declared default, unchanged.
    Default,
    /// A freshly provided synthetic stand-in.
    Synthetic,
}

/// One argument as it was passed to the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentRecord {
    pub name: String,
    pub source: ArgumentSource,
    /// Display form of the value.
    pub value: String,
}

/// Classified outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Outcome {
    Success {
        value: String,
    },
    Fault {
        error: ProbeErrorKind,
        kind: String,
        message: String,
    },
    Timeout {
        error: ProbeErrorKind,
    },
}

impl Outcome {
    pub fn success(value: &Value) -> Self {
        Outcome::Success {
            value: truncate_repr(&value.to_string()),
        }
    }

    pub fn fault(error: ProbeErrorKind, fault: &Fault) -> Self {
        Outcome::Fault {
            error,
            kind: fault.kind.clone(),
            message: truncate_repr(&fault.message),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, Outcome::Fault { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Outcome::Timeout { .. })
    }

    /// Taxonomy code of a failed outcome.
    pub fn error(&self) -> Option<ProbeErrorKind> {
        match self {
            Outcome::Success { .. } => None,
            Outcome::Fault { error, .. } | Outcome::Timeout { error } => Some(*error),
        }
    }
}

/// One attempted invocation. Never mutated after it is appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationRecord {
    /// Position among all invocations written to the same sink (1-based).
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    /// Function, method or type name.
    pub member: String,
    /// Type name for methods and constructors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    pub call_kind: CallKind,
    pub arguments: Vec<ArgumentRecord>,
    pub outcome: Outcome,
    pub elapsed_ms: u64,
}

/// Cut a representation for the log (first `MAX_REPR_LEN` bytes).
pub fn truncate_repr(repr: &str) -> String {
    if repr.len() <= MAX_REPR_LEN {
        return repr.to_string();
    }
    let mut cut = MAX_REPR_LEN;
    while !repr.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &repr[..cut])
}
