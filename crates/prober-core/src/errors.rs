//! Error codes for the exploration engine.
//!
//! # Error Taxonomy
//!
//! Every failure inside one invocation is local and recoverable: it is
//! recorded in the execution log and exploration moves on to the next
//! candidate.
//!
//! | Stage | Purpose | Error Codes |
//! |-------|---------|-------------|
//! | Binding | Build an argument set from a signature | E101 |
//! | Execution | Run the target | E201 |
//! | Deadline | Wall-clock budget exceeded | E301-E302 |
//!
//! The only session-ending error is [`EnumerationError`], raised when the
//! unit's members cannot be listed at all.

use serde::{Deserialize, Serialize};
use std::fmt;

pub use prober_types::EnumerationError;

/// Stage of one probe where a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Binding,
    Execution,
    Deadline,
}

impl Stage {
    /// Numeric prefix for this stage (1xx, 2xx, 3xx).
    pub fn code_prefix(&self) -> u16 {
        match self {
            Stage::Binding => 100,
            Stage::Execution => 200,
            Stage::Deadline => 300,
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Stage::Binding => "binding",
            Stage::Execution => "execution",
            Stage::Deadline => "deadline",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

/// Classified failure of one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProbeErrorKind {
    /// E101: Signature cannot be satisfied
    #[serde(rename = "E101")]
    BindingFault,

    /// E201: Target raised during its own execution
    #[serde(rename = "E201")]
    InvocationFault,

    /// E301: Deadline exceeded while the call was running
    #[serde(rename = "E301")]
    InvocationTimeout,

    /// E302: Deadline exceeded while draining a lazy or deferred result
    #[serde(rename = "E302")]
    MaterializationTimeout,
}

impl ProbeErrorKind {
    pub fn numeric_code(&self) -> u16 {
        match self {
            ProbeErrorKind::BindingFault => 101,
            ProbeErrorKind::InvocationFault => 201,
            ProbeErrorKind::InvocationTimeout => 301,
            ProbeErrorKind::MaterializationTimeout => 302,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            ProbeErrorKind::BindingFault => Stage::Binding,
            ProbeErrorKind::InvocationFault => Stage::Execution,
            ProbeErrorKind::InvocationTimeout | ProbeErrorKind::MaterializationTimeout => {
                Stage::Deadline
            }
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ProbeErrorKind::BindingFault => "signature cannot be satisfied",
            ProbeErrorKind::InvocationFault => "target raised during execution",
            ProbeErrorKind::InvocationTimeout => "deadline exceeded during invocation",
            ProbeErrorKind::MaterializationTimeout => "deadline exceeded during materialization",
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.stage() == Stage::Deadline
    }

    /// String code (e.g., "E101").
    pub fn code_string(&self) -> String {
        format!("E{}", self.numeric_code())
    }
}

impl fmt::Display for ProbeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code_string(), self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_stage_prefix() {
        for kind in [
            ProbeErrorKind::BindingFault,
            ProbeErrorKind::InvocationFault,
            ProbeErrorKind::InvocationTimeout,
            ProbeErrorKind::MaterializationTimeout,
        ] {
            assert_eq!(kind.numeric_code() / 100 * 100, kind.stage().code_prefix());
        }
    }

    #[test]
    fn test_serde_rename() {
        let json = serde_json::to_string(&ProbeErrorKind::MaterializationTimeout).unwrap();
        assert_eq!(json, "\"E302\"");
        let back: ProbeErrorKind = serde_json::from_str("\"E101\"").unwrap();
        assert_eq!(back, ProbeErrorKind::BindingFault);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ProbeErrorKind::InvocationTimeout.to_string(),
            "E301: deadline exceeded during invocation"
        );
        assert!(ProbeErrorKind::InvocationTimeout.is_timeout());
        assert!(!ProbeErrorKind::InvocationFault.is_timeout());
    }
}
