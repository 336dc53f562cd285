//! Synthetic value provider.
//!
//! Hands out the universal stand-in used wherever a parameter has no declared
//! default. Each value is rooted at the parameter's name so chained access
//! stays readable in the log (`conn.request().status`).

use prober_types::{Synthetic, Value};

/// Factory for synthetic stand-ins. Stateless.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntheticProvider;

impl SyntheticProvider {
    pub fn new() -> Self {
        Self
    }

    /// A fresh stand-in for the parameter `name`.
    pub fn provide(&self, name: &str) -> Value {
        Value::Synthetic(Synthetic::named(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provided_value_absorbs_access() {
        let value = SyntheticProvider::new().provide("session");
        let chained = value
            .attr("get")
            .and_then(|v| v.call(&[Value::str("https://example.invalid")]))
            .and_then(|v| v.attr("json"))
            .unwrap();
        match &chained {
            Value::Synthetic(s) => assert_eq!(s.path(), "session.get().json"),
            other => panic!("expected synthetic, got {other}"),
        }
    }

    #[test]
    fn test_no_shared_identity() {
        let provider = SyntheticProvider::new();
        let a = provider.provide("x");
        let b = provider.provide("y");
        assert_ne!(a, b);
    }
}
