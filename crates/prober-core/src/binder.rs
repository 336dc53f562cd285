//! Signature binder.
//!
//! Builds a concrete argument set for a declared signature: defaults where
//! declared, synthetic stand-ins otherwise, nothing for variadics. The result
//! is then checked against the signature, since loader-provided signatures
//! can be malformed.

use std::fmt;

use prober_types::{ArgumentSet, BindError, BoundArguments, ParamKind, Signature};

use crate::record::{truncate_repr, ArgumentRecord, ArgumentSource};
use crate::synthetic::SyntheticProvider;

/// A bound argument set plus where each value came from.
#[derive(Debug, Clone)]
pub struct Binding {
    pub arguments: BoundArguments,
    /// Declaration order; variadics are absent.
    pub provenance: Vec<ArgumentRecord>,
}

/// The produced argument set does not satisfy the signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingFault {
    pub error: BindError,
    /// Arguments that were produced before binding was rejected.
    pub provenance: Vec<ArgumentRecord>,
}

impl fmt::Display for BindingFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot bind arguments: {}", self.error)
    }
}

impl std::error::Error for BindingFault {}

/// Produce and validate an argument set for `signature`.
///
/// Positional-only parameters are passed by position. Positional-or-named and
/// named-only parameters are passed by name.
pub fn bind(signature: &Signature, provider: &SyntheticProvider) -> Result<Binding, BindingFault> {
    let mut set = ArgumentSet::default();
    let mut provenance = Vec::new();

    for param in signature.params() {
        if param.kind.is_variadic() {
            continue;
        }

        let (value, source) = match &param.default {
            Some(default) => (default.clone(), ArgumentSource::Default),
            None => (provider.provide(&param.name), ArgumentSource::Synthetic),
        };
        provenance.push(ArgumentRecord {
            name: param.name.clone(),
            source,
            value: truncate_repr(&value.to_string()),
        });

        match param.kind {
            ParamKind::PositionalOnly => set.positional.push(value),
            _ => set.named.push((param.name.clone(), value)),
        }
    }

    match signature.bind(set) {
        Ok(arguments) => Ok(Binding {
            arguments,
            provenance,
        }),
        Err(error) => Err(BindingFault { error, provenance }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prober_types::{Parameter, Value};

    fn bind_ok(signature: Signature) -> Binding {
        bind(&signature, &SyntheticProvider::new()).unwrap()
    }

    #[test]
    fn test_default_and_synthetic() {
        let binding = bind_ok(Signature::new(vec![
            Parameter::positional("a"),
            Parameter::positional("b").with_default(5),
        ]));

        assert!(binding.arguments.value("a").unwrap().is_synthetic());
        assert_eq!(binding.arguments.value("b").unwrap(), &Value::Int(5));
        assert_eq!(binding.provenance[0].source, ArgumentSource::Synthetic);
        assert_eq!(binding.provenance[1].source, ArgumentSource::Default);
        assert_eq!(binding.provenance[1].value, "5");
    }

    #[test]
    fn test_variadics_receive_nothing() {
        let binding = bind_ok(Signature::new(vec![
            Parameter::positional_only("head"),
            Parameter::variadic_positional("args"),
            Parameter::named_only("flag").with_default(true),
            Parameter::variadic_named("kwargs"),
        ]));

        assert_eq!(binding.arguments.len(), 2);
        assert!(binding.arguments.extra_positional().is_empty());
        assert!(binding.arguments.extra_named().is_empty());
        let names: Vec<_> = binding.provenance.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["head", "flag"]);
    }

    #[test]
    fn test_named_only_without_default_is_synthetic() {
        let binding = bind_ok(Signature::new(vec![Parameter::named_only("key")]));
        assert!(binding.arguments.value("key").unwrap().is_synthetic());
    }

    #[test]
    fn test_malformed_signature_is_binding_fault() {
        let signature = Signature::new(vec![
            Parameter::positional("x"),
            Parameter::positional("x"),
        ]);
        let fault = bind(&signature, &SyntheticProvider::new()).unwrap_err();
        assert_eq!(fault.error, BindError::DuplicateParameter("x".into()));
        assert!(fault.to_string().contains("duplicate parameter"));
    }

    #[test]
    fn test_out_of_order_kinds_is_binding_fault() {
        let signature = Signature::new(vec![
            Parameter::named_only("k"),
            Parameter::positional_only("p"),
        ]);
        assert!(bind(&signature, &SyntheticProvider::new()).is_err());
    }

    #[test]
    fn test_empty_signature() {
        let binding = bind_ok(Signature::empty());
        assert!(binding.arguments.is_empty());
        assert!(binding.provenance.is_empty());
    }
}
