//! Declared parameter shapes and argument binding.
//!
//! Signatures come from the loader and may be adversarially malformed, so
//! nothing here assumes well-formedness: [`Signature::bind`] checks both the
//! shape of the signature and whether a concrete [`ArgumentSet`] satisfies it.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::fault::Fault;
use crate::value::Value;

/// How a parameter may receive its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    PositionalOnly,
    PositionalOrNamed,
    VariadicPositional,
    NamedOnly,
    VariadicNamed,
}

impl ParamKind {
    pub fn is_variadic(self) -> bool {
        matches!(self, ParamKind::VariadicPositional | ParamKind::VariadicNamed)
    }

    fn accepts_position(self) -> bool {
        matches!(self, ParamKind::PositionalOnly | ParamKind::PositionalOrNamed)
    }

    fn accepts_name(self) -> bool {
        matches!(self, ParamKind::PositionalOrNamed | ParamKind::NamedOnly)
    }
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub kind: ParamKind,
    pub default: Option<Value>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    /// Positional-or-named parameter.
    pub fn positional(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::PositionalOrNamed)
    }

    pub fn positional_only(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::PositionalOnly)
    }

    pub fn named_only(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::NamedOnly)
    }

    pub fn variadic_positional(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::VariadicPositional)
    }

    pub fn variadic_named(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::VariadicNamed)
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Required unless variadic or defaulted.
    pub fn is_required(&self) -> bool {
        !self.kind.is_variadic() && self.default.is_none()
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParamKind::VariadicPositional => write!(f, "*{}", self.name)?,
            ParamKind::VariadicNamed => write!(f, "**{}", self.name)?,
            _ => write!(f, "{}", self.name)?,
        }
        if let Some(default) = &self.default {
            write!(f, "={default}")?;
        }
        Ok(())
    }
}

/// Ordered parameter list of a function or type constructor.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    params: Vec<Parameter>,
}

impl Signature {
    pub fn new(params: Vec<Parameter>) -> Self {
        Self { params }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Check that the parameter list itself is well formed.
    pub fn validate(&self) -> Result<(), BindError> {
        let mut names = HashSet::new();
        let mut previous: Option<ParamKind> = None;
        let mut seen_positional_default = false;

        for param in &self.params {
            if !names.insert(param.name.as_str()) {
                return Err(BindError::DuplicateParameter(param.name.clone()));
            }
            if let Some(prev) = previous {
                if param.kind < prev || (param.kind.is_variadic() && param.kind == prev) {
                    return Err(BindError::KindOutOfOrder(param.name.clone()));
                }
            }
            if param.kind.is_variadic() && param.default.is_some() {
                return Err(BindError::VariadicWithDefault(param.name.clone()));
            }
            if param.kind.accepts_position() {
                if param.default.is_some() {
                    seen_positional_default = true;
                } else if seen_positional_default {
                    return Err(BindError::RequiredAfterDefault(param.name.clone()));
                }
            }
            previous = Some(param.kind);
        }
        Ok(())
    }

    /// Bind a concrete argument set, checking arity and name constraints.
    pub fn bind(&self, set: ArgumentSet) -> Result<BoundArguments, BindError> {
        self.validate()?;

        let mut slots: Vec<Option<Value>> = vec![None; self.params.len()];
        let mut extra_positional = Vec::new();
        let mut extra_named = Vec::new();

        let positional_slots: Vec<usize> = self
            .params
            .iter()
            .enumerate()
            .filter(|(_, p)| p.kind.accepts_position())
            .map(|(i, _)| i)
            .collect();
        let has_var_positional = self
            .params
            .iter()
            .any(|p| p.kind == ParamKind::VariadicPositional);
        let has_var_named = self
            .params
            .iter()
            .any(|p| p.kind == ParamKind::VariadicNamed);

        let given_positional = set.positional.len();
        for (i, value) in set.positional.into_iter().enumerate() {
            match positional_slots.get(i) {
                Some(&slot) => slots[slot] = Some(value),
                None if has_var_positional => extra_positional.push(value),
                None => {
                    return Err(BindError::TooManyPositional {
                        expected: positional_slots.len(),
                        given: given_positional,
                    })
                }
            }
        }

        for (name, value) in set.named {
            match self.params.iter().position(|p| p.name == name) {
                Some(slot) if self.params[slot].kind.accepts_name() => {
                    if slots[slot].is_some() {
                        return Err(BindError::MultipleValues(name));
                    }
                    slots[slot] = Some(value);
                }
                Some(slot) if self.params[slot].kind == ParamKind::PositionalOnly => {
                    if has_var_named {
                        extra_named.push((name, value));
                    } else {
                        return Err(BindError::PositionalOnlyByName(name));
                    }
                }
                _ if has_var_named => {
                    if extra_named.iter().any(|(n, _)| *n == name) {
                        return Err(BindError::MultipleValues(name));
                    }
                    extra_named.push((name, value));
                }
                _ => return Err(BindError::UnexpectedName(name)),
            }
        }

        let mut arguments = Vec::new();
        for (param, slot) in self.params.iter().zip(slots) {
            match slot {
                Some(value) => arguments.push((param.name.clone(), value)),
                None if param.is_required() => {
                    return Err(BindError::MissingArgument(param.name.clone()))
                }
                None => {}
            }
        }

        Ok(BoundArguments {
            arguments,
            extra_positional,
            extra_named,
        })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        let mut wrote_named_marker = false;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if param.kind == ParamKind::NamedOnly
                && !wrote_named_marker
                && !self.params[..i]
                    .iter()
                    .any(|p| p.kind == ParamKind::VariadicPositional)
            {
                write!(f, "*, ")?;
                wrote_named_marker = true;
            }
            write!(f, "{param}")?;
            let next_is_positional_only = self
                .params
                .get(i + 1)
                .is_some_and(|p| p.kind == ParamKind::PositionalOnly);
            if param.kind == ParamKind::PositionalOnly && !next_is_positional_only {
                write!(f, ", /")?;
            }
        }
        write!(f, ")")
    }
}

/// Concrete argument values before binding.
#[derive(Debug, Clone, Default)]
pub struct ArgumentSet {
    pub positional: Vec<Value>,
    pub named: Vec<(String, Value)>,
}

/// Argument values matched to parameters, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct BoundArguments {
    arguments: Vec<(String, Value)>,
    extra_positional: Vec<Value>,
    extra_named: Vec<(String, Value)>,
}

impl BoundArguments {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.arguments
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Like [`get`](Self::get) but raises a `TypeError` fault when absent.
    pub fn value(&self, name: &str) -> Result<&Value, Fault> {
        self.get(name)
            .ok_or_else(|| Fault::type_error(format!("missing argument '{name}'")))
    }

    pub fn arguments(&self) -> &[(String, Value)] {
        &self.arguments
    }

    pub fn extra_positional(&self) -> &[Value] {
        &self.extra_positional
    }

    pub fn extra_named(&self) -> &[(String, Value)] {
        &self.extra_named
    }

    pub fn len(&self) -> usize {
        self.arguments.len() + self.extra_positional.len() + self.extra_named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Why an argument set could not be bound to a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    DuplicateParameter(String),
    KindOutOfOrder(String),
    VariadicWithDefault(String),
    RequiredAfterDefault(String),
    TooManyPositional { expected: usize, given: usize },
    MultipleValues(String),
    PositionalOnlyByName(String),
    UnexpectedName(String),
    MissingArgument(String),
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::DuplicateParameter(n) => write!(f, "duplicate parameter '{n}'"),
            BindError::KindOutOfOrder(n) => write!(f, "parameter '{n}' is out of kind order"),
            BindError::VariadicWithDefault(n) => {
                write!(f, "variadic parameter '{n}' cannot have a default")
            }
            BindError::RequiredAfterDefault(n) => {
                write!(f, "required parameter '{n}' follows a defaulted parameter")
            }
            BindError::TooManyPositional { expected, given } => write!(
                f,
                "takes {expected} positional arguments but {given} were given"
            ),
            BindError::MultipleValues(n) => write!(f, "multiple values for argument '{n}'"),
            BindError::PositionalOnlyByName(n) => {
                write!(f, "positional-only argument '{n}' passed by name")
            }
            BindError::UnexpectedName(n) => write!(f, "unexpected named argument '{n}'"),
            BindError::MissingArgument(n) => write!(f, "missing required argument '{n}'"),
        }
    }
}

impl std::error::Error for BindError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(pairs: &[(&str, i64)]) -> Vec<(String, Value)> {
        pairs
            .iter()
            .map(|(n, v)| (n.to_string(), Value::Int(*v)))
            .collect()
    }

    #[test]
    fn test_bind_positional_and_named() {
        let sig = Signature::new(vec![
            Parameter::positional_only("a"),
            Parameter::positional("b"),
            Parameter::named_only("c").with_default(3),
        ]);
        let bound = sig
            .bind(ArgumentSet {
                positional: vec![Value::Int(1)],
                named: named(&[("b", 2)]),
            })
            .unwrap();
        assert_eq!(bound.get("a"), Some(&Value::Int(1)));
        assert_eq!(bound.get("b"), Some(&Value::Int(2)));
        assert_eq!(bound.get("c"), None);
    }

    #[test]
    fn test_missing_required() {
        let sig = Signature::new(vec![Parameter::positional("a")]);
        let err = sig.bind(ArgumentSet::default()).unwrap_err();
        assert_eq!(err, BindError::MissingArgument("a".into()));
    }

    #[test]
    fn test_too_many_positional() {
        let sig = Signature::new(vec![Parameter::positional("a")]);
        let err = sig
            .bind(ArgumentSet {
                positional: vec![Value::Int(1), Value::Int(2)],
                named: vec![],
            })
            .unwrap_err();
        assert!(matches!(err, BindError::TooManyPositional { given: 2, .. }));
    }

    #[test]
    fn test_variadics_collect_extras() {
        let sig = Signature::new(vec![
            Parameter::positional("a"),
            Parameter::variadic_positional("args"),
            Parameter::variadic_named("kwargs"),
        ]);
        let bound = sig
            .bind(ArgumentSet {
                positional: vec![Value::Int(1), Value::Int(2)],
                named: named(&[("z", 9)]),
            })
            .unwrap();
        assert_eq!(bound.extra_positional(), &[Value::Int(2)]);
        assert_eq!(bound.extra_named().len(), 1);
    }

    #[test]
    fn test_positional_only_by_name_rejected() {
        let sig = Signature::new(vec![Parameter::positional_only("a")]);
        let err = sig
            .bind(ArgumentSet {
                positional: vec![],
                named: named(&[("a", 1)]),
            })
            .unwrap_err();
        assert_eq!(err, BindError::PositionalOnlyByName("a".into()));
    }

    #[test]
    fn test_malformed_signatures() {
        let dup = Signature::new(vec![Parameter::positional("a"), Parameter::named_only("a")]);
        assert!(matches!(dup.validate(), Err(BindError::DuplicateParameter(_))));

        let order = Signature::new(vec![Parameter::named_only("a"), Parameter::positional("b")]);
        assert!(matches!(order.validate(), Err(BindError::KindOutOfOrder(_))));

        let two_varargs = Signature::new(vec![
            Parameter::variadic_positional("a"),
            Parameter::variadic_positional("b"),
        ]);
        assert!(matches!(
            two_varargs.validate(),
            Err(BindError::KindOutOfOrder(_))
        ));

        let required_after_default = Signature::new(vec![
            Parameter::positional("a").with_default(1),
            Parameter::positional("b"),
        ]);
        assert!(matches!(
            required_after_default.validate(),
            Err(BindError::RequiredAfterDefault(_))
        ));
    }

    #[test]
    fn test_display() {
        let sig = Signature::new(vec![
            Parameter::positional_only("p"),
            Parameter::positional("a"),
            Parameter::positional("b").with_default(5),
            Parameter::named_only("flag").with_default(true),
            Parameter::variadic_named("rest"),
        ]);
        assert_eq!(sig.to_string(), "(p, /, a, b=5, *, flag=true, **rest)");
    }
}
