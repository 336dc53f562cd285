//! Loaded units and their members.
//!
//! A [`Unit`] is the registration table a loader builds for one module of a
//! package: an ordered list of named [`Member`]s. Functions and types carry a
//! [`Signature`]; everything else is recorded as [`Member::Other`] and never
//! invoked.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::context::CallContext;
use crate::fault::Fault;
use crate::signature::{BoundArguments, Signature};
use crate::value::{Instance, Value};

/// Body of a free function.
pub type NativeFn =
    Arc<dyn Fn(&CallContext, &BoundArguments) -> Result<Value, Fault> + Send + Sync>;

/// Body of an instance method; receives the receiver instance.
pub type MethodFn =
    Arc<dyn Fn(&CallContext, &Instance, &BoundArguments) -> Result<Value, Fault> + Send + Sync>;

/// Body of a type constructor; receives the type being constructed.
pub type ConstructorFn =
    Arc<dyn Fn(&CallContext, &Arc<TypeDef>, &BoundArguments) -> Result<Value, Fault> + Send + Sync>;

/// Stable identity of a type: its defining unit plus its name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeKey {
    pub unit: String,
    pub name: String,
}

impl TypeKey {
    pub fn new(unit: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            name: name.into(),
        }
    }

    /// Whether this type is defined by `unit` (as opposed to a dependency).
    pub fn is_native_to(&self, unit: &str) -> bool {
        self.unit == unit
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.unit, self.name)
    }
}

#[derive(Clone)]
pub struct Function {
    name: String,
    signature: Signature,
    body: NativeFn,
}

impl Function {
    pub fn new<F>(name: impl Into<String>, signature: Signature, body: F) -> Self
    where
        F: Fn(&CallContext, &BoundArguments) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            signature,
            body: Arc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn invoke(&self, ctx: &CallContext, args: &BoundArguments) -> Result<Value, Fault> {
        (self.body)(ctx, args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn {}{}", self.name, self.signature)
    }
}

#[derive(Clone)]
pub struct Method {
    name: String,
    signature: Signature,
    body: MethodFn,
}

impl Method {
    pub fn new<F>(name: impl Into<String>, signature: Signature, body: F) -> Self
    where
        F: Fn(&CallContext, &Instance, &BoundArguments) -> Result<Value, Fault>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            signature,
            body: Arc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn invoke(
        &self,
        ctx: &CallContext,
        receiver: &Instance,
        args: &BoundArguments,
    ) -> Result<Value, Fault> {
        (self.body)(ctx, receiver, args)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "method {}{}", self.name, self.signature)
    }
}

/// An instantiable type: constructor plus instance-method surface.
pub struct TypeDef {
    key: TypeKey,
    constructor_signature: Signature,
    constructor: ConstructorFn,
    methods: Vec<Method>,
}

impl TypeDef {
    pub fn builder(unit: impl Into<String>, name: impl Into<String>) -> TypeBuilder {
        TypeBuilder::new(TypeKey::new(unit, name))
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn constructor_signature(&self) -> &Signature {
        &self.constructor_signature
    }

    /// Methods in declaration order. Constructors are never listed here.
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn construct(
        self: &Arc<Self>,
        ctx: &CallContext,
        args: &BoundArguments,
    ) -> Result<Value, Fault> {
        (self.constructor)(ctx, self, args)
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("key", &self.key)
            .field("constructor", &self.constructor_signature.to_string())
            .field("methods", &self.methods)
            .finish()
    }
}

pub struct TypeBuilder {
    key: TypeKey,
    constructor_signature: Signature,
    constructor: Option<ConstructorFn>,
    methods: Vec<Method>,
}

impl TypeBuilder {
    fn new(key: TypeKey) -> Self {
        Self {
            key,
            constructor_signature: Signature::empty(),
            constructor: None,
            methods: Vec::new(),
        }
    }

    pub fn constructor_signature(mut self, signature: Signature) -> Self {
        self.constructor_signature = signature;
        self
    }

    /// Initialisation hook run on a freshly allocated instance.
    pub fn init<F>(mut self, init: F) -> Self
    where
        F: Fn(&CallContext, &Instance, &BoundArguments) -> Result<(), Fault> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(move |ctx, ty, args| {
            let instance = Instance::new(Arc::clone(ty));
            init(ctx, &instance, args)?;
            Ok(Value::Instance(instance))
        }));
        self
    }

    /// Full constructor override; may return something other than an instance.
    pub fn constructor<F>(mut self, body: F) -> Self
    where
        F: Fn(&CallContext, &Arc<TypeDef>, &BoundArguments) -> Result<Value, Fault>
            + Send
            + Sync
            + 'static,
    {
        self.constructor = Some(Arc::new(body));
        self
    }

    pub fn method<F>(mut self, name: impl Into<String>, signature: Signature, body: F) -> Self
    where
        F: Fn(&CallContext, &Instance, &BoundArguments) -> Result<Value, Fault>
            + Send
            + Sync
            + 'static,
    {
        self.methods.push(Method::new(name, signature, body));
        self
    }

    pub fn build(self) -> Arc<TypeDef> {
        let constructor = self.constructor.unwrap_or_else(|| {
            Arc::new(|_ctx: &CallContext, ty: &Arc<TypeDef>, _args: &BoundArguments| {
                Ok(Value::Instance(Instance::new(Arc::clone(ty))))
            })
        });
        Arc::new(TypeDef {
            key: self.key,
            constructor_signature: self.constructor_signature,
            constructor,
            methods: self.methods,
        })
    }
}

/// One named item of a unit.
#[derive(Debug, Clone)]
pub enum Member {
    Function(Function),
    Type(Arc<TypeDef>),
    /// Non-invocable item (constant, re-export, submodule, ...).
    Other { description: String },
}

impl Member {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Member::Function(_) => "function",
            Member::Type(_) => "type",
            Member::Other { .. } => "other",
        }
    }

    pub fn signature(&self) -> Option<&Signature> {
        match self {
            Member::Function(f) => Some(f.signature()),
            Member::Type(t) => Some(t.constructor_signature()),
            Member::Other { .. } => None,
        }
    }
}

/// Raised when a unit's members cannot be enumerated at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationError {
    pub unit: String,
    pub message: String,
}

impl fmt::Display for EnumerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to enumerate members of '{}': {}",
            self.unit, self.message
        )
    }
}

impl std::error::Error for EnumerationError {}

/// Something whose members the explorer can enumerate.
pub trait MemberSource {
    fn unit_name(&self) -> &str;

    /// Members in loader order.
    fn members(&self) -> Result<Vec<(String, Member)>, EnumerationError>;
}

/// The loaded code under test. Immutable once built.
#[derive(Debug, Clone)]
pub struct Unit {
    name: String,
    members: Vec<(String, Member)>,
}

impl Unit {
    pub fn builder(name: impl Into<String>) -> UnitBuilder {
        UnitBuilder {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn member_list(&self) -> &[(String, Member)] {
        &self.members
    }

    pub fn get(&self, name: &str) -> Option<&Member> {
        self.members
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, m)| m)
    }
}

impl MemberSource for Unit {
    fn unit_name(&self) -> &str {
        &self.name
    }

    fn members(&self) -> Result<Vec<(String, Member)>, EnumerationError> {
        Ok(self.members.clone())
    }
}

pub struct UnitBuilder {
    name: String,
    members: Vec<(String, Member)>,
}

impl UnitBuilder {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn function<F>(mut self, name: impl Into<String>, signature: Signature, body: F) -> Self
    where
        F: Fn(&CallContext, &BoundArguments) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        let name = name.into();
        self.members.push((
            name.clone(),
            Member::Function(Function::new(name, signature, body)),
        ));
        self
    }

    /// Register a type under its own name.
    pub fn type_def(mut self, ty: Arc<TypeDef>) -> Self {
        self.members.push((ty.name().to_string(), Member::Type(ty)));
        self
    }

    /// Register a type under an alias (e.g. a re-export of a dependency's type).
    pub fn type_alias(mut self, alias: impl Into<String>, ty: Arc<TypeDef>) -> Self {
        self.members.push((alias.into(), Member::Type(ty)));
        self
    }

    pub fn other(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.members.push((
            name.into(),
            Member::Other {
                description: description.into(),
            },
        ));
        self
    }

    pub fn build(self) -> Unit {
        Unit {
            name: self.name,
            members: self.members,
        }
    }
}
