//! Type frontier explorer.
//!
//! Walks a unit's members in loader order: functions are invoked, types are
//! constructed, other members are skipped. A successful result that is an
//! instance of a type not yet seen in this session has its method surface
//! explored too, so every type's methods run at most once per session no
//! matter how many call paths produce it.
//!
//! The frontier is an explicit work queue owned by the session. Depth-first
//! traversal pushes discovered instances to the front of the queue,
//! breadth-first pushes them to the back, and an instance's own methods are
//! always queued at the front so they run contiguously.

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use prober_types::{EnumerationError, Instance, Member, MemberSource, Method, TypeKey, Value};

use crate::binder;
use crate::config::{ExploreConfig, OutputMode, Traversal};
use crate::errors::ProbeErrorKind;
use crate::invoker::{BoundedInvoker, Call, Verdict};
use crate::log::ExecutionLogSink;
use crate::record::{InvocationRecord, Outcome};
use crate::synthetic::SyntheticProvider;

/// Index of a type in a session's [`SeenTypes`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(usize);

/// Session-scoped set of explored types. Only ever grows.
#[derive(Debug, Default)]
pub struct SeenTypes {
    ids: HashMap<TypeKey, TypeId>,
    keys: Vec<TypeKey>,
}

impl SeenTypes {
    /// Mark `key` as seen. Returns `None` if it already was.
    pub fn insert(&mut self, key: &TypeKey) -> Option<TypeId> {
        if self.ids.contains_key(key) {
            return None;
        }
        let id = TypeId(self.keys.len());
        self.ids.insert(key.clone(), id);
        self.keys.push(key.clone());
        Some(id)
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.ids.contains_key(key)
    }

    pub fn key(&self, id: TypeId) -> Option<&TypeKey> {
        self.keys.get(id.0)
    }

    /// Keys in the order they were first seen.
    pub fn keys(&self) -> &[TypeKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Totals for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub unit: String,
    pub started_at: DateTime<Utc>,
    pub traversal: Traversal,
    pub invocations: u64,
    pub successes: u64,
    pub faults: u64,
    pub binding_faults: u64,
    pub timeouts: u64,
    /// Types whose method surface was explored, in discovery order.
    pub explored_types: Vec<String>,
    /// Non-invocable members.
    pub skipped: Vec<String>,
    pub elapsed_ms: u64,
}

enum Task {
    Member { name: String, member: Member },
    Instance { instance: Instance, label: String },
    Method { receiver: Instance, method: Method },
}

/// Drives the provider, binder, invoker and materializer over a unit.
#[derive(Debug, Clone, Default)]
pub struct Explorer {
    config: ExploreConfig,
}

impl Explorer {
    pub fn new(config: ExploreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExploreConfig {
        &self.config
    }

    /// Run one session over `source`, appending to `sink`.
    ///
    /// Only a failure to enumerate the members at all is returned as an error;
    /// it is also written to the sink.
    pub fn explore(
        &self,
        source: &dyn MemberSource,
        sink: &mut ExecutionLogSink,
    ) -> Result<SessionSummary, EnumerationError> {
        let unit = source.unit_name().to_string();
        let members = match source.members() {
            Ok(members) => members,
            Err(e) => {
                tracing::warn!("{}", e);
                sink.trace(format!("Failed to enumerate members of {unit}: {}", e.message));
                return Err(e);
            }
        };

        let mut session = Session::new(unit, self.config, sink);
        session.run(members);
        Ok(session.finish())
    }
}

/// Convenience wrapper: one session with `config`.
pub fn explore(
    source: &dyn MemberSource,
    config: ExploreConfig,
    sink: &mut ExecutionLogSink,
) -> Result<SessionSummary, EnumerationError> {
    Explorer::new(config).explore(source, sink)
}

struct Session<'a> {
    config: ExploreConfig,
    sink: &'a mut ExecutionLogSink,
    invoker: BoundedInvoker,
    provider: SyntheticProvider,
    seen: SeenTypes,
    frontier: VecDeque<Task>,
    summary: SessionSummary,
    start: Instant,
}

impl<'a> Session<'a> {
    fn new(unit: String, config: ExploreConfig, sink: &'a mut ExecutionLogSink) -> Self {
        Self {
            config,
            sink,
            invoker: BoundedInvoker::new(config.timeout).with_output(config.output),
            provider: SyntheticProvider::new(),
            seen: SeenTypes::default(),
            frontier: VecDeque::new(),
            summary: SessionSummary {
                session_id: Uuid::new_v4().to_string(),
                unit,
                started_at: Utc::now(),
                traversal: config.traversal,
                invocations: 0,
                successes: 0,
                faults: 0,
                binding_faults: 0,
                timeouts: 0,
                explored_types: Vec::new(),
                skipped: Vec::new(),
                elapsed_ms: 0,
            },
            start: Instant::now(),
        }
    }

    fn run(&mut self, members: Vec<(String, Member)>) {
        tracing::info!(
            "exploring '{}': {} members, {} traversal, {}ms budget",
            self.summary.unit,
            members.len(),
            self.config.traversal,
            self.config.timeout.as_millis()
        );

        for (name, member) in members {
            match member {
                Member::Other { .. } => self.summary.skipped.push(name),
                member => self.frontier.push_back(Task::Member { name, member }),
            }
        }

        while let Some(task) = self.frontier.pop_front() {
            match task {
                Task::Member { name, member } => self.visit_member(name, member),
                Task::Instance { instance, label } => self.expand_instance(instance, &label),
                Task::Method { receiver, method } => {
                    let returned = self.probe(Call::Method { receiver, method }, "[method]");
                    self.follow_return(returned);
                }
            }
        }

        self.sink
            .trace(format!("[skipped members] {}", self.summary.skipped.join(" ")));
    }

    fn finish(mut self) -> SessionSummary {
        self.summary.explored_types = self.seen.keys().iter().map(ToString::to_string).collect();
        self.summary.elapsed_ms = self.start.elapsed().as_millis() as u64;
        tracing::info!(
            "finished '{}': {} invocations ({} ok, {} faults, {} binding faults, {} timeouts), {} types explored",
            self.summary.unit,
            self.summary.invocations,
            self.summary.successes,
            self.summary.faults,
            self.summary.binding_faults,
            self.summary.timeouts,
            self.summary.explored_types.len()
        );
        self.summary
    }

    fn visit_member(&mut self, name: String, member: Member) {
        match member {
            Member::Function(function) => {
                let returned = self.probe(Call::Function(function), "[function]");
                self.follow_return(returned);
            }
            Member::Type(ty) => {
                let key = ty.key().clone();
                let returned = self.probe(Call::Constructor(ty), "[class]");
                // Only an instance of exactly the constructed type is explored here.
                if let Some(instance) = returned.as_ref().and_then(Value::as_instance).cloned() {
                    if instance.type_key() == &key && self.seen.insert(&key).is_some() {
                        self.discover(Task::Instance { instance, label: name });
                    }
                }
            }
            Member::Other { .. } => self.summary.skipped.push(name),
        }
    }

    /// Explore a returned instance whose type is native and not yet seen.
    fn follow_return(&mut self, returned: Option<Value>) {
        let Some(instance) = returned.as_ref().and_then(Value::as_instance).cloned() else {
            return;
        };
        let key = instance.type_key().clone();
        if !key.is_native_to(&self.summary.unit) || self.seen.insert(&key).is_none() {
            return;
        }
        self.sink.trace(format!("[investigate type] {key}"));
        self.discover(Task::Instance {
            instance,
            label: key.to_string(),
        });
    }

    fn discover(&mut self, task: Task) {
        match self.config.traversal {
            Traversal::DepthFirst => self.frontier.push_front(task),
            Traversal::BreadthFirst => self.frontier.push_back(task),
        }
    }

    fn expand_instance(&mut self, instance: Instance, label: &str) {
        self.sink.trace(format!("[instance methods] {label}"));
        let methods = instance.type_def().methods().to_vec();
        for method in methods.into_iter().rev() {
            self.frontier.push_front(Task::Method {
                receiver: instance.clone(),
                method,
            });
        }
    }

    /// Bind, invoke, materialize and log one call. Returns the materialized
    /// value on success.
    fn probe(&mut self, call: Call, header: &str) -> Option<Value> {
        self.sink.trace(format!("{header} {}", call.name()));

        let member = call.name().to_string();
        let receiver = call.receiver();
        let call_kind = call.kind();
        let timestamp = Utc::now();

        let (outcome, arguments, value, elapsed_ms) =
            match binder::bind(call.signature(), &self.provider) {
                Err(fault) => {
                    self.summary.binding_faults += 1;
                    let outcome = Outcome::Fault {
                        error: ProbeErrorKind::BindingFault,
                        kind: "BindingFault".to_string(),
                        message: fault.error.to_string(),
                    };
                    (outcome, fault.provenance, None, 0)
                }
                Ok(binding) => {
                    let invocation = self.invoker.invoke(call, binding.arguments);
                    if self.config.output == OutputMode::Log {
                        for line in invocation.output {
                            self.sink.trace(line);
                        }
                    }
                    let (outcome, value) = match invocation.verdict {
                        Verdict::Success(value) => {
                            self.summary.successes += 1;
                            (Outcome::success(&value), Some(value))
                        }
                        Verdict::Fault(fault) => {
                            self.summary.faults += 1;
                            (Outcome::fault(ProbeErrorKind::InvocationFault, &fault), None)
                        }
                        Verdict::Timeout(error) => {
                            self.summary.timeouts += 1;
                            (Outcome::Timeout { error }, None)
                        }
                    };
                    (
                        outcome,
                        binding.provenance,
                        value,
                        invocation.elapsed.as_millis() as u64,
                    )
                }
            };

        self.summary.invocations += 1;
        let record = InvocationRecord {
            seq: self.sink.next_seq(),
            timestamp,
            member,
            receiver,
            call_kind,
            arguments,
            outcome,
            elapsed_ms,
        };
        self.sink.append(record);
        value
    }
}
