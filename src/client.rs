//! Client Capability Surface
//!
//! The instrumentation layer never links the client libraries it observes.
//! Hosts adapt each client through [`ClientConnection`], a small capability
//! trait covering identity, connectivity and transport metadata. Everything
//! else in the crate works against this trait.

use std::sync::atomic::{AtomicU64, Ordering};

/// The client implementations this crate knows how to instrument.
///
/// Functionally equivalent clients with incompatible APIs; the kind selects
/// the span-name prefix, the configuration key and the filter cache slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientKind {
    /// Plain single-endpoint client.
    Redis,
    /// Cluster-capable client with aggregate connections.
    RedisCluster,
    /// Pool-backed client dispatching commands through a generic entry point.
    Pooled,
}

impl ClientKind {
    /// Lowercase prefix used in span display names.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientKind::Redis => "redis",
            ClientKind::RedisCluster => "redis-cluster",
            ClientKind::Pooled => "pooled",
        }
    }

    /// Segment used when building per-kind configuration keys.
    pub(crate) fn config_segment(&self) -> &'static str {
        match self {
            ClientKind::Redis => "REDIS",
            ClientKind::RedisCluster => "REDIS_CLUSTER",
            ClientKind::Pooled => "POOLED",
        }
    }
}

/// Identity of one observed connection object.
///
/// Identity-equality only. Adapters must hand out the same id for the same
/// underlying client object for as long as it lives; ids of dropped
/// connections may be forgotten via the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl ConnectionId {
    /// Allocate a fresh process-unique id for a newly created adapter.
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        ConnectionId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Remote endpoint of a connection's current transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Tcp { host: String, port: u16 },
    Unix { path: String },
}

/// Outcome of resolving the transport serving one specific command.
///
/// Aggregate connections may be unable to pin certain multi-key commands to
/// a single node; that is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum EndpointResolution {
    Resolved {
        endpoint: Endpoint,
        database: Option<i64>,
    },
    Unresolvable,
}

/// One argument of an instrumented call.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandArg {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<CommandArg>),
}

impl From<&str> for CommandArg {
    fn from(value: &str) -> Self {
        CommandArg::Str(value.to_string())
    }
}

impl From<String> for CommandArg {
    fn from(value: String) -> Self {
        CommandArg::Str(value)
    }
}

impl From<i64> for CommandArg {
    fn from(value: i64) -> Self {
        CommandArg::Int(value)
    }
}

/// An intercepted call, canonicalized before any other logic runs.
///
/// `Forwarded` models generic dispatch entry points that carry the real
/// command name and arguments as their own payload.
#[derive(Debug, Clone)]
pub enum CommandCall {
    Direct {
        name: String,
        args: Vec<CommandArg>,
    },
    Forwarded {
        inner_name: String,
        inner_args: Vec<CommandArg>,
    },
}

impl CommandCall {
    pub fn direct(name: impl Into<String>, args: Vec<CommandArg>) -> Self {
        CommandCall::Direct {
            name: name.into(),
            args,
        }
    }

    pub fn forwarded(name: impl Into<String>, args: Vec<CommandArg>) -> Self {
        CommandCall::Forwarded {
            inner_name: name.into(),
            inner_args: args,
        }
    }

    /// The canonical `(name, args)` pair of this call.
    pub fn resolve(&self) -> (&str, &[CommandArg]) {
        match self {
            CommandCall::Direct { name, args } => (name, args),
            CommandCall::Forwarded {
                inner_name,
                inner_args,
            } => (inner_name, inner_args),
        }
    }

    /// Whether the call arrived through a generic dispatch wrapper.
    pub fn is_forwarded(&self) -> bool {
        matches!(self, CommandCall::Forwarded { .. })
    }
}

/// Failure of the wrapped call, observed for span recording only.
///
/// The error itself stays with the caller and propagates unchanged.
#[derive(Debug, Clone)]
pub struct CallFailure {
    pub type_name: &'static str,
    pub message: String,
}

impl CallFailure {
    pub fn from_error<E: std::error::Error + ?Sized + 'static>(error: &E) -> Self {
        CallFailure {
            type_name: std::any::type_name::<E>(),
            message: error.to_string(),
        }
    }
}

/// Originating source location of an instrumented call.
#[derive(Debug, Clone, Copy)]
pub struct CodeLocation {
    pub namespace: &'static str,
    pub file: &'static str,
    pub line: u32,
}

/// Capture the current source location for span attributes.
#[macro_export]
macro_rules! code_location {
    () => {
        $crate::client::CodeLocation {
            namespace: module_path!(),
            file: file!(),
            line: line!(),
        }
    };
}

/// Capability view of one client/transport instance.
///
/// The instrumentation layer only observes connections supplied by caller
/// code; implementations must never let it extend their lifetime.
pub trait ClientConnection {
    /// Stable identity of the underlying client object.
    fn id(&self) -> ConnectionId;

    /// Whether the transport is currently established. When false the
    /// tracker returns whatever attributes it already collected and skips
    /// transport introspection entirely.
    fn is_connected(&self) -> bool;

    /// Remote endpoint of the current transport, if known.
    fn endpoint(&self) -> Option<Endpoint>;

    /// Currently selected database index, if known.
    fn selected_database(&self) -> Option<i64>;

    /// Whether this connection fans out over multiple nodes.
    fn is_aggregate(&self) -> bool {
        false
    }

    /// Resolve the transport that would serve `command`. Aggregate clients
    /// override this; the default answers from the plain endpoint.
    fn endpoint_for(&self, _command: &str, _args: &[CommandArg]) -> EndpointResolution {
        match self.endpoint() {
            Some(endpoint) => EndpointResolution::Resolved {
                endpoint,
                database: self.selected_database(),
            },
            None => EndpointResolution::Unresolvable,
        }
    }
}

/// Fixed-metadata adapter.
///
/// Useful for hosts whose client exposes its endpoint up front, and as the
/// connection double in this crate's own tests.
#[derive(Debug, Clone)]
pub struct StaticConnection {
    id: ConnectionId,
    connected: bool,
    endpoint: Option<Endpoint>,
    database: Option<i64>,
    aggregate: bool,
    resolvable: bool,
}

impl StaticConnection {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        StaticConnection {
            id: ConnectionId::next(),
            connected: true,
            endpoint: Some(Endpoint::Tcp {
                host: host.into(),
                port,
            }),
            database: Some(0),
            aggregate: false,
            resolvable: true,
        }
    }

    pub fn unix(path: impl Into<String>) -> Self {
        StaticConnection {
            id: ConnectionId::next(),
            connected: true,
            endpoint: Some(Endpoint::Unix { path: path.into() }),
            database: Some(0),
            aggregate: false,
            resolvable: true,
        }
    }

    pub fn disconnected() -> Self {
        StaticConnection {
            id: ConnectionId::next(),
            connected: false,
            endpoint: None,
            database: None,
            aggregate: false,
            resolvable: true,
        }
    }

    pub fn with_database(mut self, database: i64) -> Self {
        self.database = Some(database);
        self
    }

    pub fn with_aggregate(mut self, aggregate: bool) -> Self {
        self.aggregate = aggregate;
        self
    }

    /// Make `endpoint_for` report every command as unresolvable.
    pub fn with_unresolvable_commands(mut self) -> Self {
        self.resolvable = false;
        self
    }

    pub fn set_resolvable(&mut self, resolvable: bool) {
        self.resolvable = resolvable;
    }

    pub fn set_endpoint(&mut self, host: impl Into<String>, port: u16) {
        self.endpoint = Some(Endpoint::Tcp {
            host: host.into(),
            port,
        });
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn select_database(&mut self, database: i64) {
        self.database = Some(database);
    }
}

impl ClientConnection for StaticConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn endpoint(&self) -> Option<Endpoint> {
        self.endpoint.clone()
    }

    fn selected_database(&self) -> Option<i64> {
        self.database
    }

    fn is_aggregate(&self) -> bool {
        self.aggregate
    }

    fn endpoint_for(&self, _command: &str, _args: &[CommandArg]) -> EndpointResolution {
        if !self.resolvable {
            return EndpointResolution::Unresolvable;
        }
        match self.endpoint() {
            Some(endpoint) => EndpointResolution::Resolved {
                endpoint,
                database: self.selected_database(),
            },
            None => EndpointResolution::Unresolvable,
        }
    }
}
