//! Redis Client Instrumentation
//!
//! Call-level tracing for Redis client libraries with incompatible APIs.
//! Callers notify the [`engine::Instrumentation`] before and after each
//! client method invocation; the engine produces OpenTelemetry client
//! spans with database semantic attributes, per-connection ordinals,
//! links back to the connection-establishing span, and transaction
//! bridging for multi/pipeline blocks.
//!
//! Which commands are traced is controlled through environment-style
//! configuration parsed by [`filter::CommandFilter`] against the command
//! catalog in [`catalog`].

pub mod catalog;
pub mod client;
pub mod config;
pub mod engine;
pub mod filter;
pub mod naming;
pub mod semconv;
pub mod setup;
pub mod tracker;

pub use catalog::CommandGroup;
pub use client::{
    CallFailure, ClientConnection, ClientKind, CodeLocation, CommandArg, CommandCall,
    ConnectionId, Endpoint, EndpointResolution, StaticConnection,
};
pub use config::{ConfigSource, EnvConfig, MapConfig};
pub use engine::{HookOptions, Instrumentation};
pub use filter::CommandFilter;
pub use tracker::{ClusterTracker, ConnectionTracker, StandaloneTracker};
