//! Per-Kind Wiring
//!
//! Convenience constructors assembling a ready-to-use engine for each
//! client kind: which methods get hooks, which of them establish the
//! connection's link target, and which go through the command filter.

use std::sync::Arc;

use crate::client::ClientKind;
use crate::config::{ConfigSource, TRACK_AGGREGATED_CONNECTIONS_KEY};
use crate::engine::{HookOptions, Instrumentation};
use crate::filter::CommandFilter;
use crate::tracker::{ClusterTracker, ConnectionTracker, StandaloneTracker};

/// Engine for the plain single-endpoint client: establishment methods
/// record the link target, every command in the resolved filter set is
/// instrumented with parameters.
pub fn standalone(config: Arc<dyn ConfigSource>, filter: Arc<CommandFilter>) -> Instrumentation {
    let tracker: Arc<dyn ConnectionTracker> = Arc::new(StandaloneTracker::new());
    let mut engine =
        Instrumentation::new(ClientKind::Redis, tracker, Arc::clone(&filter), Arc::clone(&config));

    for method in ["connect", "pconnect"] {
        engine.install(method, HookOptions::new().start_tracking_connection());
    }
    for command in filter.resolve(ClientKind::Redis, config.as_ref()).iter() {
        engine.install(*command, HookOptions::new().track_parameters());
    }
    // Hooked unconditionally: it drops connection-level client state.
    engine.install("reset", HookOptions::new());
    engine
}

/// Engine for the cluster-capable client. Sub-connection attribute
/// tracking is governed by its config toggle.
pub fn cluster(config: Arc<dyn ConfigSource>, filter: Arc<CommandFilter>) -> Instrumentation {
    let track = config.boolean(TRACK_AGGREGATED_CONNECTIONS_KEY, false);
    let tracker: Arc<dyn ConnectionTracker> = Arc::new(ClusterTracker::new(track));
    let mut engine = Instrumentation::new(
        ClientKind::RedisCluster,
        tracker,
        Arc::clone(&filter),
        Arc::clone(&config),
    );

    engine.install("connect", HookOptions::new().start_tracking_connection());
    for command in filter.resolve(ClientKind::RedisCluster, config.as_ref()).iter() {
        engine.install(*command, HookOptions::new().track_parameters());
    }
    engine
}

/// Engine for the pool-backed client, whose commands arrive through a
/// generic dispatch entry point. `pipeline`, `transaction` and `execute`
/// are not catalog commands but must always be instrumented so multi-call
/// blocks bridge correctly.
pub fn pooled(config: Arc<dyn ConfigSource>, filter: Arc<CommandFilter>) -> Instrumentation {
    let tracker: Arc<dyn ConnectionTracker> = Arc::new(StandaloneTracker::new());
    let mut engine =
        Instrumentation::new(ClientKind::Pooled, tracker, Arc::clone(&filter), Arc::clone(&config));

    engine.install("connect", HookOptions::new().start_tracking_connection());
    engine.install_dispatch(
        HookOptions::new()
            .track_parameters()
            .filter_commands()
            .with_non_command_methods(&["pipeline", "transaction", "execute"]),
    );
    engine
}
