//! Tracker for aggregate/cluster-capable clients.

use opentelemetry::KeyValue;

use super::{ConnectionTracker, TrackerCore};
use crate::client::{ClientConnection, CommandArg, Endpoint, EndpointResolution};
use crate::semconv;

/// Tracks connections that may fan out over multiple nodes.
///
/// For aggregate connections the endpoint serving a command is resolved
/// per call (a different node can answer every time), so endpoint fields
/// are overwritten on each refresh. Resolution of multi-key commands can
/// itself be unsupported; that degrades to "no additional attributes for
/// this call". Plain connections behave like the standalone tracker.
#[derive(Default)]
pub struct ClusterTracker {
    core: TrackerCore,
    track_sub_connections: bool,
}

impl ClusterTracker {
    /// `track_sub_connections` mirrors the aggregate-tracking config
    /// toggle; when false, aggregate connections only ever report the
    /// database system.
    pub fn new(track_sub_connections: bool) -> Self {
        ClusterTracker {
            core: TrackerCore::new(),
            track_sub_connections,
        }
    }
}

impl ConnectionTracker for ClusterTracker {
    fn core(&self) -> &TrackerCore {
        &self.core
    }

    fn refresh_attributes(
        &self,
        conn: &dyn ClientConnection,
        command: &str,
        args: &[CommandArg],
    ) -> Vec<KeyValue> {
        let connected = conn.is_connected();
        if !connected {
            return self.core.update_attributes(conn.id(), |attrs| {
                attrs.set_once(semconv::DB_SYSTEM_NAME, semconv::DB_SYSTEM_REDIS);
            });
        }

        if conn.is_aggregate() {
            if !self.track_sub_connections {
                return self.core.update_attributes(conn.id(), |attrs| {
                    attrs.set_once(semconv::DB_SYSTEM_NAME, semconv::DB_SYSTEM_REDIS);
                });
            }
            let resolution = conn.endpoint_for(command, args);
            return self.core.update_attributes(conn.id(), |attrs| {
                attrs.set_once(semconv::DB_SYSTEM_NAME, semconv::DB_SYSTEM_REDIS);
                match resolution {
                    EndpointResolution::Resolved { endpoint, database } => {
                        // Overwritten every call: another node may serve
                        // the next command.
                        match endpoint {
                            Endpoint::Tcp { host, port } => {
                                attrs.set(semconv::SERVER_ADDRESS, host);
                                attrs.set(semconv::SERVER_PORT, port as i64);
                            }
                            Endpoint::Unix { path } => {
                                attrs.set(semconv::SERVER_ADDRESS, path);
                            }
                        }
                        if let Some(database) = database {
                            attrs.set(semconv::DB_NAMESPACE, database);
                        }
                    }
                    EndpointResolution::Unresolvable => {}
                }
            });
        }

        let endpoint = conn.endpoint();
        let database = conn.selected_database();
        self.core.update_attributes(conn.id(), |attrs| {
            attrs.set_once(semconv::DB_SYSTEM_NAME, semconv::DB_SYSTEM_REDIS);
            match endpoint {
                Some(Endpoint::Tcp { host, port }) => {
                    attrs.set_once(semconv::SERVER_ADDRESS, host);
                    attrs.set_once(semconv::SERVER_PORT, port as i64);
                }
                Some(Endpoint::Unix { path }) => {
                    attrs.set_once(semconv::SERVER_ADDRESS, path);
                }
                None => {}
            }
            attrs.set(semconv::DB_NAMESPACE, database.unwrap_or(0));
        })
    }
}
