//! Tracker for single-endpoint clients.

use opentelemetry::KeyValue;

use super::{ConnectionTracker, TrackerCore};
use crate::client::{ClientConnection, CommandArg, Endpoint};
use crate::semconv;

/// Tracks connections whose transport targets one fixed node.
///
/// Endpoint fields are recorded once; the selected database index is
/// refreshed on every call because `select` can move it.
#[derive(Default)]
pub struct StandaloneTracker {
    core: TrackerCore,
}

impl StandaloneTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConnectionTracker for StandaloneTracker {
    fn core(&self) -> &TrackerCore {
        &self.core
    }

    fn refresh_attributes(
        &self,
        conn: &dyn ClientConnection,
        _command: &str,
        _args: &[CommandArg],
    ) -> Vec<KeyValue> {
        // Introspect outside the table lock.
        let connected = conn.is_connected();
        let endpoint = if connected { conn.endpoint() } else { None };
        let database = if connected { conn.selected_database() } else { None };

        self.core.update_attributes(conn.id(), |attrs| {
            attrs.set_once(semconv::DB_SYSTEM_NAME, semconv::DB_SYSTEM_REDIS);
            if !connected {
                return;
            }
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
            if let Some(database) = database {
                attrs.set(semconv::DB_NAMESPACE, database);
            }
        })
    }
}
