//! Connection Tracking
//!
//! Identity-keyed side table holding everything the engine needs to
//! correlate spans across calls on the same connection: a first-seen
//! ordinal, the cumulative attribute map, the span context of the call
//! that established the connection (link target), and the context of an
//! open transaction/pipeline block.
//!
//! The table never owns the connections it describes. Hosts signal
//! connection teardown through [`ConnectionTracker::forget`]; entries that
//! are never forgotten are a bounded leak proportional to connection
//! churn, not a correctness problem.

mod cluster;
mod standalone;

pub use cluster::ClusterTracker;
pub use standalone::StandaloneTracker;

use ahash::AHashMap;
use opentelemetry::trace::SpanContext;
use opentelemetry::{Context, Key, KeyValue, Value};
use parking_lot::Mutex;

use crate::client::{ClientConnection, CommandArg, ConnectionId};

/// Cumulative attribute map for one connection.
///
/// Endpoint fields use set-once semantics; call-dependent fields such as
/// the selected database index are overwritten on every refresh because
/// the transport can change target node per call.
#[derive(Debug, Default, Clone)]
pub struct AttributeMap {
    values: AHashMap<&'static str, Value>,
}

impl AttributeMap {
    /// Overwrite `key` unconditionally.
    pub fn set(&mut self, key: &'static str, value: impl Into<Value>) {
        self.values.insert(key, value.into());
    }

    /// Record `key` only if it has never been set.
    pub fn set_once(&mut self, key: &'static str, value: impl Into<Value>) {
        self.values.entry(key).or_insert_with(|| value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Read-only snapshot in span-attribute form.
    pub fn snapshot(&self) -> Vec<KeyValue> {
        self.values
            .iter()
            .map(|(key, value)| KeyValue::new(Key::from_static_str(key), value.clone()))
            .collect()
    }
}

#[derive(Debug, Default)]
struct ConnectionEntry {
    ordinal: usize,
    attributes: AttributeMap,
    link_target: Option<SpanContext>,
    transaction: Option<Context>,
}

/// Shared state behind every tracker implementation.
#[derive(Default)]
pub struct TrackerCore {
    state: Mutex<AHashMap<ConnectionId, ConnectionEntry>>,
}

impl TrackerCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the entry for `id`, creating it on first
    /// observation. A fresh entry's ordinal is the number of connections
    /// tracked at assignment time; ordinal values of forgotten
    /// connections may be reused.
    fn with_entry<R>(&self, id: ConnectionId, f: impl FnOnce(&mut ConnectionEntry) -> R) -> R {
        let mut state = self.state.lock();
        let next_ordinal = state.len();
        let entry = state.entry(id).or_insert_with(|| ConnectionEntry {
            ordinal: next_ordinal,
            ..ConnectionEntry::default()
        });
        f(entry)
    }

    pub fn ordinal_of(&self, id: ConnectionId) -> usize {
        self.with_entry(id, |entry| entry.ordinal)
    }

    pub fn attributes_of(&self, id: ConnectionId) -> Vec<KeyValue> {
        self.with_entry(id, |entry| entry.attributes.snapshot())
    }

    /// Mutate the attribute map and return the resulting snapshot.
    pub(crate) fn update_attributes(
        &self,
        id: ConnectionId,
        f: impl FnOnce(&mut AttributeMap),
    ) -> Vec<KeyValue> {
        self.with_entry(id, |entry| {
            f(&mut entry.attributes);
            entry.attributes.snapshot()
        })
    }

    pub fn link_target_for(&self, id: ConnectionId) -> Option<SpanContext> {
        self.with_entry(id, |entry| entry.link_target.clone())
    }

    pub fn record_link_target(&self, id: ConnectionId, span_context: SpanContext) {
        self.with_entry(id, |entry| entry.link_target = Some(span_context));
    }

    pub fn open_transaction(&self, id: ConnectionId) -> Option<Context> {
        self.with_entry(id, |entry| entry.transaction.clone())
    }

    /// Nested transactions are unsupported: opening while one is open
    /// replaces the stored context, no stack.
    pub fn begin_transaction(&self, id: ConnectionId, context: Context) {
        self.with_entry(id, |entry| entry.transaction = Some(context));
    }

    pub fn end_transaction(&self, id: ConnectionId) {
        self.with_entry(id, |entry| entry.transaction = None);
    }

    /// Drop all state for a connection the host has torn down.
    pub fn forget(&self, id: ConnectionId) {
        self.state.lock().remove(&id);
    }

    pub fn tracked_count(&self) -> usize {
        self.state.lock().len()
    }
}

/// Per-client-kind connection tracker.
///
/// Implementations share the collection shape through [`TrackerCore`] and
/// differ only in how [`refresh_attributes`](Self::refresh_attributes)
/// extracts transport metadata.
pub trait ConnectionTracker: Send + Sync {
    fn core(&self) -> &TrackerCore;

    /// Recompute transport-derived attributes after a call, merge them
    /// into the stored map and return the merged snapshot. Must not fail:
    /// unavailable metadata degrades to whatever was collected so far.
    fn refresh_attributes(
        &self,
        conn: &dyn ClientConnection,
        command: &str,
        args: &[CommandArg],
    ) -> Vec<KeyValue>;

    fn ordinal_of(&self, conn: &dyn ClientConnection) -> usize {
        self.core().ordinal_of(conn.id())
    }

    fn attributes_of(&self, conn: &dyn ClientConnection) -> Vec<KeyValue> {
        self.core().attributes_of(conn.id())
    }

    fn link_target_for(&self, conn: &dyn ClientConnection) -> Option<SpanContext> {
        self.core().link_target_for(conn.id())
    }

    fn record_link_target(&self, conn: &dyn ClientConnection, span_context: SpanContext) {
        self.core().record_link_target(conn.id(), span_context);
    }

    fn open_transaction(&self, conn: &dyn ClientConnection) -> Option<Context> {
        self.core().open_transaction(conn.id())
    }

    fn begin_transaction(&self, conn: &dyn ClientConnection, context: Context) {
        self.core().begin_transaction(conn.id(), context);
    }

    fn end_transaction(&self, conn: &dyn ClientConnection) {
        self.core().end_transaction(conn.id());
    }

    fn forget(&self, conn: &dyn ClientConnection) {
        self.core().forget(conn.id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::StaticConnection;
    use crate::semconv;

    #[test]
    fn test_ordinals_follow_first_seen_order() {
        let core = TrackerCore::new();
        let conns: Vec<StaticConnection> =
            (0..4).map(|_| StaticConnection::new("localhost", 6379)).collect();

        for (expected, conn) in conns.iter().enumerate() {
            assert_eq!(core.ordinal_of(conn.id()), expected);
        }
        // Stable on repeated observation.
        for (expected, conn) in conns.iter().enumerate() {
            assert_eq!(core.ordinal_of(conn.id()), expected);
        }
    }

    #[test]
    fn test_ordinal_values_may_be_reused_after_forget() {
        let core = TrackerCore::new();
        let a = StaticConnection::new("localhost", 6379);
        let b = StaticConnection::new("localhost", 6380);
        assert_eq!(core.ordinal_of(a.id()), 0);
        assert_eq!(core.ordinal_of(b.id()), 1);

        core.forget(a.id());
        assert_eq!(core.tracked_count(), 1);

        let c = StaticConnection::new("localhost", 6381);
        assert_eq!(core.ordinal_of(c.id()), 1);
        // Existing ordinals are untouched by removal.
        assert_eq!(core.ordinal_of(b.id()), 1);
    }

    #[test]
    fn test_set_once_vs_overwrite() {
        let mut attrs = AttributeMap::default();
        attrs.set_once(semconv::SERVER_ADDRESS, "localhost");
        attrs.set_once(semconv::SERVER_ADDRESS, "elsewhere");
        attrs.set(semconv::DB_NAMESPACE, 1_i64);
        attrs.set(semconv::DB_NAMESPACE, 5_i64);

        assert_eq!(
            attrs.get(semconv::SERVER_ADDRESS),
            Some(&Value::from("localhost"))
        );
        assert_eq!(attrs.get(semconv::DB_NAMESPACE), Some(&Value::I64(5)));
        assert_eq!(attrs.snapshot().len(), 2);
    }

    #[test]
    fn test_transaction_context_lifecycle() {
        let core = TrackerCore::new();
        let conn = StaticConnection::new("localhost", 6379);

        assert!(core.open_transaction(conn.id()).is_none());
        core.begin_transaction(conn.id(), Context::new());
        assert!(core.open_transaction(conn.id()).is_some());
        // Reopening replaces, no stack.
        core.begin_transaction(conn.id(), Context::new());
        assert!(core.open_transaction(conn.id()).is_some());
        core.end_transaction(conn.id());
        assert!(core.open_transaction(conn.id()).is_none());
    }

    #[test]
    fn test_forget_drops_all_state() {
        let core = TrackerCore::new();
        let conn = StaticConnection::new("localhost", 6379);
        core.begin_transaction(conn.id(), Context::new());
        core.update_attributes(conn.id(), |attrs| {
            attrs.set(semconv::DB_NAMESPACE, 2_i64);
        });

        core.forget(conn.id());
        assert_eq!(core.tracked_count(), 0);
        assert!(core.open_transaction(conn.id()).is_none());
        assert!(core
            .attributes_of(conn.id())
            .iter()
            .all(|kv| kv.key.as_str() != semconv::DB_NAMESPACE));
    }
}
