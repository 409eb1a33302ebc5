//! Interception Engine
//!
//! One [`Instrumentation`] per client kind. Call sites (or generated
//! wrappers) invoke [`before_call`](Instrumentation::before_call) and
//! [`after_call`](Instrumentation::after_call) around the real client
//! method; [`observe`](Instrumentation::observe) wraps both around a
//! closure. Handlers are strictly nested around the synchronous call, so
//! spans on one connection close in invocation order.
//!
//! The after-path is deliberately tolerant: invoked without a matching
//! before-handler it does nothing. Instrumentation failures must never
//! destabilize the host application.

use std::cell::RefCell;
use std::sync::Arc;

use ahash::AHashMap;
use opentelemetry::global::{self, BoxedTracer};
use opentelemetry::trace::{Link, SpanKind, Status, TraceContextExt, Tracer};
use opentelemetry::{Array, Context, ContextGuard, Key, KeyValue, StringValue, Value};

use crate::client::{CallFailure, ClientConnection, ClientKind, CodeLocation, CommandCall};
use crate::config::{ConfigSource, MARK_CONNECTION_NUMBER_KEY};
use crate::filter::CommandFilter;
use crate::naming;
use crate::semconv;
use crate::tracker::ConnectionTracker;

/// Commands that open a multi-command block on their connection.
pub const TRANSACTION_OPENERS: &[&str] = &["multi", "pipeline", "transaction"];

/// Commands that close an open multi-command block.
pub const TRANSACTION_CLOSERS: &[&str] = &["exec", "discard", "execute"];

/// Per-method interception options.
#[derive(Debug, Clone, Default)]
pub struct HookOptions {
    /// Static attributes merged onto the span before it ends.
    pub extra_attributes: Vec<KeyValue>,
    /// Record the finished span as the connection's link target, so every
    /// later command on the connection links back to it.
    pub start_tracking_connection: bool,
    /// Attach the sanitized argument list.
    pub track_parameters: bool,
    /// Consult the command filter before instrumenting.
    pub filter_commands: bool,
    /// Always-instrument allowlist bypassing the filter.
    pub non_command_methods: Vec<&'static str>,
}

impl HookOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extra_attributes(mut self, attributes: Vec<KeyValue>) -> Self {
        self.extra_attributes = attributes;
        self
    }

    pub fn start_tracking_connection(mut self) -> Self {
        self.start_tracking_connection = true;
        self
    }

    pub fn track_parameters(mut self) -> Self {
        self.track_parameters = true;
        self
    }

    pub fn filter_commands(mut self) -> Self {
        self.filter_commands = true;
        self
    }

    pub fn with_non_command_methods(mut self, methods: &[&'static str]) -> Self {
        self.non_command_methods = methods.to_vec();
        self
    }
}

struct ActiveCall {
    cx: Context,
    // Restores the previous ambient context when dropped; calls nest
    // strictly, so drops happen in reverse attach order.
    _guard: ContextGuard,
}

thread_local! {
    static ACTIVE_CALLS: RefCell<Vec<ActiveCall>> = const { RefCell::new(Vec::new()) };
}

/// Interception-and-correlation engine for one client kind.
pub struct Instrumentation {
    kind: ClientKind,
    tracer: BoxedTracer,
    tracker: Arc<dyn ConnectionTracker>,
    filter: Arc<CommandFilter>,
    config: Arc<dyn ConfigSource>,
    mark_connection_number: bool,
    hooks: AHashMap<String, HookOptions>,
    dispatch: Option<HookOptions>,
}

impl Instrumentation {
    /// Build an engine for `kind`. The connection-number toggle is read
    /// once here; configuration never changes at runtime.
    pub fn new(
        kind: ClientKind,
        tracker: Arc<dyn ConnectionTracker>,
        filter: Arc<CommandFilter>,
        config: Arc<dyn ConfigSource>,
    ) -> Self {
        let mark_connection_number = config.boolean(MARK_CONNECTION_NUMBER_KEY, true);
        Instrumentation {
            kind,
            tracer: global::tracer(format!("io.opentelemetry.contrib.redis.{}", kind.as_str())),
            tracker,
            filter,
            config,
            mark_connection_number,
            hooks: AHashMap::new(),
            dispatch: None,
        }
    }

    pub fn kind(&self) -> ClientKind {
        self.kind
    }

    pub fn tracker(&self) -> &Arc<dyn ConnectionTracker> {
        &self.tracker
    }

    /// Register interception options for one directly invoked method.
    pub fn install(&mut self, method: impl Into<String>, options: HookOptions) {
        self.hooks.insert(method.into(), options);
    }

    /// Register interception options for the generic dispatch entry point
    /// carrying forwarded calls.
    pub fn install_dispatch(&mut self, options: HookOptions) {
        self.dispatch = Some(options);
    }

    /// Signal that the host has torn down a connection; all tracked state
    /// for it becomes unreachable.
    pub fn forget_connection(&self, conn: &dyn ClientConnection) {
        self.tracker.forget(conn);
    }

    /// Before-handler: start and activate the span for `call`, unless the
    /// method has no hook or the filter excludes the command.
    pub fn before_call(
        &self,
        conn: &dyn ClientConnection,
        call: &CommandCall,
        location: Option<CodeLocation>,
    ) {
        let Some(options) = self.options_for(call) else {
            return;
        };
        let (name, args) = call.resolve();
        if self.excluded(name, options) {
            return;
        }

        let ordinal = if self.mark_connection_number {
            Some(self.tracker.ordinal_of(conn))
        } else {
            None
        };
        let span_name = naming::span_name(self.kind.as_str(), ordinal, name);

        let mut attributes = vec![KeyValue::new(
            Key::from_static_str(semconv::CODE_FUNCTION_NAME),
            name.to_string(),
        )];
        if let Some(location) = location {
            attributes.push(KeyValue::new(
                Key::from_static_str(semconv::CODE_NAMESPACE),
                location.namespace,
            ));
            attributes.push(KeyValue::new(
                Key::from_static_str(semconv::CODE_FILE_PATH),
                location.file,
            ));
            attributes.push(KeyValue::new(
                Key::from_static_str(semconv::CODE_LINE_NUMBER),
                location.line as i64,
            ));
        }
        if options.track_parameters {
            let params = naming::sanitize_args(args);
            if !params.is_empty() {
                let values: Vec<StringValue> =
                    params.into_iter().map(StringValue::from).collect();
                attributes.push(KeyValue::new(
                    Key::from_static_str(semconv::DB_OPERATION_PARAMETER),
                    Value::Array(Array::String(values)),
                ));
            }
        }
        attributes.push(KeyValue::new(
            Key::from_static_str(semconv::DB_OPERATION_NAME),
            name.to_string(),
        ));

        let mut builder = self
            .tracer
            .span_builder(span_name)
            .with_kind(SpanKind::Client)
            .with_attributes(attributes);
        if let Some(link_target) = self.tracker.link_target_for(conn) {
            builder = builder.with_links(vec![Link::new(link_target, Vec::new())]);
        }

        // Closing commands parent to the ambient context: the block they
        // terminate should not contain them.
        let ambient = Context::current();
        let parent = if TRANSACTION_CLOSERS.contains(&name) {
            ambient.clone()
        } else {
            self.tracker
                .open_transaction(conn)
                .unwrap_or_else(|| ambient.clone())
        };
        let span = self.tracer.build_with_context(builder, &parent);
        let cx = ambient.with_span(span);
        let guard = cx.clone().attach();

        if TRANSACTION_OPENERS.contains(&name) {
            self.tracker.begin_transaction(conn, cx.clone());
        }

        ACTIVE_CALLS.with(|calls| calls.borrow_mut().push(ActiveCall { cx, _guard: guard }));
    }

    /// After-handler: refresh connection attributes, record the outcome
    /// and close the span. Runs whether the wrapped call succeeded or
    /// failed; the failure itself propagates through the caller untouched.
    pub fn after_call(
        &self,
        conn: &dyn ClientConnection,
        call: &CommandCall,
        failure: Option<&CallFailure>,
    ) {
        let Some(options) = self.options_for(call) else {
            return;
        };
        let (name, args) = call.resolve();
        if self.excluded(name, options) {
            return;
        }

        if TRANSACTION_CLOSERS.contains(&name) {
            self.tracker.end_transaction(conn);
        }

        let Some(active) = ACTIVE_CALLS.with(|calls| calls.borrow_mut().pop()) else {
            // Invoked without a matching before-handler: no-op.
            return;
        };

        {
            let span = active.cx.span();
            for attribute in self.tracker.refresh_attributes(conn, name, args) {
                span.set_attribute(attribute);
            }
            for attribute in options.extra_attributes.iter().cloned() {
                span.set_attribute(attribute);
            }
            if options.start_tracking_connection {
                self.tracker
                    .record_link_target(conn, span.span_context().clone());
            }
            if let Some(failure) = failure {
                span.add_event(
                    semconv::EXCEPTION_EVENT,
                    vec![
                        KeyValue::new(
                            Key::from_static_str(semconv::EXCEPTION_TYPE),
                            failure.type_name,
                        ),
                        KeyValue::new(
                            Key::from_static_str(semconv::EXCEPTION_MESSAGE),
                            failure.message.clone(),
                        ),
                        KeyValue::new(Key::from_static_str(semconv::EXCEPTION_ESCAPED), true),
                    ],
                );
                span.set_status(Status::error(failure.message.clone()));
            }
            span.end();
        }
        // Dropping the guard restores the caller's ambient context.
        drop(active);
    }

    /// Run `f` with before/after handlers around it. The result, success
    /// or failure, is returned exactly as produced.
    pub fn observe<T, E, F>(
        &self,
        conn: &dyn ClientConnection,
        call: &CommandCall,
        location: Option<CodeLocation>,
        f: F,
    ) -> Result<T, E>
    where
        E: std::error::Error + 'static,
        F: FnOnce() -> Result<T, E>,
    {
        self.before_call(conn, call, location);
        let result = f();
        let failure = result.as_ref().err().map(CallFailure::from_error);
        self.after_call(conn, call, failure.as_ref());
        result
    }

    fn options_for(&self, call: &CommandCall) -> Option<&HookOptions> {
        match call {
            CommandCall::Direct { name, .. } => self.hooks.get(name.as_str()),
            CommandCall::Forwarded { .. } => self.dispatch.as_ref(),
        }
    }

    /// Filter verdict: excluded commands get no span at all, while
    /// non-command methods always pass.
    fn excluded(&self, name: &str, options: &HookOptions) -> bool {
        if !options.filter_commands {
            return false;
        }
        let allowed = self.filter.resolve(self.kind, self.config.as_ref());
        !allowed.contains(name) && !options.non_command_methods.iter().any(|m| *m == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::StaticConnection;
    use crate::config::{functions_key, MapConfig};
    use crate::tracker::StandaloneTracker;

    fn engine_with(config: MapConfig) -> Instrumentation {
        Instrumentation::new(
            ClientKind::Redis,
            Arc::new(StandaloneTracker::new()),
            Arc::new(CommandFilter::new()),
            Arc::new(config),
        )
    }

    fn active_depth() -> usize {
        ACTIVE_CALLS.with(|calls| calls.borrow().len())
    }

    #[test]
    fn test_uninstalled_method_is_ignored() {
        let engine = engine_with(MapConfig::new());
        let conn = StaticConnection::new("localhost", 6379);
        let call = CommandCall::direct("get", vec!["key".into()]);

        engine.before_call(&conn, &call, None);
        assert_eq!(active_depth(), 0);
        engine.after_call(&conn, &call, None);
    }

    #[test]
    fn test_filtered_command_produces_no_active_call() {
        let config = MapConfig::new().with(functions_key(ClientKind::Redis), "mget");
        let mut engine = engine_with(config);
        engine.install_dispatch(HookOptions::new().filter_commands());

        let conn = StaticConnection::new("localhost", 6379);
        let call = CommandCall::forwarded("get", vec![]);
        engine.before_call(&conn, &call, None);
        assert_eq!(active_depth(), 0);
        engine.after_call(&conn, &call, None);
    }

    #[test]
    fn test_non_command_method_bypasses_filter() {
        let config = MapConfig::new().with(functions_key(ClientKind::Redis), "mget");
        let mut engine = engine_with(config);
        engine.install_dispatch(
            HookOptions::new()
                .filter_commands()
                .with_non_command_methods(&["pipeline"]),
        );

        let conn = StaticConnection::new("localhost", 6379);
        let call = CommandCall::forwarded("pipeline", vec![]);
        engine.before_call(&conn, &call, None);
        assert_eq!(active_depth(), 1);
        engine.after_call(&conn, &call, None);
        assert_eq!(active_depth(), 0);
    }

    #[test]
    fn test_after_without_before_is_a_noop() {
        let mut engine = engine_with(MapConfig::new());
        engine.install("get", HookOptions::new());
        let conn = StaticConnection::new("localhost", 6379);
        let call = CommandCall::direct("get", vec![]);

        // Must not panic or underflow the active-call stack.
        engine.after_call(&conn, &call, None);
        assert_eq!(active_depth(), 0);
    }

    #[test]
    fn test_observe_passes_results_through() {
        let mut engine = engine_with(MapConfig::new());
        engine.install("get", HookOptions::new().track_parameters());
        let conn = StaticConnection::new("localhost", 6379);
        let call = CommandCall::direct("get", vec!["key".into()]);

        let ok: Result<u32, std::io::Error> = engine.observe(&conn, &call, None, || Ok(7));
        assert_eq!(ok.unwrap(), 7);

        let err: Result<(), std::io::Error> = engine.observe(&conn, &call, None, || {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"))
        });
        let err = err.unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(active_depth(), 0);
    }

    #[test]
    fn test_transaction_state_follows_open_and_close() {
        let mut engine = engine_with(MapConfig::new());
        engine.install("multi", HookOptions::new());
        engine.install("exec", HookOptions::new());
        let conn = StaticConnection::new("localhost", 6379);

        let open = CommandCall::direct("multi", vec![]);
        engine.before_call(&conn, &open, None);
        engine.after_call(&conn, &open, None);
        assert!(engine.tracker().open_transaction(&conn).is_some());

        let close = CommandCall::direct("exec", vec![]);
        engine.before_call(&conn, &close, None);
        engine.after_call(&conn, &close, None);
        assert!(engine.tracker().open_transaction(&conn).is_none());
    }
}
