//! Span Attribute Keys
//!
//! OpenTelemetry semantic-convention attribute keys used on produced spans.
//! Kept as local constants so the crate does not chase renames between
//! semantic-convention releases.

/// Database system identifier, always [`DB_SYSTEM_REDIS`].
pub const DB_SYSTEM_NAME: &str = "db.system.name";

/// Command name being executed.
pub const DB_OPERATION_NAME: &str = "db.operation.name";

/// Sanitized command arguments (only when parameter tracking is enabled).
pub const DB_OPERATION_PARAMETER: &str = "db.operation.parameter";

/// Selected database index.
pub const DB_NAMESPACE: &str = "db.namespace";

/// Remote host, or socket path for unix-domain transports.
pub const SERVER_ADDRESS: &str = "server.address";

/// Remote port (absent for unix-domain transports).
pub const SERVER_PORT: &str = "server.port";

/// Name of the instrumented method.
pub const CODE_FUNCTION_NAME: &str = "code.function.name";

/// Module path of the call site.
pub const CODE_NAMESPACE: &str = "code.namespace";

/// Source file of the call site.
pub const CODE_FILE_PATH: &str = "code.file.path";

/// Source line of the call site.
pub const CODE_LINE_NUMBER: &str = "code.line.number";

/// Concrete error type recorded on the exception event.
pub const EXCEPTION_TYPE: &str = "exception.type";

/// Error message recorded on the exception event.
pub const EXCEPTION_MESSAGE: &str = "exception.message";

/// Whether the error escaped the instrumented call (always true here,
/// wrapped-call failures are never swallowed).
pub const EXCEPTION_ESCAPED: &str = "exception.escaped";

/// Value for [`DB_SYSTEM_NAME`].
pub const DB_SYSTEM_REDIS: &str = "redis";

/// Name of the event carrying exception details.
pub const EXCEPTION_EVENT: &str = "exception";
