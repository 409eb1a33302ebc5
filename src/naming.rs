//! Span Naming and Parameter Sanitization
//!
//! Pure helpers producing the span display name and the flattened,
//! truncated argument list attached under `db.operation.parameter`.

use crate::client::CommandArg;

/// Longest string argument recorded on a span, in characters.
const MAX_PARAM_CHARS: usize = 100;

/// Span display name: `"<kind>(<ordinal>) <command>"` when connection-number
/// marking is enabled, `"<kind> <command>"` otherwise.
pub fn span_name(kind: &str, ordinal: Option<usize>, command: &str) -> String {
    match ordinal {
        Some(n) => format!("{}({}) {}", kind, n, command),
        None => format!("{} {}", kind, command),
    }
}

/// Flatten and truncate call arguments for span recording.
///
/// Strings are capped at [`MAX_PARAM_CHARS`]; nested lists are sanitized
/// recursively and joined with a comma; other scalars are stringified.
pub fn sanitize_args(args: &[CommandArg]) -> Vec<String> {
    args.iter().map(sanitize_arg).collect()
}

fn sanitize_arg(arg: &CommandArg) -> String {
    match arg {
        CommandArg::Str(value) => truncate_chars(value, MAX_PARAM_CHARS).to_string(),
        CommandArg::Int(value) => value.to_string(),
        CommandArg::Float(value) => value.to_string(),
        CommandArg::Bool(value) => value.to_string(),
        CommandArg::List(items) => sanitize_args(items).join(","),
    }
}

/// Character-boundary-safe prefix of `s`.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
