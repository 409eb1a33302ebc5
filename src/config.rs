//! Instrumentation Configuration
//!
//! The crate only needs two capabilities from its configuration
//! collaborator: a string list and a boolean, both keyed by well-known
//! names. [`EnvConfig`] answers from the process environment;
//! [`MapConfig`] answers from fixed values for tests and embedded setups.
//!
//! Values are read once, before traffic flows; nothing re-reads
//! configuration per call.

use ahash::AHashMap;

use crate::client::ClientKind;

/// Per-kind filter value, e.g. `OTEL_INSTRUMENTATION_REDIS_REDIS_FUNCTIONS`.
/// Comma-separated command names and `@group` tags, `-` negates.
pub fn functions_key(kind: ClientKind) -> String {
    format!(
        "OTEL_INSTRUMENTATION_REDIS_{}_FUNCTIONS",
        kind.config_segment()
    )
}

/// Boolean toggle for the `(ordinal)` segment in span names. Default true.
pub const MARK_CONNECTION_NUMBER_KEY: &str =
    "OTEL_INSTRUMENTATION_REDIS_MARK_SPANS_WITH_CONNECTION_NUMBER";

/// Boolean toggle for per-call sub-connection attributes on aggregate
/// connections. Default false.
pub const TRACK_AGGREGATED_CONNECTIONS_KEY: &str =
    "OTEL_INSTRUMENTATION_REDIS_TRACK_AGGREGATED_CONNECTIONS";

/// Narrow configuration lookup used by the filter and the engine.
pub trait ConfigSource: Send + Sync {
    /// Comma-separated list under `key`; empty when unset.
    fn string_list(&self, key: &str) -> Vec<String>;

    /// Boolean under `key`, falling back to `default` when unset or
    /// unparseable.
    fn boolean(&self, key: &str, default: bool) -> bool;
}

/// Configuration from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConfig;

impl ConfigSource for EnvConfig {
    fn string_list(&self, key: &str) -> Vec<String> {
        match std::env::var(key) {
            Ok(raw) => split_list(&raw),
            Err(_) => Vec::new(),
        }
    }

    fn boolean(&self, key: &str, default: bool) -> bool {
        match std::env::var(key) {
            Ok(raw) => parse_boolean(&raw).unwrap_or(default),
            Err(_) => default,
        }
    }
}

/// Fixed-value configuration.
#[derive(Debug, Clone, Default)]
pub struct MapConfig {
    values: AHashMap<String, String>,
}

impl MapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

impl ConfigSource for MapConfig {
    fn string_list(&self, key: &str) -> Vec<String> {
        self.values.get(key).map(|raw| split_list(raw)).unwrap_or_default()
    }

    fn boolean(&self, key: &str, default: bool) -> bool {
        self.values
            .get(key)
            .and_then(|raw| parse_boolean(raw))
            .unwrap_or(default)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_boolean(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_trims_and_drops_empties() {
        assert_eq!(split_list("get, mget ,,@readonly"), vec!["get", "mget", "@readonly"]);
        assert!(split_list("").is_empty());
        assert!(split_list(" , ").is_empty());
    }

    #[test]
    fn test_parse_boolean() {
        assert_eq!(parse_boolean("true"), Some(true));
        assert_eq!(parse_boolean("TRUE"), Some(true));
        assert_eq!(parse_boolean("0"), Some(false));
        assert_eq!(parse_boolean("off"), Some(false));
        assert_eq!(parse_boolean("maybe"), None);
    }

    #[test]
    fn test_map_config_lookup() {
        let config = MapConfig::new()
            .with(functions_key(ClientKind::Redis), "get,mget")
            .with(MARK_CONNECTION_NUMBER_KEY, "false");

        assert_eq!(
            config.string_list(&functions_key(ClientKind::Redis)),
            vec!["get", "mget"]
        );
        assert!(config.string_list(&functions_key(ClientKind::Pooled)).is_empty());
        assert!(!config.boolean(MARK_CONNECTION_NUMBER_KEY, true));
        assert!(!config.boolean(TRACK_AGGREGATED_CONNECTIONS_KEY, false));
    }

    #[test]
    fn test_env_config_defaults() {
        let config = EnvConfig;
        assert!(config
            .string_list("REDIS_TRACE_TEST_KEY_THAT_DOES_NOT_EXIST")
            .is_empty());
        assert!(config.boolean("REDIS_TRACE_TEST_KEY_THAT_DOES_NOT_EXIST", true));
    }

    #[test]
    fn test_functions_key_per_kind() {
        assert_eq!(
            functions_key(ClientKind::Redis),
            "OTEL_INSTRUMENTATION_REDIS_REDIS_FUNCTIONS"
        );
        assert_eq!(
            functions_key(ClientKind::RedisCluster),
            "OTEL_INSTRUMENTATION_REDIS_REDIS_CLUSTER_FUNCTIONS"
        );
        assert_eq!(
            functions_key(ClientKind::Pooled),
            "OTEL_INSTRUMENTATION_REDIS_POOLED_FUNCTIONS"
        );
    }
}
