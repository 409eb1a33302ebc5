//! Command Filter
//!
//! Resolves the configured token list for a client kind into the concrete
//! set of commands to instrument. Results are memoized per kind for the
//! process lifetime; configuration is read before any traffic flows and is
//! assumed not to change afterwards.

use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use parking_lot::Mutex;

use crate::catalog::{self, CommandGroup};
use crate::client::ClientKind;
use crate::config::{functions_key, ConfigSource};

/// The resolved allow-set. Names borrow from the static catalog.
pub type CommandSet = Arc<AHashSet<&'static str>>;

/// Per-kind memoized filter resolution.
#[derive(Default)]
pub struct CommandFilter {
    cache: Mutex<AHashMap<ClientKind, CommandSet>>,
}

impl CommandFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands to instrument for `kind`, resolving and caching the
    /// configured token list on first use.
    pub fn resolve(&self, kind: ClientKind, config: &dyn ConfigSource) -> CommandSet {
        let mut cache = self.cache.lock();
        if let Some(set) = cache.get(&kind) {
            return Arc::clone(set);
        }
        let tokens = config.string_list(&functions_key(kind));
        let set = Arc::new(resolve_tokens(&tokens));
        cache.insert(kind, Arc::clone(&set));
        set
    }

    /// Drop every cached result. Test harnesses use this between cases;
    /// production setups never need it.
    pub fn reset(&self) {
        self.cache.lock().clear();
    }
}

/// Set-difference resolution: includes accumulate from names and group
/// tags, negated tokens accumulate excludes, excludes always win.
fn resolve_tokens(tokens: &[String]) -> AHashSet<&'static str> {
    let all: AHashSet<&'static str> = catalog::all_commands().into_iter().collect();
    if tokens.is_empty() || (tokens.len() == 1 && tokens[0] == CommandGroup::All.tag()) {
        return all;
    }

    let mut include: AHashSet<&'static str> = AHashSet::new();
    let mut exclude: AHashSet<&'static str> = AHashSet::new();

    for token in tokens {
        if let Some(&name) = all.get(token.as_str()) {
            include.insert(name);
        } else if let Some(group) = CommandGroup::from_tag(token) {
            include.extend(catalog::commands_in(group));
        } else if let Some(stripped) = token.strip_prefix('-') {
            if let Some(group) = CommandGroup::from_tag(stripped) {
                exclude.extend(catalog::commands_in(group));
            } else if let Some(&name) = all.get(stripped) {
                exclude.insert(name);
            } else {
                tracing::debug!(token = %token, "ignoring unrecognized command filter token");
            }
        } else {
            // Degrades to a smaller instrumented surface instead of
            // failing the host application.
            tracing::debug!(token = %token, "ignoring unrecognized command filter token");
        }
    }

    include.retain(|name| !exclude.contains(name));
    include
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;

    fn resolve(value: &str) -> AHashSet<&'static str> {
        let tokens: Vec<String> = value
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        resolve_tokens(&tokens)
    }

    #[test]
    fn test_empty_config_instruments_everything() {
        let set = resolve("");
        assert_eq!(set.len(), catalog::all_commands().len());
    }

    #[test]
    fn test_all_tag_instruments_everything() {
        let set = resolve("@all");
        assert_eq!(set.len(), catalog::all_commands().len());
    }

    #[test]
    fn test_exact_command_names() {
        let set = resolve("get,mget");
        assert_eq!(set.len(), 2);
        assert!(set.contains("get"));
        assert!(set.contains("mget"));
    }

    #[test]
    fn test_group_tag() {
        let set = resolve("@readonly");
        let read_only = catalog::commands_in(CommandGroup::ReadOnly);
        assert_eq!(set.len(), read_only.len());
        assert!(set.contains("get"));
        assert!(!set.contains("set"));
    }

    #[test]
    fn test_exclude_single_command() {
        let set = resolve("@all,-set");
        assert_eq!(set.len(), catalog::all_commands().len() - 1);
        assert!(!set.contains("set"));
        assert!(set.contains("get"));
    }

    #[test]
    fn test_exclude_whole_group() {
        let set = resolve("@all,-@readonly");
        let read_only = catalog::commands_in(CommandGroup::ReadOnly);
        assert_eq!(set.len(), catalog::all_commands().len() - read_only.len());
        assert!(!set.contains("get"));
        assert!(set.contains("set"));
    }

    #[test]
    fn test_excludes_win_regardless_of_position() {
        let first = resolve("-set,@write");
        let second = resolve("@write,-set");
        assert_eq!(first, second);
        assert!(!first.contains("set"));
        assert!(first.contains("del"));
    }

    #[test]
    fn test_unrecognized_token_alone_yields_empty_set() {
        let set = resolve("frobnicate");
        assert!(set.is_empty());
    }

    #[test]
    fn test_unrecognized_tokens_are_skipped() {
        let set = resolve("get,frobnicate,-nonsense");
        assert_eq!(set.len(), 1);
        assert!(set.contains("get"));
    }

    #[test]
    fn test_cache_is_per_kind_and_resettable() {
        let filter = CommandFilter::new();
        let config = MapConfig::new()
            .with(functions_key(ClientKind::Redis), "get")
            .with(functions_key(ClientKind::Pooled), "set");

        let redis = filter.resolve(ClientKind::Redis, &config);
        let pooled = filter.resolve(ClientKind::Pooled, &config);
        assert!(redis.contains("get") && !redis.contains("set"));
        assert!(pooled.contains("set") && !pooled.contains("get"));

        // Memoized: a changed config is invisible until reset.
        let changed = MapConfig::new().with(functions_key(ClientKind::Redis), "mget");
        let still = filter.resolve(ClientKind::Redis, &changed);
        assert!(still.contains("get"));

        filter.reset();
        let fresh = filter.resolve(ClientKind::Redis, &changed);
        assert!(fresh.contains("mget") && !fresh.contains("get"));
    }
}
