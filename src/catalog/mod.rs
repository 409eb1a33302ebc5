//! Command Catalog
//!
//! Static registry mapping every known Redis command to a semantic group.
//! Loaded once, immutable; unknown names are simply absent.

use std::sync::OnceLock;

use ahash::AHashMap;

/// Semantic groups used for bulk include/exclude filtering.
///
/// `All` is synthetic: it never appears in the table but is accepted as a
/// filter tag covering the whole catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandGroup {
    Admin,
    Other,
    ReadOnly,
    Write,
    Blocking,
    PubSub,
    All,
}

impl CommandGroup {
    /// Configuration tag for this group.
    pub fn tag(&self) -> &'static str {
        match self {
            CommandGroup::Admin => "@admin",
            CommandGroup::Other => "@other",
            CommandGroup::ReadOnly => "@readonly",
            CommandGroup::Write => "@write",
            CommandGroup::Blocking => "@blocking",
            CommandGroup::PubSub => "@pubsub",
            CommandGroup::All => "@all",
        }
    }

    /// Parse a configuration tag back into a group.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "@admin" => Some(CommandGroup::Admin),
            "@other" => Some(CommandGroup::Other),
            "@readonly" => Some(CommandGroup::ReadOnly),
            "@write" => Some(CommandGroup::Write),
            "@blocking" => Some(CommandGroup::Blocking),
            "@pubsub" => Some(CommandGroup::PubSub),
            "@all" => Some(CommandGroup::All),
            _ => None,
        }
    }
}

/// Group of every known command.
pub fn group_of(command: &str) -> Option<CommandGroup> {
    index().get(command).copied()
}

/// True when the catalog knows the command.
pub fn is_known(command: &str) -> bool {
    index().contains_key(command)
}

/// All commands in a group, or the full catalog for [`CommandGroup::All`].
pub fn commands_in(group: CommandGroup) -> Vec<&'static str> {
    if group == CommandGroup::All {
        return all_commands();
    }
    COMMANDS
        .iter()
        .filter(|(_, g)| *g == group)
        .map(|(name, _)| *name)
        .collect()
}

/// Every command the catalog knows.
pub fn all_commands() -> Vec<&'static str> {
    COMMANDS.iter().map(|(name, _)| *name).collect()
}

fn index() -> &'static AHashMap<&'static str, CommandGroup> {
    static INDEX: OnceLock<AHashMap<&'static str, CommandGroup>> = OnceLock::new();
    INDEX.get_or_init(|| COMMANDS.iter().copied().collect())
}

#[rustfmt::skip]
static COMMANDS: &[(&str, CommandGroup)] = &[
    ("bgrewriteaof", CommandGroup::Admin),
    ("bgsave", CommandGroup::Admin),
    ("debug", CommandGroup::Admin),
    ("failover", CommandGroup::Admin),
    ("monitor", CommandGroup::Admin),
    ("pfselftest", CommandGroup::Admin),
    ("psync", CommandGroup::Admin),
    ("replconf", CommandGroup::Admin),
    ("replicaof", CommandGroup::Admin),
    ("save", CommandGroup::Admin),
    ("shutdown", CommandGroup::Admin),
    ("slaveof", CommandGroup::Admin),
    ("sync", CommandGroup::Admin),
    ("wait", CommandGroup::Blocking),
    ("waitaof", CommandGroup::Blocking),
    ("acl", CommandGroup::Other),
    ("asking", CommandGroup::Other),
    ("auth", CommandGroup::Other),
    ("client", CommandGroup::Other),
    ("cluster", CommandGroup::Other),
    ("command", CommandGroup::Other),
    ("config", CommandGroup::Other),
    ("discard", CommandGroup::Other),
    ("echo", CommandGroup::Other),
    ("eval", CommandGroup::Other),
    ("evalsha", CommandGroup::Other),
    ("exec", CommandGroup::Other),
    ("fcall", CommandGroup::Other),
    ("function", CommandGroup::Other),
    ("hello", CommandGroup::Other),
    ("info", CommandGroup::Other),
    ("lastsave", CommandGroup::Other),
    ("latency", CommandGroup::Other),
    ("memory", CommandGroup::Other),
    ("module", CommandGroup::Other),
    ("multi", CommandGroup::Other),
    ("object", CommandGroup::Other),
    ("ping", CommandGroup::Other),
    ("pubsub", CommandGroup::Other),
    ("quit", CommandGroup::Other),
    ("readonly", CommandGroup::Other),
    ("readwrite", CommandGroup::Other),
    ("reset", CommandGroup::Other),
    ("role", CommandGroup::Other),
    ("script", CommandGroup::Other),
    ("select", CommandGroup::Other),
    ("slowlog", CommandGroup::Other),
    ("time", CommandGroup::Other),
    ("unwatch", CommandGroup::Other),
    ("watch", CommandGroup::Other),
    ("xgroup", CommandGroup::Other),
    ("xinfo", CommandGroup::Other),
    ("psubscribe", CommandGroup::PubSub),
    ("publish", CommandGroup::PubSub),
    ("punsubscribe", CommandGroup::PubSub),
    ("spublish", CommandGroup::PubSub),
    ("ssubscribe", CommandGroup::PubSub),
    ("subscribe", CommandGroup::PubSub),
    ("sunsubscribe", CommandGroup::PubSub),
    ("unsubscribe", CommandGroup::PubSub),
    ("bitcount", CommandGroup::ReadOnly),
    ("bitfield_ro", CommandGroup::ReadOnly),
    ("bitpos", CommandGroup::ReadOnly),
    ("dbsize", CommandGroup::ReadOnly),
    ("dump", CommandGroup::ReadOnly),
    ("eval_ro", CommandGroup::ReadOnly),
    ("evalsha_ro", CommandGroup::ReadOnly),
    ("exists", CommandGroup::ReadOnly),
    ("expiretime", CommandGroup::ReadOnly),
    ("fcall_ro", CommandGroup::ReadOnly),
    ("geodist", CommandGroup::ReadOnly),
    ("geohash", CommandGroup::ReadOnly),
    ("geopos", CommandGroup::ReadOnly),
    ("georadius_ro", CommandGroup::ReadOnly),
    ("georadiusbymember_ro", CommandGroup::ReadOnly),
    ("geosearch", CommandGroup::ReadOnly),
    ("get", CommandGroup::ReadOnly),
    ("getbit", CommandGroup::ReadOnly),
    ("getrange", CommandGroup::ReadOnly),
    ("hexists", CommandGroup::ReadOnly),
    ("hexpiretime", CommandGroup::ReadOnly),
    ("hget", CommandGroup::ReadOnly),
    ("hgetall", CommandGroup::ReadOnly),
    ("hkeys", CommandGroup::ReadOnly),
    ("hlen", CommandGroup::ReadOnly),
    ("hmget", CommandGroup::ReadOnly),
    ("hpexpiretime", CommandGroup::ReadOnly),
    ("hpttl", CommandGroup::ReadOnly),
    ("hrandfield", CommandGroup::ReadOnly),
    ("hscan", CommandGroup::ReadOnly),
    ("hstrlen", CommandGroup::ReadOnly),
    ("httl", CommandGroup::ReadOnly),
    ("hvals", CommandGroup::ReadOnly),
    ("keys", CommandGroup::ReadOnly),
    ("lcs", CommandGroup::ReadOnly),
    ("lindex", CommandGroup::ReadOnly),
    ("llen", CommandGroup::ReadOnly),
    ("lolwut", CommandGroup::ReadOnly),
    ("lpos", CommandGroup::ReadOnly),
    ("lrange", CommandGroup::ReadOnly),
    ("mget", CommandGroup::ReadOnly),
    ("pexpiretime", CommandGroup::ReadOnly),
    ("pfcount", CommandGroup::ReadOnly),
    ("pttl", CommandGroup::ReadOnly),
    ("randomkey", CommandGroup::ReadOnly),
    ("scan", CommandGroup::ReadOnly),
    ("scard", CommandGroup::ReadOnly),
    ("sdiff", CommandGroup::ReadOnly),
    ("sinter", CommandGroup::ReadOnly),
    ("sintercard", CommandGroup::ReadOnly),
    ("sismember", CommandGroup::ReadOnly),
    ("smembers", CommandGroup::ReadOnly),
    ("smismember", CommandGroup::ReadOnly),
    ("sort_ro", CommandGroup::ReadOnly),
    ("srandmember", CommandGroup::ReadOnly),
    ("sscan", CommandGroup::ReadOnly),
    ("strlen", CommandGroup::ReadOnly),
    ("substr", CommandGroup::ReadOnly),
    ("sunion", CommandGroup::ReadOnly),
    ("touch", CommandGroup::ReadOnly),
    ("ttl", CommandGroup::ReadOnly),
    ("type", CommandGroup::ReadOnly),
    ("xlen", CommandGroup::ReadOnly),
    ("xpending", CommandGroup::ReadOnly),
    ("xrange", CommandGroup::ReadOnly),
    ("xread", CommandGroup::ReadOnly),
    ("xrevrange", CommandGroup::ReadOnly),
    ("zcard", CommandGroup::ReadOnly),
    ("zcount", CommandGroup::ReadOnly),
    ("zdiff", CommandGroup::ReadOnly),
    ("zinter", CommandGroup::ReadOnly),
    ("zintercard", CommandGroup::ReadOnly),
    ("zlexcount", CommandGroup::ReadOnly),
    ("zmscore", CommandGroup::ReadOnly),
    ("zrandmember", CommandGroup::ReadOnly),
    ("zrange", CommandGroup::ReadOnly),
    ("zrangebylex", CommandGroup::ReadOnly),
    ("zrangebyscore", CommandGroup::ReadOnly),
    ("zrank", CommandGroup::ReadOnly),
    ("zrevrange", CommandGroup::ReadOnly),
    ("zrevrangebylex", CommandGroup::ReadOnly),
    ("zrevrangebyscore", CommandGroup::ReadOnly),
    ("zrevrank", CommandGroup::ReadOnly),
    ("zscan", CommandGroup::ReadOnly),
    ("zscore", CommandGroup::ReadOnly),
    ("zunion", CommandGroup::ReadOnly),
    ("append", CommandGroup::Write),
    ("bitfield", CommandGroup::Write),
    ("bitop", CommandGroup::Write),
    ("blmove", CommandGroup::Write),
    ("blmpop", CommandGroup::Write),
    ("blpop", CommandGroup::Write),
    ("brpop", CommandGroup::Write),
    ("brpoplpush", CommandGroup::Write),
    ("bzmpop", CommandGroup::Write),
    ("bzpopmax", CommandGroup::Write),
    ("bzpopmin", CommandGroup::Write),
    ("copy", CommandGroup::Write),
    ("decr", CommandGroup::Write),
    ("decrby", CommandGroup::Write),
    ("del", CommandGroup::Write),
    ("expire", CommandGroup::Write),
    ("expireat", CommandGroup::Write),
    ("flushall", CommandGroup::Write),
    ("flushdb", CommandGroup::Write),
    ("geoadd", CommandGroup::Write),
    ("georadius", CommandGroup::Write),
    ("georadiusbymember", CommandGroup::Write),
    ("geosearchstore", CommandGroup::Write),
    ("getdel", CommandGroup::Write),
    ("getex", CommandGroup::Write),
    ("getset", CommandGroup::Write),
    ("hdel", CommandGroup::Write),
    ("hexpire", CommandGroup::Write),
    ("hexpireat", CommandGroup::Write),
    ("hincrby", CommandGroup::Write),
    ("hincrbyfloat", CommandGroup::Write),
    ("hmset", CommandGroup::Write),
    ("hpersist", CommandGroup::Write),
    ("hpexpire", CommandGroup::Write),
    ("hpexpireat", CommandGroup::Write),
    ("hset", CommandGroup::Write),
    ("hsetnx", CommandGroup::Write),
    ("incr", CommandGroup::Write),
    ("incrby", CommandGroup::Write),
    ("incrbyfloat", CommandGroup::Write),
    ("linsert", CommandGroup::Write),
    ("lmove", CommandGroup::Write),
    ("lmpop", CommandGroup::Write),
    ("lpop", CommandGroup::Write),
    ("lpush", CommandGroup::Write),
    ("lpushx", CommandGroup::Write),
    ("lrem", CommandGroup::Write),
    ("lset", CommandGroup::Write),
    ("ltrim", CommandGroup::Write),
    ("migrate", CommandGroup::Write),
    ("move", CommandGroup::Write),
    ("mset", CommandGroup::Write),
    ("msetnx", CommandGroup::Write),
    ("persist", CommandGroup::Write),
    ("pexpire", CommandGroup::Write),
    ("pexpireat", CommandGroup::Write),
    ("pfadd", CommandGroup::Write),
    ("pfdebug", CommandGroup::Write),
    ("pfmerge", CommandGroup::Write),
    ("psetex", CommandGroup::Write),
    ("rename", CommandGroup::Write),
    ("renamenx", CommandGroup::Write),
    ("restore", CommandGroup::Write),
    ("restore-asking", CommandGroup::Write),
    ("rpop", CommandGroup::Write),
    ("rpoplpush", CommandGroup::Write),
    ("rpush", CommandGroup::Write),
    ("rpushx", CommandGroup::Write),
    ("sadd", CommandGroup::Write),
    ("sdiffstore", CommandGroup::Write),
    ("set", CommandGroup::Write),
    ("setbit", CommandGroup::Write),
    ("setex", CommandGroup::Write),
    ("setnx", CommandGroup::Write),
    ("setrange", CommandGroup::Write),
    ("sinterstore", CommandGroup::Write),
    ("smove", CommandGroup::Write),
    ("sort", CommandGroup::Write),
    ("spop", CommandGroup::Write),
    ("srem", CommandGroup::Write),
    ("sunionstore", CommandGroup::Write),
    ("swapdb", CommandGroup::Write),
    ("unlink", CommandGroup::Write),
    ("xack", CommandGroup::Write),
    ("xadd", CommandGroup::Write),
    ("xautoclaim", CommandGroup::Write),
    ("xclaim", CommandGroup::Write),
    ("xdel", CommandGroup::Write),
    ("xreadgroup", CommandGroup::Write),
    ("xsetid", CommandGroup::Write),
    ("xtrim", CommandGroup::Write),
    ("zadd", CommandGroup::Write),
    ("zdiffstore", CommandGroup::Write),
    ("zincrby", CommandGroup::Write),
    ("zinterstore", CommandGroup::Write),
    ("zmpop", CommandGroup::Write),
    ("zpopmax", CommandGroup::Write),
    ("zpopmin", CommandGroup::Write),
    ("zrangestore", CommandGroup::Write),
    ("zrem", CommandGroup::Write),
    ("zremrangebylex", CommandGroup::Write),
    ("zremrangebyrank", CommandGroup::Write),
    ("zremrangebyscore", CommandGroup::Write),
    ("zunionstore", CommandGroup::Write),
];
