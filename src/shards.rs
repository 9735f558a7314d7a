//! Mapping from guilds to the gateway processes that own their voice
//! events.
//!
//! Guilds are partitioned across shards by the platform's own assignment
//! rule, and a shard tracker says which process instance currently serves
//! each shard. The two lookups are separate on purpose: the first is pure
//! arithmetic, the second changes whenever the cluster rolls.

use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::num::NonZeroU64;

use parking_lot::RwLock;

use crate::id::{GuildId, ShardId};

/// Computes the shard a guild's gateway events land on.
///
/// The high bits of a snowflake encode its creation instant, so the id is
/// shifted down before the modulus; without the shift, guilds created close
/// together would cluster onto one shard.
///
/// # Examples
///
/// ```rust
/// use std::num::NonZeroU64;
///
/// use lyrebird::{shard_id, GuildId, ShardId};
///
/// let count = NonZeroU64::new(17).unwrap();
/// assert_eq!(shard_id(GuildId(81384788765712384), count), ShardId(7));
/// ```
#[inline]
#[must_use]
pub fn shard_id(guild_id: GuildId, shard_count: NonZeroU64) -> ShardId {
    ShardId((guild_id.0 >> 22) % shard_count.get())
}

/// Opaque address of the gateway process currently serving a shard.
///
/// Obtained from a [`ShardTracker`] at send time and valid only until that
/// process restarts; holding one across sends defeats the tracker.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct RoutingKey(pub String);

impl Display for RoutingKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl From<String> for RoutingKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for RoutingKey {
    fn from(key: &str) -> Self {
        Self(key.to_owned())
    }
}

/// Tracks which gateway process currently claims each shard.
pub trait ShardTracker: Send + Sync {
    /// Returns the routing key of the process serving `shard_id`, or `None`
    /// while no process claims it (routine during a rolling deploy).
    ///
    /// Callers treat `None` as transient, never fatal.
    fn routing_key(&self, shard_id: ShardId) -> Option<RoutingKey>;
}

/// In-memory shard roster fed by cluster membership events.
///
/// The composition root registers a claim whenever a gateway process
/// announces itself and deregisters it when the process goes away; reads
/// vastly outnumber either.
#[derive(Debug, Default)]
pub struct ClusterRoster {
    claims: RwLock<HashMap<ShardId, RoutingKey>>,
}

impl ClusterRoster {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `key` as the process now serving `shard_id`, replacing any
    /// previous claim.
    pub fn register(&self, shard_id: ShardId, key: RoutingKey) {
        self.claims.write().insert(shard_id, key);
    }

    /// Drops the claim on `shard_id`, if any.
    pub fn deregister(&self, shard_id: ShardId) {
        self.claims.write().remove(&shard_id);
    }
}

impl ShardTracker for ClusterRoster {
    fn routing_key(&self, shard_id: ShardId) -> Option<RoutingKey> {
        self.claims.read().get(&shard_id).cloned()
    }
}

#[cfg(test)]
mod test {
    use std::num::NonZeroU64;

    use super::{shard_id, ClusterRoster, RoutingKey, ShardTracker};
    use crate::id::{GuildId, ShardId};

    fn count(n: u64) -> NonZeroU64 {
        NonZeroU64::new(n).unwrap()
    }

    #[test]
    fn shard_assignment_matches_platform_rule() {
        // (guild, shard count, expected shard), precomputed by hand from
        // (guild >> 22) % count.
        let fixed = [
            (123456789012345678, 4, 0),
            (123456789012345678, 64, 24),
            (81384788765712384, 17, 7),
            (850517154128461844, 16, 12),
            (41771983423143937, 10, 4),
            (155101583433989120, 12, 10),
            (4194304, 2, 1),
            (4194303, 2, 0),
        ];

        for (guild, shards, expected) in fixed {
            assert_eq!(
                shard_id(GuildId(guild), count(shards)),
                ShardId(expected),
                "guild {guild} across {shards} shards",
            );
        }
    }

    #[test]
    fn single_shard_owns_everything() {
        for guild in [1, 4194304, u64::MAX, 81384788765712384] {
            assert_eq!(shard_id(GuildId(guild), count(1)), ShardId(0));
        }
    }

    #[test]
    fn assignment_is_deterministic_and_in_range() {
        for guild in (0..2000).map(|n| n * 7_777_777_777) {
            for shards in 1..=32 {
                let first = shard_id(GuildId(guild), count(shards));
                let second = shard_id(GuildId(guild), count(shards));

                assert_eq!(first, second);
                assert!(first.0 < shards);
            }
        }
    }

    #[test]
    fn roster_register_and_replace() {
        let roster = ClusterRoster::new();
        assert_eq!(roster.routing_key(ShardId(2)), None);

        roster.register(ShardId(2), RoutingKey::from("sentinel-a"));
        assert_eq!(
            roster.routing_key(ShardId(2)),
            Some(RoutingKey::from("sentinel-a"))
        );

        roster.register(ShardId(2), RoutingKey::from("sentinel-b"));
        assert_eq!(
            roster.routing_key(ShardId(2)),
            Some(RoutingKey::from("sentinel-b"))
        );

        roster.deregister(ShardId(2));
        assert_eq!(roster.routing_key(ShardId(2)), None);
    }
}
