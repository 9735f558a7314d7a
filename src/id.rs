//! Newtypes defining type-strong IDs for the entities this crate routes on.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

/// ID of a guild (a chat community). Stable for the guild's lifetime.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct GuildId(#[serde(with = "crate::id::snowflake")] pub u64);

impl Display for GuildId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl From<u64> for GuildId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// ID of a voice channel inside a guild.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct ChannelId(#[serde(with = "crate::id::snowflake")] pub u64);

impl Display for ChannelId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl From<u64> for ChannelId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Index of a gateway shard, in `[0, shard_count)`.
///
/// Derived from a [`GuildId`] by [`shard_id`]; never constructed from wire
/// data directly.
///
/// [`shard_id`]: crate::shards::shard_id
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ShardId(pub u64);

impl Display for ShardId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl From<u64> for ShardId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Snowflakes travel as decimal strings on the wire, though some senders
/// still emit bare integers. Serialization always picks the string form.
pub(crate) mod snowflake {
    use std::fmt;

    use serde::de::{Error, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        deserializer.deserialize_any(SnowflakeVisitor)
    }

    struct SnowflakeVisitor;

    impl<'de> Visitor<'de> for SnowflakeVisitor {
        type Value = u64;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("an unsigned 64-bit integer or its string form")
        }

        fn visit_u64<E: Error>(self, value: u64) -> Result<u64, E> {
            Ok(value)
        }

        fn visit_str<E: Error>(self, value: &str) -> Result<u64, E> {
            value.parse().map_err(Error::custom)
        }
    }
}

#[cfg(test)]
mod test {
    use super::GuildId;

    #[test]
    fn snowflake_accepts_string_and_integer() {
        let from_string: GuildId = serde_json::from_str("\"81384788765712384\"").unwrap();
        let from_integer: GuildId = serde_json::from_str("81384788765712384").unwrap();

        assert_eq!(from_string, GuildId(81384788765712384));
        assert_eq!(from_string, from_integer);
    }

    #[test]
    fn snowflake_serializes_as_string() {
        let json = serde_json::to_string(&GuildId(4)).unwrap();

        assert_eq!(json, "\"4\"");
    }
}
