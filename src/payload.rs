//! Messages exchanged with the gateway processes that hold the real Discord
//! connections.
//!
//! Outbound, the bot steers a guild's voice state with a [`ControlMessage`]
//! on the bus. Inbound, the process owning the guild's shard reports the
//! platform's half of the handshake as a [`VoiceServerUpdate`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::{ChannelId, GuildId};

/// A command for the gateway process that owns a guild's shard.
///
/// Sent at most once, fire and forget, in order with respect to other
/// messages for the same routing key. Delivery is not acknowledged; a
/// dropped message is observable only as the requested change never
/// happening.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ControlMessage {
    /// Join `channel_id` and run the platform side of the voice handshake.
    Connect {
        /// Guild whose voice state changes.
        guild_id: GuildId,
        /// Channel to join.
        channel_id: ChannelId,
    },
    /// Leave the guild's voice channel. The link stays alive and may
    /// reconnect later.
    Disconnect {
        /// Guild whose voice state changes.
        guild_id: GuildId,
    },
    /// Tear the connection down entirely, with no expectation of a
    /// reconnect. Used when the link is being discarded, e.g. at shutdown.
    Remove {
        /// Guild whose voice state changes.
        guild_id: GuildId,
    },
}

impl ControlMessage {
    /// Guild the command applies to.
    #[must_use]
    pub fn guild_id(&self) -> GuildId {
        match self {
            ControlMessage::Connect { guild_id, .. }
            | ControlMessage::Disconnect { guild_id }
            | ControlMessage::Remove { guild_id } => *guild_id,
        }
    }

    /// Wire name of the command, for log lines.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ControlMessage::Connect { .. } => "connect",
            ControlMessage::Disconnect { .. } => "disconnect",
            ControlMessage::Remove { .. } => "remove",
        }
    }
}

/// A `VOICE_SERVER_UPDATE` relayed by the gateway process owning a guild's
/// shard, paired with the session id that process last saw for the bot.
///
/// `raw` is kept opaque: the audio node consumes the token and endpoint
/// inside it, this crate only needs the guild id.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct VoiceServerUpdate {
    /// Voice session identifier for the in-progress handshake.
    pub session_id: String,
    /// The platform's payload exactly as it arrived.
    pub raw: Value,
}

impl VoiceServerUpdate {
    /// Guild the event belongs to, parsed out of the raw payload.
    ///
    /// `None` when the payload has no `guild_id` field or it is neither a
    /// decimal string nor an integer.
    #[must_use]
    pub fn guild_id(&self) -> Option<GuildId> {
        match self.raw.get("guild_id")? {
            Value::String(id) => id.parse().ok().map(GuildId),
            Value::Number(id) => id.as_u64().map(GuildId),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::{ControlMessage, VoiceServerUpdate};
    use crate::id::{ChannelId, GuildId};

    #[test]
    fn control_message_wire_shape() {
        let connect = ControlMessage::Connect {
            guild_id: GuildId(41771983423143937),
            channel_id: ChannelId(127121515262115840),
        };

        let value = serde_json::to_value(&connect).unwrap();
        assert_eq!(
            value,
            json!({
                "op": "connect",
                "guild_id": "41771983423143937",
                "channel_id": "127121515262115840",
            })
        );

        let back: ControlMessage = serde_json::from_value(value).unwrap();
        assert_eq!(back, connect);
    }

    #[test]
    fn disconnect_carries_no_channel() {
        let value = serde_json::to_value(ControlMessage::Disconnect {
            guild_id: GuildId(3),
        })
        .unwrap();

        assert_eq!(value, json!({ "op": "disconnect", "guild_id": "3" }));
    }

    #[test]
    fn update_parses_guild_from_string_or_integer() {
        let stringly = VoiceServerUpdate {
            session_id: "deadbeef".into(),
            raw: json!({ "guild_id": "41771983423143937", "token": "t" }),
        };
        let numeric = VoiceServerUpdate {
            session_id: "deadbeef".into(),
            raw: json!({ "guild_id": 41771983423143937_u64 }),
        };

        assert_eq!(stringly.guild_id(), Some(GuildId(41771983423143937)));
        assert_eq!(numeric.guild_id(), Some(GuildId(41771983423143937)));
    }

    #[test]
    fn update_without_guild_parses_to_none() {
        let missing = VoiceServerUpdate {
            session_id: "deadbeef".into(),
            raw: json!({ "token": "t" }),
        };
        let malformed = VoiceServerUpdate {
            session_id: "deadbeef".into(),
            raw: json!({ "guild_id": ["not", "an", "id"] }),
        };

        assert_eq!(missing.guild_id(), None);
        assert_eq!(malformed.guild_id(), None);
    }
}
