//! Caller-supplied facts about the channel a link is asked to join.

use crate::id::{ChannelId, GuildId};

/// A point-in-time view of a voice channel, read by the caller from its own
/// gateway cache.
///
/// This crate keeps no channel cache; the connect checks run entirely on
/// the fields passed here, so a stale snapshot produces at worst a connect
/// the owning gateway process refuses.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ChannelSnapshot {
    /// ID of the channel itself.
    pub id: ChannelId,
    /// Guild the channel belongs to.
    pub guild_id: GuildId,
    /// Maximum member count the channel admits, if limited.
    pub user_limit: Option<u32>,
    /// Members currently in the channel, the bot included when present.
    pub occupants: u32,
    /// Whether the bot is one of those occupants.
    pub contains_self: bool,
}

impl ChannelSnapshot {
    /// Whether every admitted seat is taken.
    ///
    /// Joining a full channel rides on the user-limit bypass that
    /// MOVE_MEMBERS grants.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.user_limit
            .is_some_and(|limit| self.occupants >= limit)
    }
}
