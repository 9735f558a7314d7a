//! Error types returned by voice-link operations.
//!
//! Only failures the immediate caller can act on are represented here.
//! Routing and delivery problems are deliberately absent: control messages
//! are fire and forget, so those are logged where they occur and never
//! surfaced synchronously.

use std::error::Error as StdError;
use std::fmt;

use crate::id::{ChannelId, GuildId};
use crate::permissions::InsufficientPermissions;

/// Error returned when a voice link cannot accept a connect request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum JoinError {
    /// The requested channel belongs to a different guild than the one this
    /// link manages. A programmer error at the call site, never retried.
    ForeignChannel {
        /// The channel that was asked for.
        channel_id: ChannelId,
        /// The guild the channel actually belongs to.
        channel_guild_id: GuildId,
        /// The guild the link manages.
        link_guild_id: GuildId,
    },
    /// The bot lacks permissions the join requires. Carries exactly the
    /// missing subset so the user can be told what to grant.
    Forbidden(InsufficientPermissions),
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("failed to join voice channel: ")?;
        match self {
            JoinError::ForeignChannel {
                channel_id,
                channel_guild_id,
                link_guild_id,
            } => {
                write!(
                    f,
                    "channel {channel_id} belongs to guild {channel_guild_id}, \
                     but this link manages guild {link_guild_id}"
                )
            },
            JoinError::Forbidden(inner) => fmt::Display::fmt(inner, f),
        }
    }
}

impl StdError for JoinError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            JoinError::Forbidden(inner) => Some(inner),
            JoinError::ForeignChannel { .. } => None,
        }
    }
}

impl From<InsufficientPermissions> for JoinError {
    fn from(e: InsufficientPermissions) -> Self {
        JoinError::Forbidden(e)
    }
}

/// Result type of voice-link connect operations.
pub type JoinResult<T> = Result<T, JoinError>;
