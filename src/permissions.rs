//! The subset of the platform's permission model that voice orchestration
//! consumes, plus the gate that evaluates it.
//!
//! Permissions are a plain bitset with named query functions; the bit
//! positions are the platform's own, so a snapshot read straight off the
//! wire needs no translation.

use std::error::Error as StdError;
use std::fmt;

use async_trait::async_trait;
use bitflags::bitflags;

use crate::id::{ChannelId, GuildId};

bitflags! {
    /// A set of permissions the bot holds in a channel.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct Permissions: u64 {
        /// Grants all permissions, bypassing channel overwrites.
        const ADMINISTRATOR = 1 << 3;
        /// Use the priority speaker ducking feature while talking.
        const PRIORITY_SPEAKER = 1 << 8;
        /// Go live in a voice channel.
        const STREAM = 1 << 9;
        /// See the channel at all.
        const VIEW_CHANNEL = 1 << 10;
        /// Join the voice channel.
        const CONNECT = 1 << 20;
        /// Transmit audio in the voice channel.
        const SPEAK = 1 << 21;
        /// Server-mute other members.
        const MUTE_MEMBERS = 1 << 22;
        /// Server-deafen other members.
        const DEAFEN_MEMBERS = 1 << 23;
        /// Move members between channels; also bypasses user limits.
        const MOVE_MEMBERS = 1 << 24;
        /// Use voice activity detection rather than push-to-talk.
        const USE_VAD = 1 << 25;
    }
}

impl Permissions {
    /// The subset of `self` that is absent from `actual`.
    ///
    /// This is converse nonimplication over the bits, so the result names
    /// exactly what an error message should ask the admin for rather than
    /// echoing the whole requested set.
    #[must_use]
    pub fn missing_from(self, actual: Permissions) -> Permissions {
        self.difference(actual)
    }

    /// Names of all contained permissions, in bit order.
    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join(", "))
    }
}

/// Typed failure produced by [`require`], naming exactly the permissions
/// that were absent from the snapshot.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InsufficientPermissions {
    /// Channel the check ran against.
    pub channel_id: ChannelId,
    /// The expected bits the snapshot did not contain.
    pub missing: Permissions,
}

impl fmt::Display for InsufficientPermissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing {} in channel {}", self.missing, self.channel_id)
    }
}

impl StdError for InsufficientPermissions {}

/// Checks that `actual` contains every bit of `needed`.
///
/// # Errors
///
/// [`InsufficientPermissions`] carrying the missing subset, computed with
/// [`Permissions::missing_from`].
pub fn require(
    channel_id: ChannelId,
    actual: Permissions,
    needed: Permissions,
) -> Result<(), InsufficientPermissions> {
    let missing = needed.missing_from(actual);

    if missing.is_empty() {
        Ok(())
    } else {
        Err(InsufficientPermissions {
            channel_id,
            missing,
        })
    }
}

/// Source of the bot's current effective permissions, usually backed by the
/// caller's gateway cache or a REST lookup.
///
/// The returned value is a point-in-time snapshot. Implementations that can
/// fail internally should fall back to [`Permissions::empty`], which denies
/// by default.
#[async_trait]
pub trait PermissionSource: Send + Sync {
    /// Returns what the bot may currently do in `channel_id`.
    async fn effective_permissions(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Permissions;
}

#[cfg(test)]
mod test {
    use super::{require, Permissions};
    use crate::id::ChannelId;

    #[test]
    fn missing_is_converse_nonimplication() {
        let expected = Permissions::CONNECT | Permissions::SPEAK;
        let actual = Permissions::SPEAK;

        assert_eq!(expected.missing_from(actual), Permissions::CONNECT);
    }

    #[test]
    fn missing_ignores_extra_held_bits() {
        let expected = Permissions::SPEAK;
        let actual = Permissions::SPEAK | Permissions::MOVE_MEMBERS | Permissions::STREAM;

        assert!(expected.missing_from(actual).is_empty());
    }

    #[test]
    fn require_passes_on_containment() {
        let held = Permissions::CONNECT | Permissions::SPEAK | Permissions::USE_VAD;

        assert!(require(ChannelId(1), held, Permissions::CONNECT | Permissions::SPEAK).is_ok());
    }

    #[test]
    fn require_names_only_the_absent_subset() {
        let held = Permissions::SPEAK;
        let err = require(
            ChannelId(7),
            held,
            Permissions::CONNECT | Permissions::SPEAK,
        )
        .unwrap_err();

        assert_eq!(err.missing, Permissions::CONNECT);
        assert_eq!(err.channel_id, ChannelId(7));
        assert_eq!(err.missing.names(), vec!["CONNECT"]);
    }
}
