//! Configuration for the orchestration layer.

use std::num::NonZeroU64;
use std::time::Duration;

use crate::constants::DEFAULT_RETRY_COOLDOWN;

/// Configuration handed to [`VoiceManager::new`] and shared by every link
/// it creates.
///
/// [`VoiceManager::new`]: crate::VoiceManager::new
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    /// Total number of gateway shards guilds are partitioned across.
    ///
    /// Must match what the gateway processes were started with, or control
    /// messages route to processes that do not own the guild.
    pub shard_count: NonZeroU64,
    /// Minimum spacing between session-expiry reconnects on one link.
    ///
    /// A second expiry inside this window disconnects without reconnecting
    /// to stop connect/disconnect bouncing.
    pub retry_cooldown: Duration,
}

impl Config {
    /// Creates a configuration for a cluster of `shard_count` gateway
    /// shards, with the reconnect cooldown at
    /// [`DEFAULT_RETRY_COOLDOWN`].
    #[must_use]
    pub fn new(shard_count: NonZeroU64) -> Self {
        Self {
            shard_count,
            retry_cooldown: DEFAULT_RETRY_COOLDOWN,
        }
    }

    /// Sets the reconnect cooldown.
    #[must_use]
    pub fn retry_cooldown(mut self, retry_cooldown: Duration) -> Self {
        self.retry_cooldown = retry_cooldown;
        self
    }
}

#[cfg(test)]
mod test {
    use std::num::NonZeroU64;
    use std::time::Duration;

    use super::Config;
    use crate::constants::DEFAULT_RETRY_COOLDOWN;

    #[test]
    fn cooldown_defaults_and_overrides() {
        let config = Config::new(NonZeroU64::new(4).unwrap());
        assert_eq!(config.retry_cooldown, DEFAULT_RETRY_COOLDOWN);
        assert_eq!(DEFAULT_RETRY_COOLDOWN, Duration::from_secs(200));

        let tuned = config.retry_cooldown(Duration::from_secs(30));
        assert_eq!(tuned.retry_cooldown, Duration::from_secs(30));
    }
}
