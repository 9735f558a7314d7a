use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::backend::AudioBackend;
use crate::bus::ControlBus;
use crate::config::Config;
use crate::id::GuildId;
use crate::link::VoiceLink;
use crate::payload::{ControlMessage, VoiceServerUpdate};
use crate::permissions::PermissionSource;
use crate::shards::{shard_id, ShardTracker};

/// Collaborators every link needs, held once per manager.
pub(crate) struct Shared {
    pub config: Config,
    pub tracker: Arc<dyn ShardTracker>,
    pub bus: Arc<dyn ControlBus>,
    pub permissions: Arc<dyn PermissionSource>,
    pub backend: Arc<dyn AudioBackend>,
}

impl Shared {
    /// Routes `message` to the gateway process owning its guild's shard.
    ///
    /// An unclaimed shard drops the message: the tracker not knowing a
    /// shard is a transient condition (rolling deploys, processes still
    /// starting up), and callers treat control traffic as fire and forget.
    pub fn dispatch(&self, message: ControlMessage) {
        let guild_id = message.guild_id();
        let shard = shard_id(guild_id, self.config.shard_count);

        match self.tracker.routing_key(shard) {
            Some(key) => {
                debug!(
                    "sending {} for guild {guild_id} to {key} (shard {shard})",
                    message.kind()
                );
                self.bus.send(&key, message);
            },
            None => warn!(
                "no gateway process claims shard {shard} (guild {guild_id}); dropping {}",
                message.kind()
            ),
        }
    }
}

/// Registry of per-guild voice links.
///
/// This is the entry point of the crate: construct one per process, hand
/// inbound gateway events to it, and use the [`VoiceLink`]s it returns to
/// drive connections. Exactly one link is ever constructed per guild, no
/// matter how many tasks ask for it at once, and links live as long as the
/// manager does.
pub struct VoiceManager {
    links: DashMap<GuildId, Arc<VoiceLink>>,
    shared: Arc<Shared>,
}

impl VoiceManager {
    /// Creates a manager from its collaborators.
    ///
    /// `tracker` answers which gateway process currently owns a shard,
    /// `bus` carries control messages to it, `permissions` supplies the
    /// bot's effective permissions at connect time, and `backend` receives
    /// validated voice sessions.
    #[must_use]
    pub fn new(
        config: Config,
        tracker: Arc<dyn ShardTracker>,
        bus: Arc<dyn ControlBus>,
        permissions: Arc<dyn PermissionSource>,
        backend: Arc<dyn AudioBackend>,
    ) -> Self {
        Self {
            links: DashMap::new(),
            shared: Arc::new(Shared {
                config,
                tracker,
                bus,
                permissions,
                backend,
            }),
        }
    }

    /// Retrieves the link for `guild_id`, if one already exists.
    ///
    /// Never creates a link, so read-only callers (status displays and the
    /// like) can probe without instantiating state for guilds they merely
    /// inspect.
    #[must_use]
    pub fn get(&self, guild_id: GuildId) -> Option<Arc<VoiceLink>> {
        self.links.get(&guild_id).map(|link| Arc::clone(link.value()))
    }

    /// Retrieves the link for `guild_id`, creating it if it doesn't exist.
    pub fn get_or_insert(&self, guild_id: GuildId) -> Arc<VoiceLink> {
        self.links
            .entry(guild_id)
            .or_insert_with(|| Arc::new(VoiceLink::new(guild_id, Arc::clone(&self.shared))))
            .clone()
    }

    /// Routes a raw voice server update to the guild's link.
    ///
    /// The guild is parsed out of the payload itself; an update without a
    /// readable guild id is logged and dropped. The link is created on
    /// demand, since an update can legitimately arrive for a guild this
    /// process has not driven a connect for.
    pub async fn process_voice_server_update(&self, update: VoiceServerUpdate) {
        let Some(guild_id) = update.guild_id() else {
            warn!("voice server update carries no readable guild id; dropping");
            return;
        };

        self.get_or_insert(guild_id).on_voice_server_update(update).await;
    }

    /// Tears down every link, dispatching a remove for each guild.
    pub fn shutdown(&self) {
        for link in self.links.iter() {
            link.value().remove_connection();
        }
    }

    /// Number of links created so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether any link has been created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Configuration the manager was built with.
    #[must_use]
    pub fn config(&self) -> Config {
        self.shared.config
    }
}

impl fmt::Debug for VoiceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceManager")
            .field("links", &self.links)
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}
