//! Recording doubles for the manager's collaborators.
#![allow(dead_code)]

use std::num::NonZeroU64;
use std::sync::Arc;

use async_trait::async_trait;
use lyrebird::{
    AudioBackend,
    ChannelId,
    ChannelSnapshot,
    ClusterRoster,
    Config,
    ControlBus,
    ControlMessage,
    GuildId,
    PermissionSource,
    Permissions,
    RoutingKey,
    ShardId,
    VoiceManager,
};
use parking_lot::Mutex;
use serde_json::Value;

/// Shard count every harness runs with.
pub const SHARDS: u64 = 4;

pub fn shard_count() -> NonZeroU64 {
    NonZeroU64::new(SHARDS).unwrap()
}

/// Routing key the harness roster assigns to `shard`.
pub fn key_for(shard: u64) -> RoutingKey {
    RoutingKey::from(format!("gateway-{shard}"))
}

/// Bus that records instead of delivering.
#[derive(Default)]
pub struct RecordingBus {
    sent: Mutex<Vec<(RoutingKey, ControlMessage)>>,
}

impl RecordingBus {
    /// Everything sent so far, with the routing key it was addressed to.
    pub fn sent(&self) -> Vec<(RoutingKey, ControlMessage)> {
        self.sent.lock().clone()
    }

    /// The messages alone, in send order.
    pub fn messages(&self) -> Vec<ControlMessage> {
        self.sent.lock().iter().map(|(_, message)| *message).collect()
    }
}

impl ControlBus for RecordingBus {
    fn send(&self, key: &RoutingKey, message: ControlMessage) {
        self.sent.lock().push((key.clone(), message));
    }
}

/// Permission source granting the same bits everywhere.
pub struct StaticPermissions(pub Permissions);

#[async_trait]
impl PermissionSource for StaticPermissions {
    async fn effective_permissions(&self, _: GuildId, _: ChannelId) -> Permissions {
        self.0
    }
}

/// Backend that records the sessions handed to it.
#[derive(Default)]
pub struct RecordingBackend {
    sessions: Mutex<Vec<(GuildId, String)>>,
}

impl RecordingBackend {
    pub fn sessions(&self) -> Vec<(GuildId, String)> {
        self.sessions.lock().clone()
    }
}

#[async_trait]
impl AudioBackend for RecordingBackend {
    async fn server_update(&self, guild_id: GuildId, session_id: &str, _raw: &Value) {
        self.sessions.lock().push((guild_id, session_id.to_owned()));
    }
}

/// A manager wired to recording doubles, with every shard claimed.
pub struct Harness {
    pub manager: VoiceManager,
    pub bus: Arc<RecordingBus>,
    pub backend: Arc<RecordingBackend>,
    pub roster: Arc<ClusterRoster>,
}

pub fn harness(granted: Permissions) -> Harness {
    harness_with(Config::new(shard_count()), granted)
}

pub fn harness_with(config: Config, granted: Permissions) -> Harness {
    let roster = Arc::new(ClusterRoster::new());
    for shard in 0..SHARDS {
        roster.register(ShardId(shard), key_for(shard));
    }

    let bus = Arc::new(RecordingBus::default());
    let backend = Arc::new(RecordingBackend::default());
    let manager = VoiceManager::new(
        config,
        roster.clone(),
        bus.clone(),
        Arc::new(StaticPermissions(granted)),
        backend.clone(),
    );

    Harness {
        manager,
        bus,
        backend,
        roster,
    }
}

/// Snapshot of an unrestricted, currently empty channel.
pub fn channel(guild_id: GuildId, id: ChannelId) -> ChannelSnapshot {
    ChannelSnapshot {
        id,
        guild_id,
        user_limit: None,
        occupants: 0,
        contains_self: false,
    }
}
