//! The seam to the audio node.

use async_trait::async_trait;
use serde_json::Value;

use crate::id::GuildId;

/// Interface to the audio node that finishes voice handshakes and plays
/// audio once a session is addressed.
///
/// The orchestration layer's responsibility ends at handing over a
/// validated session; what the node does with the token and endpoint
/// inside `raw` is its own business.
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Accepts the session id and raw `VOICE_SERVER_UPDATE` payload for a
    /// guild whose owning gateway process completed the platform half of
    /// the handshake.
    async fn server_update(&self, guild_id: GuildId, session_id: &str, raw: &Value);
}
