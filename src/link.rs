//! Per-guild voice connection state machines.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::constants::voice_close_codes;
use crate::error::{JoinError, JoinResult};
use crate::id::{ChannelId, GuildId};
use crate::info::ChannelSnapshot;
use crate::manager::Shared;
use crate::payload::{ControlMessage, VoiceServerUpdate};
use crate::permissions::{self, Permissions};

/// Stage a voice link is in, from this process's point of view.
///
/// The owning gateway process holds the real connection; stages here track
/// the last thing this process asked for or was told.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectionStage {
    /// A queue-connect command went out and no session has come back yet.
    Connecting,
    /// A validated session was handed to the audio backend.
    Connected,
    /// No connection is in flight. Links start here and a connect can
    /// always be issued from here.
    Disconnected,
}

impl ConnectionStage {
    /// Whether the stage is a form of connecting.
    #[must_use]
    pub fn is_connecting(self) -> bool {
        matches!(self, ConnectionStage::Connecting)
    }
}

impl fmt::Display for ConnectionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionStage::Connecting => "connecting",
            ConnectionStage::Connected => "connected",
            ConnectionStage::Disconnected => "disconnected",
        })
    }
}

#[derive(Debug)]
struct LinkState {
    stage: ConnectionStage,
    channel_id: Option<ChannelId>,
    last_retry: Option<Instant>,
}

/// What a session expiry resolved to, decided under the state lock.
enum ExpiryAction {
    Reconnect(ChannelId),
    Suppress,
    NoChannel,
}

/// A single guild's voice connection.
///
/// Links are created and owned by the [`VoiceManager`]; one exists per
/// guild that has ever needed a voice connection, and it lives for the
/// process lifetime. All mutation goes through the methods here. The state
/// machine is `Disconnected` -> `Connecting` -> `Connected`, with session
/// expiry folding back into `Connecting` (or `Disconnected`, when expiry
/// repeats inside the cooldown window).
///
/// Every operation is safe to call from any task. The one ordering
/// guarantee callers get is that a reconnect's disconnect and connect reach
/// the owning gateway process in that order.
///
/// [`VoiceManager`]: crate::VoiceManager
pub struct VoiceLink {
    guild_id: GuildId,
    state: Mutex<LinkState>,
    shared: Arc<Shared>,
}

impl VoiceLink {
    pub(crate) fn new(guild_id: GuildId, shared: Arc<Shared>) -> Self {
        Self {
            guild_id,
            state: Mutex::new(LinkState {
                stage: ConnectionStage::Disconnected,
                channel_id: None,
                last_retry: None,
            }),
            shared,
        }
    }

    /// Guild this link manages.
    #[must_use]
    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// Current stage of the connection.
    #[must_use]
    pub fn stage(&self) -> ConnectionStage {
        self.state.lock().stage
    }

    /// Channel the link is connected or connecting to, if any.
    ///
    /// Survives [`Self::disconnect`] so a later connect can reuse it.
    #[must_use]
    pub fn current_channel(&self) -> Option<ChannelId> {
        self.state.lock().channel_id
    }

    /// Connects to `channel`, skipping the dispatch when the bot is already
    /// in it. See [`Self::connect_with`].
    ///
    /// # Errors
    ///
    /// As for [`Self::connect_with`].
    pub async fn connect(&self, channel: &ChannelSnapshot) -> JoinResult<()> {
        self.connect_with(channel, true).await
    }

    /// Connects or moves to `channel`.
    ///
    /// The bot's permission snapshot for the channel is fetched first.
    /// Joining requires SPEAK plus one of CONNECT or MOVE_MEMBERS, and
    /// taking a seat in a full user-limited channel additionally requires
    /// MOVE_MEMBERS. Only once the checks pass is the queue-connect command
    /// dispatched to the owning gateway process.
    ///
    /// Dispatch is fire and forget: `Ok(())` means the command was accepted
    /// for sending, not that the bot joined. Whether it did is observable
    /// through the voice server update that follows a successful handshake.
    ///
    /// With `skip_if_same`, a connect naming the channel the bot already
    /// occupies, and that this link already targets, returns without side
    /// effects.
    ///
    /// # Errors
    ///
    /// [`JoinError::ForeignChannel`] when `channel` is not in this link's
    /// guild; [`JoinError::Forbidden`] naming exactly the missing
    /// permissions.
    pub async fn connect_with(
        &self,
        channel: &ChannelSnapshot,
        skip_if_same: bool,
    ) -> JoinResult<()> {
        if channel.guild_id != self.guild_id {
            return Err(JoinError::ForeignChannel {
                channel_id: channel.id,
                channel_guild_id: channel.guild_id,
                link_guild_id: self.guild_id,
            });
        }

        let held = self
            .shared
            .permissions
            .effective_permissions(self.guild_id, channel.id)
            .await;

        // MOVE_MEMBERS substitutes for CONNECT; SPEAK has no substitute.
        let mut needed = Permissions::SPEAK;
        if !held.intersects(Permissions::CONNECT | Permissions::MOVE_MEMBERS) {
            needed |= Permissions::CONNECT;
        }
        permissions::require(channel.id, held, needed)?;

        if skip_if_same && channel.contains_self && self.current_channel() == Some(channel.id) {
            debug!(
                "already in channel {} of guild {}; connect skipped",
                channel.id, self.guild_id
            );
            return Ok(());
        }

        if channel.is_full() {
            permissions::require(channel.id, held, Permissions::MOVE_MEMBERS)?;
        }

        {
            let mut state = self.state.lock();
            state.stage = ConnectionStage::Connecting;
            state.channel_id = Some(channel.id);
        }

        self.shared.dispatch(ControlMessage::Connect {
            guild_id: self.guild_id,
            channel_id: channel.id,
        });

        Ok(())
    }

    /// Asks the owning gateway process to leave the current voice channel.
    ///
    /// The target channel stays on record so a later [`Self::connect`] can
    /// reuse it. Confirmation arrives, if ever, through that process's own
    /// event stream; the link records `Disconnected` at dispatch time.
    pub fn disconnect(&self) {
        self.state.lock().stage = ConnectionStage::Disconnected;

        self.shared.dispatch(ControlMessage::Disconnect {
            guild_id: self.guild_id,
        });
    }

    /// Tears the connection down entirely.
    ///
    /// A harder stop than [`Self::disconnect`], for links being discarded
    /// (process shutdown, guild eviction): the remembered channel is
    /// cleared and nothing assumes a reconnect will follow.
    pub fn remove_connection(&self) {
        {
            let mut state = self.state.lock();
            state.stage = ConnectionStage::Disconnected;
            state.channel_id = None;
        }

        self.shared.dispatch(ControlMessage::Remove {
            guild_id: self.guild_id,
        });
    }

    /// Accepts a voice server update forwarded by the registry and hands
    /// the validated session to the audio backend.
    ///
    /// An update with an empty session id is logged and dropped; the
    /// handshake it belongs to can only be completed by a later, complete
    /// update.
    #[instrument(skip_all, fields(guild_id = %self.guild_id))]
    pub async fn on_voice_server_update(&self, update: VoiceServerUpdate) {
        if update.session_id.is_empty() {
            warn!("voice server update carries no session id; dropping");
            return;
        }

        self.state.lock().stage = ConnectionStage::Connected;

        self.shared
            .backend
            .server_update(self.guild_id, &update.session_id, &update.raw)
            .await;
    }

    /// Reacts to the guild's voice websocket closing.
    ///
    /// Only session expiry (close code 4006) is acted on here: the session
    /// is rebuilt by dispatching a disconnect followed by a connect to the
    /// remembered channel, at most once per configured cooldown window. A
    /// second expiry inside the window dispatches the disconnect alone,
    /// which stops a broken session from bouncing the bot in and out of
    /// the channel indefinitely. Every other close code is left to the
    /// audio node's own policy.
    pub fn on_voice_websocket_closed(&self, code: u16, reason: &str, by_remote: bool) {
        if code != voice_close_codes::SESSION_INVALID {
            debug!(
                "voice websocket for guild {} closed (code {code}, by remote: {by_remote}): \
                 {reason}",
                self.guild_id
            );
            return;
        }

        // The check-and-set on last_retry must be atomic, or two close
        // events racing here would both pick the reconnect branch.
        let action = {
            let mut state = self.state.lock();
            let cooled_down = state
                .last_retry
                .map_or(true, |at| at.elapsed() > self.shared.config.retry_cooldown);

            if !cooled_down {
                state.stage = ConnectionStage::Disconnected;
                ExpiryAction::Suppress
            } else if let Some(channel_id) = state.channel_id {
                state.last_retry = Some(Instant::now());
                state.stage = ConnectionStage::Connecting;
                ExpiryAction::Reconnect(channel_id)
            } else {
                ExpiryAction::NoChannel
            }
        };

        match action {
            ExpiryAction::Reconnect(channel_id) => {
                info!(
                    "voice session for guild {} expired; rebuilding the connection to channel \
                     {channel_id}",
                    self.guild_id
                );
                self.shared.dispatch(ControlMessage::Disconnect {
                    guild_id: self.guild_id,
                });
                self.shared.dispatch(ControlMessage::Connect {
                    guild_id: self.guild_id,
                    channel_id,
                });
            },
            ExpiryAction::Suppress => {
                warn!(
                    "voice session for guild {} expired twice within {:?}; disconnecting instead \
                     of bouncing",
                    self.guild_id, self.shared.config.retry_cooldown
                );
                self.shared.dispatch(ControlMessage::Disconnect {
                    guild_id: self.guild_id,
                });
            },
            ExpiryAction::NoChannel => {
                error!(
                    "voice session for guild {} expired with no channel on record; nothing to \
                     rebuild",
                    self.guild_id
                );
            },
        }
    }
}

impl fmt::Debug for VoiceLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceLink")
            .field("guild_id", &self.guild_id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
