//! Constants affecting reconnection policy and close-code handling.

use std::time::Duration;

/// Default minimum spacing between session-expiry reconnect attempts on a
/// single guild's link.
///
/// A second expiry arriving inside this window disconnects without
/// reconnecting, so a broken session cannot bounce the bot in and out of a
/// channel in a loop. Override per deployment via
/// [`Config::retry_cooldown`].
///
/// [`Config::retry_cooldown`]: crate::Config::retry_cooldown()
pub const DEFAULT_RETRY_COOLDOWN: Duration = Duration::from_secs(200);

/// Close codes the platform's voice websocket can terminate with.
///
/// Only [`SESSION_INVALID`] drives the reconnection state machine; the rest
/// are listed so callers and log readers can tell the cases apart.
///
/// [`SESSION_INVALID`]: voice_close_codes::SESSION_INVALID
pub mod voice_close_codes {
    /// An opcode the voice gateway did not recognise was sent.
    pub const UNKNOWN_OPCODE: u16 = 4001;

    /// A payload was sent before identifying.
    pub const NOT_AUTHENTICATED: u16 = 4003;

    /// The token sent with the identify payload was rejected.
    pub const AUTHENTICATION_FAILED: u16 = 4004;

    /// The voice session is no longer valid; a full re-handshake is needed.
    pub const SESSION_INVALID: u16 = 4006;

    /// The voice session timed out.
    pub const SESSION_TIMEOUT: u16 = 4009;

    /// The voice server for the last connection attempt went away.
    pub const SERVER_NOT_FOUND: u16 = 4011;

    /// Kicked, or the channel was closed or removed. Should not reconnect.
    pub const DISCONNECTED: u16 = 4014;

    /// The connected voice server crashed. Should resume.
    pub const VOICE_SERVER_CRASH: u16 = 4015;
}
