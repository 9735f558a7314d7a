//! Lyrebird is a Rust library for orchestrating Discord voice connections
//! across a sharded bot.
//!
//! It owns the control-plane half of voice: deciding *whether* a bot may
//! join a channel, *which* gateway process has to be told, and *when* a
//! broken session should be rebuilt. The data plane (the voice websocket,
//! UDP, and audio itself) belongs to an audio engine behind the
//! [`AudioBackend`] seam.
//!
//! The entry point is the [`VoiceManager`]: one per process, holding one
//! [`VoiceLink`] per guild. A link is a small state machine
//! ([`ConnectionStage`]) that stays consistent even when user commands and
//! inbound gateway events drive it concurrently.
//!
//! Connecting checks the bot's [`Permissions`] in the target channel
//! before anything is sent, then dispatches a fire-and-forget
//! [`ControlMessage`] over the [`ControlBus`] to whichever process the
//! [`ShardTracker`] says owns the guild's shard. Session expiry (voice
//! close code `4006`) triggers a disconnect-then-connect rebuild, rate
//! limited by a cooldown so a persistently broken session cannot bounce
//! the bot in and out of a channel forever.
//!
//! # Installation
//!
//! Add the following to your `Cargo.toml` file:
//!
//! ```toml
//! [dependencies]
//! lyrebird = "0.1"
//! ```
//!
//! [`AudioBackend`]: crate::AudioBackend
//! [`ControlBus`]: crate::bus::ControlBus
//! [`ControlMessage`]: crate::payload::ControlMessage
//! [`Permissions`]: crate::permissions::Permissions
//! [`ShardTracker`]: crate::shards::ShardTracker
#![doc(html_root_url = "https://docs.rs/lyrebird/*")]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(unsafe_code)]
#![warn(
    unused,
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::clone_on_ref_ptr,
    clippy::non_ascii_literal,
    clippy::fallible_impl_from,
    clippy::let_underscore_must_use,
    clippy::format_push_string,
    clippy::pedantic
)]
#![allow(
    // Allowed as they are too pedantic
    clippy::module_name_repetitions,
    clippy::unreadable_literal,
    clippy::too_many_lines,
    clippy::doc_markdown,
    clippy::missing_panics_doc
)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod backend;
pub mod bus;
mod config;
pub mod constants;
pub mod error;
pub mod id;
mod info;
mod link;
mod manager;
pub mod payload;
pub mod permissions;
pub mod shards;

pub use crate::{
    backend::AudioBackend,
    bus::{ControlBus, LocalBus},
    config::Config,
    error::{JoinError, JoinResult},
    id::{ChannelId, GuildId, ShardId},
    info::ChannelSnapshot,
    link::{ConnectionStage, VoiceLink},
    manager::VoiceManager,
    payload::{ControlMessage, VoiceServerUpdate},
    permissions::{InsufficientPermissions, PermissionSource, Permissions},
    shards::{ClusterRoster, RoutingKey, ShardTracker, shard_id},
};
