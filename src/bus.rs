//! Fire-and-forget transport for control messages.

use std::collections::HashMap;

use flume::{Receiver, Sender};
use parking_lot::RwLock;
use tracing::warn;

use crate::payload::ControlMessage;
use crate::shards::RoutingKey;

/// Sender of control messages to gateway processes.
///
/// `send` means "accepted for sending", nothing more: delivery is at most
/// once and never acknowledged. A stale routing key silently loses the
/// message; voice control tolerates that, and the caller sees it only as
/// the requested change never happening. Messages for one key must be
/// delivered in the order they were sent, since the receiving process
/// executes them in arrival order.
pub trait ControlBus: Send + Sync {
    /// Queues `message` for delivery to the process addressed by `key`.
    fn send(&self, key: &RoutingKey, message: ControlMessage);
}

/// A [`ControlBus`] for clusters whose gateway processes live in this
/// process, and for tests.
///
/// Each bound key owns one unbounded channel, which is what makes per-key
/// ordering hold. Sends to a key nobody has bound, or whose receiver hung
/// up, are logged and dropped.
#[derive(Debug, Default)]
pub struct LocalBus {
    routes: RwLock<HashMap<RoutingKey, Sender<ControlMessage>>>,
}

impl LocalBus {
    /// Creates a bus with no keys bound.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `key` and returns the ordered receive side for it.
    ///
    /// Binding a key again replaces the previous channel; messages still
    /// queued on the old receiver stay readable there but new sends go to
    /// the new one.
    pub fn open(&self, key: RoutingKey) -> Receiver<ControlMessage> {
        let (tx, rx) = flume::unbounded();
        self.routes.write().insert(key, tx);

        rx
    }

    /// Unbinds `key`. Later sends to it are dropped.
    pub fn close(&self, key: &RoutingKey) {
        self.routes.write().remove(key);
    }
}

impl ControlBus for LocalBus {
    fn send(&self, key: &RoutingKey, message: ControlMessage) {
        let routes = self.routes.read();

        match routes.get(key) {
            Some(tx) => {
                if let Err(e) = tx.send(message) {
                    warn!(
                        "gateway process at {key} hung up; dropping {}",
                        e.into_inner().kind()
                    );
                }
            },
            None => warn!("nothing bound to {key}; dropping {}", message.kind()),
        }
    }
}
