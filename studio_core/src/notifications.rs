use bevy::prelude::Resource;
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::Serialize;

/// Category tag attached to every user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotificationKind {
    ContractSigned,
    CandidatesRefreshed,
    BlockerSpawned,
    EarlyShipAvailable,
    SprintClosed,
    PayoutCollected,
}

/// Short-lived user-facing message, timestamped with the logical tick it
/// was raised on.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub tick: u64,
    pub kind: NotificationKind,
    pub message: String,
}

/// One-way, fire-and-forget channel toward the host UI.
///
/// Sends never block and are silently dropped once the receiving side goes
/// away; there is no acknowledgment or delivery guarantee.
#[derive(Resource, Clone)]
pub struct Notifications {
    sender: Sender<Notification>,
}

impl Notifications {
    pub fn channel() -> (Self, Receiver<Notification>) {
        let (sender, receiver) = unbounded();
        (Self { sender }, receiver)
    }

    pub fn emit(&self, tick: u64, kind: NotificationKind, message: impl Into<String>) {
        let _ = self.sender.send(Notification {
            tick,
            kind,
            message: message.into(),
        });
    }
}
