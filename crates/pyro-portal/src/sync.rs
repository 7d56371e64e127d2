//! Cross-tab state synchronization.
//!
//! Each open portal instance joins one [`SyncChannel`] as a
//! [`SyncParticipant`]. Events it publishes are delivered to every other
//! participant, never back to the sender. Only events writing an
//! allow-listed slice ([`SYNCED_SLICES`]) are broadcast; upload progress is
//! local to the instance that started it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::store::{PortalEvent, Slice};

/// Slices whose events are shared between instances.
pub const SYNCED_SLICES: &[Slice] = &[Slice::Auth, Slice::Account, Slice::Common];

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
struct SyncMessage {
    origin: u64,
    event: PortalEvent,
}

/// Shared pub/sub channel.
#[derive(Debug, Clone)]
pub struct SyncChannel {
    sender: broadcast::Sender<SyncMessage>,
    next_id: Arc<AtomicU64>,
}

impl Default for SyncChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SyncChannel {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Join the channel. Only events published after joining are received.
    pub fn join(&self) -> SyncParticipant {
        SyncParticipant {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            sender: self.sender.clone(),
            receiver: self.sender.subscribe(),
        }
    }

    pub fn participants(&self) -> usize {
        self.sender.receiver_count()
    }
}

pub fn is_synced(event: &PortalEvent) -> bool {
    SYNCED_SLICES.contains(&event.slice())
}

/// One instance's handle on the channel.
#[derive(Debug)]
pub struct SyncParticipant {
    id: u64,
    sender: broadcast::Sender<SyncMessage>,
    receiver: broadcast::Receiver<SyncMessage>,
}

impl SyncParticipant {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Broadcast `event` if its slice is synchronized. Returns whether it was
    /// sent to at least one other participant.
    pub fn publish(&self, event: &PortalEvent) -> bool {
        if !is_synced(event) {
            return false;
        }
        let message = SyncMessage {
            origin: self.id,
            event: event.clone(),
        };
        // The sender's own receiver counts as one subscriber.
        match self.sender.send(message) {
            Ok(receivers) => receivers > 1,
            Err(_) => false,
        }
    }

    /// Next event from another participant, or `None` once the channel is
    /// gone. Events missed because this participant fell behind are skipped.
    pub async fn recv(&mut self) -> Option<PortalEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(message) if message.origin == self.id => continue,
                Ok(message) => return Some(message.event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(participant = self.id, skipped, "sync receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<PortalEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(message) if message.origin == self.id => continue,
                Ok(message) => return Some(message.event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(participant = self.id, skipped, "sync receiver lagged");
                }
                Err(_) => return None,
            }
        }
    }
}
