//! Message id generation and duplicate detection.

use crate::uri::AddressingUri;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Produces message ids and recognizes repeated ones.
pub trait MessageIdStrategy: Send + Sync + fmt::Debug {
    /// Returns true when `message_id` was seen before.
    fn is_duplicate(&self, message_id: &AddressingUri) -> bool;

    /// Returns a fresh message id.
    fn new_message_id(&self) -> AddressingUri;
}

/// A shared id strategy.
pub type BoxedMessageIdStrategy = Arc<dyn MessageIdStrategy>;

fn uuid_urn() -> AddressingUri {
    AddressingUri::from_known(Uuid::now_v7().urn().to_string())
}

/// `urn:uuid:` ids from UUID v7. Never reports duplicates.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidMessageIdStrategy;

impl MessageIdStrategy for UuidMessageIdStrategy {
    fn is_duplicate(&self, _message_id: &AddressingUri) -> bool {
        false
    }

    fn new_message_id(&self) -> AddressingUri {
        uuid_urn()
    }
}

/// `urn:uuid:` ids plus a bounded set of recently seen inbound ids.
///
/// Checking an id records it; once `capacity` ids are held the oldest is
/// forgotten.
#[derive(Debug)]
pub struct MemoryMessageIdStrategy {
    capacity: usize,
    seen: Mutex<SeenIds>,
}

#[derive(Debug, Default)]
struct SeenIds {
    order: VecDeque<AddressingUri>,
    members: HashSet<AddressingUri>,
}

impl MemoryMessageIdStrategy {
    /// Default number of remembered ids.
    pub const DEFAULT_CAPACITY: usize = 10_000;

    /// Creates a strategy remembering up to `capacity` ids.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            seen: Mutex::new(SeenIds::default()),
        }
    }

    /// Returns the number of remembered ids.
    pub fn len(&self) -> usize {
        self.seen.lock().order.len()
    }

    /// Returns true when no id is remembered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryMessageIdStrategy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl MessageIdStrategy for MemoryMessageIdStrategy {
    fn is_duplicate(&self, message_id: &AddressingUri) -> bool {
        let mut seen = self.seen.lock();
        if seen.members.contains(message_id) {
            return true;
        }
        if seen.order.len() == self.capacity {
            if let Some(oldest) = seen.order.pop_front() {
                seen.members.remove(&oldest);
            }
        }
        seen.order.push_back(message_id.clone());
        seen.members.insert(message_id.clone());
        false
    }

    fn new_message_id(&self) -> AddressingUri {
        uuid_urn()
    }
}
