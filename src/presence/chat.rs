use std::time::Duration;

use moka::sync::Cache;

use crate::models::LiveMessage;

/// Upper bound on remembered message ids for duplicate suppression.
const SEEN_CAPACITY: u64 = 10_000;
/// How long an id stays remembered after it was last seen. Far longer than
/// any realistic redelivery window on the bus.
const SEEN_IDLE: Duration = Duration::from_secs(10 * 60);

/// Ephemeral chat transcript for one observer. Messages append in arrival
/// order and are deduplicated by id, since loop-back delivery echoes the
/// sender's own messages back at it. Nothing here survives the observer.
pub struct ChatRelay {
    transcript: Vec<LiveMessage>,
    seen: Cache<String, ()>,
}

impl ChatRelay {
    pub fn new() -> Self {
        Self {
            transcript: Vec::new(),
            seen: Cache::builder()
                .max_capacity(SEEN_CAPACITY)
                .time_to_idle(SEEN_IDLE)
                .build(),
        }
    }

    /// Append a locally authored message. The caller broadcasts it; the
    /// loop-back echo will be suppressed by the seen-id cache.
    pub fn post(&mut self, message: LiveMessage) {
        self.seen.insert(message.id.clone(), ());
        self.transcript.push(message);
    }

    /// Append a received message unless its id was already seen. Returns
    /// whether the transcript changed.
    pub fn accept(&mut self, message: LiveMessage) -> bool {
        if self.seen.contains_key(&message.id) {
            return false;
        }
        self.seen.insert(message.id.clone(), ());
        self.transcript.push(message);
        true
    }

    pub fn transcript(&self) -> &[LiveMessage] {
        &self.transcript
    }

    pub fn len(&self) -> usize {
        self.transcript.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }
}

impl Default for ChatRelay {
    fn default() -> Self {
        Self::new()
    }
}
