//! The client side of the per-order chat: an optimistic transcript.
//!
//! Sending a message renders it immediately with a locally generated temporary id. When the
//! server acknowledges, the temporary entry is replaced by the persisted message; the match is by
//! (sender, text) rather than by id, because the temporary id never reaches the server. On
//! failure the temporary entry is dropped and the text handed back for resubmission.

use bistro_engine::db_types::{ChatMessage, SenderType};
use chrono::{DateTime, Utc};
use log::*;

/// One transcript entry. Temporary entries carry a negative, locally generated id and are
/// replaced or removed once the send resolves.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub id: i64,
    pub sender_id: i64,
    pub sender_type: SenderType,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub is_temporary: bool,
}

impl From<ChatMessage> for TranscriptEntry {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: message.id,
            sender_id: message.sender_id,
            sender_type: message.sender_type,
            message: message.message,
            created_at: message.created_at,
            is_temporary: false,
        }
    }
}

/// The transcript of one order's chat, in display order. All mutations are synchronous; the
/// caller drives it from its network layer (send acks, live pushes, transcript refetches).
#[derive(Debug, Clone, Default)]
pub struct ChatTranscript {
    entries: Vec<TranscriptEntry>,
    next_temp_id: i64,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the transcript from a full server fetch. Unresolved temporary entries are kept at the
    /// end; their sends are still in flight.
    pub fn load(&mut self, messages: Vec<ChatMessage>) {
        let pending: Vec<TranscriptEntry> = self.entries.drain(..).filter(|e| e.is_temporary).collect();
        self.entries = messages.into_iter().map(TranscriptEntry::from).collect();
        self.entries.extend(pending);
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn has_pending(&self) -> bool {
        self.entries.iter().any(|e| e.is_temporary)
    }

    /// Optimistic send: append a temporary entry immediately and return its id. The caller fires
    /// the network request and reports back via [`resolve_success`](Self::resolve_success) or
    /// [`resolve_failure`](Self::resolve_failure).
    pub fn send(&mut self, sender_id: i64, sender_type: SenderType, text: &str) -> i64 {
        self.next_temp_id -= 1;
        let temp_id = self.next_temp_id;
        trace!("💬️ Optimistic echo {temp_id} for sender {sender_id}");
        self.entries.push(TranscriptEntry {
            id: temp_id,
            sender_id,
            sender_type,
            message: text.to_string(),
            created_at: Utc::now(),
            is_temporary: true,
        });
        temp_id
    }

    /// The server acknowledged a send: replace the first temporary entry with the same sender and
    /// text by the persisted message, in place. The match is by content, not id, since the server
    /// never saw the temporary id.
    pub fn resolve_success(&mut self, message: ChatMessage) {
        let slot = self
            .entries
            .iter()
            .position(|e| e.is_temporary && e.sender_id == message.sender_id && e.message == message.message);
        match slot {
            Some(i) => self.entries[i] = TranscriptEntry::from(message),
            None => {
                // The live push may have beaten the ack; fall back to the dedup path.
                debug!("💬️ Ack for message {} had no matching temporary entry", message.id);
                self.receive(message);
            },
        }
    }

    /// A send failed: drop the temporary entry and hand its text back so the compose field can be
    /// restored for resubmission.
    pub fn resolve_failure(&mut self, temp_id: i64) -> Option<String> {
        let slot = self.entries.iter().position(|e| e.id == temp_id && e.is_temporary)?;
        let entry = self.entries.remove(slot);
        debug!("💬️ Send {temp_id} failed; restoring text for resubmission");
        Some(entry.message)
    }

    /// A message arrived on the live channel. Messages whose id is already present are ignored
    /// silently; the optimistic-replace path has already consumed the matching entry.
    pub fn receive(&mut self, message: ChatMessage) {
        if self.entries.iter().any(|e| e.id == message.id) {
            trace!("💬️ Ignoring duplicate live message {}", message.id);
            return;
        }
        self.entries.push(TranscriptEntry::from(message));
    }
}
