// ai
//! 🎬 *[the inserts are mapped. the sink awaits. but someone... must wrap them in a batch.]*
//!
//! 🎼 The Composers module — turning one chunk of `InsertRequest`s into one CQL batch.
//!
//! ```text
//! BulkWriter pipeline:
//!   split → map each record → composer.compose(&chunk) → sink.send(payload)
//! ```
//!
//! ```text
//! BEGIN BATCH
//!   INSERT INTO ks.accounts (...) VALUES (...);
//!   INSERT INTO ks.accounts (...) VALUES (...);
//! APPLY BATCH;
//! ```
//!
//! 🧠 Knowledge graph:
//! - **Logged** (`BEGIN BATCH`): the store writes a batch log first, so the chunk is
//!   all-or-nothing from its point of view. The default, same as the classic drivers.
//! - **Unlogged** (`BEGIN UNLOGGED BATCH`): skips the batch log. Faster, no atomicity.
//! - The composer does not care which sink receives the payload. Format follows the store.
//!
//! 🦆 (the duck asked for a COUNTER batch. the duck was ignored.)

use serde::Deserialize;

use crate::mapping::InsertRequest;

/// 📜 Which flavour of `BEGIN ... BATCH` to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchKind {
    #[default]
    Logged,
    Unlogged,
}

impl BatchKind {
    fn opening(self) -> &'static str {
        match self {
            BatchKind::Logged => "BEGIN BATCH",
            BatchKind::Unlogged => "BEGIN UNLOGGED BATCH",
        }
    }
}

/// 🎼 Assembles a chunk of inserts into a single batch statement.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchComposer {
    kind: BatchKind,
}

impl BatchComposer {
    pub fn new(kind: BatchKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> BatchKind {
        self.kind
    }

    /// 🎼 One chunk in, one batch statement out. An empty chunk composes to an empty string.
    pub fn compose(&self, requests: &[InsertRequest]) -> String {
        if requests.is_empty() {
            return String::new();
        }
        // 🧮 vibes-based pre-allocation: ~256 bytes per insert is about right for the demo rows
        let mut payload = String::with_capacity(requests.len() * 256 + 32);
        payload.push_str(self.kind.opening());
        payload.push('\n');
        for request in requests {
            payload.push_str("  ");
            payload.push_str(&request.to_cql());
            payload.push('\n');
        }
        payload.push_str("APPLY BATCH;");
        payload
    }
}
