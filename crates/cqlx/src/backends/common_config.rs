// ai
//! 🎬 *[one config. one threshold. one store that gets grumpy about big batches.]*
//!
//! 📦 **Common Sink Config** — the shared knobs every sink backend config embeds.
//!
//! 🧠 Knowledge graph:
//! - Embedded (flattened) in `FileSinkConfig` and `CqlGatewaySinkConfig`.
//! - `max_batch_payload_bytes`: the size above which the batch sink logs a warning.
//!   The store's default batch fail threshold is 50 KiB; batches above it get rejected
//!   server-side, so we'd rather you hear about it from us first.
//! - We warn, we don't split. Chunk size is a row count, chosen by the caller. 🦆

use serde::Deserialize;

/// 🚰 Shared configuration embedded by every sink backend config.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CommonSinkConfig {
    /// 🚰 Rendered batch size (bytes) above which we complain in the logs
    #[serde(default = "default_max_batch_payload_bytes")]
    pub max_batch_payload_bytes: usize,
}

// 🚰 50 KiB — the store's stock `batch_size_fail_threshold`. Bigger batches bounce.
fn default_max_batch_payload_bytes() -> usize {
    50 * 1024
}

impl Default for CommonSinkConfig {
    fn default() -> Self {
        CommonSinkConfig {
            max_batch_payload_bytes: default_max_batch_payload_bytes(),
        }
    }
}
