//! 💀 errors.rs — the taxonomy of sadness, now with types.
//!
//! 🎬 *[a chunk fails. the pipeline stops. the caller asks "which one?"]*
//! *[anyhow shrugs. thiserror steps forward with a clipboard.]*
//!
//! Everything inside the backends speaks `anyhow` (context chains, 3am-readable).
//! The pipeline boundary speaks these enums, because a caller who wants to resume
//! a half-finished load needs a chunk index, not a poem. 🦆

use std::num::TryFromIntError;

/// 🚫 A size that makes no sense. Zero. Negative. Vibes. Too big to have unique ids.
///
/// Not recoverable. This is a caller bug wearing a config file as a disguise.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidArgument {
    #[error("💀 batch size must be greater than zero, got 0")]
    ZeroBatchSize,
    #[error("💀 batch size must be a positive integer that fits in usize: {0}")]
    NotRepresentable(#[from] TryFromIntError),
    #[error("💀 asked for {requested} records, but only {max} distinct int ids exist")]
    TooManyRecords { requested: u64, max: u64 },
}

// 🔧 `usize: TryInto<usize>` can't fail, but the splitter is generic over the size type,
// so the impossible case still needs a door. Nobody will ever walk through it.
impl From<std::convert::Infallible> for InvalidArgument {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

/// 📡 A sink refused a submission. Network, server-side rejection, disk full, take your pick.
///
/// Transparent over `anyhow::Error` so the backend's context chain survives intact.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct SinkError(#[from] anyhow::Error);

impl SinkError {
    /// 🔎 The full `anyhow` chain, for the logs you'll grep later.
    pub fn chain(&self) -> anyhow::Chain<'_> {
        self.0.chain()
    }
}

/// 🗺️ A record could not be squeezed into the table mapping. Wrong type, missing key, etc.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct MappingError(#[from] anyhow::Error);

/// 🏗️ Schema setup went sideways. Fatal to the run, surfaced unchanged in its error chain.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// The mapping itself is wrong before we even talk to the store.
    #[error("💀 invalid table mapping: {0}")]
    InvalidMapping(String),
    /// The store looked at our DDL and said no.
    #[error("💀 schema statement was rejected: {statement}")]
    StatementFailed {
        statement: String,
        #[source]
        cause: SinkError,
    },
}

/// 🚰 Everything `BulkWriter::write_all` can surface.
///
/// `records_written` counts rows in chunks that the sink already accepted. Those are
/// not rolled back. Resume from `failed_at_chunk_index` / `chunk_index` if you dare.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),

    #[error(
        "💀 write failed at chunk {failed_at_chunk_index} after {records_written} records were written"
    )]
    WriteFailed {
        failed_at_chunk_index: usize,
        records_written: u64,
        #[source]
        cause: SinkError,
    },

    #[error(
        "💀 a record in chunk {chunk_index} could not be mapped to a row ({records_written} records were already written)"
    )]
    Mapping {
        chunk_index: usize,
        records_written: u64,
        #[source]
        source: MappingError,
    },
}

impl WriteError {
    /// 📊 How many chunks made it before the music stopped. Zero for argument errors.
    pub fn chunks_completed(&self) -> usize {
        match self {
            WriteError::WriteFailed {
                failed_at_chunk_index,
                ..
            } => *failed_at_chunk_index,
            WriteError::Mapping { chunk_index, .. } => *chunk_index,
            WriteError::InvalidArgument(_) => 0,
        }
    }
}
