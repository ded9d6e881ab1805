//! 🚀 cqlx — bulk loads into a wide-column store, one batch at a time.
//!
//! 📦 Records go in, get split into chunks, get mapped to `INSERT`s, get wrapped in a
//! `BEGIN BATCH`, and go out through a backend. Schema is made ready first. 🦆
//!
//! ```text
//! AppConfig → Supervisor
//!               ├─ CqlProvisioner::ensure_schema_ready   (keyspace, types, table)
//!               ├─ BulkWriter::write_all                 (split → map → compose → send)
//!               │     └─ CqlBatchSink → SinkBackend { InMemory | File | CqlGateway }
//!               └─ read_back                             (count + sample, gateways only)
//! ```

use anyhow::Result;

pub mod app_config;
pub mod backends;
pub mod composers;
pub mod errors;
pub mod mapping;
pub mod model;
pub mod progress;
pub mod provisioner;
pub mod read_back;
pub mod splitter;
mod supervisors;
pub mod writer;

pub use app_config::{AppConfig, load_config};
pub use errors::{InvalidArgument, ProvisionError, SinkError, WriteError};
pub use provisioner::{CqlProvisioner, ProvisionOptions, SchemaProvisioner};
pub use read_back::ReadBack;
pub use splitter::split;
pub use writer::{BulkWriter, CqlBatchSink, WriteReport, WriteSink};

pub use crate::supervisors::RunReport;
use crate::supervisors::Supervisor;

/// 🚀 Provision, generate, write, read back, report. Everything the binary needs in one call.
pub async fn run(app_config: AppConfig) -> Result<RunReport> {
    Supervisor::new(app_config).run().await
}
