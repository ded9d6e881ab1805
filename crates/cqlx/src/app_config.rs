//! 🔧 App Configuration — the sacred TOML-to-struct pipeline.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the junk drawer. Nothing." — every developer at 3am 🦆
//!
//! 🏗️ Powered by Figment, because manually parsing env vars is a form of
//! self-harm that even the borrow checker wouldn't approve of.
//!
//! ```toml
//! [sink_config.CqlGateway]
//! url = "http://localhost:8082"
//! auth_token = "..."
//!
//! [schema]
//! keyspace = "account_test"
//! table = "accounts"
//!
//! [runtime]
//! batch_size = 100
//! record_count = 10000
//! ```

use std::path::Path;

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use tracing::info;

use crate::backends::{CommonSinkConfig, CqlGatewaySinkConfig, FileSinkConfig};
use crate::composers::BatchKind;

/// 📦 The AppConfig: one struct to rule them all, one struct to find them,
/// one struct to bring them all, and in the Figment bind them.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// 🚰 Where the statements go.
    pub sink_config: SinkConfig,
    /// 🏗️ Which keyspace and table, and how hard to replicate them.
    #[serde(default)]
    pub schema: SchemaConfig,
    /// 🎛️ How many, how big, how loud.
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// 🎭 One variant per backend. The variant name is the TOML table name: `[sink_config.File]`.
///
/// `InMemory` takes no settings, so `sink_config = "InMemory"` is enough.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub enum SinkConfig {
    InMemory,
    File(FileSinkConfig),
    CqlGateway(CqlGatewaySinkConfig),
}

impl SinkConfig {
    /// 🔧 The settings every backend shares. `InMemory` gets the defaults.
    pub fn common_config(&self) -> CommonSinkConfig {
        match self {
            SinkConfig::InMemory => CommonSinkConfig::default(),
            SinkConfig::File(file_config) => file_config.common_config.clone(),
            SinkConfig::CqlGateway(gateway_config) => gateway_config.common_config.clone(),
        }
    }
}

/// 🏗️ Where the rows live.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SchemaConfig {
    #[serde(default = "default_keyspace")]
    pub keyspace: String,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_replication_factor")]
    pub replication_factor: u32,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            keyspace: default_keyspace(),
            table: default_table(),
            replication_factor: default_replication_factor(),
        }
    }
}

fn default_keyspace() -> String {
    "account_test".to_string()
}

fn default_table() -> String {
    "accounts".to_string()
}

fn default_replication_factor() -> u32 {
    1
}

/// 🎛️ Runtime knobs. Every one has a default, so `[runtime]` can be skipped entirely.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// 🪣 Records per batch. Signed on purpose: a zero or negative value is rejected
    /// by the writer with a proper error instead of by serde with a confusing one.
    #[serde(default = "default_batch_size", alias = "chunk_size")]
    pub batch_size: i64,
    /// 🏭 How many generated accounts to load.
    #[serde(default = "default_record_count")]
    pub record_count: u64,
    #[serde(default)]
    pub batch_kind: BatchKind,
    /// 💣 Drop and recreate the table and its types first. Off unless you mean it.
    #[serde(default)]
    pub reset_schema: bool,
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            record_count: default_record_count(),
            batch_kind: BatchKind::default(),
            reset_schema: false,
            show_progress: default_show_progress(),
        }
    }
}

fn default_batch_size() -> i64 {
    100
}

fn default_record_count() -> u64 {
    10_000
}

fn default_show_progress() -> bool {
    true
}

/// 🚀 Load the config — from a file, from env vars, or from the sheer power of hoping.
///
/// 🔧 Merges environment variables (CQLX_*) with an optional TOML file. Nested keys use a
/// double underscore: `CQLX_RUNTIME__BATCH_SIZE=50`.
///
/// 📐 If `config_file_name` is None → env vars only. If Some → env vars + TOML, TOML wins on conflicts.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    // 🏗️ env vars as the base layer — like a good sourdough starter.
    let config = Figment::new().merge(Env::prefixed("CQLX_").split("__"));

    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    // 💬 A context message that will actually TELL you what went wrong.
    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables (CQLX_*). \
             The file exists in our hearts, but apparently not in a shape serde recognizes.",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (CQLX_*). \
                 No file was provided — this one's all on the environment. Classic."
            .to_string(),
    };

    config.extract().context(context_msg)
}
