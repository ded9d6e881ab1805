//! 📝 The file backend — a `.cql` script you can replay with `cqlsh -f` later.
//!
//! 🚰 Every statement the pipeline sends (DDL and batches alike) lands on disk, one after
//! another, each followed by a newline. No cluster needed. Great for dry runs, diffs,
//! and proving to your tech lead that the batch really does have 100 inserts in it.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::{
    fs::File,
    io::{self, AsyncWriteExt},
};
use tracing::trace;

use crate::backends::{CommonSinkConfig, Sink};

// -- 🚰 FileSinkConfig — lives next to its FileSink bestie. One backend = one config = one file.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct FileSinkConfig {
    pub file_name: String,
    #[serde(flatten, default)]
    pub common_config: CommonSinkConfig,
}

/// 🚰 FileSink — receives rendered statements and appends them to a script. I/O only.
///
/// ⚠️ `File::create` truncates if the file exists. No warning. No backup. Just gone.
#[derive(Debug)]
pub struct FileSink {
    file_buf: io::BufWriter<File>,
    statements_written: u64,
}

impl FileSink {
    /// 🚀 Creates (or obliterates and recreates) the script file and wraps it in a BufWriter.
    pub async fn new(sink_config: FileSinkConfig) -> Result<Self> {
        let file_handle = File::create(&sink_config.file_name).await.context(format!(
            "💀 The script file '{}' could not be conjured into existence. \
                We stared at the path. The path stared back. \
                One of us was wrong about whether the parent directory existed.",
            &sink_config.file_name
        ))?;
        // -- 📦 BufWriter: because issuing one syscall per statement is a war crime.
        Ok(Self {
            file_buf: io::BufWriter::new(file_handle),
            statements_written: 0,
        })
    }
}

#[async_trait]
impl Sink for FileSink {
    /// 📡 Write one statement and a newline. That's the whole job.
    async fn send(&mut self, payload: String) -> Result<()> {
        trace!(
            "📬 statement #{} ({} bytes) walked into the file sink",
            self.statements_written,
            payload.len()
        );
        self.file_buf
            .write_all(payload.as_bytes())
            .await
            .context("💀 failed to write a statement to the script file")?;
        self.file_buf.write_all(b"\n").await?;
        self.statements_written += 1;
        Ok(())
    }

    /// 🗑️ Flush the BufWriter. Without this, your last batch is a letter you wrote but never sent.
    async fn close(&mut self) -> Result<()> {
        trace!(
            "🎬 final flush after {} statements. the BufWriter empties its soul to disk",
            self.statements_written
        );
        self.file_buf.flush().await.context(
            "💀 Error flushing the script file — the bytes are still in memory. The disk remains unwritten.",
        )
    }
}
