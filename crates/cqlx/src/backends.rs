//! 🔌 Backends — where the real I/O happens.
//!
//! 🚰 The pipeline composes CQL. Backends carry it somewhere: a gateway in front of
//! the cluster, a `.cql` script on disk, or a `Vec` in RAM for the tests.
//!
//! 🎭 This module is the casting agency. Need to talk to a live cluster over HTTP?
//! Dump a replayable script for `cqlsh -f`? Assert on payloads in a unit test?
//! We've got a backend for that.
//!
//! 🦆 The duck is here because every file must have one. This is law. Do not question the duck.

use anyhow::Result;
use async_trait::async_trait;

pub mod common_config;
pub mod cql_gateway;
pub mod file;
pub mod in_mem;

// 🎯 Re-export backend-specific configs so callers can do `backends::FileSinkConfig`
// instead of spelunking into `backends::file::FileSinkConfig`.
pub use common_config::CommonSinkConfig;
pub use cql_gateway::{CqlGatewaySink, CqlGatewaySinkConfig};
pub use file::{FileSink, FileSinkConfig};
pub use in_mem::InMemorySink;

use crate::app_config::SinkConfig;

/// 🕳️ A sink that sends fully rendered CQL — pure I/O, zero logic.
///
/// Sinks are ONLY an abstraction for how the statement text travels: HTTP POST to a
/// gateway, write to a file, stash in memory. They do not compose. They do not retry.
/// They receive the rendered payload and send it.
///
/// # Contract 📜
/// - `send` accepts one complete statement (a batch or a DDL statement) and delivers it.
///   `Ok` means the destination accepted it.
/// - `close` flushes, finalizes, and bids the data a fond farewell. MUST be called.
///   Skipping `close` is a bug. It is also considered rude.
#[async_trait]
pub trait Sink: std::fmt::Debug + Send {
    /// 📡 Deliver one rendered statement. I/O only. No questions asked.
    async fn send(&mut self, payload: String) -> Result<()>;
    /// 🔎 Run a read statement and return the raw response body.
    ///
    /// `None` means this backend has no read path (a script file, a Vec in RAM).
    async fn query(&mut self, _statement: String) -> Result<Option<String>> {
        Ok(None)
    }
    /// 🗑️ Flush, finalize, and release. Call this. Always. No exceptions. Not even on Fridays.
    async fn close(&mut self) -> Result<()>;
}

/// 🎭 The many faces of a Sink — a polymorphic casting call for statement destinations.
///
/// The enum dispatches `send` and `close` to the inner concrete type, keeping the
/// supervisor blissfully ignorant of where the rows actually land.
#[derive(Debug)]
pub enum SinkBackend {
    InMemory(InMemorySink),
    File(FileSink),
    CqlGateway(CqlGatewaySink),
}

impl SinkBackend {
    /// 🔧 Build the backend the config asks for. Gateways ping the cluster on the way in.
    pub async fn from_config(config: &SinkConfig) -> Result<Self> {
        Ok(match config {
            SinkConfig::InMemory => SinkBackend::InMemory(InMemorySink::new().await?),
            SinkConfig::File(file_config) => {
                SinkBackend::File(FileSink::new(file_config.clone()).await?)
            }
            SinkConfig::CqlGateway(gateway_config) => {
                SinkBackend::CqlGateway(CqlGatewaySink::new(gateway_config.clone()).await?)
            }
        })
    }
}

#[async_trait]
impl Sink for SinkBackend {
    async fn send(&mut self, payload: String) -> Result<()> {
        match self {
            SinkBackend::InMemory(sink) => sink.send(payload).await,
            SinkBackend::File(sink) => sink.send(payload).await,
            SinkBackend::CqlGateway(sink) => sink.send(payload).await,
        }
    }

    async fn query(&mut self, statement: String) -> Result<Option<String>> {
        match self {
            SinkBackend::InMemory(sink) => sink.query(statement).await,
            SinkBackend::File(sink) => sink.query(statement).await,
            SinkBackend::CqlGateway(sink) => sink.query(statement).await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self {
            SinkBackend::InMemory(sink) => sink.close().await,
            SinkBackend::File(sink) => sink.close().await,
            SinkBackend::CqlGateway(sink) => sink.close().await,
        }
    }
}

// 🔧 `&mut S` is a sink too, so the provisioner can borrow the backend and hand it back.
#[async_trait]
impl<S: Sink + ?Sized> Sink for &mut S {
    async fn send(&mut self, payload: String) -> Result<()> {
        (**self).send(payload).await
    }

    async fn query(&mut self, statement: String) -> Result<Option<String>> {
        (**self).query(statement).await
    }

    async fn close(&mut self) -> Result<()> {
        (**self).close().await
    }
}
