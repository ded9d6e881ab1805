//! # Previously, on Cqlx...
//!
//! 🎬 The rows were ready. The cluster was not. Someone had to write a backend so
//! simple it lives entirely in RAM, gone the moment you blink.
//!
//! That someone was this module.
//!
//! `in_mem` provides an in-memory [`Sink`] for testing and local dry runs. The
//! [`InMemorySink`] collects every statement behind an `Arc<Mutex<...>>` so callers
//! can inspect what arrived — great for assertions, great for trust issues, great for both.
//!
//! 🦆
//!
//! ⚠️ This is NOT for production. This is for tests. If you're deploying this
//! to prod, please also deploy a therapist.

use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::backends::Sink;

/// 📦 A sink that never forgets.
///
/// Clone-able because tests need to peek inside after handing `self` off to the
/// pipeline. The `Arc` means everyone shares the same Vec.
#[derive(Debug, Default, Clone)]
pub struct InMemorySink {
    /// 🔒 The vault. Each entry = one fully rendered statement.
    received: Arc<Mutex<Vec<String>>>,
    /// 💣 After this many successful sends, every further send fails. Tests only.
    fail_after: Option<usize>,
}

impl InMemorySink {
    /// 🚀 Spins up a brand new sink, ready to absorb statements.
    pub async fn new() -> Result<Self> {
        Ok(Self::default())
    }

    /// 💣 A sink that accepts `successes` statements and then starts saying no.
    pub fn failing_after(successes: usize) -> Self {
        Self {
            fail_after: Some(successes),
            ..Self::default()
        }
    }

    /// 🔎 A snapshot of everything received so far, in arrival order.
    pub async fn payloads(&self) -> Vec<String> {
        self.received.lock().await.clone()
    }
}

#[async_trait]
impl Sink for InMemorySink {
    /// 📡 Stores a fully rendered statement. Lock, push, done.
    async fn send(&mut self, payload: String) -> Result<()> {
        // 🔒 The Mutex is load-bearing. Do not remove. I know it looks optional. It isn't.
        let mut received = self.received.lock().await;
        if let Some(limit) = self.fail_after {
            if received.len() >= limit {
                bail!(
                    "💀 in-memory sink was told to fail after {limit} statements, and it is a sink of its word"
                );
            }
        }
        received.push(payload);
        Ok(())
    }

    /// 🗑️ Nothing to clean up. We live in RAM.
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
