//! # 📡 THE CQL GATEWAY BACKEND
//!
//! 🎬 COLD OPEN — INT. SERVER ROOM — 3:47 AM
//!
//! The cluster hums. Port 9042 is firewalled off by someone who has since left the
//! company. All that remains is an HTTP gateway that accepts CQL as plain text and
//! answers with a status code. It will have to do. It always has to do.
//!
//! 🚀 This module POSTs rendered statements to that gateway. One request per
//! statement: a DDL statement, one whole `BEGIN BATCH ... APPLY BATCH;`, or a
//! read-back `SELECT` whose response body comes back to the caller.
//! It does not retry. It does not pool. It does not judge.
//!
//! 🦆 (mandatory duck, no context provided, none shall be requested)

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::backends::{CommonSinkConfig, Sink};

// 📡 CqlGatewaySinkConfig — co-located with its sink, like socks living near feet.
//
// 🔧 auth is tri-modal: token header, username+password, or "I hope anonymous works".
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CqlGatewaySinkConfig {
    /// 📡 Base URL of the gateway. Scheme + host + port. Yes, all of it.
    pub url: String,
    /// 🛣️ Path that accepts CQL text. Appended to `url`.
    #[serde(default = "default_statement_path")]
    pub statement_path: String,
    /// 🔒 Auth token, sent as `X-Cassandra-Token`. Wins over basic auth.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// 🔒 Username for basic auth. Optional, like flossing.
    #[serde(default)]
    pub username: Option<String>,
    /// 🔒 Password. "cassandra" is not a password. It is a confession.
    #[serde(default)]
    pub password: Option<String>,
    /// 🔧 Common sink config: batch payload threshold, and other life decisions.
    #[serde(flatten, default)]
    pub common_config: CommonSinkConfig,
}

fn default_statement_path() -> String {
    "/v2/cql".to_string()
}

/// 📡 The gateway sink — pure I/O, one HTTP request per statement.
///
/// Internally holds:
/// - `client`: the HTTP muscle 💪 — reused across requests
/// - `statement_url`: `url` + `statement_path`, computed once
/// - `sink_config`: auth info
#[derive(Debug)]
pub struct CqlGatewaySink {
    client: reqwest::Client,
    statement_url: String,
    sink_config: CqlGatewaySinkConfig,
}

impl CqlGatewaySink {
    /// 🚀 Stand up a new `CqlGatewaySink`, fully wired and ready to receive statements.
    ///
    /// 1. Builds the `reqwest::Client` with 10s connect / 30s request timeouts.
    /// 2. Pings the gateway root with a GET. If the gateway is not there, we'd rather
    ///    know now than after the keyspace DDL was "sent".
    pub async fn new(config: CqlGatewaySinkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .context("💀 The HTTP client refused to be born. The TLS stack wept. Probably a cursed system cert store.")?;

        let base = config.url.trim_end_matches('/');
        let statement_url = format!(
            "{}/{}",
            base,
            config.statement_path.trim_start_matches('/')
        );

        // -- 📡 Connectivity ping — "Hello? Is this thing on?" — a developer, gesturing at a cluster.
        // -- 🔒 with credentials, so a gateway that wants them says so now and not mid-load
        let ping = authorize(&config, client.get(base))
            .send()
            .await
            .context(format!(
                "💀 Could not reach the CQL gateway at '{base}'. The network is giving us the silent treatment."
            ))?;
        let ping_status = ping.status();
        if ping_status == reqwest::StatusCode::UNAUTHORIZED
            || ping_status == reqwest::StatusCode::FORBIDDEN
        {
            anyhow::bail!(
                "💀 The CQL gateway at '{base}' is up but answered the ping with '{ping_status}'. \
                 Check auth_token, or username and password. The bouncer does not know us."
            );
        }
        debug!(
            "✅ CQL gateway at '{}' answered the ping with {}",
            base,
            ping.status()
        );

        Ok(Self {
            client,
            statement_url,
            sink_config: config,
        })
    }

    /// 📡 POST one statement and hand back whatever the gateway answered.
    async fn post(&self, statement: String) -> Result<String> {
        debug!(
            "📡 Sending {} bytes of CQL to {}",
            statement.len(),
            self.statement_url
        );
        let request = self
            .client
            .post(&self.statement_url)
            .header("Content-Type", "text/plain");
        let response = authorize(&self.sink_config, request)
            .body(statement)
            .send()
            .await
            .context("💀 The statement never made it to the gateway. Check connectivity, check timeouts, check your feelings.")?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!(
                "💀 The gateway received our CQL and answered '{}'. The body of the response read: '{}'.",
                status,
                body
            );
        }
        trace!("🚀 statement accepted — the rows have left the building");
        Ok(body)
    }
}

fn authorize(
    config: &CqlGatewaySinkConfig,
    request: reqwest::RequestBuilder,
) -> reqwest::RequestBuilder {
    // -- 🔒 token beats basic auth in this club
    if let Some(ref token) = config.auth_token {
        request.header("X-Cassandra-Token", token)
    } else if let Some(ref username) = config.username {
        request.basic_auth(username, config.password.as_ref())
    } else {
        request
    }
}

#[async_trait]
impl Sink for CqlGatewaySink {
    /// 📡 POST one statement. Non-2xx is an error carrying the status and whatever the gateway said.
    async fn send(&mut self, payload: String) -> Result<()> {
        self.post(payload).await.map(|_| ())
    }

    /// 🔎 Same POST, but the response body is the point.
    async fn query(&mut self, statement: String) -> Result<Option<String>> {
        self.post(statement).await.map(Some)
    }

    /// 🗑️ Nothing to flush — every statement was sent synchronously. The client drops cleanly.
    async fn close(&mut self) -> Result<()> {
        debug!("🗑️ CQL gateway sink closing — no buffer to flush, just vibes to release");
        Ok(())
    }
}
