//! 🔎 read_back.rs — "did it actually land?"
//!
//! 🎬 *[the writer says 10,000 rows went out. the store has not been asked.]*
//! *[read_back picks up the phone: "how many do you have? show me ten."]*
//!
//! After a load, count the table and pull a small sample through the same backend.
//! Backends with no read path (the script file, the Vec in RAM) answer `None` and the
//! read-back is skipped. Gateways answer with a JSON body shaped like
//! `{"count": 1, "data": [{"count": 10000}]}`. 🦆

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::{debug, info};

use crate::backends::Sink;
use crate::mapping::TableMapping;

/// 🔢 How many rows the post-load sample pulls.
pub const SAMPLE_ROWS: usize = 10;

/// 📊 What the store said when asked after the load.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadBack {
    /// `SELECT COUNT(*)` over the whole table, so rows from earlier runs count too.
    pub row_count: u64,
    pub sample: Vec<Value>,
}

/// 🔎 Count the table and fetch up to `sample_rows` rows. `Ok(None)` if the backend can't read.
pub async fn read_back<S: Sink + ?Sized>(
    sink: &mut S,
    mapping: &TableMapping,
    sample_rows: usize,
) -> Result<Option<ReadBack>> {
    let Some(count_body) = sink
        .query(mapping.count_cql())
        .await
        .context("💀 The row count query was not accepted")?
    else {
        debug!("🔎 backend has no read path, skipping read-back");
        return Ok(None);
    };
    let row_count = parse_count(&count_body)
        .with_context(|| format!("💀 Could not find a row count in the answer: '{count_body}'"))?;

    let sample_body = sink
        .query(mapping.sample_cql(sample_rows))
        .await
        .context("💀 The sample query was not accepted")?
        .unwrap_or_default();
    let sample = parse_rows(&sample_body)
        .with_context(|| format!("💀 Could not read sample rows from: '{sample_body}'"))?;

    info!(
        "🔎 read-back: {} rows in {}, sampled {}",
        row_count,
        mapping.qualified_table(),
        sample.len()
    );
    for row in &sample {
        debug!("🔎 {}", row);
    }
    Ok(Some(ReadBack { row_count, sample }))
}

/// 📜 The result rows, from `{"data": [...]}` or a bare `[...]`.
fn parse_rows(body: &str) -> Result<Vec<Value>> {
    let value: Value = serde_json::from_str(body).context("💀 the answer is not JSON")?;
    match value {
        Value::Array(rows) => Ok(rows),
        Value::Object(mut object) => match object.remove("data") {
            Some(Value::Array(rows)) => Ok(rows),
            _ => bail!("💀 expected a 'data' array of rows"),
        },
        _ => bail!("💀 expected rows, got a lone {}", value),
    }
}

/// 🧮 The first row's `count` column, or its only numeric column if the store named it differently.
fn parse_count(body: &str) -> Result<u64> {
    let rows = parse_rows(body)?;
    let first = rows
        .first()
        .and_then(Value::as_object)
        .context("💀 the count query returned no rows")?;
    first
        .get("count")
        .or_else(|| first.values().find(|v| v.is_number()))
        .and_then(Value::as_u64)
        .context("💀 no non-negative integer count in the first row")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{CommonSinkConfig, CqlGatewaySink, CqlGatewaySinkConfig, InMemorySink};
    use crate::model::account_mapping;
    use wiremock::matchers::{body_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn the_one_where_the_count_hides_under_different_names() -> Result<()> {
        assert_eq!(parse_count(r#"{"count":1,"data":[{"count":250}]}"#)?, 250);
        assert_eq!(parse_count(r#"[{"system.count(*)":42}]"#)?, 42);
        assert!(parse_count(r#"{"data":[]}"#).is_err());
        assert!(parse_count("the store is on fire").is_err());
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_script_file_has_nothing_to_say() -> Result<()> {
        let mut sink = InMemorySink::new().await?;
        let spy = sink.clone();
        let mapping = account_mapping("ks", "accounts");
        assert_eq!(read_back(&mut sink, &mapping, SAMPLE_ROWS).await?, None);
        assert!(spy.payloads().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_gateway_counts_and_shows_its_work() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v2/cql"))
            .and(body_string("SELECT COUNT(*) FROM account_test.accounts;"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"count":1,"data":[{"count":250}]}"#),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v2/cql"))
            .and(body_string("SELECT * FROM account_test.accounts LIMIT 10;"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"count":2,"data":[{"id":0,"name":"One Piece 0"},{"id":1,"name":"One Piece 1"}]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let mut sink = CqlGatewaySink::new(CqlGatewaySinkConfig {
            url: server.uri(),
            statement_path: "/v2/cql".into(),
            auth_token: None,
            username: None,
            password: None,
            common_config: CommonSinkConfig::default(),
        })
        .await?;
        let mapping = account_mapping("account_test", "accounts");
        let found = read_back(&mut sink, &mapping, SAMPLE_ROWS)
            .await?
            .expect("a gateway can read");

        assert_eq!(found.row_count, 250);
        assert_eq!(found.sample.len(), 2);
        assert_eq!(found.sample[1]["name"], "One Piece 1");
        Ok(())
    }
}
