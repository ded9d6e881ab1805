//! 🎬 *[camera pans across a dimly lit server room]*
//! 🎬 *[dramatic orchestral music swells]*
//! 🎬 "In a world where ten thousand accounts need a home..."
//! 🎬 "One supervisor dared to provision it first."
//! 🎬 *[record scratch]* 🦆
//!
//! 📦 The Supervisor — part middle manager, part helicopter parent. It does not write
//! a single row itself. It builds the backend, gets the schema ready, hands the
//! writer its records, and makes sure the backend is closed no matter how it went.
//!
//! ```text
//! validate mapping → build backend → provision → generate → write_all → read back → close → report
//! ```

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::app_config::AppConfig;
use crate::backends::{Sink, SinkBackend};
use crate::composers::BatchComposer;
use crate::mapping::TableMapping;
use crate::model::{account_mapping, generate_accounts};
use crate::progress::ProgressMetrics;
use crate::provisioner::{CqlProvisioner, ProvisionOptions, SchemaProvisioner};
use crate::read_back::{ReadBack, SAMPLE_ROWS, read_back};
use crate::writer::{BulkWriter, CqlBatchSink, WriteReport};

/// 📊 Everything a finished run has to show: what we wrote, and what the store says it has.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub write: WriteReport,
    /// `None` when the backend has no read path.
    pub read_back: Option<ReadBack>,
}

impl RunReport {
    pub fn verified_rows(&self) -> Option<u64> {
        self.read_back.as_ref().map(|found| found.row_count)
    }
}

/// 📦 The Supervisor: because even a bulk load needs someone hovering over it
/// asking "is it done yet?" every 5 milliseconds.
pub(crate) struct Supervisor {
    /// 🔧 The sacred scrolls of configuration, passed down from main()
    app_config: AppConfig,
}

impl Supervisor {
    pub(crate) fn new(app_config: AppConfig) -> Self {
        Self { app_config }
    }

    fn mapping(&self) -> TableMapping {
        let schema = &self.app_config.schema;
        account_mapping(&schema.keyspace, &schema.table)
    }

    /// 🚀 Run the whole load, start to finish.
    ///
    /// The backend is closed even when provisioning or writing fails; the first error wins.
    pub(crate) async fn run(&self) -> Result<RunReport> {
        let mapping = self.mapping();
        // -- 🗺️ a broken mapping is caught before any connection is opened
        mapping
            .validate()
            .context("💀 The table mapping is wrong before we even said hello to the store")?;

        let mut backend = SinkBackend::from_config(&self.app_config.sink_config)
            .await
            .context("💀 Could not build the sink backend from the config")?;

        let outcome = self.provision_and_write(&mut backend, mapping).await;

        // -- 🗑️ close always. a failed run with an unflushed script is two problems.
        let closed = backend
            .close()
            .await
            .context("💀 The sink backend would not close cleanly");

        match (outcome, closed) {
            (Ok(report), Ok(())) => Ok(report),
            (Err(err), Ok(())) => Err(err),
            (Ok(_), Err(close_err)) => Err(close_err),
            (Err(err), Err(close_err)) => {
                error!("⚠️ also failed to close the backend: {:#}", close_err);
                Err(err)
            }
        }
    }

    async fn provision_and_write(
        &self,
        backend: &mut SinkBackend,
        mapping: TableMapping,
    ) -> Result<RunReport> {
        let runtime = &self.app_config.runtime;
        // -- 🔢 checked before any DDL goes out. more accounts than int ids means silent overwrites.
        let accounts = generate_accounts(runtime.record_count).context(format!(
            "💀 record_count {} is more than {} can hold with unique ids",
            runtime.record_count,
            mapping.qualified_table()
        ))?;

        let options = ProvisionOptions {
            replication_factor: self.app_config.schema.replication_factor,
            reset: runtime.reset_schema,
        };
        CqlProvisioner::new(&mut *backend, &mapping, options)
            .ensure_schema_ready()
            .await
            .context("💀 The schema could not be made ready")?;

        info!(
            "🏭 generating {} accounts for {}",
            runtime.record_count,
            mapping.qualified_table()
        );

        let progress = if runtime.show_progress {
            ProgressMetrics::new(mapping.qualified_table(), runtime.record_count)
        } else {
            ProgressMetrics::hidden(mapping.qualified_table(), runtime.record_count)
        };
        let mut writer = BulkWriter::new(mapping.clone()).with_progress(progress);
        let mut batch_sink = CqlBatchSink::new(
            &mut *backend,
            BatchComposer::new(runtime.batch_kind),
            self.app_config.sink_config.common_config().max_batch_payload_bytes,
        );

        let write = writer
            .write_all(&mut batch_sink, accounts, runtime.batch_size)
            .await
            .context("💀 The bulk write did not finish")?;

        let found = read_back(&mut *backend, &mapping, SAMPLE_ROWS)
            .await
            .context("💀 The rows were written, but reading them back failed")?;
        if let Some(found) = &found {
            if found.row_count < write.record_count {
                warn!(
                    "⚠️ wrote {} records but {} reports only {} rows",
                    write.record_count,
                    mapping.qualified_table(),
                    found.row_count
                );
            }
        }
        Ok(RunReport {
            write,
            read_back: found,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::{RuntimeConfig, SchemaConfig, SinkConfig};
    use crate::backends::{CommonSinkConfig, CqlGatewaySinkConfig, FileSinkConfig};
    use crate::errors::{InvalidArgument, ProvisionError, WriteError};
    use wiremock::matchers::{body_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn file_config(path: &std::path::Path, runtime: RuntimeConfig) -> AppConfig {
        AppConfig {
            sink_config: SinkConfig::File(FileSinkConfig {
                file_name: path.display().to_string(),
                common_config: CommonSinkConfig::default(),
            }),
            schema: SchemaConfig::default(),
            runtime,
        }
    }

    #[tokio::test]
    async fn the_one_where_the_whole_show_lands_in_a_script() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("load.cql");
        let report = Supervisor::new(file_config(
            &path,
            RuntimeConfig {
                record_count: 250,
                show_progress: false,
                ..Default::default()
            },
        ))
        .run()
        .await?;

        assert_eq!(report.write.record_count, 250);
        assert_eq!(report.write.chunk_count, 3);
        assert_eq!(report.verified_rows(), None, "a script file cannot be asked for a count");

        let script = std::fs::read_to_string(&path)?;
        assert!(script.starts_with("CREATE KEYSPACE IF NOT EXISTS account_test"));
        assert_eq!(script.matches("BEGIN BATCH\n").count(), 3);
        assert_eq!(script.matches("INSERT INTO account_test.accounts").count(), 250);
        assert!(!script.contains("DROP "), "nothing is dropped unless asked");
        // -- 🧊 schema before data, always
        let table_at = script.find("CREATE TABLE").unwrap_or(usize::MAX);
        let first_batch_at = script.find("BEGIN BATCH").unwrap_or(0);
        assert!(table_at < first_batch_at);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_reset_is_asked_for_and_delivered() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("reset.cql");
        Supervisor::new(file_config(
            &path,
            RuntimeConfig {
                record_count: 1,
                reset_schema: true,
                show_progress: false,
                ..Default::default()
            },
        ))
        .run()
        .await?;

        let script = std::fs::read_to_string(&path)?;
        assert!(script.contains("DROP TABLE IF EXISTS account_test.accounts;"));
        assert!(script.contains("DROP TYPE IF EXISTS account_test.contact;"));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_bad_batch_size_still_closes_the_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("zero.cql");
        let err = Supervisor::new(file_config(
            &path,
            RuntimeConfig {
                batch_size: 0,
                record_count: 10,
                show_progress: false,
                ..Default::default()
            },
        ))
        .run()
        .await
        .expect_err("batch size zero must fail the run");

        assert!(matches!(
            err.downcast_ref::<WriteError>(),
            Some(WriteError::InvalidArgument(_))
        ));
        // -- ✅ the DDL that did go out was flushed on close
        let script = std::fs::read_to_string(&path)?;
        assert!(script.contains("CREATE TABLE IF NOT EXISTS account_test.accounts"));
        assert!(!script.contains("BEGIN BATCH"));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_in_memory_backend_just_works() -> Result<()> {
        let report = Supervisor::new(AppConfig {
            sink_config: SinkConfig::InMemory,
            schema: SchemaConfig {
                keyspace: "ks".into(),
                table: "t".into(),
                replication_factor: 1,
            },
            runtime: RuntimeConfig {
                record_count: 10,
                batch_size: 3,
                show_progress: false,
                ..Default::default()
            },
        })
        .run()
        .await?;
        assert_eq!(report.write.record_count, 10);
        assert_eq!(report.write.chunk_count, 4);
        assert_eq!(report.read_back, None);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_three_billion_records_are_refused_before_any_ddl() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("too_many.cql");
        let err = Supervisor::new(file_config(
            &path,
            RuntimeConfig {
                record_count: 3_000_000_000,
                show_progress: false,
                ..Default::default()
            },
        ))
        .run()
        .await
        .expect_err("ids past i32::MAX would overwrite one row over and over");

        assert!(matches!(
            err.downcast_ref::<InvalidArgument>(),
            Some(InvalidArgument::TooManyRecords {
                requested: 3_000_000_000,
                ..
            })
        ));
        assert!(format!("{err:#}").contains("record_count 3000000000"));
        assert_eq!(std::fs::read_to_string(&path)?, "", "nothing reaches the store");
        Ok(())
    }

    fn gateway_config(server: &MockServer, record_count: u64) -> AppConfig {
        AppConfig {
            sink_config: SinkConfig::CqlGateway(CqlGatewaySinkConfig {
                url: server.uri(),
                statement_path: "/v2/cql".into(),
                auth_token: Some("sekrit".into()),
                username: None,
                password: None,
                common_config: CommonSinkConfig::default(),
            }),
            schema: SchemaConfig::default(),
            runtime: RuntimeConfig {
                record_count,
                show_progress: false,
                ..Default::default()
            },
        }
    }

    async fn mount_ping(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn the_one_where_the_gateway_is_asked_how_many_it_kept() -> Result<()> {
        let server = MockServer::start().await;
        mount_ping(&server).await;
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
                r#"{"count":1,"data":[{"id":0,"name":"One Piece 0"}]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;
        // -- 🪣 everything else (DDL, batches) just gets a polite 200
        Mock::given(method("POST"))
            .and(path("/v2/cql"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let report = Supervisor::new(gateway_config(&server, 250)).run().await?;

        assert_eq!(report.write.record_count, 250);
        assert_eq!(report.verified_rows(), Some(250));
        let found = report.read_back.expect("the gateway can read");
        assert_eq!(found.sample.len(), 1);
        assert_eq!(found.sample[0]["name"], "One Piece 0");
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_rejected_ddl_keeps_its_typed_error() -> Result<()> {
        let server = MockServer::start().await;
        mount_ping(&server).await;
        Mock::given(method("POST"))
            .and(path("/v2/cql"))
            .respond_with(ResponseTemplate::new(500).set_body_string("no keyspaces today"))
            .mount(&server)
            .await;

        let err = Supervisor::new(gateway_config(&server, 10))
            .run()
            .await
            .expect_err("a rejected CREATE KEYSPACE must fail the run");

        match err.downcast_ref::<ProvisionError>() {
            Some(ProvisionError::StatementFailed { statement, .. }) => {
                assert!(statement.starts_with("CREATE KEYSPACE IF NOT EXISTS account_test"));
            }
            other => panic!("💀 expected StatementFailed in the chain, got {other:?}"),
        }
        assert!(format!("{err:#}").contains("no keyspaces today"));
        Ok(())
    }
}
