//! 🏗️ provisioner.rs — making sure the house exists before the furniture arrives.
//!
//! 🎬 *[the writer shows up with ten thousand rows. "where do these go?" it asks.]*
//! *[the provisioner has already built the keyspace, the types, and the table.]*
//!
//! Every statement is `IF NOT EXISTS`, so running this before every load is safe.
//! The destructive version (drop the table, drop the types, build them again) only
//! happens when someone explicitly asks for it with `reset`. We do not bulldoze by default. 🦆

use async_trait::async_trait;
use tracing::{debug, info};

use crate::backends::Sink;
use crate::errors::ProvisionError;
use crate::mapping::TableMapping;

/// ✅ Anything that can promise "the schema is ready".
#[async_trait]
pub trait SchemaProvisioner: Send {
    /// Idempotent. Safe to call before every run.
    async fn ensure_schema_ready(&mut self) -> Result<(), ProvisionError>;
}

/// 🔧 Knobs for provisioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionOptions {
    pub replication_factor: u32,
    /// 💣 Drop the table and its types before creating them again. Opt-in only.
    pub reset: bool,
}

impl Default for ProvisionOptions {
    fn default() -> Self {
        Self {
            replication_factor: 1,
            reset: false,
        }
    }
}

/// 🏗️ Provisions a [`TableMapping`] by sending DDL through a backend [`Sink`].
#[derive(Debug)]
pub struct CqlProvisioner<'a, S: Sink> {
    sink: &'a mut S,
    mapping: &'a TableMapping,
    options: ProvisionOptions,
}

impl<'a, S: Sink> CqlProvisioner<'a, S> {
    pub fn new(sink: &'a mut S, mapping: &'a TableMapping, options: ProvisionOptions) -> Self {
        Self {
            sink,
            mapping,
            options,
        }
    }

    /// 📜 The DDL, in the order it will be sent.
    ///
    /// keyspace → (reset: drop table, drop types newest-first) → create types → create table
    pub fn statements(&self) -> Vec<String> {
        let mapping = self.mapping;
        let mut statements = vec![mapping.create_keyspace_cql(self.options.replication_factor)];
        if self.options.reset {
            statements.push(mapping.drop_table_cql());
            // -- 🔙 a type can't be dropped while a later one still embeds it
            statements.extend(mapping.udts.iter().rev().map(|udt| mapping.drop_type_cql(udt)));
        }
        statements.extend(mapping.udts.iter().map(|udt| mapping.create_type_cql(udt)));
        statements.push(mapping.create_table_cql());
        statements
    }
}

#[async_trait]
impl<S: Sink> SchemaProvisioner for CqlProvisioner<'_, S> {
    async fn ensure_schema_ready(&mut self) -> Result<(), ProvisionError> {
        self.mapping.validate()?;
        if self.options.reset {
            info!(
                "💣 schema reset requested: {} and its types will be dropped and recreated",
                self.mapping.qualified_table()
            );
        }
        for statement in self.statements() {
            debug!("🏗️ {}", statement);
            self.sink.send(statement.clone()).await.map_err(|cause| {
                ProvisionError::StatementFailed {
                    statement,
                    cause: cause.into(),
                }
            })?;
        }
        info!(
            "✅ schema ready: {} in keyspace {}",
            self.mapping.table, self.mapping.keyspace
        );
        Ok(())
    }
}
