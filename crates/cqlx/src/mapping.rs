//! 🗺️ Mapping — records in, rows out.
//!
//! 🎬 *[a struct arrives at the border. it speaks serde. the store speaks CQL.]*
//! *[the mapping checks its papers, column by column, and stamps an InsertRequest.]*
//!
//! 🧠 Knowledge graph:
//! - `schema`: the description value (`TableMapping`, `ColumnDef`, `UdtDef`, `CqlType`)
//! - `values`: `CqlValue` + the type-directed JSON → CQL conversion
//! - this file: `InsertRequest` and `TableMapping::insert`, the generic serializer
//!
//! There is no global registry. Two mappings for two keyspaces in one process? Fine.
//! Ten mappings in ten tests? Also fine. The mapping is a value. Pass it around. 🦆

pub mod schema;
pub mod values;

use anyhow::{Context, Result, bail};
use serde::Serialize;

pub use schema::{ColumnDef, CqlType, KeyRole, TableMapping, UdtDef};
pub use values::CqlValue;

/// 📮 One row's worth of insert, still structured.
///
/// Rendering to CQL text is deferred to [`InsertRequest::to_cql`] so sinks and tests can
/// poke at the values first.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertRequest {
    pub keyspace: String,
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<CqlValue>,
}

impl InsertRequest {
    /// 🔎 The value bound to `column`, if that column is part of this insert.
    pub fn value_of(&self, column: &str) -> Option<&CqlValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    /// ✍️ `INSERT INTO ks.table (a, b) VALUES (1, 'x');`
    pub fn to_cql(&self) -> String {
        let values = self
            .values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {}.{} ({}) VALUES ({});",
            self.keyspace,
            self.table,
            self.columns.join(", "),
            values
        )
    }
}

impl TableMapping {
    /// 🔄 Serialize `record` through serde, then walk the columns and convert each value.
    ///
    /// Key columns must be present and non-null. Regular columns that the record does
    /// not carry are written as `null`.
    pub fn insert<R: Serialize>(&self, record: &R) -> Result<InsertRequest> {
        let tree = serde_json::to_value(record)
            .context("💀 the record refused to serialize. serde has spoken.")?;
        let Some(object) = tree.as_object() else {
            bail!(
                "💀 records must serialize to an object with named fields, got {}",
                tree
            );
        };

        let mut columns = Vec::with_capacity(self.columns.len());
        let mut values = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let raw = object.get(&column.field).unwrap_or(&serde_json::Value::Null);
            let value = values::to_cql_value(raw, &column.ty, self)
                .with_context(|| format!("in column '{}'", column.name))?;
            if column.is_key() && value == CqlValue::Null {
                bail!(
                    "💀 key column '{}' (field '{}') is missing or null. A row without a key is a row without a home.",
                    column.name,
                    column.field
                );
            }
            columns.push(column.name.clone());
            values.push(value);
        }

        Ok(InsertRequest {
            keyspace: self.keyspace.clone(),
            table: self.table.clone(),
            columns,
            values,
        })
    }
}
