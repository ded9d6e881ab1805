//! 📦 The record model — accounts, and the contacts they carry around.
//!
//! ---
//!
//! 🎬 COLD OPEN — INT. KEYSPACE `account_test` — 3:47 AM
//!
//! Ten thousand accounts stand in a line. Each one holds exactly two contacts, a
//! couple of tags, and a name that sounds suspiciously like an anime. None of them
//! know they are about to be frozen into a user-defined type. Relatable.
//!
//! 🦆
//!
//! ---
//!
//! An [`Account`] owns its [`Contact`]s. A contact is never addressed on its own: it
//! is written as a frozen value inside its account's row and that's the end of it.

use serde::Serialize;

use crate::errors::InvalidArgument;
use crate::mapping::{ColumnDef, CqlType, TableMapping, UdtDef};

/// 🔢 Ids are `int` columns: `0..=i32::MAX`, so this many accounts and not one more.
pub const MAX_GENERATED_ACCOUNTS: u64 = i32::MAX as u64 + 1;

/// 🏦 The root record. `id` is the partition key.
///
/// Uniqueness of `id` within a run is on the caller. The pipeline does not check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: i32,
    pub name: String,
    /// Semantically a set, but order is kept.
    pub tags: Vec<String>,
    pub contacts: Vec<Contact>,
}

/// 👤 A nested record. Lives and dies inside its account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    pub first_name: String,
    pub last_name: String,
}

/// 🗺️ The mapping for [`Account`] rows: table + the `contact` UDT it embeds.
///
/// ```text
/// CREATE TYPE  <ks>.contact (firstname text, lastname text);
/// CREATE TABLE <ks>.<table> (id int, name text, tags list<text>,
///                            contacts list<frozen<contact>>, PRIMARY KEY ((id)));
/// ```
pub fn account_mapping(keyspace: &str, table: &str) -> TableMapping {
    let contact = UdtDef::new("contact")
        .field(ColumnDef::new("firstname", CqlType::Text).from_field("first_name"))
        .field(ColumnDef::new("lastname", CqlType::Text).from_field("last_name"));

    TableMapping::new(keyspace, table)
        .column(ColumnDef::partition_key("id", CqlType::Int))
        .column(ColumnDef::new("name", CqlType::Text))
        .column(ColumnDef::new("tags", CqlType::list(CqlType::Text)))
        .column(ColumnDef::new(
            "contacts",
            // -- 🧊 nested objects must be frozen. the store will not negotiate on this.
            CqlType::list(CqlType::frozen(CqlType::udt("contact"))),
        ))
        .udt(contact)
}

/// 🏭 The demo workload: `count` accounts with ids `0..count`, generated lazily.
///
/// Every account gets the same two tags and two contacts, suffixed with its id so
/// rows are distinguishable when you finally `SELECT` them.
///
/// More than [`MAX_GENERATED_ACCOUNTS`] is `InvalidArgument::TooManyRecords`: past that,
/// ids would stop being unique and rows would quietly overwrite each other.
pub fn generate_accounts(
    count: u64,
) -> Result<impl Iterator<Item = Account>, InvalidArgument> {
    if count > MAX_GENERATED_ACCOUNTS {
        return Err(InvalidArgument::TooManyRecords {
            requested: count,
            max: MAX_GENERATED_ACCOUNTS,
        });
    }
    // -- 🔢 every id below the bound fits in an i32, so map_while never cuts anything short
    Ok((0..count).map_while(|i| i32::try_from(i).ok()).map(|id| Account {
        id,
        name: format!("One Piece {id}"),
        tags: vec!["Shonen".to_string(), "Adventure".to_string()],
        contacts: vec![
            Contact {
                first_name: "Monkey".to_string(),
                last_name: format!("Luffy {id}"),
            },
            Contact {
                first_name: "Nico".to_string(),
                last_name: format!("Robin {id}"),
            },
        ],
    }))
}
