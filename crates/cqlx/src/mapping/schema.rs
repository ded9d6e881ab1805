//! 🗺️ The schema description — what a table looks like, said out loud, in a value.
//!
//! No annotations. No reflection. No process-wide registry quietly binding types to
//! tables while you sleep. You build a [`TableMapping`], you pass it around, and it
//! tells everyone the truth about columns, key roles and user-defined types.

use std::fmt;

use crate::errors::ProvisionError;

/// 🧬 The CQL type of a column or UDT field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CqlType {
    Int,
    BigInt,
    Double,
    Boolean,
    Text,
    List(Box<CqlType>),
    Set(Box<CqlType>),
    /// 🧊 Stored as one opaque, immutable blob inside the row. Not individually addressable.
    Frozen(Box<CqlType>),
    /// A user-defined type, by name. Must be declared on the mapping.
    Udt(String),
}

impl CqlType {
    pub fn list(inner: CqlType) -> Self {
        CqlType::List(Box::new(inner))
    }

    pub fn set(inner: CqlType) -> Self {
        CqlType::Set(Box::new(inner))
    }

    pub fn frozen(inner: CqlType) -> Self {
        CqlType::Frozen(Box::new(inner))
    }

    pub fn udt(name: impl Into<String>) -> Self {
        CqlType::Udt(name.into())
    }

    /// 🔎 Every UDT name this type mentions, outermost first.
    fn referenced_udts<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            CqlType::Udt(name) => out.push(name),
            CqlType::List(inner) | CqlType::Set(inner) | CqlType::Frozen(inner) => {
                inner.referenced_udts(out)
            }
            _ => {}
        }
    }

    /// 🧊 A UDT sitting inside a collection without `frozen<..>` around it. The store says no.
    fn has_unfrozen_nested_udt(&self) -> bool {
        match self {
            CqlType::List(inner) | CqlType::Set(inner) => match inner.as_ref() {
                CqlType::Udt(_) => true,
                CqlType::Frozen(_) => false,
                other => other.has_unfrozen_nested_udt(),
            },
            _ => false,
        }
    }
}

impl fmt::Display for CqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CqlType::Int => f.write_str("int"),
            CqlType::BigInt => f.write_str("bigint"),
            CqlType::Double => f.write_str("double"),
            CqlType::Boolean => f.write_str("boolean"),
            CqlType::Text => f.write_str("text"),
            CqlType::List(inner) => write!(f, "list<{inner}>"),
            CqlType::Set(inner) => write!(f, "set<{inner}>"),
            CqlType::Frozen(inner) => write!(f, "frozen<{inner}>"),
            CqlType::Udt(name) => f.write_str(name),
        }
    }
}

/// 🔑 What a column does for the primary key, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    /// Decides which node owns the row.
    Partition,
    /// Orders rows inside a partition.
    Clustering,
    Regular,
}

/// 📋 One column (or one UDT field).
///
/// `field` is the name the record serializes under; `name` is what the store calls it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub field: String,
    pub ty: CqlType,
    pub role: KeyRole,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, ty: CqlType) -> Self {
        let name = name.into();
        Self {
            field: name.clone(),
            name,
            ty,
            role: KeyRole::Regular,
        }
    }

    pub fn partition_key(name: impl Into<String>, ty: CqlType) -> Self {
        Self::new(name, ty).with_role(KeyRole::Partition)
    }

    pub fn clustering_key(name: impl Into<String>, ty: CqlType) -> Self {
        Self::new(name, ty).with_role(KeyRole::Clustering)
    }

    /// 🏷️ Read the value from a differently named record field.
    pub fn from_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn with_role(mut self, role: KeyRole) -> Self {
        self.role = role;
        self
    }

    pub fn is_key(&self) -> bool {
        self.role != KeyRole::Regular
    }
}

/// 🧩 A user-defined type: a named bag of typed fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdtDef {
    pub name: String,
    pub fields: Vec<ColumnDef>,
}

impl UdtDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: ColumnDef) -> Self {
        self.fields.push(field);
        self
    }
}

/// 🗺️ The whole picture: keyspace, table, columns, and the UDTs they lean on.
///
/// UDTs are kept in declaration order. That order is also creation order, so a UDT
/// that embeds another one must be declared after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMapping {
    pub keyspace: String,
    pub table: String,
    pub columns: Vec<ColumnDef>,
    pub udts: Vec<UdtDef>,
}

impl TableMapping {
    pub fn new(keyspace: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            table: table.into(),
            columns: Vec::new(),
            udts: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn udt(mut self, udt: UdtDef) -> Self {
        self.udts.push(udt);
        self
    }

    /// `keyspace.table`, the way every statement wants it.
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.keyspace, self.table)
    }

    pub fn find_udt(&self, name: &str) -> Option<&UdtDef> {
        self.udts.iter().find(|udt| udt.name == name)
    }

    pub fn partition_keys(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns
            .iter()
            .filter(|c| c.role == KeyRole::Partition)
    }

    pub fn clustering_keys(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns
            .iter()
            .filter(|c| c.role == KeyRole::Clustering)
    }

    /// ✅ Catch the mistakes the store would catch anyway, but before we've sent anything.
    ///
    /// - at least one partition key
    /// - no duplicate column names
    /// - every referenced UDT is declared, and declared before whoever uses it
    /// - a UDT inside a list or set is wrapped in `frozen<..>`
    /// - key columns are never collections
    pub fn validate(&self) -> Result<(), ProvisionError> {
        let invalid = |msg: String| Err(ProvisionError::InvalidMapping(msg));

        if self.columns.is_empty() {
            return invalid(format!("table '{}' has no columns", self.qualified_table()));
        }
        if self.partition_keys().next().is_none() {
            return invalid(format!(
                "table '{}' has no partition key. Every row needs a home.",
                self.qualified_table()
            ));
        }

        let mut seen = Vec::new();
        for column in &self.columns {
            if seen.contains(&column.name.as_str()) {
                return invalid(format!("column '{}' is declared twice", column.name));
            }
            seen.push(column.name.as_str());

            if column.is_key()
                && matches!(
                    column.ty,
                    CqlType::List(_) | CqlType::Set(_) | CqlType::Udt(_)
                )
            {
                return invalid(format!(
                    "key column '{}' has type {} which cannot be a key",
                    column.name, column.ty
                ));
            }
        }

        // -- 🧩 UDTs may only reference UDTs declared before them
        for (position, udt) in self.udts.iter().enumerate() {
            for field in &udt.fields {
                self.check_column_type(&field.name, &field.ty, &self.udts[..position])?;
            }
        }
        for column in &self.columns {
            self.check_column_type(&column.name, &column.ty, &self.udts)?;
        }
        Ok(())
    }

    fn check_column_type(
        &self,
        name: &str,
        ty: &CqlType,
        visible: &[UdtDef],
    ) -> Result<(), ProvisionError> {
        if ty.has_unfrozen_nested_udt() {
            return Err(ProvisionError::InvalidMapping(format!(
                "'{name}' nests a user-defined type inside a collection without frozen<..>: {ty}"
            )));
        }
        let mut referenced = Vec::new();
        ty.referenced_udts(&mut referenced);
        for udt_name in referenced {
            if !visible.iter().any(|udt| udt.name == udt_name) {
                return Err(ProvisionError::InvalidMapping(format!(
                    "'{name}' references user-defined type '{udt_name}' which is not declared (or is declared after its first use)"
                )));
            }
        }
        Ok(())
    }

    // ===== DDL =====

    pub fn create_keyspace_cql(&self, replication_factor: u32) -> String {
        format!(
            "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = {{'class': 'SimpleStrategy', 'replication_factor': {}}};",
            self.keyspace, replication_factor
        )
    }

    pub fn create_type_cql(&self, udt: &UdtDef) -> String {
        let fields = udt
            .fields
            .iter()
            .map(|f| format!("{} {}", f.name, f.ty))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "CREATE TYPE IF NOT EXISTS {}.{} ({});",
            self.keyspace, udt.name, fields
        )
    }

    pub fn create_table_cql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.ty))
            .collect::<Vec<_>>()
            .join(", ");
        let partition = self
            .partition_keys()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let mut primary_key = format!("({partition})");
        for clustering in self.clustering_keys() {
            primary_key.push_str(", ");
            primary_key.push_str(&clustering.name);
        }
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({}, PRIMARY KEY ({}));",
            self.qualified_table(),
            columns,
            primary_key
        )
    }

    pub fn drop_table_cql(&self) -> String {
        format!("DROP TABLE IF EXISTS {};", self.qualified_table())
    }

    pub fn drop_type_cql(&self, udt: &UdtDef) -> String {
        format!("DROP TYPE IF EXISTS {}.{};", self.keyspace, udt.name)
    }

    // ===== read-back =====

    /// 🧮 A full-table count. Fine for a demo keyspace, a scan on a real one.
    pub fn count_cql(&self) -> String {
        format!("SELECT COUNT(*) FROM {};", self.qualified_table())
    }

    pub fn sample_cql(&self, limit: usize) -> String {
        format!("SELECT * FROM {} LIMIT {};", self.qualified_table(), limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> UdtDef {
        UdtDef::new("contact")
            .field(ColumnDef::new("firstname", CqlType::Text))
            .field(ColumnDef::new("lastname", CqlType::Text))
    }

    fn accounts() -> TableMapping {
        TableMapping::new("account_test", "accounts")
            .column(ColumnDef::partition_key("id", CqlType::Int))
            .column(ColumnDef::new("name", CqlType::Text))
            .column(ColumnDef::new("tags", CqlType::list(CqlType::Text)))
            .column(ColumnDef::new(
                "contacts",
                CqlType::list(CqlType::frozen(CqlType::udt("contact"))),
            ))
            .udt(contact())
    }

    #[test]
    fn the_one_where_types_spell_themselves_in_cql() {
        assert_eq!(
            CqlType::list(CqlType::frozen(CqlType::udt("contact"))).to_string(),
            "list<frozen<contact>>"
        );
        assert_eq!(CqlType::set(CqlType::BigInt).to_string(), "set<bigint>");
    }

    #[test]
    fn the_one_where_the_accounts_ddl_looks_like_a_dba_wrote_it() {
        let mapping = accounts();
        assert!(mapping.validate().is_ok());
        assert_eq!(
            mapping.create_table_cql(),
            "CREATE TABLE IF NOT EXISTS account_test.accounts (id int, name text, tags list<text>, contacts list<frozen<contact>>, PRIMARY KEY ((id)));"
        );
        assert_eq!(
            mapping.create_type_cql(&contact()),
            "CREATE TYPE IF NOT EXISTS account_test.contact (firstname text, lastname text);"
        );
        assert_eq!(
            mapping.create_keyspace_cql(3),
            "CREATE KEYSPACE IF NOT EXISTS account_test WITH replication = {'class': 'SimpleStrategy', 'replication_factor': 3};"
        );
        assert_eq!(
            mapping.drop_table_cql(),
            "DROP TABLE IF EXISTS account_test.accounts;"
        );
        assert_eq!(mapping.count_cql(), "SELECT COUNT(*) FROM account_test.accounts;");
        assert_eq!(
            mapping.sample_cql(10),
            "SELECT * FROM account_test.accounts LIMIT 10;"
        );
    }

    #[test]
    fn the_one_where_clustering_keys_join_the_primary_key_party() {
        let mapping = TableMapping::new("ks", "events")
            .column(ColumnDef::partition_key("tenant", CqlType::Text))
            .column(ColumnDef::partition_key("day", CqlType::Int))
            .column(ColumnDef::clustering_key("seq", CqlType::BigInt))
            .column(ColumnDef::new("body", CqlType::Text));
        assert!(mapping.validate().is_ok());
        assert!(
            mapping
                .create_table_cql()
                .ends_with("PRIMARY KEY ((tenant, day), seq));")
        );
    }

    #[test]
    fn the_one_where_a_naked_udt_in_a_list_gets_sent_back_to_get_dressed() {
        let mapping = TableMapping::new("ks", "t")
            .column(ColumnDef::partition_key("id", CqlType::Int))
            .column(ColumnDef::new("contacts", CqlType::list(CqlType::udt("contact"))))
            .udt(contact());
        let err = mapping.validate().expect_err("unfrozen nested udt must be rejected");
        assert!(err.to_string().contains("frozen"));
    }

    #[test]
    fn the_one_where_a_table_without_a_partition_key_is_homeless() {
        let mapping = TableMapping::new("ks", "t").column(ColumnDef::new("name", CqlType::Text));
        assert!(matches!(
            mapping.validate(),
            Err(ProvisionError::InvalidMapping(_))
        ));
    }

    #[test]
    fn the_one_where_udts_must_be_declared_before_they_are_used() {
        let mapping = TableMapping::new("ks", "t")
            .column(ColumnDef::partition_key("id", CqlType::Int))
            .column(ColumnDef::new("owner", CqlType::frozen(CqlType::udt("person"))))
            .udt(
                UdtDef::new("person")
                    .field(ColumnDef::new("home", CqlType::frozen(CqlType::udt("address")))),
            )
            .udt(UdtDef::new("address").field(ColumnDef::new("street", CqlType::Text)));
        let err = mapping.validate().expect_err("forward udt reference must be rejected");
        assert!(err.to_string().contains("address"));
    }

    #[test]
    fn the_one_where_a_list_cannot_be_a_partition_key() {
        let mapping = TableMapping::new("ks", "t")
            .column(ColumnDef::partition_key("ids", CqlType::list(CqlType::Int)));
        assert!(mapping.validate().is_err());
    }
}
