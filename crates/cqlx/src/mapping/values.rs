//! 🧱 CQL values and their literal spelling.
//!
//! A record goes through serde into a `serde_json::Value` tree, and [`to_cql_value`]
//! walks that tree with the column's [`CqlType`] in hand. The type decides. The JSON
//! just has to agree with it.

use std::fmt;

use anyhow::{Context, Result, bail};
use serde_json::Value;

use super::schema::{CqlType, TableMapping};

/// 📦 A typed value ready to be spelled as a CQL literal.
#[derive(Debug, Clone, PartialEq)]
pub enum CqlValue {
    Null,
    Int(i32),
    BigInt(i64),
    Double(f64),
    Boolean(bool),
    Text(String),
    List(Vec<CqlValue>),
    Set(Vec<CqlValue>),
    /// Field order follows the UDT declaration.
    Udt(Vec<(String, CqlValue)>),
}

impl fmt::Display for CqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CqlValue::Null => f.write_str("null"),
            CqlValue::Int(v) => write!(f, "{v}"),
            CqlValue::BigInt(v) => write!(f, "{v}"),
            CqlValue::Double(v) => {
                if v.is_nan() {
                    f.write_str("NaN")
                } else if v.is_infinite() {
                    f.write_str(if *v > 0.0 { "Infinity" } else { "-Infinity" })
                } else {
                    // -- 🔢 `{:?}` keeps the ".0" so the store never mistakes it for an int
                    write!(f, "{v:?}")
                }
            }
            CqlValue::Boolean(v) => write!(f, "{v}"),
            // -- 🔒 single quotes are escaped by doubling. that's the whole injection story for CQL text.
            CqlValue::Text(v) => write!(f, "'{}'", v.replace('\'', "''")),
            CqlValue::List(items) => {
                f.write_str("[")?;
                write_joined(f, items)?;
                f.write_str("]")
            }
            CqlValue::Set(items) => {
                f.write_str("{")?;
                write_joined(f, items)?;
                f.write_str("}")
            }
            CqlValue::Udt(fields) => {
                f.write_str("{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[CqlValue]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// 🔄 Convert one JSON value into a `CqlValue` of type `ty`.
///
/// `null` is accepted for every type. UDT fields are looked up in `mapping` by their
/// `field` name; a missing field becomes `null`, an unknown UDT is an error.
pub fn to_cql_value(value: &Value, ty: &CqlType, mapping: &TableMapping) -> Result<CqlValue> {
    if value.is_null() {
        return Ok(CqlValue::Null);
    }
    let converted = match ty {
        CqlType::Int => {
            let n = value
                .as_i64()
                .with_context(|| format!("💀 expected an integer for int, got {value}"))?;
            let n = i32::try_from(n)
                .with_context(|| format!("💀 {n} does not fit in a 32-bit int column"))?;
            CqlValue::Int(n)
        }
        CqlType::BigInt => CqlValue::BigInt(
            value
                .as_i64()
                .with_context(|| format!("💀 expected an integer for bigint, got {value}"))?,
        ),
        CqlType::Double => CqlValue::Double(
            value
                .as_f64()
                .with_context(|| format!("💀 expected a number for double, got {value}"))?,
        ),
        CqlType::Boolean => CqlValue::Boolean(
            value
                .as_bool()
                .with_context(|| format!("💀 expected a boolean, got {value}"))?,
        ),
        CqlType::Text => match value {
            Value::String(s) => CqlValue::Text(s.clone()),
            other => bail!("💀 expected a string for text, got {other}"),
        },
        CqlType::List(inner) => CqlValue::List(convert_items(value, inner, mapping)?),
        CqlType::Set(inner) => CqlValue::Set(convert_items(value, inner, mapping)?),
        CqlType::Frozen(inner) => to_cql_value(value, inner, mapping)?,
        CqlType::Udt(name) => {
            let udt = mapping
                .find_udt(name)
                .with_context(|| format!("💀 user-defined type '{name}' is not in the mapping"))?;
            let object = value
                .as_object()
                .with_context(|| format!("💀 expected an object for type '{name}', got {value}"))?;
            let mut fields = Vec::with_capacity(udt.fields.len());
            for field in &udt.fields {
                let raw = object.get(&field.field).unwrap_or(&Value::Null);
                let converted = to_cql_value(raw, &field.ty, mapping)
                    .with_context(|| format!("in field '{}' of type '{name}'", field.name))?;
                fields.push((field.name.clone(), converted));
            }
            CqlValue::Udt(fields)
        }
    };
    Ok(converted)
}

fn convert_items(value: &Value, inner: &CqlType, mapping: &TableMapping) -> Result<Vec<CqlValue>> {
    let items = value
        .as_array()
        .with_context(|| format!("💀 expected an array for a collection, got {value}"))?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            to_cql_value(item, inner, mapping).with_context(|| format!("at collection index {i}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::schema::{ColumnDef, UdtDef};
    use serde_json::json;

    fn mapping_with_contact() -> TableMapping {
        TableMapping::new("ks", "t")
            .column(ColumnDef::partition_key("id", CqlType::Int))
            .udt(
                UdtDef::new("contact")
                    .field(ColumnDef::new("firstname", CqlType::Text).from_field("first_name"))
                    .field(ColumnDef::new("lastname", CqlType::Text).from_field("last_name")),
            )
    }

    #[test]
    fn the_one_where_text_with_apostrophes_survives() {
        assert_eq!(CqlValue::Text("O'Brien".into()).to_string(), "'O''Brien'");
    }

    #[test]
    fn the_one_where_collections_wear_the_right_brackets() {
        let list = CqlValue::List(vec![CqlValue::Int(1), CqlValue::Int(2)]);
        let set = CqlValue::Set(vec![CqlValue::Text("a".into())]);
        assert_eq!(list.to_string(), "[1, 2]");
        assert_eq!(set.to_string(), "{'a'}");
        assert_eq!(CqlValue::List(vec![]).to_string(), "[]");
        assert_eq!(CqlValue::Double(1.0).to_string(), "1.0");
    }

    #[test]
    fn the_one_where_a_frozen_udt_list_becomes_literal_soup() -> Result<()> {
        let mapping = mapping_with_contact();
        let ty = CqlType::list(CqlType::frozen(CqlType::udt("contact")));
        let value = json!([
            {"first_name": "Monkey", "last_name": "Luffy 0"},
            {"first_name": "Nico"}
        ]);
        let converted = to_cql_value(&value, &ty, &mapping)?;
        assert_eq!(
            converted.to_string(),
            "[{firstname: 'Monkey', lastname: 'Luffy 0'}, {firstname: 'Nico', lastname: null}]"
        );
        Ok(())
    }

    #[test]
    fn the_one_where_an_int_that_is_too_big_is_told_no() {
        let mapping = mapping_with_contact();
        let err = to_cql_value(&json!(5_000_000_000i64), &CqlType::Int, &mapping)
            .expect_err("i32 overflow must be rejected");
        assert!(format!("{err:#}").contains("32-bit"));
    }

    #[test]
    fn the_one_where_the_json_disagrees_with_the_type() {
        let mapping = mapping_with_contact();
        assert!(to_cql_value(&json!(42), &CqlType::Text, &mapping).is_err());
        assert!(to_cql_value(&json!("nope"), &CqlType::list(CqlType::Text), &mapping).is_err());
        assert!(to_cql_value(&json!({}), &CqlType::udt("ghost"), &mapping).is_err());
    }
}
