// Dynamic values (C4 payload): a runtime-typed value carrying its own
// schema, suitable for JSON encoding.
//
// `DynamicValue`'s derived serde representation is externally tagged, which
// already produces the wire shape the wire format requires for typed payloads:
// `DynamicValue::Int(1)` -> `{"Int":1}`, `DynamicValue::String(s)` ->
// `{"String": s}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DynamicValue {
    Unit,
    Bool(bool),
    Int(i64),
    String(String),
    Record(BTreeMap<String, DynamicValue>),
}

impl DynamicValue {
    pub fn int(v: i64) -> Self {
        DynamicValue::Int(v)
    }

    pub fn string(v: impl Into<String>) -> Self {
        DynamicValue::String(v.into())
    }

    pub fn bool(v: bool) -> Self {
        DynamicValue::Bool(v)
    }

    /// The schema that exactly describes this value's shape.
    pub fn schema(&self) -> Schema {
        match self {
            DynamicValue::Unit => Schema::Unit,
            DynamicValue::Bool(_) => Schema::Bool,
            DynamicValue::Int(_) => Schema::Int,
            DynamicValue::String(_) => Schema::String,
            DynamicValue::Record(fields) => {
                Schema::Record(fields.iter().map(|(k, v)| (k.clone(), v.schema())).collect())
            }
        }
    }
}

/// Self-describing type descriptor for a `DynamicValue`. Used to interpret
/// raw parameter JSON arriving over HTTP into a typed `DynamicValue` before
/// it is bound into a flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Schema {
    Unit,
    Bool,
    Int,
    String,
    Record(BTreeMap<String, Schema>),
}

impl Schema {
    /// Decode raw JSON under this schema into a `DynamicValue`. A pure
    /// function of the schema and the JSON payload.
    pub fn decode(&self, json: &serde_json::Value) -> Result<DynamicValue> {
        match (self, json) {
            (Schema::Unit, serde_json::Value::Null) => Ok(DynamicValue::Unit),
            (Schema::Bool, serde_json::Value::Bool(b)) => Ok(DynamicValue::Bool(*b)),
            (Schema::Int, serde_json::Value::Number(n)) => n
                .as_i64()
                .map(DynamicValue::Int)
                .ok_or_else(|| Error::decode(format!("{n} is not an integer"))),
            (Schema::String, serde_json::Value::String(s)) => Ok(DynamicValue::String(s.clone())),
            (Schema::Record(fields), serde_json::Value::Object(obj)) => {
                let mut out = BTreeMap::new();
                for (name, field_schema) in fields {
                    let value = obj
                        .get(name)
                        .ok_or_else(|| Error::decode(format!("missing field {name}")))?;
                    out.insert(name.clone(), field_schema.decode(value)?);
                }
                Ok(DynamicValue::Record(out))
            }
            (schema, json) => Err(Error::decode(format!(
                "value {json} does not match schema {schema:?}"
            ))),
        }
    }

    /// Encode a value that was produced under this schema back to raw JSON,
    /// the inverse of `decode`.
    pub fn encode(value: &DynamicValue) -> serde_json::Value {
        match value {
            DynamicValue::Unit => serde_json::Value::Null,
            DynamicValue::Bool(b) => serde_json::Value::Bool(*b),
            DynamicValue::Int(i) => serde_json::Value::Number((*i).into()),
            DynamicValue::String(s) => serde_json::Value::String(s.clone()),
            DynamicValue::Record(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Schema::encode(v)))
                    .collect(),
            ),
        }
    }
}
