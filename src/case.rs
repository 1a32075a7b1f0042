//! Key case conversion at the HTTP boundary: request body keys camelCase -> snake_case
//! (record field names), response payload keys snake_case -> camelCase.

use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Case {
    /// `hire_date` -> `hireDate`
    Camel,
    /// `hireDate` -> `hire_date`
    Snake,
}

impl Case {
    pub fn convert(self, name: &str) -> String {
        let mut out = String::with_capacity(name.len() + 4);
        let mut upper_next = false;
        for (i, c) in name.char_indices() {
            match self {
                Case::Camel if c == '_' => upper_next = true,
                Case::Camel if upper_next => {
                    out.extend(c.to_uppercase());
                    upper_next = false;
                }
                Case::Snake if c.is_uppercase() => {
                    if i > 0 {
                        out.push('_');
                    }
                    out.extend(c.to_lowercase());
                }
                _ => out.push(c),
            }
        }
        out
    }
}

/// Two source keys that land on the same converted key.
#[derive(Debug, PartialEq, Eq)]
pub struct KeyCollision {
    pub first: String,
    pub second: String,
    pub converted: String,
}

/// Convert every key of `obj`. Fails instead of letting one value overwrite another.
pub fn rename_keys(obj: Map<String, Value>, case: Case) -> Result<Map<String, Value>, KeyCollision> {
    let mut out = Map::with_capacity(obj.len());
    let mut origin: HashMap<String, String> = HashMap::new();
    for (key, value) in obj {
        let converted = case.convert(&key);
        if let Some(first) = origin.get(&converted) {
            return Err(KeyCollision {
                first: first.clone(),
                second: key,
                converted,
            });
        }
        origin.insert(converted.clone(), key);
        out.insert(converted, value);
    }
    Ok(out)
}

/// Recursively camelCase object keys. An object whose keys would collide keeps its keys.
pub fn camel_case_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let map = match rename_keys(map.clone(), Case::Camel) {
                Ok(renamed) => renamed,
                Err(collision) => {
                    tracing::warn!(key = %collision.converted, "payload keys collide, left unconverted");
                    map
                }
            };
            Value::Object(map.into_iter().map(|(k, v)| (k, camel_case_keys(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(camel_case_keys).collect()),
        other => other,
    }
}
