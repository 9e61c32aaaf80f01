//! Operation parameters.
//!
//! Parameters are kept as a JSON object so typed request structs and ad-hoc
//! `json!` literals share one representation. The HTTP transport flattens
//! them into the REST form the requester endpoint expects:
//!
//! - `{"Reward": {"Amount": "0.01"}}` becomes `Reward.1.Amount=0.01`
//! - `{"WorkerId": ["A", "B"]}` becomes `WorkerId.1=A`, `WorkerId.2=B`
//! - nulls are dropped

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Map<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build parameters from any serializable request struct.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self> {
        match serde_json::to_value(value)
            .map_err(|e| Error::Other(format!("cannot encode parameters: {e}")))?
        {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::new()),
            other => Err(Error::Other(format!(
                "parameters must be an object, got {other}"
            ))),
        }
    }

    /// Set a parameter, replacing any previous value.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Merge another parameter set into this one; `other` wins on conflict.
    pub fn merge(mut self, other: Params) -> Self {
        self.0.extend(other.0);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Scalar parameter as text (numbers and booleans are rendered).
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(scalar_text)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flatten to `(name, value)` pairs in the REST form.
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for (key, value) in &self.0 {
            flatten_into(key, value, &mut out);
        }
        out
    }
}

impl From<Value> for Params {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::new(),
        }
    }
}

impl From<Params> for Value {
    fn from(params: Params) -> Self {
        Value::Object(params.0)
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn flatten_into(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Object(fields) => {
            for (field, inner) in fields {
                flatten_into(&format!("{prefix}.1.{field}"), inner, out);
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                let indexed = format!("{prefix}.{}", i + 1);
                match item {
                    Value::Object(fields) => {
                        for (field, inner) in fields {
                            flatten_into(&format!("{indexed}.{field}"), inner, out);
                        }
                    }
                    other => flatten_into(&indexed, other, out),
                }
            }
        }
        scalar => {
            if let Some(text) = scalar_text(scalar) {
                out.push((prefix.to_string(), text));
            }
        }
    }
}
