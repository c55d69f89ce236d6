use serde_json::Value;

/// A `config`/`value` payload as handed out by a store.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Undecoded JSON text.
    Raw(Vec<u8>),
    Decoded(Value),
}

impl Payload {
    /// Decodes into a single JSON tree.
    ///
    /// Raw bytes that are not valid JSON become a plain string. A string
    /// holding an encoded object, array or string is unwrapped once.
    pub fn normalize(self) -> Value {
        match self {
            Payload::Raw(bytes) => match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => normalize_value(value),
                Err(_) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
            },
            Payload::Decoded(value) => normalize_value(value),
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Decoded(value)
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Payload::Raw(bytes.to_vec())
    }
}

/// Unwraps a double-encoded string payload.
pub fn normalize_value(value: Value) -> Value {
    match value {
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(inner @ (Value::Object(_) | Value::Array(_) | Value::String(_))) => inner,
            _ => Value::String(text),
        },
        other => other,
    }
}
