//! Function calls emitted by the realtime model.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A completed `function_call` output item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// The tool name the model invoked.
    pub name: String,
    /// Identifier used to answer the call with a `function_call_output`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    /// The call arguments, in whichever form the service delivered them.
    #[serde(default)]
    pub arguments: Arguments,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            name: name.into(),
            call_id: None,
            arguments,
        }
    }

    pub fn with_call_id(mut self, call_id: impl Into<String>) -> Self {
        self.call_id = Some(call_id.into());
        self
    }
}

/// Tool-call arguments.
///
/// The realtime service sends arguments as a JSON-encoded string; replayed or
/// locally constructed calls may already hold a decoded object. Both forms
/// decode to the same [`Value`], and callers never need to tell them apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Arguments {
    Encoded(String),
    Decoded(Value),
}

impl Default for Arguments {
    fn default() -> Self {
        Self::Decoded(Value::Object(Default::default()))
    }
}

impl Arguments {
    /// Decodes the arguments into a JSON value.
    pub fn decode(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::Encoded(text) => serde_json::from_str(text),
            Self::Decoded(value) => Ok(value.clone()),
        }
    }

    /// Decodes the arguments straight into a typed argument struct.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match self {
            Self::Encoded(text) => serde_json::from_str(text),
            Self::Decoded(value) => T::deserialize(value),
        }
    }

    /// Best-effort JSON view of the payload for diagnostics: the decoded value
    /// when it parses, otherwise the raw text as a string.
    pub fn raw(&self) -> Value {
        match self {
            Self::Encoded(text) => {
                serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone()))
            }
            Self::Decoded(value) => value.clone(),
        }
    }
}

impl From<Value> for Arguments {
    fn from(value: Value) -> Self {
        Self::Decoded(value)
    }
}

impl From<String> for Arguments {
    fn from(text: String) -> Self {
        Self::Encoded(text)
    }
}
