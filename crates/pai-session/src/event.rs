//! Realtime session events, in both directions.
//!
//! Server events are parsed leniently from raw JSON: unknown event types map
//! to [`ServerEvent::Other`], and output items that do not look like a
//! function call are kept as [`ResponseOutputItem::Other`] or skipped when
//! they are malformed. Nothing here fails on shape.

use pai_tools::{Arguments, FunctionCall, SessionConfig};
use serde::Serialize;
use serde_json::Value;

pub const SESSION_CREATED: &str = "session.created";
pub const RESPONSE_DONE: &str = "response.done";

/// An event received from the realtime service.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    SessionCreated,
    ResponseDone { output: Vec<ResponseOutputItem> },
    Other { event_type: String },
}

/// One entry of a completed response's `output` list.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutputItem {
    FunctionCall(FunctionCall),
    Other,
}

impl ServerEvent {
    /// Parses an event from its JSON text. Returns `None` for text that is
    /// not a JSON object with a string `type`.
    pub fn parse(text: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(text).ok()?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        let event_type = value.get("type")?.as_str()?;
        let event = match event_type {
            SESSION_CREATED => Self::SessionCreated,
            RESPONSE_DONE => {
                let output = value
                    .pointer("/response/output")
                    .and_then(Value::as_array)
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(ResponseOutputItem::from_value)
                            .collect()
                    })
                    .unwrap_or_default();
                Self::ResponseDone { output }
            }
            other => Self::Other {
                event_type: other.to_string(),
            },
        };
        Some(event)
    }
}

impl ResponseOutputItem {
    /// Returns `None` for a `function_call` item without a usable name.
    pub fn from_value(value: &Value) -> Option<Self> {
        if value.get("type").and_then(Value::as_str) != Some("function_call") {
            return Some(Self::Other);
        }

        let Some(name) = value.get("name").and_then(Value::as_str) else {
            tracing::debug!("skipping function_call item without a name");
            return None;
        };

        let arguments = match value.get("arguments") {
            Some(Value::String(text)) => Arguments::Encoded(text.clone()),
            Some(Value::Null) | None => Arguments::default(),
            Some(other) => Arguments::Decoded(other.clone()),
        };

        let mut call = FunctionCall::new(name, arguments);
        if let Some(call_id) = value.get("call_id").and_then(Value::as_str) {
            call = call.with_call_id(call_id);
        }
        Some(Self::FunctionCall(call))
    }
}

/// An event sent to the realtime service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "session.update")]
    SessionUpdate { session: SessionConfig },
    #[serde(rename = "response.create")]
    ResponseCreate { response: ResponseOptions },
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate { item: ConversationItem },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponseOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationItem {
    FunctionCallOutput { call_id: String, output: String },
}

impl ClientEvent {
    pub fn session_update(session: SessionConfig) -> Self {
        Self::SessionUpdate { session }
    }

    /// A `response.create`, optionally steering the next response.
    pub fn response_create(instructions: Option<String>) -> Self {
        Self::ResponseCreate {
            response: ResponseOptions { instructions },
        }
    }

    pub fn function_call_output(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self::ConversationItemCreate {
            item: ConversationItem::FunctionCallOutput {
                call_id: call_id.into(),
                output: output.into(),
            },
        }
    }

    /// The wire `type` of this event.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SessionUpdate { .. } => "session.update",
            Self::ResponseCreate { .. } => "response.create",
            Self::ConversationItemCreate { .. } => "conversation.item.create",
        }
    }
}
