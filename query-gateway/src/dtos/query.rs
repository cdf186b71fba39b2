use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

/// Body of a signed query request.
///
/// Only a JSON object is accepted. Unknown fields are ignored. A missing or
/// `null` `contents` becomes empty and is rejected by validation, same as an
/// explicit `""`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(try_from = "Map<String, Value>")]
pub struct IncomingQuery {
    #[validate(length(min = 1))]
    pub contents: String,

    /// Accepted for forward compatibility; generation currently ignores it.
    pub parameters: Option<Map<String, Value>>,
}

impl TryFrom<Map<String, Value>> for IncomingQuery {
    type Error = String;

    fn try_from(mut body: Map<String, Value>) -> Result<Self, Self::Error> {
        let contents = match body.remove("contents") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s,
            Some(other) => return Err(format!("contents must be a string, got {}", other)),
        };

        let parameters = match body.remove("parameters") {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(map),
            Some(other) => return Err(format!("parameters must be an object, got {}", other)),
        };

        Ok(Self {
            contents,
            parameters,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryResponse {
    pub response: String,
}
