//! Parsed view of a completed action's JSON response.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;

use serde_json::{Map, Value};

use crate::action::Action;
use crate::util;

/// A logical error reported by the API inside an otherwise successful HTTP
/// response.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct ApiError {
    pub code: String,
    pub info: String,
}

impl StdError for ApiError {}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!(
            "API returned error code \"{}\", more info: \"{}\"",
            self.code, self.info
        ))
    }
}

#[derive(Debug)]
pub enum ResponseError {
    Json(serde_json::Error),
    NotAnObject,
    Api(ApiError),
}

impl StdError for ResponseError {}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(e) => e.fmt(f),
            Self::NotAnObject => f.write_str("response body is not a JSON object"),
            Self::Api(e) => e.fmt(f),
        }
    }
}

impl From<serde_json::Error> for ResponseError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<ApiError> for ResponseError {
    fn from(e: ApiError) -> Self {
        Self::Api(e)
    }
}

/// Content/metadata split of one parsed response.
///
/// Content holds the action's result keys (`query`, `parse`, ...); metadata
/// holds everything else (`continue`, `warnings`, `batchcomplete`, ...).
/// Read-only after construction.
#[derive(Clone, Debug)]
pub struct ResponseEnvelope {
    content: Map<String, Value>,
    metadata: Map<String, Value>,
}

impl ResponseEnvelope {
    /// Parses `raw` as JSON and partitions the top-level fields per
    /// `action`'s content keys. A top-level `error` object fails the parse
    /// with [`ResponseError::Api`] instead of producing an envelope.
    pub fn parse(action: Action, raw: &str) -> Result<Self, ResponseError> {
        let parsed: Value = serde_json::from_str(raw)?;
        let fields = match parsed {
            Value::Object(fields) => fields,
            _ => return Err(ResponseError::NotAnObject),
        };
        if let Some(errobj) = fields.get("error") {
            let code = errobj
                .get("code")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            let info = errobj
                .get("info")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Err(ResponseError::Api(ApiError { code, info }));
        }
        let mut content = Map::new();
        let mut metadata = Map::new();
        for (key, value) in fields {
            if action.content_keys().contains(&key.as_str()) {
                content.insert(key, value);
            } else {
                metadata.insert(key, value);
            }
        }
        Ok(ResponseEnvelope { content, metadata })
    }

    pub fn content(&self) -> &Map<String, Value> {
        &self.content
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn into_content(self) -> Map<String, Value> {
        self.content
    }

    pub fn warnings(&self) -> Option<&Value> {
        self.metadata.get("warnings")
    }

    /// The `continue` block as request parameters, if the API returned one.
    /// Non-string values (revision ids and the like) are stringified.
    pub fn continue_params(&self) -> Option<HashMap<String, String>> {
        let block = self.metadata.get("continue")?.as_object()?;
        let mut params = HashMap::new();
        for (key, value) in block {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            params.insert(key.clone(), value);
        }
        Some(params)
    }

    /// Folds a continuation page into this envelope: content arrays
    /// concatenate, nested objects merge, and the metadata is replaced by
    /// the newer page's, so the fold tracks the latest `continue` block.
    pub(crate) fn absorb(&mut self, next: ResponseEnvelope) {
        for (key, value) in next.content {
            match self.content.get_mut(&key) {
                Some(existing) => util::merge_values(existing, value),
                None => {
                    self.content.insert(key, value);
                }
            }
        }
        self.metadata = next.metadata;
    }
}
