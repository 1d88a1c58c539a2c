// ABOUTME: Normalizes a caller's JSON Schema into a form both providers accept for structured output.
// ABOUTME: Wraps array-rooted schemas in an object envelope and records the wrapper key for unwrapping.

use serde::Serialize;
use serde_json::{Value, json};

/// Property name used when an array-rooted schema is wrapped.
pub const WRAPPER_KEY: &str = "items";

/// Keys models have been seen to rename the wrapper to. Consulted only when
/// the recorded wrapper key is missing from a payload.
pub const WRAPPER_ALIASES: [&str; 2] = ["classifications", "results"];

pub const DEFAULT_SCHEMA_NAME: &str = "structured_response";
pub const DEFAULT_TOOL_DESCRIPTION: &str =
    "Provide a structured response matching the specified schema";

/// A response schema ready to embed in a provider request, plus the metadata
/// needed to undo any wrapping on the way back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredOutput {
    /// Identifier-safe name derived from the schema title.
    pub name: String,
    /// The original schema's `description`, if it had one.
    pub description: Option<String>,
    /// The schema as sent to the provider (object-rooted).
    pub schema: Value,
    /// Set when the original schema was array-rooted and got wrapped.
    pub wrapper_key: Option<String>,
}

impl StructuredOutput {
    /// Build from an already-parsed schema. Array roots are wrapped; anything
    /// else passes through unchanged.
    pub fn from_schema(original: Value) -> Self {
        let name = schema_name(&original);
        let description = original
            .get("description")
            .and_then(|d| d.as_str())
            .map(String::from);

        let is_array = original.get("type").and_then(|t| t.as_str()) == Some("array");
        let (schema, wrapper_key) = if is_array {
            (
                json!({
                    "type": "object",
                    "properties": { WRAPPER_KEY: original },
                    "required": [WRAPPER_KEY],
                    "additionalProperties": false
                }),
                Some(WRAPPER_KEY.to_string()),
            )
        } else {
            (original, None)
        };

        Self {
            name,
            description,
            schema,
            wrapper_key,
        }
    }

    pub fn is_wrapped(&self) -> bool {
        self.wrapper_key.is_some()
    }

    pub fn tool_description(&self) -> &str {
        self.description.as_deref().unwrap_or(DEFAULT_TOOL_DESCRIPTION)
    }

    /// Undo wrapping on a structured payload returned by a provider.
    ///
    /// Returns the payload unchanged when no wrapping was applied, when the
    /// payload is already an array, or when no wrapper key can be found.
    pub fn unwrap_payload(&self, payload: Value) -> Value {
        let Some(key) = self.wrapper_key.as_deref() else {
            return payload;
        };

        let mut map = match payload {
            Value::Object(map) => map,
            other => return other,
        };

        if let Some(inner) = map.remove(key) {
            return inner;
        }

        for alias in WRAPPER_ALIASES {
            if map.get(alias).is_some_and(Value::is_array) {
                tracing::debug!(alias, "unwrapping structured payload via alias key");
                if let Some(inner) = map.remove(alias) {
                    return inner;
                }
            }
        }

        Value::Object(map)
    }
}

/// Parse an optional schema string into a `StructuredOutput`.
///
/// A missing or blank string means free-text mode. A string that is not a
/// JSON object is logged and ignored; the call then proceeds in free-text mode.
pub fn normalize_schema(raw: Option<&str>) -> Option<StructuredOutput> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;

    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => {
            let structured = StructuredOutput::from_schema(value);
            tracing::debug!(
                name = %structured.name,
                wrapped = structured.is_wrapped(),
                "normalized response schema"
            );
            Some(structured)
        }
        Ok(_) => {
            tracing::warn!("response schema is not a JSON object; structured output disabled");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "response schema is not valid JSON; structured output disabled");
            None
        }
    }
}

/// Lower-cased title with each run of non-alphanumeric characters collapsed to
/// `_` and edge underscores trimmed. Falls back to `structured_response`.
pub fn schema_name(schema: &Value) -> String {
    let Some(title) = schema.get("title").and_then(|t| t.as_str()) else {
        return DEFAULT_SCHEMA_NAME.to_string();
    };

    let mut name = String::with_capacity(title.len());
    let mut in_gap = false;
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            name.push(c);
            in_gap = false;
        } else if !in_gap {
            name.push('_');
            in_gap = true;
        }
    }

    let trimmed = name.trim_matches('_');
    if trimmed.is_empty() {
        DEFAULT_SCHEMA_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}
