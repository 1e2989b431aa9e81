//! Body schema resolution for request bodies and responses.

use serde_json::{json, Map, Value};

use crate::error::CompileError;
use crate::spec::{media_type_schema, RequestBody, Response, Specification};
use crate::types::is_json_media_type;

/// What to validate a request body against.
#[derive(Debug, Clone, PartialEq)]
pub enum BodySchema {
    /// The operation declares no request body.
    Absent,
    /// The body is declared but not for the configured media type.
    Unsupported { media_type: String, required: bool },
    /// Declared for a non-JSON media type; passed through unvalidated.
    Passthrough { required: bool },
    /// JSON schema to evaluate the body against.
    Schema { schema: Value, required: bool },
}

impl BodySchema {
    /// Whether the contract demands a body.
    pub fn is_required(&self) -> bool {
        match self {
            BodySchema::Absent => false,
            BodySchema::Unsupported { required, .. }
            | BodySchema::Passthrough { required }
            | BodySchema::Schema { required, .. } => *required,
        }
    }

    /// Schema to install under `properties.body` of the request schema.
    pub fn validation_schema(&self) -> Value {
        match self {
            BodySchema::Schema { schema, .. } => schema.clone(),
            _ => json!({}),
        }
    }
}

/// Resolve the request body declaration of an operation.
///
/// A top-level `$ref` is replaced by a copy of the referenced schema, and
/// properties marked `readOnly` are dropped from that copy's `required`
/// list. The component definition itself is never modified.
///
/// # Errors
///
/// Returns `CompileError` if a reference cannot be resolved or the
/// declaration is malformed.
pub fn resolve_request_body(
    spec: &Specification,
    request_body: Option<&Value>,
    media_type: &str,
) -> Result<BodySchema, CompileError> {
    let Some(raw) = request_body else {
        return Ok(BodySchema::Absent);
    };
    let raw = spec.deref(raw)?;
    let body: RequestBody =
        serde_json::from_value(raw.clone()).map_err(|e| CompileError::InvalidDeclaration {
            path: "requestBody".to_string(),
            message: e.to_string(),
        })?;

    if body.content.is_empty() {
        return Ok(BodySchema::Passthrough {
            required: body.required,
        });
    }

    let Some(media) = media_type_schema(&body.content, media_type) else {
        return Ok(BodySchema::Unsupported {
            media_type: media_type.to_string(),
            required: body.required,
        });
    };

    match media.get("schema") {
        Some(schema) if is_json_media_type(media_type) => Ok(BodySchema::Schema {
            schema: request_view(spec, schema)?,
            required: body.required,
        }),
        _ => Ok(BodySchema::Passthrough {
            required: body.required,
        }),
    }
}

/// Copy of a body schema with read-only properties no longer required.
fn request_view(spec: &Specification, schema: &Value) -> Result<Value, CompileError> {
    let mut view = spec.deref(schema)?.clone();

    let read_only: Vec<String> = match view.get("properties").and_then(Value::as_object) {
        Some(properties) => properties
            .iter()
            .filter(|(_, prop)| {
                spec.deref(prop)
                    .map(|p| p.get("readOnly") == Some(&Value::Bool(true)))
                    .unwrap_or(false)
            })
            .map(|(name, _)| name.clone())
            .collect(),
        None => Vec::new(),
    };

    if let Some(required) = view.get_mut("required").and_then(Value::as_array_mut) {
        required.retain(|r| !r.as_str().is_some_and(|r| read_only.iter().any(|p| p == r)));
    }

    Ok(view)
}

/// Wrap a declared response schema under a `response` property.
///
/// The wrapper keeps a top-level `$ref` in the declared schema from
/// colliding with the wrapper's own keys.
pub fn response_wrapper(schema: &Value) -> Value {
    json!({
        "type": "object",
        "properties": {
            "response": schema
        }
    })
}

/// Wrapped response schemas for every status declaring the media type.
///
/// Statuses without content for the media type (or with non-JSON content)
/// are omitted and pass through unvalidated.
pub fn resolve_response_bodies(
    spec: &Specification,
    responses: &Map<String, Value>,
    media_type: &str,
) -> Result<Vec<(String, Value)>, CompileError> {
    if !is_json_media_type(media_type) {
        return Ok(Vec::new());
    }

    let mut resolved = Vec::new();
    for (status, raw) in responses {
        let raw = spec.deref(raw)?;
        let response: Response =
            serde_json::from_value(raw.clone()).map_err(|e| CompileError::InvalidDeclaration {
                path: format!("responses/{}", status),
                message: e.to_string(),
            })?;
        let schema = media_type_schema(&response.content, media_type).and_then(|m| m.get("schema"));
        if let Some(schema) = schema {
            resolved.push((status.clone(), response_wrapper(schema)));
        }
    }
    Ok(resolved)
}

/// Pick the declared status key for an actual status code.
///
/// Exact codes win over ranges (`2XX`), which win over `default`.
pub fn select_status<'a, T>(entries: &'a [(String, T)], status: u16) -> Option<&'a T> {
    let exact = status.to_string();
    let range = format!("{}XX", status / 100);
    let keys = [exact.as_str(), range.as_str(), "default"];
    let found = keys.into_iter().find_map(|key| {
        entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    });
    found
}
