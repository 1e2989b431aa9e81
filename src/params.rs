//! Parameter schema compilation.
//!
//! Turns an operation's `parameters` into one object schema per request
//! location plus the side-tables the normalizer uses to deserialize raw
//! string values before evaluation.

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::CompileError;
use crate::spec::{media_type_schema, Parameter, Specification};
use crate::types::{ParameterLocation, TYPE_JSON};

/// One parameter needing deserialization before evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterRef {
    /// Lookup name (lower-cased for headers).
    pub name: String,
    pub location: ParameterLocation,
    /// Separator for delimited arrays.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<&'static str>,
}

/// Side-tables consumed by the field normalizer, applied in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationTables {
    /// Parameters declared through `content`: the raw string is JSON.
    pub parse_json: Vec<ParameterRef>,
    /// Non-exploded arrays: the raw string is split on a delimiter.
    pub parse_array: Vec<ParameterRef>,
    /// Exploded arrays: a lone scalar is wrapped into a one-element array.
    pub parse_array_explode: Vec<ParameterRef>,
}

impl NormalizationTables {
    pub fn is_empty(&self) -> bool {
        self.parse_json.is_empty() && self.parse_array.is_empty() && self.parse_array_explode.is_empty()
    }
}

/// Location schemas for one operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSchemas {
    pub query: Value,
    pub headers: Value,
    pub params: Value,
    pub cookies: Value,
    pub tables: NormalizationTables,
}

impl Default for ParameterSchemas {
    fn default() -> Self {
        Self {
            query: location_schema(ParameterLocation::Query),
            headers: location_schema(ParameterLocation::Header),
            params: location_schema(ParameterLocation::Path),
            cookies: location_schema(ParameterLocation::Cookie),
            tables: NormalizationTables::default(),
        }
    }
}

impl ParameterSchemas {
    /// Schema for a location.
    pub fn schema(&self, location: ParameterLocation) -> &Value {
        match location {
            ParameterLocation::Query => &self.query,
            ParameterLocation::Header => &self.headers,
            ParameterLocation::Path => &self.params,
            ParameterLocation::Cookie => &self.cookies,
        }
    }

    fn schema_mut(&mut self, location: ParameterLocation) -> &mut Value {
        match location {
            ParameterLocation::Query => &mut self.query,
            ParameterLocation::Header => &mut self.headers,
            ParameterLocation::Path => &mut self.params,
            ParameterLocation::Cookie => &mut self.cookies,
        }
    }

    fn install(&mut self, location: ParameterLocation, name: &str, schema: Value, required: bool) {
        let target = self.schema_mut(location);
        target["properties"][name] = schema;
        if required {
            if let Some(list) = target["required"].as_array_mut() {
                if !list.iter().any(|r| r == name) {
                    list.push(Value::String(name.to_string()));
                }
            }
        }
    }
}

/// Empty-but-valid object schema for a location.
///
/// Headers and cookies carry transport values the contract never lists,
/// so they are left open to additional properties.
fn location_schema(location: ParameterLocation) -> Value {
    let mut schema = json!({
        "type": "object",
        "properties": {},
        "required": []
    });
    if matches!(location, ParameterLocation::Header | ParameterLocation::Cookie) {
        schema["additionalProperties"] = Value::Bool(true);
    }
    schema
}

/// Delimiter for a non-exploded array in the given style.
fn array_delimiter(style: &str) -> Option<&'static str> {
    match style {
        "form" | "simple" => Some(","),
        "spaceDelimited" => Some(" "),
        "pipeDelimited" => Some("|"),
        _ => None,
    }
}

/// Merge path-level and operation-level parameter declarations.
///
/// Operation parameters override path parameters with the same `name` and
/// `in`. Declarations are resolved through `$ref` first.
pub fn merge_parameters<'a>(
    spec: &'a Specification,
    path_level: &'a [Value],
    operation_level: &'a [Value],
) -> Result<Vec<&'a Value>, CompileError> {
    let mut merged: Vec<&Value> = Vec::new();
    for raw in path_level.iter().chain(operation_level) {
        let resolved = spec.deref(raw)?;
        let key = (resolved.get("name"), resolved.get("in"));
        match merged
            .iter()
            .position(|p| (p.get("name"), p.get("in")) == key)
        {
            Some(index) => merged[index] = resolved,
            None => merged.push(resolved),
        }
    }
    Ok(merged)
}

/// Compile parameter declarations into location schemas and side-tables.
///
/// # Errors
///
/// Returns a `CompileError` for an unknown `in`, a parameter with neither
/// (or both) `schema` and `content`, or an array with an unsupported style.
pub fn compile_parameters(
    spec: &Specification,
    parameters: &[&Value],
) -> Result<ParameterSchemas, CompileError> {
    let mut schemas = ParameterSchemas::default();

    for raw in parameters {
        let raw = spec.deref(raw)?;
        let parameter: Parameter =
            serde_json::from_value(raw.clone()).map_err(|e| CompileError::InvalidDeclaration {
                path: format!(
                    "parameter {}",
                    raw.get("name").and_then(Value::as_str).unwrap_or("<unnamed>")
                ),
                message: e.to_string(),
            })?;

        let location = ParameterLocation::parse(&parameter.location).ok_or_else(|| {
            CompileError::UnknownLocation {
                name: parameter.name.clone(),
                location: parameter.location.clone(),
            }
        })?;
        let name = match location {
            ParameterLocation::Header => parameter.name.to_lowercase(),
            _ => parameter.name.clone(),
        };

        let schema = match (&parameter.schema, &parameter.content) {
            (Some(_), Some(_)) => {
                return Err(CompileError::AmbiguousParameterSchema {
                    name: parameter.name.clone(),
                })
            }
            (Some(schema), None) => schema.clone(),
            (None, Some(content)) => {
                let schema = media_type_schema(content, TYPE_JSON)
                    .and_then(|media| media.get("schema"))
                    .ok_or_else(|| CompileError::MissingParameterSchema {
                        name: parameter.name.clone(),
                    })?;
                schemas.tables.parse_json.push(ParameterRef {
                    name: name.clone(),
                    location,
                    delimiter: None,
                });
                schema.clone()
            }
            (None, None) => {
                return Err(CompileError::MissingParameterSchema {
                    name: parameter.name.clone(),
                })
            }
        };

        if parameter.schema.is_some() && is_array_schema(spec, &schema)? {
            if parameter.explode.unwrap_or(false) {
                schemas.tables.parse_array_explode.push(ParameterRef {
                    name: name.clone(),
                    location,
                    delimiter: None,
                });
            } else {
                let style = parameter
                    .style
                    .as_deref()
                    .unwrap_or_else(|| location.default_style());
                let delimiter =
                    array_delimiter(style).ok_or_else(|| CompileError::UnsupportedStyle {
                        name: parameter.name.clone(),
                        style: style.to_string(),
                    })?;
                schemas.tables.parse_array.push(ParameterRef {
                    name: name.clone(),
                    location,
                    delimiter: Some(delimiter),
                });
            }
        }

        schemas.install(location, &name, schema, parameter.required);
    }

    Ok(schemas)
}

fn is_array_schema(spec: &Specification, schema: &Value) -> Result<bool, CompileError> {
    let schema = spec.deref(schema)?;
    Ok(schema.get("type").and_then(Value::as_str) == Some("array"))
}
