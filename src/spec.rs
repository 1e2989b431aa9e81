//! The dereferenced OpenAPI document, borrowed read-only by the engine.
//!
//! Declarations are kept as raw JSON and deserialized into the typed
//! structs below only when an operation is compiled, so a malformed
//! operation surfaces as a [`CompileError`] for that operation alone.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{CompileError, SpecError};
use crate::loader::navigate_fragment;
use crate::types::HTTP_METHODS;

/// Maximum number of `$ref` hops followed before a chain is treated as cyclic.
const MAX_REF_HOPS: usize = 32;

/// An immutable, pointer-addressable OpenAPI document.
#[derive(Debug, Clone)]
pub struct Specification {
    document: Value,
}

impl Specification {
    /// Wrap a parsed document.
    ///
    /// # Errors
    ///
    /// Returns `SpecError::InvalidSpec` if the root is not an object or
    /// `paths` is missing or not an object.
    pub fn from_value(document: Value) -> Result<Self, SpecError> {
        let Some(root) = document.as_object() else {
            return Err(SpecError::InvalidSpec {
                message: "document root must be an object".to_string(),
            });
        };
        match root.get("paths") {
            Some(Value::Object(_)) => Ok(Self { document }),
            Some(_) => Err(SpecError::InvalidSpec {
                message: "'paths' must be an object".to_string(),
            }),
            None => Err(SpecError::InvalidSpec {
                message: "missing 'paths'".to_string(),
            }),
        }
    }

    /// The raw document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Path templates with their path items, in declaration order.
    pub fn paths(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.document
            .get("paths")
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|paths| paths.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Path item for a template.
    pub fn path_item(&self, template: &str) -> Option<&Value> {
        self.document.get("paths")?.get(template)
    }

    /// Lowercase methods declared on a path item, in declaration order.
    pub fn methods(&self, template: &str) -> Vec<&str> {
        self.path_item(template)
            .and_then(Value::as_object)
            .map(|item| {
                item.keys()
                    .map(String::as_str)
                    .filter(|k| HTTP_METHODS.contains(k))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Raw operation declaration for a template and lowercase method.
    pub fn operation(&self, template: &str, method: &str) -> Option<&Value> {
        self.path_item(template)?.get(method)
    }

    /// The `components` object (empty when the document declares none).
    pub fn components(&self) -> &Map<String, Value> {
        static EMPTY: std::sync::OnceLock<Map<String, Value>> = std::sync::OnceLock::new();
        self.document
            .get("components")
            .and_then(Value::as_object)
            .unwrap_or_else(|| EMPTY.get_or_init(Map::new))
    }

    /// Resolve a local reference such as `#/components/schemas/Pet`.
    pub fn resolve_ref(&self, reference: &str) -> Result<&Value, CompileError> {
        navigate_fragment(&self.document, reference).map_err(|_| CompileError::UnresolvedRef {
            reference: reference.to_string(),
        })
    }

    /// Follow `$ref` chains until a node without `$ref` is reached.
    ///
    /// Nodes that are not references are returned unchanged.
    pub fn deref<'a>(&'a self, node: &'a Value) -> Result<&'a Value, CompileError> {
        let mut current = node;
        for _ in 0..MAX_REF_HOPS {
            match current.get("$ref").and_then(Value::as_str) {
                Some(reference) => current = self.resolve_ref(reference)?,
                None => return Ok(current),
            }
        }
        Err(CompileError::UnresolvedRef {
            reference: node
                .get("$ref")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }
}

/// One method + path pair's contract.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub operation_id: Option<String>,
    /// Raw parameter declarations (possibly `$ref`s).
    #[serde(default)]
    pub parameters: Vec<Value>,
    /// Raw request body declaration (possibly a `$ref`).
    #[serde(default)]
    pub request_body: Option<Value>,
    /// Raw response declarations keyed by status code, range or `default`.
    #[serde(default)]
    pub responses: Map<String, Value>,
}

impl Operation {
    /// Deserialize an operation declaration.
    pub fn from_value(value: &Value, path: &str) -> Result<Self, CompileError> {
        Self::deserialize(value).map_err(|e| CompileError::InvalidDeclaration {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}

/// A single parameter declaration after `$ref` resolution.
#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub schema: Option<Value>,
    #[serde(default)]
    pub content: Option<Map<String, Value>>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub explode: Option<bool>,
}

/// A `requestBody` declaration after `$ref` resolution.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub content: Map<String, Value>,
    #[serde(default)]
    pub required: bool,
}

/// A `responses[status]` declaration after `$ref` resolution.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub content: Map<String, Value>,
}

/// Look up a media type in a `content` map, ignoring case and parameters.
pub fn media_type_schema<'a>(content: &'a Map<String, Value>, media_type: &str) -> Option<&'a Value> {
    let wanted = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    content
        .iter()
        .find(|(k, _)| k.to_ascii_lowercase() == wanted)
        .map(|(_, v)| v)
}
