//! Contract evaluation: shape a payload, then validate it.
//!
//! Evaluation runs in two passes over a compiled schema:
//!
//! 1. **Shaping** walks the value alongside the contract schema and applies
//!    the mutating behaviors: type coercion, defaults, removal of
//!    undeclared properties, and the direction's contract keyword
//!    (`readOnly` strips, `writeOnly` rejects).
//! 2. **Verdict**: the shaped value is validated by `jsonschema` against a
//!    prepared copy of the schema (OpenAPI `nullable` translated, disabled
//!    keywords removed, components embedded so local `$ref`s resolve).

use std::sync::Arc;

use jsonschema::error::ValidationErrorKind;
use serde_json::{json, Map, Value};

use crate::coerce::coerce_value;
use crate::error::{CompileError, SchemaError};
use crate::keywords::{ContractKeyword, KeywordVerdict};
use crate::spec::Specification;
use crate::types::{Direction, EvaluatorOptions};

/// Keywords the contract format does not support.
pub const DISABLED_KEYWORDS: &[&str] = &["propertyNames", "contains", "const"];

/// Deepest value nesting the shaping pass descends into.
const MAX_DEPTH: usize = 128;

/// Shared, prepared view of a specification used to compile evaluators.
#[derive(Debug, Clone)]
pub struct SchemaContext {
    spec: Arc<Specification>,
    components: Arc<Value>,
}

impl SchemaContext {
    /// Prepare the specification's components once for every evaluator.
    pub fn new(spec: Arc<Specification>) -> Self {
        let mut components = Value::Object(spec.components().clone());
        prepare_components(&mut components);
        Self {
            spec,
            components: Arc::new(components),
        }
    }

    pub fn spec(&self) -> &Specification {
        &self.spec
    }

    /// Prepared schema with components embedded under the root.
    fn root_schema(&self, schema: &Value) -> Value {
        let mut root = schema.clone();
        prepare_schema(&mut root);
        if let Value::Object(map) = &mut root {
            map.insert("components".to_string(), (*self.components).clone());
        }
        root
    }
}

/// Errors and diagnostics produced by one evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// Fatal contract violations.
    pub errors: Vec<SchemaError>,
    /// Non-fatal findings, such as stripped read-only properties.
    pub diagnostics: Vec<SchemaError>,
}

impl Evaluation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A compiled, reusable evaluator for one schema and direction.
pub struct ContractEvaluator {
    spec: Arc<Specification>,
    schema: Value,
    direction: Direction,
    options: EvaluatorOptions,
    validator: jsonschema::Validator,
}

impl std::fmt::Debug for ContractEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractEvaluator")
            .field("schema", &self.schema)
            .field("direction", &self.direction)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ContractEvaluator {
    /// Compile a schema for one direction.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::InvalidSchema` if `jsonschema` rejects the
    /// prepared schema (e.g. a `$ref` that does not resolve).
    pub fn compile(
        context: &SchemaContext,
        schema: Value,
        direction: Direction,
        options: EvaluatorOptions,
        label: &str,
    ) -> Result<Self, CompileError> {
        let root = context.root_schema(&schema);
        let validator = jsonschema::options()
            .with_draft(jsonschema::Draft::Draft4)
            .build(&root)
            .map_err(|e| CompileError::InvalidSchema {
                context: label.to_string(),
                message: e.to_string(),
            })?;

        tracing::debug!(schema = label, ?direction, "compiled contract evaluator");

        Ok(Self {
            spec: Arc::clone(&context.spec),
            schema,
            direction,
            options,
            validator,
        })
    }

    /// The contract schema (unprepared, references intact).
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Shape `value` in place and validate it.
    ///
    /// The value is left in its shaped form whether or not it is valid;
    /// callers discard it on failure.
    pub fn evaluate(&self, value: &mut Value) -> Evaluation {
        let mut shaper = Shaper {
            spec: &self.spec,
            options: self.options,
            keyword: ContractKeyword::for_direction(self.direction),
            evaluation: Evaluation::default(),
        };
        shaper.shape(&self.schema, value, "", true, 0);
        let mut evaluation = shaper.evaluation;

        evaluation
            .errors
            .extend(self.validator.iter_errors(value).map(|e| schema_error(&e)));
        dedup_errors(&mut evaluation.errors);
        evaluation
    }
}

struct Shaper<'a> {
    spec: &'a Specification,
    options: EvaluatorOptions,
    keyword: ContractKeyword,
    evaluation: Evaluation,
}

impl Shaper<'_> {
    fn shape(&mut self, schema: &Value, value: &mut Value, path: &str, strip: bool, depth: usize) {
        if depth > MAX_DEPTH {
            return;
        }
        let spec = self.spec;
        let Ok(schema) = spec.deref(schema) else {
            return;
        };

        if self.options.coerce_types {
            coerce_value(value, schema);
        }

        match value {
            Value::Object(map) => self.shape_object(schema, map, path, strip, depth),
            Value::Array(items) => match schema.get("items") {
                Some(Value::Array(tuple)) => {
                    for (i, (item, item_schema)) in items.iter_mut().zip(tuple).enumerate() {
                        self.shape(item_schema, item, &child_path(path, &i.to_string()), true, depth + 1);
                    }
                }
                Some(item_schema) => {
                    for (i, item) in items.iter_mut().enumerate() {
                        self.shape(item_schema, item, &child_path(path, &i.to_string()), true, depth + 1);
                    }
                }
                None => {}
            },
            _ => {}
        }

        // allOf branches constrain the same value; undeclared-property
        // stripping happens once at this level against their union.
        if let Some(Value::Array(branches)) = schema.get("allOf") {
            for branch in branches {
                self.shape(branch, value, path, false, depth + 1);
            }
        }

        // anyOf/oneOf branches are not shaped, but a write-only property
        // declared in any of them still rejects the response.
        if self.keyword == ContractKeyword::WriteOnly {
            for key in ["anyOf", "oneOf"] {
                if let Some(Value::Array(branches)) = schema.get(key) {
                    for branch in branches {
                        let mut scratch = value.clone();
                        self.shape(branch, &mut scratch, path, false, depth + 1);
                    }
                }
            }
        }
    }

    fn shape_object(
        &mut self,
        schema: &Value,
        map: &mut Map<String, Value>,
        path: &str,
        strip: bool,
        depth: usize,
    ) {
        let spec = self.spec;
        let properties = schema.get("properties").and_then(Value::as_object);

        if self.options.use_defaults {
            for (name, prop) in properties.into_iter().flatten() {
                if map.contains_key(name) {
                    continue;
                }
                if let Some(default) = spec.deref(prop).ok().and_then(|p| p.get("default")) {
                    map.insert(name.clone(), default.clone());
                }
            }
        }

        if self.options.remove_additional && strip {
            if let Some(declared) = self.declared_properties(schema) {
                map.retain(|name, _| {
                    let keep = declared.iter().any(|d| d == name);
                    if !keep {
                        tracing::debug!(path = %child_path(path, name), "removed undeclared property");
                    }
                    keep
                });
            }
        }

        let additional = schema
            .get("additionalProperties")
            .filter(|a| a.is_object());
        let names: Vec<String> = map.keys().cloned().collect();
        for name in names {
            let prop_path = child_path(path, &name);
            let declared = properties.and_then(|p| p.get(&name));
            let Some(prop_schema) = declared.or(additional) else {
                continue;
            };

            if declared.is_some() {
                let resolved = spec.deref(prop_schema).unwrap_or(prop_schema);
                let verdict = match map.get(&name) {
                    Some(value) => self.keyword.apply(resolved, value, &prop_path, &name),
                    None => KeywordVerdict::Keep,
                };
                match verdict {
                    KeywordVerdict::Keep => {}
                    KeywordVerdict::Strip(diagnostic) => {
                        tracing::warn!(path = %diagnostic.path, "stripped read-only property");
                        map.remove(&name);
                        self.evaluation.diagnostics.push(diagnostic);
                        continue;
                    }
                    KeywordVerdict::Reject(error) => {
                        self.evaluation.errors.push(error);
                        continue;
                    }
                }
            }

            if let Some(child) = map.get_mut(&name) {
                self.shape(prop_schema, child, &prop_path, true, depth + 1);
            }
        }
    }

    /// Property names an object schema declares, including its `allOf`
    /// branches. `None` means the schema leaves the object open.
    fn declared_properties(&self, schema: &Value) -> Option<Vec<String>> {
        match schema.get("additionalProperties") {
            Some(Value::Bool(true)) | Some(Value::Object(_)) => return None,
            _ => {}
        }
        if schema.get("patternProperties").is_some() {
            return None;
        }

        let mut declared = Vec::new();
        let mut constrained = false;
        let branches = schema
            .get("allOf")
            .and_then(Value::as_array)
            .map(|b| b.as_slice())
            .unwrap_or_default();
        for node in std::iter::once(schema).chain(branches) {
            let Ok(node) = self.spec.deref(node) else {
                return None;
            };
            if let Some(props) = node.get("properties").and_then(Value::as_object) {
                constrained = true;
                declared.extend(props.keys().cloned());
            }
        }
        constrained.then_some(declared)
    }
}

/// Append an escaped segment to a JSON pointer.
fn child_path(path: &str, segment: &str) -> String {
    format!("{}/{}", path, segment.replace('~', "~0").replace('/', "~1"))
}

fn dedup_errors(errors: &mut Vec<SchemaError>) {
    let mut seen: Vec<(String, String, String)> = Vec::new();
    errors.retain(|e| {
        let key = (e.keyword.clone(), e.path.clone(), e.message.clone());
        if seen.contains(&key) {
            false
        } else {
            seen.push(key);
            true
        }
    });
}

/// Convert a `jsonschema` error, listing allowed values for enums.
fn schema_error(error: &jsonschema::ValidationError<'_>) -> SchemaError {
    let schema_path = error.schema_path.to_string();
    let keyword = schema_path.rsplit('/').next().unwrap_or_default();
    let mut message = error.to_string();
    let mut params = Value::Null;

    if let ValidationErrorKind::Enum { options } = &error.kind {
        let allowed: Vec<String> = options
            .as_array()
            .map(|values| values.iter().map(display_value).collect())
            .unwrap_or_default();
        message = format!("{}: {}", message, allowed.join(", "));
        params = json!({ "allowedValues": options });
    }

    SchemaError {
        keyword: keyword.to_string(),
        path: error.instance_path.to_string(),
        message,
        params,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Rewrite a schema into the dialect `jsonschema` evaluates.
///
/// Removes disabled keywords and turns OpenAPI `nullable: true` into a
/// `null` member of `type` (and of `enum`, when present). Property maps are
/// descended into without touching their keys, so a property named
/// `const` survives.
pub fn prepare_schema(value: &mut Value) {
    let Value::Object(map) = value else {
        return;
    };

    for keyword in DISABLED_KEYWORDS {
        map.remove(*keyword);
    }

    if map.remove("nullable") == Some(Value::Bool(true)) {
        allow_null(map);
    }

    // Draft 4 requires at least one entry.
    if map.get("required").and_then(Value::as_array).is_some_and(Vec::is_empty) {
        map.remove("required");
    }

    for (key, child) in map.iter_mut() {
        match key.as_str() {
            "properties" | "patternProperties" | "definitions" | "$defs" => {
                if let Value::Object(entries) = child {
                    for entry in entries.values_mut() {
                        prepare_schema(entry);
                    }
                }
            }
            "items" | "additionalItems" => match child {
                Value::Array(items) => items.iter_mut().for_each(prepare_schema),
                other => prepare_schema(other),
            },
            "additionalProperties" | "not" => prepare_schema(child),
            "allOf" | "anyOf" | "oneOf" => {
                if let Value::Array(branches) = child {
                    branches.iter_mut().for_each(prepare_schema);
                }
            }
            _ => {}
        }
    }
}

fn allow_null(map: &mut Map<String, Value>) {
    match map.get_mut("type") {
        Some(Value::String(t)) => {
            let single = Value::String(std::mem::take(t));
            map.insert("type".to_string(), json!([single, "null"]));
        }
        Some(Value::Array(types)) => {
            if !types.iter().any(|t| t == "null") {
                types.push(json!("null"));
            }
        }
        _ => {}
    }
    if let Some(Value::Array(values)) = map.get_mut("enum") {
        if !values.contains(&Value::Null) {
            values.push(Value::Null);
        }
    }
}

/// Prepare every schema reachable from a `components` object.
///
/// Entries of `components.schemas` are schemas themselves; in the other
/// categories schemas sit under `schema` keys (parameters, media types).
fn prepare_components(components: &mut Value) {
    let Value::Object(categories) = components else {
        return;
    };
    for (category, entries) in categories.iter_mut() {
        let Value::Object(entries) = entries else {
            continue;
        };
        for entry in entries.values_mut() {
            if category == "schemas" {
                prepare_schema(entry);
            } else {
                prepare_nested_schemas(entry);
            }
        }
    }
}

fn prepare_nested_schemas(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if key == "schema" {
                    prepare_schema(child);
                } else {
                    prepare_nested_schemas(child);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(prepare_nested_schemas),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> SchemaContext {
        let spec = Specification::from_value(json!({
            "paths": {},
            "components": {
                "schemas": {
                    "Pet": {
                        "type": "object",
                        "required": ["name"],
                        "properties": {
                            "id": { "type": "integer", "readOnly": true },
                            "name": { "type": "string" },
                            "secret": { "type": "string", "writeOnly": true },
                            "status": { "type": "string", "enum": ["available", "sold"] }
                        }
                    },
                    "Named": {
                        "type": "object",
                        "properties": { "name": { "type": "string" } }
                    },
                    "Aged": {
                        "type": "object",
                        "properties": { "age": { "type": "integer" } }
                    }
                }
            }
        }))
        .unwrap();
        SchemaContext::new(Arc::new(spec))
    }

    fn evaluator(schema: Value, direction: Direction, options: EvaluatorOptions) -> ContractEvaluator {
        ContractEvaluator::compile(&context(), schema, direction, options, "test").unwrap()
    }

    fn coercing() -> EvaluatorOptions {
        EvaluatorOptions {
            coerce_types: true,
            ..EvaluatorOptions::default()
        }
    }

    #[test]
    fn valid_value_passes() {
        let ev = evaluator(
            json!({ "$ref": "#/components/schemas/Pet" }),
            Direction::Request,
            EvaluatorOptions::default(),
        );
        let mut value = json!({ "name": "Rex" });
        assert!(ev.evaluate(&mut value).is_valid());
    }

    #[test]
    fn missing_required_property_is_reported() {
        let ev = evaluator(
            json!({ "$ref": "#/components/schemas/Pet" }),
            Direction::Request,
            EvaluatorOptions::default(),
        );
        let mut value = json!({});
        let evaluation = ev.evaluate(&mut value);
        assert_eq!(evaluation.errors.len(), 1);
        assert_eq!(evaluation.errors[0].keyword, "required");
        assert!(evaluation.errors[0].message.contains("name"));
    }

    #[test]
    fn read_only_property_is_stripped_from_request() {
        let ev = evaluator(
            json!({ "$ref": "#/components/schemas/Pet" }),
            Direction::Request,
            EvaluatorOptions::default(),
        );
        let mut value = json!({ "id": 1, "name": "Rex" });
        let evaluation = ev.evaluate(&mut value);

        assert!(evaluation.is_valid());
        assert_eq!(value, json!({ "name": "Rex" }));
        assert_eq!(evaluation.diagnostics.len(), 1);
        assert_eq!(evaluation.diagnostics[0].keyword, "readOnly");
        assert_eq!(evaluation.diagnostics[0].path, "/id");
    }

    #[test]
    fn read_only_property_is_allowed_in_response() {
        let ev = evaluator(
            json!({ "$ref": "#/components/schemas/Pet" }),
            Direction::Response,
            EvaluatorOptions::default(),
        );
        let mut value = json!({ "id": 1, "name": "Rex" });
        assert!(ev.evaluate(&mut value).is_valid());
        assert_eq!(value["id"], 1);
    }

    #[test]
    fn write_only_property_rejects_response() {
        let ev = evaluator(
            json!({ "type": "object", "properties": { "response": { "$ref": "#/components/schemas/Pet" } } }),
            Direction::Response,
            EvaluatorOptions::default(),
        );
        let mut value = json!({ "response": { "name": "Rex", "secret": "x" } });
        let evaluation = ev.evaluate(&mut value);
        assert!(!evaluation.is_valid());
        assert_eq!(evaluation.errors[0].keyword, "writeOnly");
        assert_eq!(evaluation.errors[0].path, "/response/secret");
    }

    #[test]
    fn write_only_property_inside_one_of_rejects_response() {
        let ev = evaluator(
            json!({
                "type": "object",
                "properties": {
                    "response": { "oneOf": [{ "$ref": "#/components/schemas/Pet" }] }
                }
            }),
            Direction::Response,
            EvaluatorOptions::default(),
        );
        let mut value = json!({ "response": { "name": "Rex", "secret": "x" } });
        let evaluation = ev.evaluate(&mut value);
        assert!(!evaluation.is_valid());
        assert_eq!(evaluation.errors.len(), 1);
        assert_eq!(evaluation.errors[0].keyword, "writeOnly");
        assert_eq!(evaluation.errors[0].path, "/response/secret");
        // The branch walk leaves the value itself untouched.
        assert_eq!(value["response"]["secret"], "x");
    }

    #[test]
    fn write_only_property_inside_any_of_rejects_response() {
        let ev = evaluator(
            json!({ "anyOf": [{ "type": "string" }, { "$ref": "#/components/schemas/Pet" }] }),
            Direction::Response,
            EvaluatorOptions::default(),
        );
        let mut value = json!({ "name": "Rex", "secret": "x" });
        let evaluation = ev.evaluate(&mut value);
        assert_eq!(evaluation.errors[0].path, "/secret");
    }

    #[test]
    fn write_only_property_is_accepted_in_request() {
        let ev = evaluator(
            json!({ "$ref": "#/components/schemas/Pet" }),
            Direction::Request,
            EvaluatorOptions::default(),
        );
        let mut value = json!({ "name": "Rex", "secret": "x" });
        assert!(ev.evaluate(&mut value).is_valid());
    }

    #[test]
    fn enum_errors_list_allowed_values() {
        let ev = evaluator(
            json!({ "$ref": "#/components/schemas/Pet" }),
            Direction::Request,
            EvaluatorOptions::default(),
        );
        let mut value = json!({ "name": "Rex", "status": "lost" });
        let evaluation = ev.evaluate(&mut value);
        assert_eq!(evaluation.errors.len(), 1);
        assert_eq!(evaluation.errors[0].keyword, "enum");
        assert!(evaluation.errors[0].message.ends_with(": available, sold"));
        assert_eq!(
            evaluation.errors[0].params,
            json!({ "allowedValues": ["available", "sold"] })
        );
    }

    #[test]
    fn coercion_converts_declared_scalars() {
        let ev = evaluator(
            json!({
                "type": "object",
                "properties": {
                    "limit": { "type": "integer" },
                    "verbose": { "type": "boolean" }
                }
            }),
            Direction::Request,
            coercing(),
        );
        let mut value = json!({ "limit": "5", "verbose": "true" });
        assert!(ev.evaluate(&mut value).is_valid());
        assert_eq!(value, json!({ "limit": 5, "verbose": true }));
    }

    #[test]
    fn coercion_disabled_rejects_strings() {
        let ev = evaluator(
            json!({ "type": "object", "properties": { "limit": { "type": "integer" } } }),
            Direction::Request,
            EvaluatorOptions::default(),
        );
        let mut value = json!({ "limit": "5" });
        let evaluation = ev.evaluate(&mut value);
        assert_eq!(evaluation.errors[0].keyword, "type");
    }

    #[test]
    fn coercion_applies_to_array_items() {
        let ev = evaluator(
            json!({ "type": "array", "items": { "type": "integer" } }),
            Direction::Request,
            coercing(),
        );
        let mut value = json!(["1", "2"]);
        assert!(ev.evaluate(&mut value).is_valid());
        assert_eq!(value, json!([1, 2]));
    }

    #[test]
    fn defaults_fill_absent_properties() {
        let ev = evaluator(
            json!({
                "type": "object",
                "properties": { "limit": { "type": "integer", "default": 20 } }
            }),
            Direction::Request,
            EvaluatorOptions {
                use_defaults: true,
                ..EvaluatorOptions::default()
            },
        );
        let mut value = json!({});
        assert!(ev.evaluate(&mut value).is_valid());
        assert_eq!(value, json!({ "limit": 20 }));
    }

    #[test]
    fn remove_additional_strips_undeclared_properties() {
        let ev = evaluator(
            json!({ "$ref": "#/components/schemas/Pet" }),
            Direction::Request,
            EvaluatorOptions {
                remove_additional: true,
                ..EvaluatorOptions::default()
            },
        );
        let mut value = json!({ "name": "Rex", "color": "brown" });
        assert!(ev.evaluate(&mut value).is_valid());
        assert_eq!(value, json!({ "name": "Rex" }));
    }

    #[test]
    fn remove_additional_respects_open_objects() {
        let ev = evaluator(
            json!({
                "type": "object",
                "additionalProperties": true,
                "properties": { "name": { "type": "string" } }
            }),
            Direction::Request,
            EvaluatorOptions {
                remove_additional: true,
                ..EvaluatorOptions::default()
            },
        );
        let mut value = json!({ "name": "Rex", "color": "brown" });
        ev.evaluate(&mut value);
        assert_eq!(value["color"], "brown");
    }

    #[test]
    fn remove_additional_uses_all_of_union() {
        let ev = evaluator(
            json!({
                "allOf": [
                    { "$ref": "#/components/schemas/Named" },
                    { "$ref": "#/components/schemas/Aged" }
                ]
            }),
            Direction::Request,
            EvaluatorOptions {
                remove_additional: true,
                coerce_types: true,
                ..EvaluatorOptions::default()
            },
        );
        let mut value = json!({ "name": "Rex", "age": "3", "color": "brown" });
        assert!(ev.evaluate(&mut value).is_valid());
        assert_eq!(value, json!({ "name": "Rex", "age": 3 }));
    }

    #[test]
    fn nullable_accepts_null() {
        let ev = evaluator(
            json!({
                "type": "object",
                "properties": { "nickname": { "type": "string", "nullable": true } }
            }),
            Direction::Request,
            EvaluatorOptions::default(),
        );
        let mut value = json!({ "nickname": null });
        assert!(ev.evaluate(&mut value).is_valid());
    }

    #[test]
    fn unresolvable_reference_fails_compilation() {
        let result = ContractEvaluator::compile(
            &context(),
            json!({ "$ref": "#/components/schemas/Missing" }),
            Direction::Request,
            EvaluatorOptions::default(),
            "test",
        );
        assert!(matches!(result, Err(CompileError::InvalidSchema { .. })));
    }

    #[test]
    fn prepare_schema_removes_disabled_keywords_only() {
        let mut schema = json!({
            "type": "object",
            "const": 1,
            "contains": { "type": "string" },
            "propertyNames": { "pattern": "^a" },
            "properties": {
                "const": { "type": "string", "const": "x" }
            }
        });
        prepare_schema(&mut schema);
        assert_eq!(
            schema,
            json!({
                "type": "object",
                "properties": { "const": { "type": "string" } }
            })
        );
    }

    #[test]
    fn prepare_schema_translates_nullable() {
        let mut schema = json!({ "type": "string", "nullable": true, "enum": ["a"] });
        prepare_schema(&mut schema);
        assert_eq!(schema, json!({ "type": ["string", "null"], "enum": ["a", null] }));
    }

    #[test]
    fn evaluation_is_repeatable() {
        let ev = evaluator(
            json!({ "$ref": "#/components/schemas/Pet" }),
            Direction::Request,
            coercing(),
        );
        let mut first = json!({ "id": "1", "name": "Rex" });
        let mut second = first.clone();
        assert_eq!(ev.evaluate(&mut first), ev.evaluate(&mut second));
        assert_eq!(first, second);
    }
}
