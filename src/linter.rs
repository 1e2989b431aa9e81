//! Specification linting - compile every operation ahead of traffic.
//!
//! Reports, per operation:
//! - Broken local `$ref`s and references outside the document
//! - Declarations the engine cannot compile (unknown `in`, unsupported
//!   array styles, schemas the evaluator rejects)
//! - Templates shadowed by an earlier, overlapping template
//! - Keywords the engine ignores (`propertyNames`, `contains`, `const`)

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::evaluator::{SchemaContext, DISABLED_KEYWORDS};
use crate::loader::load_spec_auto;
use crate::matcher::PathMatcher;
use crate::operation::CompiledOperation;
use crate::spec::Specification;
use crate::types::ValidatorConfig;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    /// JSON pointer into the document (e.g. "/paths/~1pets/get/parameters/0")
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn error(code: &str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: code.to_string(),
            path: path.into(),
            message: message.into(),
        }
    }

    fn warning(code: &str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.to_string(),
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Status of a linted operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting one operation.
#[derive(Debug, Clone, Serialize)]
pub struct OperationResult {
    /// `METHOD /template`
    pub operation: String,
    pub status: OperationStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of linting a specification.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub source: String,
    pub operations_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    /// Findings not tied to one operation (load failures, bad templates).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub document: Vec<Diagnostic>,
    pub results: Vec<OperationResult>,
}

impl LintResult {
    /// Returns true if nothing failed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Load and lint a specification from a file path or URL.
///
/// A document that cannot be loaded yields a single `E001` diagnostic.
pub fn lint_source(source: &str, config: &ValidatorConfig, strict: bool) -> LintResult {
    match load_spec_auto(source) {
        Ok(spec) => {
            let mut result = lint(&spec, config, strict);
            result.source = source.to_string();
            result
        }
        Err(e) => LintResult {
            source: source.to_string(),
            operations_checked: 0,
            passed: 0,
            failed: 0,
            errors: 1,
            warnings: 0,
            document: vec![Diagnostic::error("E001", "", format!("cannot load: {}", e))],
            results: Vec::new(),
        },
    }
}

/// Lint a loaded specification.
///
/// If `strict` is true, operations with warnings count as failed.
pub fn lint(spec: &Specification, config: &ValidatorConfig, strict: bool) -> LintResult {
    let mut document = Vec::new();
    let matcher = match PathMatcher::new(spec) {
        Ok(matcher) => Some(matcher),
        Err(e) => {
            document.push(Diagnostic::error("E002", "/paths", e.to_string()));
            None
        }
    };

    let context = SchemaContext::new(Arc::new(spec.clone()));
    let mut results = Vec::new();
    for (template, _) in spec.paths() {
        for method in spec.methods(template) {
            results.push(lint_operation(&context, matcher.as_ref(), template, method, config));
        }
    }

    let count = |severity: Severity| {
        results
            .iter()
            .flat_map(|r| &r.diagnostics)
            .chain(&document)
            .filter(|d| d.severity == severity)
            .count()
    };
    let errors = count(Severity::Error);
    let warnings = count(Severity::Warning);

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != OperationStatus::Ok
            } else {
                r.status == OperationStatus::Error
            }
        })
        .count();

    LintResult {
        source: "<spec>".to_string(),
        operations_checked: results.len(),
        passed: results.len() - failed,
        failed,
        errors,
        warnings,
        document,
        results,
    }
}

fn lint_operation(
    context: &SchemaContext,
    matcher: Option<&PathMatcher>,
    template: &str,
    method: &str,
    config: &ValidatorConfig,
) -> OperationResult {
    let spec = context.spec();
    let pointer = format!("/paths/{}/{}", escape(template), method);
    let mut diagnostics = Vec::new();

    if let Some(operation) = spec.operation(template, method) {
        check_refs(spec, operation, &pointer, &mut diagnostics);
        check_disabled_keywords(operation, &pointer, None, &mut diagnostics);
    }
    if let Some(parameters) = spec.path_item(template).and_then(|item| item.get("parameters")) {
        let path_pointer = format!("/paths/{}/parameters", escape(template));
        check_refs(spec, parameters, &path_pointer, &mut diagnostics);
    }

    // A broken reference already explains the compile failure.
    let broken_refs = diagnostics.iter().any(|d| d.code == "E003");
    if !broken_refs {
        if let Err(e) = CompiledOperation::build(context, template, method, config) {
            diagnostics.push(Diagnostic::error("E004", pointer.clone(), e.to_string()));
        }
    }

    if let Some(matcher) = matcher {
        if let Some(route) = matcher.find(method, &sample_path(template)) {
            if route.template != template {
                diagnostics.push(Diagnostic::warning(
                    "W001",
                    pointer.clone(),
                    format!("shadowed by earlier template {}", route.template),
                ));
            }
        }
    }

    let status = if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        OperationStatus::Error
    } else if diagnostics.is_empty() {
        OperationStatus::Ok
    } else {
        OperationStatus::Warning
    };

    OperationResult {
        operation: format!("{} {}", method.to_uppercase(), template),
        status,
        diagnostics,
    }
}

/// Recursively check `$ref` values.
fn check_refs(spec: &Specification, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                if !reference.starts_with('#') {
                    diagnostics.push(Diagnostic::warning(
                        "W003",
                        path,
                        format!("external reference is not resolved: {}", reference),
                    ));
                } else if spec.resolve_ref(reference).is_err() {
                    diagnostics.push(Diagnostic::error(
                        "E003",
                        path,
                        format!("reference not found: {}", reference),
                    ));
                }
            }

            for (key, val) in map {
                check_refs(spec, val, &format!("{}/{}", path, escape(key)), diagnostics);
            }
        }
        Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                check_refs(spec, item, &format!("{}/{}", path, i), diagnostics);
            }
        }
        _ => {}
    }
}

/// Warn on keywords the engine removes before evaluation.
///
/// Keys of property maps and literal values (`example`, `default`, `enum`)
/// are data, not keywords.
fn check_disabled_keywords(value: &Value, path: &str, parent: Option<&str>, diagnostics: &mut Vec<Diagnostic>) {
    match value {
        Value::Object(map) => {
            let is_name_map = matches!(
                parent,
                Some("properties" | "patternProperties" | "definitions" | "$defs" | "content" | "responses")
            );
            for (key, val) in map {
                if matches!(key.as_str(), "example" | "examples" | "default" | "enum") {
                    continue;
                }
                let child = format!("{}/{}", path, escape(key));
                if !is_name_map && DISABLED_KEYWORDS.contains(&key.as_str()) {
                    diagnostics.push(Diagnostic::warning(
                        "W002",
                        child.clone(),
                        format!("keyword '{}' is not supported and will be ignored", key),
                    ));
                }
                check_disabled_keywords(val, &child, Some(key), diagnostics);
            }
        }
        Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                check_disabled_keywords(item, &format!("{}/{}", path, i), None, diagnostics);
            }
        }
        _ => {}
    }
}

/// Concrete path for a template with every placeholder filled in.
fn sample_path(template: &str) -> String {
    let mut sample = String::with_capacity(template.len());
    let mut in_placeholder = false;
    for c in template.chars() {
        match c {
            '{' => {
                in_placeholder = true;
                sample.push_str("sample");
            }
            '}' => in_placeholder = false,
            _ if !in_placeholder => sample.push(c),
            _ => {}
        }
    }
    sample
}

fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn spec(document: Value) -> Specification {
        Specification::from_value(document).unwrap()
    }

    fn diagnostics(result: &LintResult) -> Vec<&Diagnostic> {
        result.results.iter().flat_map(|r| &r.diagnostics).collect()
    }

    #[test]
    fn lint_valid_spec() {
        let spec = spec(json!({
            "paths": {
                "/pets": {
                    "get": {
                        "parameters": [{ "name": "limit", "in": "query", "schema": { "type": "integer" } }],
                        "responses": {
                            "200": {
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/Pets" } }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": { "Pets": { "type": "array", "items": { "type": "object" } } }
            }
        }));

        let result = lint(&spec, &ValidatorConfig::default(), false);
        assert!(result.is_ok());
        assert_eq!(result.operations_checked, 1);
        assert_eq!(result.results[0].operation, "GET /pets");
        assert_eq!(result.results[0].status, OperationStatus::Ok);
    }

    #[test]
    fn lint_broken_ref() {
        let spec = spec(json!({
            "paths": {
                "/pets": {
                    "post": {
                        "requestBody": { "$ref": "#/components/requestBodies/Missing" },
                        "responses": {}
                    }
                }
            }
        }));

        let result = lint(&spec, &ValidatorConfig::default(), false);
        assert!(!result.is_ok());
        let found = diagnostics(&result);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code, "E003");
        assert_eq!(found[0].path, "/paths/~1pets/post/requestBody");
    }

    #[test]
    fn lint_compile_failure() {
        let spec = spec(json!({
            "paths": {
                "/pets": {
                    "get": {
                        "parameters": [{
                            "name": "tags",
                            "in": "query",
                            "style": "deepObject",
                            "schema": { "type": "array" }
                        }],
                        "responses": {}
                    }
                }
            }
        }));

        let result = lint(&spec, &ValidatorConfig::default(), false);
        assert_eq!(result.failed, 1);
        assert!(diagnostics(&result).iter().any(|d| d.code == "E004"));
    }

    #[test]
    fn lint_shadowed_template() {
        let spec = spec(json!({
            "paths": {
                "/pets/{id}": { "get": { "responses": {} } },
                "/pets/{name}": { "get": { "responses": {} } }
            }
        }));

        let result = lint(&spec, &ValidatorConfig::default(), false);
        assert!(result.is_ok());
        assert_eq!(result.warnings, 1);
        assert_eq!(result.results[0].status, OperationStatus::Ok);
        assert_eq!(result.results[1].status, OperationStatus::Warning);
        assert_eq!(result.results[1].diagnostics[0].code, "W001");
    }

    #[test]
    fn lint_disabled_keywords() {
        let spec = spec(json!({
            "paths": {
                "/pets": {
                    "post": {
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {
                                            "const": { "type": "string", "const": "x" }
                                        },
                                        "example": { "const": 1 }
                                    }
                                }
                            }
                        },
                        "responses": {}
                    }
                }
            }
        }));

        let result = lint(&spec, &ValidatorConfig::default(), false);
        let found = diagnostics(&result);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code, "W002");
        assert!(found[0].path.ends_with("/properties/const/const"));
    }

    #[test]
    fn lint_strict_mode() {
        let spec = spec(json!({
            "paths": {
                "/pets": {
                    "get": {
                        "parameters": [{ "$ref": "shared.json#/Limit" }],
                        "responses": {}
                    }
                }
            }
        }));

        let result = lint(&spec, &ValidatorConfig::default(), false);
        assert!(diagnostics(&result).iter().any(|d| d.code == "W003"));

        // The external reference also fails compilation.
        assert_eq!(result.failed, 1);

        let strict = lint(&spec, &ValidatorConfig::default(), true);
        assert_eq!(strict.failed, 1);
        assert_eq!(strict.passed, 0);
    }

    #[test]
    fn lint_strict_counts_warnings_as_failures() {
        let spec = spec(json!({
            "paths": {
                "/a/{x}": { "get": { "responses": {} } },
                "/a/{y}": { "get": { "responses": {} } }
            }
        }));

        assert_eq!(lint(&spec, &ValidatorConfig::default(), false).failed, 0);
        assert_eq!(lint(&spec, &ValidatorConfig::default(), true).failed, 1);
    }

    #[test]
    fn lint_unloadable_source() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{ not valid json }}").unwrap();

        let result = lint_source(
            file.path().to_str().unwrap(),
            &ValidatorConfig::default(),
            false,
        );
        assert!(!result.is_ok());
        assert_eq!(result.document.len(), 1);
        assert_eq!(result.document[0].code, "E001");
    }

    #[test]
    fn lint_bad_template() {
        let spec = spec(json!({ "paths": { "/pets/{id": { "get": { "responses": {} } } } }));
        let result = lint(&spec, &ValidatorConfig::default(), false);
        assert!(!result.is_ok());
        assert_eq!(result.document[0].code, "E002");
    }

    #[test]
    fn sample_path_fills_placeholders() {
        assert_eq!(sample_path("/pets/{id}/toys/{toy}"), "/pets/sample/toys/sample");
        assert_eq!(sample_path("/pets"), "/pets");
    }
}
