//! Path matching - maps a concrete request path to a declared template.
//!
//! Literal paths are looked up directly. Templated paths are compiled once
//! into patterns where each `{name}` placeholder matches one or more
//! alphanumeric or `-` characters, anchored to the end of the path only, so
//! a deployment prefix such as a stage name may precede the template.
//!
//! When two templates match the same concrete path, the one declared first
//! in the document wins. Specs relying on overlapping templates should list
//! the more specific template first.

use std::collections::HashMap;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::CompileError;
use crate::spec::Specification;

/// Characters a path parameter value may consist of.
const PLACEHOLDER_PATTERN: &str = "([A-Za-z0-9-]+)";

/// A template resolved for an incoming request.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch {
    /// Declared path template (e.g. `/pets/{id}`).
    pub template: String,
    /// Lowercase HTTP method.
    pub method: String,
    /// Values captured by placeholders, keyed by parameter name.
    pub params: Map<String, Value>,
}

#[derive(Debug)]
struct CompiledTemplate {
    template: String,
    pattern: Regex,
    names: Vec<String>,
    methods: Vec<String>,
}

/// Matcher over every path template declared in a specification.
#[derive(Debug)]
pub struct PathMatcher {
    literals: HashMap<String, Vec<String>>,
    templates: Vec<CompiledTemplate>,
}

impl PathMatcher {
    /// Compile every template in the specification.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::InvalidTemplate` if a template has an
    /// unterminated placeholder.
    pub fn new(spec: &Specification) -> Result<Self, CompileError> {
        let mut literals = HashMap::new();
        let mut templates = Vec::new();

        for (template, _) in spec.paths() {
            let methods: Vec<String> = spec.methods(template).into_iter().map(String::from).collect();
            literals.insert(template.to_string(), methods.clone());
            if template.contains('{') {
                let (pattern, names) = compile_template(template)?;
                templates.push(CompiledTemplate {
                    template: template.to_string(),
                    pattern,
                    names,
                    methods,
                });
            }
        }

        Ok(Self {
            literals,
            templates,
        })
    }

    /// Find the operation serving `method` + `path`.
    ///
    /// An exact template match declaring the method wins; otherwise
    /// templated paths are tried in declaration order.
    pub fn find(&self, method: &str, path: &str) -> Option<RouteMatch> {
        let method = method.to_ascii_lowercase();

        if let Some(methods) = self.literals.get(path) {
            if methods.contains(&method) {
                return Some(RouteMatch {
                    template: path.to_string(),
                    method,
                    params: Map::new(),
                });
            }
        }

        self.templates
            .iter()
            .filter(|t| t.methods.contains(&method))
            .find_map(|t| {
                let captures = t.pattern.captures(path)?;
                let params = t
                    .names
                    .iter()
                    .zip(captures.iter().skip(1))
                    .filter_map(|(name, m)| {
                        m.map(|m| (name.clone(), Value::String(m.as_str().to_string())))
                    })
                    .collect();
                Some(RouteMatch {
                    template: t.template.clone(),
                    method: method.clone(),
                    params,
                })
            })
    }

    /// Number of templates known to the matcher.
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }
}

/// Turn `/pets/{id}` into an end-anchored pattern plus placeholder names.
fn compile_template(template: &str) -> Result<(Regex, Vec<String>), CompileError> {
    let invalid = |message: &str| CompileError::InvalidTemplate {
        template: template.to_string(),
        message: message.to_string(),
    };

    let mut pattern = String::new();
    let mut names = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        pattern.push_str(&regex::escape(&rest[..start]));
        let after = &rest[start + 1..];
        let end = after.find('}').ok_or_else(|| invalid("unterminated placeholder"))?;
        let name = &after[..end];
        if name.is_empty() {
            return Err(invalid("empty placeholder"));
        }
        names.push(name.to_string());
        pattern.push_str(PLACEHOLDER_PATTERN);
        rest = &after[end + 1..];
    }
    pattern.push_str(&regex::escape(rest));
    pattern.push('$');

    let regex = Regex::new(&pattern).map_err(|e| invalid(&e.to_string()))?;
    Ok((regex, names))
}
