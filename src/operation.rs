//! Compiled per-operation contract.

use serde_json::{json, Map, Value};

use crate::body::{resolve_request_body, resolve_response_bodies, select_status, BodySchema};
use crate::error::CompileError;
use crate::evaluator::{ContractEvaluator, SchemaContext};
use crate::params::{compile_parameters, merge_parameters, ParameterSchemas};
use crate::spec::Operation;
use crate::types::{Direction, ParameterLocation, ValidatorConfig};

/// Everything needed to validate exchanges for one (template, method).
///
/// A pure function of the specification and configuration, so it is built
/// once and shared.
#[derive(Debug)]
pub struct CompiledOperation {
    pub template: String,
    pub method: String,
    pub operation_id: Option<String>,
    pub parameters: ParameterSchemas,
    pub body: BodySchema,
    /// Request fields that must be present (`query`, `params`, `body`...).
    pub required: Vec<&'static str>,
    request: ContractEvaluator,
    responses: Vec<(String, ContractEvaluator)>,
}

impl CompiledOperation {
    /// Compile the operation declared at `template` / `method`.
    ///
    /// # Errors
    ///
    /// Returns a `CompileError` for undeclared operations, malformed
    /// declarations, unresolved references and schemas the evaluator
    /// cannot compile.
    pub fn build(
        context: &SchemaContext,
        template: &str,
        method: &str,
        config: &ValidatorConfig,
    ) -> Result<Self, CompileError> {
        let spec = context.spec();
        let method = method.to_lowercase();
        let label = format!("{} {}", method.to_uppercase(), template);

        let raw = spec
            .operation(template, &method)
            .ok_or_else(|| CompileError::InvalidDeclaration {
                path: label.clone(),
                message: "operation is not declared".to_string(),
            })?;
        let operation = Operation::from_value(raw, &label)?;

        let path_parameters = spec
            .path_item(template)
            .and_then(|item| item.get("parameters"))
            .and_then(Value::as_array)
            .map(|p| p.as_slice())
            .unwrap_or_default();
        let merged = merge_parameters(spec, path_parameters, &operation.parameters)?;
        let parameters = compile_parameters(spec, &merged)?;

        let body = resolve_request_body(spec, operation.request_body.as_ref(), &config.content_type)?;
        let required = required_fields(&parameters, &body);

        let request = ContractEvaluator::compile(
            context,
            request_schema(&parameters, &body, &required),
            Direction::Request,
            config.evaluator_options(Direction::Request),
            &format!("{} request", label),
        )?;

        let mut responses = Vec::new();
        for (status, schema) in resolve_response_bodies(spec, &operation.responses, &config.content_type)? {
            let evaluator = ContractEvaluator::compile(
                context,
                schema,
                Direction::Response,
                config.evaluator_options(Direction::Response),
                &format!("{} response {}", label, status),
            )?;
            responses.push((status, evaluator));
        }

        tracing::debug!(
            operation = %label,
            responses = responses.len(),
            "compiled operation"
        );

        Ok(Self {
            template: template.to_string(),
            method,
            operation_id: operation.operation_id,
            parameters,
            body,
            required,
            request,
            responses,
        })
    }

    pub fn request_evaluator(&self) -> &ContractEvaluator {
        &self.request
    }

    /// The combined request schema (`{query, headers, params, cookies, body}`).
    pub fn request_schema(&self) -> &Value {
        self.request.schema()
    }

    /// Evaluator for an actual status code, if the contract describes one.
    pub fn response_evaluator(&self, status_code: u16) -> Option<&ContractEvaluator> {
        select_status(&self.responses, status_code)
    }

    /// Declared status keys with a JSON response schema.
    pub fn response_statuses(&self) -> impl Iterator<Item = &str> {
        self.responses.iter().map(|(status, _)| status.as_str())
    }
}

fn required_fields(parameters: &ParameterSchemas, body: &BodySchema) -> Vec<&'static str> {
    let mut required: Vec<&'static str> = ParameterLocation::ALL
        .into_iter()
        .filter(|location| {
            parameters.schema(*location)["required"]
                .as_array()
                .is_some_and(|r| !r.is_empty())
        })
        .map(|location| location.request_field())
        .collect();
    if body.is_required() {
        required.push("body");
    }
    required
}

fn request_schema(parameters: &ParameterSchemas, body: &BodySchema, required: &[&str]) -> Value {
    let mut properties = Map::new();
    for location in ParameterLocation::ALL {
        properties.insert(
            location.request_field().to_string(),
            parameters.schema(location).clone(),
        );
    }
    properties.insert("body".to_string(), body.validation_schema());

    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}
