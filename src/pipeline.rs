//! The validation pipeline for one request/response exchange.
//!
//! ```text
//! ROUTING -> REQUEST_NORMALIZE -> REQUEST_VALIDATE -> HANDLER_INVOKE
//!         -> RESPONSE_NORMALIZE -> RESPONSE_VALIDATE -> DONE
//! ```
//!
//! Any stage before `DONE` may end the exchange with a
//! [`ContractViolation`]; [`ContractValidator::handle_exchange`] turns it
//! into the same `{body, statusCode}` shape as a successful result.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::body::BodySchema;
use crate::cache::{OperationCache, OperationKey};
use crate::error::{CompileError, ContractViolation, SchemaError};
use crate::evaluator::SchemaContext;
use crate::matcher::{PathMatcher, RouteMatch};
use crate::normalizer::normalize;
use crate::operation::CompiledOperation;
use crate::spec::Specification;
use crate::types::{ParameterLocation, ValidatorConfig};

/// A request as delivered by the transport.
///
/// Parameter values are typically strings; `body` is `null` when the
/// request has none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRequest {
    pub method: String,
    pub path: String,
    pub body: Value,
    pub query: Map<String, Value>,
    pub headers: Map<String, Value>,
    pub params: Map<String, Value>,
    pub cookies: Map<String, Value>,
}

impl RawRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: Value) -> Self {
        self.query.insert(name.into(), value);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: Value) -> Self {
        self.headers.insert(name.into(), value);
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// Mutable field map for a parameter location.
    pub fn location_mut(&mut self, location: ParameterLocation) -> &mut Map<String, Value> {
        match location {
            ParameterLocation::Query => &mut self.query,
            ParameterLocation::Header => &mut self.headers,
            ParameterLocation::Path => &mut self.params,
            ParameterLocation::Cookie => &mut self.cookies,
        }
    }

    /// Move the validated fields out into the evaluated document.
    fn take_document(&mut self) -> Value {
        let mut document = Map::new();
        document.insert("query".into(), Value::Object(std::mem::take(&mut self.query)));
        document.insert("headers".into(), Value::Object(std::mem::take(&mut self.headers)));
        document.insert("params".into(), Value::Object(std::mem::take(&mut self.params)));
        document.insert("cookies".into(), Value::Object(std::mem::take(&mut self.cookies)));
        if !self.body.is_null() {
            document.insert("body".into(), self.body.take());
        }
        Value::Object(document)
    }

    /// Reassign fields from an evaluated document.
    fn restore_document(&mut self, document: Value) {
        let Value::Object(mut document) = document else {
            return;
        };
        let mut field = |name: &str| match document.remove(name) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        self.query = field("query");
        self.headers = field("headers");
        self.params = field("params");
        self.cookies = field("cookies");
        self.body = document.remove("body").unwrap_or(Value::Null);
    }
}

/// A request that passed the request phase.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    /// The request with normalized, coerced and filtered fields.
    pub request: RawRequest,
    pub route: RouteMatch,
    /// Non-fatal findings such as stripped read-only properties.
    pub diagnostics: Vec<SchemaError>,
    operation: Option<Arc<CompiledOperation>>,
}

/// What a handler returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub body: Value,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HandlerResponse {
    pub fn new(status_code: u16, body: Value) -> Self {
        Self {
            body,
            status_code,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Read a handler result from loosely typed JSON.
    ///
    /// # Errors
    ///
    /// Returns `ContractViolation::MalformedHandlerResult` unless `value` is
    /// an object with a `body` and an integer `statusCode`.
    pub fn from_value(value: Value) -> Result<Self, ContractViolation> {
        let malformed = |message: &str| ContractViolation::MalformedHandlerResult {
            message: message.to_string(),
        };

        let Value::Object(mut fields) = value else {
            return Err(malformed("handler result must be an object"));
        };
        let body = fields
            .remove("body")
            .ok_or_else(|| malformed("handler result is missing 'body'"))?;
        let status_code = fields
            .get("statusCode")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok())
            .filter(|code| (100..600).contains(code))
            .ok_or_else(|| malformed("handler result is missing a valid 'statusCode'"))?;
        let message = fields
            .get("message")
            .and_then(Value::as_str)
            .map(String::from);

        Ok(Self {
            body,
            status_code,
            message,
        })
    }
}

/// Failure signaled by a handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    pub message: String,
    /// Status to surface; 500 when unset.
    pub status_code: Option<u16>,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }
}

/// Rewrites one validated request field before the handler sees it.
pub type FieldTransformer<T> = Box<dyn Fn(T) -> T + Send + Sync>;

/// Optional post-validation rewrites of `body`, `params` and `query`.
#[derive(Default)]
struct RequestTransformers {
    body: Option<FieldTransformer<Value>>,
    params: Option<FieldTransformer<Map<String, Value>>>,
    query: Option<FieldTransformer<Map<String, Value>>>,
}

impl RequestTransformers {
    /// An absent body is handed to the body transformer as `{}`.
    fn apply(&self, request: &mut RawRequest) {
        if let Some(transform) = &self.body {
            let body = match request.body.take() {
                Value::Null => Value::Object(Map::new()),
                body => body,
            };
            request.body = transform(body);
        }
        if let Some(transform) = &self.params {
            request.params = transform(std::mem::take(&mut request.params));
        }
        if let Some(transform) = &self.query {
            request.query = transform(std::mem::take(&mut request.query));
        }
    }
}

impl std::fmt::Debug for RequestTransformers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestTransformers")
            .field("body", &self.body.is_some())
            .field("params", &self.params.is_some())
            .field("query", &self.query.is_some())
            .finish()
    }
}

/// The request handler invoked between the two validation phases.
///
/// Implemented for any `Fn(RawRequest) -> impl Future<Output = ...>`.
pub trait Handler {
    fn invoke(&self, request: RawRequest) -> impl Future<Output = Result<HandlerResponse, HandlerError>>;
}

impl<F, Fut> Handler for F
where
    F: Fn(RawRequest) -> Fut,
    Fut: Future<Output = Result<HandlerResponse, HandlerError>>,
{
    fn invoke(&self, request: RawRequest) -> impl Future<Output = Result<HandlerResponse, HandlerError>> {
        self(request)
    }
}

/// Final `{body, statusCode}` of an exchange, success or failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeResult {
    pub body: Value,
    pub status_code: u16,
    /// The violation behind a failed exchange; not part of the wire shape.
    #[serde(skip)]
    pub violation: Option<ContractViolation>,
}

impl ExchangeResult {
    pub fn new(status_code: u16, body: Value) -> Self {
        Self {
            body,
            status_code,
            violation: None,
        }
    }

    pub fn from_violation(violation: ContractViolation) -> Self {
        Self {
            body: violation.to_body(),
            status_code: violation.status_code(),
            violation: Some(violation),
        }
    }

    pub fn is_violation(&self) -> bool {
        self.violation.is_some()
    }
}

/// States of the exchange state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Routing,
    RequestNormalize,
    RequestValidate,
    HandlerInvoke,
    ResponseNormalize,
    ResponseValidate,
    Done,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Routing => "ROUTING",
            PipelineStage::RequestNormalize => "REQUEST_NORMALIZE",
            PipelineStage::RequestValidate => "REQUEST_VALIDATE",
            PipelineStage::HandlerInvoke => "HANDLER_INVOKE",
            PipelineStage::ResponseNormalize => "RESPONSE_NORMALIZE",
            PipelineStage::ResponseValidate => "RESPONSE_VALIDATE",
            PipelineStage::Done => "DONE",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validates exchanges against one specification.
#[derive(Debug)]
pub struct ContractValidator {
    context: SchemaContext,
    matcher: PathMatcher,
    config: ValidatorConfig,
    cache: Arc<OperationCache>,
    transformers: RequestTransformers,
}

impl ContractValidator {
    /// Create a validator with its own operation cache.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::InvalidTemplate` for malformed path templates.
    pub fn new(spec: Specification, config: ValidatorConfig) -> Result<Self, CompileError> {
        Self::with_cache(spec, config, Arc::new(OperationCache::new()))
    }

    /// Create a validator around an explicit cache.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::InvalidTemplate` for malformed path templates.
    pub fn with_cache(
        spec: Specification,
        config: ValidatorConfig,
        cache: Arc<OperationCache>,
    ) -> Result<Self, CompileError> {
        let matcher = PathMatcher::new(&spec)?;
        tracing::debug!(templates = matcher.len(), "path matcher ready");
        Ok(Self {
            context: SchemaContext::new(Arc::new(spec)),
            matcher,
            config,
            cache,
            transformers: RequestTransformers::default(),
        })
    }

    /// Rewrite the validated body before the handler is invoked.
    pub fn with_body_transformer<F>(mut self, transform: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.transformers.body = Some(Box::new(transform));
        self
    }

    /// Rewrite the validated path parameters before the handler is invoked.
    pub fn with_path_transformer<F>(mut self, transform: F) -> Self
    where
        F: Fn(Map<String, Value>) -> Map<String, Value> + Send + Sync + 'static,
    {
        self.transformers.params = Some(Box::new(transform));
        self
    }

    /// Rewrite the validated query before the handler is invoked.
    pub fn with_query_transformer<F>(mut self, transform: F) -> Self
    where
        F: Fn(Map<String, Value>) -> Map<String, Value> + Send + Sync + 'static,
    {
        self.transformers.query = Some(Box::new(transform));
        self
    }

    pub fn spec(&self) -> &Specification {
        self.context.spec()
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<OperationCache> {
        &self.cache
    }

    /// Compile every declared operation now instead of on first use.
    ///
    /// Returns the number of operations compiled.
    ///
    /// # Errors
    ///
    /// Returns the first `CompileError` encountered.
    pub fn compile_all(&self) -> Result<usize, CompileError> {
        let spec = self.spec();
        let mut count = 0;
        for (template, _) in spec.paths() {
            for method in spec.methods(template) {
                self.compiled(template, method)?;
                count += 1;
            }
        }
        Ok(count)
    }

    /// Compiled operation for a template and method, from the cache.
    ///
    /// # Errors
    ///
    /// Returns the operation's `CompileError`.
    pub fn compiled(&self, template: &str, method: &str) -> Result<Arc<CompiledOperation>, CompileError> {
        self.cache.get_or_build(OperationKey::new(template, method), || {
            CompiledOperation::build(&self.context, template, method, &self.config)
        })
    }

    /// Resolve method + path to a declared operation.
    ///
    /// # Errors
    ///
    /// Returns `ContractViolation::RouteNotFound` when nothing matches.
    pub fn route(&self, method: &str, path: &str) -> Result<RouteMatch, ContractViolation> {
        let route = self
            .matcher
            .find(method, path)
            .ok_or_else(|| ContractViolation::RouteNotFound {
                method: method.to_string(),
                path: path.to_string(),
            })?;
        tracing::debug!(
            stage = %PipelineStage::Routing,
            method = %route.method,
            template = %route.template,
            "matched route"
        );
        Ok(route)
    }

    fn operation(&self, route: &RouteMatch) -> Result<Arc<CompiledOperation>, ContractViolation> {
        self.compiled(&route.template, &route.method).map_err(|e| {
            tracing::error!(
                method = %route.method,
                template = %route.template,
                error = %e,
                "operation failed to compile"
            );
            ContractViolation::SchemaCompilation(e)
        })
    }

    /// Run the request phase: route, normalize, validate.
    ///
    /// On success the returned request carries the normalized, coerced and
    /// filtered fields. On failure the input request is dropped, so no
    /// partially filtered value escapes.
    ///
    /// # Errors
    ///
    /// Returns the `ContractViolation` that ended the phase.
    pub fn validate_request(&self, request: RawRequest) -> Result<ValidatedRequest, ContractViolation> {
        let mut stage = PipelineStage::Routing;
        self.request_phase(request, &mut stage)
    }

    /// Request phase, recording in `stage` the last stage entered.
    fn request_phase(
        &self,
        mut request: RawRequest,
        stage: &mut PipelineStage,
    ) -> Result<ValidatedRequest, ContractViolation> {
        *stage = PipelineStage::Routing;
        let route = self.route(&request.method, &request.path)?;
        if request.params.is_empty() {
            request.params = route.params.clone();
        }

        if !self.config.validate_requests {
            return Ok(ValidatedRequest {
                request,
                route,
                diagnostics: Vec::new(),
                operation: None,
            });
        }

        *stage = PipelineStage::RequestNormalize;
        let operation = self.operation(&route)?;

        tracing::debug!(stage = %PipelineStage::RequestNormalize, "normalizing request");
        normalize(&operation.parameters.tables, &mut request)?;

        *stage = PipelineStage::RequestValidate;
        if let BodySchema::Unsupported { media_type, required } = &operation.body {
            if *required || !request.body.is_null() {
                return Err(ContractViolation::UnsupportedMediaType {
                    media_type: media_type.clone(),
                });
            }
        }

        tracing::debug!(stage = %PipelineStage::RequestValidate, "validating request");
        let mut document = request.take_document();
        let evaluation = operation.request_evaluator().evaluate(&mut document);
        if !evaluation.is_valid() {
            return Err(ContractViolation::RequestContract {
                errors: evaluation.errors,
            });
        }
        request.restore_document(document);

        Ok(ValidatedRequest {
            request,
            route,
            diagnostics: evaluation.diagnostics,
            operation: Some(operation),
        })
    }

    /// Run the response phase for a handler result.
    ///
    /// Statuses the contract does not describe pass through unchanged. A
    /// string body holding JSON is parsed for validation and serialized
    /// again afterwards.
    ///
    /// # Errors
    ///
    /// Returns `ContractViolation::ResponseContract` when the body breaks
    /// the declared schema.
    pub fn validate_response(
        &self,
        operation: &CompiledOperation,
        status_code: u16,
        body: Value,
    ) -> Result<Value, ContractViolation> {
        let Some(evaluator) = operation.response_evaluator(status_code) else {
            tracing::debug!(status_code, "no response schema declared; passing through");
            return Ok(body);
        };

        tracing::debug!(stage = %PipelineStage::ResponseNormalize, status_code, "normalizing response");
        let (payload, serialized) = match body {
            Value::String(text) => match serde_json::from_str::<Value>(&text) {
                Ok(parsed) if parsed.is_object() || parsed.is_array() => (parsed, true),
                _ => (Value::String(text), false),
            },
            other => (other, false),
        };

        tracing::debug!(stage = %PipelineStage::ResponseValidate, status_code, "validating response");
        let mut document = json!({ "response": payload });
        let evaluation = evaluator.evaluate(&mut document);
        if !evaluation.is_valid() {
            return Err(ContractViolation::ResponseContract {
                errors: evaluation.errors,
            });
        }

        let filtered = document
            .as_object_mut()
            .and_then(|d| d.remove("response"))
            .unwrap_or(Value::Null);
        if serialized {
            return Ok(Value::String(filtered.to_string()));
        }
        Ok(filtered)
    }

    /// Run a full exchange through the pipeline.
    ///
    /// Always produces a result: violations become their `{message}` body
    /// and status code.
    pub async fn handle_exchange<H>(&self, request: RawRequest, handler: &H) -> ExchangeResult
    where
        H: Handler,
    {
        let method = request.method.clone();
        let path = request.path.clone();
        let mut stage = PipelineStage::Routing;

        match self.run_exchange(request, handler, &mut stage).await {
            Ok(result) => result,
            Err(violation) => {
                tracing::info!(
                    %stage,
                    %method,
                    %path,
                    status_code = violation.status_code(),
                    error = %violation,
                    "exchange failed"
                );
                ExchangeResult::from_violation(violation)
            }
        }
    }

    async fn run_exchange<H>(
        &self,
        request: RawRequest,
        handler: &H,
        stage: &mut PipelineStage,
    ) -> Result<ExchangeResult, ContractViolation>
    where
        H: Handler,
    {
        let validated = self.request_phase(request, stage)?;
        let mut request = validated.request;
        self.transformers.apply(&mut request);

        *stage = PipelineStage::HandlerInvoke;
        let response = handler
            .invoke(request)
            .await
            .map_err(|e| ContractViolation::Handler {
                status_code: e.status_code.unwrap_or(500),
                message: e.message,
            })?;

        if response.status_code >= 400 && response.body.is_null() {
            if let Some(message) = response.message {
                return Ok(ExchangeResult::new(
                    response.status_code,
                    json!({ "message": message }),
                ));
            }
        }

        if !self.config.validate_responses {
            *stage = PipelineStage::Done;
            return Ok(ExchangeResult::new(response.status_code, response.body));
        }

        *stage = PipelineStage::ResponseNormalize;
        let operation = match validated.operation {
            Some(operation) => operation,
            None => self.operation(&validated.route)?,
        };
        *stage = PipelineStage::ResponseValidate;
        let body = self.validate_response(&operation, response.status_code, response.body)?;

        *stage = PipelineStage::Done;
        Ok(ExchangeResult::new(response.status_code, body))
    }
}
