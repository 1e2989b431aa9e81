//! OpenAPI v3 contract validation
//!
//! Validates request/response exchanges against an OpenAPI v3 document and
//! filters them to match the contract before they reach, or leave, a
//! request handler.
//!
//! # Example
//!
//! ```
//! use oas_contract::{load_spec_str, ContractValidator, RawRequest, ValidatorConfig};
//! use serde_json::json;
//!
//! let spec = load_spec_str(r#"{
//!     "paths": {
//!         "/pets/{id}": {
//!             "get": {
//!                 "parameters": [
//!                     { "name": "id", "in": "path", "required": true, "schema": { "type": "integer" } }
//!                 ],
//!                 "responses": {}
//!             }
//!         }
//!     }
//! }"#).unwrap();
//!
//! let validator = ContractValidator::new(spec, ValidatorConfig::default()).unwrap();
//! let validated = validator.validate_request(RawRequest::new("GET", "/pets/42")).unwrap();
//!
//! // The path parameter was extracted and coerced to the declared type
//! assert_eq!(validated.request.params["id"], json!(42));
//! ```
//!
//! # Directions
//!
//! | Direction | Keyword enforced | Effect |
//! |-----------|------------------|--------|
//! | request | `readOnly` | Field is stripped, diagnostic recorded |
//! | response | `writeOnly` | Response is rejected (500) |
//!
//! # Errors
//!
//! | Violation | Status |
//! |-----------|--------|
//! | `RouteNotFound` | 400 |
//! | `MalformedParameterEncoding` | 400 |
//! | `RequestContract` | 400 |
//! | `UnsupportedMediaType` | 415 |
//! | `ResponseContract` | 500 |
//! | `Handler` | handler's status, default 500 |
//! | `MalformedHandlerResult` | 500 |
//! | `SchemaCompilation` | 500 |

mod body;
mod cache;
mod coerce;
mod error;
mod evaluator;
mod keywords;
mod linter;
mod loader;
mod matcher;
mod normalizer;
mod operation;
mod params;
mod pipeline;
mod spec;
mod types;

pub use body::{
    resolve_request_body, resolve_response_bodies, response_wrapper, select_status, BodySchema,
};
pub use cache::{OperationCache, OperationKey};
pub use coerce::{coerce_value, declared_types};
pub use error::{errors_text, CompileError, ContractViolation, SchemaError, SpecError};
pub use evaluator::{prepare_schema, ContractEvaluator, Evaluation, SchemaContext, DISABLED_KEYWORDS};
pub use keywords::{ContractKeyword, KeywordVerdict};
pub use linter::{
    lint, lint_source, Diagnostic, LintResult, OperationResult, OperationStatus, Severity,
};
pub use loader::{is_url, load_spec, load_spec_auto, load_spec_str, navigate_fragment};
pub use matcher::{PathMatcher, RouteMatch};
pub use normalizer::{normalize, parse_cookie_header};
pub use operation::CompiledOperation;
pub use params::{
    compile_parameters, merge_parameters, NormalizationTables, ParameterRef, ParameterSchemas,
};
pub use pipeline::{
    ContractValidator, ExchangeResult, FieldTransformer, Handler, HandlerError, HandlerResponse,
    PipelineStage, RawRequest, ValidatedRequest,
};
pub use spec::{media_type_schema, Operation, Parameter, RequestBody, Response, Specification};
pub use types::{
    is_json_media_type, Direction, EvaluatorOptions, ParameterLocation,
    ValidatorConfig, HTTP_METHODS, TYPE_JSON,
};

#[cfg(feature = "remote")]
pub use loader::load_spec_url;
