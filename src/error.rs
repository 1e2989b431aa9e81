//! Error types for contract loading, compilation and validation.

use std::path::PathBuf;

use serde_json::{json, Value};
use thiserror::Error;

/// Errors while loading a specification document.
#[derive(Debug, Error)]
pub enum SpecError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid specification: {message}")]
    InvalidSpec { message: String },

    #[error("unresolved reference {reference}")]
    UnresolvedRef { reference: String },
}

impl SpecError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            SpecError::FileNotFound { .. } | SpecError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            SpecError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// A malformed parameter or body declaration.
///
/// Compilation errors are a property of the document, not of a request:
/// they abort startup (or the first use of an operation) and are never
/// retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("Parameter 'in' has incorrect value '{location}' for [{name}]")]
    UnknownLocation { name: String, location: String },

    #[error("No available parameter 'schema' or 'content' for [{name}]")]
    MissingParameterSchema { name: String },

    #[error("Parameter [{name}] declares both 'schema' and 'content'")]
    AmbiguousParameterSchema { name: String },

    #[error("Parameter 'style' has incorrect value '{style}' for [{name}]")]
    UnsupportedStyle { name: String, style: String },

    #[error("invalid declaration at {path}: {message}")]
    InvalidDeclaration { path: String, message: String },

    #[error("unresolved reference {reference}")]
    UnresolvedRef { reference: String },

    #[error("invalid path template {template}: {message}")]
    InvalidTemplate { template: String, message: String },

    #[error("invalid schema for {context}: {message}")]
    InvalidSchema { context: String, message: String },
}

impl CompileError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Single evaluation error with path context.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SchemaError {
    /// Schema keyword that rejected the value (e.g. `required`, `writeOnly`).
    pub keyword: String,
    /// JSON Pointer (RFC 6901) to the offending field.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
    /// Keyword-specific details, such as the allowed values of an enum.
    #[serde(skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

impl SchemaError {
    pub fn new(keyword: impl Into<String>, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            path: path.into(),
            message: message.into(),
            params: Value::Null,
        }
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Render a list of errors the way they are shown to clients.
///
/// Pointers are rendered as dotted paths rooted at `data_var`
/// (`/body/name` becomes `request.body.name`).
pub fn errors_text(errors: &[SchemaError], data_var: &str) -> String {
    errors
        .iter()
        .map(|e| format!("{} {}", dotted_path(data_var, &e.path), e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

fn dotted_path(data_var: &str, pointer: &str) -> String {
    let mut out = data_var.to_string();
    for segment in pointer.split('/').skip(1) {
        if !out.is_empty() {
            out.push('.');
        }
        out.push_str(&segment.replace("~1", "/").replace("~0", "~"));
    }
    out
}

/// A per-exchange failure.
///
/// Every variant maps to an HTTP status and a client-facing message; the
/// pipeline turns them into a uniform `{body, statusCode}` result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractViolation {
    #[error("The path {path} could not be found with http method {method} in the API spec")]
    RouteNotFound { method: String, path: String },

    #[error("{0}")]
    SchemaCompilation(#[from] CompileError),

    #[error("{location}.{name} is not valid {encoding}: {message}")]
    MalformedParameterEncoding {
        location: String,
        name: String,
        encoding: String,
        message: String,
    },

    #[error("unsupported media type {media_type}")]
    UnsupportedMediaType { media_type: String },

    #[error("{}", errors_text(errors, "request"))]
    RequestContract { errors: Vec<SchemaError> },

    #[error("{}", errors_text(errors, ""))]
    ResponseContract { errors: Vec<SchemaError> },

    #[error("{message}")]
    Handler { status_code: u16, message: String },

    #[error("{message}")]
    MalformedHandlerResult { message: String },
}

impl ContractViolation {
    /// HTTP status surfaced to the client.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::RouteNotFound { .. }
            | Self::MalformedParameterEncoding { .. }
            | Self::RequestContract { .. } => 400,
            Self::UnsupportedMediaType { .. } => 415,
            Self::Handler { status_code, .. } => *status_code,
            Self::SchemaCompilation(_)
            | Self::ResponseContract { .. }
            | Self::MalformedHandlerResult { .. } => 500,
        }
    }

    /// True for violations caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Body sent to the client: `{"message": ...}`.
    pub fn to_body(&self) -> Value {
        json!({ "message": self.to_string() })
    }

    /// Evaluation errors behind a contract violation, if any.
    pub fn errors(&self) -> &[SchemaError] {
        match self {
            Self::RequestContract { errors } | Self::ResponseContract { errors } => errors,
            _ => &[],
        }
    }
}
