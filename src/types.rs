//! Core types shared by the contract validation engine.

use serde::{Deserialize, Serialize};

/// Media type validated by default.
pub const TYPE_JSON: &str = "application/json";

/// HTTP methods an OpenAPI path item may declare operations for.
pub const HTTP_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Whether a media type carries JSON (`application/json` or a `+json` suffix).
pub fn is_json_media_type(media_type: &str) -> bool {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == TYPE_JSON || (essence.starts_with("application/") && essence.ends_with("+json"))
}

/// Direction of an exchange being validated.
///
/// Determines which of `readOnly` / `writeOnly` is enforced and which
/// additional-properties policy applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Request,
    Response,
}

impl Direction {
    /// Name of the root value in formatted error messages.
    pub fn data_var(&self) -> &'static str {
        match self {
            Direction::Request => "request",
            Direction::Response => "response",
        }
    }
}

/// Where a parameter is carried in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    Cookie,
}

impl ParameterLocation {
    /// All locations, in the order location schemas are emitted.
    pub const ALL: [ParameterLocation; 4] = [
        ParameterLocation::Query,
        ParameterLocation::Header,
        ParameterLocation::Path,
        ParameterLocation::Cookie,
    ];

    /// Parse the value of a parameter's `in` field.
    ///
    /// Returns `None` for unknown values (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "query" => Some(ParameterLocation::Query),
            "header" => Some(ParameterLocation::Header),
            "path" => Some(ParameterLocation::Path),
            "cookie" => Some(ParameterLocation::Cookie),
            _ => None,
        }
    }

    /// Name of the request field holding values for this location.
    pub fn request_field(&self) -> &'static str {
        match self {
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "headers",
            ParameterLocation::Path => "params",
            ParameterLocation::Cookie => "cookies",
        }
    }

    /// Serialization style assumed when a parameter declares none.
    pub fn default_style(&self) -> &'static str {
        match self {
            ParameterLocation::Query | ParameterLocation::Cookie => "form",
            ParameterLocation::Path | ParameterLocation::Header => "simple",
        }
    }
}

/// Resolved configuration for a validator instance.
///
/// Keys deserialize from camelCase (`validateResponses`, `coerceTypes`, ...)
/// so a JSON config file reads like the middleware options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidatorConfig {
    pub validate_requests: bool,
    pub validate_responses: bool,
    pub remove_additional_request_properties: bool,
    pub remove_additional_response_properties: bool,
    pub coerce_types: bool,
    pub use_defaults: bool,
    pub content_type: String,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            validate_requests: true,
            validate_responses: false,
            remove_additional_request_properties: false,
            remove_additional_response_properties: false,
            coerce_types: true,
            use_defaults: false,
            content_type: TYPE_JSON.to_string(),
        }
    }
}

impl ValidatorConfig {
    /// Configuration with request validation and type coercion enabled.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate_requests(mut self, enabled: bool) -> Self {
        self.validate_requests = enabled;
        self
    }

    pub fn validate_responses(mut self, enabled: bool) -> Self {
        self.validate_responses = enabled;
        self
    }

    /// Strip undeclared properties from requests.
    pub fn remove_additional_request_properties(mut self, enabled: bool) -> Self {
        self.remove_additional_request_properties = enabled;
        self
    }

    /// Strip undeclared properties from responses.
    pub fn remove_additional_response_properties(mut self, enabled: bool) -> Self {
        self.remove_additional_response_properties = enabled;
        self
    }

    pub fn coerce_types(mut self, enabled: bool) -> Self {
        self.coerce_types = enabled;
        self
    }

    pub fn use_defaults(mut self, enabled: bool) -> Self {
        self.use_defaults = enabled;
        self
    }

    /// Media type looked up in `content` maps. Lower-cased for matching.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into().to_ascii_lowercase();
        self
    }

    /// Evaluator options for one direction of the exchange.
    pub fn evaluator_options(&self, direction: Direction) -> EvaluatorOptions {
        EvaluatorOptions {
            coerce_types: self.coerce_types,
            use_defaults: self.use_defaults,
            remove_additional: match direction {
                Direction::Request => self.remove_additional_request_properties,
                Direction::Response => self.remove_additional_response_properties,
            },
        }
    }
}

/// Per-direction knobs applied by the contract evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EvaluatorOptions {
    pub coerce_types: bool,
    pub use_defaults: bool,
    pub remove_additional: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn direction_data_var() {
        assert_eq!(Direction::Request.data_var(), "request");
        assert_eq!(Direction::Response.data_var(), "response");
    }

    #[test]
    fn location_parse_valid() {
        assert_eq!(ParameterLocation::parse("query"), Some(ParameterLocation::Query));
        assert_eq!(ParameterLocation::parse("header"), Some(ParameterLocation::Header));
        assert_eq!(ParameterLocation::parse("path"), Some(ParameterLocation::Path));
        assert_eq!(ParameterLocation::parse("cookie"), Some(ParameterLocation::Cookie));
    }

    #[test]
    fn location_parse_invalid() {
        assert_eq!(ParameterLocation::parse("body"), None);
        assert_eq!(ParameterLocation::parse("Query"), None);
        assert_eq!(ParameterLocation::parse(""), None);
    }

    #[test]
    fn location_request_fields() {
        let fields: Vec<_> = ParameterLocation::ALL
            .iter()
            .map(|l| l.request_field())
            .collect();
        assert_eq!(fields, vec!["query", "headers", "params", "cookies"]);
    }

    #[test]
    fn json_media_types() {
        assert!(is_json_media_type("application/json"));
        assert!(is_json_media_type("application/json; charset=utf-8"));
        assert!(is_json_media_type("application/problem+json"));
        assert!(!is_json_media_type("text/plain"));
        assert!(!is_json_media_type("application/xml"));
    }

    #[test]
    fn config_deserializes_camel_case() {
        let config: ValidatorConfig = serde_json::from_value(json!({
            "validateResponses": true,
            "removeAdditionalRequestProperties": true,
            "coerceTypes": false
        }))
        .unwrap();

        assert!(config.validate_requests);
        assert!(config.validate_responses);
        assert!(config.remove_additional_request_properties);
        assert!(!config.remove_additional_response_properties);
        assert!(!config.coerce_types);
        assert_eq!(config.content_type, TYPE_JSON);
    }

    #[test]
    fn evaluator_options_follow_direction() {
        let config = ValidatorConfig::new()
            .remove_additional_request_properties(true)
            .use_defaults(true);

        let request = config.evaluator_options(Direction::Request);
        assert!(request.remove_additional);
        assert!(request.use_defaults);
        assert!(request.coerce_types);

        let response = config.evaluator_options(Direction::Response);
        assert!(!response.remove_additional);
    }
}
