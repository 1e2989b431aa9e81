//! Specification loading from various sources.
//!
//! Loads an already-bundled OpenAPI document from files, strings, and HTTP
//! URLs. Local `#/...` pointers are left in place; they are resolved on
//! demand through [`navigate_fragment`].

use std::path::Path;

use serde_json::Value;

use crate::error::SpecError;
use crate::spec::Specification;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load a specification from a file path.
///
/// # Errors
///
/// Returns `SpecError::FileNotFound` if the file doesn't exist,
/// `SpecError::InvalidJson` if the file isn't valid JSON, or
/// `SpecError::InvalidSpec` if the document has no `paths`.
pub fn load_spec(path: &Path) -> Result<Specification, SpecError> {
    if !path.exists() {
        return Err(SpecError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| SpecError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_spec_str(&content)
}

/// Load a specification from a JSON string.
///
/// # Errors
///
/// Returns `SpecError::InvalidJson` if the string isn't valid JSON.
pub fn load_spec_str(content: &str) -> Result<Specification, SpecError> {
    let document: Value =
        serde_json::from_str(content).map_err(|source| SpecError::InvalidJson { source })?;
    Specification::from_value(document)
}

/// Load a specification from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `SpecError::NetworkError` if the request fails,
/// or `SpecError::InvalidJson` if the response isn't valid JSON.
#[cfg(feature = "remote")]
pub fn load_spec_url(url: &str) -> Result<Specification, SpecError> {
    let network_error = |source: reqwest::Error| SpecError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    // Check for HTTP errors before parsing
    let response = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .map_err(network_error)?;

    let content = response.text().map_err(network_error)?;
    load_spec_str(&content)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a specification from a file path or URL.
///
/// Automatically detects whether the source is a URL or file path.
/// URL loading requires the `remote` feature.
pub fn load_spec_auto(source: &str) -> Result<Specification, SpecError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_spec_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(SpecError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_spec(Path::new(source))
    }
}

/// Navigate a JSON Pointer fragment (e.g., "#/components/schemas/Pet").
///
/// Returns the value at the given JSON Pointer path within the document.
/// The fragment should start with '#'. Only local pointers are supported.
pub fn navigate_fragment<'a>(document: &'a Value, fragment: &str) -> Result<&'a Value, SpecError> {
    let unresolved = || SpecError::UnresolvedRef {
        reference: fragment.to_string(),
    };

    let Some(path) = fragment.strip_prefix('#') else {
        return Err(unresolved());
    };
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return Ok(document);
    }

    let mut current = document;
    for part in path.split('/') {
        // Unescape JSON Pointer encoding (~1 = /, ~0 = ~)
        let key = part.replace("~1", "/").replace("~0", "~");
        current = match current {
            Value::Object(map) => map.get(&key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
        .ok_or_else(unresolved)?;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"{"openapi": "3.0.0", "paths": {}}"#;

    #[test]
    fn load_spec_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", MINIMAL).unwrap();

        let spec = load_spec(file.path()).unwrap();
        assert_eq!(spec.paths().count(), 0);
    }

    #[test]
    fn load_spec_file_not_found() {
        let result = load_spec(Path::new("/nonexistent/openapi.json"));
        assert!(matches!(result, Err(SpecError::FileNotFound { .. })));
    }

    #[test]
    fn load_spec_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let result = load_spec(file.path());
        assert!(matches!(result, Err(SpecError::InvalidJson { .. })));
    }

    #[test]
    fn load_spec_str_without_paths() {
        let result = load_spec_str(r#"{"openapi": "3.0.0"}"#);
        assert!(matches!(result, Err(SpecError::InvalidSpec { .. })));
    }

    #[test]
    fn is_url_detection() {
        assert!(is_url("https://example.com/openapi.json"));
        assert!(is_url("http://example.com/openapi.json"));
        assert!(!is_url("/path/to/openapi.json"));
        assert!(!is_url("openapi.json"));
    }

    #[test]
    fn load_spec_auto_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", MINIMAL).unwrap();

        let spec = load_spec_auto(file.path().to_str().unwrap());
        assert!(spec.is_ok());
    }

    #[test]
    fn navigate_fragment_resolves_nested_keys() {
        let doc = json!({
            "components": { "schemas": { "Pet": { "type": "object" } } }
        });
        let pet = navigate_fragment(&doc, "#/components/schemas/Pet").unwrap();
        assert_eq!(pet, &json!({ "type": "object" }));
    }

    #[test]
    fn navigate_fragment_unescapes_segments() {
        let doc = json!({ "paths": { "/pets/{id}": { "get": {} } } });
        let op = navigate_fragment(&doc, "#/paths/~1pets~1{id}/get").unwrap();
        assert_eq!(op, &json!({}));
    }

    #[test]
    fn navigate_fragment_indexes_arrays() {
        let doc = json!({ "parameters": [{ "name": "a" }, { "name": "b" }] });
        let second = navigate_fragment(&doc, "#/parameters/1").unwrap();
        assert_eq!(second["name"], "b");
    }

    #[test]
    fn navigate_fragment_missing_target() {
        let doc = json!({ "components": {} });
        let result = navigate_fragment(&doc, "#/components/schemas/Missing");
        assert!(matches!(result, Err(SpecError::UnresolvedRef { .. })));
    }

    #[test]
    fn navigate_fragment_rejects_external_refs() {
        let doc = json!({});
        let result = navigate_fragment(&doc, "other.json#/Pet");
        assert!(matches!(result, Err(SpecError::UnresolvedRef { .. })));
    }

    #[cfg(feature = "remote")]
    mod remote {
        use super::*;

        #[test]
        fn load_spec_url_valid() {
            let mut server = mockito::Server::new();
            let mock = server
                .mock("GET", "/openapi.json")
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(MINIMAL)
                .create();

            let spec = load_spec_url(&format!("{}/openapi.json", server.url()));
            assert!(spec.is_ok());
            mock.assert();
        }

        #[test]
        fn load_spec_url_404() {
            let mut server = mockito::Server::new();
            server.mock("GET", "/missing.json").with_status(404).create();

            let result = load_spec_url(&format!("{}/missing.json", server.url()));
            assert!(matches!(result, Err(SpecError::NetworkError { .. })));
        }

        #[test]
        fn load_spec_auto_url() {
            let mut server = mockito::Server::new();
            server
                .mock("GET", "/openapi.json")
                .with_status(200)
                .with_body(MINIMAL)
                .create();

            let result = load_spec_auto(&format!("{}/openapi.json", server.url()));
            assert!(result.is_ok());
        }
    }
}
