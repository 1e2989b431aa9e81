//! Field normalization.
//!
//! Transports deliver parameters as strings. Before evaluation the
//! normalizer applies an operation's side-tables to turn them into the
//! shapes their schemas describe: JSON-decoded content parameters,
//! delimiter-split arrays, and single exploded values wrapped as arrays.
//! Nothing here looks at a schema.

use serde_json::{Map, Value};

use crate::error::ContractViolation;
use crate::params::{NormalizationTables, ParameterRef};
use crate::pipeline::RawRequest;

/// Normalize a raw request in place.
///
/// Header names are folded to lower case and a `cookie` header is split
/// into the cookie map when the transport supplied none. The side-tables
/// are then applied in order: JSON decoding, array splitting, explode
/// wrapping.
///
/// # Errors
///
/// Returns `ContractViolation::MalformedParameterEncoding` when a JSON
/// content parameter does not hold valid JSON.
pub fn normalize(
    tables: &NormalizationTables,
    request: &mut RawRequest,
) -> Result<(), ContractViolation> {
    fold_header_case(&mut request.headers);
    if request.cookies.is_empty() {
        if let Some(Value::String(header)) = request.headers.get("cookie") {
            request.cookies = parse_cookie_header(header);
        }
    }

    for entry in &tables.parse_json {
        decode_json(entry, request.location_mut(entry.location))?;
    }
    for entry in &tables.parse_array {
        if let Some(delimiter) = entry.delimiter {
            split_array(entry, delimiter, request.location_mut(entry.location));
        }
    }
    for entry in &tables.parse_array_explode {
        wrap_exploded(entry, request.location_mut(entry.location));
    }
    Ok(())
}

/// Lower-case every header name. On collisions the later value wins.
fn fold_header_case(headers: &mut Map<String, Value>) {
    if headers.keys().all(|k| !k.chars().any(|c| c.is_ascii_uppercase())) {
        return;
    }
    let folded: Map<String, Value> = std::mem::take(headers)
        .into_iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v))
        .collect();
    *headers = folded;
}

/// Split a `Cookie` header into `name -> value` pairs.
pub fn parse_cookie_header(header: &str) -> Map<String, Value> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let value = value.trim().trim_matches('"');
            Some((name.to_string(), Value::String(value.to_string())))
        })
        .collect()
}

fn decode_json(entry: &ParameterRef, fields: &mut Map<String, Value>) -> Result<(), ContractViolation> {
    let Some(Value::String(raw)) = fields.get(&entry.name) else {
        return Ok(());
    };
    let decoded: Value =
        serde_json::from_str(raw).map_err(|e| ContractViolation::MalformedParameterEncoding {
            location: entry.location.request_field().to_string(),
            name: entry.name.clone(),
            encoding: "JSON".to_string(),
            message: e.to_string(),
        })?;
    fields.insert(entry.name.clone(), decoded);
    Ok(())
}

// Empty raw values (`?tags=`) are left as they are.
fn split_array(entry: &ParameterRef, delimiter: &str, fields: &mut Map<String, Value>) {
    if let Some(Value::String(raw)) = fields.get(&entry.name) {
        if raw.is_empty() {
            return;
        }
        let items = raw
            .split(delimiter)
            .map(|item| Value::String(item.to_string()))
            .collect();
        fields.insert(entry.name.clone(), Value::Array(items));
    }
}

fn wrap_exploded(entry: &ParameterRef, fields: &mut Map<String, Value>) {
    if let Some(value) = fields.get_mut(&entry.name) {
        let empty = value.as_str().is_some_and(str::is_empty);
        if !value.is_array() && !value.is_null() && !empty {
            let single = value.take();
            *value = Value::Array(vec![single]);
        }
    }
}
