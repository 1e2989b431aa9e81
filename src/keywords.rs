//! Direction-specific keyword behaviors.
//!
//! `readOnly` and `writeOnly` are annotations to a plain JSON Schema
//! evaluator. The contract gives them teeth: a read-only field sent by a
//! client is stripped from the request, and a write-only field returned by
//! the server rejects the response.

use serde_json::{json, Value};

use crate::error::SchemaError;
use crate::types::Direction;

/// Outcome of applying a keyword to a present property.
#[derive(Debug, Clone, PartialEq)]
pub enum KeywordVerdict {
    /// Leave the property alone.
    Keep,
    /// Remove the property and record a non-fatal diagnostic.
    Strip(SchemaError),
    /// Reject the value.
    Reject(SchemaError),
}

/// The fixed set of contract keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKeyword {
    ReadOnly,
    WriteOnly,
}

impl ContractKeyword {
    /// Schema keyword name.
    pub fn name(&self) -> &'static str {
        match self {
            ContractKeyword::ReadOnly => "readOnly",
            ContractKeyword::WriteOnly => "writeOnly",
        }
    }

    /// The keyword enforced in a direction.
    pub fn for_direction(direction: Direction) -> Self {
        match direction {
            Direction::Request => ContractKeyword::ReadOnly,
            Direction::Response => ContractKeyword::WriteOnly,
        }
    }

    /// Apply the keyword to a property that is present in the data.
    ///
    /// `schema` is the (dereferenced) property schema, `path` the JSON
    /// pointer of the property and `name` its key in the parent object.
    pub fn apply(&self, schema: &Value, value: &Value, path: &str, name: &str) -> KeywordVerdict {
        let flagged = schema.get(self.name()) == Some(&Value::Bool(true));
        if !flagged {
            return KeywordVerdict::Keep;
        }

        match self {
            ContractKeyword::ReadOnly => KeywordVerdict::Strip(
                SchemaError::new(self.name(), path, "is read-only")
                    .with_params(json!({ "readOnly": name })),
            ),
            // Null write-only values pass.
            ContractKeyword::WriteOnly if value.is_null() => KeywordVerdict::Keep,
            ContractKeyword::WriteOnly => KeywordVerdict::Reject(
                SchemaError::new(self.name(), path, "is write-only")
                    .with_params(json!({ "writeOnly": name })),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_per_direction() {
        assert_eq!(
            ContractKeyword::for_direction(Direction::Request),
            ContractKeyword::ReadOnly
        );
        assert_eq!(
            ContractKeyword::for_direction(Direction::Response),
            ContractKeyword::WriteOnly
        );
    }

    #[test]
    fn read_only_strips_present_field() {
        let schema = json!({ "type": "integer", "readOnly": true });
        let verdict = ContractKeyword::ReadOnly.apply(&schema, &json!(7), "/body/id", "id");
        match verdict {
            KeywordVerdict::Strip(diagnostic) => {
                assert_eq!(diagnostic.keyword, "readOnly");
                assert_eq!(diagnostic.path, "/body/id");
                assert_eq!(diagnostic.params, json!({ "readOnly": "id" }));
            }
            other => panic!("expected strip, got {:?}", other),
        }
    }

    #[test]
    fn write_only_rejects_present_field() {
        let schema = json!({ "type": "string", "writeOnly": true });
        let verdict =
            ContractKeyword::WriteOnly.apply(&schema, &json!("x"), "/response/secret", "secret");
        assert!(matches!(verdict, KeywordVerdict::Reject(e) if e.message == "is write-only"));
    }

    #[test]
    fn unflagged_or_null_is_kept() {
        let schema = json!({ "type": "string" });
        assert_eq!(
            ContractKeyword::ReadOnly.apply(&schema, &json!("x"), "/body/a", "a"),
            KeywordVerdict::Keep
        );

        let schema = json!({ "writeOnly": true });
        assert_eq!(
            ContractKeyword::WriteOnly.apply(&schema, &Value::Null, "/response/a", "a"),
            KeywordVerdict::Keep
        );

        let schema = json!({ "readOnly": false });
        assert_eq!(
            ContractKeyword::ReadOnly.apply(&schema, &json!(1), "/body/a", "a"),
            KeywordVerdict::Keep
        );
    }

    #[test]
    fn read_only_strips_null_value() {
        let schema = json!({ "type": "integer", "readOnly": true });
        let verdict = ContractKeyword::ReadOnly.apply(&schema, &Value::Null, "/body/id", "id");
        assert!(matches!(verdict, KeywordVerdict::Strip(d) if d.path == "/body/id"));
    }

    #[test]
    fn keywords_only_react_to_their_own_flag() {
        let schema = json!({ "readOnly": true });
        assert_eq!(
            ContractKeyword::WriteOnly.apply(&schema, &json!(1), "/response/a", "a"),
            KeywordVerdict::Keep
        );
    }
}
