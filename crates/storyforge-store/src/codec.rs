//! JSON encoding of field maps

use crate::StoreError;
use serde_json::{Map, Value};
use storyforge_domain::{FieldMap, FieldValue};

pub(crate) fn encode(fields: &FieldMap) -> String {
    let object: Map<String, Value> = fields
        .iter()
        .map(|(name, value)| {
            let json = match value {
                FieldValue::Text(s) => Value::String(s.clone()),
                FieldValue::Integer(n) => Value::from(*n),
                FieldValue::Null => Value::Null,
            };
            (name.clone(), json)
        })
        .collect();
    Value::Object(object).to_string()
}

pub(crate) fn decode(raw: &str) -> Result<FieldMap, StoreError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| StoreError::InvalidData(format!("stored fields are not JSON: {}", e)))?;
    let Value::Object(object) = value else {
        return Err(StoreError::InvalidData("stored fields are not an object".to_string()));
    };

    object
        .into_iter()
        .map(|(name, json)| {
            let value = match json {
                Value::String(s) => FieldValue::Text(s),
                Value::Null => FieldValue::Null,
                Value::Number(n) => n.as_i64().map(FieldValue::Integer).ok_or_else(|| {
                    StoreError::InvalidData(format!("field '{}' is not an integer", name))
                })?,
                other => {
                    return Err(StoreError::InvalidData(format!(
                        "field '{}' has unsupported value {}",
                        name, other
                    )))
                }
            };
            Ok((name, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let mut fields = FieldMap::new();
        fields.insert("title".into(), "Login".into());
        fields.insert("story_points".into(), FieldValue::Integer(5));
        fields.insert("missing".into(), FieldValue::Null);

        let decoded = decode(&encode(&fields)).unwrap();
        assert_eq!(decoded, fields);
    }

    #[test]
    fn test_decode_rejects_floats_and_arrays() {
        assert!(decode(r#"{"x": 1.5}"#).is_err());
        assert!(decode(r#"{"x": [1]}"#).is_err());
        assert!(decode("[]").is_err());
    }
}
