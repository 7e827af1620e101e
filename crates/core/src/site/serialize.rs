//! Decoding of text-encoded site fields.
//!
//! `domains` and `localized_error_documents` are stored as JSON text by some
//! persistence backends; these helpers turn them back into structured values.

use serde::de::DeserializeOwned;

use crate::Error;
use crate::ports::FieldValue;

/// Decode a serialized field. Blank text decodes to the empty value.
pub fn decode<T>(field: &str, text: &str) -> Result<T, Error>
where
    T: DeserializeOwned + Default,
{
    if text.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(text).map_err(|e| Error::Serialization(format!("{field}: {e}")))
}

/// Take a structured value as-is, or decode its serialized form.
pub fn resolve<T>(field: &str, value: FieldValue<T>) -> Result<T, Error>
where
    T: DeserializeOwned + Default,
{
    match value {
        FieldValue::Value(v) => Ok(v),
        FieldValue::Serialized(text) => decode(field, &text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_decode_domains() {
        let domains: Vec<String> = decode("domains", r#"["example.com","www.example.com"]"#).unwrap();
        assert_eq!(domains, vec!["example.com", "www.example.com"]);
    }

    #[test]
    fn test_decode_blank_is_empty() {
        let domains: Vec<String> = decode("domains", "  ").unwrap();
        assert!(domains.is_empty());
    }

    #[test]
    fn test_decode_invalid_names_field() {
        let err = decode::<BTreeMap<String, String>>("localized_error_documents", "{broken").unwrap_err();
        assert!(matches!(&err, Error::Serialization(msg) if msg.starts_with("localized_error_documents")));
    }

    #[test]
    fn test_resolve_passes_values_through() {
        let value = FieldValue::Value(vec!["a.com".to_string()]);
        assert_eq!(resolve("domains", value).unwrap(), vec!["a.com"]);
    }
}
