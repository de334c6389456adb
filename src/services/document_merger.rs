//! Embeds a signature into the original, non-canonicalized document.

use serde_json::value::to_raw_value;
use serde_json::Value;

use crate::domain::constants;
use crate::domain::document::SignatureEntry;
use crate::domain::json::{JsonKind, RawObject};
use crate::infra::error::{SigningError, SigningResult};

/// Return `document` with `signatures` set to a single issuer entry.
///
/// An existing `signatures` key is replaced. Key order of the remaining
/// fields is untouched; a newly added key goes last.
pub fn merge(document: Value, signature: &str) -> SigningResult<Value> {
    let Value::Object(mut fields) = document else {
        return Err(SigningError::InvalidDocumentFormat(format!(
            "a signed document must be a JSON object, got {}",
            JsonKind::of_value(&document)
        )));
    };
    let entry = serde_json::to_value(SignatureEntry::issuer(signature))?;
    fields.insert(constants::SIGNATURES_KEY.to_string(), Value::Array(vec![entry]));
    Ok(Value::Object(fields))
}

/// [`merge`] over a document that keeps its source text.
pub fn merge_fields(mut document: RawObject, signature: &str) -> SigningResult<RawObject> {
    let entries = to_raw_value(&[SignatureEntry::issuer(signature)])?;
    document.insert(constants::SIGNATURES_KEY, entries);
    Ok(document)
}

/// Text form of [`merge_fields`]. Member values are copied verbatim.
pub fn merge_text(document: &str, signature: &str) -> SigningResult<String> {
    merge_fields(RawObject::parse(document)?, signature)?.to_json_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn adds_issuer_signature() {
        let merged = merge(json!({"key": "value"}), "signatureValue").unwrap();
        assert_eq!(
            merged,
            json!({"key":"value","signatures":[{"signatureType":"I","value":"signatureValue"}]})
        );
    }

    #[test]
    fn replaces_existing_signatures() {
        let doc = json!({"signatures": [{"signatureType": "R", "value": "old"}], "key": "value"});
        let merged = merge(doc, "new").unwrap();
        let signatures = merged["signatures"].as_array().unwrap();
        assert_eq!(signatures.len(), 1);
        assert_eq!(signatures[0]["value"], "new");
        // position of the replaced key is kept
        let keys: Vec<&String> = merged.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["signatures", "key"]);
    }

    #[test]
    fn text_form_preserves_field_order_and_numbers() {
        let out = merge_text(r#"{"b":1.10,"a":"x"}"#, "sig").unwrap();
        assert_eq!(
            out,
            r#"{"b":1.10,"a":"x","signatures":[{"signatureType":"I","value":"sig"}]}"#
        );
    }

    #[test]
    fn text_form_keeps_exponent_spelling() {
        let out = merge_text(r#"{"A":1.0E+2,"n":[1E5, -0]}"#, "sig").unwrap();
        assert_eq!(
            out,
            r#"{"A":1.0E+2,"n":[1E5, -0],"signatures":[{"signatureType":"I","value":"sig"}]}"#
        );
    }

    #[test]
    fn text_form_replaces_existing_signatures() {
        let out = merge_text(r#"{"signatures":[],"k":"v"}"#, "sig").unwrap();
        assert_eq!(
            out,
            r#"{"signatures":[{"signatureType":"I","value":"sig"}],"k":"v"}"#
        );
    }

    #[test]
    fn rejects_non_objects() {
        let err = merge(json!(["not", "an", "object"]), "sig").unwrap_err();
        assert!(matches!(err, SigningError::InvalidDocumentFormat(_)));
        for text in ["{oops", "[1]"] {
            assert!(matches!(
                merge_text(text, "sig"),
                Err(SigningError::InvalidDocumentFormat(_))
            ));
        }
    }
}
