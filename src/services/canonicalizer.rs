//! Canonical serialization of JSON documents for signing.
//!
//! The canonical form is a flat concatenation of quoted tokens: every object
//! key becomes `"KEY"` (uppercased) followed by its canonicalized value, every
//! scalar becomes `"value"` verbatim, `null` contributes nothing, and each
//! array element is preceded by the uppercased key of the property holding the
//! array. Keys are visited in document order; nothing is sorted and no
//! whitespace is emitted.

use serde_json::value::RawValue;

use crate::domain::json::{JsonKind, RawObject};
use crate::infra::error::SigningResult;

/// Parse `document` and return its canonical string.
///
/// Scalars are taken from the source text, so `1.0E+2` canonicalizes as
/// `"1.0E+2"`. Fails with `InvalidDocumentFormat` when `document` is not
/// valid JSON.
pub fn canonicalize(document: &str) -> SigningResult<String> {
    let value: &RawValue = serde_json::from_str(document)?;
    let mut out = String::new();
    write_value(&mut out, value, "")?;
    Ok(out)
}

/// Canonicalize an already split document object.
pub fn canonicalize_object(document: &RawObject) -> SigningResult<String> {
    let mut out = String::new();
    write_fields(&mut out, document)?;
    Ok(out)
}

fn write_value(out: &mut String, value: &RawValue, key: &str) -> SigningResult<()> {
    match JsonKind::of(value) {
        JsonKind::Null => {}
        JsonKind::Bool | JsonKind::Number => write_quoted(out, value.get()),
        JsonKind::String => {
            let text: String = serde_json::from_str(value.get())?;
            write_quoted(out, &text);
        }
        JsonKind::Array => {
            let items: Vec<&RawValue> = serde_json::from_str(value.get())?;
            for item in items {
                write_key(out, key);
                // elements are dispatched without a key of their own
                write_value(out, item, "")?;
            }
        }
        JsonKind::Object => write_fields(out, &RawObject::from_raw(value)?)?,
    }
    Ok(())
}

fn write_fields(out: &mut String, object: &RawObject) -> SigningResult<()> {
    for (key, value) in object.iter() {
        write_key(out, key);
        write_value(out, value, key)?;
    }
    Ok(())
}

fn write_key(out: &mut String, key: &str) {
    out.push('"');
    out.push_str(&key.to_uppercase());
    out.push('"');
}

fn write_quoted(out: &mut String, raw: &str) {
    out.push('"');
    out.push_str(raw);
    out.push('"');
}
