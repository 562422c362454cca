//! The `Formattable` capability shared by every request payload.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::ApiError;

/// A payload that can render itself as an XML document and as a flat
/// field-name to string mapping.
///
/// JSON is never mapped independently: `to_json` is derived from `to_map`.
pub trait Formattable {
    /// XML document with the payload's fixed root element.
    fn to_xml(&self) -> Result<String, ApiError>;

    /// Field name to string value. Absent optional fields are left out.
    fn to_map(&self) -> BTreeMap<String, String>;

    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.to_map()
                .into_iter()
                .map(|(k, v)| (k, serde_json::Value::String(v)))
                .collect(),
        )
    }
}

/// Serialize `value` as XML under `root`.
pub(crate) fn to_xml_document<T: Serialize>(root: &str, value: &T) -> Result<String, ApiError> {
    quick_xml::se::to_string_with_root(root, value).map_err(|e| ApiError::Serialization(e.to_string()))
}
