//! Domain records exchanged with the two-factor service.
//!
//! # Design
//! The request-side `NewUser` and the response-side `User` are separate
//! types: a user only gains an identity (the service-assigned numeric id)
//! once the service answers, and response fields may be missing. XML tag
//! names are fixed by the service and set through serde renames.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::format::{to_xml_document, Formattable};

/// Country code used when the caller does not give one (USA).
pub const DEFAULT_COUNTRY_CODE: &str = "1";

/// Request payload for registering a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub cellphone: String,
    pub country_code: String,
}

impl NewUser {
    /// A user in the default country.
    pub fn new(email: impl Into<String>, cellphone: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            cellphone: cellphone.into(),
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
        }
    }

    pub fn with_country_code(mut self, country_code: impl Into<String>) -> Self {
        self.country_code = country_code.into();
        self
    }
}

impl Formattable for NewUser {
    fn to_xml(&self) -> Result<String, ApiError> {
        to_xml_document("user", self)
    }

    /// Keys are the XML tag names, so `country_code` rather than a
    /// camel-cased variant; `to_json` shares them.
    fn to_map(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("email".to_string(), self.email.clone()),
            ("cellphone".to_string(), self.cellphone.clone()),
            ("country_code".to_string(), self.country_code.clone()),
        ])
    }
}

/// A user as reported by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cellphone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

/// An error reported by the service in an `<errors>` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    #[serde(default)]
    pub message: String,
    #[serde(rename = "error-code", default)]
    pub error_code: String,
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.error_code.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} (code {})", self.message, self.error_code)
        }
    }
}

impl Formattable for RemoteError {
    fn to_xml(&self) -> Result<String, ApiError> {
        to_xml_document("errors", self)
    }

    fn to_map(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("message".to_string(), self.message.clone()),
            ("error_code".to_string(), self.error_code.clone()),
        ])
    }
}

/// Response envelope for every call.
///
/// Built fresh from one response. `status` is the HTTP status of that call
/// whatever the body said. When `error` is set, every success field is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Hash {
    pub status: u16,
    pub message: Option<String>,
    pub success: Option<bool>,
    pub user: Option<User>,
    pub token: Option<String>,
    pub cellphone: Option<String>,
    pub error: Option<RemoteError>,
}

impl Hash {
    /// True when the service did not report an error.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Optional parameters for SMS and voice-call token requests.
///
/// `TokenOptions::default()` sends no parameters at all. Anything the named
/// fields do not cover goes in `extra` and is passed through verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenOptions {
    /// Send the token even if the user has the smartphone app.
    pub force: Option<bool>,
    pub locale: Option<String>,
    pub action: Option<String>,
    pub action_message: Option<String>,
    pub extra: BTreeMap<String, String>,
}

impl TokenOptions {
    pub fn forced() -> Self {
        Self {
            force: Some(true),
            ..Self::default()
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.to_map().is_empty()
    }
}

impl From<BTreeMap<String, String>> for TokenOptions {
    fn from(extra: BTreeMap<String, String>) -> Self {
        Self {
            extra,
            ..Self::default()
        }
    }
}

impl Formattable for TokenOptions {
    fn to_xml(&self) -> Result<String, ApiError> {
        let map = self.to_map();
        if map.contains_key("") {
            return Err(ApiError::Serialization(
                "option names must not be empty".to_string(),
            ));
        }
        to_xml_document("options", &map)
    }

    // Named fields win over an `extra` entry with the same key.
    fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = self.extra.clone();
        if let Some(force) = self.force {
            map.insert("force".to_string(), force.to_string());
        }
        if let Some(locale) = &self.locale {
            map.insert("locale".to_string(), locale.clone());
        }
        if let Some(action) = &self.action {
            map.insert("action".to_string(), action.clone());
        }
        if let Some(action_message) = &self.action_message {
            map.insert("action_message".to_string(), action_message.clone());
        }
        map
    }
}
