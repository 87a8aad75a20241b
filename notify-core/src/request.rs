// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Send Request Parsing and Validation

use serde_json::Value;
use thiserror::Error;

/// Caller-facing text for a request missing `to` or `message`.
pub const MISSING_FIELDS_MESSAGE: &str = "Missing required fields: to, message";

/// A single outbound-message intent as received from the caller.
///
/// Fields are optional until [`SendRequest::validate`] has run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendRequest {
    pub to: Option<String>,
    pub message: Option<String>,
}

/// A request that passed validation: both fields present and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedMessage {
    pub to: String,
    pub body: String,
}

/// The request lacked one or both required fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Missing required fields: to, message")]
pub struct ValidationError {
    missing: Vec<&'static str>,
}

impl ValidationError {
    /// Names of the fields that were absent or empty.
    pub fn missing_fields(&self) -> &[&'static str] {
        &self.missing
    }
}

impl SendRequest {
    /// Creates a request with both fields set.
    pub fn new(to: impl Into<String>, message: impl Into<String>) -> Self {
        SendRequest {
            to: Some(to.into()),
            message: Some(message.into()),
        }
    }

    /// Parses a request body.
    ///
    /// Fails only when the bytes are not JSON. A JSON value that is not an
    /// object, or whose `to`/`message` members are not strings, yields a
    /// request with those fields absent.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(bytes)?;
        Ok(Self::from_value(&value))
    }

    /// Extracts the request fields from an already-parsed JSON value.
    pub fn from_value(value: &Value) -> Self {
        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        SendRequest {
            to: field("to"),
            message: field("message"),
        }
    }

    /// Checks that both `to` and `message` are present and non-empty.
    pub fn validate(self) -> Result<ValidatedMessage, ValidationError> {
        let to = self.to.filter(|s| !s.is_empty());
        let body = self.message.filter(|s| !s.is_empty());

        match (to, body) {
            (Some(to), Some(body)) => Ok(ValidatedMessage { to, body }),
            (to, body) => {
                let mut missing = Vec::with_capacity(2);
                if to.is_none() {
                    missing.push("to");
                }
                if body.is_none() {
                    missing.push("message");
                }
                Err(ValidationError { missing })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_request() {
        let validated = SendRequest::new("+15551234567", "Fee reminder")
            .validate()
            .unwrap();
        assert_eq!(validated.to, "+15551234567");
        assert_eq!(validated.body, "Fee reminder");
    }

    #[test]
    fn test_missing_to() {
        let req = SendRequest {
            to: None,
            message: Some("hi".into()),
        };
        let err = req.validate().unwrap_err();
        assert_eq!(err.missing_fields(), &["to"]);
    }

    #[test]
    fn test_empty_strings_count_as_missing() {
        let err = SendRequest::new("", "").validate().unwrap_err();
        assert_eq!(err.missing_fields(), &["to", "message"]);
        assert_eq!(err.to_string(), MISSING_FIELDS_MESSAGE);
    }

    #[test]
    fn test_whitespace_message_is_accepted() {
        assert!(SendRequest::new("+1555", " ").validate().is_ok());
    }

    #[test]
    fn test_from_json_object() {
        let req = SendRequest::from_json(br#"{"to":"+1555","message":"hello"}"#).unwrap();
        assert_eq!(req, SendRequest::new("+1555", "hello"));
    }

    #[test]
    fn test_from_json_non_string_fields_are_absent() {
        let req = SendRequest::from_json(br#"{"to":15551234567,"message":["x"]}"#).unwrap();
        assert_eq!(req, SendRequest::default());
    }

    #[test]
    fn test_from_json_non_object_has_no_fields() {
        let req = SendRequest::from_json(br#"["+1555","hello"]"#).unwrap();
        assert_eq!(req, SendRequest::default());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(SendRequest::from_json(b"to=+1555&message=hi").is_err());
    }
}
