//! Structured errors raised by the engine under test, and the comparator that checks
//! them against expected descriptors.
//!
//! - [`clean`]: strips volatile fields and runs the eager sub-checks
//! - [`compare`]: recursive structural equality with path-aware mismatches
//! - [`expect`]: the `expect_failure` entry point
//!
//! The same [`StructuredError`] type describes both the thrown error and the expected
//! fixture. Fixture-only fields such as `postparsedLength` travel in
//! [`ErrorProperties::extra`].

pub mod clean;
pub mod compare;
pub mod expect;

pub use clean::clean;
pub use compare::{diff_values, structural_diff};
pub use expect::{check_thrown, expect_failure};

use crate::errors::MalformedError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const MULTI_ERROR_ID: &str = "multi_error";
pub const MULTI_ERROR_MESSAGE: &str = "Multi error";

/// The closed family of structured error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "TemplateError")]
    Template,
    #[serde(rename = "ScopeParserError")]
    ScopeParser,
    #[serde(rename = "InternalError")]
    Internal,
    #[serde(rename = "RenderingError")]
    Rendering,
    #[serde(rename = "APIVersionError")]
    ApiVersion,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 5] = [
        ErrorKind::Template,
        ErrorKind::ScopeParser,
        ErrorKind::Internal,
        ErrorKind::Rendering,
        ErrorKind::ApiVersion,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Template => "TemplateError",
            ErrorKind::ScopeParser => "ScopeParserError",
            ErrorKind::Internal => "InternalError",
            ErrorKind::Rendering => "RenderingError",
            ErrorKind::ApiVersion => "APIVersionError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown error kind: {0}")]
pub struct UnknownErrorKind(pub String);

impl FromStr for ErrorKind {
    type Err = UnknownErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownErrorKind(s.to_string()))
    }
}

/// Error raised inside the engine that caused a structured error. Only the message is
/// compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub message: String,
}

impl RootError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            name: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorProperties {
    /// Stable machine-readable identifier, e.g. `undefined_tag`.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Position in the template; a number or a `[start, end]` pair.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postparsed: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph_parts: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_error: Option<RootError>,
    /// Component errors of a multi-error, in emission order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<StructuredError>>,
    /// Kind-specific fields (`xtag`, `context`, ...) and fixture-only length fields.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredError {
    pub name: ErrorKind,
    pub message: String,
    pub properties: ErrorProperties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
    #[serde(
        default,
        rename = "sourceURL",
        skip_serializing_if = "Option::is_none"
    )]
    pub source_url: Option<String>,
}

impl StructuredError {
    pub fn new(name: ErrorKind, id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name,
            message: message.into(),
            properties: ErrorProperties {
                id: id.into(),
                ..Default::default()
            },
            stack: None,
            line: None,
            source_url: None,
        }
    }

    pub fn template(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Template, id, message)
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.properties.explanation = Some(explanation.into());
        self
    }

    pub fn with_offset(mut self, offset: impl Into<Value>) -> Self {
        self.properties.offset = Some(offset.into());
        self
    }

    pub fn with_postparsed(mut self, records: Vec<Value>) -> Self {
        self.properties.postparsed = Some(records);
        self
    }

    pub fn with_paragraph_parts(mut self, parts: Vec<Value>) -> Self {
        self.properties.paragraph_parts = Some(parts);
        self
    }

    pub fn with_root_error(mut self, root: RootError) -> Self {
        self.properties.root_error = Some(root);
        self
    }

    pub fn with_errors(mut self, errors: Vec<StructuredError>) -> Self {
        self.properties.errors = Some(errors);
        self
    }

    /// Set a kind-specific property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.extra.insert(key.into(), value.into());
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn is_multi(&self) -> bool {
        self.properties.id == MULTI_ERROR_ID && self.properties.errors.is_some()
    }

    pub fn id(&self) -> &str {
        &self.properties.id
    }

    /// Parse a descriptor. Only the shape is checked, not the thrown-error contract.
    pub fn from_json(value: Value) -> Result<Self, MalformedError> {
        serde_json::from_value(value.clone()).map_err(|e| {
            MalformedError::new(format!("not a structured error: {e}")).with_rendered(value.to_string())
        })
    }

    pub fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Pretty JSON rendering for diagnostics.
    pub fn render(&self) -> String {
        render(self)
    }
}

impl fmt::Display for StructuredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

impl std::error::Error for StructuredError {}

pub(crate) fn render<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unrenderable: {e}>"))
}

/// One or more errors to aggregate with [`wrap_multi_error`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorList(pub Vec<StructuredError>);

impl From<StructuredError> for ErrorList {
    fn from(error: StructuredError) -> Self {
        Self(vec![error])
    }
}

impl From<Vec<StructuredError>> for ErrorList {
    fn from(errors: Vec<StructuredError>) -> Self {
        Self(errors)
    }
}

impl<const N: usize> From<[StructuredError; N]> for ErrorList {
    fn from(errors: [StructuredError; N]) -> Self {
        Self(errors.into())
    }
}

/// Canonical multi-error descriptor wrapping `errors` in order.
pub fn wrap_multi_error(errors: impl Into<ErrorList>) -> StructuredError {
    StructuredError::template(MULTI_ERROR_ID, MULTI_ERROR_MESSAGE).with_errors(errors.into().0)
}

/// Conversion of a thrown value into a structured error, enforcing the minimum contract:
/// a known kind, a `properties` object, a string `id` and a string `explanation`.
pub trait IntoStructuredError {
    fn into_structured(self) -> Result<StructuredError, MalformedError>;
}

fn check_contract(error: StructuredError) -> Result<StructuredError, MalformedError> {
    if error.properties.explanation.is_none() {
        return Err(MalformedError::new("properties.explanation is missing")
            .with_rendered(error.stack.clone().unwrap_or_else(|| error.render())));
    }
    Ok(error)
}

impl IntoStructuredError for StructuredError {
    fn into_structured(self) -> Result<StructuredError, MalformedError> {
        check_contract(self)
    }
}

impl IntoStructuredError for Box<StructuredError> {
    fn into_structured(self) -> Result<StructuredError, MalformedError> {
        check_contract(*self)
    }
}

impl IntoStructuredError for Value {
    fn into_structured(self) -> Result<StructuredError, MalformedError> {
        let rendered = || self.to_string();
        let Some(object) = self.as_object() else {
            return Err(MalformedError::new("thrown value is not an object").with_rendered(rendered()));
        };
        let Some(name) = object.get("name").and_then(Value::as_str) else {
            return Err(MalformedError::new("thrown value has no string name").with_rendered(rendered()));
        };
        if let Err(e) = name.parse::<ErrorKind>() {
            return Err(MalformedError::new(e.to_string()).with_rendered(rendered()));
        }
        let Some(properties) = object.get("properties").and_then(Value::as_object) else {
            return Err(MalformedError::new("properties is not an object").with_rendered(rendered()));
        };
        for field in ["id", "explanation"] {
            if !properties.get(field).is_some_and(Value::is_string) {
                return Err(MalformedError::new(format!("properties.{field} is not a string"))
                    .with_rendered(rendered()));
            }
        }
        let error = StructuredError::from_json(self)?;
        check_contract(error)
    }
}

impl IntoStructuredError for anyhow::Error {
    fn into_structured(self) -> Result<StructuredError, MalformedError> {
        match self.downcast::<StructuredError>() {
            Ok(error) => check_contract(error),
            Err(other) => Err(MalformedError::new("thrown error is not a structured error")
                .with_rendered(format!("{other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_round_trips_through_its_name() {
        for kind in ErrorKind::ALL {
            assert_eq!(kind.as_str().parse::<ErrorKind>().unwrap(), kind);
        }
        assert!("TypeError".parse::<ErrorKind>().is_err());
    }

    #[test]
    fn wrap_single_error_as_one_element_sequence() {
        let inner = StructuredError::template("undefined_tag", "No tag 'foo'");
        let wrapped = wrap_multi_error(inner.clone());
        assert_eq!(wrapped.name, ErrorKind::Template);
        assert_eq!(wrapped.message, MULTI_ERROR_MESSAGE);
        assert_eq!(wrapped.id(), MULTI_ERROR_ID);
        assert_eq!(wrapped.properties.errors, Some(vec![inner]));
        assert!(wrapped.is_multi());
    }

    #[test]
    fn extra_properties_flatten_into_json() {
        let error = StructuredError::template("unopened_tag", "Unopened tag")
            .with_property("xtag", "foo")
            .with_offset(json!([1, 4]));
        let value = error.to_json().unwrap();
        assert_eq!(value["properties"]["xtag"], "foo");
        assert_eq!(value["properties"]["offset"], json!([1, 4]));
        assert_eq!(StructuredError::from_json(value).unwrap(), error);
    }

    #[test]
    fn json_without_explanation_is_malformed() {
        let thrown = json!({
            "name": "TemplateError",
            "message": "x",
            "properties": {"id": "undefined_tag"}
        });
        let err = thrown.into_structured().unwrap_err();
        assert_eq!(err.reason, "properties.explanation is not a string");
    }

    #[test]
    fn json_with_foreign_name_is_malformed() {
        let thrown = json!({"name": "TypeError", "message": "x", "properties": {}});
        let err = thrown.into_structured().unwrap_err();
        assert!(err.reason.contains("unknown error kind"));
    }

    #[test]
    fn anyhow_downcast_recovers_structured_error() {
        let error = StructuredError::template("undefined_tag", "No tag").with_explanation("...");
        let thrown = anyhow::Error::new(error.clone());
        assert_eq!(thrown.into_structured().unwrap(), error);

        let plain = anyhow::anyhow!("boom");
        assert!(plain.into_structured().is_err());
    }
}
