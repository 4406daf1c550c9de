//! Normalization of a thrown error before structural comparison.
//!
//! Runs in place on both sides and recurses into multi-error components, pairing
//! them by index. Some checks happen here rather than in the final comparison:
//! offsets, the root error message, length-paired properties and the stack text. Each
//! one fails with its own location before any deep equality runs.

use super::compare::diff_values;
use super::{render, StructuredError};
use crate::errors::Mismatch;
use serde_json::Value;
use std::collections::BTreeMap;

/// Record fields that carry positions only.
const POSITIONAL_FIELDS: [&str; 2] = ["lIndex", "offset"];

fn at(path: &str, field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{path}.{field}")
    }
}

/// Clean `actual` and `expected` for comparison.
pub fn clean(actual: &mut StructuredError, expected: &mut StructuredError) -> Result<(), Mismatch> {
    clean_at(actual, expected, "")
}

fn clean_at(
    actual: &mut StructuredError,
    expected: &mut StructuredError,
    path: &str,
) -> Result<(), Mismatch> {
    actual.properties.explanation = None;

    if let (Some(a), Some(e)) = (&actual.properties.offset, &expected.properties.offset) {
        if let Some(m) = diff_values(e, a, &at(path, "properties.offset")) {
            return Err(Mismatch {
                message: format!("Offset differs: {}", m.message),
                ..m
            });
        }
    }
    actual.properties.offset = None;
    expected.properties.offset = None;

    actual.line = None;
    actual.source_url = None;

    if let Some(records) = actual.properties.postparsed.as_mut() {
        for record in records.iter_mut() {
            if let Value::Object(map) = record {
                for field in POSITIONAL_FIELDS {
                    map.remove(field);
                }
            }
        }
    }

    if let Some(root) = actual.properties.root_error.take() {
        let location = at(path, "properties.rootError");
        let Some(expected_root) = expected.properties.root_error.take() else {
            return Err(
                Mismatch::new(location, "rootError is not described by the expected error")
                    .with_values("<absent>", render(&root)),
            );
        };
        if root.message != expected_root.message {
            return Err(Mismatch::new(location, "rootError message differs")
                .with_values(expected_root.message, root.message));
        }
    }

    check_length(
        &mut actual.properties.paragraph_parts,
        &mut expected.properties.extra,
        "paragraphParts",
        path,
    )?;
    check_length(
        &mut actual.properties.postparsed,
        &mut expected.properties.extra,
        "postparsed",
        path,
    )?;

    if let Some(stack) = actual.stack.take() {
        let needle = format!("Error: {}", expected.message);
        if !stack.contains(&needle) {
            return Err(Mismatch::new(
                at(path, "stack"),
                format!("stack does not mention {needle:?}"),
            )
            .with_values(needle, stack));
        }
    }

    if let Some(actual_errors) = actual.properties.errors.as_mut() {
        let location = at(path, "properties.errors");
        match expected.properties.errors.as_mut() {
            Some(expected_errors) if expected_errors.len() == actual_errors.len() => {
                for (i, (a, e)) in actual_errors
                    .iter_mut()
                    .zip(expected_errors.iter_mut())
                    .enumerate()
                {
                    clean_at(a, e, &format!("{location}[{i}]"))?;
                }
            }
            Some(expected_errors) => {
                return Err(Mismatch::new(
                    location,
                    format!(
                        "errors length differs: expected {}, got {}",
                        expected_errors.len(),
                        actual_errors.len()
                    ),
                )
                .with_values(render(expected_errors), render(actual_errors)));
            }
            None => {
                return Err(Mismatch::new(
                    location,
                    "expected error does not declare properties.errors",
                )
                .with_values("<absent>", render(actual_errors)));
            }
        }
    }

    Ok(())
}

/// Check a property against its `<field>Length` sibling on the expected side, then drop
/// both. Skipped unless both are present.
fn check_length(
    property: &mut Option<Vec<Value>>,
    expected_extra: &mut BTreeMap<String, Value>,
    field: &str,
    path: &str,
) -> Result<(), Mismatch> {
    let length_key = format!("{field}Length");
    let (actual_len, declared) = match (property.as_ref(), expected_extra.get(&length_key)) {
        (Some(values), Some(declared)) => (values.len(), declared),
        _ => return Ok(()),
    };

    let location = at(path, &format!("properties.{length_key}"));
    let Some(declared_len) = declared.as_f64() else {
        return Err(Mismatch::new(location, "declared length is not a number")
            .with_values(declared.to_string(), actual_len.to_string()));
    };
    if declared_len != actual_len as f64 {
        return Err(Mismatch::new(location, format!("{field} length differs"))
            .with_values(declared.to_string(), actual_len.to_string()));
    }

    *property = None;
    expected_extra.remove(&length_key);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structured::RootError;
    use serde_json::json;

    fn records(n: usize) -> Vec<Value> {
        (0..n)
            .map(|i| json!({"type": "tag", "value": format!("t{i}"), "lIndex": i, "offset": i * 3}))
            .collect()
    }

    #[test]
    fn strips_volatile_fields() {
        let mut actual = StructuredError::template("undefined_tag", "No tag")
            .with_explanation("The tag is undefined")
            .with_stack("TemplateError: No tag\n    at parse (parser.js:10:5)");
        actual.line = Some(10);
        actual.source_url = Some("parser.js".into());
        let mut expected = StructuredError::template("undefined_tag", "No tag");

        clean(&mut actual, &mut expected).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn postparsed_records_lose_positions() {
        let mut actual = StructuredError::template("x", "m").with_postparsed(records(2));
        let mut expected = StructuredError::template("x", "m");
        clean(&mut actual, &mut expected).unwrap();

        let cleaned = actual.properties.postparsed.unwrap();
        assert_eq!(cleaned[0], json!({"type": "tag", "value": "t0"}));
    }

    #[test]
    fn matching_length_drops_both_fields() {
        let mut actual = StructuredError::template("x", "m").with_postparsed(records(5));
        let mut expected =
            StructuredError::template("x", "m").with_property("postparsedLength", 5);
        clean(&mut actual, &mut expected).unwrap();

        assert!(actual.properties.postparsed.is_none());
        assert!(!expected.properties.extra.contains_key("postparsedLength"));
    }

    #[test]
    fn wrong_length_fails_with_location() {
        let mut actual = StructuredError::template("x", "m").with_postparsed(records(5));
        let mut expected =
            StructuredError::template("x", "m").with_property("postparsedLength", 4);
        let m = clean(&mut actual, &mut expected).unwrap_err();
        assert_eq!(m.location, "properties.postparsedLength");
        assert_eq!(m.expected.as_deref(), Some("4"));
        assert_eq!(m.actual.as_deref(), Some("5"));
    }

    #[test]
    fn non_numeric_length_fails() {
        let mut actual = StructuredError::template("x", "m").with_paragraph_parts(records(1));
        let mut expected =
            StructuredError::template("x", "m").with_property("paragraphPartsLength", "1");
        let m = clean(&mut actual, &mut expected).unwrap_err();
        assert_eq!(m.message, "declared length is not a number");
    }

    #[test]
    fn offsets_are_checked_then_removed() {
        let mut actual = StructuredError::template("x", "m").with_offset(json!([5, 8]));
        let mut expected = StructuredError::template("x", "m").with_offset(json!([5, 9]));
        let m = clean(&mut actual, &mut expected).unwrap_err();
        assert!(m.location.starts_with("properties.offset"));

        let mut actual = StructuredError::template("x", "m").with_offset(json!([5, 8]));
        let mut expected = StructuredError::template("x", "m");
        clean(&mut actual, &mut expected).unwrap();
        assert!(actual.properties.offset.is_none());
    }

    #[test]
    fn root_error_compares_message_only() {
        let mut actual = StructuredError::template("scopeparser_execution_failed", "m")
            .with_root_error(RootError {
                name: Some("TypeError".into()),
                message: "foo is not a function".into(),
            });
        let mut expected = StructuredError::template("scopeparser_execution_failed", "m")
            .with_root_error(RootError::new("foo is not a function"));
        clean(&mut actual, &mut expected).unwrap();
        assert!(actual.properties.root_error.is_none());
        assert!(expected.properties.root_error.is_none());

        let mut actual = StructuredError::template("x", "m")
            .with_root_error(RootError::new("boom"));
        let mut expected = StructuredError::template("x", "m");
        let m = clean(&mut actual, &mut expected).unwrap_err();
        assert_eq!(m.location, "properties.rootError");
    }

    #[test]
    fn stack_must_mention_expected_message() {
        let mut actual = StructuredError::template("x", "Unclosed tag")
            .with_stack("TemplateError: Unopened tag\n    at x");
        let mut expected = StructuredError::template("x", "Unclosed tag");
        let m = clean(&mut actual, &mut expected).unwrap_err();
        assert_eq!(m.location, "stack");
        assert_eq!(m.expected.as_deref(), Some("Error: Unclosed tag"));
    }

    #[test]
    fn nested_errors_are_cleaned_by_index() {
        let mut actual = StructuredError::template("multi_error", "Multi error").with_errors(vec![
            StructuredError::template("a", "A").with_explanation("..."),
            StructuredError::template("b", "B")
                .with_explanation("...")
                .with_offset(1),
        ]);
        let mut expected = StructuredError::template("multi_error", "Multi error").with_errors(vec![
            StructuredError::template("a", "A"),
            StructuredError::template("b", "B").with_offset(2),
        ]);
        let m = clean(&mut actual, &mut expected).unwrap_err();
        assert_eq!(m.location, "properties.errors[1].properties.offset");
    }

    #[test]
    fn errors_length_mismatch_serializes_both_sequences() {
        let mut actual = StructuredError::template("multi_error", "Multi error")
            .with_errors(vec![StructuredError::template("a", "A")]);
        let mut expected = StructuredError::template("multi_error", "Multi error").with_errors(vec![]);
        let m = clean(&mut actual, &mut expected).unwrap_err();
        assert_eq!(m.location, "properties.errors");
        assert_eq!(m.expected.as_deref(), Some("[]"));
        assert!(m.actual.as_deref().unwrap().contains("\"id\": \"a\""));
    }
}
