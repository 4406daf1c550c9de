//! Recursive structural equality for structured errors.
//!
//! [`structural_diff`] walks the typed fields of both errors in declaration order and
//! recurses into component errors. Free-form JSON (offsets, postparsed records and
//! kind-specific properties) goes through [`diff_values`]: numbers are compared by
//! value, so `5` and `5.0` are equal; object keys are compared as a union, a key present
//! on one side only being a difference; arrays must have the same length and are
//! compared by index.

use super::{render, ErrorProperties, StructuredError};
use crate::errors::Mismatch;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const ABSENT: &str = "<absent>";

/// First difference between two cleaned structured errors, if any.
pub fn structural_diff(actual: &StructuredError, expected: &StructuredError) -> Option<Mismatch> {
    diff_errors(expected, actual, "")
}

fn diff_errors(e: &StructuredError, a: &StructuredError, path: &str) -> Option<Mismatch> {
    diff_eq(&e.name, &a.name, &child_path(path, "name"))
        .or_else(|| diff_eq(&e.message, &a.message, &child_path(path, "message")))
        .or_else(|| diff_properties(&e.properties, &a.properties, &child_path(path, "properties")))
        .or_else(|| diff_optional(&e.stack, &a.stack, &child_path(path, "stack"), diff_eq))
        .or_else(|| diff_optional(&e.line, &a.line, &child_path(path, "line"), diff_eq))
        .or_else(|| {
            diff_optional(&e.source_url, &a.source_url, &child_path(path, "sourceURL"), diff_eq)
        })
}

fn diff_properties(e: &ErrorProperties, a: &ErrorProperties, path: &str) -> Option<Mismatch> {
    let at = |key: &str| child_path(path, key);
    diff_eq(&e.id, &a.id, &at("id"))
        .or_else(|| diff_optional(&e.explanation, &a.explanation, &at("explanation"), diff_eq))
        .or_else(|| diff_optional(&e.offset, &a.offset, &at("offset"), diff_values))
        .or_else(|| {
            diff_optional(&e.postparsed, &a.postparsed, &at("postparsed"), |e, a, path| {
                diff_seq(e, a, path, diff_values)
            })
        })
        .or_else(|| {
            diff_optional(
                &e.paragraph_parts,
                &a.paragraph_parts,
                &at("paragraphParts"),
                |e, a, path| diff_seq(e, a, path, diff_values),
            )
        })
        .or_else(|| diff_optional(&e.root_error, &a.root_error, &at("rootError"), diff_eq))
        .or_else(|| {
            diff_optional(&e.errors, &a.errors, &at("errors"), |e, a, path| {
                diff_seq(e, a, path, diff_errors)
            })
        })
        .or_else(|| diff_extra(&e.extra, &a.extra, path))
}

fn diff_eq<T: PartialEq + Serialize>(e: &T, a: &T, path: &str) -> Option<Mismatch> {
    (e != a).then(|| value_differs(path, render(e), render(a)))
}

fn diff_optional<T: Serialize>(
    e: &Option<T>,
    a: &Option<T>,
    path: &str,
    present: impl FnOnce(&T, &T, &str) -> Option<Mismatch>,
) -> Option<Mismatch> {
    match (e, a) {
        (Some(e), Some(a)) => present(e, a, path),
        (Some(e), None) => Some(missing_from_actual(path, render(e))),
        (None, Some(a)) => Some(not_in_expected(path, render(a))),
        (None, None) => None,
    }
}

fn diff_seq<T: Serialize>(
    e: &[T],
    a: &[T],
    path: &str,
    item: impl Fn(&T, &T, &str) -> Option<Mismatch>,
) -> Option<Mismatch> {
    if e.len() != a.len() {
        return Some(
            Mismatch::new(
                path,
                format!("array length differs: expected {}, got {}", e.len(), a.len()),
            )
            .with_values(render(e), render(a)),
        );
    }
    e.iter()
        .zip(a)
        .enumerate()
        .find_map(|(i, (e, a))| item(e, a, &format!("{path}[{i}]")))
}

fn diff_extra(
    e: &BTreeMap<String, Value>,
    a: &BTreeMap<String, Value>,
    path: &str,
) -> Option<Mismatch> {
    diff_entries(e.iter(), |key| a.get(key), path).or_else(|| {
        a.iter()
            .find(|(key, _)| !e.contains_key(*key))
            .map(|(key, a_value)| not_in_expected(&child_path(path, key), render(a_value)))
    })
}

/// First difference between `expected` and `actual`, located under `path`.
pub fn diff_values(expected: &Value, actual: &Value, path: &str) -> Option<Mismatch> {
    match (expected, actual) {
        (Value::Number(e), Value::Number(a)) => {
            if e.as_f64() == a.as_f64() {
                None
            } else {
                Some(value_differs(path, render(expected), render(actual)))
            }
        }
        (Value::Object(e), Value::Object(a)) => diff_object(e, a, path),
        (Value::Array(e), Value::Array(a)) => diff_seq(e, a, path, diff_values),
        (e, a) if e == a => None,
        _ => Some(value_differs(path, render(expected), render(actual))),
    }
}

fn diff_object(e: &Map<String, Value>, a: &Map<String, Value>, path: &str) -> Option<Mismatch> {
    diff_entries(e.iter(), |key| a.get(key), path).or_else(|| {
        a.iter()
            .find(|(key, _)| !e.contains_key(*key))
            .map(|(key, a_value)| not_in_expected(&child_path(path, key), render(a_value)))
    })
}

/// Walks expected entries in order; a key the actual side lacks is a difference.
fn diff_entries<'e, 'a>(
    mut expected: impl Iterator<Item = (&'e String, &'e Value)>,
    actual: impl Fn(&str) -> Option<&'a Value>,
    path: &str,
) -> Option<Mismatch> {
    expected.find_map(|(key, e_value)| {
        let child = child_path(path, key);
        match actual(key) {
            Some(a_value) => diff_values(e_value, a_value, &child),
            None => Some(missing_from_actual(&child, render(e_value))),
        }
    })
}

fn child_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn value_differs(path: &str, expected: String, actual: String) -> Mismatch {
    Mismatch::new(path, "value differs").with_values(expected, actual)
}

fn missing_from_actual(path: &str, expected: String) -> Mismatch {
    Mismatch::new(path, "missing from actual").with_values(expected, ABSENT)
}

fn not_in_expected(path: &str, actual: String) -> Mismatch {
    Mismatch::new(path, "not present in expected").with_values(ABSENT, actual)
}
