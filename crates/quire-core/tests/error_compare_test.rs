use quire_core::errors::OracleError;
use quire_core::structured::{
    check_thrown, expect_failure, wrap_multi_error, ErrorKind, RootError, StructuredError,
};
use serde_json::{json, Value};

fn undefined_tag(tag: &str, offset: Value) -> StructuredError {
    StructuredError::new(
        ErrorKind::ScopeParser,
        "undefined_tag",
        format!("Tag \"{tag}\" is not defined"),
    )
    .with_property("xtag", tag)
    .with_offset(offset)
}

/// What the engine raises: explanations, stack and source location included.
fn thrown_multi(errors: Vec<StructuredError>) -> StructuredError {
    let errors = errors
        .into_iter()
        .map(|e| {
            let explanation = format!("The tag {} is not defined", e.properties.extra["xtag"]);
            let stack = format!("ScopeParserError: {}\n    at resolve (scope.js:41:13)", e.message);
            e.with_explanation(explanation).with_stack(stack)
        })
        .collect::<Vec<_>>();
    let mut multi = wrap_multi_error(errors)
        .with_explanation("The template has multiple errors")
        .with_stack("TemplateError: Multi error\n    at compile (docxtemplater.js:120:9)");
    multi.line = Some(120);
    multi.source_url = Some("docxtemplater.js".into());
    multi
}

fn mismatch(err: OracleError) -> quire_core::Mismatch {
    match err {
        OracleError::Mismatch(m) => *m,
        other => panic!("expected mismatch, got {other:?}"),
    }
}

#[test]
fn test_multi_error_passes_without_expected_explanation() {
    let expected = wrap_multi_error(undefined_tag("foo", json!([5, 8])));
    expect_failure(
        || Err::<(), _>(thrown_multi(vec![undefined_tag("foo", json!([5, 8]))])),
        ErrorKind::Template,
        &expected,
    )
    .unwrap();
}

#[test]
fn test_expected_explanation_fails_comparison() {
    let expected = wrap_multi_error(undefined_tag("foo", json!([5, 8])))
        .with_explanation("The template has multiple errors");
    let err = check_thrown(
        thrown_multi(vec![undefined_tag("foo", json!([5, 8]))]),
        ErrorKind::Template,
        &expected,
    )
    .unwrap_err();
    assert_eq!(mismatch(err).location, "properties.explanation");
}

#[test]
fn test_offset_difference_is_reported_eagerly() {
    let expected = wrap_multi_error(undefined_tag("foo", json!([5, 9])).with_property("xtag", "bar"));
    let err = check_thrown(
        thrown_multi(vec![undefined_tag("foo", json!([5, 8]))]),
        ErrorKind::Template,
        &expected,
    )
    .unwrap_err();
    let m = mismatch(err);
    assert_eq!(m.location, "properties.errors[0].properties.offset[1]");
    assert!(m.message.starts_with("Offset differs"));
}

#[test]
fn test_wrapped_errors_round_trip_through_json() {
    let e1 = undefined_tag("foo", json!([5, 8]));
    let e2 = undefined_tag("bar", json!(20));
    let descriptor = wrap_multi_error([e1.clone(), e2.clone()]).to_json().unwrap();
    let expected = StructuredError::from_json(descriptor).unwrap();

    let actual = thrown_multi(vec![e1.clone(), e2.clone()]);
    check_thrown(actual.clone(), ErrorKind::Template, &expected).unwrap();

    let components = actual.properties.errors.clone().unwrap();
    for (thrown, expected) in components.into_iter().zip([e1, e2]) {
        check_thrown(thrown, ErrorKind::ScopeParser, &expected).unwrap();
    }
}

#[test]
fn test_component_difference_matches_independent_check() {
    let e1 = undefined_tag("foo", json!([5, 8]));
    let e2 = undefined_tag("bar", json!(20));
    let actual = thrown_multi(vec![e1.clone(), e2.clone().with_property("xtag", "baz")]);

    let err = check_thrown(actual.clone(), ErrorKind::Template, &wrap_multi_error([e1, e2.clone()]))
        .unwrap_err();
    assert_eq!(mismatch(err).location, "properties.errors[1].properties.xtag");

    let second = actual.properties.errors.unwrap().remove(1);
    let err = check_thrown(second, ErrorKind::ScopeParser, &e2).unwrap_err();
    assert_eq!(mismatch(err).location, "properties.xtag");
}

#[test]
fn test_errors_length_mismatch() {
    let expected = wrap_multi_error(undefined_tag("foo", json!(1)));
    let actual = thrown_multi(vec![undefined_tag("foo", json!(1)), undefined_tag("bar", json!(9))]);
    let m = mismatch(check_thrown(actual, ErrorKind::Template, &expected).unwrap_err());
    assert_eq!(m.location, "properties.errors");
    assert!(m.actual.unwrap().contains("\"bar\""));
}

fn postparsed(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| json!({"type": "placeholder", "value": format!("v{i}"), "lIndex": i, "offset": i}))
        .collect()
}

fn raw_xml_error(records: usize) -> StructuredError {
    StructuredError::template(
        "raw_xml_tag_should_be_only_text_in_paragraph",
        "Raw tag should be the only text in paragraph",
    )
    .with_explanation("The raw tag \"xml\" should be the only text in this paragraph")
    .with_property("xtag", "xml")
    .with_postparsed(postparsed(records))
}

#[test]
fn test_postparsed_length_matches() {
    let expected = StructuredError::template(
        "raw_xml_tag_should_be_only_text_in_paragraph",
        "Raw tag should be the only text in paragraph",
    )
    .with_property("xtag", "xml")
    .with_property("postparsedLength", 5);

    check_thrown(raw_xml_error(5), ErrorKind::Template, &expected).unwrap();
}

#[test]
fn test_postparsed_length_fails_before_deep_equality() {
    let expected = StructuredError::template(
        "raw_xml_tag_should_be_only_text_in_paragraph",
        "Raw tag should be the only text in paragraph",
    )
    .with_property("xtag", "not-compared-yet")
    .with_property("postparsedLength", 4);

    let m = mismatch(check_thrown(raw_xml_error(5), ErrorKind::Template, &expected).unwrap_err());
    assert_eq!(m.location, "properties.postparsedLength");
    assert_eq!(m.expected.as_deref(), Some("4"));
    assert_eq!(m.actual.as_deref(), Some("5"));
}

#[test]
fn test_root_error_message_is_compared() {
    let thrown = StructuredError::new(
        ErrorKind::ScopeParser,
        "scopeparser_execution_failed",
        "Scope parser execution failed",
    )
    .with_explanation("The scope parser for the tag foo failed to execute")
    .with_root_error(RootError {
        name: Some("TypeError".into()),
        message: "foo.bar is not a function".into(),
    });
    let expected = StructuredError::new(
        ErrorKind::ScopeParser,
        "scopeparser_execution_failed",
        "Scope parser execution failed",
    );

    let with_root = expected
        .clone()
        .with_root_error(RootError::new("foo.bar is not a function"));
    check_thrown(thrown.clone(), ErrorKind::ScopeParser, &with_root).unwrap();

    let wrong_root = expected.with_root_error(RootError::new("foo is undefined"));
    let m = mismatch(check_thrown(thrown, ErrorKind::ScopeParser, &wrong_root).unwrap_err());
    assert_eq!(m.location, "properties.rootError");
}

#[test]
fn test_stack_must_mention_message() {
    let thrown = StructuredError::template("unclosed_tag", "Unclosed tag")
        .with_explanation("The tag beginning with \"{foo\" is unclosed")
        .with_stack("TemplateError: Unopened tag\n    at lex (lexer.js:3:1)");
    let expected = StructuredError::template("unclosed_tag", "Unclosed tag");
    let m = mismatch(check_thrown(thrown, ErrorKind::Template, &expected).unwrap_err());
    assert_eq!(m.location, "stack");
}

#[test]
fn test_no_error_thrown() {
    let expected = StructuredError::template("unclosed_tag", "Unclosed tag");
    let err = expect_failure(|| Ok::<_, anyhow::Error>(()), ErrorKind::Template, &expected)
        .unwrap_err();
    assert_eq!(err.exit_code(), 1);
    assert!(err.to_string().contains("No error has been thrown"));
}

#[test]
fn test_foreign_errors_are_malformed() {
    let expected = StructuredError::template("unclosed_tag", "Unclosed tag");

    let err = expect_failure(
        || Err::<(), _>(anyhow::anyhow!("index out of bounds")),
        ErrorKind::Template,
        &expected,
    )
    .unwrap_err();
    assert!(err.is_malformed());
    assert_eq!(err.exit_code(), 3);

    let captured = json!({
        "name": "TemplateError",
        "message": "Unclosed tag",
        "properties": {"explanation": "..."}
    });
    let err = check_thrown(captured, ErrorKind::Template, &expected).unwrap_err();
    assert!(err.to_string().contains("properties.id is not a string"));
}

#[test]
fn test_captured_json_error_is_compared() {
    let captured = json!({
        "name": "TemplateError",
        "message": "Unopened tag",
        "properties": {
            "id": "unopened_tag",
            "explanation": "The tag beginning with \"foo\" is unopened",
            "xtag": "foo",
            "offset": 0,
            "context": "foo"
        },
        "stack": "TemplateError: Unopened tag\n    at lex",
        "line": 12
    });
    let expected = StructuredError::template("unopened_tag", "Unopened tag")
        .with_property("xtag", "foo")
        .with_property("context", "foo")
        .with_offset(0);
    check_thrown(captured, ErrorKind::Template, &expected).unwrap();
}
