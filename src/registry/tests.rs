use super::*;
use crate::dispatcher::HandlerResult;
use crate::server::{RequestContext, ResponseWriter};
use serde_json::json;

fn noop(_ctx: &mut RequestContext, _res: &mut ResponseWriter) -> HandlerResult {
    Ok(())
}

fn ep(path: &str) -> Endpoint {
    Endpoint::new(path, noop).version("v1").group("test")
}

#[test]
fn test_full_path_is_cleaned() {
    let mut reg = Registry::default();
    reg.register([
        Endpoint::new("/", noop).name("root"),
        ep("/error").name("err"),
        Endpoint::new("/kittens/", noop).version("v1").name("k"),
    ])
    .unwrap();
    assert_eq!(reg.get("root").unwrap().full_path(), "/");
    assert_eq!(reg.get("err").unwrap().full_path(), "/v1/test/error");
    assert_eq!(reg.get("k").unwrap().full_path(), "/v1/kittens");
}

#[test]
fn test_duplicate_method_and_path_fails() {
    let mut reg = Registry::default();
    reg.register([ep("/error")]).unwrap();
    let err = reg.register([ep("/error")]).unwrap_err();
    assert_eq!(
        err,
        RegistryError::Duplicate {
            method: Verb::Get,
            full_path: "/v1/test/error".to_string()
        }
    );
}

#[test]
fn test_disjoint_methods_share_path() {
    let mut reg = Registry::default();
    reg.register([
        ep("/item").methods([Verb::Get]),
        ep("/item").methods([Verb::Post, Verb::Put]),
        ep("/item").methods([Verb::Delete]),
    ])
    .unwrap();
    assert_eq!(reg.len(), 3);
}

#[test]
fn test_any_conflicts_with_expanded_methods_only() {
    let mut reg = Registry::default();
    reg.register([ep("/x").methods([Verb::Any])]).unwrap();
    // HEAD and DELETE are outside the default expansion
    reg.register([ep("/x").methods([Verb::Head, Verb::Delete])])
        .unwrap();
    assert!(reg.register([ep("/x").methods([Verb::Patch])]).is_err());
}

#[test]
fn test_frozen_registry_rejects_registration() {
    let mut reg = Registry::default();
    reg.freeze();
    assert_eq!(reg.register([ep("/late")]), Err(RegistryError::Frozen));
    assert!(reg.is_empty());
}

#[test]
fn test_validate_path_param_accounting() {
    let mut reg = Registry::default();
    reg.register([ep("/echo/{word}")]).unwrap();
    assert!(matches!(
        reg.validate(),
        Err(RegistryError::PathParamCount {
            placeholders: 1,
            declared: 0,
            ..
        })
    ));

    let mut reg = Registry::default();
    reg.register([ep("/echo/{word}").path_param(Param::new("word", "w"))])
        .unwrap();
    assert!(reg.validate().is_ok());
}

#[test]
fn test_validate_rejects_bad_braces() {
    for (path, problem) in [
        ("/a}", BraceError::Unopened),
        ("/{a", BraceError::Unclosed),
        ("/{a{b}}", BraceError::Nested),
    ] {
        let mut reg = Registry::default();
        reg.register([ep(path)]).unwrap();
        match reg.validate() {
            Err(RegistryError::Braces { problem: p, .. }) => assert_eq!(p, problem),
            other => panic!("unexpected {other:?} for {path}"),
        }
    }
}

#[test]
fn test_validate_rejects_partial_segment_placeholders() {
    for (path, segment, problem) in [
        ("/item-{id}", "item-{id}", SegmentError::Embedded),
        ("/{month}-{day}", "{month}-{day}", SegmentError::Embedded),
        ("/files/{*rest}/meta", "{*rest}", SegmentError::TailNotLast),
    ] {
        let mut reg = Registry::default();
        let declared = count_path_params(path).unwrap();
        let endpoint = (0..declared).fold(ep(path), |e, i| {
            e.path_param(Param::new(format!("p{i}"), "placeholder"))
        });
        reg.register([endpoint]).unwrap();
        match reg.validate() {
            Err(RegistryError::Placeholder {
                segment: s,
                problem: p,
                ..
            }) => {
                assert_eq!(s, segment);
                assert_eq!(p, problem);
            }
            other => panic!("unexpected {other:?} for {path}"),
        }
        assert!(!reg.is_validated());
    }

    let mut reg = Registry::default();
    reg.register([ep("/files/{*rest}").path_param(Param::new("rest", "file path"))])
        .unwrap();
    assert!(reg.validate().is_ok());
    assert!(reg.is_validated());
}

#[test]
fn test_registration_clears_validation() {
    let mut reg = Registry::default();
    reg.register([ep("/a")]).unwrap();
    reg.validate().unwrap();
    assert!(reg.is_validated());
    reg.register([ep("/b")]).unwrap();
    assert!(!reg.is_validated());
}

#[test]
fn test_validate_leading_slash_and_methods() {
    let mut reg = Registry::default();
    reg.register([ep("nope")]).unwrap();
    assert!(matches!(
        reg.validate(),
        Err(RegistryError::MissingLeadingSlash { .. })
    ));

    let mut reg = Registry::default();
    reg.register([ep("/m").methods([])]).unwrap();
    assert!(matches!(reg.validate(), Err(RegistryError::NoMethods { .. })));
}

#[test]
fn test_validate_body_example_needs_fields() {
    let mut reg = Registry::default();
    reg.register([ep("/post")
        .methods([Verb::Post])
        .request_example(&json!({"id": 1}))])
        .unwrap();
    assert!(matches!(
        reg.validate(),
        Err(RegistryError::UndocumentedBody { .. })
    ));

    let mut reg = Registry::default();
    reg.register([ep("/post")
        .methods([Verb::Post])
        .request_example(&json!({"id": 1}))
        .json_fields([Param::new("id", "identifier").required()])])
        .unwrap();
    assert!(reg.validate().is_ok());
}

#[test]
fn test_error_messages_name_the_path() {
    let err = RegistryError::Duplicate {
        method: Verb::Post,
        full_path: "/v1/x".into(),
    };
    assert_eq!(err.to_string(), "duplicate endpoint: POST /v1/x");
}
