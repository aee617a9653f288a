use super::*;
use crate::error::ApiError;
use crate::ids::RequestId;
use crate::registry::{AnyExpansion, Endpoint, Param, Registry, Verb};
use crate::request_log::LogRecord;
use crate::router::RouteError;
use crate::server::{ParsedRequest, RequestContext, ResponseWriter};
use anyhow::anyhow;
use http::Method;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn ok(_ctx: &mut RequestContext, res: &mut ResponseWriter) -> HandlerResult {
    res.text(200, "ok");
    Ok(())
}

fn fail_400(_ctx: &mut RequestContext, _res: &mut ResponseWriter) -> HandlerResult {
    Err(ApiError::new(
        "internal error message",
        "response body error message",
        400,
        Some(anyhow!("testing 400 error")),
    )
    .into())
}

fn fail_plain(_ctx: &mut RequestContext, _res: &mut ResponseWriter) -> HandlerResult {
    Err(anyhow!("boom"))
}

fn write_then_fail(_ctx: &mut RequestContext, res: &mut ResponseWriter) -> HandlerResult {
    res.text(202, "accepted");
    Err(anyhow!("late failure"))
}

fn panics(_ctx: &mut RequestContext, _res: &mut ResponseWriter) -> HandlerResult {
    panic!("handler exploded");
}

fn echo(ctx: &mut RequestContext, res: &mut ResponseWriter) -> HandlerResult {
    let word = ctx.path_param("word").unwrap_or_default().to_string();
    res.text(200, word);
    Ok(())
}

fn bound(endpoints: Vec<Endpoint>) -> (Registry, Dispatcher) {
    let mut registry = Registry::default();
    registry.register(endpoints).unwrap();
    registry.validate().unwrap();
    let mut dispatcher = Dispatcher::default();
    dispatcher.bind(&mut registry).unwrap();
    (registry, dispatcher)
}

fn run(dispatcher: &Dispatcher, method: Method, uri: &str) -> (Dispatch, RequestContext, ResponseWriter) {
    let mut ctx = RequestContext::new(
        ParsedRequest::new(method.as_str(), uri),
        method,
        RequestId::new(),
    );
    ctx.set_log(LogRecord::new(ctx.request_id()));
    let mut res = ResponseWriter::new();
    let outcome = dispatcher.dispatch(&mut ctx, &mut res);
    (outcome, ctx, res)
}

#[test]
fn test_any_expands_in_place_and_binds_safe_methods() {
    let (registry, dispatcher) = bound(vec![Endpoint::new("/", ok)
        .name("root")
        .methods([Verb::Any])]);
    let methods = &registry.get("root").unwrap().methods;
    assert!(!methods.contains(&Verb::Any));
    for m in [Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::OPTIONS] {
        let (outcome, _, res) = run(&dispatcher, m.clone(), "/");
        assert_eq!(outcome, Dispatch::Handled, "{m}");
        assert_eq!(res.status(), 200);
    }
    for m in [Method::HEAD, Method::DELETE] {
        let (outcome, _, _) = run(&dispatcher, m, "/");
        assert_eq!(outcome, Dispatch::MethodNotAllowed);
    }
}

#[test]
fn test_configured_exclusions_apply() {
    let mut registry = Registry::default();
    registry
        .register([Endpoint::new("/x", ok).methods([Verb::Any])])
        .unwrap();
    registry.validate().unwrap();
    let mut dispatcher = Dispatcher::new(AnyExpansion::excluding([Verb::Trace]));
    dispatcher.bind(&mut registry).unwrap();
    assert_eq!(run(&dispatcher, Method::DELETE, "/x").0, Dispatch::Handled);
    assert_eq!(run(&dispatcher, Method::TRACE, "/x").0, Dispatch::MethodNotAllowed);
}

#[test]
fn test_trailing_slash_resolves_same_handler() {
    let (_, dispatcher) = bound(vec![Endpoint::new("/", ok).version("v1").group("group")]);
    assert_eq!(run(&dispatcher, Method::GET, "/v1/group").2.body_text(), "ok");
    assert_eq!(run(&dispatcher, Method::GET, "/v1/group/").2.body_text(), "ok");
}

#[test]
fn test_second_bind_is_duplicate() {
    let mut registry = Registry::default();
    registry.register([Endpoint::new("/a", ok)]).unwrap();
    registry.validate().unwrap();
    let mut dispatcher = Dispatcher::default();
    dispatcher.bind(&mut registry).unwrap();
    let err = dispatcher.bind(&mut registry).unwrap_err();
    assert!(matches!(err, DispatchError::Route(RouteError::Duplicate { .. })));
}

#[test]
fn test_bind_refuses_unvalidated_registry() {
    let mut registry = Registry::default();
    registry
        .register([Endpoint::new("/item-{id}", ok).path_param(Param::new("id", "item id"))])
        .unwrap();
    let mut dispatcher = Dispatcher::default();
    assert_eq!(dispatcher.bind(&mut registry), Err(DispatchError::NotValidated));
    assert!(!registry.is_frozen());
    assert!(dispatcher.routes().is_empty());

    assert!(registry.validate().is_err());
    assert_eq!(dispatcher.bind(&mut registry), Err(DispatchError::NotValidated));
}

#[test]
fn test_tail_path_param_reaches_handler() {
    fn file(ctx: &mut RequestContext, res: &mut ResponseWriter) -> HandlerResult {
        let path = ctx.path_param("file").unwrap_or_default().to_string();
        res.text(200, path);
        Ok(())
    }
    let (_, dispatcher) = bound(vec![Endpoint::new("/files/{*file}", file)
        .path_param(Param::new("file", "file path"))]);
    let (outcome, _, res) = run(&dispatcher, Method::GET, "/files/a%20b/c.txt");
    assert_eq!(outcome, Dispatch::Handled);
    assert_eq!(res.body_text(), "a b/c.txt");
}

#[test]
fn test_structured_error_written_and_logged() {
    let (_, dispatcher) = bound(vec![Endpoint::new("/error", fail_400).version("v1").group("test")]);
    let (_, ctx, res) = run(&dispatcher, Method::GET, "/v1/test/error");
    assert_eq!(res.status(), 400);
    assert_eq!(
        res.body_text(),
        r#"{"message":"response body error message","code":400,"status":"Bad Request"}"#
    );
    assert_eq!(res.header("content-type"), Some("application/json"));
    let err = ctx.log().unwrap().error.as_ref().unwrap();
    assert_eq!(err.message, "internal error message");
    assert_eq!(err.error_text.as_deref(), Some("testing 400 error"));
}

#[test]
fn test_plain_error_becomes_500_with_request_id() {
    let (_, dispatcher) = bound(vec![Endpoint::new("/boom", fail_plain)]);
    let (_, ctx, res) = run(&dispatcher, Method::GET, "/boom");
    assert_eq!(res.status(), 500);
    let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(
        body["message"],
        format!("an error has occurred, please see request id: {}", ctx.request_id())
    );
    assert_eq!(ctx.log().unwrap().error.as_ref().unwrap().message, "handler error");
}

#[test]
fn test_written_response_kept_when_error_follows() {
    let (_, dispatcher) = bound(vec![Endpoint::new("/w", write_then_fail)]);
    let (_, ctx, res) = run(&dispatcher, Method::GET, "/w");
    assert_eq!(res.status(), 202);
    assert_eq!(res.body_text(), "accepted");
    assert!(ctx.log().unwrap().error.is_some());
}

#[test]
fn test_panic_recovered_as_500() {
    let (_, dispatcher) = bound(vec![Endpoint::new("/panic", panics)]);
    let (outcome, ctx, res) = run(&dispatcher, Method::GET, "/panic");
    assert_eq!(outcome, Dispatch::Handled);
    assert_eq!(res.status(), 500);
    let err = ctx.log().unwrap().error.as_ref().unwrap();
    assert_eq!(err.message, "handler panicked");
    assert_eq!(err.error_text.as_deref(), Some("handler exploded"));
}

#[test]
fn test_path_params_reach_handler() {
    let (_, dispatcher) = bound(vec![Endpoint::new("/echo/{word}", echo)
        .version("v2")
        .group("test")
        .path_param(Param::new("word", "echoed"))]);
    let (_, _, res) = run(&dispatcher, Method::GET, "/v2/test/echo/hello");
    assert_eq!(res.body_text(), "hello");
}

#[test]
fn test_not_found_and_lookup() {
    let (_, dispatcher) = bound(vec![Endpoint::new("/a", ok).name("a")]);
    assert_eq!(run(&dispatcher, Method::GET, "/nope").0, Dispatch::NotFound);
    assert!(dispatcher.lookup("a").is_some());
    assert!(dispatcher.lookup("missing").is_none());
    assert_eq!(dispatcher.routes().len(), 1);
}

#[test]
fn test_handler_closures_are_handlers() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let handler = move |_ctx: &mut RequestContext, res: &mut ResponseWriter| -> HandlerResult {
        counter.fetch_add(1, Ordering::SeqCst);
        res.write(b"counted");
        Ok(())
    };
    let (_, dispatcher) = bound(vec![Endpoint::new("/count", handler)]);
    run(&dispatcher, Method::GET, "/count");
    run(&dispatcher, Method::GET, "/count/");
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}
