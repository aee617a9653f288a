use super::*;
use crate::dispatcher::{Dispatch, Dispatcher};
use crate::docs::DocsInfo;
use crate::ids::RequestId;
use crate::request_log::LogRecord;
use crate::server::{ParsedRequest, RequestContext, ResponseWriter};
use http::Method;
use serde_json::{json, Value};

fn dispatcher() -> Dispatcher {
    let mut registry = Registry::default();
    let docs = DocsSite::new("docs", DocsInfo::default());
    register_all(&mut registry, &docs).unwrap();
    registry.validate().unwrap();
    let mut dispatcher = Dispatcher::default();
    dispatcher.bind(&mut registry).unwrap();
    dispatcher
}

fn call(dispatcher: &Dispatcher, req: ParsedRequest) -> (RequestContext, ResponseWriter) {
    let method = Method::from_bytes(req.method.as_bytes()).unwrap();
    let mut ctx = RequestContext::new(req, method, RequestId::new());
    ctx.set_log(LogRecord::new(ctx.request_id()));
    let mut res = ResponseWriter::new();
    assert_eq!(dispatcher.dispatch(&mut ctx, &mut res), Dispatch::Handled);
    (ctx, res)
}

fn body(res: &ResponseWriter) -> Value {
    serde_json::from_slice(res.body()).unwrap()
}

#[test]
fn test_root_any() {
    let d = dispatcher();
    for m in ["GET", "POST", "PATCH"] {
        let (_, res) = call(&d, ParsedRequest::new(m, "/"));
        assert_eq!(res.status(), 200);
        assert_eq!(body(&res)["app_name"], "brrtapi");
    }
}

#[test]
fn test_error_route_ids() {
    let d = dispatcher();

    let (ctx, res) = call(&d, ParsedRequest::new("GET", "/error?id=1"));
    assert_eq!(res.status(), 400);
    assert_eq!(
        body(&res),
        json!({ "message": "you have made a bad request", "code": 400, "status": "Bad Request" })
    );
    let err = ctx.log().unwrap().error.as_ref().unwrap();
    assert_eq!(err.message, "internal message number 1");
    assert_eq!(err.error_text.as_deref(), Some("internal error 1"));

    let (_, res) = call(&d, ParsedRequest::new("GET", "/error?id=2"));
    assert_eq!(res.status(), 406);
    assert_eq!(body(&res)["status"], "Not Acceptable");
    assert_eq!(body(&res)["message"], "this is not acceptable");

    let (ctx, res) = call(&d, ParsedRequest::new("GET", "/error"));
    assert_eq!(res.status(), 500);
    assert_eq!(
        body(&res)["message"],
        format!("an error has occurred, please see request id: {}", ctx.request_id())
    );
}

#[test]
fn test_testing_echoes_body() {
    let d = dispatcher();
    let sent = json!({ "id": 7, "name": "x", "float": 1.25, "map": { "a": 1 }, "array": [1, "b"] });
    let (_, res) = call(
        &d,
        ParsedRequest::new("POST", "/testing").body(sent.to_string()),
    );
    assert_eq!(res.status(), 200);
    assert_eq!(body(&res), sent);
}

#[test]
fn test_v1_post_echo_and_decode_failure() {
    let d = dispatcher();
    let (_, res) = call(
        &d,
        ParsedRequest::new("POST", "/v1/test/post")
            .body(r#"{"id":1,"name":"n","float":2.5,"map":{"k":"v"}}"#),
    );
    assert_eq!(res.status(), 200);
    assert_eq!(
        body(&res),
        json!({ "id": 1, "name": "n", "field_float": 2.5, "field_map": { "k": "v" } })
    );

    let (ctx, res) = call(&d, ParsedRequest::new("POST", "/v1/test/post").body("not json"));
    assert_eq!(res.status(), 400);
    assert_eq!(body(&res)["message"], "could not decode request body");
    assert_eq!(
        ctx.log().unwrap().error.as_ref().unwrap().message,
        "error decoding request body"
    );
}

#[test]
fn test_v1_error_and_v2_echo() {
    let d = dispatcher();
    let (_, res) = call(&d, ParsedRequest::new("GET", "/v1/test/error"));
    assert_eq!(res.status(), 400);
    assert_eq!(body(&res)["message"], "response body error message");

    let (_, res) = call(&d, ParsedRequest::new("GET", "/v2/test/echo/hello"));
    assert_eq!(body(&res), json!({ "word": "hello" }));
}

#[test]
fn test_register_twice_is_duplicate() {
    let mut registry = Registry::default();
    let docs = DocsSite::new("docs", DocsInfo::default());
    register_all(&mut registry, &docs).unwrap();
    assert!(matches!(
        register_all(&mut registry, &docs),
        Err(RegistryError::Duplicate { .. })
    ));
}
