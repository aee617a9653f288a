//! End-to-end tests over real TCP connections
//!
//! The example app is served by `may_minihttp` on a free local port and
//! driven with raw HTTP/1.1 requests. The fixture stops the server on drop.

use brrtapi::cli::App;
use brrtapi::config::{AppConfig, LogOptions};
use brrtapi::request_log::{LogSink, MemoryWriter, Rotation};
use brrtapi::server::{HttpServer, ServerHandle};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

mod common;
use common::http::{free_port, send_request};
use common::test_server::setup_may_runtime;

/// Running server with its captured request log; stopped when dropped.
struct TestServer {
    handle: Option<ServerHandle>,
    addr: SocketAddr,
    log: MemoryWriter,
}

impl TestServer {
    fn start() -> Self {
        setup_may_runtime();
        let app = App::build(AppConfig::default()).unwrap();
        let log = MemoryWriter::new();
        let service = app.service(Arc::new(LogSink::with_writer(log.clone(), false)));

        let addr: SocketAddr = format!("127.0.0.1:{}", free_port()).parse().unwrap();
        let handle = HttpServer(service).start(addr).unwrap();
        handle.wait_ready().unwrap();
        Self {
            handle: Some(handle),
            addr,
            log,
        }
    }

    fn records(&self) -> Vec<Value> {
        self.log
            .lines()
            .iter()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }
}

#[test]
fn test_root_over_tcp() {
    let server = TestServer::start();
    let resp = send_request(server.addr, "GET", "/", &[], b"");

    assert_eq!(resp.status, 200);
    assert!(resp
        .header("content-type")
        .unwrap()
        .starts_with("application/json"));
    let body = resp.json();
    assert_eq!(body["app_name"], "brrtapi");
    assert!(body["Version"]["version"].is_string());
}

#[test]
fn test_post_roundtrip_and_record() {
    let server = TestServer::start();
    let sent = json!({ "id": 11, "name": "tcp", "float": 9.5, "map": { "k": 1 } });
    let body = sent.to_string();
    let resp = send_request(
        server.addr,
        "POST",
        "/v1/test/post",
        &[("Content-Type", "application/json"), ("User-Agent", "e2e")],
        body.as_bytes(),
    );

    assert_eq!(resp.status, 200);
    assert_eq!(
        resp.json(),
        json!({ "id": 11, "name": "tcp", "field_float": 9.5, "field_map": { "k": 1 } })
    );

    let records = server.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["request_body"], sent);
    assert_eq!(records[0]["content_length"], body.len());
    assert_eq!(records[0]["user_agent"], "e2e");
}

#[test]
fn test_error_envelope_over_tcp() {
    let server = TestServer::start();
    let resp = send_request(server.addr, "GET", "/error?id=2", &[], b"");

    assert_eq!(resp.status, 406);
    assert_eq!(
        resp.json(),
        json!({ "message": "this is not acceptable", "code": 406, "status": "Not Acceptable" })
    );
    let records = server.records();
    assert_eq!(records[0]["error"]["error_text"], "internal error 2");
}

#[test]
fn test_not_found_and_method_not_allowed() {
    let server = TestServer::start();

    let resp = send_request(server.addr, "GET", "/missing/path", &[], b"");
    assert_eq!(resp.status, 404);
    assert!(resp.body.is_empty());

    let resp = send_request(server.addr, "PUT", "/v2/test/echo/x", &[], b"");
    assert_eq!(resp.status, 405);
    assert!(resp.body.is_empty());

    assert!(server.records().is_empty());
}

#[test]
fn test_docs_page_served() {
    let server = TestServer::start();

    let resp = send_request(server.addr, "GET", "/docs", &[], b"");
    assert_eq!(resp.status, 301);
    assert_eq!(resp.header("location"), Some("/docs/"));

    let resp = send_request(server.addr, "GET", "/docs/", &[], b"");
    assert_eq!(resp.status, 200);
    assert!(resp.text().contains("/docs/openapi.json"));

    assert!(server.records().is_empty());
}

#[test]
fn test_app_start_writes_request_log_file() {
    setup_may_runtime();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("requests.log");
    let config = AppConfig {
        port: free_port(),
        log: LogOptions {
            file_path: path.to_string_lossy().into_owned(),
            rotation: Rotation::Never,
        },
        ..AppConfig::default()
    };
    let app = App::build(config).unwrap();
    let handle = app.start().unwrap();
    let addr: SocketAddr = format!("127.0.0.1:{}", app.config.port).parse().unwrap();
    handle.wait_ready().ok();

    let resp = send_request(addr, "GET", "/v2/test/echo/file", &[], b"");
    assert_eq!(resp.status, 200);

    // The file writer is non-blocking; give its worker a moment.
    let deadline = Instant::now() + Duration::from_secs(3);
    let mut contents = String::new();
    while Instant::now() < deadline {
        contents = std::fs::read_to_string(&path).unwrap_or_default();
        if contents.contains("/v2/test/echo/file") {
            break;
        }
        thread::sleep(Duration::from_millis(20));
    }
    handle.stop();

    let line = contents
        .lines()
        .find(|l| l.contains("/v2/test/echo/file"))
        .unwrap();
    let rec: Value = serde_json::from_str(line).unwrap();
    assert_eq!(rec["method"], "GET");
    assert_eq!(rec["response_code"], 200);
}
