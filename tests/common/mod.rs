#![allow(dead_code)]

pub mod test_server {
    use std::sync::Once;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }
}

pub mod app {
    use brrtapi::cli::App;
    use brrtapi::config::AppConfig;
    use brrtapi::request_log::{LogSink, MemoryWriter};
    use brrtapi::server::AppService;
    use serde_json::Value;
    use std::sync::Arc;

    /// The full example app with request records captured in memory.
    pub struct CapturedApp {
        pub app: App,
        pub service: AppService,
        pub log: MemoryWriter,
    }

    impl CapturedApp {
        pub fn new() -> Self {
            Self::with_config(AppConfig::default())
        }

        pub fn with_config(config: AppConfig) -> Self {
            let app = App::build(config).unwrap();
            let log = MemoryWriter::new();
            let sink = LogSink::with_writer(log.clone(), false);
            let service = app.service(Arc::new(sink));
            Self { app, service, log }
        }

        /// Every request record written so far, parsed.
        pub fn records(&self) -> Vec<Value> {
            self.log
                .lines()
                .iter()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect()
        }
    }
}

pub mod http {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpListener, TcpStream};
    use std::time::Duration;

    /// A port nothing is listening on right now.
    pub fn free_port() -> u16 {
        TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    #[derive(Debug)]
    pub struct RawResponse {
        pub status: u16,
        pub headers: Vec<(String, String)>,
        pub body: Vec<u8>,
    }

    impl RawResponse {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }

        pub fn text(&self) -> String {
            String::from_utf8_lossy(&self.body).into_owned()
        }

        pub fn json(&self) -> serde_json::Value {
            serde_json::from_slice(&self.body).unwrap()
        }
    }

    /// Send one HTTP/1.1 request with `Connection: close` and read the reply.
    pub fn send_request(
        addr: SocketAddr,
        method: &str,
        path: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> RawResponse {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();

        let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
        for (name, value) in headers {
            req.push_str(&format!("{name}: {value}\r\n"));
        }
        req.push_str(&format!("Content-Length: {}\r\n\r\n", body.len()));
        stream.write_all(req.as_bytes()).unwrap();
        stream.write_all(body).unwrap();

        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            match stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    buf.extend_from_slice(&chunk[..n]);
                    if let Some(resp) = parse_response(&buf) {
                        return resp;
                    }
                }
                Err(_) => break,
            }
        }
        parse_response(&buf).unwrap_or_else(|| {
            panic!("incomplete response: {}", String::from_utf8_lossy(&buf))
        })
    }

    /// Parse a complete response; `None` until the whole body has arrived.
    fn parse_response(buf: &[u8]) -> Option<RawResponse> {
        let head_end = buf.windows(4).position(|w| w == b"\r\n\r\n")?;
        let head = String::from_utf8_lossy(&buf[..head_end]);
        let mut lines = head.split("\r\n");
        let status = lines.next()?.split_whitespace().nth(1)?.parse().ok()?;
        let headers: Vec<(String, String)> = lines
            .filter_map(|l| l.split_once(':'))
            .map(|(n, v)| (n.trim().to_string(), v.trim().to_string()))
            .collect();
        let length: usize = headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.parse().ok())
            .unwrap_or(0);
        let body = &buf[head_end + 4..];
        if body.len() < length {
            return None;
        }
        Some(RawResponse {
            status,
            headers,
            body: body[..length].to_vec(),
        })
    }
}
