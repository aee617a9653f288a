//! # Request Log
//!
//! The per-request [`LogRecord`] and the [`LogSink`] it is written to. The
//! [`RequestLogger`](crate::middleware::RequestLogger) middleware drives both.
//!
//! Each record is one JSON object per line:
//!
//! ```text
//! {"id":"01J...","host":"localhost:9876","request_uri":"/v1/test/error",
//!  "request_time":"2024-05-01T10:00:00.000000000Z","method":"GET",
//!  "remote_address":"-","error":{"message":"internal error message"},
//!  "latency":0.0001,"response_code":400,"response":"Bad Request"}
//! ```

mod record;
mod sink;

pub use record::{body_field, LogRecord};
pub use sink::{LogSink, MemoryWriter, Rotation, SinkOptions, NOP_SINK};
