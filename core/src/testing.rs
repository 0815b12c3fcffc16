//! In-memory transport for unit tests: records requests, replays scripted
//! responses in order, and answers `200 {}` once the script runs out. Also a
//! thread-local log capture for asserting on emitted events.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;

#[derive(Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<HttpRequest>>,
    script: Mutex<VecDeque<Result<HttpResponse, String>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, status: u16, body: &str) -> Self {
        self.script.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.script.lock().unwrap().push_back(Err(message.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests.lock().unwrap().last().cloned().expect("no request recorded")
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().unwrap().push(request);
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(ApiError::Transport { message }),
            None => Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: "{}".to_string(),
            }),
        }
    }
}

/// Log output captured while the guard is alive.
pub struct CapturedLogs {
    buffer: Arc<Mutex<Vec<u8>>>,
    _guard: tracing::subscriber::DefaultGuard,
}

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }
}

struct LogWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Route events on the current thread into a buffer.
pub fn capture_logs() -> CapturedLogs {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || LogWriter(writer.clone()))
        .finish();
    CapturedLogs {
        buffer,
        _guard: tracing::subscriber::set_default(subscriber),
    }
}
