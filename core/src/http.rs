//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The client
//! builds `HttpRequest` values and parses `HttpResponse` values; a
//! [`Transport`](crate::transport::Transport) performs the actual I/O in
//! between. Keeping the wire shape as data is what lets the request and
//! response rules be tested without a network.
//!
//! A multipart body is carried as its parts only. The boundary and the
//! matching `Content-Type` header are chosen by the transport when it encodes
//! the parts, so `HttpRequest::headers` never holds a content type for it.

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a single multipart field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartValue {
    Text(String),
    File {
        file_name: String,
        mime_type: Option<String>,
        bytes: Vec<u8>,
    },
}

/// A named multipart field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub value: PartValue,
}

/// Request body as it goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpBody {
    /// Already-encoded text; its content type is in the request headers.
    Text(String),
    /// Multipart fields; the transport encodes them and sets the header.
    Multipart(Vec<FormPart>),
}

impl HttpBody {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            HttpBody::Text(text) => Some(text.as_str()),
            HttpBody::Multipart(_) => None,
        }
    }
}

/// An HTTP request described as plain data.
///
/// `url` is absolute: the configured base URL joined with the endpoint path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<HttpBody>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// Produced by the transport for every status code; interpreting the status
/// is left to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}
