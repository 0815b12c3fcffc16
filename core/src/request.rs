//! Caller-side description of one API call.

use serde::Serialize;

use crate::error::ApiError;
use crate::http::{FormPart, HttpMethod, PartValue};

/// Request body, tagged by encoding. The tag decides the `Content-Type`:
/// JSON bodies are sent as `application/json`, multipart bodies leave the
/// header to the transport so it can include the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(serde_json::Value),
    Multipart(MultipartForm),
}

impl Payload {
    /// Encode any serializable value as a JSON payload.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_value(value)
            .map(Payload::Json)
            .map_err(|e| ApiError::Serialization(e.to_string()))
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Payload::Json(value)
    }
}

impl From<MultipartForm> for Payload {
    fn from(form: MultipartForm) -> Self {
        Payload::Multipart(form)
    }
}

/// Ordered multipart fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.parts.push(FormPart {
            name: name.to_string(),
            value: PartValue::Text(value.to_string()),
        });
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, mime_type: Option<&str>, bytes: Vec<u8>) -> Self {
        self.parts.push(FormPart {
            name: name.to_string(),
            value: PartValue::File {
                file_name: file_name.to_string(),
                mime_type: mime_type.map(str::to_string),
                bytes,
            },
        });
        self
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<FormPart> {
        self.parts
    }
}

/// One call to the API: endpoint path, verb, optional body and whether the
/// stored token should be attached. Authenticated GET is the default.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub endpoint: String,
    pub method: HttpMethod,
    pub body: Option<Payload>,
    pub requires_auth: bool,
}

impl RequestSpec {
    pub fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            body: None,
            requires_auth: true,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, endpoint)
    }

    pub fn patch(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, endpoint)
    }

    pub fn with_body(mut self, body: impl Into<Payload>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set or clear the body in one step.
    pub fn with_payload(mut self, body: Option<Payload>) -> Self {
        self.body = body;
        self
    }

    pub fn with_auth(mut self, requires_auth: bool) -> Self {
        self.requires_auth = requires_auth;
        self
    }
}
