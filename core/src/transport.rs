//! Executes `HttpRequest` values against the network.
//!
//! The client depends only on the [`Transport`] trait. [`ReqwestTransport`]
//! is the production implementation; tests substitute a recording transport
//! that never touches a socket.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use crate::error::ApiError;
use crate::http::{FormPart, HttpBody, HttpMethod, HttpRequest, HttpResponse, PartValue};

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one round trip. Any status code is a successful execution;
    /// only a missing response is an error, reported as
    /// [`ApiError::Transport`].
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// `Transport` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            Some(HttpBody::Text(text)) => builder.body(text),
            // reqwest picks the boundary and sets the multipart Content-Type.
            Some(HttpBody::Multipart(parts)) => builder.multipart(multipart_form(parts)?),
            None => builder,
        };

        let response = builder.send().await.map_err(ApiError::transport)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(ApiError::transport)?;

        Ok(HttpResponse { status, headers, body })
    }
}

fn multipart_form(parts: Vec<FormPart>) -> Result<Form, ApiError> {
    let mut form = Form::new();
    for FormPart { name, value } in parts {
        form = match value {
            PartValue::Text(text) => form.text(name, text),
            PartValue::File {
                file_name,
                mime_type,
                bytes,
            } => {
                let mut part = Part::bytes(bytes).file_name(file_name);
                if let Some(mime) = mime_type {
                    part = part
                        .mime_str(&mime)
                        .map_err(|e| ApiError::Serialization(e.to_string()))?;
                }
                form.part(name, part)
            }
        };
    }
    Ok(form)
}
