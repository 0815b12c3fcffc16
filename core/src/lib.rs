//! Asynchronous API client for the Kanthalloor governance portal.
//!
//! # Overview
//! Mediates every call the portal makes to its backend: request construction
//! (headers, body encoding, bearer token), response parsing and failure
//! classification. A small renderer turns scheme lists into markup.
//!
//! # Design
//! - `ApiClient` splits each call into `build_request` (pure), a
//!   [`Transport`] round trip, and `parse_response` (pure), so the I/O
//!   boundary is explicit and the rules are testable without a network.
//! - The bearer token lives in a [`TokenStore`] handed to the client at
//!   construction; there is no global state.
//! - Request bodies are an explicit [`Payload`] (`Json` or `Multipart`)
//!   chosen by the caller.
//! - Every failure comes back as an [`ApiError`]; presentation is up to the
//!   caller.
//! - Named operations are a static table ([`bindings::BINDINGS`]) over
//!   [`ApiClient::request`].

pub mod bindings;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod render;
pub mod request;
pub mod session;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use bindings::{Binding, BINDINGS};
pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{ApiError, FALLBACK_MESSAGE};
pub use http::{FormPart, HttpBody, HttpMethod, HttpRequest, HttpResponse, PartValue};
pub use render::{render_scheme_list, scheme_list_html, view_scheme_details, Document, Page};
pub use request::{MultipartForm, Payload, RequestSpec};
pub use session::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    ApplicationRequest, ChatRequest, GenerateMessageRequest, LoginResponse, NewScheme, NewUser, PersonalInfo,
    ProfileUpdate, SchemeRecord,
};
