//! Request mediation for the Kanthalloor API.
//!
//! # Design
//! `ApiClient` holds the base URL, the token store and a transport, and
//! carries no other state between calls. Every call goes through the same
//! three steps:
//!
//! 1. `build_request` turns a [`RequestSpec`] into an [`HttpRequest`]: the
//!    stored token (read at call time) becomes `Authorization: Bearer ...`,
//!    JSON bodies get `Content-Type: application/json`, multipart bodies get
//!    no content type so the transport can add one with the boundary.
//! 2. The transport performs the round trip.
//! 3. `parse_response` always parses the body as JSON, then classifies by
//!    status: 2xx yields the body, anything else an
//!    [`ApiError::Application`] carrying the body's `detail`.
//!
//! Every failure is logged once at this boundary and returned to the caller;
//! nothing is swallowed. A missing token is not a failure here, the request is
//! simply sent without the header and the server decides.
//!
//! `login` is deliberately different: it sends a form-encoded body, never
//! attaches a token, and hands back whatever JSON the server answered with,
//! whatever the status, because the invalid-credentials body is meaningful
//! to the caller.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::bindings::LOGIN;
use crate::config::ClientConfig;
use crate::error::{ApiError, FALLBACK_MESSAGE};
use crate::http::{HttpBody, HttpRequest, HttpResponse};
use crate::request::{Payload, RequestSpec};
use crate::session::TokenStore;
use crate::transport::Transport;

const JSON_CONTENT_TYPE: &str = "application/json";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Asynchronous client for the Kanthalloor API.
pub struct ApiClient<T> {
    base_url: String,
    session: Arc<dyn TokenStore>,
    transport: T,
}

impl<T> ApiClient<T> {
    pub fn new(config: &ClientConfig, session: Arc<dyn TokenStore>, transport: T) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &dyn TokenStore {
        self.session.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Turn a call description into wire form. Fails only when the JSON
    /// payload cannot be encoded.
    pub fn build_request(&self, spec: &RequestSpec) -> Result<HttpRequest, ApiError> {
        let mut headers = Vec::new();
        if spec.requires_auth {
            if let Some(token) = self.session.token() {
                headers.push(("Authorization".to_string(), format!("Bearer {token}")));
            }
        }

        let body = match &spec.body {
            None => None,
            Some(Payload::Multipart(form)) => Some(HttpBody::Multipart(form.parts().to_vec())),
            Some(Payload::Json(value)) => {
                let text = serde_json::to_string(value).map_err(|e| ApiError::Serialization(e.to_string()))?;
                headers.push(("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string()));
                Some(HttpBody::Text(text))
            }
        };

        Ok(HttpRequest {
            method: spec.method,
            url: format!("{}{}", self.base_url, spec.endpoint),
            headers,
            body,
        })
    }

    /// Parse the body as JSON and classify the status.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, ApiError> {
        let body = parse_body(&response)?;
        if response.is_success() {
            return Ok(body);
        }
        Err(ApiError::Application {
            status: response.status,
            message: failure_message(&body),
        })
    }

    pub fn build_login(&self, username: &str, password: &str) -> HttpRequest {
        let form = format!(
            "username={}&password={}",
            urlencoding::encode(username),
            urlencoding::encode(password)
        );
        HttpRequest {
            method: LOGIN.method,
            url: format!("{}{}", self.base_url, LOGIN.endpoint(&[])),
            headers: vec![("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string())],
            body: Some(HttpBody::Text(form)),
        }
    }

    /// Parse a login response without looking at the status.
    pub fn parse_login(&self, response: HttpResponse) -> Result<Value, ApiError> {
        parse_body(&response)
    }

    /// Forget the stored token.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.session.clear()
    }
}

impl<T: Transport> ApiClient<T> {
    /// Issue one call and return the parsed JSON body of a 2xx response.
    pub async fn request(&self, spec: RequestSpec) -> Result<Value, ApiError> {
        self.round_trip(&spec).await.inspect_err(|err| log_failure(&spec, err))
    }

    /// Like [`request`](Self::request), then deserialize the body into `R`.
    /// A body of the wrong shape is a [`ApiError::Parse`] failure.
    pub async fn request_as<R: DeserializeOwned>(&self, spec: RequestSpec) -> Result<R, ApiError> {
        let value = self.request(spec.clone()).await?;
        serde_json::from_value(value)
            .map_err(|e| ApiError::Parse {
                status: 200,
                message: e.to_string(),
            })
            .inspect_err(|err| log_failure(&spec, err))
    }

    /// Exchange credentials for a token. Resolves with the server's JSON for
    /// any status; only transport and parse failures are errors. The token is
    /// not stored; callers decide what to do with the answer.
    pub async fn login(&self, username: &str, password: &str) -> Result<Value, ApiError> {
        let request = self.build_login(username, password);
        tracing::debug!(url = %request.url, "login");
        let result = match self.transport.execute(request).await {
            Ok(response) => self.parse_login(response),
            Err(err) => Err(err),
        };
        if let Err(err) = &result {
            tracing::error!(status = ?err.status(), error = %err, "login request failed");
        }
        result
    }

    async fn round_trip(&self, spec: &RequestSpec) -> Result<Value, ApiError> {
        let request = self.build_request(spec)?;
        tracing::debug!(method = %request.method, url = %request.url, "API request");
        let response = self.transport.execute(request).await?;
        tracing::debug!(status = response.status, endpoint = %spec.endpoint, "API response");
        self.parse_response(response)
    }
}

fn log_failure(spec: &RequestSpec, err: &ApiError) {
    tracing::error!(
        method = %spec.method,
        endpoint = %spec.endpoint,
        status = ?err.status(),
        error = %err,
        "API request failed"
    );
}

fn parse_body(response: &HttpResponse) -> Result<Value, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Parse {
        status: response.status,
        message: e.to_string(),
    })
}

/// `detail` as the user-facing message. Non-string details (validation error
/// lists) are passed through as JSON text.
fn failure_message(body: &Value) -> String {
    match body.get("detail") {
        Some(Value::String(detail)) if !detail.is_empty() => detail.clone(),
        None | Some(Value::Null) | Some(Value::String(_)) => FALLBACK_MESSAGE.to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use crate::request::MultipartForm;
    use crate::session::MemoryTokenStore;
    use crate::testing::{capture_logs, RecordingTransport};
    use serde_json::json;

    const BASE_URL: &str = "http://localhost:8000";

    fn client_with(token: Option<&str>, transport: RecordingTransport) -> ApiClient<RecordingTransport> {
        let store = match token {
            Some(token) => MemoryTokenStore::with_token(token),
            None => MemoryTokenStore::new(),
        };
        ApiClient::new(&ClientConfig::new(BASE_URL), Arc::new(store), transport)
    }

    fn client(token: Option<&str>) -> ApiClient<RecordingTransport> {
        client_with(token, RecordingTransport::new())
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn json_body_with_token_sets_both_headers() {
        let spec = RequestSpec::post("/info/submit").with_body(json!({"full_name": "Asha"}));
        let req = client(Some("tok")).build_request(&spec).unwrap();

        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8000/info/submit");
        assert_eq!(req.header("Authorization"), Some("Bearer tok"));
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        let body: Value = serde_json::from_str(req.body.as_ref().unwrap().as_text().unwrap()).unwrap();
        assert_eq!(body, json!({"full_name": "Asha"}));
    }

    #[test]
    fn multipart_body_leaves_content_type_to_transport() {
        let form = MultipartForm::new().text("full_name", "Asha");
        let spec = RequestSpec::post("/auth/register").with_body(form.clone()).with_auth(false);
        let req = client(Some("tok")).build_request(&spec).unwrap();

        assert_eq!(req.header("Content-Type"), None);
        assert_eq!(req.header("Authorization"), None);
        assert_eq!(req.body, Some(HttpBody::Multipart(form.into_parts())));
    }

    #[test]
    fn missing_token_sends_without_header() {
        let req = client(None).build_request(&RequestSpec::get("/admin/stats")).unwrap();
        assert!(req.headers.is_empty());
        assert!(req.body.is_none());
    }

    #[test]
    fn auth_disabled_ignores_stored_token() {
        let spec = RequestSpec::get("/schemes/?language=en").with_auth(false);
        let req = client(Some("tok")).build_request(&spec).unwrap();
        assert_eq!(req.header("Authorization"), None);
    }

    #[test]
    fn token_is_read_at_call_time() {
        let store = Arc::new(MemoryTokenStore::new());
        let client = ApiClient::new(&ClientConfig::new(BASE_URL), store.clone(), RecordingTransport::new());
        let spec = RequestSpec::get("/auth/me");

        assert_eq!(client.build_request(&spec).unwrap().header("Authorization"), None);
        store.set_token("fresh").unwrap();
        assert_eq!(client.build_request(&spec).unwrap().header("Authorization"), Some("Bearer fresh"));
    }

    #[test]
    fn parse_success_returns_body_unchanged() {
        let body = json!({"total_citizens": 3, "nested": {"list": [1, 2]}});
        let parsed = client(None).parse_response(response(201, &body.to_string())).unwrap();
        assert_eq!(parsed, body);
    }

    #[test]
    fn parse_failure_uses_detail() {
        let err = client(None)
            .parse_response(response(400, r#"{"detail":"Email already registered"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::Application { status: 400, .. }));
        assert_eq!(err.to_string(), "Email already registered");
    }

    #[test]
    fn parse_failure_without_detail_uses_fallback() {
        let err = client(None).parse_response(response(500, r#"{"error":"boom"}"#)).unwrap_err();
        assert_eq!(err.to_string(), FALLBACK_MESSAGE);
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn parse_failure_with_structured_detail_keeps_it() {
        let err = client(None)
            .parse_response(response(422, r#"{"detail":[{"loc":["body","email"]}]}"#))
            .unwrap_err();
        assert_eq!(err.message(), r#"[{"loc":["body","email"]}]"#);
    }

    #[test]
    fn malformed_body_is_a_parse_error_even_on_success() {
        let err = client(None).parse_response(response(200, "<html>")).unwrap_err();
        assert!(matches!(err, ApiError::Parse { status: 200, .. }));
    }

    #[test]
    fn malformed_error_body_is_a_parse_error() {
        let err = client(None).parse_response(response(502, "Bad Gateway")).unwrap_err();
        assert!(matches!(err, ApiError::Parse { status: 502, .. }));
    }

    #[test]
    fn login_request_is_form_encoded_without_auth() {
        let req = client(Some("tok")).build_login("asha@example.com", "p&ss word");
        assert_eq!(req.method, LOGIN.method);
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, format!("http://localhost:8000{}", LOGIN.path));
        assert_eq!(req.url, "http://localhost:8000/auth/token");
        assert_eq!(req.header("Authorization"), None);
        assert_eq!(req.header("Content-Type"), Some("application/x-www-form-urlencoded"));
        assert_eq!(
            req.body.as_ref().unwrap().as_text(),
            Some("username=asha%40example.com&password=p%26ss%20word")
        );
    }

    #[tokio::test]
    async fn request_resolves_with_body() {
        let transport = RecordingTransport::new().reply(200, r#"[{"_id":"1","name":"A"}]"#);
        let client = client_with(None, transport);
        let value = client.request(RequestSpec::get("/schemes/?language=en").with_auth(false)).await.unwrap();
        assert_eq!(value[0]["name"], "A");
        assert_eq!(client.transport().requests().len(), 1);
    }

    #[tokio::test]
    async fn request_rejects_with_detail() {
        let transport = RecordingTransport::new().reply(403, r#"{"detail":"Unauthorized"}"#);
        let err = client_with(Some("tok"), transport)
            .request(RequestSpec::get("/admin/stats"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized");
    }

    #[tokio::test]
    async fn request_propagates_transport_failure() {
        let transport = RecordingTransport::new().fail("dns error: no such host");
        let err = client_with(None, transport).request(RequestSpec::get("/auth/me")).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport { .. }));
    }

    #[tokio::test]
    async fn request_as_deserializes() {
        #[derive(serde::Deserialize)]
        struct Stats {
            total_schemes: u32,
        }
        let transport = RecordingTransport::new().reply(200, r#"{"total_schemes":4}"#);
        let stats: Stats = client_with(Some("tok"), transport)
            .request_as(RequestSpec::get("/admin/stats"))
            .await
            .unwrap();
        assert_eq!(stats.total_schemes, 4);
    }

    #[tokio::test]
    async fn request_as_shape_mismatch_is_logged_parse_error() {
        #[derive(Debug, serde::Deserialize)]
        struct Stats {
            #[allow(dead_code)]
            total_schemes: u32,
        }
        let logs = capture_logs();
        let transport = RecordingTransport::new().reply(200, r#"{"total_schemes":"many"}"#);
        let err = client_with(Some("tok"), transport)
            .request_as::<Stats>(RequestSpec::get("/admin/stats"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Parse { status: 200, .. }));
        let output = logs.contents();
        let line = output.lines().find(|line| line.contains("API request failed")).unwrap();
        assert!(line.contains("ERROR"));
        assert!(line.contains("endpoint=/admin/stats"));
    }

    #[tokio::test]
    async fn request_failure_is_logged() {
        let logs = capture_logs();
        let transport = RecordingTransport::new().reply(403, r#"{"detail":"Unauthorized"}"#);
        client_with(Some("tok"), transport)
            .request(RequestSpec::get("/admin/users"))
            .await
            .unwrap_err();

        let output = logs.contents();
        assert!(output.contains("API request failed"));
        assert!(output.contains("Unauthorized"));
    }

    #[tokio::test]
    async fn login_resolves_on_unauthorized() {
        let transport = RecordingTransport::new().reply(401, r#"{"detail":"Invalid credentials"}"#);
        let value = client_with(None, transport).login("alice", "bad-pass").await.unwrap();
        assert_eq!(value, json!({"detail": "Invalid credentials"}));
    }

    #[tokio::test]
    async fn login_rejects_on_malformed_body() {
        let transport = RecordingTransport::new().reply(500, "Internal Server Error");
        let err = client_with(None, transport).login("alice", "pw").await.unwrap_err();
        assert!(matches!(err, ApiError::Parse { status: 500, .. }));
    }

    #[tokio::test]
    async fn login_does_not_store_token() {
        let transport = RecordingTransport::new().reply(200, r#"{"access_token":"t","token_type":"bearer"}"#);
        let client = client_with(None, transport);
        client.login("alice", "pw").await.unwrap();
        assert_eq!(client.session().token(), None);
    }

    #[test]
    fn logout_clears_token() {
        let client = client(Some("tok"));
        client.logout().unwrap();
        assert_eq!(client.session().token(), None);
    }
}
