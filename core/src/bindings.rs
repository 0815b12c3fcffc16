//! Named API operations.
//!
//! Each operation is one row of [`BINDINGS`]: a path template, a verb and an
//! auth flag. The `ApiClient` methods below only fill the template and hand
//! the result to [`ApiClient::request`]; they add no validation of their own
//! and return its errors untouched.

use serde_json::Value;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::request::{Payload, RequestSpec};
use crate::transport::Transport;
use crate::types::{ChatRequest, GenerateMessageRequest};

/// Language used by [`ApiClient::get_schemes`] when none is given.
pub const DEFAULT_LANGUAGE: &str = "en";

/// One fixed API operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub name: &'static str,
    pub method: HttpMethod,
    /// Path with `{name}` placeholders, filled in order of appearance.
    pub path: &'static str,
    pub requires_auth: bool,
}

impl Binding {
    const fn new(name: &'static str, method: HttpMethod, path: &'static str, requires_auth: bool) -> Self {
        Self {
            name,
            method,
            path,
            requires_auth,
        }
    }

    /// Substitute `params` into the path template, URL-encoding each value.
    /// Placeholders without a matching parameter become empty.
    pub fn endpoint(&self, params: &[&str]) -> String {
        debug_assert_eq!(
            self.path.matches('{').count(),
            params.len(),
            "wrong parameter count for {}",
            self.name
        );
        let mut out = String::with_capacity(self.path.len());
        let mut params = params.iter();
        let mut rest = self.path;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let Some(close) = rest[open..].find('}') else {
                out.push_str(&rest[open..]);
                return out;
            };
            if let Some(value) = params.next() {
                out.push_str(&urlencoding::encode(value));
            }
            rest = &rest[open + close + 1..];
        }
        out.push_str(rest);
        out
    }

    pub fn spec(&self, params: &[&str]) -> RequestSpec {
        RequestSpec::new(self.method, self.endpoint(params)).with_auth(self.requires_auth)
    }
}

pub const LOGIN: Binding = Binding::new("login", HttpMethod::Post, "/auth/token", false);
pub const REGISTER: Binding = Binding::new("register", HttpMethod::Post, "/auth/register", false);
pub const GET_ME: Binding = Binding::new("getMe", HttpMethod::Get, "/auth/me", true);
pub const UPDATE_PROFILE: Binding = Binding::new("updateProfile", HttpMethod::Patch, "/auth/profile", true);
pub const GET_SCHEMES: Binding = Binding::new("getSchemes", HttpMethod::Get, "/schemes/?language={lang}", false);
pub const CREATE_SCHEME: Binding = Binding::new("createScheme", HttpMethod::Post, "/schemes/", true);
pub const GET_SCHEME: Binding = Binding::new("getScheme", HttpMethod::Get, "/schemes/{id}", true);
pub const GET_ADMIN_STATS: Binding = Binding::new("getAdminStats", HttpMethod::Get, "/admin/stats", true);
pub const GET_ADMIN_USERS: Binding = Binding::new("getAdminUsers", HttpMethod::Get, "/admin/users", true);
pub const GET_PENDING_APPLICATIONS: Binding =
    Binding::new("getPendingApplications", HttpMethod::Get, "/admin/applications/pending", true);
pub const VERIFY_APPLICATION: Binding =
    Binding::new("verifyApplication", HttpMethod::Post, "/admin/verify-application/{id}", true);
pub const REJECT_APPLICATION: Binding =
    Binding::new("rejectApplication", HttpMethod::Post, "/admin/reject-application/{id}", true);
pub const DELETE_ALL_PENDING_APPLICATIONS: Binding = Binding::new(
    "deleteAllPendingApplications",
    HttpMethod::Delete,
    "/admin/applications/pending",
    true,
);
pub const CHAT: Binding = Binding::new("chat", HttpMethod::Post, "/api/chat", true);
pub const SUBMIT_INFO: Binding = Binding::new("submitInfo", HttpMethod::Post, "/info/submit", true);
pub const GET_MY_INFO: Binding = Binding::new("getMyInfo", HttpMethod::Get, "/info/me", true);
pub const APPLY_SCHEME: Binding = Binding::new("applyScheme", HttpMethod::Post, "/applications/apply", true);
pub const GET_MY_APPLICATIONS: Binding =
    Binding::new("getMyApplications", HttpMethod::Get, "/applications/my-applications", true);
pub const GENERATE_APPLICATION_MESSAGE: Binding = Binding::new(
    "generateApplicationMessage",
    HttpMethod::Post,
    "/applications/generate-message",
    true,
);

/// Every operation the client knows, login first.
pub const BINDINGS: &[Binding] = &[
    LOGIN,
    REGISTER,
    GET_ME,
    UPDATE_PROFILE,
    GET_SCHEMES,
    CREATE_SCHEME,
    GET_SCHEME,
    GET_ADMIN_STATS,
    GET_ADMIN_USERS,
    GET_PENDING_APPLICATIONS,
    VERIFY_APPLICATION,
    REJECT_APPLICATION,
    DELETE_ALL_PENDING_APPLICATIONS,
    CHAT,
    SUBMIT_INFO,
    GET_MY_INFO,
    APPLY_SCHEME,
    GET_MY_APPLICATIONS,
    GENERATE_APPLICATION_MESSAGE,
];

/// Look a binding up by its operation name.
pub fn find(name: &str) -> Option<&'static Binding> {
    BINDINGS.iter().find(|binding| binding.name == name)
}

impl<T: Transport> ApiClient<T> {
    async fn call(&self, binding: &Binding, params: &[&str], body: Option<Payload>) -> Result<Value, ApiError> {
        self.request(binding.spec(params).with_payload(body)).await
    }

    pub async fn register(&self, user: Payload) -> Result<Value, ApiError> {
        self.call(&REGISTER, &[], Some(user)).await
    }

    pub async fn get_me(&self) -> Result<Value, ApiError> {
        self.call(&GET_ME, &[], None).await
    }

    pub async fn update_profile(&self, changes: Payload) -> Result<Value, ApiError> {
        self.call(&UPDATE_PROFILE, &[], Some(changes)).await
    }

    pub async fn get_schemes(&self, language: Option<&str>) -> Result<Value, ApiError> {
        self.call(&GET_SCHEMES, &[language.unwrap_or(DEFAULT_LANGUAGE)], None).await
    }

    pub async fn create_scheme(&self, scheme: Payload) -> Result<Value, ApiError> {
        self.call(&CREATE_SCHEME, &[], Some(scheme)).await
    }

    pub async fn get_scheme(&self, id: &str) -> Result<Value, ApiError> {
        self.call(&GET_SCHEME, &[id], None).await
    }

    pub async fn get_admin_stats(&self) -> Result<Value, ApiError> {
        self.call(&GET_ADMIN_STATS, &[], None).await
    }

    pub async fn get_admin_users(&self) -> Result<Value, ApiError> {
        self.call(&GET_ADMIN_USERS, &[], None).await
    }

    pub async fn get_pending_applications(&self) -> Result<Value, ApiError> {
        self.call(&GET_PENDING_APPLICATIONS, &[], None).await
    }

    pub async fn verify_application(&self, id: &str) -> Result<Value, ApiError> {
        self.call(&VERIFY_APPLICATION, &[id], None).await
    }

    pub async fn reject_application(&self, id: &str) -> Result<Value, ApiError> {
        self.call(&REJECT_APPLICATION, &[id], None).await
    }

    pub async fn delete_all_pending_applications(&self) -> Result<Value, ApiError> {
        self.call(&DELETE_ALL_PENDING_APPLICATIONS, &[], None).await
    }

    pub async fn chat(&self, message: &str) -> Result<Value, ApiError> {
        let body = Payload::json(&ChatRequest {
            message: message.to_string(),
        })?;
        self.call(&CHAT, &[], Some(body)).await
    }

    pub async fn submit_info(&self, info: Payload) -> Result<Value, ApiError> {
        self.call(&SUBMIT_INFO, &[], Some(info)).await
    }

    pub async fn get_my_info(&self) -> Result<Value, ApiError> {
        self.call(&GET_MY_INFO, &[], None).await
    }

    pub async fn apply_scheme(&self, application: Payload) -> Result<Value, ApiError> {
        self.call(&APPLY_SCHEME, &[], Some(application)).await
    }

    pub async fn get_my_applications(&self) -> Result<Value, ApiError> {
        self.call(&GET_MY_APPLICATIONS, &[], None).await
    }

    pub async fn generate_application_message(&self, scheme_id: &str) -> Result<Value, ApiError> {
        let body = Payload::json(&GenerateMessageRequest {
            scheme_id: scheme_id.to_string(),
        })?;
        self.call(&GENERATE_APPLICATION_MESSAGE, &[], Some(body)).await
    }
}
