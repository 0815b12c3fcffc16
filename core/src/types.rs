//! Domain DTOs for the Kanthalloor API.
//!
//! # Design
//! The bindings return `serde_json::Value` because the server's shapes vary
//! per endpoint. These types are for callers that want to build request
//! bodies with [`Payload::json`](crate::Payload::json) or read results with
//! [`ApiClient::request_as`](crate::ApiClient::request_as). They are defined
//! independently of the mock server; the integration test catches drift.

use serde::{Deserialize, Serialize};

/// Successful answer of the token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
}

impl LoginResponse {
    /// Read a login answer; `None` when the server answered with something
    /// else, such as an invalid-credentials body.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

/// Registration payload.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panchayat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Partial profile update. Only present fields are sent.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ward: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ifsc_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panchayat: Option<String>,
}

/// Scheme creation payload.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NewScheme {
    pub name: String,
    pub description: String,
    pub beneficiary_category: Vec<String>,
    pub eligibility_criteria: String,
    pub documents_required: Vec<String>,
    pub benefits: String,
    pub application_process: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

/// A scheme as the list view needs it. The server names the id `_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemeRecord {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub beneficiary_category: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub full_name: String,
    pub age: u32,
    pub bank_account_no: String,
    pub aadhaar_no: String,
    pub phone_number: String,
    pub annual_income: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRequest {
    pub scheme_id: String,
    pub scheme_name: String,
    pub applicant_name: String,
    #[serde(default)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateMessageRequest {
    pub scheme_id: String,
}
