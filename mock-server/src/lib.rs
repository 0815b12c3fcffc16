//! In-memory stand-in for the Kanthalloor backend.
//!
//! Serves the same paths, verbs and body shapes as the real API, with
//! `{"detail": ...}` error bodies, opaque bearer tokens and role checks.
//! State lives in one `RwLock` and is lost on exit. An admin account
//! ([`ADMIN_EMAIL`] / [`ADMIN_PASSWORD`]) is created at startup.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "admin@kanthalloor.gov.in";
pub const ADMIN_PASSWORD: &str = "admin123";

/// Profile fields a user may change through `PATCH /auth/profile`.
const PROFILE_FIELDS: &[&str] = &[
    "ward",
    "occupation",
    "address",
    "bank_account_no",
    "ifsc_code",
    "full_name",
    "panchayat",
];

struct UserRecord {
    password: String,
    profile: Map<String, Value>,
}

impl UserRecord {
    fn id(&self) -> String {
        self.profile["_id"].as_str().unwrap_or_default().to_string()
    }

    fn role(&self) -> &str {
        self.profile.get("role").and_then(Value::as_str).unwrap_or("citizen")
    }
}

#[derive(Default)]
pub struct Store {
    users: HashMap<String, UserRecord>,
    tokens: HashMap<String, String>,
    schemes: Vec<Map<String, Value>>,
    applications: Vec<Map<String, Value>>,
    info: Vec<Map<String, Value>>,
}

impl Store {
    fn seeded() -> Self {
        let mut store = Store::default();
        let mut profile = Map::new();
        profile.insert("_id".into(), Uuid::new_v4().to_string().into());
        profile.insert("email".into(), ADMIN_EMAIL.into());
        profile.insert("full_name".into(), "Panchayat Admin".into());
        profile.insert("role".into(), "admin".into());
        store.users.insert(
            ADMIN_EMAIL.to_string(),
            UserRecord {
                password: ADMIN_PASSWORD.to_string(),
                profile,
            },
        );
        store
    }

    fn latest_info(&self, user_id: &str) -> Option<&Map<String, Value>> {
        self.info.iter().rev().find(|doc| doc["user_id"] == user_id)
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Error answered as `{"detail": message}`.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    detail: String,
}

impl HttpError {
    fn new(status: StatusCode, detail: &str) -> Self {
        Self {
            status,
            detail: detail.to_string(),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

/// Email and role behind the request's bearer token.
pub struct CurrentUser {
    email: String,
    role: String,
}

impl CurrentUser {
    fn require_role(&self, allowed: &[&str], detail: &str) -> Result<(), HttpError> {
        if allowed.contains(&self.role.as_str()) {
            Ok(())
        } else {
            Err(HttpError::new(StatusCode::FORBIDDEN, detail))
        }
    }
}

impl FromRequestParts<Db> for CurrentUser {
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, db: &Db) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| HttpError::new(StatusCode::UNAUTHORIZED, "Not authenticated"))?;

        let store = db.read().await;
        let invalid = || HttpError::new(StatusCode::UNAUTHORIZED, "Could not validate credentials");
        let email = store.tokens.get(token).ok_or_else(invalid)?;
        let user = store.users.get(email).ok_or_else(invalid)?;
        Ok(CurrentUser {
            email: email.clone(),
            role: user.role().to_string(),
        })
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::seeded()));
    Router::new()
        .route("/auth/token", post(login))
        .route("/auth/register", post(register))
        .route("/auth/me", get(get_me))
        .route("/auth/profile", patch(update_profile))
        .route("/schemes/", get(list_schemes).post(create_scheme))
        .route("/schemes/{id}", get(get_scheme))
        .route("/admin/stats", get(admin_stats))
        .route("/admin/users", get(admin_users))
        .route(
            "/admin/applications/pending",
            get(pending_applications).delete(delete_all_applications),
        )
        .route("/admin/verify-application/{id}", post(verify_application))
        .route("/admin/reject-application/{id}", post(reject_application))
        .route("/api/chat", post(chat))
        .route("/info/submit", post(submit_info))
        .route("/info/me", get(get_my_info))
        .route("/applications/apply", post(apply_scheme))
        .route("/applications/my-applications", get(my_applications))
        .route("/applications/generate-message", post(generate_message))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

async fn login(State(db): State<Db>, Form(form): Form<LoginForm>) -> Result<Json<Value>, HttpError> {
    let mut store = db.write().await;
    let valid = store
        .users
        .get(&form.username)
        .is_some_and(|user| user.password == form.password);
    if !valid {
        return Err(HttpError::new(StatusCode::UNAUTHORIZED, "Incorrect email or password"));
    }
    let token = Uuid::new_v4().simple().to_string();
    store.tokens.insert(token.clone(), form.username);
    Ok(Json(json!({ "access_token": token, "token_type": "bearer" })))
}

#[derive(Deserialize)]
pub struct RegisterUser {
    pub email: String,
    pub full_name: String,
    pub password: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

async fn register(State(db): State<Db>, Json(input): Json<RegisterUser>) -> Result<Json<Value>, HttpError> {
    let mut store = db.write().await;
    if store.users.contains_key(&input.email) {
        return Err(HttpError::new(StatusCode::BAD_REQUEST, "Email already registered"));
    }
    let mut profile = input.extra;
    profile.insert("_id".into(), Uuid::new_v4().to_string().into());
    profile.insert("email".into(), input.email.clone().into());
    profile.insert("full_name".into(), input.full_name.into());
    profile.insert("role".into(), "citizen".into());
    profile.entry("language_pref").or_insert_with(|| "en".into());
    let body = Value::Object(profile.clone());
    store.users.insert(
        input.email,
        UserRecord {
            password: input.password,
            profile,
        },
    );
    tracing::info!(user = %body["email"], "registered");
    Ok(Json(body))
}

async fn get_me(State(db): State<Db>, user: CurrentUser) -> Result<Json<Value>, HttpError> {
    let store = db.read().await;
    store
        .users
        .get(&user.email)
        .map(|record| Json(Value::Object(record.profile.clone())))
        .ok_or_else(|| HttpError::new(StatusCode::NOT_FOUND, "User not found"))
}

async fn update_profile(
    State(db): State<Db>,
    user: CurrentUser,
    Json(changes): Json<Map<String, Value>>,
) -> Result<Json<Value>, HttpError> {
    let allowed: Vec<(String, Value)> = changes
        .into_iter()
        .filter(|(key, _)| PROFILE_FIELDS.contains(&key.as_str()))
        .collect();
    if allowed.is_empty() {
        return Err(HttpError::new(StatusCode::BAD_REQUEST, "No valid fields to update"));
    }
    let mut store = db.write().await;
    let record = store
        .users
        .get_mut(&user.email)
        .ok_or_else(|| HttpError::new(StatusCode::NOT_FOUND, "User not found"))?;
    record.profile.extend(allowed);
    Ok(Json(Value::Object(record.profile.clone())))
}

#[derive(Deserialize)]
pub struct SchemeQuery {
    pub language: Option<String>,
}

async fn list_schemes(State(db): State<Db>, Query(query): Query<SchemeQuery>) -> Json<Value> {
    tracing::debug!(language = query.language.as_deref().unwrap_or("en"), "list schemes");
    let store = db.read().await;
    Json(Value::Array(store.schemes.iter().cloned().map(Value::Object).collect()))
}

#[derive(Deserialize)]
pub struct NewScheme {
    pub name: String,
    pub description: String,
    pub beneficiary_category: Vec<String>,
    pub eligibility_criteria: String,
    pub documents_required: Vec<String>,
    pub benefits: String,
    pub application_process: String,
    pub department: Option<String>,
}

async fn create_scheme(
    State(db): State<Db>,
    user: CurrentUser,
    Json(input): Json<NewScheme>,
) -> Result<Json<Value>, HttpError> {
    user.require_role(&["admin"], "Not authorized")?;
    let scheme = json!({
        "_id": Uuid::new_v4().to_string(),
        "name": input.name,
        "description": input.description,
        "beneficiary_category": input.beneficiary_category,
        "eligibility_criteria": input.eligibility_criteria,
        "documents_required": input.documents_required,
        "benefits": input.benefits,
        "application_process": input.application_process,
        "department": input.department,
    });
    if let Value::Object(map) = &scheme {
        db.write().await.schemes.push(map.clone());
    }
    Ok(Json(scheme))
}

async fn get_scheme(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Value>, HttpError> {
    let store = db.read().await;
    store
        .schemes
        .iter()
        .find(|scheme| scheme["_id"] == id.as_str())
        .map(|scheme| Json(Value::Object(scheme.clone())))
        .ok_or_else(|| HttpError::new(StatusCode::NOT_FOUND, "Scheme not found"))
}

const STAFF: &[&str] = &["admin", "official"];

async fn admin_stats(State(db): State<Db>, user: CurrentUser) -> Result<Json<Value>, HttpError> {
    user.require_role(STAFF, "Unauthorized")?;
    let store = db.read().await;
    let citizens = store.users.values().filter(|u| u.role() == "citizen").count();
    let pending = store.applications.iter().filter(|a| a["status"] == "Pending").count();
    Ok(Json(json!({
        "total_citizens": citizens,
        "total_schemes": store.schemes.len(),
        "total_pending": pending,
    })))
}

async fn admin_users(State(db): State<Db>, user: CurrentUser) -> Result<Json<Value>, HttpError> {
    user.require_role(STAFF, "Unauthorized")?;
    let store = db.read().await;
    let citizens = store
        .users
        .values()
        .filter(|u| u.role() == "citizen")
        .map(|u| Value::Object(u.profile.clone()))
        .collect();
    Ok(Json(Value::Array(citizens)))
}

async fn pending_applications(State(db): State<Db>, user: CurrentUser) -> Result<Json<Value>, HttpError> {
    user.require_role(STAFF, "Unauthorized")?;
    let store = db.read().await;
    let pending = store
        .applications
        .iter()
        .rev()
        .filter(|a| a["status"] == "Pending")
        .cloned()
        .map(Value::Object)
        .collect();
    Ok(Json(Value::Array(pending)))
}

async fn set_application_status(
    db: &Db,
    user: &CurrentUser,
    id: &str,
    status: &str,
    stamp: &str,
) -> Result<(), HttpError> {
    user.require_role(STAFF, "Unauthorized")?;
    let mut store = db.write().await;
    let application = store
        .applications
        .iter_mut()
        .find(|a| a["_id"] == id)
        .ok_or_else(|| HttpError::new(StatusCode::NOT_FOUND, "Application not found"))?;
    application.insert("status".into(), status.into());
    application.insert(stamp.into(), user.email.clone().into());
    Ok(())
}

async fn verify_application(
    State(db): State<Db>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, HttpError> {
    set_application_status(&db, &user, &id, "Verified", "verified_by").await?;
    Ok(Json(json!({ "message": "Application Verified Successfully", "status": "Verified" })))
}

async fn reject_application(
    State(db): State<Db>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, HttpError> {
    set_application_status(&db, &user, &id, "Rejected", "rejected_by").await?;
    Ok(Json(json!({ "message": "Application Rejected", "status": "Rejected" })))
}

async fn delete_all_applications(State(db): State<Db>, user: CurrentUser) -> Result<Json<Value>, HttpError> {
    user.require_role(STAFF, "Unauthorized")?;
    let mut store = db.write().await;
    let count = store.applications.len();
    store.applications.clear();
    Ok(Json(json!({
        "message": format!("Deleted {count} applications (All Statuses)."),
        "count": count,
    })))
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

async fn chat(Json(input): Json<ChatRequest>) -> Json<Value> {
    Json(json!({ "reply": format!("You asked: {}", input.message) }))
}

#[derive(Deserialize)]
pub struct PersonalInfo {
    pub full_name: String,
    pub age: u32,
    pub bank_account_no: String,
    pub aadhaar_no: String,
    pub phone_number: String,
    pub annual_income: f64,
}

async fn user_id(db: &Db, user: &CurrentUser) -> Result<String, HttpError> {
    db.read()
        .await
        .users
        .get(&user.email)
        .map(UserRecord::id)
        .ok_or_else(|| HttpError::new(StatusCode::NOT_FOUND, "User not found"))
}

async fn submit_info(
    State(db): State<Db>,
    user: CurrentUser,
    Json(input): Json<PersonalInfo>,
) -> Result<Json<Value>, HttpError> {
    let user_id = user_id(&db, &user).await?;
    let id = Uuid::new_v4().to_string();
    let doc = json!({
        "_id": id,
        "user_id": user_id,
        "full_name": input.full_name,
        "age": input.age,
        "bank_account_no": input.bank_account_no,
        "aadhaar_no": input.aadhaar_no,
        "phone_number": input.phone_number,
        "annual_income": input.annual_income,
    });
    if let Value::Object(map) = doc {
        db.write().await.info.push(map);
    }
    Ok(Json(json!({ "message": "Personal information submitted successfully", "id": id })))
}

async fn get_my_info(State(db): State<Db>, user: CurrentUser) -> Result<Json<Value>, HttpError> {
    let user_id = user_id(&db, &user).await?;
    let store = db.read().await;
    let info = store
        .latest_info(&user_id)
        .map(|doc| Value::Object(doc.clone()))
        .unwrap_or_else(|| json!({}));
    Ok(Json(info))
}

#[derive(Deserialize)]
pub struct ApplicationInput {
    pub scheme_id: String,
    pub scheme_name: String,
    pub applicant_name: String,
    #[serde(default)]
    pub details: Map<String, Value>,
}

async fn apply_scheme(
    State(db): State<Db>,
    user: CurrentUser,
    Json(input): Json<ApplicationInput>,
) -> Result<Json<Value>, HttpError> {
    let user_id = user_id(&db, &user).await?;
    let mut store = db.write().await;
    let applicant = match store.latest_info(&user_id) {
        Some(info) => json!({
            "full_name": info["full_name"],
            "phone_number": info["phone_number"],
            "aadhaar_no": info["aadhaar_no"],
        }),
        None => json!({ "full_name": input.applicant_name, "phone": "Not Provided" }),
    };
    let mut details = input.details;
    details.insert("applicant_details".into(), applicant);

    let id = Uuid::new_v4().to_string();
    let application = json!({
        "_id": id,
        "user_id": user_id,
        "scheme_id": input.scheme_id,
        "scheme_name": input.scheme_name,
        "applicant_name": input.applicant_name,
        "status": "Pending",
        "details": details,
    });
    if let Value::Object(map) = application {
        store.applications.push(map);
    }
    Ok(Json(json!({
        "message": "Application Enquiry submitted to Panchayat Office.",
        "id": id,
        "status": "Pending",
    })))
}

async fn my_applications(State(db): State<Db>, user: CurrentUser) -> Result<Json<Value>, HttpError> {
    let user_id = user_id(&db, &user).await?;
    let store = db.read().await;
    let mine = store
        .applications
        .iter()
        .rev()
        .filter(|a| a["user_id"] == user_id.as_str())
        .cloned()
        .map(Value::Object)
        .collect();
    Ok(Json(Value::Array(mine)))
}

async fn generate_message(
    State(db): State<Db>,
    user: CurrentUser,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<Value>, HttpError> {
    let scheme_id = body
        .get("scheme_id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| HttpError::new(StatusCode::BAD_REQUEST, "Scheme ID required"))?;
    let user_id = user_id(&db, &user).await?;
    let store = db.read().await;
    let scheme = store
        .schemes
        .iter()
        .find(|s| s["_id"] == scheme_id)
        .ok_or_else(|| HttpError::new(StatusCode::NOT_FOUND, "Scheme not found"))?;
    let scheme_name = scheme["name"].as_str().unwrap_or("Welfare Scheme");
    let full_name = store
        .latest_info(&user_id)
        .and_then(|info| info["full_name"].as_str())
        .unwrap_or("Citizen");
    let message = format!(
        "*Application for {scheme_name}*\n\nI am {full_name}, a resident of Kanthalloor Panchayat. \
         I would like to apply for the *{scheme_name}*.\n\nThank you."
    );
    Ok(Json(json!({ "message": message, "phone": "919876543210" })))
}
