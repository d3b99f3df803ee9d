//! HTTP API request/response types.
//!
//! # Purpose
//! Defines shared payload shapes for the backend REST API and OpenAPI schema
//! generation.
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserSummary,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub id: u64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct UserListResponse {
    pub items: Vec<UserSummary>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct UserCreateRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: String,
}

/// Identity of the caller as resolved by the gate.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct WhoAmIResponse {
    pub subject: String,
    pub role: String,
    pub source: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct RoleCatalogResponse {
    pub admin_roles: Vec<String>,
    pub staff_roles: Vec<String>,
    pub all_roles: Vec<String>,
    pub gates: Vec<GateEntry>,
}

/// One (group, subgroup) table entry and the roles it admits.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct GateEntry {
    pub group: String,
    pub subgroup: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct BackendHealthResponse {
    pub status: String,
    pub identity_backend: String,
    pub session_backend: String,
    pub user_count: usize,
}
