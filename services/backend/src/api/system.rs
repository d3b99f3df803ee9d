//! System and health endpoints.
//!
//! # Key invariants and assumptions
//! - `/health` is unguarded, fast, and side-effect free.
//! - `/api/db/health` is Dev-only because it reveals backend names.
use crate::api::error::{ApiError, api_internal};
use crate::api::openapi::ApiDoc;
use crate::api::types::{BackendHealthResponse, GateEntry, HealthStatus, RoleCatalogResponse};
use crate::app::AppState;
use axum::Json;
use axum::extract::State;
use utoipa::OpenApi;
use waitress_authz::CapabilityGroup;

#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service liveness", body = HealthStatus)
    )
)]
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/api/db/health",
    tag = "system",
    responses(
        (status = 200, description = "Store backends and account count", body = BackendHealthResponse),
        (status = 403, description = "Not permitted", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn backend_health(
    State(state): State<AppState>,
) -> Result<Json<BackendHealthResponse>, ApiError> {
    let users = state
        .identity
        .list_users()
        .await
        .map_err(|err| api_internal("identity store unavailable", &err))?;
    Ok(Json(BackendHealthResponse {
        status: "ok".to_string(),
        identity_backend: state.identity.backend_name().to_string(),
        session_backend: state.sessions.backend_name().to_string(),
        user_count: users.len(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/admin/roles",
    tag = "system",
    responses(
        (status = 200, description = "Role names by group", body = RoleCatalogResponse),
        (status = 403, description = "Not permitted", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn role_catalog(State(state): State<AppState>) -> Json<RoleCatalogResponse> {
    let registry = &state.registry;
    let mut gates = Vec::new();
    for group in CapabilityGroup::ALL {
        for subgroup in state.table.subgroups(group) {
            if let Ok(roles) = state.table.permitted(group, subgroup) {
                gates.push(GateEntry {
                    group: group.to_string(),
                    subgroup: subgroup.to_string(),
                    roles: roles.iter().map(|role| role.to_string()).collect(),
                });
            }
        }
    }
    Json(RoleCatalogResponse {
        admin_roles: registry.admin_role_names(),
        staff_roles: registry.staff_role_names(),
        all_roles: registry
            .all_ordered()
            .iter()
            .map(|role| role.to_string())
            .collect(),
        gates,
    })
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
