//! User administration endpoints.
//!
//! # Purpose
//! Lists and creates accounts. Listing needs the Admin tier; creation needs
//! the Admin super tier.
//!
//! # Security considerations
//! - A caller can never create an account more privileged than their own role.
use crate::api::error::{
    ApiError, api_conflict, api_forbidden, api_internal, api_validation_error,
};
use crate::api::types::{UserCreateRequest, UserListResponse, UserSummary};
use crate::app::AppState;
use crate::auth::identity::{IdentityError, NewUser};
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use waitress_authz::{AuthenticationClaim, Role};

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    responses(
        (status = 200, description = "All accounts", body = UserListResponse),
        (status = 401, description = "Authentication required", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Not permitted", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<UserListResponse>, ApiError> {
    let users = state
        .identity
        .list_users()
        .await
        .map_err(|err| api_internal("failed to list users", &err))?;
    Ok(Json(UserListResponse {
        items: users.iter().map(|user| user.summary()).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = UserCreateRequest,
    responses(
        (status = 201, description = "Account created", body = UserSummary),
        (status = 400, description = "Invalid account", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Not permitted", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Extension(claim): Extension<AuthenticationClaim>,
    Json(body): Json<UserCreateRequest>,
) -> Result<(StatusCode, Json<UserSummary>), ApiError> {
    let role: Role = body
        .role
        .parse()
        .map_err(|_| api_validation_error("unknown role"))?;
    if role.rank() < claim.role.rank() {
        tracing::info!(caller = %claim.role, requested = %role, "role escalation refused");
        return Err(api_forbidden("not permitted"));
    }

    let created = state
        .identity
        .create_user(NewUser {
            email: body.email,
            password: body.password,
            first_name: body.first_name,
            last_name: body.last_name,
            role,
        })
        .await
        .map_err(|err| match err {
            IdentityError::Conflict(_) => api_conflict("already_exists", "email already registered"),
            IdentityError::Invalid(reason) => api_validation_error(&reason),
            other => api_internal("failed to create user", &other),
        })?;
    tracing::info!(user_id = created.id, role = %created.role, created_by = %claim.subject, "user created");
    Ok((StatusCode::CREATED, Json(created.summary())))
}
