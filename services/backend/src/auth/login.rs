//! Login, logout, and caller introspection endpoints.
//!
//! # Purpose
//! Establishes both authentication channels at once: a successful login
//! returns a bearer token and stores a server-side session named by a cookie.
//!
//! # Security considerations
//! - Unknown email and wrong password produce the same 401.
//! - Logout is idempotent and always expires the cookie.
use crate::api::error::{
    ApiError, api_internal, api_internal_message, api_unauthorized, api_validation_error,
};
use crate::api::types::{LoginRequest, LoginResponse, WhoAmIResponse};
use crate::app::AppState;
use crate::auth::cookie::{cookie_value, expired_cookie, session_cookie};
use crate::observability::{LoginOutcome, record_login};
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use waitress_authz::{AuthenticationClaim, BEARER_PREFIX, SessionRecord, new_session_id};

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued and session created", body = LoginResponse),
        (status = 400, description = "Missing email or password", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(api_validation_error("email and password are required"));
    }

    let user = state
        .identity
        .verify_password(&body.email, &body.password)
        .await
        .map_err(|err| api_internal("failed to verify credentials", &err))?;
    let Some(user) = user else {
        record_login(LoginOutcome::Rejected);
        tracing::info!("login rejected");
        return Err(api_unauthorized("invalid credentials"));
    };

    let token = state
        .issuer
        .mint(user.id, &user.email, user.role)
        .map_err(|err| {
            tracing::error!(error = %err, "token mint failed");
            api_internal_message("failed to issue token")
        })?;

    let session_id = new_session_id();
    state
        .sessions
        .insert(
            session_id.clone(),
            SessionRecord::new(&user.email, user.role, state.issuer.expires_at()),
        )
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "session insert failed");
            api_internal_message("failed to create session")
        })?;

    record_login(LoginOutcome::Success);
    tracing::info!(user_id = user.id, role = %user.role, "login succeeded");

    let ttl = state.issuer.ttl();
    let cookie = session_cookie(&state.session_cookie, &session_id, ttl);
    let body = LoginResponse {
        token,
        token_type: BEARER_PREFIX.trim_end().to_string(),
        expires_in: ttl.as_secs(),
        user: user.summary(),
    };
    Ok(([(SET_COOKIE, cookie)], Json(body)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses((status = 204, description = "Session removed and cookie expired"))
)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    if let Some(session_id) = cookie_value(&headers, &state.session_cookie) {
        let removed = state.sessions.remove(session_id).await.map_err(|err| {
            tracing::error!(error = %err, "session remove failed");
            api_internal_message("failed to end session")
        })?;
        tracing::debug!(removed, "logout");
    }
    Ok((
        StatusCode::NO_CONTENT,
        [(SET_COOKIE, expired_cookie(&state.session_cookie))],
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Resolved caller identity", body = WhoAmIResponse),
        (status = 401, description = "Authentication required", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn me(Extension(claim): Extension<AuthenticationClaim>) -> Json<WhoAmIResponse> {
    Json(WhoAmIResponse {
        subject: claim.subject,
        role: claim.role.to_string(),
        source: claim.source.as_str().to_string(),
    })
}
