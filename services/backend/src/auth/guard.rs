//! Role gate middleware.
//!
//! # Purpose
//! Runs the [`AccessGate`] in front of a route and short-circuits with a
//! generic 401/403/500 on denial.
//!
//! # Key invariants
//! - A denied request never reaches the wrapped handler.
//! - On allow, the resolved [`waitress_authz::AuthenticationClaim`] is placed
//!   in request extensions for handlers to read.
//!
//! # Examples
//! ```rust,no_run
//! use axum::routing::get;
//! use backend::app::AppState;
//! use backend::auth::guard;
//! use waitress_authz::{CapabilityGroup, SUBGROUP_ALL};
//!
//! async fn dashboard() -> &'static str {
//!     "ok"
//! }
//!
//! fn route(state: &AppState) -> axum::routing::MethodRouter<AppState> {
//!     guard::require(state, CapabilityGroup::Admin, SUBGROUP_ALL, get(dashboard))
//! }
//! ```
use crate::api::error::api_denied;
use crate::app::AppState;
use crate::auth::cookie::cookie_value;
use crate::observability::record_gate_decision;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::MethodRouter;
use std::sync::Arc;
use waitress_authz::{AccessGate, CapabilityGroup, Credentials, GateDecision};

#[derive(Clone)]
pub struct RouteGuard {
    gate: AccessGate,
    session_cookie: Arc<str>,
    group: CapabilityGroup,
    subgroup: &'static str,
}

impl RouteGuard {
    pub fn new(state: &AppState, group: CapabilityGroup, subgroup: &'static str) -> Self {
        Self {
            gate: state.gate.clone(),
            session_cookie: Arc::from(state.session_cookie.as_str()),
            group,
            subgroup,
        }
    }
}

/// Wrap `route` so every method on it passes `group`/`subgroup` first.
pub fn require(
    state: &AppState,
    group: CapabilityGroup,
    subgroup: &'static str,
    route: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    route.route_layer(middleware::from_fn_with_state(
        RouteGuard::new(state, group, subgroup),
        enforce,
    ))
}

pub async fn enforce(State(guard): State<RouteGuard>, mut request: Request, next: Next) -> Response {
    let decision = {
        let headers = request.headers();
        let credentials = Credentials {
            authorization: headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok()),
            session_id: cookie_value(headers, &guard.session_cookie),
        };
        guard
            .gate
            .authorize(&credentials, guard.group, guard.subgroup)
            .await
    };

    record_gate_decision(guard.group, &decision);
    match decision {
        GateDecision::Allow(claim) => {
            request.extensions_mut().insert(claim);
            next.run(request).await
        }
        GateDecision::Deny(reason) => api_denied(reason).into_response(),
    }
}
