//! Backend HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, attaches the role gate to each protected route,
//! and defines the shared application state injected into handlers.
//!
//! # Notes
//! Every guarded route is listed in [`ROUTE_GATES`]; [`validate_route_gates`]
//! checks that list against the permission table before serving so a wiring
//! mistake fails boot instead of returning 500s.
use crate::api;
use crate::auth::guard;
use crate::auth::identity::{IdentityStore, InMemoryIdentityStore, NewUser};
use crate::auth::login;
use crate::config::BackendConfig;
use crate::observability;
use anyhow::Context;
use axum::Router;
use axum::routing::{MethodRouter, get, post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use waitress_authz::{
    AccessGate, AuthResolver, CapabilityGroup, Clock, GroupRegistry, InMemorySessionStore,
    PermissionTable, SUBGROUP_ALL, SUBGROUP_SUPER, SessionStore, TokenIssuer, TokenVerifier,
};

#[derive(Clone)]
pub struct AppState {
    pub gate: AccessGate,
    pub registry: Arc<GroupRegistry>,
    pub table: Arc<PermissionTable>,
    pub identity: Arc<dyn IdentityStore + Send + Sync>,
    pub sessions: Arc<dyn SessionStore>,
    pub issuer: Arc<TokenIssuer>,
    pub session_cookie: String,
}

/// A (method, path) pair and the gate it sits behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteGate {
    pub method: &'static str,
    pub path: &'static str,
    pub group: CapabilityGroup,
    pub subgroup: &'static str,
}

pub const ME_GATE: RouteGate = RouteGate {
    method: "GET",
    path: "/api/auth/me",
    group: CapabilityGroup::Customer,
    subgroup: SUBGROUP_ALL,
};

pub const LIST_USERS_GATE: RouteGate = RouteGate {
    method: "GET",
    path: "/api/users",
    group: CapabilityGroup::Admin,
    subgroup: SUBGROUP_ALL,
};

pub const CREATE_USER_GATE: RouteGate = RouteGate {
    method: "POST",
    path: "/api/users",
    group: CapabilityGroup::Admin,
    subgroup: SUBGROUP_SUPER,
};

pub const ROLE_CATALOG_GATE: RouteGate = RouteGate {
    method: "GET",
    path: "/api/admin/roles",
    group: CapabilityGroup::Staff,
    subgroup: SUBGROUP_SUPER,
};

pub const BACKEND_HEALTH_GATE: RouteGate = RouteGate {
    method: "GET",
    path: "/api/db/health",
    group: CapabilityGroup::Dev,
    subgroup: SUBGROUP_ALL,
};

pub const ROUTE_GATES: [RouteGate; 5] = [
    ME_GATE,
    LIST_USERS_GATE,
    CREATE_USER_GATE,
    ROLE_CATALOG_GATE,
    BACKEND_HEALTH_GATE,
];

/// Fail if any entry in `gates` names a pair the table does not define.
pub fn validate_route_gates(table: &PermissionTable, gates: &[RouteGate]) -> anyhow::Result<()> {
    for gate in gates {
        table
            .permitted(gate.group, gate.subgroup)
            .with_context(|| format!("route {} {} is wired to an undefined gate", gate.method, gate.path))?;
    }
    Ok(())
}

fn guarded(state: &AppState, gate: RouteGate, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    guard::require(state, gate.group, gate.subgroup, route)
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });

    Router::new()
        .route("/health", get(api::system::health))
        .route("/api/openapi.json", get(api::system::openapi_json))
        .route("/api/auth/login", post(login::login))
        .route("/api/auth/logout", post(login::logout))
        .route(ME_GATE.path, guarded(&state, ME_GATE, get(login::me)))
        .route(
            LIST_USERS_GATE.path,
            guarded(&state, LIST_USERS_GATE, get(api::users::list_users)).merge(guarded(
                &state,
                CREATE_USER_GATE,
                post(api::users::create_user),
            )),
        )
        .route(
            ROLE_CATALOG_GATE.path,
            guarded(&state, ROLE_CATALOG_GATE, get(api::system::role_catalog)),
        )
        .route(
            BACKEND_HEALTH_GATE.path,
            guarded(&state, BACKEND_HEALTH_GATE, get(api::system::backend_health)),
        )
        .layer(trace_layer)
        .with_state(state)
}

/// Wire stores, tokens, and the gate from configuration.
pub async fn build_state(config: &BackendConfig, clock: Arc<dyn Clock>) -> anyhow::Result<AppState> {
    let registry = Arc::new(GroupRegistry::build());
    let table = Arc::new(PermissionTable::build(&registry));
    validate_route_gates(&table, &ROUTE_GATES)?;

    let verifier = TokenVerifier::new(&config.jwt_secret, config.jwt_algorithm, clock.clone())
        .context("build token verifier")?;
    let issuer = TokenIssuer::new(
        &config.jwt_secret,
        config.jwt_algorithm,
        config.token_ttl,
        clock.clone(),
    )
    .context("build token issuer")?;

    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(clock));
    let identity: Arc<dyn IdentityStore + Send + Sync> = Arc::new(InMemoryIdentityStore::new());
    for user in &config.bootstrap_users {
        identity
            .create_user(NewUser {
                email: user.email.clone(),
                password: user.password.clone(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                role: user.role,
            })
            .await
            .with_context(|| format!("seed bootstrap user {}", user.email))?;
    }
    tracing::info!(
        users = config.bootstrap_users.len(),
        identity_backend = identity.backend_name(),
        session_backend = sessions.backend_name(),
        "backend state ready"
    );

    let resolver = Arc::new(AuthResolver::new(verifier, sessions.clone()));
    Ok(AppState {
        gate: AccessGate::new(table.clone(), resolver),
        registry,
        table,
        identity,
        sessions,
        issuer: Arc::new(issuer),
        session_cookie: config.session_cookie.clone(),
    })
}
