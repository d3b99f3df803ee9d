//! OpenAPI schema aggregation for the backend API.
use crate::api::{
    system, users,
    types::{
        BackendHealthResponse, ErrorResponse, GateEntry, HealthStatus, LoginRequest, LoginResponse,
        RoleCatalogResponse, UserCreateRequest, UserListResponse, UserSummary, WhoAmIResponse,
    },
};
use crate::auth::login;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "waitress-backend",
        version = "v1",
        description = "Waitress restaurant backend HTTP API"
    ),
    paths(
        system::health,
        system::backend_health,
        system::role_catalog,
        login::login,
        login::logout,
        login::me,
        users::list_users,
        users::create_user
    ),
    components(schemas(
        HealthStatus,
        ErrorResponse,
        LoginRequest,
        LoginResponse,
        WhoAmIResponse,
        UserSummary,
        UserListResponse,
        UserCreateRequest,
        RoleCatalogResponse,
        GateEntry,
        BackendHealthResponse
    )),
    tags(
        (name = "system", description = "Health and discovery endpoints"),
        (name = "auth", description = "Login, logout, and caller identity"),
        (name = "users", description = "Account administration")
    )
)]
pub struct ApiDoc;
