#![allow(dead_code)]

use axum::Router;
use backend::app::{AppState, build_router, build_state};
use backend::config::{BackendConfig, BootstrapUser};
use jsonwebtoken::Algorithm;
use std::sync::Arc;
use std::time::Duration;
use waitress_authz::{FixedClock, Role, TokenSecret};

pub const NOW: i64 = 1_700_000_000;
pub const TTL_SECS: u64 = 3_600;
pub const COOKIE_NAME: &str = "waitress_session";
pub const JWT_SECRET: &str = "integration-secret";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: Arc<FixedClock>,
}

impl TestApp {
    /// Bearer header value for a freshly minted token.
    pub fn bearer_for(&self, role: Role) -> String {
        let token = self
            .state
            .issuer
            .mint(1, &email_for(role), role)
            .expect("mint token");
        format!("Bearer {token}")
    }
}

pub fn email_for(role: Role) -> String {
    format!("{}@example.com", role.as_str())
}

pub fn password_for(role: Role) -> String {
    format!("password-{}", role.as_str())
}

pub fn test_config() -> BackendConfig {
    BackendConfig {
        bind_addr: "127.0.0.1:0".parse().expect("bind"),
        metrics_bind: "127.0.0.1:0".parse().expect("metrics"),
        jwt_secret: TokenSecret::new(JWT_SECRET).expect("secret"),
        jwt_algorithm: Algorithm::HS256,
        token_ttl: Duration::from_secs(TTL_SECS),
        session_cookie: COOKIE_NAME.to_string(),
        bootstrap_users: Role::ALL_ORDERED
            .iter()
            .map(|role| BootstrapUser {
                email: email_for(*role),
                password: password_for(*role),
                role: *role,
                first_name: "Test".to_string(),
                last_name: role.as_str().to_string(),
            })
            .collect(),
    }
}

pub async fn test_app() -> TestApp {
    let clock = Arc::new(FixedClock::new(NOW));
    let state = build_state(&test_config(), clock.clone())
        .await
        .expect("build state");
    TestApp {
        router: build_router(state.clone()),
        state,
        clock,
    }
}

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}
