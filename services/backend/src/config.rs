use anyhow::{Context, Result, bail};
use jsonwebtoken::Algorithm;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::time::Duration;
use waitress_authz::{Role, TokenSecret};

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_METRICS_BIND: &str = "0.0.0.0:9090";
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 86_400;
pub const DEFAULT_SESSION_COOKIE: &str = "waitress_session";

// Backend configuration sourced from environment variables, optionally
// overridden by the YAML file named in WAITRESS_CONFIG.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub jwt_secret: TokenSecret,
    pub jwt_algorithm: Algorithm,
    pub token_ttl: Duration,
    pub session_cookie: String,
    pub bootstrap_users: Vec<BootstrapUser>,
}

/// Account seeded into the identity store at startup.
#[derive(Clone, Deserialize)]
pub struct BootstrapUser {
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl std::fmt::Debug for BootstrapUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapUser")
            .field("email", &self.email)
            .field("role", &self.role)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
struct BackendConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    jwt_secret: Option<String>,
    jwt_algorithm: Option<String>,
    token_ttl_secs: Option<u64>,
    session_cookie: Option<String>,
    #[serde(default)]
    bootstrap_users: Vec<BootstrapUser>,
}

impl BackendConfig {
    pub fn from_env() -> Result<Self> {
        Self::resolve(BackendConfigOverride::default())
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let override_cfg = match std::env::var("WAITRESS_CONFIG") {
            Ok(path) => {
                let contents = fs::read_to_string(&path)
                    .with_context(|| format!("read WAITRESS_CONFIG: {path}"))?;
                serde_yaml::from_str(&contents).with_context(|| "parse backend config yaml")?
            }
            Err(_) => BackendConfigOverride::default(),
        };
        Self::resolve(override_cfg)
    }

    fn resolve(override_cfg: BackendConfigOverride) -> Result<Self> {
        let bind_addr = setting(override_cfg.bind_addr, "WAITRESS_BIND")
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse()
            .with_context(|| "parse WAITRESS_BIND")?;
        let metrics_bind = setting(override_cfg.metrics_bind, "WAITRESS_METRICS_BIND")
            .unwrap_or_else(|| DEFAULT_METRICS_BIND.to_string())
            .parse()
            .with_context(|| "parse WAITRESS_METRICS_BIND")?;

        let secret = setting(override_cfg.jwt_secret, "WAITRESS_JWT_SECRET")
            .context("WAITRESS_JWT_SECRET must be set")?;
        let jwt_secret = TokenSecret::new(secret).with_context(|| "parse WAITRESS_JWT_SECRET")?;

        let jwt_algorithm = match setting(override_cfg.jwt_algorithm, "WAITRESS_JWT_ALGORITHM") {
            Some(value) => parse_algorithm(&value)?,
            None => Algorithm::HS256,
        };

        let ttl_secs = match override_cfg.token_ttl_secs {
            Some(value) => value,
            None => match std::env::var("WAITRESS_TOKEN_TTL_SECS") {
                Ok(value) => value
                    .parse()
                    .with_context(|| "parse WAITRESS_TOKEN_TTL_SECS")?,
                Err(_) => DEFAULT_TOKEN_TTL_SECS,
            },
        };
        if ttl_secs == 0 {
            bail!("WAITRESS_TOKEN_TTL_SECS must be positive");
        }

        let session_cookie = setting(override_cfg.session_cookie, "WAITRESS_SESSION_COOKIE")
            .unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string());
        if session_cookie.is_empty() {
            bail!("WAITRESS_SESSION_COOKIE must not be empty");
        }

        Ok(Self {
            bind_addr,
            metrics_bind,
            jwt_secret,
            jwt_algorithm,
            token_ttl: Duration::from_secs(ttl_secs),
            session_cookie,
            bootstrap_users: override_cfg.bootstrap_users,
        })
    }
}

// YAML wins over the environment.
fn setting(yaml: Option<String>, env_key: &str) -> Option<String> {
    yaml.or_else(|| std::env::var(env_key).ok())
}

fn parse_algorithm(value: &str) -> Result<Algorithm> {
    match value {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => bail!("unsupported WAITRESS_JWT_ALGORITHM: {other} (expected HS256, HS384 or HS512)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct EnvGuard {
        key: &'static str,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let prev = std::env::var(key).ok();
            unsafe {
                std::env::set_var(key, value);
            }
            Self { key, prev }
        }

        fn unset(key: &'static str) -> Self {
            let prev = std::env::var(key).ok();
            unsafe {
                std::env::remove_var(key);
            }
            Self { key, prev }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.prev {
                Some(value) => unsafe {
                    std::env::set_var(self.key, value);
                },
                None => unsafe {
                    std::env::remove_var(self.key);
                },
            }
        }
    }

    fn clear_all() -> Vec<EnvGuard> {
        [
            "WAITRESS_BIND",
            "WAITRESS_METRICS_BIND",
            "WAITRESS_JWT_SECRET",
            "WAITRESS_JWT_ALGORITHM",
            "WAITRESS_TOKEN_TTL_SECS",
            "WAITRESS_SESSION_COOKIE",
            "WAITRESS_CONFIG",
        ]
        .into_iter()
        .map(EnvGuard::unset)
        .collect()
    }

    #[test]
    #[serial]
    fn defaults_apply_when_only_secret_is_set() {
        let _cleared = clear_all();
        let _secret = EnvGuard::set("WAITRESS_JWT_SECRET", "s3cret");

        let config = BackendConfig::from_env().expect("config");
        assert_eq!(config.bind_addr, DEFAULT_BIND.parse::<SocketAddr>().expect("addr"));
        assert_eq!(
            config.metrics_bind,
            DEFAULT_METRICS_BIND.parse::<SocketAddr>().expect("addr")
        );
        assert_eq!(config.jwt_algorithm, Algorithm::HS256);
        assert_eq!(config.token_ttl, Duration::from_secs(DEFAULT_TOKEN_TTL_SECS));
        assert_eq!(config.session_cookie, DEFAULT_SESSION_COOKIE);
        assert!(config.bootstrap_users.is_empty());
    }

    #[test]
    #[serial]
    fn missing_secret_fails() {
        let _cleared = clear_all();
        let err = BackendConfig::from_env().expect_err("secret required");
        assert!(err.to_string().contains("WAITRESS_JWT_SECRET"));
    }

    #[test]
    #[serial]
    fn empty_secret_fails() {
        let _cleared = clear_all();
        let _secret = EnvGuard::set("WAITRESS_JWT_SECRET", "");
        assert!(BackendConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn env_values_are_parsed() {
        let _cleared = clear_all();
        let _secret = EnvGuard::set("WAITRESS_JWT_SECRET", "s3cret");
        let _bind = EnvGuard::set("WAITRESS_BIND", "127.0.0.1:18080");
        let _alg = EnvGuard::set("WAITRESS_JWT_ALGORITHM", "HS512");
        let _ttl = EnvGuard::set("WAITRESS_TOKEN_TTL_SECS", "60");
        let _cookie = EnvGuard::set("WAITRESS_SESSION_COOKIE", "mysession");

        let config = BackendConfig::from_env().expect("config");
        assert_eq!(config.bind_addr.port(), 18080);
        assert_eq!(config.jwt_algorithm, Algorithm::HS512);
        assert_eq!(config.token_ttl, Duration::from_secs(60));
        assert_eq!(config.session_cookie, "mysession");
    }

    #[test]
    #[serial]
    fn rejects_non_hmac_algorithm_and_bad_ttl() {
        let _cleared = clear_all();
        let _secret = EnvGuard::set("WAITRESS_JWT_SECRET", "s3cret");
        {
            let _alg = EnvGuard::set("WAITRESS_JWT_ALGORITHM", "RS256");
            assert!(BackendConfig::from_env().is_err());
        }
        {
            let _ttl = EnvGuard::set("WAITRESS_TOKEN_TTL_SECS", "0");
            assert!(BackendConfig::from_env().is_err());
        }
        {
            let _ttl = EnvGuard::set("WAITRESS_TOKEN_TTL_SECS", "soon");
            assert!(BackendConfig::from_env().is_err());
        }
    }

    #[test]
    #[serial]
    fn yaml_overrides_env() {
        let _cleared = clear_all();
        let _secret = EnvGuard::set("WAITRESS_JWT_SECRET", "from-env");
        let _bind = EnvGuard::set("WAITRESS_BIND", "127.0.0.1:1");

        let path = std::env::temp_dir().join(format!(
            "waitress-config-{}.yaml",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"
bind_addr: "127.0.0.1:28080"
token_ttl_secs: 120
session_cookie: "yaml_session"
bootstrap_users:
  - email: "root@example.com"
    password: "changeme"
    role: "dev"
    first_name: "Root"
"#,
        )
        .expect("write yaml");
        let _config_path = EnvGuard::set("WAITRESS_CONFIG", path.to_str().expect("utf8 path"));

        let config = BackendConfig::from_env_or_yaml().expect("config");
        assert_eq!(config.bind_addr.port(), 28080);
        assert_eq!(config.token_ttl, Duration::from_secs(120));
        assert_eq!(config.session_cookie, "yaml_session");
        assert_eq!(config.bootstrap_users.len(), 1);
        assert_eq!(config.bootstrap_users[0].role, Role::Dev);
        assert_eq!(config.bootstrap_users[0].last_name, "");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    #[serial]
    fn missing_yaml_file_is_an_error() {
        let _cleared = clear_all();
        let _secret = EnvGuard::set("WAITRESS_JWT_SECRET", "s3cret");
        let _config_path = EnvGuard::set("WAITRESS_CONFIG", "/nonexistent/waitress.yaml");
        let err = BackendConfig::from_env_or_yaml().expect_err("missing file");
        assert!(err.to_string().contains("WAITRESS_CONFIG"));
    }

    #[test]
    fn bootstrap_user_debug_redacts_password() {
        let user = BootstrapUser {
            email: "a@b.c".to_string(),
            password: "hunter2".to_string(),
            role: Role::Customer,
            first_name: String::new(),
            last_name: String::new(),
        };
        let rendered = format!("{user:?}");
        assert!(!rendered.contains("hunter2"));
    }
}
