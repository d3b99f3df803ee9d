//! Account storage and credential checks.
//!
//! # Purpose
//! Backs login and user administration with an async store trait and an
//! in-memory implementation seeded from configuration.
//!
//! # Key invariants
//! - Emails are unique and compared case-insensitively.
//! - Only salted digests are stored; plaintext passwords never leave
//!   [`InMemoryIdentityStore::create_user`].
//!
//! # Security considerations
//! Salted SHA-256 is adequate for the in-memory development backend only.
use crate::api::types::UserSummary;
use async_trait::async_trait;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::RwLock;
use waitress_authz::Role;

const SALT_BYTES: usize = 16;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: u64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    password_salt: String,
    password_digest: String,
}

impl UserRecord {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role.to_string(),
        }
    }

    fn password_matches(&self, password: &str) -> bool {
        let candidate = digest_password(&self.password_salt, password);
        constant_time_eq(candidate.as_bytes(), self.password_digest.as_bytes())
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("user already exists: {0}")]
    Conflict(String),
    #[error("invalid user: {0}")]
    Invalid(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> IdentityResult<Option<UserRecord>>;
    /// Returns the account when `password` matches, `None` otherwise.
    async fn verify_password(&self, email: &str, password: &str)
    -> IdentityResult<Option<UserRecord>>;
    async fn create_user(&self, user: NewUser) -> IdentityResult<UserRecord>;
    async fn list_users(&self) -> IdentityResult<Vec<UserRecord>>;
    fn backend_name(&self) -> &'static str;
}

#[derive(Debug)]
pub struct InMemoryIdentityStore {
    users: RwLock<HashMap<String, UserRecord>>,
    next_id: AtomicU64,
}

impl Default for InMemoryIdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_by_email(&self, email: &str) -> IdentityResult<Option<UserRecord>> {
        Ok(self.users.read().await.get(&normalize_email(email)).cloned())
    }

    async fn verify_password(
        &self,
        email: &str,
        password: &str,
    ) -> IdentityResult<Option<UserRecord>> {
        let user = self.find_by_email(email).await?;
        Ok(user.filter(|user| user.password_matches(password)))
    }

    async fn create_user(&self, user: NewUser) -> IdentityResult<UserRecord> {
        let email = normalize_email(&user.email);
        if email.is_empty() || !email.contains('@') {
            return Err(IdentityError::Invalid("email must be an address".to_string()));
        }
        if user.password.is_empty() {
            return Err(IdentityError::Invalid("password must not be empty".to_string()));
        }

        let mut users = self.users.write().await;
        if users.contains_key(&email) {
            return Err(IdentityError::Conflict(email));
        }
        let password_salt = new_salt();
        let record = UserRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            email: email.clone(),
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            password_digest: digest_password(&password_salt, &user.password),
            password_salt,
        };
        users.insert(email, record.clone());
        Ok(record)
    }

    async fn list_users(&self) -> IdentityResult<Vec<UserRecord>> {
        let mut users: Vec<UserRecord> = self.users.read().await.values().cloned().collect();
        users.sort_by_key(|user| user.id);
        Ok(users)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn new_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn digest_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b"|");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
