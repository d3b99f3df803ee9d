//! Role taxonomy and role-set primitives.
//!
//! # Purpose
//! Defines the closed universe of caller roles and the set type used as the
//! unit of permission comparison.
//!
//! # Key invariants
//! - The role universe is fixed at compile time; nothing creates roles at runtime.
//! - Variant order is privilege order: `Dev` is the most privileged, `Customer`
//!   the least.
//! - Wire strings are lowercase snake case and parsed case-sensitively.
//!
//! # Examples
//! ```rust
//! use waitress_authz::{Role, RoleSet, merge_sets};
//!
//! let admins = RoleSet::of([Role::AdminSuper, Role::Admin]);
//! let devs = RoleSet::of([Role::Dev]);
//! let merged = merge_sets([&devs, &admins]);
//! assert_eq!(merged.len(), 3);
//! assert_eq!("admin_super".parse::<Role>().ok(), Some(Role::AdminSuper));
//! ```
use crate::AuthzError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Dev,
    AdminSuper,
    Admin,
    StaffSuper,
    Staff,
    Customer,
}

impl Role {
    /// Every role, highest privilege first.
    pub const ALL_ORDERED: [Role; 6] = [
        Role::Dev,
        Role::AdminSuper,
        Role::Admin,
        Role::StaffSuper,
        Role::Staff,
        Role::Customer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Dev => "dev",
            Role::AdminSuper => "admin_super",
            Role::Admin => "admin",
            Role::StaffSuper => "staff_super",
            Role::Staff => "staff",
            Role::Customer => "customer",
        }
    }

    /// Position in [`Role::ALL_ORDERED`]; lower is more privileged.
    pub fn rank(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = AuthzError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "dev" => Ok(Role::Dev),
            "admin_super" => Ok(Role::AdminSuper),
            "admin" => Ok(Role::Admin),
            "staff_super" => Ok(Role::StaffSuper),
            "staff" => Ok(Role::Staff),
            "customer" => Ok(Role::Customer),
            _ => Err(AuthzError::UnknownRole(value.to_string())),
        }
    }
}

/// Unordered collection of roles used for membership checks.
///
/// # Invariants
/// - Equality is set equality; construction order never matters.
/// - Sets are immutable once built. Combine them with [`merge_sets`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    pub fn of(roles: impl IntoIterator<Item = Role>) -> Self {
        roles.into_iter().collect()
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate members from highest to lowest privilege.
    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Union any number of role sets.
///
/// Order-independent and idempotent: merging the same inputs in any order, or
/// merging a set with itself, yields the same set.
pub fn merge_sets<'a>(sets: impl IntoIterator<Item = &'a RoleSet>) -> RoleSet {
    sets.into_iter().flat_map(RoleSet::iter).collect()
}
