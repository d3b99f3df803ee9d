//! Named role groups.
//!
//! # Purpose
//! Precomputes the reusable role sets ("Dev roles", "Admin roles", ...) that
//! permission-table entries are built from.
//!
//! # Key invariants
//! - Construction is pure and deterministic; there are no inputs beyond the
//!   fixed role universe.
//! - The registry is read-only after [`GroupRegistry::build`].
use crate::{Role, RoleSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRegistry {
    dev_roles: RoleSet,
    admin_roles: RoleSet,
    staff_roles: RoleSet,
    all_roles: RoleSet,
    all_ordered: Vec<Role>,
}

impl GroupRegistry {
    /// Build the registry from the fixed role taxonomy.
    ///
    /// # Example
    /// ```rust
    /// use waitress_authz::{GroupRegistry, Role};
    ///
    /// let registry = GroupRegistry::build();
    /// assert!(registry.admin_roles().contains(Role::AdminSuper));
    /// assert_eq!(registry.all_ordered().first(), Some(&Role::Dev));
    /// ```
    pub fn build() -> Self {
        Self {
            dev_roles: RoleSet::of([Role::Dev]),
            admin_roles: RoleSet::of([Role::AdminSuper, Role::Admin]),
            staff_roles: RoleSet::of([Role::StaffSuper, Role::Staff]),
            all_roles: RoleSet::of(Role::ALL_ORDERED),
            all_ordered: Role::ALL_ORDERED.to_vec(),
        }
    }

    pub fn dev_roles(&self) -> &RoleSet {
        &self.dev_roles
    }

    pub fn admin_roles(&self) -> &RoleSet {
        &self.admin_roles
    }

    pub fn staff_roles(&self) -> &RoleSet {
        &self.staff_roles
    }

    pub fn all_roles(&self) -> &RoleSet {
        &self.all_roles
    }

    /// Every role, highest privilege first.
    pub fn all_ordered(&self) -> &[Role] {
        &self.all_ordered
    }

    pub fn admin_role_names(&self) -> Vec<String> {
        self.admin_roles.iter().map(|role| role.to_string()).collect()
    }

    pub fn staff_role_names(&self) -> Vec<String> {
        self.staff_roles.iter().map(|role| role.to_string()).collect()
    }
}

impl Default for GroupRegistry {
    fn default() -> Self {
        Self::build()
    }
}
