//! Hierarchical permission table.
//!
//! # Purpose
//! Maps each (capability group, subgroup) pair to the cumulative role set
//! allowed through that gate.
//!
//! # Key invariants
//! - Under `"all"`: `Dev ⊆ Admin ⊆ Staff ⊆ Customer`.
//! - Every entry is a union of named registry groups plus at most one
//!   individual role, so widening a tier never drops a role.
//! - A missing pair is a wiring bug ([`AuthzError::UnknownSubgroup`]), not an
//!   access-denied outcome.
use crate::{AuthzError, AuthzResult, GroupRegistry, Role, RoleSet, merge_sets};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Subgroup open to every role of the group's tier and above.
pub const SUBGROUP_ALL: &str = "all";
/// Subgroup restricted to the tier's super role and above.
pub const SUBGROUP_SUPER: &str = "super";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapabilityGroup {
    Dev,
    Admin,
    Staff,
    Customer,
}

impl CapabilityGroup {
    pub const ALL: [CapabilityGroup; 4] = [
        CapabilityGroup::Dev,
        CapabilityGroup::Admin,
        CapabilityGroup::Staff,
        CapabilityGroup::Customer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CapabilityGroup::Dev => "Dev",
            CapabilityGroup::Admin => "Admin",
            CapabilityGroup::Staff => "Staff",
            CapabilityGroup::Customer => "Customer",
        }
    }
}

impl std::fmt::Display for CapabilityGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

type SubgroupMap = HashMap<String, RoleSet>;

#[derive(Debug, Clone)]
pub struct PermissionTable {
    dev: SubgroupMap,
    admin: SubgroupMap,
    staff: SubgroupMap,
    customer: SubgroupMap,
}

impl PermissionTable {
    /// Compute every gate's cumulative role set from the registry.
    pub fn build(registry: &GroupRegistry) -> Self {
        let devs = registry.dev_roles();
        let admins = registry.admin_roles();
        let staff = registry.staff_roles();
        let everyone = registry.all_roles();
        let admin_super = RoleSet::of([Role::AdminSuper]);
        let staff_super = RoleSet::of([Role::StaffSuper]);

        let dev = HashMap::from([(SUBGROUP_ALL.to_string(), merge_sets([devs]))]);
        let admin = HashMap::from([
            (SUBGROUP_SUPER.to_string(), merge_sets([devs, &admin_super])),
            (SUBGROUP_ALL.to_string(), merge_sets([devs, admins])),
        ]);
        let staff_map = HashMap::from([
            (
                SUBGROUP_SUPER.to_string(),
                merge_sets([devs, admins, &staff_super]),
            ),
            (SUBGROUP_ALL.to_string(), merge_sets([devs, admins, staff])),
        ]);
        // AllRoles already covers the rest; the explicit union keeps the
        // inclusion chain visible.
        let customer = HashMap::from([(
            SUBGROUP_ALL.to_string(),
            merge_sets([devs, admins, staff, everyone]),
        )]);

        Self {
            dev,
            admin,
            staff: staff_map,
            customer,
        }
    }

    fn subgroups_of(&self, group: CapabilityGroup) -> &SubgroupMap {
        match group {
            CapabilityGroup::Dev => &self.dev,
            CapabilityGroup::Admin => &self.admin,
            CapabilityGroup::Staff => &self.staff,
            CapabilityGroup::Customer => &self.customer,
        }
    }

    /// Role set permitted through `group`/`subgroup`.
    ///
    /// # Errors
    /// Returns [`AuthzError::UnknownSubgroup`] when the pair has no entry.
    pub fn permitted(&self, group: CapabilityGroup, subgroup: &str) -> AuthzResult<&RoleSet> {
        self.subgroups_of(group)
            .get(subgroup)
            .ok_or_else(|| AuthzError::UnknownSubgroup {
                group,
                subgroup: subgroup.to_string(),
            })
    }

    /// Defined subgroup names for `group`, sorted.
    pub fn subgroups(&self, group: CapabilityGroup) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .subgroups_of(group)
            .keys()
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names
    }
}
