//! The single enforcement point for protected operations.
//!
//! # Key invariants
//! - Resolution runs before the table lookup, so an anonymous caller on a
//!   miswired route still sees `Unauthenticated`.
//! - A missing table entry is logged at `error` as a wiring bug.
//! - The gate holds only read-only shared state and is safe to call from any
//!   number of concurrent requests.
use crate::{AuthResolver, AuthenticationClaim, CapabilityGroup, Credentials, PermissionTable};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Unauthenticated,
    Forbidden,
    Configuration,
}

impl DenyReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DenyReason::Unauthenticated => "unauthenticated",
            DenyReason::Forbidden => "forbidden",
            DenyReason::Configuration => "configuration",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow(AuthenticationClaim),
    Deny(DenyReason),
}

#[derive(Clone)]
pub struct AccessGate {
    table: Arc<PermissionTable>,
    resolver: Arc<AuthResolver>,
}

impl AccessGate {
    pub fn new(table: Arc<PermissionTable>, resolver: Arc<AuthResolver>) -> Self {
        Self { table, resolver }
    }

    /// Decide whether the presented credentials pass `group`/`subgroup`.
    pub async fn authorize(
        &self,
        credentials: &Credentials<'_>,
        group: CapabilityGroup,
        subgroup: &str,
    ) -> GateDecision {
        let claim = match self.resolver.resolve(credentials).await {
            Ok(claim) => claim,
            Err(_) => {
                tracing::debug!(%group, subgroup, "gate denied: unauthenticated");
                return GateDecision::Deny(DenyReason::Unauthenticated);
            }
        };

        let permitted = match self.table.permitted(group, subgroup) {
            Ok(permitted) => permitted,
            Err(err) => {
                tracing::error!(error = %err, %group, subgroup, "gate misconfigured");
                return GateDecision::Deny(DenyReason::Configuration);
            }
        };

        if !permitted.contains(claim.role) {
            tracing::info!(
                %group,
                subgroup,
                role = %claim.role,
                subject = %claim.subject,
                "gate denied: forbidden"
            );
            return GateDecision::Deny(DenyReason::Forbidden);
        }

        tracing::debug!(
            %group,
            subgroup,
            role = %claim.role,
            source = claim.source.as_str(),
            "gate allowed"
        );
        GateDecision::Allow(claim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::tests::{CountingSessionStore, NOW, bearer, clock, issuer, resolver};
    use crate::{
        ClaimSource, FixedClock, GroupRegistry, Role, SUBGROUP_ALL, SUBGROUP_SUPER,
        SessionRecord, SessionStore,
    };

    fn allowed_role(decision: &GateDecision) -> Option<Role> {
        match decision {
            GateDecision::Allow(claim) => Some(claim.role),
            GateDecision::Deny(_) => None,
        }
    }

    fn gate(clock: Arc<FixedClock>, sessions: Arc<dyn SessionStore>) -> AccessGate {
        let table = Arc::new(PermissionTable::build(&GroupRegistry::build()));
        AccessGate::new(table, Arc::new(resolver(clock, sessions)))
    }

    async fn decide_with_token(role: Role, group: CapabilityGroup, subgroup: &str) -> GateDecision {
        let clock = clock();
        let gate = gate(clock.clone(), Arc::new(CountingSessionStore::new(clock.clone())));
        let token = issuer(clock)
            .mint(1, "caller@example.com", role)
            .expect("mint");
        let header = bearer(&token);
        gate.authorize(&Credentials::bearer(&header), group, subgroup)
            .await
    }

    #[tokio::test]
    async fn dev_passes_admin_gate() {
        let decision = decide_with_token(Role::Dev, CapabilityGroup::Admin, SUBGROUP_ALL).await;
        assert_eq!(allowed_role(&decision), Some(Role::Dev));
    }

    #[tokio::test]
    async fn customer_is_forbidden_from_admin_gate() {
        let decision =
            decide_with_token(Role::Customer, CapabilityGroup::Admin, SUBGROUP_ALL).await;
        assert_eq!(decision, GateDecision::Deny(DenyReason::Forbidden));
    }

    #[tokio::test]
    async fn anonymous_is_unauthenticated() {
        let clock = clock();
        let gate = gate(clock.clone(), Arc::new(CountingSessionStore::new(clock)));
        let decision = gate
            .authorize(&Credentials::none(), CapabilityGroup::Customer, SUBGROUP_ALL)
            .await;
        assert_eq!(decision, GateDecision::Deny(DenyReason::Unauthenticated));
    }

    #[tokio::test]
    async fn staff_super_passes_staff_super_gate() {
        let decision =
            decide_with_token(Role::StaffSuper, CapabilityGroup::Staff, SUBGROUP_SUPER).await;
        assert_eq!(allowed_role(&decision), Some(Role::StaffSuper));
    }

    #[tokio::test]
    async fn unknown_subgroup_is_configuration_error() {
        let decision =
            decide_with_token(Role::Dev, CapabilityGroup::Staff, "nonexistent-subgroup").await;
        assert_eq!(decision, GateDecision::Deny(DenyReason::Configuration));
    }

    #[tokio::test]
    async fn unauthenticated_takes_precedence_over_configuration() {
        let clock = clock();
        let gate = gate(clock.clone(), Arc::new(CountingSessionStore::new(clock)));
        let decision = gate
            .authorize(&Credentials::none(), CapabilityGroup::Staff, "nonexistent-subgroup")
            .await;
        assert_eq!(decision, GateDecision::Deny(DenyReason::Unauthenticated));
    }

    #[tokio::test]
    async fn expired_token_with_admin_session_is_allowed() {
        let clock = clock();
        let store = Arc::new(CountingSessionStore::new(clock.clone()));
        store
            .insert(
                "sess-admin".to_string(),
                SessionRecord::new("admin@example.com", Role::Admin, NOW + 86_400),
            )
            .await
            .expect("insert");
        let gate = gate(clock.clone(), store.clone());
        let token = issuer(clock.clone())
            .mint(9, "admin@example.com", Role::Admin)
            .expect("mint");
        clock.advance(7_200);
        let header = bearer(&token);

        let decision = gate
            .authorize(
                &Credentials {
                    authorization: Some(&header),
                    session_id: Some("sess-admin"),
                },
                CapabilityGroup::Admin,
                SUBGROUP_ALL,
            )
            .await;
        match decision {
            GateDecision::Allow(claim) => {
                assert_eq!(claim.role, Role::Admin);
                assert_eq!(claim.source, ClaimSource::Session);
            }
            other => panic!("expected allow, got {other:?}"),
        }
        assert_eq!(store.get_calls(), 1);
    }

    #[tokio::test]
    async fn only_dev_passes_dev_gate() {
        for role in Role::ALL_ORDERED {
            let decision = decide_with_token(role, CapabilityGroup::Dev, SUBGROUP_ALL).await;
            if role == Role::Dev {
                assert_eq!(allowed_role(&decision), Some(Role::Dev));
            } else {
                assert_eq!(decision, GateDecision::Deny(DenyReason::Forbidden), "{role}");
            }
        }
    }

    #[tokio::test]
    async fn admin_is_forbidden_from_admin_super_gate() {
        let decision = decide_with_token(Role::Admin, CapabilityGroup::Admin, SUBGROUP_SUPER).await;
        assert_eq!(decision, GateDecision::Deny(DenyReason::Forbidden));
        let decision =
            decide_with_token(Role::AdminSuper, CapabilityGroup::Admin, SUBGROUP_SUPER).await;
        assert_eq!(allowed_role(&decision), Some(Role::AdminSuper));
    }

    #[test]
    fn deny_reason_labels() {
        assert_eq!(DenyReason::Unauthenticated.as_str(), "unauthenticated");
        assert_eq!(DenyReason::Forbidden.as_str(), "forbidden");
        assert_eq!(DenyReason::Configuration.as_str(), "configuration");
    }

    #[test]
    fn gate_is_send_sync_clone() {
        fn assert_traits<T: Send + Sync + Clone>() {}
        assert_traits::<AccessGate>();
    }
}
