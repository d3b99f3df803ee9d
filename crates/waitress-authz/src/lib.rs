//! Waitress authn/authz primitives shared by the backend service and its tests.
//!
//! # Purpose
//! Centralizes the role taxonomy, the hierarchical permission table, the
//! dual-channel authentication resolver, and the access gate every protected
//! endpoint passes through.
//!
//! # How it fits
//! The backend builds a [`GroupRegistry`] and [`PermissionTable`] once at
//! startup, wires an [`AuthResolver`] with the shared token secret and a
//! [`SessionStore`], then asks the [`AccessGate`] for a decision per request.
//!
//! # Key invariants
//! - Bearer tokens are HMAC (HS256/384/512) only; other algorithms are rejected.
//! - Permission sets grow monotonically: `Dev ⊆ Admin ⊆ Staff ⊆ Customer`.
//! - The session channel is consulted only when the token channel fails.
//!
//! # Important configuration
//! - The token secret must be identical for issuer and verifier.
//!
//! # Examples
//! ```rust
//! use waitress_authz::{CapabilityGroup, GroupRegistry, PermissionTable, Role, SUBGROUP_ALL};
//!
//! let table = PermissionTable::build(&GroupRegistry::build());
//! let admins = table.permitted(CapabilityGroup::Admin, SUBGROUP_ALL).expect("admin/all");
//! assert!(admins.contains(Role::Dev));
//! assert!(!admins.contains(Role::Customer));
//! ```
//!
//! # Common pitfalls
//! - Wiring a route with a subgroup the table does not define yields a
//!   configuration denial (HTTP 500), not a 403.
//! - Token failures are never reported individually; check debug logs.

mod clock;
mod errors;
mod gate;
mod registry;
mod resolver;
mod role;
mod session;
mod table;
mod token;

pub use clock::{Clock, FixedClock, SystemClock};
pub use errors::{AuthzError, AuthzResult};
pub use gate::{AccessGate, DenyReason, GateDecision};
pub use registry::GroupRegistry;
pub use resolver::{
    AuthResolver, AuthenticationClaim, BEARER_PREFIX, ClaimSource, Credentials, ResolveError,
    bearer_token,
};
pub use role::{Role, RoleSet, merge_sets};
pub use session::{
    InMemorySessionStore, SessionError, SessionRecord, SessionResult, SessionStore,
    new_session_id,
};
pub use table::{CapabilityGroup, PermissionTable, SUBGROUP_ALL, SUBGROUP_SUPER};
pub use token::{TokenClaims, TokenError, TokenIssuer, TokenSecret, TokenVerifier};
