//! Authentication surface of the backend: gate middleware, login/logout,
//! session cookies, and the identity store.
pub mod cookie;
pub mod guard;
pub mod identity;
pub mod login;
