//! Auth Module
//!
//! Signed bearer tokens and the middleware that checks them. A login
//! issues a token embedding the NIM and role; protected routes verify it
//! against the shared secret. Enforcement is config-gated: with
//! `auth.enforce = false` the middleware passes everything through,
//! matching how the original deployments ran.

mod middleware;
mod token;

pub use middleware::{require_admin, require_auth};
pub use token::{Claims, TokenAuthority};
