//! HTTP gateway for a blockchain e-voting platform.
//!
//! Translates JSON/multipart requests into calls against a deployed
//! voting smart contract, uploads candidate images to an external media
//! host, and issues signed auth tokens. All voting state and access
//! rules live on-chain; this crate is validation, orchestration and
//! response shaping.

pub mod types; // Domain types shared across modules, plus keccak key derivation.
pub mod api; // The Request Router: routes, handlers, error mapping.
pub mod validation; // Input rules applied before any ledger call.
pub mod auth; // Signed bearer tokens and the auth/admin middleware.
pub mod ledger; // The VotingLedger capability trait and its ethers client.
pub mod media; // The MediaStore capability trait and its upload client.
pub mod config; // Defines and loads system configuration.

// Re-export commonly used types and configurations for easier access.
pub use config::Config;
pub use types::*;
