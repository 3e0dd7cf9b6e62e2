//! Request Validation Module
//!
//! Centralizes the input rules every route applies before touching the
//! ledger: role enumeration, identifier shape, credential length,
//! candidate/image arity, and public-id to ledger-index conversion.

mod validator;

pub use validator::{
    ledger_index, parse_role, validate_registration, validate_voting_draft, ValidationError,
    MIN_PASSWORD_LEN, NIM_LEN,
};
