use crate::Role;
use thiserror::Error;

/// Registration numbers are fixed-length digit strings.
pub const NIM_LEN: usize = 8;

/// Minimum accepted credential length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Validation failures; every variant maps to HTTP 400 at the API layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid role '{0}': must be 'admin' or 'voter'")]
    InvalidRole(String),
    #[error("NIM must be exactly {expected} digits, got '{got}'")]
    InvalidNim { expected: usize, got: String },
    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),
    #[error("At least 2 candidates are required, got {got}")]
    TooFewCandidates { got: usize },
    #[error("Candidate and image counts must match: {candidates} candidates, {images} images")]
    CandidateImageMismatch { candidates: usize, images: usize },
    #[error("Invalid voting id {0}: ids start at 1")]
    InvalidVotingId(u64),
    #[error("Malformed request: {0}")]
    Malformed(String),
}

/// Parse a caller-supplied role string.
///
/// Case-insensitive; anything outside the fixed {admin, voter} set is a
/// validation error, and no ledger call may be attempted after one.
pub fn parse_role(raw: &str) -> Result<Role, ValidationError> {
    raw.parse::<Role>()
        .map_err(|_| ValidationError::InvalidRole(raw.to_string()))
}

/// Validate a registration request and return the parsed role.
///
/// Rules: role in the fixed set, NIM exactly [`NIM_LEN`] digits, password
/// at least [`MIN_PASSWORD_LEN`] characters.
pub fn validate_registration(
    nim: &str,
    password: &str,
    role: &str,
) -> Result<Role, ValidationError> {
    let role = parse_role(role)?;

    if nim.len() != NIM_LEN || !nim.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidNim {
            expected: NIM_LEN,
            got: nim.to_string(),
        });
    }

    if password.len() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }

    Ok(role)
}

/// Validate the candidate/image arity of a voting creation request.
///
/// Must run before any image is uploaded: a mismatch aborts the request
/// with no media-host or ledger side effects.
pub fn validate_voting_draft(
    candidate_count: usize,
    image_count: usize,
) -> Result<(), ValidationError> {
    if candidate_count < 2 {
        return Err(ValidationError::TooFewCandidates {
            got: candidate_count,
        });
    }
    if image_count != candidate_count {
        return Err(ValidationError::CandidateImageMismatch {
            candidates: candidate_count,
            images: image_count,
        });
    }
    Ok(())
}

/// Convert a caller-visible 1-based voting/candidate id to the 0-based
/// index the ledger expects.
pub fn ledger_index(public_id: u64) -> Result<u64, ValidationError> {
    if public_id == 0 {
        return Err(ValidationError::InvalidVotingId(public_id));
    }
    Ok(public_id - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_accepts_both_roles_any_case() {
        assert_eq!(
            validate_registration("13519100", "password1", "Admin"),
            Ok(Role::Admin)
        );
        assert_eq!(
            validate_registration("13519100", "password1", "VOTER"),
            Ok(Role::Voter)
        );
    }

    #[test]
    fn test_registration_rejects_unknown_role() {
        let err = validate_registration("13519100", "password1", "superuser").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidRole(_)));
    }

    #[test]
    fn test_registration_rejects_bad_nim_shape() {
        // Too short
        assert!(matches!(
            validate_registration("1351910", "password1", "voter"),
            Err(ValidationError::InvalidNim { .. })
        ));
        // Right length, non-digit
        assert!(matches!(
            validate_registration("1351910a", "password1", "voter"),
            Err(ValidationError::InvalidNim { .. })
        ));
    }

    #[test]
    fn test_registration_rejects_short_password() {
        assert!(matches!(
            validate_registration("13519100", "short", "voter"),
            Err(ValidationError::PasswordTooShort { .. })
        ));
    }

    #[test]
    fn test_role_is_checked_before_credentials() {
        // A bad role wins over a bad NIM so callers see the role error first,
        // matching the original route ordering.
        let err = validate_registration("x", "short", "root").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidRole(_)));
    }

    #[test]
    fn test_voting_draft_requires_two_candidates() {
        assert!(matches!(
            validate_voting_draft(1, 1),
            Err(ValidationError::TooFewCandidates { got: 1 })
        ));
        assert_eq!(validate_voting_draft(2, 2), Ok(()));
    }

    #[test]
    fn test_voting_draft_requires_matching_image_count() {
        let err = validate_voting_draft(3, 2).unwrap_err();
        assert_eq!(
            err,
            ValidationError::CandidateImageMismatch {
                candidates: 3,
                images: 2
            }
        );
    }

    #[test]
    fn test_ledger_index_is_one_based_to_zero_based() {
        assert_eq!(ledger_index(1), Ok(0));
        assert_eq!(ledger_index(3), Ok(2));
        assert!(matches!(
            ledger_index(0),
            Err(ValidationError::InvalidVotingId(0))
        ));
    }
}
