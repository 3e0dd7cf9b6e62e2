use ethers::types::H256;
use ethers::utils::keccak256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a registered user, stored on-chain as a u8 enum.
///
/// The contract encodes `Admin` as 1 and `Voter` as 2; 0 is the
/// unregistered sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Voter,
}

impl Role {
    /// On-chain encoding of the role.
    pub fn as_u8(self) -> u8 {
        match self {
            Role::Admin => 1,
            Role::Voter => 2,
        }
    }

    /// Decode the on-chain role value; 0 means "not registered".
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Role::Admin),
            2 => Some(Role::Voter),
            _ => None,
        }
    }
}

impl FromStr for Role {
    type Err = ();

    /// Case-insensitive parse; anything outside {admin, voter} is rejected.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "voter" => Ok(Role::Voter),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Voter => write!(f, "voter"),
        }
    }
}

/// Candidate fields as written to the ledger (image already uploaded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDraft {
    pub name: String,
    pub image_url: String,
    pub vision: String,
    pub mission: String,
}

/// Candidate as read back from the ledger.
///
/// `number` is the caller-visible 1-based position within the voting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub number: u64,
    pub name: String,
    pub image_url: String,
    pub vision: String,
    pub mission: String,
}

/// Everything needed to create or overwrite a voting instance on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingDraft {
    pub title: String,
    pub description: String,
    pub start_time: u64,
    pub end_time: u64,
    pub candidates: Vec<CandidateDraft>,
}

/// Lightweight voting listing entry.
///
/// `index` is the 0-based ledger index; the HTTP layer presents it as a
/// 1-based voting id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingSummary {
    pub index: u64,
    pub title: String,
    pub start_time: u64,
    pub end_time: u64,
    pub voting_ended: bool,
}

/// Full voting state as stored on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingDetails {
    pub title: String,
    pub description: String,
    pub start_time: u64,
    pub end_time: u64,
    pub candidates: Vec<Candidate>,
    pub voting_ended: bool,
}

/// One row of a voting result: a candidate and their vote count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateTally {
    pub candidate: String,
    pub image_url: String,
    pub votes: u64,
}

/// A `Voted` event read back from the ledger's log.
///
/// `voting_index` is 0-based as emitted by the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub nim: String,
    pub voting_index: u64,
    pub candidate: String,
    pub block_number: u64,
    pub block_hash: H256,
}

/// Outcome of a transaction status lookup.
///
/// A submitted transaction moves `pending -> {success | failed}`; there
/// is no cancelled state and this layer cannot withdraw a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    /// No receipt yet.
    Pending,
    /// Receipt present; `succeeded` reflects the receipt status flag.
    Confirmed(ReceiptInfo),
}

/// Block and fee accounting surfaced once a receipt exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptInfo {
    pub succeeded: bool,
    pub block_number: u64,
    pub block_hash: H256,
    pub confirmations: u64,
    pub gas_used: u64,
    pub cumulative_gas_used: u64,
    /// Total fee in wei (gas used * effective gas price), as a decimal string
    /// since it can exceed u64.
    pub fee: String,
}

/// Derive the on-chain credential hash for a user.
///
/// The contract never sees the password, only keccak256(password ++ nim).
pub fn credential_hash(nim: &str, password: &str) -> H256 {
    H256::from(keccak256(format!("{password}{nim}").as_bytes()))
}

/// Derive the vote key for a candidate name.
///
/// Votes are cast against keccak256(name) rather than the raw name.
pub fn candidate_key(name: &str) -> H256 {
    H256::from(keccak256(name.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("VOTER".parse::<Role>(), Ok(Role::Voter));
        assert_eq!("voter".parse::<Role>(), Ok(Role::Voter));
        assert!("superuser".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_round_trips_through_chain_encoding() {
        assert_eq!(Role::from_u8(Role::Admin.as_u8()), Some(Role::Admin));
        assert_eq!(Role::from_u8(Role::Voter.as_u8()), Some(Role::Voter));
        assert_eq!(Role::from_u8(0), None);
        assert_eq!(Role::from_u8(3), None);
    }

    #[test]
    fn test_credential_hash_binds_nim_and_password() {
        let a = credential_hash("13519100", "hunter22");
        let b = credential_hash("13519101", "hunter22");
        let c = credential_hash("13519100", "hunter23");
        assert_ne!(a, b);
        assert_ne!(a, c);
        // Stable for identical inputs
        assert_eq!(a, credential_hash("13519100", "hunter22"));
    }

    #[test]
    fn test_candidate_key_matches_keccak_of_name() {
        let key = candidate_key("Faris");
        assert_eq!(key, H256::from(keccak256(b"Faris")));
        assert_ne!(key, candidate_key("faris"));
    }
}
