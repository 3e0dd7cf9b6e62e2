//! Ledger Module
//!
//! Everything that talks to the deployed voting contract lives here.
//! The HTTP layer depends only on the [`VotingLedger`] capability trait so
//! it can be exercised against an in-memory fake; the real implementation
//! is [`ContractClient`], an ethers-backed client that submits
//! state-changing calls fire-and-forget and lets callers poll for the
//! receipt afterwards.

mod contract;

#[cfg(test)]
pub(crate) mod fake;

pub use contract::ContractClient;

use crate::types::{
    CandidateDraft, CandidateTally, Role, TxStatus, VoteRecord, VotingDetails, VotingDraft,
    VotingSummary,
};
use async_trait::async_trait;
use ethers::types::H256;
use thiserror::Error;

/// Errors surfaced by the ledger layer.
///
/// Nothing here is retried; a failure is terminal for the current request
/// and its message is reported verbatim to the caller.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Contract call failed: revert, insufficient funds, ABI mismatch.
    #[error("{0}")]
    Contract(String),
    /// Raw provider/transport failure.
    #[error(transparent)]
    Provider(#[from] ethers::providers::ProviderError),
}

/// Capability interface over the deployed voting contract.
///
/// One method per contract operation. State-changing methods return the
/// pending transaction hash immediately (fire-and-forget); callers are
/// expected to poll [`VotingLedger::transaction_status`] for the outcome.
/// All voting indexes are 0-based ledger indexes; converting from the
/// public 1-based ids is the router's job.
#[async_trait]
pub trait VotingLedger: Send + Sync {
    /// Submit `registerUser(nim, credential, role)`.
    async fn register_user(
        &self,
        nim: &str,
        credential: H256,
        role: Role,
    ) -> Result<H256, LedgerError>;

    /// Call the `login` view; `None` means the credentials don't match.
    async fn login(&self, nim: &str, credential: H256) -> Result<Option<Role>, LedgerError>;

    /// Submit `createVoting` with the full draft.
    async fn create_voting(&self, draft: &VotingDraft) -> Result<H256, LedgerError>;

    /// Submit `updateVoting`, overwriting the voting at `index`.
    async fn update_voting(&self, index: u64, draft: &VotingDraft) -> Result<H256, LedgerError>;

    /// Submit `deleteVoting`.
    async fn delete_voting(&self, index: u64) -> Result<H256, LedgerError>;

    /// Submit `endVoting`, marking the voting as ended.
    async fn end_voting(&self, index: u64) -> Result<H256, LedgerError>;

    /// Read full voting state; `None` if no voting exists at `index`.
    async fn voting_details(&self, index: u64) -> Result<Option<VotingDetails>, LedgerError>;

    /// Read summaries of every voting instance.
    async fn all_votings(&self) -> Result<Vec<VotingSummary>, LedgerError>;

    /// Read the registered voter NIMs.
    async fn voter_nims(&self) -> Result<Vec<String>, LedgerError>;

    /// Submit `vote(index, nim, candidateKey)`.
    async fn submit_vote(
        &self,
        index: u64,
        nim: &str,
        candidate_key: H256,
    ) -> Result<H256, LedgerError>;

    /// Read per-candidate tallies; empty when the voting is missing or has
    /// no readable results yet.
    async fn voting_result(&self, index: u64) -> Result<Vec<CandidateTally>, LedgerError>;

    /// Read recent `Voted` events from the contract's log.
    async fn vote_history(&self) -> Result<Vec<VoteRecord>, LedgerError>;

    /// Submit `addCandidate` to the voting at `index`.
    async fn add_candidate(
        &self,
        index: u64,
        candidate: &CandidateDraft,
    ) -> Result<H256, LedgerError>;

    /// Submit `updateCandidate` for the candidate at `candidate_index`.
    async fn update_candidate(
        &self,
        index: u64,
        candidate_index: u64,
        candidate: &CandidateDraft,
    ) -> Result<H256, LedgerError>;

    /// Submit `deleteCandidate`.
    async fn delete_candidate(&self, index: u64, candidate_index: u64)
        -> Result<H256, LedgerError>;

    /// Look up the current status of a submitted transaction.
    async fn transaction_status(&self, hash: H256) -> Result<TxStatus, LedgerError>;
}
