//! In-memory stand-in for the deployed contract, used by the HTTP tests.
//!
//! Writes are applied immediately (the fire-and-forget fiction collapses
//! to synchronous application) and every submission is recorded so tests
//! can assert exactly which ledger calls a request produced.

use super::{LedgerError, VotingLedger};
use crate::types::{
    candidate_key, Candidate, CandidateDraft, CandidateTally, Role, TxStatus, VoteRecord,
    VotingDetails, VotingDraft, VotingSummary,
};
use async_trait::async_trait;
use ethers::types::H256;
use std::collections::HashMap;
use std::sync::Mutex;

/// One recorded state-changing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    RegisterUser { nim: String, role: Role },
    CreateVoting { title: String },
    UpdateVoting { index: u64 },
    DeleteVoting { index: u64 },
    EndVoting { index: u64 },
    Vote { index: u64, nim: String, candidate_key: H256 },
    AddCandidate { index: u64, name: String },
    UpdateCandidate { index: u64, candidate_index: u64 },
    DeleteCandidate { index: u64, candidate_index: u64 },
}

#[derive(Debug, Clone)]
struct StoredVoting {
    draft: VotingDraft,
    ended: bool,
}

#[derive(Default)]
struct Inner {
    users: HashMap<String, (H256, Role)>,
    votings: Vec<Option<StoredVoting>>,
    votes: HashMap<(u64, H256), u64>,
    history: Vec<VoteRecord>,
    receipts: HashMap<H256, TxStatus>,
    submissions: Vec<Submission>,
    next_hash: u64,
}

/// Test double implementing [`VotingLedger`] entirely in memory.
#[derive(Default)]
pub struct FakeLedger {
    inner: Mutex<Inner>,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a voting directly, bypassing the submission log.
    pub fn seed_voting(&self, draft: VotingDraft) {
        let mut inner = self.inner.lock().unwrap();
        inner.votings.push(Some(StoredVoting { draft, ended: false }));
    }

    /// Seed a receipt for a given hash so status lookups resolve.
    pub fn seed_receipt(&self, hash: H256, status: TxStatus) {
        self.inner.lock().unwrap().receipts.insert(hash, status);
    }

    /// Mark a stored voting as ended.
    pub fn end_voting_directly(&self, index: u64) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(Some(voting)) = inner.votings.get_mut(index as usize) {
            voting.ended = true;
        }
    }

    /// Every state-changing call recorded so far, in order.
    pub fn submissions(&self) -> Vec<Submission> {
        self.inner.lock().unwrap().submissions.clone()
    }

    fn record(&self, submission: Submission) -> H256 {
        let mut inner = self.inner.lock().unwrap();
        inner.submissions.push(submission);
        inner.next_hash += 1;
        H256::from_low_u64_be(inner.next_hash)
    }
}

fn details_of(stored: &StoredVoting) -> VotingDetails {
    VotingDetails {
        title: stored.draft.title.clone(),
        description: stored.draft.description.clone(),
        start_time: stored.draft.start_time,
        end_time: stored.draft.end_time,
        candidates: stored
            .draft
            .candidates
            .iter()
            .enumerate()
            .map(|(i, c)| Candidate {
                number: i as u64 + 1,
                name: c.name.clone(),
                image_url: c.image_url.clone(),
                vision: c.vision.clone(),
                mission: c.mission.clone(),
            })
            .collect(),
        voting_ended: stored.ended,
    }
}

#[async_trait]
impl VotingLedger for FakeLedger {
    async fn register_user(
        &self,
        nim: &str,
        credential: H256,
        role: Role,
    ) -> Result<H256, LedgerError> {
        self.inner
            .lock()
            .unwrap()
            .users
            .insert(nim.to_string(), (credential, role));
        Ok(self.record(Submission::RegisterUser {
            nim: nim.to_string(),
            role,
        }))
    }

    async fn login(&self, nim: &str, credential: H256) -> Result<Option<Role>, LedgerError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .get(nim)
            .filter(|(stored, _)| *stored == credential)
            .map(|(_, role)| *role))
    }

    async fn create_voting(&self, draft: &VotingDraft) -> Result<H256, LedgerError> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.votings.push(Some(StoredVoting {
                draft: draft.clone(),
                ended: false,
            }));
        }
        Ok(self.record(Submission::CreateVoting {
            title: draft.title.clone(),
        }))
    }

    async fn update_voting(&self, index: u64, draft: &VotingDraft) -> Result<H256, LedgerError> {
        {
            let mut inner = self.inner.lock().unwrap();
            if let Some(Some(stored)) = inner.votings.get_mut(index as usize) {
                stored.draft = draft.clone();
            }
        }
        Ok(self.record(Submission::UpdateVoting { index }))
    }

    async fn delete_voting(&self, index: u64) -> Result<H256, LedgerError> {
        {
            let mut inner = self.inner.lock().unwrap();
            if let Some(slot) = inner.votings.get_mut(index as usize) {
                *slot = None;
            }
        }
        Ok(self.record(Submission::DeleteVoting { index }))
    }

    async fn end_voting(&self, index: u64) -> Result<H256, LedgerError> {
        self.end_voting_directly(index);
        Ok(self.record(Submission::EndVoting { index }))
    }

    async fn voting_details(&self, index: u64) -> Result<Option<VotingDetails>, LedgerError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .votings
            .get(index as usize)
            .and_then(|slot| slot.as_ref())
            .map(details_of))
    }

    async fn all_votings(&self) -> Result<Vec<VotingSummary>, LedgerError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .votings
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| {
                slot.as_ref().map(|stored| VotingSummary {
                    index: i as u64,
                    title: stored.draft.title.clone(),
                    start_time: stored.draft.start_time,
                    end_time: stored.draft.end_time,
                    voting_ended: stored.ended,
                })
            })
            .collect())
    }

    async fn voter_nims(&self) -> Result<Vec<String>, LedgerError> {
        let inner = self.inner.lock().unwrap();
        let mut nims: Vec<String> = inner
            .users
            .iter()
            .filter(|(_, (_, role))| *role == Role::Voter)
            .map(|(nim, _)| nim.clone())
            .collect();
        nims.sort();
        Ok(nims)
    }

    async fn submit_vote(
        &self,
        index: u64,
        nim: &str,
        key: H256,
    ) -> Result<H256, LedgerError> {
        {
            let mut inner = self.inner.lock().unwrap();
            *inner.votes.entry((index, key)).or_insert(0) += 1;
            let candidate = inner
                .votings
                .get(index as usize)
                .and_then(|slot| slot.as_ref())
                .and_then(|stored| {
                    stored
                        .draft
                        .candidates
                        .iter()
                        .find(|c| candidate_key(&c.name) == key)
                        .map(|c| c.name.clone())
                })
                .unwrap_or_else(|| format!("{key:#x}"));
            let block_number = inner.history.len() as u64 + 1;
            inner.history.push(VoteRecord {
                nim: nim.to_string(),
                voting_index: index,
                candidate,
                block_number,
                block_hash: H256::from_low_u64_be(block_number),
            });
        }
        Ok(self.record(Submission::Vote {
            index,
            nim: nim.to_string(),
            candidate_key: key,
        }))
    }

    async fn voting_result(&self, index: u64) -> Result<Vec<CandidateTally>, LedgerError> {
        let inner = self.inner.lock().unwrap();
        let Some(Some(stored)) = inner.votings.get(index as usize) else {
            return Ok(Vec::new());
        };
        Ok(stored
            .draft
            .candidates
            .iter()
            .map(|c| CandidateTally {
                candidate: c.name.clone(),
                image_url: c.image_url.clone(),
                votes: inner
                    .votes
                    .get(&(index, candidate_key(&c.name)))
                    .copied()
                    .unwrap_or(0),
            })
            .collect())
    }

    async fn vote_history(&self) -> Result<Vec<VoteRecord>, LedgerError> {
        Ok(self.inner.lock().unwrap().history.clone())
    }

    async fn add_candidate(
        &self,
        index: u64,
        candidate: &CandidateDraft,
    ) -> Result<H256, LedgerError> {
        {
            let mut inner = self.inner.lock().unwrap();
            if let Some(Some(stored)) = inner.votings.get_mut(index as usize) {
                stored.draft.candidates.push(candidate.clone());
            }
        }
        Ok(self.record(Submission::AddCandidate {
            index,
            name: candidate.name.clone(),
        }))
    }

    async fn update_candidate(
        &self,
        index: u64,
        candidate_index: u64,
        candidate: &CandidateDraft,
    ) -> Result<H256, LedgerError> {
        {
            let mut inner = self.inner.lock().unwrap();
            if let Some(Some(stored)) = inner.votings.get_mut(index as usize) {
                if let Some(slot) = stored.draft.candidates.get_mut(candidate_index as usize) {
                    *slot = candidate.clone();
                }
            }
        }
        Ok(self.record(Submission::UpdateCandidate {
            index,
            candidate_index,
        }))
    }

    async fn delete_candidate(
        &self,
        index: u64,
        candidate_index: u64,
    ) -> Result<H256, LedgerError> {
        {
            let mut inner = self.inner.lock().unwrap();
            if let Some(Some(stored)) = inner.votings.get_mut(index as usize) {
                if (candidate_index as usize) < stored.draft.candidates.len() {
                    stored.draft.candidates.remove(candidate_index as usize);
                }
            }
        }
        Ok(self.record(Submission::DeleteCandidate {
            index,
            candidate_index,
        }))
    }

    async fn transaction_status(&self, hash: H256) -> Result<TxStatus, LedgerError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .receipts
            .get(&hash)
            .cloned()
            .unwrap_or(TxStatus::Pending))
    }
}
