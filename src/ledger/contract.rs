//! Ethers-backed contract client.
//!
//! Holds the single process-wide signer + contract handle (constructed
//! once at startup and injected into the router) and implements
//! [`VotingLedger`] against the deployed Evote contract. Every
//! state-changing call goes through [`ContractClient::submit`], which
//! returns the pending transaction hash without waiting for confirmation.

use super::{LedgerError, VotingLedger};
use crate::config::LedgerConfig;
use crate::types::{
    Candidate, CandidateDraft, CandidateTally, ReceiptInfo, Role, TxStatus, VoteRecord,
    VotingDetails, VotingDraft, VotingSummary,
};
use async_trait::async_trait;
use ethers::contract::{abigen, ContractCall};
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, H256, U256};
use std::sync::Arc;
use tracing::{debug, info};

// How far back the history endpoint scans the event log, in blocks.
const HISTORY_LOOKBACK_BLOCKS: u64 = 10_000;

abigen!(
    Evote,
    r#"[
        function registerUser(string nim, bytes32 credential, uint8 role)
        function login(string nim, bytes32 credential) view returns (bool, uint8)
        function createVoting(string title, string description, uint256 startTime, uint256 endTime, string[] names, string[] imageRefs, string[] visions, string[] missions)
        function updateVoting(uint256 votingId, string title, string description, uint256 startTime, uint256 endTime, string[] names, string[] imageRefs, string[] visions, string[] missions)
        function deleteVoting(uint256 votingId)
        function endVoting(uint256 votingId)
        function getVotingDetails(uint256 votingId) view returns (string, string, uint256, uint256, string[], string[], string[], string[], bool)
        function getAllVotings() view returns (string[], uint256[], uint256[], bool[])
        function getVoterNIMS() view returns (string[])
        function vote(uint256 votingId, string nim, bytes32 candidateKey)
        function getVotingResult(uint256 votingId) view returns (string[], string[], uint256[])
        function addCandidate(uint256 votingId, string name, string imageRef, string vision, string mission)
        function updateCandidate(uint256 votingId, uint256 candidateId, string name, string imageRef, string vision, string mission)
        function deleteCandidate(uint256 votingId, uint256 candidateId)
        event Voted(string nim, uint256 votingId, string candidate)
    ]"#
);

type LedgerMiddleware = SignerMiddleware<Provider<Http>, LocalWallet>;

/// The process-wide ledger client: one provider, one signing key, one
/// contract binding. The underlying client serializes its own request
/// queue, so sharing the handle needs no extra locking.
pub struct ContractClient {
    contract: Evote<LedgerMiddleware>,
    provider: Provider<Http>,
}

impl ContractClient {
    /// Connect to the configured RPC endpoint and bind the deployed
    /// contract with the configured signing key.
    pub fn connect(config: &LedgerConfig) -> anyhow::Result<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())?;
        let wallet: LocalWallet = config.private_key.parse()?;
        let wallet = wallet.with_chain_id(config.chain_id);
        let address: Address = config.contract_address.parse()?;

        let client = Arc::new(SignerMiddleware::new(provider.clone(), wallet));
        let contract = Evote::new(address, client);
        info!("Ledger client bound to contract {:?}", address);

        Ok(Self { contract, provider })
    }

    /// Submit one state-changing call and return its hash immediately.
    ///
    /// No retries: reverts, insufficient funds and transport failures all
    /// propagate to the caller as-is.
    async fn submit(&self, call: ContractCall<LedgerMiddleware, ()>) -> Result<H256, LedgerError> {
        let pending = call
            .send()
            .await
            .map_err(|e| LedgerError::Contract(e.to_string()))?;
        let hash = pending.tx_hash();
        debug!("Transaction submitted: {:?}", hash);
        Ok(hash)
    }
}

/// Split a candidate list into the parallel arrays the contract takes.
fn candidate_columns(
    candidates: &[CandidateDraft],
) -> (Vec<String>, Vec<String>, Vec<String>, Vec<String>) {
    let names = candidates.iter().map(|c| c.name.clone()).collect();
    let images = candidates.iter().map(|c| c.image_url.clone()).collect();
    let visions = candidates.iter().map(|c| c.vision.clone()).collect();
    let missions = candidates.iter().map(|c| c.mission.clone()).collect();
    (names, images, visions, missions)
}

#[async_trait]
impl VotingLedger for ContractClient {
    async fn register_user(
        &self,
        nim: &str,
        credential: H256,
        role: Role,
    ) -> Result<H256, LedgerError> {
        let call = self
            .contract
            .register_user(nim.to_string(), credential.0, role.as_u8());
        self.submit(call).await
    }

    async fn login(&self, nim: &str, credential: H256) -> Result<Option<Role>, LedgerError> {
        let (is_valid, role) = self
            .contract
            .login(nim.to_string(), credential.0)
            .call()
            .await
            .map_err(|e| LedgerError::Contract(e.to_string()))?;

        if !is_valid {
            return Ok(None);
        }
        Ok(Role::from_u8(role))
    }

    async fn create_voting(&self, draft: &VotingDraft) -> Result<H256, LedgerError> {
        let (names, images, visions, missions) = candidate_columns(&draft.candidates);
        let call = self.contract.create_voting(
            draft.title.clone(),
            draft.description.clone(),
            U256::from(draft.start_time),
            U256::from(draft.end_time),
            names,
            images,
            visions,
            missions,
        );
        self.submit(call).await
    }

    async fn update_voting(&self, index: u64, draft: &VotingDraft) -> Result<H256, LedgerError> {
        let (names, images, visions, missions) = candidate_columns(&draft.candidates);
        let call = self.contract.update_voting(
            U256::from(index),
            draft.title.clone(),
            draft.description.clone(),
            U256::from(draft.start_time),
            U256::from(draft.end_time),
            names,
            images,
            visions,
            missions,
        );
        self.submit(call).await
    }

    async fn delete_voting(&self, index: u64) -> Result<H256, LedgerError> {
        self.submit(self.contract.delete_voting(U256::from(index)))
            .await
    }

    async fn end_voting(&self, index: u64) -> Result<H256, LedgerError> {
        self.submit(self.contract.end_voting(U256::from(index)))
            .await
    }

    async fn voting_details(&self, index: u64) -> Result<Option<VotingDetails>, LedgerError> {
        let (title, description, start, end, names, images, visions, missions, ended) = self
            .contract
            .get_voting_details(U256::from(index))
            .call()
            .await
            .map_err(|e| LedgerError::Contract(e.to_string()))?;

        // The contract returns an empty record rather than reverting for
        // unknown indexes.
        if title.is_empty() {
            return Ok(None);
        }

        let candidates = names
            .into_iter()
            .zip(images)
            .zip(visions.into_iter().zip(missions))
            .enumerate()
            .map(|(i, ((name, image_url), (vision, mission)))| Candidate {
                number: i as u64 + 1,
                name,
                image_url,
                vision,
                mission,
            })
            .collect();

        Ok(Some(VotingDetails {
            title,
            description,
            start_time: start.as_u64(),
            end_time: end.as_u64(),
            candidates,
            voting_ended: ended,
        }))
    }

    async fn all_votings(&self) -> Result<Vec<VotingSummary>, LedgerError> {
        let (titles, starts, ends, ended) = self
            .contract
            .get_all_votings()
            .call()
            .await
            .map_err(|e| LedgerError::Contract(e.to_string()))?;

        let summaries = titles
            .into_iter()
            .zip(starts)
            .zip(ends.into_iter().zip(ended))
            .enumerate()
            .map(|(i, ((title, start), (end, voting_ended)))| VotingSummary {
                index: i as u64,
                title,
                start_time: start.as_u64(),
                end_time: end.as_u64(),
                voting_ended,
            })
            .collect();

        Ok(summaries)
    }

    async fn voter_nims(&self) -> Result<Vec<String>, LedgerError> {
        self.contract
            .get_voter_nims()
            .call()
            .await
            .map_err(|e| LedgerError::Contract(e.to_string()))
    }

    async fn submit_vote(
        &self,
        index: u64,
        nim: &str,
        candidate_key: H256,
    ) -> Result<H256, LedgerError> {
        let call = self
            .contract
            .vote(U256::from(index), nim.to_string(), candidate_key.0);
        self.submit(call).await
    }

    async fn voting_result(&self, index: u64) -> Result<Vec<CandidateTally>, LedgerError> {
        let (candidates, images, votes) = self
            .contract
            .get_voting_result(U256::from(index))
            .call()
            .await
            .map_err(|e| LedgerError::Contract(e.to_string()))?;

        let tallies = candidates
            .into_iter()
            .zip(images)
            .zip(votes)
            .map(|((candidate, image_url), votes)| CandidateTally {
                candidate,
                image_url,
                votes: votes.as_u64(),
            })
            .collect();

        Ok(tallies)
    }

    async fn vote_history(&self) -> Result<Vec<VoteRecord>, LedgerError> {
        let latest = self.provider.get_block_number().await?.as_u64();
        let from_block = latest.saturating_sub(HISTORY_LOOKBACK_BLOCKS);

        let events = self
            .contract
            .voted_filter()
            .from_block(from_block)
            .to_block(latest)
            .query_with_meta()
            .await
            .map_err(|e| LedgerError::Contract(e.to_string()))?;

        let records = events
            .into_iter()
            .map(|(event, meta)| VoteRecord {
                nim: event.nim,
                voting_index: event.voting_id.as_u64(),
                candidate: event.candidate,
                block_number: meta.block_number.as_u64(),
                block_hash: meta.block_hash,
            })
            .collect();

        Ok(records)
    }

    async fn add_candidate(
        &self,
        index: u64,
        candidate: &CandidateDraft,
    ) -> Result<H256, LedgerError> {
        let call = self.contract.add_candidate(
            U256::from(index),
            candidate.name.clone(),
            candidate.image_url.clone(),
            candidate.vision.clone(),
            candidate.mission.clone(),
        );
        self.submit(call).await
    }

    async fn update_candidate(
        &self,
        index: u64,
        candidate_index: u64,
        candidate: &CandidateDraft,
    ) -> Result<H256, LedgerError> {
        let call = self.contract.update_candidate(
            U256::from(index),
            U256::from(candidate_index),
            candidate.name.clone(),
            candidate.image_url.clone(),
            candidate.vision.clone(),
            candidate.mission.clone(),
        );
        self.submit(call).await
    }

    async fn delete_candidate(
        &self,
        index: u64,
        candidate_index: u64,
    ) -> Result<H256, LedgerError> {
        let call = self
            .contract
            .delete_candidate(U256::from(index), U256::from(candidate_index));
        self.submit(call).await
    }

    async fn transaction_status(&self, hash: H256) -> Result<TxStatus, LedgerError> {
        let Some(receipt) = self.provider.get_transaction_receipt(hash).await? else {
            return Ok(TxStatus::Pending);
        };

        let latest = self.provider.get_block_number().await?.as_u64();
        let block_number = receipt
            .block_number
            .map(|n| n.as_u64())
            .unwrap_or(latest);
        let gas_used = receipt.gas_used.unwrap_or_default();
        let fee = receipt.effective_gas_price.unwrap_or_default() * gas_used;

        Ok(TxStatus::Confirmed(ReceiptInfo {
            succeeded: receipt.status == Some(1.into()),
            block_number,
            block_hash: receipt.block_hash.unwrap_or_default(),
            confirmations: latest.saturating_sub(block_number) + 1,
            gas_used: gas_used.as_u64(),
            cumulative_gas_used: receipt.cumulative_gas_used.as_u64(),
            fee: fee.to_string(),
        }))
    }
}
