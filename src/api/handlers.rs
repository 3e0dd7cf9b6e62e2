//! Request handlers.
//!
//! Each handler follows the same shape: validate and normalize the
//! request (public 1-based ids become 0-based ledger indexes here, and
//! nowhere else), run any secondary operation (image uploads, key
//! derivation), invoke the ledger, and shape the response. State-changing
//! handlers return the pending transaction hash without waiting for
//! confirmation; callers poll `/api/tx-status/:txHash`.

use super::{ApiError, AppState};
use crate::types::{candidate_key, credential_hash, CandidateDraft, ReceiptInfo, TxStatus, VotingDraft};
use crate::validation::{self, ValidationError};
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::Json;
use ethers::types::H256;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

const PENDING_INFO: &str = "Transaction will be confirmed shortly on the blockchain.";

fn tx_hex(hash: H256) -> String {
    format!("{hash:#x}")
}

fn bad_multipart(err: MultipartError) -> ApiError {
    ApiError::Validation(ValidationError::Malformed(err.to_string()))
}

// ---------------------------------------------------------------------------
// Welcome
// ---------------------------------------------------------------------------

pub async fn welcome() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the Evote platform! We are excited to have you here. \
            This platform allows you to participate in secure and transparent voting \
            processes. Whether you are registering to vote, casting your vote, or \
            checking results, we are committed to providing you with a seamless and \
            trustworthy experience. Thank you for being a part of our community!"
    }))
}

pub async fn api_welcome() -> Json<Value> {
    Json(json!({ "message": "Welcome to Evote API" }))
}

// ---------------------------------------------------------------------------
// Registration and login
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub nim: String,
    pub password: String,
    pub role: String,
}

/// `POST /api/register`
///
/// Validates the role/NIM/credential shape before anything else: an
/// invalid role must never reach the ledger. The contract only ever sees
/// the derived credential hash, never the password.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<Value>, ApiError> {
    let role = validation::validate_registration(&body.nim, &body.password, &body.role)?;
    let credential = credential_hash(&body.nim, &body.password);

    let hash = state.ledger.register_user(&body.nim, credential, role).await?;
    info!("Registration submitted for {} as {}", body.nim, role);

    Ok(Json(json!({
        "success": true,
        "message": format!("Transaction submitted. Check status with /api/tx-status/{}", tx_hex(hash)),
        "transactionHash": tx_hex(hash),
        "info": PENDING_INFO,
    })))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub nim: String,
    pub password: String,
}

/// `POST /api/login`
///
/// Credential check is a ledger view call; on success a signed token
/// embedding the NIM and on-chain role is issued.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let credential = credential_hash(&body.nim, &body.password);

    match state.ledger.login(&body.nim, credential).await? {
        Some(role) => {
            let token = state.tokens.issue(&body.nim, role)?;
            info!("Login successful for {}", body.nim);
            Ok(Json(json!({
                "success": true,
                "message": "Login successful!",
                "token": token,
                "role": role,
            })))
        }
        None => {
            warn!("Login rejected for {}", body.nim);
            Err(ApiError::Unauthorized("Invalid NIM or password.".to_string()))
        }
    }
}

// ---------------------------------------------------------------------------
// Transaction status
// ---------------------------------------------------------------------------

/// Response for the status endpoint. A pending transaction serializes as
/// `{"status":"pending"}` with no other fields.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxStatusResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    block_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    block_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    confirmations: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gas_used: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cumulative_gas_used: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fee: Option<String>,
}

impl TxStatusResponse {
    fn pending() -> Self {
        Self {
            status: "pending",
            block_number: None,
            block_hash: None,
            confirmations: None,
            gas_used: None,
            cumulative_gas_used: None,
            fee: None,
        }
    }

    fn confirmed(info: ReceiptInfo) -> Self {
        Self {
            status: if info.succeeded { "success" } else { "failed" },
            block_number: Some(info.block_number),
            block_hash: Some(tx_hex(info.block_hash)),
            confirmations: Some(info.confirmations),
            gas_used: Some(info.gas_used),
            cumulative_gas_used: Some(info.cumulative_gas_used),
            fee: Some(info.fee),
        }
    }
}

/// `GET /api/tx-status/:txHash`
pub async fn tx_status(
    State(state): State<AppState>,
    Path(tx_hash): Path<String>,
) -> Result<Json<TxStatusResponse>, ApiError> {
    let hash: H256 = tx_hash.parse().map_err(|_| {
        ApiError::Validation(ValidationError::Malformed(format!(
            "Invalid transaction hash '{tx_hash}'"
        )))
    })?;

    match state.ledger.transaction_status(hash).await? {
        TxStatus::Pending => Ok(Json(TxStatusResponse::pending())),
        TxStatus::Confirmed(info) => Ok(Json(TxStatusResponse::confirmed(info))),
    }
}

// ---------------------------------------------------------------------------
// Voting CRUD
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CandidateInput {
    name: String,
    #[serde(default)]
    vision: String,
    #[serde(default, alias = "missions")]
    mission: String,
}

/// Accumulated multipart form for voting create/update.
#[derive(Default)]
struct VotingForm {
    title: Option<String>,
    description: Option<String>,
    start_time: Option<u64>,
    end_time: Option<u64>,
    candidates: Option<Vec<CandidateInput>>,
    images: Vec<Vec<u8>>,
}

fn parse_unix(raw: &str, field: &'static str) -> Result<u64, ApiError> {
    raw.trim().parse().map_err(|_| {
        ApiError::Validation(ValidationError::Malformed(format!(
            "Field '{field}' must be a unix timestamp"
        )))
    })
}

async fn read_voting_form(mut multipart: Multipart) -> Result<VotingForm, ApiError> {
    let mut form = VotingForm::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("title") => form.title = Some(field.text().await.map_err(bad_multipart)?),
            Some("description") => {
                form.description = Some(field.text().await.map_err(bad_multipart)?)
            }
            Some("startTime") => {
                let raw = field.text().await.map_err(bad_multipart)?;
                form.start_time = Some(parse_unix(&raw, "startTime")?);
            }
            Some("endTime") => {
                let raw = field.text().await.map_err(bad_multipart)?;
                form.end_time = Some(parse_unix(&raw, "endTime")?);
            }
            Some("candidates") => {
                let raw = field.text().await.map_err(bad_multipart)?;
                let parsed: Vec<CandidateInput> = serde_json::from_str(&raw).map_err(|e| {
                    ApiError::Validation(ValidationError::Malformed(format!(
                        "Invalid candidates payload: {e}"
                    )))
                })?;
                form.candidates = Some(parsed);
            }
            Some("images") => {
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                form.images.push(bytes.to_vec());
            }
            _ => {
                // Drain and ignore unknown parts.
                let _ = field.bytes().await;
            }
        }
    }

    Ok(form)
}

/// Upload every image to the media host, all in flight at once. Every
/// upload must succeed before any ledger write is attempted.
async fn upload_all(state: &AppState, images: Vec<Vec<u8>>) -> Result<Vec<String>, ApiError> {
    let urls = try_join_all(
        images
            .into_iter()
            .map(|bytes| state.media.upload_image(bytes)),
    )
    .await?;
    Ok(urls)
}

/// `POST /api/voting/create` (multipart)
///
/// Validation (including the candidate/image count match) happens before
/// any upload, so a malformed request has no media-host side effects.
pub async fn create_voting(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let form = read_voting_form(multipart).await?;

    let title = form.title.ok_or(ValidationError::MissingField("title"))?;
    let description = form
        .description
        .ok_or(ValidationError::MissingField("description"))?;
    let start_time = form
        .start_time
        .ok_or(ValidationError::MissingField("startTime"))?;
    let end_time = form
        .end_time
        .ok_or(ValidationError::MissingField("endTime"))?;
    let candidates = form
        .candidates
        .ok_or(ValidationError::MissingField("candidates"))?;

    validation::validate_voting_draft(candidates.len(), form.images.len())?;

    let image_urls = upload_all(&state, form.images).await?;

    let draft = VotingDraft {
        title,
        description,
        start_time,
        end_time,
        candidates: candidates
            .into_iter()
            .zip(image_urls)
            .map(|(c, image_url)| CandidateDraft {
                name: c.name,
                image_url,
                vision: c.vision,
                mission: c.mission,
            })
            .collect(),
    };

    let hash = state.ledger.create_voting(&draft).await?;
    info!("Voting '{}' creation submitted: {}", draft.title, tx_hex(hash));

    Ok(Json(json!({
        "success": true,
        "message": "Voting created successfully",
        "transactionHash": tx_hex(hash),
        "info": PENDING_INFO,
    })))
}

/// `POST /api/voting/update/:id` (multipart, all parts optional)
///
/// Read-modify-write: current state is fetched first and omitted fields
/// fall back to their stored values. The two ledger calls are not
/// atomic; a concurrent update can interleave and the last write wins.
pub async fn update_voting(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let index = validation::ledger_index(id)?;
    let current = state
        .ledger
        .voting_details(index)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Voting with id {id} doesn't exist")))?;

    let form = read_voting_form(multipart).await?;

    // Candidate fields: replacement list if supplied, stored list otherwise.
    let candidate_fields: Vec<(String, String, String)> = match form.candidates {
        Some(inputs) => inputs
            .into_iter()
            .map(|c| (c.name, c.vision, c.mission))
            .collect(),
        None => current
            .candidates
            .iter()
            .map(|c| (c.name.clone(), c.vision.clone(), c.mission.clone()))
            .collect(),
    };

    // Count check before any upload.
    if !form.images.is_empty() && form.images.len() != candidate_fields.len() {
        return Err(ValidationError::CandidateImageMismatch {
            candidates: candidate_fields.len(),
            images: form.images.len(),
        }
        .into());
    }

    let image_urls = if form.images.is_empty() {
        current
            .candidates
            .iter()
            .map(|c| c.image_url.clone())
            .collect()
    } else {
        upload_all(&state, form.images).await?
    };

    if image_urls.len() != candidate_fields.len() {
        return Err(ValidationError::CandidateImageMismatch {
            candidates: candidate_fields.len(),
            images: image_urls.len(),
        }
        .into());
    }

    let draft = VotingDraft {
        title: form.title.unwrap_or(current.title),
        description: form.description.unwrap_or(current.description),
        start_time: form.start_time.unwrap_or(current.start_time),
        end_time: form.end_time.unwrap_or(current.end_time),
        candidates: candidate_fields
            .into_iter()
            .zip(image_urls)
            .map(|((name, vision, mission), image_url)| CandidateDraft {
                name,
                image_url,
                vision,
                mission,
            })
            .collect(),
    };

    let hash = state.ledger.update_voting(index, &draft).await?;
    info!("Voting {id} update submitted: {}", tx_hex(hash));

    Ok(Json(json!({
        "success": true,
        "message": "Voting updated successfully",
        "transactionHash": tx_hex(hash),
        "info": PENDING_INFO,
    })))
}

/// `POST /api/voting/delete/:id`
pub async fn delete_voting(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, ApiError> {
    let index = validation::ledger_index(id)?;
    let hash = state.ledger.delete_voting(index).await?;
    info!("Voting {id} deletion submitted: {}", tx_hex(hash));

    Ok(Json(json!({
        "success": true,
        "message": "Voting deleted successfully",
        "transactionHash": tx_hex(hash),
        "info": PENDING_INFO,
    })))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CandidateResponse {
    number: u64,
    name: String,
    image_url: String,
    vision: String,
    mission: String,
}

impl From<crate::types::Candidate> for CandidateResponse {
    fn from(c: crate::types::Candidate) -> Self {
        Self {
            number: c.number,
            name: c.name,
            image_url: c.image_url,
            vision: c.vision,
            mission: c.mission,
        }
    }
}

/// `GET /api/voting/:id`
pub async fn voting_details(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, ApiError> {
    let index = validation::ledger_index(id)?;
    let details = state
        .ledger
        .voting_details(index)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Voting with id {id} doesn't exist")))?;

    let candidates: Vec<CandidateResponse> =
        details.candidates.into_iter().map(Into::into).collect();

    Ok(Json(json!({
        "success": true,
        "votingId": id,
        "title": details.title,
        "description": details.description,
        "candidates": candidates,
        "startTime": details.start_time,
        "endTime": details.end_time,
        "votingEnded": details.voting_ended,
    })))
}

/// `GET /api/votings`
pub async fn list_votings(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let summaries = state.ledger.all_votings().await?;

    let votings: Vec<Value> = summaries
        .into_iter()
        .map(|s| {
            json!({
                "votingId": s.index + 1,
                "title": s.title,
                "startTime": s.start_time,
                "endTime": s.end_time,
                "votingEnded": s.voting_ended,
            })
        })
        .collect();

    Ok(Json(json!({ "success": true, "votings": votings })))
}

/// `GET /api/users`
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let voter_nims = state.ledger.voter_nims().await?;
    Ok(Json(json!({ "voterNims": voter_nims })))
}

// ---------------------------------------------------------------------------
// Voting
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub nim: String,
    #[serde(default)]
    pub candidate: Option<String>,
    #[serde(default, rename = "nomorKandidat")]
    pub nomor_kandidat: Option<u64>,
    #[serde(rename = "votingId")]
    pub voting_id: u64,
}

/// `POST /api/vote`
///
/// Accepts either a candidate name or their 1-based number; the vote is
/// cast against the keccak key of the name. Double-vote prevention is the
/// contract's job and any revert propagates as a 500.
pub async fn vote(
    State(state): State<AppState>,
    Json(body): Json<VoteRequest>,
) -> Result<Json<Value>, ApiError> {
    let index = validation::ledger_index(body.voting_id)?;

    let candidate = match (body.candidate, body.nomor_kandidat) {
        (Some(name), _) => name,
        (None, Some(number)) => {
            let details = state.ledger.voting_details(index).await?.ok_or_else(|| {
                ApiError::NotFound(format!("Voting with id {} doesn't exist", body.voting_id))
            })?;
            details
                .candidates
                .into_iter()
                .find(|c| c.number == number)
                .map(|c| c.name)
                .ok_or_else(|| {
                    ApiError::NotFound(format!(
                        "Candidate {number} not found in voting {}",
                        body.voting_id
                    ))
                })?
        }
        (None, None) => return Err(ValidationError::MissingField("candidate").into()),
    };

    let key = candidate_key(&candidate);
    let hash = state.ledger.submit_vote(index, &body.nim, key).await?;
    info!(
        "Vote by {} in voting {} submitted: {}",
        body.nim,
        body.voting_id,
        tx_hex(hash)
    );

    Ok(Json(json!({
        "success": true,
        "message": "Vote submitted successfully!",
        "txHash": tx_hex(hash),
        "info": PENDING_INFO,
    })))
}

/// `GET /api/vote/result/:id`
pub async fn vote_result(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, ApiError> {
    let index = validation::ledger_index(id)?;
    let tallies = state.ledger.voting_result(index).await?;

    if tallies.is_empty() {
        return Err(ApiError::NotFound(
            "Voting not found or no results available".to_string(),
        ));
    }

    let result: Vec<Value> = tallies
        .into_iter()
        .map(|t| {
            json!({
                "candidate": t.candidate,
                "imageUrl": t.image_url,
                "votes": t.votes,
            })
        })
        .collect();

    Ok(Json(json!({ "success": true, "votingId": id, "result": result })))
}

/// `GET /api/vote/history`
///
/// Recent `Voted` events from the ledger's log, re-keyed to public
/// 1-based voting ids.
pub async fn vote_history(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let records = state.ledger.vote_history().await?;

    let history: Vec<Value> = records
        .into_iter()
        .map(|r| {
            json!({
                "nim": r.nim,
                "votingId": r.voting_index + 1,
                "candidate": r.candidate,
                "blockHash": tx_hex(r.block_hash),
                "blockNumber": r.block_number,
            })
        })
        .collect();

    Ok(Json(json!({ "success": true, "history": history })))
}

/// `GET /api/results`
///
/// Tallies for every ended voting. Open votings are skipped: their
/// results are not readable until the voting is marked ended.
pub async fn all_results(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let summaries = state.ledger.all_votings().await?;

    let mut results = Vec::new();
    for summary in summaries.into_iter().filter(|s| s.voting_ended) {
        let tallies = state.ledger.voting_result(summary.index).await?;
        let result: Vec<Value> = tallies
            .into_iter()
            .map(|t| {
                json!({
                    "candidate": t.candidate,
                    "imageUrl": t.image_url,
                    "votes": t.votes,
                })
            })
            .collect();
        results.push(json!({
            "votingId": summary.index + 1,
            "title": summary.title,
            "result": result,
        }));
    }

    Ok(Json(json!({ "success": true, "results": results })))
}

// ---------------------------------------------------------------------------
// Candidate CRUD
// ---------------------------------------------------------------------------

/// Accumulated multipart form for candidate add/update.
#[derive(Default)]
struct CandidateForm {
    name: Option<String>,
    vision: Option<String>,
    mission: Option<String>,
    image: Option<Vec<u8>>,
}

async fn read_candidate_form(mut multipart: Multipart) -> Result<CandidateForm, ApiError> {
    let mut form = CandidateForm::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("name") => form.name = Some(field.text().await.map_err(bad_multipart)?),
            Some("vision") => form.vision = Some(field.text().await.map_err(bad_multipart)?),
            Some("mission") => form.mission = Some(field.text().await.map_err(bad_multipart)?),
            Some("image") => {
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                form.image = Some(bytes.to_vec());
            }
            _ => {
                let _ = field.bytes().await;
            }
        }
    }

    Ok(form)
}

/// `GET /api/candidates/:id`
pub async fn list_candidates(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, ApiError> {
    let index = validation::ledger_index(id)?;
    let details = state
        .ledger
        .voting_details(index)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Voting with id {id} doesn't exist")))?;

    let candidates: Vec<CandidateResponse> =
        details.candidates.into_iter().map(Into::into).collect();

    Ok(Json(json!({
        "success": true,
        "votingId": id,
        "candidates": candidates,
    })))
}

/// `POST /api/candidate/add/:id` (multipart)
pub async fn add_candidate(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let index = validation::ledger_index(id)?;
    state
        .ledger
        .voting_details(index)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Voting with id {id} doesn't exist")))?;

    let form = read_candidate_form(multipart).await?;
    let name = form.name.ok_or(ValidationError::MissingField("name"))?;
    let image = form.image.ok_or(ValidationError::MissingField("image"))?;

    let image_url = state.media.upload_image(image).await?;

    let draft = CandidateDraft {
        name,
        image_url,
        vision: form.vision.unwrap_or_default(),
        mission: form.mission.unwrap_or_default(),
    };

    let hash = state.ledger.add_candidate(index, &draft).await?;
    info!(
        "Candidate '{}' addition to voting {id} submitted: {}",
        draft.name,
        tx_hex(hash)
    );

    Ok(Json(json!({
        "success": true,
        "message": "Candidate added successfully",
        "transactionHash": tx_hex(hash),
        "info": PENDING_INFO,
    })))
}

/// `POST /api/candidate/update/:id/:cid` (multipart, all parts optional)
///
/// Same read-modify-write fallback as voting update, and the same
/// documented race.
pub async fn update_candidate(
    State(state): State<AppState>,
    Path((id, cid)): Path<(u64, u64)>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let index = validation::ledger_index(id)?;
    let candidate_index = validation::ledger_index(cid)?;

    let details = state
        .ledger
        .voting_details(index)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Voting with id {id} doesn't exist")))?;
    let current = details
        .candidates
        .into_iter()
        .find(|c| c.number == cid)
        .ok_or_else(|| {
            ApiError::NotFound(format!("Candidate {cid} not found in voting {id}"))
        })?;

    let form = read_candidate_form(multipart).await?;

    let image_url = match form.image {
        Some(bytes) => state.media.upload_image(bytes).await?,
        None => current.image_url,
    };

    let draft = CandidateDraft {
        name: form.name.unwrap_or(current.name),
        image_url,
        vision: form.vision.unwrap_or(current.vision),
        mission: form.mission.unwrap_or(current.mission),
    };

    let hash = state
        .ledger
        .update_candidate(index, candidate_index, &draft)
        .await?;
    info!(
        "Candidate {cid} update in voting {id} submitted: {}",
        tx_hex(hash)
    );

    Ok(Json(json!({
        "success": true,
        "message": "Candidate updated successfully",
        "transactionHash": tx_hex(hash),
        "info": PENDING_INFO,
    })))
}

/// `POST /api/candidate/delete/:id/:cid`
pub async fn delete_candidate(
    State(state): State<AppState>,
    Path((id, cid)): Path<(u64, u64)>,
) -> Result<Json<Value>, ApiError> {
    let index = validation::ledger_index(id)?;
    let candidate_index = validation::ledger_index(cid)?;

    let hash = state
        .ledger
        .delete_candidate(index, candidate_index)
        .await?;
    info!(
        "Candidate {cid} deletion from voting {id} submitted: {}",
        tx_hex(hash)
    );

    Ok(Json(json!({
        "success": true,
        "message": "Candidate deleted successfully",
        "transactionHash": tx_hex(hash),
        "info": PENDING_INFO,
    })))
}
