//! RPC request handlers and their request/response bodies.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use agora_governance::{EffectiveStatus, ExecutionSummary, NewProposal};
use agora_types::{Address, GovernanceParams, Proposal, ProposalId, TokenAmount, VoteRecord};

use crate::error::{RpcError, CALLER_HEADER};
use crate::pagination::{next_cursor, PaginationMeta, PaginationParams};
use crate::server::AppState;

/// The authenticated caller, as asserted by the host in [`CALLER_HEADER`].
fn caller(headers: &HeaderMap) -> Result<Address, RpcError> {
    let raw = headers
        .get(CALLER_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(RpcError::MissingCaller)?;
    Address::parse(raw).map_err(|_| RpcError::MissingCaller)
}

fn address(raw: String) -> Result<Address, RpcError> {
    Address::parse(raw).map_err(|e| RpcError::InvalidRequest(e.to_string()))
}

// ── Node ─────────────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct StatusResponse {
    pub admin: String,
    pub paused: bool,
    pub height: u64,
    pub proposal_count: u64,
    pub params: GovernanceParams,
}

pub async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>, RpcError> {
    let h = &state.handle;
    Ok(Json(StatusResponse {
        admin: h.admin().to_string(),
        paused: h.is_paused().await?,
        height: h.current_height().await?.get(),
        proposal_count: h.get_proposal_count().await?,
        params: h.params().clone(),
    }))
}

pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, RpcError> {
    let metrics = state.metrics.as_ref().ok_or(RpcError::MetricsDisabled)?;
    let body = metrics.encode()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

// ── Balances ─────────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct BalanceBody {
    pub user: String,
    pub amount: u64,
}

pub async fn set_balance(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<BalanceBody>,
) -> Result<Json<BalanceBody>, RpcError> {
    let caller = caller(&headers)?;
    let user = address(req.user)?;
    state
        .handle
        .set_balance(caller, user.clone(), TokenAmount::new(req.amount))
        .await?;
    Ok(Json(BalanceBody {
        user: user.to_string(),
        amount: req.amount,
    }))
}

pub async fn get_balance(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<BalanceBody>, RpcError> {
    let user = address(user)?;
    let amount = state.handle.get_balance(user.clone()).await?;
    Ok(Json(BalanceBody {
        user: user.to_string(),
        amount: amount.raw(),
    }))
}

// ── Pause gate ───────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct PausedResponse {
    pub paused: bool,
}

pub async fn pause(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PausedResponse>, RpcError> {
    state.handle.pause(caller(&headers)?).await?;
    Ok(Json(PausedResponse { paused: true }))
}

pub async fn unpause(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PausedResponse>, RpcError> {
    state.handle.unpause(caller(&headers)?).await?;
    Ok(Json(PausedResponse { paused: false }))
}

// ── Proposals ────────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct CreateProposalRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub target_contract: Option<String>,
    /// Hex-encoded opaque payload.
    pub action_data_hex: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct CreateProposalResponse {
    pub id: u64,
}

#[derive(Serialize, Deserialize)]
pub struct ProposalView {
    pub id: u64,
    pub proposer: String,
    pub title: String,
    pub description: String,
    pub target_contract: Option<String>,
    pub action_data_hex: Option<String>,
    pub votes_for: u64,
    pub votes_against: u64,
    pub start_time: u64,
    pub end_time: u64,
    pub execution_time: u64,
    pub state: String,
    pub created_at: u64,
}

impl From<Proposal> for ProposalView {
    fn from(p: Proposal) -> Self {
        Self {
            id: p.id.get(),
            proposer: p.proposer.to_string(),
            title: p.title,
            description: p.description,
            target_contract: p.target_contract.map(|a| a.to_string()),
            action_data_hex: p.action_data.map(hex::encode),
            votes_for: p.votes_for.raw(),
            votes_against: p.votes_against.raw(),
            start_time: p.start_time.get(),
            end_time: p.end_time.get(),
            execution_time: p.execution_time.get(),
            state: p.state.as_str().to_string(),
            created_at: p.created_at.get(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ProposalListResponse {
    pub proposals: Vec<ProposalView>,
    #[serde(flatten)]
    pub pagination: PaginationMeta,
}

#[derive(Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Serialize, Deserialize)]
pub struct StatusView {
    pub id: u64,
    pub status: EffectiveStatus,
}

pub async fn create_proposal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateProposalRequest>,
) -> Result<(StatusCode, Json<CreateProposalResponse>), RpcError> {
    let caller = caller(&headers)?;
    let target_contract = req.target_contract.map(address).transpose()?;
    let action_data = req
        .action_data_hex
        .map(|h| {
            hex::decode(h).map_err(|e| RpcError::InvalidRequest(format!("action_data_hex: {e}")))
        })
        .transpose()?;

    let draft = NewProposal {
        title: req.title,
        description: req.description,
        target_contract,
        action_data,
    };
    let id = state.handle.create_proposal(caller, draft).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateProposalResponse { id: id.get() }),
    ))
}

pub async fn list_proposals(
    State(state): State<AppState>,
    Query(page): Query<PaginationParams>,
) -> Result<Json<ProposalListResponse>, RpcError> {
    let count = page.effective_count();
    let proposals = state
        .handle
        .list_proposals(page.after()?, count as usize)
        .await?;
    let cursor = next_cursor(proposals.last().map(|p| p.id), proposals.len(), count);
    Ok(Json(ProposalListResponse {
        proposals: proposals.into_iter().map(ProposalView::from).collect(),
        pagination: PaginationMeta { cursor },
    }))
}

pub async fn proposal_count(
    State(state): State<AppState>,
) -> Result<Json<CountResponse>, RpcError> {
    let count = state.handle.get_proposal_count().await?;
    Ok(Json(CountResponse { count }))
}

pub async fn get_proposal(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ProposalView>, RpcError> {
    let proposal = state
        .handle
        .get_proposal(ProposalId::new(id))
        .await?
        .ok_or(agora_governance::GovernanceError::ProposalNotFound(id))?;
    Ok(Json(proposal.into()))
}

pub async fn proposal_status(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<StatusView>, RpcError> {
    let status = state.handle.proposal_status(ProposalId::new(id)).await?;
    Ok(Json(StatusView { id, status }))
}

// ── Votes ────────────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct VoteRequest {
    pub support: bool,
}

#[derive(Serialize, Deserialize)]
pub struct VoteView {
    pub voter: String,
    pub proposal_id: u64,
    pub support: bool,
    pub weight: u64,
    pub timestamp: u64,
}

impl VoteView {
    fn new(voter: &Address, proposal_id: u64, record: VoteRecord) -> Self {
        Self {
            voter: voter.to_string(),
            proposal_id,
            support: record.support,
            weight: record.weight.raw(),
            timestamp: record.timestamp.get(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct VoteListResponse {
    pub votes: Vec<VoteView>,
}

pub async fn cast_vote(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(req): Json<VoteRequest>,
) -> Result<Json<VoteView>, RpcError> {
    let caller = caller(&headers)?;
    let record = state
        .handle
        .vote(caller.clone(), ProposalId::new(id), req.support)
        .await?;
    Ok(Json(VoteView::new(&caller, id, record)))
}

pub async fn list_votes(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<VoteListResponse>, RpcError> {
    let votes = state.handle.votes_for_proposal(ProposalId::new(id)).await?;
    Ok(Json(VoteListResponse {
        votes: votes
            .into_iter()
            .map(|(voter, record)| VoteView::new(&voter, id, record))
            .collect(),
    }))
}

/// `null` when the user has not voted.
pub async fn get_user_vote(
    State(state): State<AppState>,
    Path((id, user)): Path<(u64, String)>,
) -> Result<Json<Option<VoteView>>, RpcError> {
    let user = address(user)?;
    let record = state
        .handle
        .get_user_vote(user.clone(), ProposalId::new(id))
        .await?;
    Ok(Json(record.map(|r| VoteView::new(&user, id, r))))
}

// ── Execution ────────────────────────────────────────────────────────────

pub async fn execute_proposal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<ExecutionSummary>, RpcError> {
    let caller = caller(&headers)?;
    let summary = state
        .handle
        .execute_proposal(caller, ProposalId::new(id))
        .await?;
    Ok(Json(summary))
}
