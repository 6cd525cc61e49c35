//! RPC error types and their HTTP rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use agora_governance::GovernanceError;
use agora_node::NodeError;

/// Header carrying the authenticated caller identity.
pub const CALLER_HEADER: &str = "x-agora-caller";

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("missing or invalid x-agora-caller header")]
    MissingCaller,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Governance(#[from] GovernanceError),

    #[error("metrics are disabled")]
    MetricsDisabled,

    #[error("governance service unavailable")]
    ServiceUnavailable,

    #[error("server error: {0}")]
    Server(String),
}

impl From<NodeError> for RpcError {
    fn from(e: NodeError) -> Self {
        match e {
            NodeError::Governance(e) => RpcError::Governance(e),
            NodeError::ServiceStopped => RpcError::ServiceUnavailable,
            other => RpcError::Server(other.to_string()),
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl RpcError {
    pub fn code(&self) -> &'static str {
        match self {
            RpcError::MissingCaller => "MISSING_CALLER",
            RpcError::InvalidRequest(_) => "INVALID_REQUEST",
            RpcError::Governance(e) => e.code(),
            RpcError::MetricsDisabled => "METRICS_DISABLED",
            RpcError::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            RpcError::Server(_) => "SERVER_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RpcError::MissingCaller => StatusCode::UNAUTHORIZED,
            RpcError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RpcError::MetricsDisabled => StatusCode::NOT_FOUND,
            RpcError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            RpcError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RpcError::Governance(e) => match e {
                GovernanceError::NotAuthorized => StatusCode::FORBIDDEN,
                GovernanceError::ProposalNotFound(_) => StatusCode::NOT_FOUND,
                GovernanceError::AlreadyVoted(_) | GovernanceError::ProposalNotActive => {
                    StatusCode::CONFLICT
                }
                GovernanceError::VotingEnded
                | GovernanceError::InsufficientTokens { .. }
                | GovernanceError::TimelockNotExpired { .. }
                | GovernanceError::InvalidProposal { .. }
                | GovernanceError::Overflow => StatusCode::UNPROCESSABLE_ENTITY,
                GovernanceError::ExecutionFailed(_)
                | GovernanceError::InvalidParams(_)
                | GovernanceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "RPC request failed");
        }
        let body = ErrorBody {
            error: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
