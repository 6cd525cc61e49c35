use agora_store::StoreError;
use agora_types::ParamsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("caller is not authorized, or governance is paused")]
    NotAuthorized,

    #[error("proposal {0} not found")]
    ProposalNotFound(u64),

    #[error("{0} has already voted on this proposal")]
    AlreadyVoted(String),

    #[error("outside the voting window")]
    VotingEnded,

    #[error("insufficient tokens: have {have}, need {need}")]
    InsufficientTokens { have: u64, need: u64 },

    #[error("proposal is not executable")]
    ProposalNotActive,

    #[error("timelock has not expired: executable at block {execution_time}")]
    TimelockNotExpired { execution_time: u64 },

    /// Reserved for failures reported by a downstream target contract.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    #[error("{field} is {len} long, maximum is {max}")]
    InvalidProposal {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("arithmetic overflow")]
    Overflow,

    #[error("invalid governance parameters: {0}")]
    InvalidParams(#[from] ParamsError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl GovernanceError {
    /// Stable, machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotAuthorized => "NOT_AUTHORIZED",
            Self::ProposalNotFound(_) => "PROPOSAL_NOT_FOUND",
            Self::AlreadyVoted(_) => "ALREADY_VOTED",
            Self::VotingEnded => "VOTING_ENDED",
            Self::InsufficientTokens { .. } => "INSUFFICIENT_TOKENS",
            Self::ProposalNotActive => "PROPOSAL_NOT_ACTIVE",
            Self::TimelockNotExpired { .. } => "TIMELOCK_NOT_EXPIRED",
            Self::ExecutionFailed(_) => "EXECUTION_FAILED",
            Self::InvalidProposal { .. } => "INVALID_PROPOSAL",
            Self::Overflow => "OVERFLOW",
            Self::InvalidParams(_) => "INVALID_PARAMS",
            Self::Store(_) => "STORE_ERROR",
        }
    }
}
