//! The governance service: one task owns the engine, everyone else talks to
//! it through a [`NodeHandle`].
//!
//! Commands are processed strictly one at a time in arrival order, and the
//! block height is read from the clock once per command. Two operations can
//! therefore never interleave, and each one sees a single consistent "now".

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use agora_governance::{
    EffectiveStatus, ExecutionSummary, Executor, GovernanceEngine, GovernanceError, NewProposal,
};
use agora_store::GovernanceStore;
use agora_types::{
    Address, BlockHeight, Clock, GovernanceParams, Proposal, ProposalId, ProposalState, Tally,
    TokenAmount, VoteRecord,
};

use crate::metrics::GovernanceMetrics;
use crate::NodeError;

/// Capacity of the command queue.
const COMMAND_CHANNEL_CAPACITY: usize = 1024;

type Reply<T> = oneshot::Sender<Result<T, GovernanceError>>;

/// A request to the governance service.
pub enum Command {
    SetBalance {
        caller: Address,
        user: Address,
        amount: TokenAmount,
        reply: Reply<()>,
    },
    GetBalance {
        user: Address,
        reply: Reply<TokenAmount>,
    },
    Pause {
        caller: Address,
        reply: Reply<()>,
    },
    Unpause {
        caller: Address,
        reply: Reply<()>,
    },
    IsPaused {
        reply: Reply<bool>,
    },
    CreateProposal {
        caller: Address,
        draft: NewProposal,
        reply: Reply<ProposalId>,
    },
    Vote {
        caller: Address,
        id: ProposalId,
        support: bool,
        reply: Reply<VoteRecord>,
    },
    Execute {
        caller: Address,
        id: ProposalId,
        reply: Reply<ExecutionSummary>,
    },
    GetProposal {
        id: ProposalId,
        reply: Reply<Option<Proposal>>,
    },
    GetUserVote {
        user: Address,
        id: ProposalId,
        reply: Reply<Option<VoteRecord>>,
    },
    GetProposalCount {
        reply: Reply<u64>,
    },
    GetTally {
        id: ProposalId,
        reply: Reply<Option<Tally>>,
    },
    ListProposals {
        after: Option<ProposalId>,
        limit: usize,
        reply: Reply<Vec<Proposal>>,
    },
    VotesForProposal {
        id: ProposalId,
        reply: Reply<Vec<(Address, VoteRecord)>>,
    },
    ProposalStatus {
        id: ProposalId,
        reply: Reply<EffectiveStatus>,
    },
    CurrentHeight {
        reply: oneshot::Sender<BlockHeight>,
    },
}

pub struct GovernanceService<S, E> {
    engine: GovernanceEngine<S, E>,
    clock: Arc<dyn Clock>,
    metrics: Arc<GovernanceMetrics>,
    rx: mpsc::Receiver<Command>,
}

impl<S, E> GovernanceService<S, E>
where
    S: GovernanceStore + Send + 'static,
    E: Executor + 'static,
{
    /// Spawn the service task. It runs until `shutdown` fires or every
    /// [`NodeHandle`] has been dropped.
    pub fn spawn(
        engine: GovernanceEngine<S, E>,
        clock: Arc<dyn Clock>,
        metrics: Arc<GovernanceMetrics>,
        shutdown: broadcast::Receiver<()>,
    ) -> (NodeHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let handle = NodeHandle {
            tx,
            admin: engine.admin().clone(),
            params: engine.params().clone(),
        };

        if let Ok(count) = engine.get_proposal_count() {
            metrics.proposal_count.set(count as i64);
        }
        if let Ok(paused) = engine.is_paused() {
            metrics.paused.set(i64::from(paused));
        }

        let service = Self {
            engine,
            clock,
            metrics,
            rx,
        };
        let task = tokio::spawn(service.run(shutdown));
        (handle, task)
    }

    async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!("governance service started");
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("governance service shutting down");
                    break;
                }
                cmd = self.rx.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => {
                        tracing::info!("all handles dropped, governance service stopping");
                        break;
                    }
                },
            }
        }
    }

    fn handle(&mut self, cmd: Command) {
        let now = self.clock.now();
        match cmd {
            Command::SetBalance {
                caller,
                user,
                amount,
                reply,
            } => {
                let result = self.engine.set_balance(&caller, &user, amount);
                self.respond(reply, result);
            }
            Command::GetBalance { user, reply } => {
                let _ = reply.send(self.engine.get_balance(&user));
            }
            Command::Pause { caller, reply } => {
                let result = self.engine.pause(&caller);
                if result.is_ok() {
                    self.metrics.paused.set(1);
                }
                self.respond(reply, result);
            }
            Command::Unpause { caller, reply } => {
                let result = self.engine.unpause(&caller);
                if result.is_ok() {
                    self.metrics.paused.set(0);
                }
                self.respond(reply, result);
            }
            Command::IsPaused { reply } => {
                let _ = reply.send(self.engine.is_paused());
            }
            Command::CreateProposal {
                caller,
                draft,
                reply,
            } => {
                let result = self.engine.create_proposal(&caller, now, draft);
                if let Ok(id) = &result {
                    self.metrics.proposals_created.inc();
                    self.metrics.proposal_count.set(id.get() as i64);
                }
                self.respond(reply, result);
            }
            Command::Vote {
                caller,
                id,
                support,
                reply,
            } => {
                let result = self.engine.vote(&caller, now, id, support);
                if result.is_ok() {
                    self.metrics.votes_cast.inc();
                }
                self.respond(reply, result);
            }
            Command::Execute { caller, id, reply } => {
                let was_defeated = self.is_defeated(id);
                let result = self.engine.execute_proposal(&caller, now, id);
                match &result {
                    Ok(_) => self.metrics.executions.inc(),
                    Err(GovernanceError::ProposalNotActive)
                        if !was_defeated && self.is_defeated(id) =>
                    {
                        self.metrics.defeats.inc()
                    }
                    Err(_) => {}
                }
                self.respond(reply, result);
            }
            Command::GetProposal { id, reply } => {
                let _ = reply.send(self.engine.get_proposal(id));
            }
            Command::GetUserVote { user, id, reply } => {
                let _ = reply.send(self.engine.get_user_vote(&user, id));
            }
            Command::GetProposalCount { reply } => {
                let _ = reply.send(self.engine.get_proposal_count());
            }
            Command::GetTally { id, reply } => {
                let _ = reply.send(self.engine.get_tally(id));
            }
            Command::ListProposals {
                after,
                limit,
                reply,
            } => {
                let _ = reply.send(self.engine.list_proposals(after, limit));
            }
            Command::VotesForProposal { id, reply } => {
                let _ = reply.send(self.engine.votes_for_proposal(id));
            }
            Command::ProposalStatus { id, reply } => {
                let _ = reply.send(self.engine.proposal_status(id, now));
            }
            Command::CurrentHeight { reply } => {
                let _ = reply.send(now);
            }
        }
    }

    fn is_defeated(&self, id: ProposalId) -> bool {
        matches!(
            self.engine.get_proposal(id),
            Ok(Some(p)) if p.state == ProposalState::Defeated
        )
    }

    fn respond<T>(&self, reply: Reply<T>, result: Result<T, GovernanceError>) {
        if let Err(e) = &result {
            self.metrics
                .rejected_operations
                .with_label_values(&[e.code()])
                .inc();
        }
        // The requester may have given up waiting; nothing to do then.
        let _ = reply.send(result);
    }
}

/// Cloneable client for the governance service.
#[derive(Clone)]
pub struct NodeHandle {
    tx: mpsc::Sender<Command>,
    admin: Address,
    params: GovernanceParams,
}

impl NodeHandle {
    pub fn admin(&self) -> &Address {
        &self.admin
    }

    pub fn params(&self) -> &GovernanceParams {
        &self.params
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, NodeError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| NodeError::ServiceStopped)?;
        let result = rx.await.map_err(|_| NodeError::ServiceStopped)?;
        Ok(result?)
    }

    pub async fn set_balance(
        &self,
        caller: Address,
        user: Address,
        amount: TokenAmount,
    ) -> Result<(), NodeError> {
        self.request(|reply| Command::SetBalance {
            caller,
            user,
            amount,
            reply,
        })
        .await
    }

    pub async fn get_balance(&self, user: Address) -> Result<TokenAmount, NodeError> {
        self.request(|reply| Command::GetBalance { user, reply }).await
    }

    pub async fn pause(&self, caller: Address) -> Result<(), NodeError> {
        self.request(|reply| Command::Pause { caller, reply }).await
    }

    pub async fn unpause(&self, caller: Address) -> Result<(), NodeError> {
        self.request(|reply| Command::Unpause { caller, reply }).await
    }

    pub async fn is_paused(&self) -> Result<bool, NodeError> {
        self.request(|reply| Command::IsPaused { reply }).await
    }

    pub async fn create_proposal(
        &self,
        caller: Address,
        draft: NewProposal,
    ) -> Result<ProposalId, NodeError> {
        self.request(|reply| Command::CreateProposal {
            caller,
            draft,
            reply,
        })
        .await
    }

    pub async fn vote(
        &self,
        caller: Address,
        id: ProposalId,
        support: bool,
    ) -> Result<VoteRecord, NodeError> {
        self.request(|reply| Command::Vote {
            caller,
            id,
            support,
            reply,
        })
        .await
    }

    pub async fn execute_proposal(
        &self,
        caller: Address,
        id: ProposalId,
    ) -> Result<ExecutionSummary, NodeError> {
        self.request(|reply| Command::Execute { caller, id, reply })
            .await
    }

    pub async fn get_proposal(&self, id: ProposalId) -> Result<Option<Proposal>, NodeError> {
        self.request(|reply| Command::GetProposal { id, reply }).await
    }

    pub async fn get_user_vote(
        &self,
        user: Address,
        id: ProposalId,
    ) -> Result<Option<VoteRecord>, NodeError> {
        self.request(|reply| Command::GetUserVote { user, id, reply })
            .await
    }

    pub async fn get_proposal_count(&self) -> Result<u64, NodeError> {
        self.request(|reply| Command::GetProposalCount { reply }).await
    }

    pub async fn get_tally(&self, id: ProposalId) -> Result<Option<Tally>, NodeError> {
        self.request(|reply| Command::GetTally { id, reply }).await
    }

    pub async fn list_proposals(
        &self,
        after: Option<ProposalId>,
        limit: usize,
    ) -> Result<Vec<Proposal>, NodeError> {
        self.request(|reply| Command::ListProposals {
            after,
            limit,
            reply,
        })
        .await
    }

    pub async fn votes_for_proposal(
        &self,
        id: ProposalId,
    ) -> Result<Vec<(Address, VoteRecord)>, NodeError> {
        self.request(|reply| Command::VotesForProposal { id, reply })
            .await
    }

    pub async fn proposal_status(&self, id: ProposalId) -> Result<EffectiveStatus, NodeError> {
        self.request(|reply| Command::ProposalStatus { id, reply })
            .await
    }

    /// The service's current block height.
    pub async fn current_height(&self) -> Result<BlockHeight, NodeError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::CurrentHeight { reply })
            .await
            .map_err(|_| NodeError::ServiceStopped)?;
        rx.await.map_err(|_| NodeError::ServiceStopped)
    }
}
