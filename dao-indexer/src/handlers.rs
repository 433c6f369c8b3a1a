use std::sync::Arc;

use derive_more::Display;

mod dao_created;
mod handler_context;
mod membership;
mod proposal_created;
mod proposal_state;
mod treasury;
mod vote_cast;

pub use dao_created::DaoCreatedHandler;
pub use handler_context::EventHandlerContext;
pub use membership::{MemberAddedHandler, MemberRemovedHandler};
pub use proposal_created::ProposalCreatedHandler;
pub use proposal_state::{ProposalCanceledHandler, ProposalExecutedHandler};
pub use treasury::{DepositHandler, WithdrawalHandler};
pub use vote_cast::VoteCastHandler;

use crate::chain_reader::CallError;
use crate::contracts::ContractKind;
use crate::repos::RepoError;

#[derive(Debug, Display)]
pub enum HandlerError {
    #[display("{_0}")]
    Repo(RepoError),
    #[display("{_0}")]
    Call(CallError),
    #[display("event was observed through a watch with no parent DAO")]
    MissingDaoScope,
    #[display("invalid event field: {_0}")]
    InvalidField(String),
}

impl From<RepoError> for HandlerError {
    fn from(value: RepoError) -> Self {
        HandlerError::Repo(value)
    }
}

impl From<CallError> for HandlerError {
    fn from(value: CallError) -> Self {
        HandlerError::Call(value)
    }
}

/// A projection handler for one `(contract kind, event name)` combination.
///
/// The shared discipline is idempotent apply: re-applying the identical
/// decoded event must leave derived state exactly as the first application
/// did. Entity creation is create-if-absent, the vote tally increment is
/// gated on the vote row's replay-dedup key, and activity appends dedup on
/// `(transaction_hash, log_index)`.
#[async_trait::async_trait]
pub trait EventHandler: Send + Sync {
    fn contract_kind(&self) -> ContractKind;
    fn event_name(&self) -> &'static str;
    async fn handle_event(&self, context: &EventHandlerContext) -> Result<(), HandlerError>;
}

/// Every built-in handler, in registration order.
pub fn all() -> Vec<Arc<dyn EventHandler>> {
    vec![
        Arc::new(DaoCreatedHandler),
        Arc::new(ProposalCreatedHandler),
        Arc::new(VoteCastHandler),
        Arc::new(ProposalExecutedHandler),
        Arc::new(ProposalCanceledHandler),
        Arc::new(DepositHandler),
        Arc::new(WithdrawalHandler),
        Arc::new(MemberAddedHandler),
        Arc::new(MemberRemovedHandler),
    ]
}
