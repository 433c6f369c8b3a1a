use crate::contracts::ContractKind;
use crate::entities::{ActivityKind, ProposalState, UnsavedActivity, UnsavedProposal};

use super::{EventHandler, EventHandlerContext, HandlerError};

/// Proposal state is driven by the chain; these handlers record the
/// reported transition verbatim and compute nothing locally.
async fn record_state(
    context: &EventHandlerContext,
    state: ProposalState,
    activity_kind: ActivityKind,
) -> Result<(), HandlerError> {
    let dao_id = context.dao_id()?;
    let params = context.get_event_params();
    let proposal_id = params.get_u64("proposalId") as i64;
    let timestamp = context.event.get_block_timestamp();

    let proposal = context
        .repo
        .create_proposal(&UnsavedProposal::placeholder(dao_id, proposal_id, timestamp))
        .await?;
    context.repo.update_proposal_state(&proposal.id, state).await?;

    context
        .repo
        .create_activity(&UnsavedActivity::new(
            dao_id,
            activity_kind,
            &proposal.proposer,
            serde_json::json!({
                "txHash": context.event.transaction_hash,
                "proposalId": proposal_id,
            }),
            &context.event.transaction_hash,
            context.event.get_log_index(),
            timestamp,
        ))
        .await?;

    Ok(())
}

pub struct ProposalExecutedHandler;

#[async_trait::async_trait]
impl EventHandler for ProposalExecutedHandler {
    fn contract_kind(&self) -> ContractKind {
        ContractKind::Governance
    }

    fn event_name(&self) -> &'static str {
        "ProposalExecuted"
    }

    async fn handle_event(&self, context: &EventHandlerContext) -> Result<(), HandlerError> {
        record_state(context, ProposalState::Executed, ActivityKind::ProposalExecuted).await
    }
}

pub struct ProposalCanceledHandler;

#[async_trait::async_trait]
impl EventHandler for ProposalCanceledHandler {
    fn contract_kind(&self) -> ContractKind {
        ContractKind::Governance
    }

    fn event_name(&self) -> &'static str {
        "ProposalCanceled"
    }

    async fn handle_event(&self, context: &EventHandlerContext) -> Result<(), HandlerError> {
        record_state(context, ProposalState::Canceled, ActivityKind::ProposalCanceled).await
    }
}
