use crate::contracts::ContractKind;
use crate::entities::{ActivityKind, UnsavedActivity, UnsavedProposal};

use super::{EventHandler, EventHandlerContext, HandlerError};

pub struct ProposalCreatedHandler;

#[async_trait::async_trait]
impl EventHandler for ProposalCreatedHandler {
    fn contract_kind(&self) -> ContractKind {
        ContractKind::Governance
    }

    fn event_name(&self) -> &'static str {
        "ProposalCreated"
    }

    async fn handle_event(&self, context: &EventHandlerContext) -> Result<(), HandlerError> {
        let dao_id = context.dao_id()?;
        let params = context.get_event_params();
        let proposal_id = params.get_u64("proposalId") as i64;
        let proposer = params.get_address_string("proposer");
        let title = params.get_string("title");
        let start_block = params.get_u64("startBlock") as i64;
        let end_block = params.get_u64("endBlock") as i64;
        let created_at = context.event.get_block_timestamp();

        // Upsert rather than plain create: an out-of-order vote may already
        // have materialized this proposal as a placeholder.
        context
            .repo
            .upsert_proposal(&UnsavedProposal::new(
                dao_id,
                proposal_id,
                &title,
                &proposer,
                start_block,
                end_block,
                created_at,
            ))
            .await?;

        context
            .repo
            .create_activity(&UnsavedActivity::new(
                dao_id,
                ActivityKind::ProposalCreated,
                &proposer,
                serde_json::json!({
                    "txHash": context.event.transaction_hash,
                    "proposalId": proposal_id,
                    "title": title,
                }),
                &context.event.transaction_hash,
                context.event.get_log_index(),
                created_at,
            ))
            .await?;

        Ok(())
    }
}
