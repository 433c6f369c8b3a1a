use crate::contracts::ContractKind;
use crate::entities::{
    ActivityKind, Support, UnsavedActivity, UnsavedMember, UnsavedProposal, UnsavedVote,
};

use super::{EventHandler, EventHandlerContext, HandlerError};

/// The one projection with an additive mutation. Replay safety comes from
/// deduping at the vote-row level before touching the tally: only a fresh
/// vote row triggers the atomic increment.
pub struct VoteCastHandler;

#[async_trait::async_trait]
impl EventHandler for VoteCastHandler {
    fn contract_kind(&self) -> ContractKind {
        ContractKind::Governance
    }

    fn event_name(&self) -> &'static str {
        "VoteCast"
    }

    async fn handle_event(&self, context: &EventHandlerContext) -> Result<(), HandlerError> {
        let dao_id = context.dao_id()?;
        let params = context.get_event_params();
        let voter = params.get_address_string("voter");
        let proposal_id = params.get_u64("proposalId") as i64;
        let support = Support::try_from(params.get_u8("support"))
            .map_err(HandlerError::InvalidField)?;
        let votes = params.get_u64("votes") as i64;
        let cast_at = context.event.get_block_timestamp();

        // Each vote event re-supplies the voter's current power, so an
        // existing member's power is overwritten, never accumulated.
        let member =
            context.repo.create_member(&UnsavedMember::new(dao_id, &voter, votes, cast_at)).await?;
        if member.voting_power != votes {
            context.repo.update_member_voting_power(&member.id, votes).await?;
        }

        let proposal = context
            .repo
            .create_proposal(&UnsavedProposal::placeholder(dao_id, proposal_id, cast_at))
            .await?;

        let inserted = context
            .repo
            .create_vote(&UnsavedVote {
                member_id: member.id,
                proposal_id: proposal.id,
                support,
                voting_power: votes,
                transaction_hash: context.event.transaction_hash.clone(),
                log_index: context.event.get_log_index(),
                cast_at,
            })
            .await?;

        if inserted {
            context.repo.increment_proposal_votes(&proposal.id, support, votes).await?;
        }

        context
            .repo
            .create_activity(&UnsavedActivity::new(
                dao_id,
                ActivityKind::VoteCast,
                &voter,
                serde_json::json!({
                    "txHash": context.event.transaction_hash,
                    "proposalId": proposal_id,
                    "support": u8::from(support),
                }),
                &context.event.transaction_hash,
                context.event.get_log_index(),
                cast_at,
            ))
            .await?;

        Ok(())
    }
}
