use crate::contracts::ContractKind;
use crate::entities::{ActivityKind, UnsavedActivity, UnsavedMember};

use super::{EventHandler, EventHandlerContext, HandlerError};

/// Voting power granted to a directly-added member, matching the core
/// contract's default grant.
const DEFAULT_VOTING_POWER: i64 = 100;

pub struct MemberAddedHandler;

#[async_trait::async_trait]
impl EventHandler for MemberAddedHandler {
    fn contract_kind(&self) -> ContractKind {
        ContractKind::Core
    }

    fn event_name(&self) -> &'static str {
        "MemberAdded"
    }

    async fn handle_event(&self, context: &EventHandlerContext) -> Result<(), HandlerError> {
        let dao_id = context.dao_id()?;
        let params = context.get_event_params();
        let member = params.get_address_string("member");
        let joined_at = context.event.get_block_timestamp();

        context
            .repo
            .create_member(&UnsavedMember::new(
                dao_id,
                &member,
                DEFAULT_VOTING_POWER,
                joined_at,
            ))
            .await?;

        context
            .repo
            .create_activity(&UnsavedActivity::new(
                dao_id,
                ActivityKind::MemberAdded,
                &member,
                serde_json::json!({ "txHash": context.event.transaction_hash }),
                &context.event.transaction_hash,
                context.event.get_log_index(),
                joined_at,
            ))
            .await?;

        Ok(())
    }
}

pub struct MemberRemovedHandler;

#[async_trait::async_trait]
impl EventHandler for MemberRemovedHandler {
    fn contract_kind(&self) -> ContractKind {
        ContractKind::Core
    }

    fn event_name(&self) -> &'static str {
        "MemberRemoved"
    }

    async fn handle_event(&self, context: &EventHandlerContext) -> Result<(), HandlerError> {
        let dao_id = context.dao_id()?;
        let params = context.get_event_params();
        let member_address = params.get_address_string("member");

        // Member rows are never deleted; removal zeroes the voting power so
        // the row stays addressable by later events.
        if let Some(member) = context.repo.find_member(&dao_id, &member_address).await? {
            context.repo.update_member_voting_power(&member.id, 0).await?;
        }

        context
            .repo
            .create_activity(&UnsavedActivity::new(
                dao_id,
                ActivityKind::MemberRemoved,
                &member_address,
                serde_json::json!({ "txHash": context.event.transaction_hash }),
                &context.event.transaction_hash,
                context.event.get_log_index(),
                context.event.get_block_timestamp(),
            ))
            .await?;

        Ok(())
    }
}
