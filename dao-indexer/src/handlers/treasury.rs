use crate::contracts::ContractKind;
use crate::entities::{ActivityKind, UnsavedActivity};

use super::{EventHandler, EventHandlerContext, HandlerError};

/// Treasury events touch the audit trail only: balances are read live from
/// the chain by consumers, never projected.
async fn record_transfer(
    context: &EventHandlerContext,
    actor_field: &str,
    activity_kind: ActivityKind,
) -> Result<(), HandlerError> {
    let dao_id = context.dao_id()?;
    let params = context.get_event_params();
    let actor = params.get_address_string(actor_field);
    let token = params.get_address_string("token");
    let amount = params.get_uint("amount");

    context
        .repo
        .create_activity(&UnsavedActivity::new(
            dao_id,
            activity_kind,
            &actor,
            serde_json::json!({
                "txHash": context.event.transaction_hash,
                "token": token,
                "amount": amount.to_string(),
            }),
            &context.event.transaction_hash,
            context.event.get_log_index(),
            context.event.get_block_timestamp(),
        ))
        .await?;

    Ok(())
}

pub struct DepositHandler;

#[async_trait::async_trait]
impl EventHandler for DepositHandler {
    fn contract_kind(&self) -> ContractKind {
        ContractKind::Treasury
    }

    fn event_name(&self) -> &'static str {
        "Deposit"
    }

    async fn handle_event(&self, context: &EventHandlerContext) -> Result<(), HandlerError> {
        record_transfer(context, "from", ActivityKind::TreasuryDeposit).await
    }
}

pub struct WithdrawalHandler;

#[async_trait::async_trait]
impl EventHandler for WithdrawalHandler {
    fn contract_kind(&self) -> ContractKind {
        ContractKind::Treasury
    }

    fn event_name(&self) -> &'static str {
        "Withdrawal"
    }

    async fn handle_event(&self, context: &EventHandlerContext) -> Result<(), HandlerError> {
        record_transfer(context, "to", ActivityKind::TreasuryWithdrawal).await
    }
}
