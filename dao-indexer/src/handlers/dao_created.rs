use crate::chain_reader;
use crate::contracts::{ContractKind, UnsavedContractWatch};
use crate::entities::{ActivityKind, UnsavedActivity, UnsavedDao};

use super::{EventHandler, EventHandlerContext, HandlerError};

/// Projects a factory `DAOCreated` event and fans out watches for the new
/// DAO's sub-contracts, which is how the registry grows at runtime.
pub struct DaoCreatedHandler;

#[async_trait::async_trait]
impl EventHandler for DaoCreatedHandler {
    fn contract_kind(&self) -> ContractKind {
        ContractKind::Factory
    }

    fn event_name(&self) -> &'static str {
        "DAOCreated"
    }

    async fn handle_event(&self, context: &EventHandlerContext) -> Result<(), HandlerError> {
        let params = context.get_event_params();
        let dao_address = params.get_address_string("daoAddress");
        let creator = params.get_address_string("creator");
        let name = params.get_string("name");
        let created_at = params.get_u64("timestamp") as i64;

        let dao = context
            .repo
            .create_dao(&UnsavedDao::new(&dao_address, &name, &creator, created_at))
            .await?;

        let dao_address = dao
            .address
            .parse()
            .map_err(|_| HandlerError::InvalidField(format!("daoAddress: {}", dao.address)))?;
        let modules =
            chain_reader::fetch_dao_modules(&context.reader, context.factory_address, dao_address)
                .await?;

        let sub_contracts = [
            (dao.address.clone(), ContractKind::Core),
            (modules.governance.clone(), ContractKind::Governance),
            (modules.treasury.clone(), ContractKind::Treasury),
        ];

        for (address, kind) in sub_contracts {
            let unsaved = UnsavedContractWatch::new(
                &address,
                kind,
                Some(dao.id),
                context.event.get_block_number(),
            );

            if let Some(watch) = context.registry.watch(unsaved).await? {
                if context.new_watches.send(watch).is_err() {
                    log::debug!("live listener gone; {kind} watch for {address} not announced");
                }
            }
        }

        context
            .repo
            .create_activity(&UnsavedActivity::new(
                dao.id,
                ActivityKind::DaoCreated,
                &creator,
                serde_json::json!({
                    "txHash": context.event.transaction_hash,
                    "blockNumber": context.event.block_number,
                    "governance": modules.governance,
                    "treasury": modules.treasury,
                }),
                &context.event.transaction_hash,
                context.event.get_log_index(),
                context.event.get_block_timestamp(),
            ))
            .await?;

        Ok(())
    }
}
