use std::sync::Arc;

use ethers::types::Address;
use uuid::Uuid;

use crate::chain_reader::ChainReader;
use crate::contracts::{ContractRegistry, WatchSender};
use crate::events::{Event, EventParam};
use crate::repos::Repo;

use super::HandlerError;

/// Everything a projection handler may touch: the decoded event, the
/// derived store, the chain (for the one-off `daoInfo` call), the watch
/// registry and the fan-out announcement channel.
#[derive(Clone)]
pub struct EventHandlerContext {
    pub event: Event,
    pub repo: Arc<dyn Repo>,
    pub reader: Arc<dyn ChainReader>,
    pub registry: ContractRegistry,
    pub factory_address: Address,
    pub new_watches: WatchSender,
}

impl EventHandlerContext {
    pub fn get_event_params(&self) -> EventParam {
        self.event.get_params()
    }

    /// The owning DAO, resolved from the watched contract's registered
    /// parent — never re-derived from the event payload.
    pub fn dao_id(&self) -> Result<Uuid, HandlerError> {
        self.event.parent_dao_id.ok_or(HandlerError::MissingDaoScope)
    }
}
