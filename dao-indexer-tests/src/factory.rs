pub mod logs;
pub mod readers;
pub mod repos;

pub use logs::*;
pub use readers::*;
pub use repos::*;

use std::collections::HashMap;
use std::sync::Arc;

use dao_indexer::{
    dispatcher, ChainReader, ContractKind, ContractRegistry, ContractWatch, Dispatcher, Event,
    EventHandlerContext, EventsSender, Repo, WatchReceiver, WatchSender,
};
use ethers::types::{Address, Block, Log, U256};
use uuid::Uuid;

// The deterministic addresses a local hardhat node assigns to the first
// few deployments.
pub const FACTORY_ADDRESS: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
pub const DAO_ADDRESS: &str = "0xe7f1725e7734ce288f8367e1bb143e90bb3f0512";
pub const GOVERNANCE_ADDRESS: &str = "0x9fe46736679d2d9a65f0992f2272de9f3c7fa6e0";
pub const TREASURY_ADDRESS: &str = "0xcf7ed3acca5a467e9e704c703e8d87f634fb0fc9";

pub const CREATOR_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
pub const VOTER_ADDRESS: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

pub fn address(value: &str) -> Address {
    value.parse().unwrap()
}

pub fn random_address() -> Address {
    use rand::Rng;

    let mut bytes = [0u8; 20];
    rand::thread_rng().fill(&mut bytes[..]);

    Address::from(bytes)
}

pub fn watch(
    contract_address: &str,
    kind: ContractKind,
    parent_dao_id: Option<Uuid>,
) -> ContractWatch {
    ContractWatch {
        id: Uuid::new_v4(),
        address: contract_address.to_lowercase(),
        kind,
        parent_dao_id,
        start_block_number: 0,
    }
}

/// Decodes a single factory-built log the way the scanners do, stamping it
/// with the block timestamp convention of `FakeReader` (block number times
/// 1000).
pub fn decode_event(log: &Log, watch: &ContractWatch) -> Event {
    let block_number = log.block_number.unwrap();

    let mut blocks_by_number = HashMap::new();
    blocks_by_number.insert(
        block_number,
        Block {
            number: Some(block_number),
            timestamp: U256::from(block_number.as_u64() * 1000),
            ..Default::default()
        },
    );

    dao_indexer::events::decode(std::slice::from_ref(log), watch, &blocks_by_number)
        .pop()
        .unwrap()
}

/// Everything a test needs to drive the pipeline against in-memory
/// collaborators.
pub struct TestIndexer {
    pub repo: Arc<InMemoryRepo>,
    pub store: Arc<dyn Repo>,
    pub reader: FakeReader,
    pub registry: ContractRegistry,
    pub sink: EventsSender,
    pub watch_sender: WatchSender,
    pub watch_receiver: Option<WatchReceiver>,
}

pub async fn test_indexer() -> TestIndexer {
    let repo = Arc::new(InMemoryRepo::default());
    let store: Arc<dyn Repo> = repo.clone();
    let reader = FakeReader::new(0);
    let registry = ContractRegistry::load(store.clone()).await.unwrap();

    let (watch_sender, watch_receiver) = tokio::sync::mpsc::unbounded_channel();

    let dispatcher = Dispatcher::new(
        store.clone(),
        Arc::new(reader.clone()),
        registry.clone(),
        address(FACTORY_ADDRESS),
        watch_sender.clone(),
    );
    let (sink, _worker) = dispatcher::start(dispatcher);

    TestIndexer {
        repo,
        store,
        reader,
        registry,
        sink,
        watch_sender,
        watch_receiver: Some(watch_receiver),
    }
}

impl TestIndexer {
    pub fn chain_reader(&self) -> Arc<dyn ChainReader> {
        Arc::new(self.reader.clone())
    }

    pub fn context_for(&self, event: Event) -> EventHandlerContext {
        EventHandlerContext {
            event,
            repo: self.store.clone(),
            reader: self.chain_reader(),
            registry: self.registry.clone(),
            factory_address: address(FACTORY_ADDRESS),
            new_watches: self.watch_sender.clone(),
        }
    }
}
