use std::collections::HashMap;

use ethers::abi::{Event as AbiEvent, HumanReadableParser};
use ethers::types::H256;
use once_cell::sync::Lazy;

use crate::contracts::ContractKind;

/// One entry of the Event Schema Registry: the human-readable ABI of an
/// event alongside its parsed form, bound to the contract kind that emits
/// it.
#[derive(Debug, Clone)]
pub struct EventSchema {
    pub kind: ContractKind,
    pub abi: &'static str,
    pub value: AbiEvent,
}

impl EventSchema {
    fn new(kind: ContractKind, abi: &'static str) -> Self {
        Self {
            kind,
            abi,
            value: HumanReadableParser::parse_event(abi).unwrap(),
        }
    }

    pub fn topic(&self) -> H256 {
        self.value.signature()
    }
}

const FACTORY_EVENT_ABIS: &[&str] = &[
    "event DAOCreated(address indexed daoAddress, address indexed creator, string name, uint256 timestamp)",
];

const CORE_EVENT_ABIS: &[&str] = &[
    "event MemberAdded(address indexed member)",
    "event MemberRemoved(address indexed member)",
];

const GOVERNANCE_EVENT_ABIS: &[&str] = &[
    "event ProposalCreated(uint256 indexed proposalId, address indexed proposer, string title, uint256 startBlock, uint256 endBlock)",
    "event VoteCast(address indexed voter, uint256 indexed proposalId, uint8 support, uint256 votes)",
    "event ProposalExecuted(uint256 indexed proposalId)",
    "event ProposalCanceled(uint256 indexed proposalId)",
];

const TREASURY_EVENT_ABIS: &[&str] = &[
    "event Deposit(address indexed from, address indexed token, uint256 amount)",
    "event Withdrawal(address indexed to, address indexed token, uint256 amount)",
];

/// Static lookup of decoded field layouts, keyed both ways: by contract
/// kind (to build log filters) and by `(kind, topic0)` (to decode a log).
pub struct SchemaRegistry {
    schemas: Vec<EventSchema>,
    by_kind_and_topic: HashMap<(ContractKind, H256), usize>,
}

impl SchemaRegistry {
    fn new() -> Self {
        let schemas: Vec<_> = [
            (ContractKind::Factory, FACTORY_EVENT_ABIS),
            (ContractKind::Core, CORE_EVENT_ABIS),
            (ContractKind::Governance, GOVERNANCE_EVENT_ABIS),
            (ContractKind::Treasury, TREASURY_EVENT_ABIS),
        ]
        .into_iter()
        .flat_map(|(kind, abis)| abis.iter().copied().map(move |abi| EventSchema::new(kind, abi)))
        .collect();

        let by_kind_and_topic = schemas
            .iter()
            .enumerate()
            .map(|(index, schema)| ((schema.kind, schema.topic()), index))
            .collect();

        Self {
            schemas,
            by_kind_and_topic,
        }
    }

    pub fn events_for(&self, kind: ContractKind) -> Vec<&EventSchema> {
        self.schemas.iter().filter(|s| s.kind == kind).collect()
    }

    pub fn topics_for(&self, kind: ContractKind) -> Vec<H256> {
        self.events_for(kind).iter().map(|s| s.topic()).collect()
    }

    pub fn find(&self, kind: ContractKind, topic: &H256) -> Option<&EventSchema> {
        self.by_kind_and_topic.get(&(kind, *topic)).map(|index| &self.schemas[*index])
    }

    pub fn find_by_name(&self, kind: ContractKind, name: &str) -> Option<&EventSchema> {
        self.schemas.iter().find(|s| s.kind == kind && s.value.name == name)
    }
}

static REGISTRY: Lazy<SchemaRegistry> = Lazy::new(SchemaRegistry::new);

pub fn global() -> &'static SchemaRegistry {
    &REGISTRY
}
