use dao_indexer::{schemas, ContractKind, Support};
use ethers::abi::{encode, Token};
use ethers::types::{Address, Bytes, Log, H256, U256};

pub fn dao_created_log(
    factory: Address,
    dao: Address,
    creator: Address,
    name: &str,
    timestamp: u64,
    block_number: u64,
    log_index: u32,
) -> Log {
    build_log(
        factory,
        event_topic(ContractKind::Factory, "DAOCreated"),
        vec![address_topic(dao), address_topic(creator)],
        encode(&[
            Token::String(name.to_string()),
            Token::Uint(U256::from(timestamp)),
        ]),
        block_number,
        log_index,
    )
}

pub fn proposal_created_log(
    governance: Address,
    proposal_id: u64,
    proposer: Address,
    title: &str,
    start_block: u64,
    end_block: u64,
    block_number: u64,
    log_index: u32,
) -> Log {
    build_log(
        governance,
        event_topic(ContractKind::Governance, "ProposalCreated"),
        vec![uint_topic(proposal_id), address_topic(proposer)],
        encode(&[
            Token::String(title.to_string()),
            Token::Uint(U256::from(start_block)),
            Token::Uint(U256::from(end_block)),
        ]),
        block_number,
        log_index,
    )
}

pub fn vote_cast_log(
    governance: Address,
    voter: Address,
    proposal_id: u64,
    support: Support,
    votes: u64,
    block_number: u64,
    log_index: u32,
) -> Log {
    build_log(
        governance,
        event_topic(ContractKind::Governance, "VoteCast"),
        vec![address_topic(voter), uint_topic(proposal_id)],
        encode(&[
            Token::Uint(U256::from(u8::from(support))),
            Token::Uint(U256::from(votes)),
        ]),
        block_number,
        log_index,
    )
}

pub fn proposal_executed_log(
    governance: Address,
    proposal_id: u64,
    block_number: u64,
    log_index: u32,
) -> Log {
    build_log(
        governance,
        event_topic(ContractKind::Governance, "ProposalExecuted"),
        vec![uint_topic(proposal_id)],
        vec![],
        block_number,
        log_index,
    )
}

pub fn proposal_canceled_log(
    governance: Address,
    proposal_id: u64,
    block_number: u64,
    log_index: u32,
) -> Log {
    build_log(
        governance,
        event_topic(ContractKind::Governance, "ProposalCanceled"),
        vec![uint_topic(proposal_id)],
        vec![],
        block_number,
        log_index,
    )
}

pub fn member_added_log(core: Address, member: Address, block_number: u64, log_index: u32) -> Log {
    build_log(
        core,
        event_topic(ContractKind::Core, "MemberAdded"),
        vec![address_topic(member)],
        vec![],
        block_number,
        log_index,
    )
}

pub fn member_removed_log(
    core: Address,
    member: Address,
    block_number: u64,
    log_index: u32,
) -> Log {
    build_log(
        core,
        event_topic(ContractKind::Core, "MemberRemoved"),
        vec![address_topic(member)],
        vec![],
        block_number,
        log_index,
    )
}

pub fn deposit_log(
    treasury: Address,
    from: Address,
    token: Address,
    amount: u64,
    block_number: u64,
    log_index: u32,
) -> Log {
    build_log(
        treasury,
        event_topic(ContractKind::Treasury, "Deposit"),
        vec![address_topic(from), address_topic(token)],
        encode(&[Token::Uint(U256::from(amount))]),
        block_number,
        log_index,
    )
}

pub fn withdrawal_log(
    treasury: Address,
    to: Address,
    token: Address,
    amount: u64,
    block_number: u64,
    log_index: u32,
) -> Log {
    build_log(
        treasury,
        event_topic(ContractKind::Treasury, "Withdrawal"),
        vec![address_topic(to), address_topic(token)],
        encode(&[Token::Uint(U256::from(amount))]),
        block_number,
        log_index,
    )
}

pub fn event_topic(kind: ContractKind, name: &str) -> H256 {
    schemas::global().find_by_name(kind, name).unwrap().topic()
}

pub fn address_topic(address: Address) -> H256 {
    let mut bytes = [0u8; 32];
    bytes[12..].copy_from_slice(address.as_bytes());

    H256::from(bytes)
}

pub fn uint_topic(value: u64) -> H256 {
    let mut bytes = [0u8; 32];
    U256::from(value).to_big_endian(&mut bytes);

    H256::from(bytes)
}

pub fn transaction_hash(block_number: u64, log_index: u32) -> H256 {
    uint_topic(block_number * 100_000 + log_index as u64)
}

fn build_log(
    contract_address: Address,
    topic0: H256,
    indexed_topics: Vec<H256>,
    data: Vec<u8>,
    block_number: u64,
    log_index: u32,
) -> Log {
    let mut topics = vec![topic0];
    topics.extend(indexed_topics);

    Log {
        address: contract_address,
        topics,
        data: Bytes::from(data),
        block_hash: Some(uint_topic(block_number)),
        block_number: Some(block_number.into()),
        transaction_hash: Some(transaction_hash(block_number, log_index)),
        transaction_index: Some(0.into()),
        log_index: Some(log_index.into()),
        transaction_log_index: None,
        log_type: None,
        removed: Some(false),
    }
}

/// Same shape as `build_log` but flagged as removed by a reorg.
pub fn removed_log(mut log: Log) -> Log {
    log.removed = Some(true);

    log
}

/// ABI-encoded `daoInfo` output: (name, creator, governance, treasury,
/// membership, createdAt, isActive).
pub fn dao_info_output(
    name: &str,
    creator: Address,
    governance: Address,
    treasury: Address,
    created_at: u64,
) -> Vec<Token> {
    vec![
        Token::String(name.to_string()),
        Token::Address(creator),
        Token::Address(governance),
        Token::Address(treasury),
        Token::Address(creator),
        Token::Uint(U256::from(created_at)),
        Token::Bool(true),
    ]
}
