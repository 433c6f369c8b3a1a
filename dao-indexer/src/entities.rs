use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A vote's direction, mirroring the `support` field of `VoteCast`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Support {
    Against,
    For,
    Abstain,
}

impl TryFrom<u8> for Support {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Support::Against),
            1 => Ok(Support::For),
            2 => Ok(Support::Abstain),
            other => Err(format!("invalid support value: {other}")),
        }
    }
}

impl From<Support> for u8 {
    fn from(support: Support) -> u8 {
        match support {
            Support::Against => 0,
            Support::For => 1,
            Support::Abstain => 2,
        }
    }
}

/// Proposal lifecycle states as reported by the chain. The indexer records
/// states verbatim and never computes transitions locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalState {
    Pending,
    Active,
    Executed,
    Canceled,
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposalState::Pending => write!(f, "Pending"),
            ProposalState::Active => write!(f, "Active"),
            ProposalState::Executed => write!(f, "Executed"),
            ProposalState::Canceled => write!(f, "Canceled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dao {
    pub id: Uuid,
    pub address: String,
    pub name: String,
    pub creator: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnsavedDao {
    pub address: String,
    pub name: String,
    pub creator: String,
    pub created_at: i64,
}

impl UnsavedDao {
    pub fn new(address: &str, name: &str, creator: &str, created_at: i64) -> Self {
        Self {
            address: address.to_lowercase(),
            name: name.to_string(),
            creator: creator.to_lowercase(),
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub dao_id: Uuid,
    pub address: String,
    pub voting_power: i64,
    pub share_percentage: f64,
    pub joined_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnsavedMember {
    pub dao_id: Uuid,
    pub address: String,
    pub voting_power: i64,
    pub share_percentage: f64,
    pub joined_at: i64,
}

impl UnsavedMember {
    pub fn new(dao_id: Uuid, address: &str, voting_power: i64, joined_at: i64) -> Self {
        Self {
            dao_id,
            address: address.to_lowercase(),
            voting_power,
            share_percentage: 0.0,
            joined_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: Uuid,
    pub dao_id: Uuid,
    /// The on-chain proposal number. Unique per DAO, not globally: every
    /// governance deployment numbers its proposals from 1.
    pub proposal_id: i64,
    pub title: String,
    pub description: String,
    pub proposer: String,
    pub state: ProposalState,
    pub start_block: i64,
    pub end_block: i64,
    pub for_votes: i64,
    pub against_votes: i64,
    pub abstain_votes: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnsavedProposal {
    pub dao_id: Uuid,
    pub proposal_id: i64,
    pub title: String,
    pub description: String,
    pub proposer: String,
    pub state: ProposalState,
    pub start_block: i64,
    pub end_block: i64,
    pub created_at: i64,
}

impl UnsavedProposal {
    pub fn new(
        dao_id: Uuid,
        proposal_id: i64,
        title: &str,
        proposer: &str,
        start_block: i64,
        end_block: i64,
        created_at: i64,
    ) -> Self {
        Self {
            dao_id,
            proposal_id,
            title: title.to_string(),
            description: String::new(),
            proposer: proposer.to_lowercase(),
            state: ProposalState::Pending,
            start_block,
            end_block,
            created_at,
        }
    }

    /// A stand-in row created when a vote or state event refers to a
    /// proposal whose creation event has not been observed yet. A later
    /// `ProposalCreated` fills in the descriptive fields.
    pub fn placeholder(dao_id: Uuid, proposal_id: i64, created_at: i64) -> Self {
        Self::new(dao_id, proposal_id, "", "", 0, 0, created_at)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub id: Uuid,
    pub member_id: Uuid,
    pub proposal_id: Uuid,
    pub support: Support,
    pub voting_power: i64,
    pub transaction_hash: String,
    pub log_index: i32,
    pub cast_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnsavedVote {
    pub member_id: Uuid,
    pub proposal_id: Uuid,
    pub support: Support,
    pub voting_power: i64,
    pub transaction_hash: String,
    pub log_index: i32,
    pub cast_at: i64,
}

/// The activity feed's entry kinds, serialized with the names consumers
/// filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    DaoCreated,
    ProposalCreated,
    ProposalExecuted,
    ProposalCanceled,
    VoteCast,
    TreasuryDeposit,
    TreasuryWithdrawal,
    MemberAdded,
    MemberRemoved,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityKind::DaoCreated => write!(f, "DAOCreated"),
            ActivityKind::ProposalCreated => write!(f, "ProposalCreated"),
            ActivityKind::ProposalExecuted => write!(f, "ProposalExecuted"),
            ActivityKind::ProposalCanceled => write!(f, "ProposalCanceled"),
            ActivityKind::VoteCast => write!(f, "VoteCast"),
            ActivityKind::TreasuryDeposit => write!(f, "TreasuryDeposit"),
            ActivityKind::TreasuryWithdrawal => write!(f, "TreasuryWithdrawal"),
            ActivityKind::MemberAdded => write!(f, "MemberAdded"),
            ActivityKind::MemberRemoved => write!(f, "MemberRemoved"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub dao_id: Uuid,
    pub kind: String,
    pub actor: String,
    pub metadata: serde_json::Value,
    pub transaction_hash: String,
    pub log_index: i32,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnsavedActivity {
    pub dao_id: Uuid,
    pub kind: String,
    pub actor: String,
    pub metadata: serde_json::Value,
    pub transaction_hash: String,
    pub log_index: i32,
    pub timestamp: i64,
}

impl UnsavedActivity {
    pub fn new(
        dao_id: Uuid,
        kind: ActivityKind,
        actor: &str,
        metadata: serde_json::Value,
        transaction_hash: &str,
        log_index: i32,
        timestamp: i64,
    ) -> Self {
        Self {
            dao_id,
            kind: kind.to_string(),
            actor: actor.to_lowercase(),
            metadata,
            transaction_hash: transaction_hash.to_string(),
            log_index,
            timestamp,
        }
    }
}

/// Filters for the activity feed read path.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilters {
    pub dao_id: Option<Uuid>,
    pub actor: Option<String>,
    pub kind: Option<String>,
}
