use derive_more::Display;
use uuid::Uuid;

use crate::contracts::{ContractWatch, UnsavedContractWatch};
use crate::entities::{
    Activity, ActivityFilters, Dao, Member, Proposal, ProposalState, Support, UnsavedActivity,
    UnsavedDao, UnsavedMember, UnsavedProposal, UnsavedVote, Vote,
};

#[derive(Debug, Display)]
pub enum RepoError {
    NotConnected,
    Unknown(String),
}

/// Transactional CRUD over the derived entities, the contract watches and
/// the checkpoint. Everything the projection handlers write goes through
/// here, so the idempotence discipline (create-if-absent, dedup-before-
/// increment, atomic tally updates) is enforced in one place.
#[async_trait::async_trait]
pub trait Repo: Send + Sync {
    async fn get_checkpoint(&self) -> Result<Option<u64>, RepoError>;
    async fn commit_checkpoint(&self, block_number: u64) -> Result<(), RepoError>;

    /// Idempotent on address: re-creating an existing watch returns the
    /// stored row untouched.
    async fn create_contract_watch(
        &self,
        watch: &UnsavedContractWatch,
    ) -> Result<ContractWatch, RepoError>;
    async fn get_contract_watches(&self) -> Result<Vec<ContractWatch>, RepoError>;

    /// Create-if-absent by address; the update clause is empty, so the
    /// first writer wins and duplicate deliveries are no-ops.
    async fn create_dao(&self, dao: &UnsavedDao) -> Result<Dao, RepoError>;
    async fn find_dao_by_address(&self, address: &str) -> Result<Option<Dao>, RepoError>;
    async fn get_daos(&self, offset: i64, limit: i64) -> Result<Vec<Dao>, RepoError>;

    /// Create-if-absent by `(dao_id, address)`.
    async fn create_member(&self, member: &UnsavedMember) -> Result<Member, RepoError>;
    async fn find_member(&self, dao_id: &Uuid, address: &str) -> Result<Option<Member>, RepoError>;
    async fn update_member_voting_power(
        &self,
        member_id: &Uuid,
        voting_power: i64,
    ) -> Result<(), RepoError>;
    async fn get_members(
        &self,
        dao_id: &Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Member>, RepoError>;

    /// Create-if-absent by `(dao_id, proposal_id)`.
    async fn create_proposal(&self, proposal: &UnsavedProposal) -> Result<Proposal, RepoError>;
    /// Insert, or fill the descriptive fields of an existing row. Never
    /// touches vote tallies or the externally-driven state.
    async fn upsert_proposal(&self, proposal: &UnsavedProposal) -> Result<Proposal, RepoError>;
    async fn update_proposal_state(
        &self,
        proposal_id: &Uuid,
        state: ProposalState,
    ) -> Result<(), RepoError>;
    async fn find_proposal(
        &self,
        dao_id: &Uuid,
        onchain_proposal_id: i64,
    ) -> Result<Option<Proposal>, RepoError>;
    async fn get_proposals(
        &self,
        dao_id: &Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Proposal>, RepoError>;
    /// Single-statement atomic increment of the tally column matching
    /// `support`.
    async fn increment_proposal_votes(
        &self,
        proposal_id: &Uuid,
        support: Support,
        votes: i64,
    ) -> Result<(), RepoError>;

    /// Returns false when the vote's replay-dedup key
    /// `(member_id, proposal_id, transaction_hash, log_index)` already
    /// exists; callers must skip the tally increment in that case.
    async fn create_vote(&self, vote: &UnsavedVote) -> Result<bool, RepoError>;
    async fn get_votes(&self, proposal_id: &Uuid) -> Result<Vec<Vote>, RepoError>;

    /// Append-only, deduped on `(transaction_hash, log_index)` so replays
    /// do not duplicate feed entries.
    async fn create_activity(&self, activity: &UnsavedActivity) -> Result<(), RepoError>;
    async fn get_activities(
        &self,
        filters: &ActivityFilters,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Activity>, RepoError>;
}
