use std::sync::Mutex;

use dao_indexer::{
    Activity, ActivityFilters, ContractWatch, Dao, Member, Proposal, ProposalState, Repo,
    RepoError, Support, UnsavedActivity, UnsavedContractWatch, UnsavedDao, UnsavedMember,
    UnsavedProposal, UnsavedVote, Vote,
};
use uuid::Uuid;

/// Derived store double with the same uniqueness and upsert semantics as
/// the Postgres repo, so handler behavior is exercised against the
/// contract the production store honors.
#[derive(Default)]
pub struct InMemoryRepo {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    checkpoint: Option<u64>,
    watches: Vec<ContractWatch>,
    daos: Vec<Dao>,
    members: Vec<Member>,
    proposals: Vec<Proposal>,
    votes: Vec<Vote>,
    activities: Vec<Activity>,
}

fn page<T: Clone>(items: Vec<T>, offset: i64, limit: i64) -> Vec<T> {
    items.into_iter().skip(offset.max(0) as usize).take(limit.max(0) as usize).collect()
}

#[async_trait::async_trait]
impl Repo for InMemoryRepo {
    async fn get_checkpoint(&self) -> Result<Option<u64>, RepoError> {
        Ok(self.state.lock().unwrap().checkpoint)
    }

    async fn commit_checkpoint(&self, block_number: u64) -> Result<(), RepoError> {
        let mut state = self.state.lock().unwrap();

        match state.checkpoint {
            Some(committed) if block_number < committed => {}
            _ => state.checkpoint = Some(block_number),
        }

        Ok(())
    }

    async fn create_contract_watch(
        &self,
        watch: &UnsavedContractWatch,
    ) -> Result<ContractWatch, RepoError> {
        let mut state = self.state.lock().unwrap();

        if let Some(existing) = state.watches.iter().find(|w| w.address == watch.address) {
            return Ok(existing.clone());
        }

        let saved = ContractWatch {
            id: Uuid::new_v4(),
            address: watch.address.clone(),
            kind: watch.kind,
            parent_dao_id: watch.parent_dao_id,
            start_block_number: watch.start_block_number,
        };
        state.watches.push(saved.clone());

        Ok(saved)
    }

    async fn get_contract_watches(&self) -> Result<Vec<ContractWatch>, RepoError> {
        Ok(self.state.lock().unwrap().watches.clone())
    }

    async fn create_dao(&self, dao: &UnsavedDao) -> Result<Dao, RepoError> {
        let mut state = self.state.lock().unwrap();

        if let Some(existing) = state.daos.iter().find(|d| d.address == dao.address) {
            return Ok(existing.clone());
        }

        let saved = Dao {
            id: Uuid::new_v4(),
            address: dao.address.clone(),
            name: dao.name.clone(),
            creator: dao.creator.clone(),
            created_at: dao.created_at,
        };
        state.daos.push(saved.clone());

        Ok(saved)
    }

    async fn find_dao_by_address(&self, address: &str) -> Result<Option<Dao>, RepoError> {
        let address = address.to_lowercase();

        Ok(self.state.lock().unwrap().daos.iter().find(|d| d.address == address).cloned())
    }

    async fn get_daos(&self, offset: i64, limit: i64) -> Result<Vec<Dao>, RepoError> {
        let mut daos = self.state.lock().unwrap().daos.clone();
        daos.sort_by_key(|d| std::cmp::Reverse(d.created_at));

        Ok(page(daos, offset, limit))
    }

    async fn create_member(&self, member: &UnsavedMember) -> Result<Member, RepoError> {
        let mut state = self.state.lock().unwrap();

        if let Some(existing) = state
            .members
            .iter()
            .find(|m| m.dao_id == member.dao_id && m.address == member.address)
        {
            return Ok(existing.clone());
        }

        let saved = Member {
            id: Uuid::new_v4(),
            dao_id: member.dao_id,
            address: member.address.clone(),
            voting_power: member.voting_power,
            share_percentage: member.share_percentage,
            joined_at: member.joined_at,
        };
        state.members.push(saved.clone());

        Ok(saved)
    }

    async fn find_member(&self, dao_id: &Uuid, address: &str) -> Result<Option<Member>, RepoError> {
        let address = address.to_lowercase();

        Ok(self
            .state
            .lock()
            .unwrap()
            .members
            .iter()
            .find(|m| m.dao_id == *dao_id && m.address == address)
            .cloned())
    }

    async fn update_member_voting_power(
        &self,
        member_id: &Uuid,
        voting_power: i64,
    ) -> Result<(), RepoError> {
        let mut state = self.state.lock().unwrap();

        if let Some(member) = state.members.iter_mut().find(|m| m.id == *member_id) {
            member.voting_power = voting_power;
        }

        Ok(())
    }

    async fn get_members(
        &self,
        dao_id: &Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Member>, RepoError> {
        let mut members: Vec<_> = self
            .state
            .lock()
            .unwrap()
            .members
            .iter()
            .filter(|m| m.dao_id == *dao_id)
            .cloned()
            .collect();
        members.sort_by_key(|m| std::cmp::Reverse(m.voting_power));

        Ok(page(members, offset, limit))
    }

    async fn create_proposal(&self, proposal: &UnsavedProposal) -> Result<Proposal, RepoError> {
        let mut state = self.state.lock().unwrap();

        if let Some(existing) = state
            .proposals
            .iter()
            .find(|p| p.dao_id == proposal.dao_id && p.proposal_id == proposal.proposal_id)
        {
            return Ok(existing.clone());
        }

        let saved = new_proposal_row(proposal);
        state.proposals.push(saved.clone());

        Ok(saved)
    }

    async fn upsert_proposal(&self, proposal: &UnsavedProposal) -> Result<Proposal, RepoError> {
        let mut state = self.state.lock().unwrap();

        if let Some(existing) = state
            .proposals
            .iter_mut()
            .find(|p| p.dao_id == proposal.dao_id && p.proposal_id == proposal.proposal_id)
        {
            existing.title = proposal.title.clone();
            existing.description = proposal.description.clone();
            existing.proposer = proposal.proposer.clone();
            existing.start_block = proposal.start_block;
            existing.end_block = proposal.end_block;
            existing.created_at = proposal.created_at;

            return Ok(existing.clone());
        }

        let saved = new_proposal_row(proposal);
        state.proposals.push(saved.clone());

        Ok(saved)
    }

    async fn update_proposal_state(
        &self,
        proposal_id: &Uuid,
        proposal_state: ProposalState,
    ) -> Result<(), RepoError> {
        let mut state = self.state.lock().unwrap();

        if let Some(proposal) = state.proposals.iter_mut().find(|p| p.id == *proposal_id) {
            proposal.state = proposal_state;
        }

        Ok(())
    }

    async fn find_proposal(
        &self,
        dao_id: &Uuid,
        onchain_proposal_id: i64,
    ) -> Result<Option<Proposal>, RepoError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .proposals
            .iter()
            .find(|p| p.dao_id == *dao_id && p.proposal_id == onchain_proposal_id)
            .cloned())
    }

    async fn get_proposals(
        &self,
        dao_id: &Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Proposal>, RepoError> {
        let mut proposals: Vec<_> = self
            .state
            .lock()
            .unwrap()
            .proposals
            .iter()
            .filter(|p| p.dao_id == *dao_id)
            .cloned()
            .collect();
        proposals.sort_by_key(|p| std::cmp::Reverse(p.created_at));

        Ok(page(proposals, offset, limit))
    }

    async fn increment_proposal_votes(
        &self,
        proposal_id: &Uuid,
        support: Support,
        votes: i64,
    ) -> Result<(), RepoError> {
        let mut state = self.state.lock().unwrap();

        if let Some(proposal) = state.proposals.iter_mut().find(|p| p.id == *proposal_id) {
            match support {
                Support::Against => proposal.against_votes += votes,
                Support::For => proposal.for_votes += votes,
                Support::Abstain => proposal.abstain_votes += votes,
            }
        }

        Ok(())
    }

    async fn create_vote(&self, vote: &UnsavedVote) -> Result<bool, RepoError> {
        let mut state = self.state.lock().unwrap();

        let duplicate = state.votes.iter().any(|v| {
            v.member_id == vote.member_id
                && v.proposal_id == vote.proposal_id
                && v.transaction_hash == vote.transaction_hash
                && v.log_index == vote.log_index
        });
        if duplicate {
            return Ok(false);
        }

        state.votes.push(Vote {
            id: Uuid::new_v4(),
            member_id: vote.member_id,
            proposal_id: vote.proposal_id,
            support: vote.support,
            voting_power: vote.voting_power,
            transaction_hash: vote.transaction_hash.clone(),
            log_index: vote.log_index,
            cast_at: vote.cast_at,
        });

        Ok(true)
    }

    async fn get_votes(&self, proposal_id: &Uuid) -> Result<Vec<Vote>, RepoError> {
        let mut votes: Vec<_> = self
            .state
            .lock()
            .unwrap()
            .votes
            .iter()
            .filter(|v| v.proposal_id == *proposal_id)
            .cloned()
            .collect();
        votes.sort_by_key(|v| std::cmp::Reverse(v.cast_at));

        Ok(votes)
    }

    async fn create_activity(&self, activity: &UnsavedActivity) -> Result<(), RepoError> {
        let mut state = self.state.lock().unwrap();

        let duplicate = state.activities.iter().any(|a| {
            a.transaction_hash == activity.transaction_hash && a.log_index == activity.log_index
        });
        if duplicate {
            return Ok(());
        }

        state.activities.push(Activity {
            id: Uuid::new_v4(),
            dao_id: activity.dao_id,
            kind: activity.kind.clone(),
            actor: activity.actor.clone(),
            metadata: activity.metadata.clone(),
            transaction_hash: activity.transaction_hash.clone(),
            log_index: activity.log_index,
            timestamp: activity.timestamp,
        });

        Ok(())
    }

    async fn get_activities(
        &self,
        filters: &ActivityFilters,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Activity>, RepoError> {
        let mut activities: Vec<_> = self
            .state
            .lock()
            .unwrap()
            .activities
            .iter()
            .filter(|a| {
                filters.dao_id.map(|dao_id| a.dao_id == dao_id).unwrap_or(true)
                    && filters.actor.as_ref().map(|actor| a.actor == *actor).unwrap_or(true)
                    && filters.kind.as_ref().map(|kind| a.kind == *kind).unwrap_or(true)
            })
            .cloned()
            .collect();
        activities.sort_by_key(|a| std::cmp::Reverse((a.timestamp, a.log_index)));

        Ok(page(activities, offset, limit))
    }
}

fn new_proposal_row(proposal: &UnsavedProposal) -> Proposal {
    Proposal {
        id: Uuid::new_v4(),
        dao_id: proposal.dao_id,
        proposal_id: proposal.proposal_id,
        title: proposal.title.clone(),
        description: proposal.description.clone(),
        proposer: proposal.proposer.clone(),
        state: proposal.state,
        start_block: proposal.start_block,
        end_block: proposal.end_block,
        for_votes: 0,
        against_votes: 0,
        abstain_votes: 0,
        created_at: proposal.created_at,
    }
}
