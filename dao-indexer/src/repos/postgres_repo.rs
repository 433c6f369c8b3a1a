mod migrations;

pub use migrations::SQLikeMigrations;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio_postgres::{types::ToSql, Client, NoTls};
use uuid::Uuid;

use crate::contracts::{ContractWatch, UnsavedContractWatch};
use crate::entities::{
    Activity, ActivityFilters, Dao, Member, Proposal, ProposalState, Support, UnsavedActivity,
    UnsavedDao, UnsavedMember, UnsavedProposal, UnsavedVote, Vote,
};
use crate::repos::{Repo, RepoError};

/// Connection factory for the Postgres-backed derived store.
#[derive(Clone, Debug)]
pub struct PostgresRepo {
    url: String,
}

impl PostgresRepo {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }

    pub async fn get_client(&self) -> Result<PostgresRepoClient, RepoError> {
        let (client, conn) =
            tokio_postgres::connect(&self.url, NoTls).await.map_err(|_| RepoError::NotConnected)?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                log::error!("postgres connection error: {e}");
            }
        });

        Ok(PostgresRepoClient { client })
    }
}

pub struct PostgresRepoClient {
    client: Client,
}

impl PostgresRepoClient {
    pub async fn migrate(&self) -> Result<(), RepoError> {
        for migration in SQLikeMigrations::get_internal() {
            self.execute(migration, &[]).await?;
        }

        Ok(())
    }

    async fn execute(
        &self,
        query: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, RepoError> {
        self.client.execute(query, params).await.map_err(|e| RepoError::Unknown(e.to_string()))
    }

    async fn load_list<Data: DeserializeOwned>(
        &self,
        query: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Data>, RepoError> {
        let rows = self
            .client
            .query(json_aggregate_query(query).as_str(), params)
            .await
            .map_err(|e| RepoError::Unknown(e.to_string()))?;

        let json_aggregate: serde_json::Value = rows
            .first()
            .ok_or_else(|| RepoError::Unknown("empty json aggregate".to_string()))?
            .get(0);

        if json_aggregate.is_array() {
            serde_json::from_value(json_aggregate).map_err(|e| RepoError::Unknown(e.to_string()))
        } else {
            Ok(vec![])
        }
    }

    async fn load_one<Data: DeserializeOwned>(
        &self,
        query: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Data>, RepoError> {
        let mut data_list: Vec<Data> = self.load_list(query, params).await?;

        Ok(data_list.pop())
    }
}

fn json_aggregate_query(query: &str) -> String {
    format!("WITH result AS ({query}) SELECT COALESCE(json_agg(result), '[]'::json) FROM result")
}

#[derive(Deserialize)]
struct CheckpointRow {
    block_number: i64,
}

#[async_trait::async_trait]
impl Repo for PostgresRepoClient {
    async fn get_checkpoint(&self) -> Result<Option<u64>, RepoError> {
        let row: Option<CheckpointRow> = self
            .load_one(
                "SELECT block_number FROM dao_indexer_checkpoint WHERE id = 1",
                &[],
            )
            .await?;

        Ok(row.map(|r| r.block_number as u64))
    }

    async fn commit_checkpoint(&self, block_number: u64) -> Result<(), RepoError> {
        let block_number = block_number as i64;

        self.execute(
            "INSERT INTO dao_indexer_checkpoint (id, block_number)
             VALUES (1, $1)
             ON CONFLICT (id)
             DO UPDATE SET block_number = EXCLUDED.block_number
             WHERE dao_indexer_checkpoint.block_number <= EXCLUDED.block_number",
            &[&block_number],
        )
        .await?;

        Ok(())
    }

    async fn create_contract_watch(
        &self,
        watch: &UnsavedContractWatch,
    ) -> Result<ContractWatch, RepoError> {
        let id = Uuid::new_v4();
        let kind = watch.kind.to_string();

        self.execute(
            "INSERT INTO dao_indexer_contract_watches
             (id, address, kind, parent_dao_id, start_block_number)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (address) DO NOTHING",
            &[
                &id,
                &watch.address,
                &kind,
                &watch.parent_dao_id,
                &watch.start_block_number,
            ],
        )
        .await?;

        self.load_one(
            "SELECT id, address, kind, parent_dao_id, start_block_number
             FROM dao_indexer_contract_watches WHERE address = $1",
            &[&watch.address],
        )
        .await?
        .ok_or_else(|| RepoError::Unknown("contract watch insert did not land".to_string()))
    }

    async fn get_contract_watches(&self) -> Result<Vec<ContractWatch>, RepoError> {
        self.load_list(
            "SELECT id, address, kind, parent_dao_id, start_block_number
             FROM dao_indexer_contract_watches ORDER BY inserted_at ASC",
            &[],
        )
        .await
    }

    async fn create_dao(&self, dao: &UnsavedDao) -> Result<Dao, RepoError> {
        let id = Uuid::new_v4();

        self.execute(
            "INSERT INTO dao_indexer_daos (id, address, name, creator, created_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (address) DO NOTHING",
            &[&id, &dao.address, &dao.name, &dao.creator, &dao.created_at],
        )
        .await?;

        self.find_dao_by_address(&dao.address)
            .await?
            .ok_or_else(|| RepoError::Unknown("dao insert did not land".to_string()))
    }

    async fn find_dao_by_address(&self, address: &str) -> Result<Option<Dao>, RepoError> {
        let address = address.to_lowercase();

        self.load_one(
            "SELECT id, address, name, creator, created_at
             FROM dao_indexer_daos WHERE address = $1",
            &[&address],
        )
        .await
    }

    async fn get_daos(&self, offset: i64, limit: i64) -> Result<Vec<Dao>, RepoError> {
        self.load_list(
            "SELECT id, address, name, creator, created_at
             FROM dao_indexer_daos ORDER BY created_at DESC OFFSET $1 LIMIT $2",
            &[&offset, &limit],
        )
        .await
    }

    async fn create_member(&self, member: &UnsavedMember) -> Result<Member, RepoError> {
        let id = Uuid::new_v4();

        self.execute(
            "INSERT INTO dao_indexer_members
             (id, dao_id, address, voting_power, share_percentage, joined_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (dao_id, address) DO NOTHING",
            &[
                &id,
                &member.dao_id,
                &member.address,
                &member.voting_power,
                &member.share_percentage,
                &member.joined_at,
            ],
        )
        .await?;

        self.find_member(&member.dao_id, &member.address)
            .await?
            .ok_or_else(|| RepoError::Unknown("member insert did not land".to_string()))
    }

    async fn find_member(&self, dao_id: &Uuid, address: &str) -> Result<Option<Member>, RepoError> {
        let address = address.to_lowercase();

        self.load_one(
            "SELECT id, dao_id, address, voting_power, share_percentage, joined_at
             FROM dao_indexer_members WHERE dao_id = $1 AND address = $2",
            &[dao_id, &address],
        )
        .await
    }

    async fn update_member_voting_power(
        &self,
        member_id: &Uuid,
        voting_power: i64,
    ) -> Result<(), RepoError> {
        self.execute(
            "UPDATE dao_indexer_members SET voting_power = $2 WHERE id = $1",
            &[member_id, &voting_power],
        )
        .await?;

        Ok(())
    }

    async fn get_members(
        &self,
        dao_id: &Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Member>, RepoError> {
        self.load_list(
            "SELECT id, dao_id, address, voting_power, share_percentage, joined_at
             FROM dao_indexer_members WHERE dao_id = $1
             ORDER BY voting_power DESC OFFSET $2 LIMIT $3",
            &[dao_id, &offset, &limit],
        )
        .await
    }

    async fn create_proposal(&self, proposal: &UnsavedProposal) -> Result<Proposal, RepoError> {
        let id = Uuid::new_v4();
        let state = proposal.state.to_string();

        self.execute(
            "INSERT INTO dao_indexer_proposals
             (id, dao_id, proposal_id, title, description, proposer, state,
              start_block, end_block, for_votes, against_votes, abstain_votes, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0, 0, 0, $10)
             ON CONFLICT (dao_id, proposal_id) DO NOTHING",
            &[
                &id,
                &proposal.dao_id,
                &proposal.proposal_id,
                &proposal.title,
                &proposal.description,
                &proposal.proposer,
                &state,
                &proposal.start_block,
                &proposal.end_block,
                &proposal.created_at,
            ],
        )
        .await?;

        self.find_proposal(&proposal.dao_id, proposal.proposal_id)
            .await?
            .ok_or_else(|| RepoError::Unknown("proposal insert did not land".to_string()))
    }

    async fn upsert_proposal(&self, proposal: &UnsavedProposal) -> Result<Proposal, RepoError> {
        let id = Uuid::new_v4();
        let state = proposal.state.to_string();

        // The update clause fills descriptive fields of a placeholder row
        // created by an early vote. Tallies and state stay untouched.
        self.execute(
            "INSERT INTO dao_indexer_proposals
             (id, dao_id, proposal_id, title, description, proposer, state,
              start_block, end_block, for_votes, against_votes, abstain_votes, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0, 0, 0, $10)
             ON CONFLICT (dao_id, proposal_id)
             DO UPDATE SET title = EXCLUDED.title,
                           description = EXCLUDED.description,
                           proposer = EXCLUDED.proposer,
                           start_block = EXCLUDED.start_block,
                           end_block = EXCLUDED.end_block,
                           created_at = EXCLUDED.created_at",
            &[
                &id,
                &proposal.dao_id,
                &proposal.proposal_id,
                &proposal.title,
                &proposal.description,
                &proposal.proposer,
                &state,
                &proposal.start_block,
                &proposal.end_block,
                &proposal.created_at,
            ],
        )
        .await?;

        self.find_proposal(&proposal.dao_id, proposal.proposal_id)
            .await?
            .ok_or_else(|| RepoError::Unknown("proposal upsert did not land".to_string()))
    }

    async fn update_proposal_state(
        &self,
        proposal_id: &Uuid,
        state: ProposalState,
    ) -> Result<(), RepoError> {
        let state = state.to_string();

        self.execute(
            "UPDATE dao_indexer_proposals SET state = $2 WHERE id = $1",
            &[proposal_id, &state],
        )
        .await?;

        Ok(())
    }

    async fn find_proposal(
        &self,
        dao_id: &Uuid,
        onchain_proposal_id: i64,
    ) -> Result<Option<Proposal>, RepoError> {
        self.load_one(
            "SELECT id, dao_id, proposal_id, title, description, proposer, state,
                    start_block, end_block, for_votes, against_votes, abstain_votes, created_at
             FROM dao_indexer_proposals WHERE dao_id = $1 AND proposal_id = $2",
            &[dao_id, &onchain_proposal_id],
        )
        .await
    }

    async fn get_proposals(
        &self,
        dao_id: &Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Proposal>, RepoError> {
        self.load_list(
            "SELECT id, dao_id, proposal_id, title, description, proposer, state,
                    start_block, end_block, for_votes, against_votes, abstain_votes, created_at
             FROM dao_indexer_proposals WHERE dao_id = $1
             ORDER BY created_at DESC OFFSET $2 LIMIT $3",
            &[dao_id, &offset, &limit],
        )
        .await
    }

    async fn increment_proposal_votes(
        &self,
        proposal_id: &Uuid,
        support: Support,
        votes: i64,
    ) -> Result<(), RepoError> {
        let tally_column = match support {
            Support::Against => "against_votes",
            Support::For => "for_votes",
            Support::Abstain => "abstain_votes",
        };

        self.execute(
            &format!(
                "UPDATE dao_indexer_proposals
                 SET {tally_column} = {tally_column} + $2 WHERE id = $1"
            ),
            &[proposal_id, &votes],
        )
        .await?;

        Ok(())
    }

    async fn create_vote(&self, vote: &UnsavedVote) -> Result<bool, RepoError> {
        let id = Uuid::new_v4();
        let support = u8::from(vote.support) as i16;

        let inserted = self
            .execute(
                "INSERT INTO dao_indexer_votes
                 (id, member_id, proposal_id, support, voting_power,
                  transaction_hash, log_index, cast_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                 ON CONFLICT (member_id, proposal_id, transaction_hash, log_index) DO NOTHING",
                &[
                    &id,
                    &vote.member_id,
                    &vote.proposal_id,
                    &support,
                    &vote.voting_power,
                    &vote.transaction_hash,
                    &vote.log_index,
                    &vote.cast_at,
                ],
            )
            .await?;

        Ok(inserted > 0)
    }

    async fn get_votes(&self, proposal_id: &Uuid) -> Result<Vec<Vote>, RepoError> {
        self.load_list(
            "SELECT id, member_id, proposal_id, support, voting_power,
                    transaction_hash, log_index, cast_at
             FROM dao_indexer_votes WHERE proposal_id = $1 ORDER BY cast_at DESC",
            &[proposal_id],
        )
        .await
    }

    async fn create_activity(&self, activity: &UnsavedActivity) -> Result<(), RepoError> {
        let id = Uuid::new_v4();

        self.execute(
            "INSERT INTO dao_indexer_activities
             (id, dao_id, kind, actor, metadata, transaction_hash, log_index, timestamp)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (transaction_hash, log_index) DO NOTHING",
            &[
                &id,
                &activity.dao_id,
                &activity.kind,
                &activity.actor,
                &activity.metadata,
                &activity.transaction_hash,
                &activity.log_index,
                &activity.timestamp,
            ],
        )
        .await?;

        Ok(())
    }

    async fn get_activities(
        &self,
        filters: &ActivityFilters,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Activity>, RepoError> {
        let mut conditions = vec![];
        let mut params: Vec<&(dyn ToSql + Sync)> = vec![];

        if let Some(dao_id) = &filters.dao_id {
            params.push(dao_id);
            conditions.push(format!("dao_id = ${}", params.len()));
        }
        if let Some(actor) = &filters.actor {
            params.push(actor);
            conditions.push(format!("actor = ${}", params.len()));
        }
        if let Some(kind) = &filters.kind {
            params.push(kind);
            conditions.push(format!("kind = ${}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        params.push(&offset);
        params.push(&limit);

        let query = format!(
            "SELECT id, dao_id, kind, actor, metadata, transaction_hash, log_index, timestamp
             FROM dao_indexer_activities {where_clause}
             ORDER BY timestamp DESC, log_index DESC
             OFFSET ${} LIMIT ${}",
            params.len() - 1,
            params.len()
        );

        self.load_list(&query, &params).await
    }
}
