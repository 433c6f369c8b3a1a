pub struct SQLikeMigrations;

impl SQLikeMigrations {
    pub fn create_checkpoint() -> &'static [&'static str] {
        &["CREATE TABLE IF NOT EXISTS dao_indexer_checkpoint (
                id SMALLINT PRIMARY KEY,
                block_number BIGINT NOT NULL
        )"]
    }

    pub fn create_contract_watches() -> &'static [&'static str] {
        &[
            "CREATE TABLE IF NOT EXISTS dao_indexer_contract_watches (
                id uuid PRIMARY KEY,
                address VARCHAR NOT NULL,
                kind VARCHAR NOT NULL,
                parent_dao_id uuid,
                start_block_number BIGINT NOT NULL,
                inserted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
            "CREATE UNIQUE INDEX IF NOT EXISTS dao_indexer_contract_watches_address_index
            ON dao_indexer_contract_watches(address)",
        ]
    }

    pub fn create_daos() -> &'static [&'static str] {
        &[
            "CREATE TABLE IF NOT EXISTS dao_indexer_daos (
                id uuid PRIMARY KEY,
                address VARCHAR NOT NULL,
                name VARCHAR NOT NULL,
                creator VARCHAR NOT NULL,
                created_at BIGINT NOT NULL
            )",
            "CREATE UNIQUE INDEX IF NOT EXISTS dao_indexer_daos_address_index
            ON dao_indexer_daos(address)",
        ]
    }

    pub fn create_members() -> &'static [&'static str] {
        &[
            "CREATE TABLE IF NOT EXISTS dao_indexer_members (
                id uuid PRIMARY KEY,
                dao_id uuid NOT NULL,
                address VARCHAR NOT NULL,
                voting_power BIGINT NOT NULL,
                share_percentage DOUBLE PRECISION NOT NULL,
                joined_at BIGINT NOT NULL
            )",
            "CREATE UNIQUE INDEX IF NOT EXISTS dao_indexer_members_dao_address_index
            ON dao_indexer_members(dao_id, address)",
        ]
    }

    pub fn create_proposals() -> &'static [&'static str] {
        &[
            "CREATE TABLE IF NOT EXISTS dao_indexer_proposals (
                id uuid PRIMARY KEY,
                dao_id uuid NOT NULL,
                proposal_id BIGINT NOT NULL,
                title VARCHAR NOT NULL,
                description TEXT NOT NULL,
                proposer VARCHAR NOT NULL,
                state VARCHAR NOT NULL,
                start_block BIGINT NOT NULL,
                end_block BIGINT NOT NULL,
                for_votes BIGINT NOT NULL,
                against_votes BIGINT NOT NULL,
                abstain_votes BIGINT NOT NULL,
                created_at BIGINT NOT NULL
            )",
            "CREATE UNIQUE INDEX IF NOT EXISTS dao_indexer_proposals_dao_proposal_index
            ON dao_indexer_proposals(dao_id, proposal_id)",
        ]
    }

    pub fn create_votes() -> &'static [&'static str] {
        &[
            "CREATE TABLE IF NOT EXISTS dao_indexer_votes (
                id uuid PRIMARY KEY,
                member_id uuid NOT NULL,
                proposal_id uuid NOT NULL,
                support SMALLINT NOT NULL,
                voting_power BIGINT NOT NULL,
                transaction_hash VARCHAR NOT NULL,
                log_index INTEGER NOT NULL,
                cast_at BIGINT NOT NULL
            )",
            "CREATE UNIQUE INDEX IF NOT EXISTS dao_indexer_votes_replay_index
            ON dao_indexer_votes(member_id, proposal_id, transaction_hash, log_index)",
        ]
    }

    pub fn create_activities() -> &'static [&'static str] {
        &[
            "CREATE TABLE IF NOT EXISTS dao_indexer_activities (
                id uuid PRIMARY KEY,
                dao_id uuid NOT NULL,
                kind VARCHAR NOT NULL,
                actor VARCHAR NOT NULL,
                metadata JSON NOT NULL,
                transaction_hash VARCHAR NOT NULL,
                log_index INTEGER NOT NULL,
                timestamp BIGINT NOT NULL
            )",
            "CREATE UNIQUE INDEX IF NOT EXISTS dao_indexer_activities_replay_index
            ON dao_indexer_activities(transaction_hash, log_index)",
            "CREATE INDEX IF NOT EXISTS dao_indexer_activities_dao_timestamp_index
            ON dao_indexer_activities(dao_id, timestamp)",
        ]
    }

    pub fn get_internal() -> Vec<&'static str> {
        [
            Self::create_checkpoint(),
            Self::create_contract_watches(),
            Self::create_daos(),
            Self::create_members(),
            Self::create_proposals(),
            Self::create_votes(),
            Self::create_activities(),
        ]
        .concat()
    }
}
