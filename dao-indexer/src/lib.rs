pub mod chain_reader;
pub mod checkpoint;
#[cfg(feature = "postgres")]
mod config;
pub mod contracts;
pub mod dispatcher;
pub mod entities;
pub mod events;
pub mod handlers;
pub mod ingester;
mod repos;
pub mod schemas;
mod task;

pub use chain_reader::{ChainReader, JsonRpcReader, LogReceiver, ProviderError};
pub use checkpoint::{CheckpointError, CheckpointStore};
pub use contracts::{
    ContractKind, ContractRegistry, ContractWatch, UnsavedContractWatch, WatchReceiver, WatchSender,
};
pub use dispatcher::{Dispatcher, EventsSender};
pub use entities::{
    Activity, ActivityFilters, ActivityKind, Dao, Member, Proposal, ProposalState, Support,
    UnsavedActivity, UnsavedDao, UnsavedMember, UnsavedProposal, UnsavedVote, Vote,
};
pub use events::{Event, EventParam};
pub use handlers::{EventHandler, EventHandlerContext, HandlerError};
pub use ingester::IngesterError;
pub use repos::*;
pub use task::IndexerTasks;

#[cfg(feature = "postgres")]
pub use config::{Config, ConfigError};

#[cfg(feature = "postgres")]
pub type DaoIndexerRepo = PostgresRepo;

#[cfg(feature = "postgres")]
use derive_more::Display;
#[cfg(feature = "postgres")]
use std::sync::Arc;

#[cfg(feature = "postgres")]
#[derive(Debug, Display)]
pub enum DaoIndexerError {
    #[display("config error: {_0}")]
    Config(ConfigError),
    #[display("repo error: {_0}")]
    Repo(RepoError),
    #[display("checkpoint error: {_0}")]
    Checkpoint(CheckpointError),
    #[display("provider error: {_0}")]
    Provider(ProviderError),
}

#[cfg(feature = "postgres")]
impl From<ConfigError> for DaoIndexerError {
    fn from(value: ConfigError) -> Self {
        DaoIndexerError::Config(value)
    }
}

#[cfg(feature = "postgres")]
impl From<RepoError> for DaoIndexerError {
    fn from(value: RepoError) -> Self {
        DaoIndexerError::Repo(value)
    }
}

#[cfg(feature = "postgres")]
impl From<CheckpointError> for DaoIndexerError {
    fn from(value: CheckpointError) -> Self {
        DaoIndexerError::Checkpoint(value)
    }
}

#[cfg(feature = "postgres")]
impl From<ProviderError> for DaoIndexerError {
    fn from(value: ProviderError) -> Self {
        DaoIndexerError::Provider(value)
    }
}

/// Boots the indexing subsystem: migrates the store, seeds the factory
/// watch and the checkpoint, runs the initial backfill, then leaves the
/// live listener and the poll loop running. The returned handle stops
/// every background task on shutdown.
#[cfg(feature = "postgres")]
pub async fn start(config: &Config) -> Result<IndexerTasks, DaoIndexerError> {
    config.validate()?;
    let factory_address = config
        .factory_address
        .parse()
        .map_err(|_| ConfigError::InvalidFactoryAddress)?;

    let client = config.repo.get_client().await?;
    client.migrate().await?;
    let repo: Arc<dyn Repo> = Arc::new(client);

    let reader: Arc<dyn ChainReader> = Arc::new(chain_reader::get(&config.json_rpc_url));

    let registry = ContractRegistry::load(repo.clone()).await?;
    let checkpoint = CheckpointStore::new(repo.clone());

    let current_block_number = chain_reader::fetch_current_block_number(&reader).await?;

    let start_block = config.start_block.unwrap_or(current_block_number);
    registry
        .watch(UnsavedContractWatch::new(
            &config.factory_address,
            ContractKind::Factory,
            None,
            start_block,
        ))
        .await?;

    let from_block = match checkpoint.get().await? {
        Some(committed) => committed + 1,
        None => {
            // Absent checkpoint: start from the configured block, or skip
            // history entirely and index forward from the current height.
            let seed = match config.start_block {
                Some(explicit_start) => explicit_start.saturating_sub(1),
                None => current_block_number,
            };
            checkpoint.commit(seed).await?;
            seed + 1
        }
    };

    let (watch_sender, watch_receiver) = tokio::sync::mpsc::unbounded_channel();

    let dispatcher = Dispatcher::new(
        repo.clone(),
        reader.clone(),
        registry.clone(),
        factory_address,
        watch_sender.clone(),
    );
    let (sink, worker) = dispatcher::start(dispatcher);

    let tasks = IndexerTasks::new();
    tasks.set_worker(worker).await;

    // Subscriptions go up before the backfill so fan-out watches created
    // while scanning history are picked up as they register.
    tasks
        .add(ingester::live::start(
            reader.clone(),
            sink.clone(),
            watch_receiver,
            tasks.clone(),
        ))
        .await;
    for watch in registry.list().await {
        let _ = watch_sender.send(watch);
    }

    if from_block <= current_block_number {
        if let Err(ingester_error) = ingester::ingest_range(
            &reader,
            &registry,
            &sink,
            &checkpoint,
            from_block,
            current_block_number,
            config.blocks_per_batch,
        )
        .await
        {
            // Committed batches stand; the poll loop resumes from the last
            // one on its next tick.
            log::error!("initial backfill did not complete: {ingester_error}");
        }
    }

    tasks
        .add(ingester::poll::start(
            reader,
            registry,
            sink,
            checkpoint,
            config.poll_interval_ms,
            config.blocks_per_batch,
        ))
        .await;

    Ok(tasks)
}
