pub mod backfill;
mod error;
pub mod filters;
pub mod live;
pub mod poll;

pub use error::IngesterError;

use std::cmp::{max, min};
use std::sync::Arc;

use crate::chain_reader::ChainReader;
use crate::checkpoint::CheckpointStore;
use crate::contracts::ContractRegistry;
use crate::dispatcher::EventsSender;

/// Walks a closed block range batch by batch. Each batch is backfilled,
/// flushed through the projection worker, and only then committed, so the
/// checkpoint never runs ahead of projected state.
pub async fn ingest_range(
    reader: &Arc<dyn ChainReader>,
    registry: &ContractRegistry,
    sink: &EventsSender,
    checkpoint: &CheckpointStore,
    from_block: u64,
    to_block: u64,
    blocks_per_batch: u64,
) -> Result<(), IngesterError> {
    let blocks_per_batch = max(blocks_per_batch, 1);
    let mut batch_start = from_block;

    while batch_start <= to_block {
        let batch_end = min(batch_start + blocks_per_batch - 1, to_block);

        backfill::run(reader, registry, sink, batch_start, batch_end).await?;
        sink.flush().await?;
        checkpoint.commit(batch_end).await?;

        batch_start = batch_end + 1;
    }

    Ok(())
}
