use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::chain_reader::{self, ChainReader};
use crate::checkpoint::CheckpointStore;
use crate::contracts::ContractRegistry;
use crate::dispatcher::EventsSender;

use super::{ingest_range, IngesterError};

/// The safety net: re-scans from the checkpoint to the current height on a
/// fixed interval, closing any gap the live listener missed. The tick body
/// runs to completion before the next tick fires, so scans never overlap
/// and race on the checkpoint.
pub fn start(
    reader: Arc<dyn ChainReader>,
    registry: ContractRegistry,
    sink: EventsSender,
    checkpoint: CheckpointStore,
    poll_interval_ms: u64,
    blocks_per_batch: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = interval(Duration::from_millis(poll_interval_ms));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            if let Err(ingester_error) =
                tick(&reader, &registry, &sink, &checkpoint, blocks_per_batch).await
            {
                log::error!("poll tick failed: {ingester_error}");
            }

            if sink.is_closed() {
                return;
            }
        }
    })
}

async fn tick(
    reader: &Arc<dyn ChainReader>,
    registry: &ContractRegistry,
    sink: &EventsSender,
    checkpoint: &CheckpointStore,
    blocks_per_batch: u64,
) -> Result<(), IngesterError> {
    let current_block_number = chain_reader::fetch_current_block_number(reader).await?;

    let Some(committed) = checkpoint.get().await? else {
        return Ok(());
    };

    if current_block_number > committed {
        ingest_range(
            reader,
            registry,
            sink,
            checkpoint,
            committed + 1,
            current_block_number,
            blocks_per_batch,
        )
        .await?;
    }

    Ok(())
}
