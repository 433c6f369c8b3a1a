use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::chain_reader::{self, ChainReader};
use crate::contracts::{ContractWatch, WatchReceiver};
use crate::dispatcher::EventsSender;
use crate::events;
use crate::task::IndexerTasks;

use super::filters;

/// Consumes watch announcements and keeps one push subscription alive per
/// watched contract. Delivery is at-least-once and may duplicate what the
/// poll loop scans; correctness rests entirely on projection idempotence,
/// so no deduplication happens here — and the checkpoint is never touched,
/// since push delivery has no completeness guarantee.
pub fn start(
    reader: Arc<dyn ChainReader>,
    sink: EventsSender,
    mut new_watches: WatchReceiver,
    tasks: IndexerTasks,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(watch) = new_watches.recv().await {
            log::info!(
                "subscribing to {} events at {}",
                watch.kind,
                watch.address
            );

            let subtask = tokio::spawn(subscribe(reader.clone(), sink.clone(), watch));
            tasks.add(subtask).await;
        }
    })
}

async fn subscribe(reader: Arc<dyn ChainReader>, sink: EventsSender, watch: ContractWatch) {
    let Some(filter) = filters::subscription(&watch) else {
        return;
    };

    let mut retries_so_far = 0;

    loop {
        let mut logs = reader.subscribe_logs(&filter.value).await;

        while let Some(log) = logs.recv().await {
            retries_so_far = 0;

            let blocks_by_number =
                match reader.get_blocks_by_number(std::slice::from_ref(&log)).await {
                    Ok(blocks_by_number) => blocks_by_number,
                    Err(provider_error) => {
                        log::warn!(
                            "failed to stamp live log from {}: {provider_error}",
                            watch.address
                        );
                        continue;
                    }
                };

            for event in events::decode(std::slice::from_ref(&log), &watch, &blocks_by_number) {
                if sink.send(event).is_err() {
                    return;
                }
            }
        }

        if sink.is_closed() {
            return;
        }

        log::warn!(
            "log subscription for {} ended; re-subscribing",
            watch.address
        );
        chain_reader::backoff(retries_so_far).await;
        retries_so_far += 1;
    }
}
