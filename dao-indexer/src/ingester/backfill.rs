use std::sync::Arc;

use crate::chain_reader::{self, ChainReader};
use crate::contracts::ContractRegistry;
use crate::dispatcher::EventsSender;
use crate::events;

use super::filters;
use super::IngesterError;

/// Scans a closed block range for every watched contract, publishing
/// decoded events to the projection sink in `(block, log index)` order
/// within each contract. Ordering across contracts is not guaranteed and
/// handlers do not rely on it.
pub async fn run(
    reader: &Arc<dyn ChainReader>,
    registry: &ContractRegistry,
    sink: &EventsSender,
    from_block: u64,
    to_block: u64,
) -> Result<(), IngesterError> {
    let watches = registry.list().await;

    for filter in filters::get(&watches, from_block, to_block) {
        let logs = chain_reader::fetch_logs(reader, &filter.value).await?;
        let blocks_by_number = chain_reader::fetch_blocks_by_number(reader, &logs).await?;

        for event in events::decode(&logs, &filter.watch, &blocks_by_number) {
            sink.send(event)?;
        }
    }

    Ok(())
}
