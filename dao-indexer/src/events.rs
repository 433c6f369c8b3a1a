mod event;

pub use event::{DecodeError, Event, EventParam};

use std::collections::HashMap;

use ethers::types::{Block, Log, TxHash, U64};

use crate::contracts::ContractWatch;
use crate::schemas;

/// Decodes raw logs of one watched contract through the schema registry,
/// ordered by `(block_number, log_index)` ascending. Logs that do not match
/// a registered event of the watch's kind, or whose payload fails to
/// decode, are dropped without affecting their siblings.
pub fn decode(
    logs: &[Log],
    watch: &ContractWatch,
    blocks_by_number: &HashMap<U64, Block<TxHash>>,
) -> Vec<Event> {
    let mut events: Vec<_> = logs
        .iter()
        .filter_map(|log| {
            let topic = log.topics.first()?;

            let Some(schema) = schemas::global().find(watch.kind, topic) else {
                log::debug!(
                    "skipping log with unregistered topic {topic:?} for {} contract {}",
                    watch.kind,
                    watch.address
                );
                return None;
            };

            let block_timestamp = log
                .block_number
                .and_then(|n| blocks_by_number.get(&n))
                .map(|block| block.timestamp.as_u64() as i64)?;

            match Event::new(log, schema, watch, block_timestamp) {
                Ok(event) => Some(event),
                Err(decode_error) => {
                    log::warn!(
                        "dropping undecodable {} log from {}: {decode_error}",
                        schema.value.name,
                        watch.address
                    );
                    None
                }
            }
        })
        .collect();

    events.sort_by_key(|e| (e.block_number, e.log_index));

    events
}
