use std::cmp::max;

use ethers::types::{Address, Filter as EthersFilter};

use crate::contracts::ContractWatch;
use crate::schemas;

/// An `eth_getLogs`/subscription filter bound to the watch it was built
/// for, so decoded logs keep their contract-kind and DAO scope.
#[derive(Clone, Debug)]
pub struct Filter {
    pub watch: ContractWatch,
    pub value: EthersFilter,
}

/// One range filter per watch, covering the registered event topics of the
/// watch's kind. A watch whose start block lies beyond the range yields no
/// filter.
pub fn get(watches: &[ContractWatch], from_block: u64, to_block: u64) -> Vec<Filter> {
    watches.iter().filter_map(|watch| Filter::maybe_new(watch, from_block, to_block)).collect()
}

/// An open-ended filter for push subscriptions.
pub fn subscription(watch: &ContractWatch) -> Option<Filter> {
    let address = parse_address(watch)?;

    Some(Filter {
        watch: watch.clone(),
        value: EthersFilter::new()
            .address(address)
            .topic0(schemas::global().topics_for(watch.kind)),
    })
}

impl Filter {
    fn maybe_new(watch: &ContractWatch, from_block: u64, to_block: u64) -> Option<Filter> {
        // Contracts emit nothing before they exist; clamp to the block the
        // watch was registered at.
        let from_block = max(from_block, watch.start_block_number as u64);
        if from_block > to_block {
            return None;
        }

        let address = parse_address(watch)?;

        Some(Filter {
            watch: watch.clone(),
            value: EthersFilter::new()
                .address(address)
                .topic0(schemas::global().topics_for(watch.kind))
                .from_block(from_block)
                .to_block(to_block),
        })
    }
}

fn parse_address(watch: &ContractWatch) -> Option<Address> {
    match watch.address.parse() {
        Ok(address) => Some(address),
        Err(_) => {
            log::error!("watched address {} is not a valid address", watch.address);
            None
        }
    }
}
