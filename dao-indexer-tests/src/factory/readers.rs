use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use dao_indexer::{ChainReader, LogReceiver, ProviderError};
use ethers::abi::{encode, Token};
use ethers::types::{
    Address, Block, Bytes, Filter, Log, Topic, TxHash, ValueOrArray, U256, U64,
};
use tokio::sync::mpsc;

/// In-memory stand-in for the remote chain. Historical logs are served
/// through `get_logs` with real filter matching; live logs are pushed to
/// matching subscriptions; `call` answers from canned per-address outputs.
#[derive(Clone, Default)]
pub struct FakeReader {
    inner: Arc<FakeReaderInner>,
}

#[derive(Default)]
struct FakeReaderInner {
    block_number: AtomicU64,
    logs: Mutex<Vec<Log>>,
    call_outputs: Mutex<HashMap<Address, Bytes>>,
    subscriptions: Mutex<Vec<(Filter, mpsc::UnboundedSender<Log>)>>,
}

impl FakeReader {
    pub fn new(block_number: u64) -> Self {
        let reader = FakeReader::default();
        reader.set_block_number(block_number);

        reader
    }

    pub fn set_block_number(&self, block_number: u64) {
        self.inner.block_number.store(block_number, Ordering::SeqCst);
    }

    pub fn add_logs(&self, logs: Vec<Log>) {
        self.inner.logs.lock().unwrap().extend(logs);
    }

    pub fn set_call_output(&self, to: Address, output: Vec<Token>) {
        self.inner.call_outputs.lock().unwrap().insert(to, Bytes::from(encode(&output)));
    }

    /// Delivers a log to every live subscription whose filter matches it.
    pub fn push_live(&self, log: Log) {
        let subscriptions = self.inner.subscriptions.lock().unwrap();

        for (filter, sender) in subscriptions.iter() {
            if log_matches(filter, &log) {
                let _ = sender.send(log.clone());
            }
        }
    }

    /// Drops every subscription sender, closing the receivers the way a
    /// broken connection would.
    pub fn end_subscriptions(&self) {
        self.inner.subscriptions.lock().unwrap().clear();
    }

    pub fn subscription_count(&self) -> usize {
        self.inner.subscriptions.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl ChainReader for FakeReader {
    async fn get_block_number(&self) -> Result<U64, ProviderError> {
        Ok(U64::from(self.inner.block_number.load(Ordering::SeqCst)))
    }

    async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, ProviderError> {
        let logs = self.inner.logs.lock().unwrap();

        Ok(logs.iter().filter(|log| log_matches(filter, log)).cloned().collect())
    }

    async fn get_block(&self, block_number: U64) -> Result<Block<TxHash>, ProviderError> {
        Ok(Block {
            number: Some(block_number),
            timestamp: U256::from(block_number.as_u64() * 1000),
            ..Default::default()
        })
    }

    async fn subscribe_logs(&self, filter: &Filter) -> LogReceiver {
        let (sender, receiver) = mpsc::unbounded_channel();

        self.inner.subscriptions.lock().unwrap().push((filter.clone(), sender));

        receiver
    }

    async fn call(&self, to: Address, _data: Bytes) -> Result<Bytes, ProviderError> {
        self.inner
            .call_outputs
            .lock()
            .unwrap()
            .get(&to)
            .cloned()
            .ok_or_else(|| ProviderError::CustomError(format!("no canned output for {to:?}")))
    }
}

fn log_matches(filter: &Filter, log: &Log) -> bool {
    if let Some(address) = &filter.address {
        let matches = match address {
            ValueOrArray::Value(value) => log.address == *value,
            ValueOrArray::Array(values) => values.contains(&log.address),
        };
        if !matches {
            return false;
        }
    }

    let block_number = log.block_number.unwrap_or_default();
    if let Some(from_block) = filter.get_from_block() {
        if block_number < from_block {
            return false;
        }
    }
    if let Some(to_block) = filter.get_to_block() {
        if block_number > to_block {
            return false;
        }
    }

    if let Some(topic0) = &filter.topics[0] {
        let first_topic = log.topics.first().copied();

        let matches = match topic0 {
            Topic::Value(Some(value)) => first_topic == Some(*value),
            Topic::Value(None) => true,
            Topic::Array(values) => {
                first_topic.map(|topic| values.contains(&Some(topic))).unwrap_or(false)
            }
        };
        if !matches {
            return false;
        }
    }

    true
}
