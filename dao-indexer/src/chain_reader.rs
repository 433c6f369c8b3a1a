use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use derive_more::Display;
use ethers::abi::{Function, HumanReadableParser, Token};
use ethers::prelude::Middleware;
use ethers::providers::{Http, Provider as EthersProvider, ProviderError as EthersProviderError};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Block, Bytes, Filter, Log, TransactionRequest, TxHash, U64};
use futures_util::future::try_join_all;
use futures_util::StreamExt;
use once_cell::sync::Lazy;
use tokio::sync::mpsc;
use tokio::time::sleep;

pub type ProviderError = EthersProviderError;

/// Logs delivered by a push subscription. The sender half is dropped when
/// the underlying subscription ends, so a closed receiver is the signal to
/// re-subscribe.
pub type LogReceiver = mpsc::UnboundedReceiver<Log>;

/// Read-only facade over the remote chain. Everything the indexer knows
/// about the outside world comes through here, which is also the seam the
/// test factories fake.
#[async_trait::async_trait]
pub trait ChainReader: Send + Sync {
    async fn get_block_number(&self) -> Result<U64, ProviderError>;
    async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, ProviderError>;
    async fn get_block(&self, block_number: U64) -> Result<Block<TxHash>, ProviderError>;
    async fn subscribe_logs(&self, filter: &Filter) -> LogReceiver;
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ProviderError>;

    async fn get_blocks_by_number(
        &self,
        logs: &[Log],
    ) -> Result<HashMap<U64, Block<TxHash>>, ProviderError> {
        let mut logs = logs.to_owned();
        logs.dedup_by_key(|log| log.block_number);

        const CHUNK_SIZE: usize = 4;
        let chunked_logs: Vec<_> = logs.chunks(CHUNK_SIZE).collect();

        let mut blocks = vec![];
        for chunked_log in chunked_logs {
            blocks.extend(
                try_join_all(
                    chunked_log
                        .iter()
                        .filter_map(|Log { block_number, .. }| *block_number)
                        .map(|block_number| self.get_block(block_number)),
                )
                .await?,
            );
        }

        let mut blocks_by_number = HashMap::new();
        for block @ Block { number, .. } in blocks {
            if let Some(number) = number {
                blocks_by_number.insert(number, block);
            }
        }

        Ok(blocks_by_number)
    }
}

#[derive(Clone)]
pub struct JsonRpcReader {
    provider: Arc<EthersProvider<Http>>,
}

#[async_trait::async_trait]
impl ChainReader for JsonRpcReader {
    async fn get_block_number(&self) -> Result<U64, ProviderError> {
        Middleware::get_block_number(&*self.provider).await
    }

    async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, ProviderError> {
        Middleware::get_logs(&*self.provider, filter).await
    }

    async fn get_block(&self, block_number: U64) -> Result<Block<TxHash>, ProviderError> {
        Middleware::get_block(&*self.provider, block_number)
            .await?
            .ok_or_else(|| ProviderError::CustomError(format!("block {block_number} not found")))
    }

    async fn subscribe_logs(&self, filter: &Filter) -> LogReceiver {
        let (sender, receiver) = mpsc::unbounded_channel();
        let provider = self.provider.clone();
        let filter = filter.clone();

        // HTTP transports have no push channel; an installed log filter
        // polled by the provider is the closest equivalent. The sender is
        // dropped when the watcher ends, which tells the listener to
        // re-subscribe.
        tokio::spawn(async move {
            match provider.watch(&filter).await {
                Ok(stream) => {
                    futures_util::pin_mut!(stream);

                    while let Some(log) = stream.next().await {
                        if sender.send(log).is_err() {
                            return;
                        }
                    }
                }
                Err(provider_error) => {
                    log::warn!("failed to install log watch: {provider_error}");
                }
            }
        });

        receiver
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ProviderError> {
        let transaction: TypedTransaction = TransactionRequest::new().to(to).data(data).into();

        Middleware::call(&*self.provider, &transaction, None).await
    }
}

pub fn get(json_rpc_url: &str) -> JsonRpcReader {
    JsonRpcReader {
        provider: Arc::new(EthersProvider::<Http>::try_from(json_rpc_url).unwrap()),
    }
}

const MAX_RETRIES: u32 = 5;

pub async fn fetch_current_block_number(
    reader: &Arc<dyn ChainReader>,
) -> Result<u64, ProviderError> {
    let mut retries_so_far = 0;

    loop {
        match reader.get_block_number().await {
            Ok(current_block_number) => return Ok(current_block_number.as_u64()),
            Err(provider_error) if retries_so_far < MAX_RETRIES => {
                log::warn!("failed to fetch current block number: {provider_error}");

                backoff(retries_so_far).await;
                retries_so_far += 1;
            }
            Err(provider_error) => return Err(provider_error),
        }
    }
}

pub async fn fetch_logs(
    reader: &Arc<dyn ChainReader>,
    filter: &Filter,
) -> Result<Vec<Log>, ProviderError> {
    let mut retries_so_far = 0;

    loop {
        match reader.get_logs(filter).await {
            Ok(logs) => return Ok(logs),
            Err(provider_error) if retries_so_far < MAX_RETRIES => {
                log::warn!("failed to fetch logs: {provider_error}");

                backoff(retries_so_far).await;
                retries_so_far += 1;
            }
            Err(provider_error) => return Err(provider_error),
        }
    }
}

pub async fn fetch_blocks_by_number(
    reader: &Arc<dyn ChainReader>,
    logs: &[Log],
) -> Result<HashMap<U64, Block<TxHash>>, ProviderError> {
    let mut retries_so_far = 0;

    loop {
        match reader.get_blocks_by_number(logs).await {
            Ok(blocks_by_number) => return Ok(blocks_by_number),
            Err(provider_error) if retries_so_far < MAX_RETRIES => {
                log::warn!("failed to fetch blocks: {provider_error}");

                backoff(retries_so_far).await;
                retries_so_far += 1;
            }
            Err(provider_error) => return Err(provider_error),
        }
    }
}

pub async fn backoff(retries_so_far: u32) {
    sleep(Duration::from_secs(2u64.pow(retries_so_far.min(6)))).await;
}

#[derive(Debug, Display)]
pub enum CallError {
    #[display("{_0}")]
    Provider(ProviderError),
    #[display("{_0}")]
    Abi(String),
}

impl From<ProviderError> for CallError {
    fn from(value: ProviderError) -> Self {
        CallError::Provider(value)
    }
}

/// The module addresses a factory reports for one of its DAOs.
#[derive(Debug, Clone, PartialEq)]
pub struct DaoModules {
    pub governance: String,
    pub treasury: String,
}

const DAO_INFO_ABI: &str =
    "function daoInfo(address) returns (string, address, address, address, address, uint256, bool)";

static DAO_INFO: Lazy<Function> =
    Lazy::new(|| HumanReadableParser::parse_function(DAO_INFO_ABI).unwrap());

/// Asks the factory for a DAO's deployed module addresses. Called once per
/// DAO-creation event to drive fan-out registration.
pub async fn fetch_dao_modules(
    reader: &Arc<dyn ChainReader>,
    factory_address: Address,
    dao_address: Address,
) -> Result<DaoModules, CallError> {
    let data = DAO_INFO
        .encode_input(&[Token::Address(dao_address)])
        .map_err(|e| CallError::Abi(e.to_string()))?;

    let output = reader.call(factory_address, data.into()).await?;
    let tokens = DAO_INFO.decode_output(&output).map_err(|e| CallError::Abi(e.to_string()))?;

    // daoInfo returns (name, creator, governance, treasury, membership,
    // createdAt, isActive)
    match (tokens.get(2), tokens.get(3)) {
        (Some(Token::Address(governance)), Some(Token::Address(treasury))) => Ok(DaoModules {
            governance: format!("{governance:?}"),
            treasury: format!("{treasury:?}"),
        }),
        _ => Err(CallError::Abi(format!(
            "unexpected daoInfo output shape: {} tokens",
            tokens.len()
        ))),
    }
}
