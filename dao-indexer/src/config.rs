use derive_more::Display;

use crate::DaoIndexerRepo;

#[derive(Debug, Display)]
pub enum ConfigError {
    #[display("no JSON-RPC url provided")]
    NoJsonRpcUrl,
    #[display("no factory contract address provided")]
    NoFactoryAddress,
    #[display("factory contract address is not a valid address")]
    InvalidFactoryAddress,
}

/// Startup configuration for the indexing subsystem. Validation failures
/// are fatal: `start` refuses to spawn anything on an invalid config.
#[derive(Clone)]
pub struct Config {
    pub repo: DaoIndexerRepo,
    pub json_rpc_url: String,
    pub factory_address: String,
    pub start_block: Option<u64>,
    pub poll_interval_ms: u64,
    pub blocks_per_batch: u64,
}

impl Config {
    pub fn new(repo: DaoIndexerRepo, json_rpc_url: &str, factory_address: &str) -> Self {
        Self {
            repo,
            json_rpc_url: json_rpc_url.to_string(),
            factory_address: factory_address.to_lowercase(),
            start_block: None,
            poll_interval_ms: 3_000,
            blocks_per_batch: 450,
        }
    }

    pub fn with_start_block(mut self, start_block: u64) -> Self {
        self.start_block = Some(start_block);

        self
    }

    pub fn with_poll_interval_ms(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;

        self
    }

    pub fn with_blocks_per_batch(mut self, blocks_per_batch: u64) -> Self {
        self.blocks_per_batch = blocks_per_batch;

        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.json_rpc_url.is_empty() {
            return Err(ConfigError::NoJsonRpcUrl);
        }

        if self.factory_address.is_empty() {
            return Err(ConfigError::NoFactoryAddress);
        }

        if self.factory_address.parse::<ethers::types::Address>().is_err() {
            return Err(ConfigError::InvalidFactoryAddress);
        }

        Ok(())
    }
}
