use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use derive_more::Display;
use ethers::abi::{LogParam, Token};
use ethers::types::Log;
use uuid::Uuid;

use crate::contracts::{ContractKind, ContractWatch};
use crate::schemas::EventSchema;

use serde::Deserialize;

#[derive(Debug, Display)]
pub enum DecodeError {
    #[display("log field {_0} is missing")]
    MissingLogField(&'static str),
    #[display("{_0}")]
    Abi(String),
}

/// A raw log transformed into named, typed fields per the schema registry,
/// stamped with the watch it was observed through.
#[derive(Debug, Deserialize, Clone, Eq)]
pub struct Event {
    pub id: Uuid,
    pub contract_address: String,
    pub contract_kind: ContractKind,
    pub name: String,
    parameters: serde_json::Value,
    pub parent_dao_id: Option<Uuid>,
    pub block_number: i64,
    block_timestamp: i64,
    pub transaction_hash: String,
    pub log_index: i32,
    removed: bool,
    pub inserted_at: chrono::NaiveDateTime,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.contract_address == other.contract_address
            && self.name == other.name
            && self.transaction_hash == other.transaction_hash
            && self.log_index == other.log_index
    }
}

impl Hash for Event {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.contract_address.hash(state);
        self.name.hash(state);
        self.transaction_hash.hash(state);
        self.log_index.hash(state);
    }
}

impl Event {
    pub fn new(
        log: &Log,
        schema: &EventSchema,
        watch: &ContractWatch,
        block_timestamp: i64,
    ) -> Result<Self, DecodeError> {
        let log_params = schema
            .value
            .parse_log(log.clone().into())
            .map_err(|e| DecodeError::Abi(e.to_string()))?
            .params;
        let parameters = Self::log_params_to_parameters(&log_params);

        Ok(Self {
            id: Uuid::new_v4(),
            contract_address: utils::address_to_string(&log.address).to_lowercase(),
            contract_kind: watch.kind,
            name: schema.value.name.clone(),
            parameters: serde_json::to_value(parameters)
                .map_err(|e| DecodeError::Abi(e.to_string()))?,
            parent_dao_id: watch.parent_dao_id,
            block_number: log
                .block_number
                .ok_or(DecodeError::MissingLogField("block_number"))?
                .as_u64() as i64,
            block_timestamp,
            transaction_hash: hashes::h256_to_string(
                &log.transaction_hash.ok_or(DecodeError::MissingLogField("transaction_hash"))?,
            )
            .to_lowercase(),
            log_index: log.log_index.ok_or(DecodeError::MissingLogField("log_index"))?.as_u32()
                as i32,
            removed: log.removed.unwrap_or(false),
            inserted_at: chrono::Utc::now().naive_utc(),
        })
    }

    pub fn get_block_number(&self) -> u64 {
        self.block_number as u64
    }
    pub fn get_block_timestamp(&self) -> i64 {
        self.block_timestamp
    }
    pub fn get_log_index(&self) -> i32 {
        self.log_index
    }

    pub fn get_params(&self) -> EventParam {
        EventParam::new(&self.parameters)
    }

    pub fn not_removed(&self) -> bool {
        !self.removed
    }

    fn log_params_to_parameters(log_params: &[LogParam]) -> HashMap<String, Token> {
        log_params.iter().fold(HashMap::new(), |mut parameters, log_param| {
            parameters.insert(log_param.name.to_string(), log_param.value.clone());

            parameters
        })
    }
}

pub struct EventParam {
    value: HashMap<String, Token>,
}

impl EventParam {
    pub(crate) fn new(parameters: &serde_json::Value) -> EventParam {
        EventParam {
            value: serde_json::from_value(parameters.clone()).unwrap(),
        }
    }

    pub fn get_string(&self, key: &str) -> String {
        self.value.get(key).unwrap().to_string()
    }

    pub fn get_u8(&self, key: &str) -> u8 {
        self.get_uint(key).as_usize() as u8
    }
    pub fn get_u64(&self, key: &str) -> u64 {
        self.get_uint(key).as_u64()
    }
    pub fn get_uint(&self, key: &str) -> ethers::types::U256 {
        self.get_token(key).into_uint().unwrap()
    }
    pub fn get_address_string(&self, key: &str) -> String {
        utils::address_to_string(&self.get_token(key).into_address().unwrap()).to_lowercase()
    }

    fn get_token(&self, key: &str) -> Token {
        self.value.get(key).unwrap().clone()
    }
}

mod hashes {
    use ethers::types::H256;

    pub fn h256_to_string(h256: &H256) -> String {
        serde_json::to_value(h256).unwrap().as_str().unwrap().to_string()
    }
}

mod utils {
    use ethers::types::H160;

    pub fn address_to_string(address: &H160) -> String {
        serde_json::to_value(address).unwrap().as_str().unwrap().to_string()
    }
}
