use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repos::{Repo, RepoError};

/// The roles a watched address can play in the platform's contract suite.
/// The Factory is the sole seed watch; the rest are registered at runtime
/// when their DAO's creation event is projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractKind {
    Factory,
    Core,
    Governance,
    Treasury,
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractKind::Factory => write!(f, "Factory"),
            ContractKind::Core => write!(f, "Core"),
            ContractKind::Governance => write!(f, "Governance"),
            ContractKind::Treasury => write!(f, "Treasury"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnsavedContractWatch {
    pub address: String,
    pub kind: ContractKind,
    pub parent_dao_id: Option<Uuid>,
    pub start_block_number: i64,
}

impl UnsavedContractWatch {
    pub fn new(
        address: &str,
        kind: ContractKind,
        parent_dao_id: Option<Uuid>,
        start_block_number: u64,
    ) -> Self {
        Self {
            address: address.to_lowercase(),
            kind,
            parent_dao_id,
            start_block_number: start_block_number as i64,
        }
    }
}

/// Channel announcing newly-registered watches to the live listener.
pub type WatchSender = tokio::sync::mpsc::UnboundedSender<ContractWatch>;
pub type WatchReceiver = tokio::sync::mpsc::UnboundedReceiver<ContractWatch>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractWatch {
    pub id: Uuid,
    pub address: String,
    pub kind: ContractKind,
    pub parent_dao_id: Option<Uuid>,
    pub start_block_number: i64,
}

/// The set of addresses currently being indexed. Append-only during normal
/// operation: watches are registered once per address and never removed.
/// Backed by the repo so a restart resumes watching runtime-registered
/// contracts, with an in-memory copy as the hot path.
#[derive(Clone)]
pub struct ContractRegistry {
    repo: Arc<dyn Repo>,
    watches: Arc<RwLock<Vec<ContractWatch>>>,
}

impl ContractRegistry {
    pub async fn load(repo: Arc<dyn Repo>) -> Result<Self, RepoError> {
        let watches = repo.get_contract_watches().await?;

        Ok(Self {
            repo,
            watches: Arc::new(RwLock::new(watches)),
        })
    }

    /// Idempotent add. Returns the new watch, or `None` when the address is
    /// already watched so callers can skip re-announcing it.
    pub async fn watch(
        &self,
        unsaved: UnsavedContractWatch,
    ) -> Result<Option<ContractWatch>, RepoError> {
        {
            let watches = self.watches.read().await;
            if watches.iter().any(|w| w.address == unsaved.address) {
                return Ok(None);
            }
        }

        let watch = self.repo.create_contract_watch(&unsaved).await?;

        let mut watches = self.watches.write().await;
        if watches.iter().any(|w| w.address == watch.address) {
            return Ok(None);
        }
        watches.push(watch.clone());

        Ok(Some(watch))
    }

    pub async fn list(&self) -> Vec<ContractWatch> {
        self.watches.read().await.clone()
    }

    pub async fn list_by_kind(&self, kind: ContractKind) -> Vec<ContractWatch> {
        self.watches.read().await.iter().filter(|w| w.kind == kind).cloned().collect()
    }

    pub async fn find_by_address(&self, address: &str) -> Option<ContractWatch> {
        let address = address.to_lowercase();

        self.watches.read().await.iter().find(|w| w.address == address).cloned()
    }
}
