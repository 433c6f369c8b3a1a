use std::sync::Arc;

use derive_more::Display;

use crate::repos::{Repo, RepoError};

#[derive(Debug, Display)]
pub enum CheckpointError {
    #[display("checkpoint regression attempted: {committed} -> {attempted}")]
    Regression { committed: u64, attempted: u64 },
    #[display("{_0}")]
    Repo(RepoError),
}

impl From<RepoError> for CheckpointError {
    fn from(value: RepoError) -> Self {
        CheckpointError::Repo(value)
    }
}

/// The highest block height fully and durably processed. Written only by
/// the components that own block-range completion (backfill and the poll
/// loop); the live listener never touches it.
#[derive(Clone)]
pub struct CheckpointStore {
    repo: Arc<dyn Repo>,
}

impl CheckpointStore {
    pub fn new(repo: Arc<dyn Repo>) -> Self {
        Self { repo }
    }

    pub async fn get(&self) -> Result<Option<u64>, CheckpointError> {
        Ok(self.repo.get_checkpoint().await?)
    }

    /// Monotonic commit. A regression is a logic bug in the caller, not a
    /// recoverable condition: the stored value is left alone and the error
    /// reported.
    pub async fn commit(&self, block_number: u64) -> Result<(), CheckpointError> {
        if let Some(committed) = self.get().await? {
            if block_number < committed {
                return Err(CheckpointError::Regression {
                    committed,
                    attempted: block_number,
                });
            }
        }

        Ok(self.repo.commit_checkpoint(block_number).await?)
    }
}
