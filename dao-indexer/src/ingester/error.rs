use derive_more::Display;

use crate::chain_reader::ProviderError;
use crate::checkpoint::CheckpointError;
use crate::dispatcher::ClosedError;
use crate::repos::RepoError;

#[derive(Debug, Display)]
pub enum IngesterError {
    #[display("{_0}")]
    Provider(ProviderError),
    #[display("{_0}")]
    Repo(RepoError),
    #[display("{_0}")]
    Checkpoint(CheckpointError),
    #[display("{_0}")]
    SinkClosed(ClosedError),
}

impl From<ProviderError> for IngesterError {
    fn from(value: ProviderError) -> Self {
        IngesterError::Provider(value)
    }
}

impl From<RepoError> for IngesterError {
    fn from(value: RepoError) -> Self {
        IngesterError::Repo(value)
    }
}

impl From<CheckpointError> for IngesterError {
    fn from(value: CheckpointError) -> Self {
        IngesterError::Checkpoint(value)
    }
}

impl From<ClosedError> for IngesterError {
    fn from(value: ClosedError) -> Self {
        IngesterError::SinkClosed(value)
    }
}
