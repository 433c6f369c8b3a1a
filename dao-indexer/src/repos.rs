mod repo;

pub use repo::{Repo, RepoError};

#[cfg(feature = "postgres")]
mod postgres_repo;

#[cfg(feature = "postgres")]
pub use postgres_repo::{PostgresRepo, PostgresRepoClient, SQLikeMigrations};
