pub mod config;
pub mod deploy;
pub mod eligibility;
pub mod enrich;
pub mod export;
pub mod pipeline;
pub mod query;
pub mod record;
pub mod sign;
pub mod sql;
pub mod viewer;

#[cfg(test)]
mod tests;

/// Fatal errors of a report run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(sql::InvalidIdentifier),
    #[error("failed to connect to database: {0}")]
    Connect(sqlx::Error),
    #[error("failed to execute report query: {0}")]
    Query(sqlx::Error),
    #[error("failed to initialize signing client: {0}")]
    SignerInit(sign::InitError),
    #[error("failed to export report: {0}")]
    Export(export::Error),
}
