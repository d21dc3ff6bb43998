//! Signed URL capability
//!
//! The enricher only depends on [`Signer`]; the concrete provider lives in
//! [`crate::deploy::s3`].

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("bucket name is empty")]
    MissingBucket,
    #[error("incomplete static credentials: {0} is set without its counterpart")]
    IncompleteCredentials(&'static str),
    #[error("invalid URL expiry: {0}")]
    InvalidExpiry(String),
}

/// Provider of time-limited access URLs for private blob-storage objects.
pub trait Signer {
    type Client;
    type Error: std::fmt::Display;

    /// Build a client. Failure is fatal for the whole enrichment step.
    fn init_client(&self) -> impl Future<Output = Result<Self::Client, InitError>>;

    /// Sign `object_path`. `Ok(None)` means the provider produced no URL.
    fn sign(
        &self,
        client: &Self::Client,
        object_path: &str,
    ) -> impl Future<Output = Result<Option<String>, Self::Error>>;
}

/// `<prefix>/<ingestion_id>/<media_key>`
pub fn object_path(prefix: &str, ingestion_id: &str, media_key: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        format!("{ingestion_id}/{media_key}")
    } else {
        format!("{prefix}/{ingestion_id}/{media_key}")
    }
}
