use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    presigning::PresigningConfig,
};
use tracing::{debug, info};

use crate::{
    config::StorageConfig,
    sign::{self, InitError},
};

/// Presigns `GetObject` requests against an S3-compatible store.
pub struct S3Signer {
    config: StorageConfig,
}

pub struct Client {
    client: aws_sdk_s3::Client,
    bucket: String,
    presigning: PresigningConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to presign object: {0}")]
    Presign(String),
}

impl S3Signer {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    fn credentials(&self) -> Result<Option<Credentials>, InitError> {
        match (&self.config.access_key_id, &self.config.secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => Ok(Some(Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                "static",
            ))),
            (Some(_), None) => Err(InitError::IncompleteCredentials("access key id")),
            (None, Some(_)) => Err(InitError::IncompleteCredentials("secret access key")),
            (None, None) => Ok(None),
        }
    }

    fn presigning(&self) -> Result<PresigningConfig, InitError> {
        let expiry = self.config.expiry();
        if expiry.is_zero() {
            return Err(InitError::InvalidExpiry("expiry must be positive".to_owned()));
        }
        PresigningConfig::expires_in(expiry)
            .map_err(|error| InitError::InvalidExpiry(error.to_string()))
    }
}

impl sign::Signer for S3Signer {
    type Client = Client;
    type Error = Error;

    async fn init_client(&self) -> Result<Self::Client, InitError> {
        if self.config.bucket.trim().is_empty() {
            return Err(InitError::MissingBucket);
        }
        let presigning = self.presigning()?;
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.config.region.clone()));
        if let Some(endpoint) = &self.config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        if let Some(credentials) = self.credentials()? {
            loader = loader.credentials_provider(credentials);
        }
        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(self.config.force_path_style)
            .build();
        info!(
            bucket = %self.config.bucket,
            endpoint = ?self.config.endpoint,
            expiry_secs = self.config.expiry_secs,
            "initialized signing client"
        );
        Ok(Client {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: self.config.bucket.clone(),
            presigning,
        })
    }

    async fn sign(
        &self,
        client: &Self::Client,
        object_path: &str,
    ) -> Result<Option<String>, Self::Error> {
        let request = client
            .client
            .get_object()
            .bucket(&client.bucket)
            .key(object_path)
            .presigned(client.presigning.clone())
            .await
            .map_err(|error| Error::Presign(error.to_string()))?;
        debug!(object_path, "presigned object");
        Ok(Some(request.uri().to_owned()))
    }
}
