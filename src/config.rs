//! Run configuration
//!
//! Every setting can be given as a flag or through its environment variable.
//! Secrets are hidden from `--help` output and from `Debug`.

use std::{path::PathBuf, time::Duration};

use clap::Args;

use crate::{enrich::EnrichOptions, sql::Tables};

#[derive(Args, Clone)]
pub struct DatabaseConfig {
    #[clap(long = "db-host", env = "INGESTION_DB_HOST")]
    pub host: String,
    #[clap(long = "db-port", env = "INGESTION_DB_PORT", default_value_t = 3306)]
    pub port: u16,
    #[clap(
        long = "db-name",
        env = "INGESTION_DB_NAME",
        default_value = "image_ingestion"
    )]
    pub database: String,
    #[clap(long = "db-user", env = "INGESTION_DB_USER")]
    pub user: String,
    #[clap(long = "db-password", env = "INGESTION_DB_PASSWORD", hide_env_values = true)]
    pub password: String,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Args, Debug, Clone)]
pub struct TableConfig {
    /// Schema qualifier prepended to both table names.
    #[clap(long = "table-schema", env = "INGESTION_TABLE_SCHEMA")]
    pub schema: Option<String>,
    #[clap(
        long = "images-table",
        env = "INGESTION_IMAGES_TABLE",
        default_value = "alle_images_v2"
    )]
    pub images: String,
    #[clap(
        long = "attributes-table",
        env = "INGESTION_ATTRIBUTES_TABLE",
        default_value = "alle_image_attributes_v2"
    )]
    pub attributes: String,
}

impl From<TableConfig> for Tables {
    fn from(config: TableConfig) -> Self {
        Tables {
            schema: config.schema,
            images: config.images,
            attributes: config.attributes,
        }
    }
}

#[derive(Args, Clone)]
pub struct StorageConfig {
    #[clap(long, env = "INGESTION_BUCKET")]
    pub bucket: String,
    /// Endpoint of an S3-compatible store, e.g. `https://storage.googleapis.com`.
    #[clap(long = "storage-endpoint", env = "INGESTION_STORAGE_ENDPOINT")]
    pub endpoint: Option<String>,
    #[clap(
        long = "storage-region",
        env = "INGESTION_STORAGE_REGION",
        default_value = "auto"
    )]
    pub region: String,
    #[clap(long = "storage-access-key-id", env = "INGESTION_STORAGE_ACCESS_KEY_ID")]
    pub access_key_id: Option<String>,
    #[clap(
        long = "storage-secret-access-key",
        env = "INGESTION_STORAGE_SECRET_ACCESS_KEY",
        hide_env_values = true
    )]
    pub secret_access_key: Option<String>,
    #[clap(long = "storage-path-style", env = "INGESTION_STORAGE_PATH_STYLE")]
    pub force_path_style: bool,
    /// Lifetime of each signed URL, in seconds.
    #[clap(
        long = "url-expiry-secs",
        env = "INGESTION_URL_EXPIRY_SECS",
        default_value_t = 3600
    )]
    pub expiry_secs: u64,
}

impl StorageConfig {
    pub fn expiry(&self) -> Duration {
        Duration::from_secs(self.expiry_secs)
    }
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("force_path_style", &self.force_path_style)
            .field("expiry_secs", &self.expiry_secs)
            .finish()
    }
}

#[derive(Args, Debug, Clone)]
pub struct EnrichConfig {
    /// First path segment of every image object.
    #[clap(
        long = "object-prefix",
        env = "INGESTION_OBJECT_PREFIX",
        default_value = "originals"
    )]
    pub object_prefix: String,
    /// Number of signing requests in flight. `1` signs strictly one at a time.
    #[clap(
        long = "sign-concurrency",
        env = "INGESTION_SIGN_CONCURRENCY",
        default_value_t = 1,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub concurrency: u16,
}

impl From<EnrichConfig> for EnrichOptions {
    fn from(config: EnrichConfig) -> Self {
        EnrichOptions {
            object_prefix: config.object_prefix,
            concurrency: usize::from(config.concurrency),
            ..Default::default()
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ReportConfig {
    #[clap(flatten)]
    pub database: DatabaseConfig,
    #[clap(flatten)]
    pub tables: TableConfig,
    #[clap(flatten)]
    pub storage: StorageConfig,
    #[clap(flatten)]
    pub enrich: EnrichConfig,
    /// Output CSV path. Defaults to a timestamped name in the working directory.
    #[clap(short, long, env = "INGESTION_REPORT_OUTPUT")]
    pub output: Option<PathBuf>,
}
