use sqlx::{
    Connection as _,
    mysql::{MySqlConnectOptions, MySqlConnection},
};
use tracing::{info, warn};

use crate::{config::DatabaseConfig, query, record::IngestionRecord};

pub struct Database {
    conn: MySqlConnection,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.user)
            .password(&config.password);
        let conn = MySqlConnection::connect_with(&options).await?;
        info!(
            host = %config.host,
            database = %config.database,
            "connected to database"
        );
        Ok(Self { conn })
    }
}

impl query::Client for Database {
    async fn fetch_records(
        &mut self,
        statement: &str,
    ) -> Result<Vec<IngestionRecord>, sqlx::Error> {
        sqlx::query_as::<_, IngestionRecord>(statement)
            .fetch_all(&mut self.conn)
            .await
    }

    async fn close(self) {
        match self.conn.close().await {
            Ok(()) => info!("database connection closed"),
            Err(error) => warn!(%error, "failed to close database connection"),
        }
    }
}
