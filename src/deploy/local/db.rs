use std::str::FromStr;

use sqlx::{Connection as _, sqlite::SqliteConnection};
use tracing::{debug, warn};

use crate::{query, record::IngestionRecord};

/// A SQLite database holding the two source tables, for local runs and tests.
pub struct LocalDatabase {
    conn: SqliteConnection,
}

impl LocalDatabase {
    pub async fn open(url: &str) -> Result<Self, sqlx::Error> {
        let options = sqlx::sqlite::SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let conn = SqliteConnection::connect_with(&options).await?;
        debug!(%url, "opened local database");
        Ok(Self { conn })
    }

    pub fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }
}

impl query::Client for LocalDatabase {
    async fn fetch_records(
        &mut self,
        statement: &str,
    ) -> Result<Vec<IngestionRecord>, sqlx::Error> {
        sqlx::query_as::<_, IngestionRecord>(statement)
            .fetch_all(&mut self.conn)
            .await
    }

    async fn close(self) {
        if let Err(error) = self.conn.close().await {
            warn!(%error, "failed to close local database");
        }
    }
}
