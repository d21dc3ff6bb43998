use crate::record::IngestionRecord;

/// A single open database connection able to run the report query.
pub trait Client {
    fn fetch_records(
        &mut self,
        statement: &str,
    ) -> impl Future<Output = Result<Vec<IngestionRecord>, sqlx::Error>>;

    /// Release the connection. Errors while closing are logged, not returned.
    fn close(self) -> impl Future<Output = ()>;
}
