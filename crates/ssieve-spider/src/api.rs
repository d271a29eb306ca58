/// Spider API calls are made up the following components:
/// 1. HTTP
///     a) client
///     b) request
///     c) deserializer
///     d) transformation into typed rows
///
/// 2. PostgreSQL
///     a) existence check
///     b) insert rows, as one transaction
use crate::http::PgClient;
use futures::{stream, StreamExt};
use tokio_postgres::types::ToSql;
use tracing::{debug, trace};

/// A typed record that can be written as one row of a fixed table.
///
/// The parameter order must match the placeholders of the INSERT statement the rows are
/// written with (see [`crate::stock::sql`]).
pub trait Row {
    fn params(&self) -> Vec<&(dyn ToSql + Sync)>;
}

/// Insert `rows` with the prepared `statement`, inside a single transaction.
///
/// Returns the number of rows actually written; statements with `ON CONFLICT DO NOTHING`
/// count skipped rows as zero.
pub async fn insert_rows<R: Row>(
    pg_client: &mut PgClient,
    statement: &str,
    rows: &[R],
) -> crate::Result<u64> {
    let time = std::time::Instant::now();

    // preprocess pg query as transaction
    let query = pg_client.prepare(statement).await?;
    let transaction = pg_client.transaction().await?;

    // iterate over the rows and execute them against the transaction
    let mut inserted = 0;
    let mut stream = stream::iter(rows);
    while let Some(row) = stream.next().await {
        inserted += transaction.execute(&query, &row.params()).await?;
    }

    transaction.commit().await?;
    trace!("committed {inserted} of {} rows", rows.len());
    debug!("rows inserted. {}", crate::time_elapsed(time));

    Ok(inserted)
}
