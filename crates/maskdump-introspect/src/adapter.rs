use async_trait::async_trait;

use maskdump_core::{Result, Row, SchemaSnapshot, TableDescriptor};

use crate::options::IntrospectOptions;

/// Callback receiving rows one at a time while a table is streamed.
pub type RowVisitor<'a> = dyn FnMut(Row) -> Result<()> + Send + 'a;

/// Trait implemented by database adapters that can introspect schemas.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Returns the backend identifier (e.g. `pgsql`).
    fn engine(&self) -> &'static str;

    /// Read the table catalog. Tables come back in a stable order.
    async fn list_tables(&self, opts: &IntrospectOptions) -> Result<SchemaSnapshot>;
}

/// Trait implemented by adapters that can stream table rows.
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Stream every row of `table` in storage order into `visit`.
    ///
    /// Rows are aligned with `table.columns`. The stream is not restartable;
    /// call again to re-read. Returns the number of rows visited. An error
    /// returned by `visit` stops the stream and is propagated unchanged.
    async fn for_each_row(&self, table: &TableDescriptor, visit: &mut RowVisitor<'_>)
    -> Result<u64>;
}
