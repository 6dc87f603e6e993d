use maskdump_core::{Result, SchemaSnapshot, validate_snapshot};

use crate::adapter::Adapter;
use crate::options::IntrospectOptions;

/// Snapshot cache scoped to one plan resolution.
///
/// The first [`SnapshotLoader::load`] performs the single introspection pass;
/// later calls return the cached snapshot without touching the database.
pub struct SnapshotLoader<'a, A: Adapter + ?Sized> {
    adapter: &'a A,
    options: IntrospectOptions,
    snapshot: Option<SchemaSnapshot>,
}

impl<'a, A: Adapter + ?Sized> SnapshotLoader<'a, A> {
    pub fn new(adapter: &'a A, options: IntrospectOptions) -> Self {
        Self {
            adapter,
            options,
            snapshot: None,
        }
    }

    pub async fn load(&mut self) -> Result<&SchemaSnapshot> {
        let snapshot = match self.snapshot.take() {
            Some(snapshot) => snapshot,
            None => {
                let snapshot = self.adapter.list_tables(&self.options).await?;
                validate_snapshot(&snapshot)?;
                tracing::info!(
                    event = "snapshot_loaded",
                    engine = %snapshot.engine,
                    tables = snapshot.tables.len()
                );
                snapshot
            }
        };
        let snapshot: &SchemaSnapshot = self.snapshot.insert(snapshot);
        Ok(snapshot)
    }

    /// Snapshot loaded so far, if any.
    pub fn cached(&self) -> Option<&SchemaSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn adapter(&self) -> &'a A {
        self.adapter
    }
}

#[cfg(test)]
mod tests {
    use maskdump_core::{ColumnDescriptor, Error, TableDescriptor};

    use super::*;
    use crate::memory::InMemoryDatabase;

    fn users() -> TableDescriptor {
        TableDescriptor::new("users", vec![ColumnDescriptor::new(1, "id", "integer", false)])
    }

    #[tokio::test]
    async fn loads_snapshot_once() {
        let db = InMemoryDatabase::new("app").with_table(users(), Vec::new());
        let mut loader = SnapshotLoader::new(&db, IntrospectOptions::default());

        assert!(loader.cached().is_none());
        let first = loader.load().await.unwrap().clone();
        let second = loader.load().await.unwrap().clone();

        assert_eq!(first, second);
        assert_eq!(db.introspection_count(), 1);
    }

    #[tokio::test]
    async fn rejects_invalid_snapshot() {
        let db = InMemoryDatabase::new("app")
            .with_table(users(), Vec::new())
            .with_table(users(), Vec::new());
        let mut loader = SnapshotLoader::new(&db, IntrospectOptions::default());

        let err = loader.load().await.unwrap_err();
        assert!(matches!(err, Error::InvalidSchema(_)));
        assert!(loader.cached().is_none());
    }
}
