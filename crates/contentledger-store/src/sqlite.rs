//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for the Content Ledger. It uses
//! rusqlite with bundled SQLite, wrapped in async via tokio::spawn_blocking.
//!
//! SQLite integers are signed 64-bit. Every `u64` (ids, prices, amounts,
//! timestamps) is stored by reinterpreting its bits as `i64`, so the full
//! range round-trips. Ordering in SQL is only meaningful below `2^63`, which
//! holds for sequential content ids.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use contentledger_access::{AccessGrant, GrantKind};
use contentledger_core::{
    ContentEntry, ContentId, Principal, RevenueRecord, RoyaltyPercentage, Timestamp,
};

use crate::batch::{WriteBatch, WriteOp};
use crate::error::{Result, StoreError};
use crate::migration::{self, NEXT_CONTENT_ID_KEY};
use crate::traits::Store;

const CONTENT_COLUMNS: &str =
    "id, creator, owner, title, description, content_hash, price, royalty_percentage, total_revenue";

const GRANT_COLUMNS: &str = "user, content_id, kind, expires_at, granted_at";

const KIND_PURCHASE: i64 = 0;
const KIND_SUBSCRIPTION: i64 = 1;

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::LockPoisoned(format!("connection mutex: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Integer conversions
// ─────────────────────────────────────────────────────────────────────────────

/// Store a `u64` in an INTEGER column, bit for bit.
fn to_sql(value: u64) -> i64 {
    value as i64
}

/// Inverse of [`to_sql`].
fn from_sql(value: i64) -> u64 {
    value as u64
}

fn column_u64(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    row.get::<_, i64>(idx).map(from_sql)
}

fn column_principal(row: &Row<'_>, idx: usize) -> rusqlite::Result<Principal> {
    let value: String = row.get(idx)?;
    Principal::new(value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

// Helper to convert a row to ContentEntry
fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<ContentEntry> {
    let royalty = RoyaltyPercentage::new(column_u64(row, 7)?)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Integer, Box::new(e)))?;

    Ok(ContentEntry {
        id: ContentId(column_u64(row, 0)?),
        creator: column_principal(row, 1)?,
        owner: column_principal(row, 2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        content_hash: row.get(5)?,
        price: column_u64(row, 6)?,
        royalty_percentage: royalty,
        total_revenue: column_u64(row, 8)?,
    })
}

// Helper to convert a row to AccessGrant
fn row_to_grant(row: &Row<'_>) -> rusqlite::Result<AccessGrant> {
    let kind: i64 = row.get(2)?;
    let expires_at: Option<i64> = row.get(3)?;

    let kind = match (kind, expires_at) {
        (KIND_PURCHASE, None) => GrantKind::Purchase,
        (KIND_SUBSCRIPTION, Some(_)) => GrantKind::Subscription {
            expires_at: Timestamp(column_u64(row, 3)?),
        },
        _ => return Err(rusqlite::Error::InvalidColumnType(2, "kind".into(), Type::Integer)),
    };

    Ok(AccessGrant {
        user: column_principal(row, 0)?,
        content_id: ContentId(column_u64(row, 1)?),
        kind,
        granted_at: Timestamp(column_u64(row, 4)?),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Write application
// ─────────────────────────────────────────────────────────────────────────────

fn read_next_id(conn: &Connection) -> Result<ContentId> {
    let value: i64 = conn.query_row(
        "SELECT value FROM ledger_meta WHERE key = ?1",
        params![NEXT_CONTENT_ID_KEY],
        |row| row.get(0),
    )?;
    Ok(ContentId(from_sql(value)))
}

fn read_total_revenue(conn: &Connection, id: ContentId) -> Result<u64> {
    conn.query_row(
        "SELECT total_revenue FROM contents WHERE id = ?1",
        params![to_sql(id.get())],
        |row| column_u64(row, 0),
    )
    .optional()?
    .ok_or(StoreError::ContentNotFound(id))
}

fn apply_op(conn: &Connection, op: WriteOp) -> Result<()> {
    match op {
        WriteOp::InsertContent(entry) => {
            let expected = read_next_id(conn)?;
            if entry.id != expected {
                return Err(StoreError::IdConflict {
                    expected,
                    got: entry.id,
                });
            }
            if entry.total_revenue != 0 {
                return Err(StoreError::InvalidData(format!(
                    "new content {} carries revenue",
                    entry.id
                )));
            }
            let next = entry
                .id
                .next()
                .ok_or_else(|| StoreError::Overflow("content id counter".into()))?;

            conn.execute(
                &format!(
                    "INSERT INTO contents ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    CONTENT_COLUMNS
                ),
                params![
                    to_sql(entry.id.get()),
                    entry.creator.as_str(),
                    entry.owner.as_str(),
                    entry.title,
                    entry.description,
                    entry.content_hash,
                    to_sql(entry.price),
                    entry.royalty_percentage.get() as i64,
                    0i64,
                ],
            )?;
            conn.execute(
                "UPDATE ledger_meta SET value = ?1 WHERE key = ?2",
                params![to_sql(next.get()), NEXT_CONTENT_ID_KEY],
            )?;
        }

        WriteOp::UpdateMetadata {
            content_id,
            metadata,
        } => {
            let changed = conn.execute(
                "UPDATE contents
                 SET title = ?1, description = ?2, content_hash = ?3, price = ?4,
                     royalty_percentage = ?5
                 WHERE id = ?6",
                params![
                    metadata.title,
                    metadata.description,
                    metadata.content_hash,
                    to_sql(metadata.price),
                    metadata.royalty_percentage.get() as i64,
                    to_sql(content_id.get()),
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::ContentNotFound(content_id));
            }
        }

        WriteOp::TransferOwner {
            content_id,
            new_owner,
        } => {
            let changed = conn.execute(
                "UPDATE contents SET owner = ?1 WHERE id = ?2",
                params![new_owner.as_str(), to_sql(content_id.get())],
            )?;
            if changed == 0 {
                return Err(StoreError::ContentNotFound(content_id));
            }
        }

        WriteOp::PutGrant(grant) => {
            // Existence check doubles as the foreign key guard.
            read_total_revenue(conn, grant.content_id)?;

            let (kind, expires_at) = match grant.kind {
                GrantKind::Purchase => (KIND_PURCHASE, None),
                GrantKind::Subscription { expires_at } => (
                    KIND_SUBSCRIPTION,
                    Some(to_sql(expires_at.get())),
                ),
            };

            conn.execute(
                &format!(
                    "INSERT INTO access_grants ({}) VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(user, content_id) DO UPDATE SET
                        kind = excluded.kind,
                        expires_at = excluded.expires_at,
                        granted_at = excluded.granted_at",
                    GRANT_COLUMNS
                ),
                params![
                    grant.user.as_str(),
                    to_sql(grant.content_id.get()),
                    kind,
                    expires_at,
                    to_sql(grant.granted_at.get()),
                ],
            )?;
        }

        WriteOp::AddRevenue { content_id, amount } => {
            let current = read_total_revenue(conn, content_id)?;
            let total = current
                .checked_add(amount)
                .ok_or_else(|| {
                    StoreError::Overflow(format!("total revenue of content {}", content_id))
                })?;
            let id = to_sql(content_id.get());

            conn.execute(
                "UPDATE contents SET total_revenue = ?1 WHERE id = ?2",
                params![to_sql(total), id],
            )?;
            conn.execute(
                "INSERT INTO revenue (content_id, total_revenue) VALUES (?1, ?2)
                 ON CONFLICT(content_id) DO UPDATE SET total_revenue = excluded.total_revenue",
                params![id, to_sql(total)],
            )?;
        }

        WriteOp::Credit { principal, amount } => {
            let current: u64 = conn
                .query_row(
                    "SELECT amount FROM earnings WHERE principal = ?1",
                    params![principal.as_str()],
                    |row| column_u64(row, 0),
                )
                .optional()?
                .unwrap_or(0);
            let balance = current
                .checked_add(amount)
                .ok_or_else(|| StoreError::Overflow(format!("earnings of {}", principal)))?;

            conn.execute(
                "INSERT INTO earnings (principal, amount) VALUES (?1, ?2)
                 ON CONFLICT(principal) DO UPDATE SET amount = excluded.amount",
                params![principal.as_str(), to_sql(balance)],
            )?;
        }
    }

    Ok(())
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_content(&self, id: ContentId) -> Result<Option<ContentEntry>> {
        self.blocking(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM contents WHERE id = ?1", CONTENT_COLUMNS),
                params![to_sql(id.get())],
                row_to_entry,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn next_content_id(&self) -> Result<ContentId> {
        self.blocking(|conn| read_next_id(conn)).await
    }

    async fn list_contents(&self, creator: Option<&Principal>) -> Result<Vec<ContentEntry>> {
        let creator = creator.cloned();

        self.blocking(move |conn| {
            let entries = match creator {
                Some(creator) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {} FROM contents WHERE creator = ?1 ORDER BY id",
                        CONTENT_COLUMNS
                    ))?;
                    let rows = stmt.query_map(params![creator.as_str()], row_to_entry)?;
                    rows.collect::<rusqlite::Result<Vec<_>>>()?
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {} FROM contents ORDER BY id",
                        CONTENT_COLUMNS
                    ))?;
                    let rows = stmt.query_map([], row_to_entry)?;
                    rows.collect::<rusqlite::Result<Vec<_>>>()?
                }
            };
            Ok(entries)
        })
        .await
    }

    async fn get_grant(
        &self,
        user: &Principal,
        content_id: ContentId,
    ) -> Result<Option<AccessGrant>> {
        let user = user.clone();

        self.blocking(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {} FROM access_grants WHERE user = ?1 AND content_id = ?2",
                    GRANT_COLUMNS
                ),
                params![user.as_str(), to_sql(content_id.get())],
                row_to_grant,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn grants_for(&self, user: &Principal) -> Result<Vec<AccessGrant>> {
        let user = user.clone();

        self.blocking(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM access_grants WHERE user = ?1 ORDER BY content_id",
                GRANT_COLUMNS
            ))?;
            let grants = stmt
                .query_map(params![user.as_str()], row_to_grant)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(grants)
        })
        .await
    }

    async fn get_revenue(&self, content_id: ContentId) -> Result<Option<RevenueRecord>> {
        self.blocking(move |conn| {
            conn.query_row(
                "SELECT total_revenue FROM revenue WHERE content_id = ?1",
                params![to_sql(content_id.get())],
                |row| column_u64(row, 0).map(RevenueRecord::new),
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn list_revenue(&self) -> Result<Vec<(ContentId, RevenueRecord)>> {
        self.blocking(|conn| {
            let mut stmt =
                conn.prepare("SELECT content_id, total_revenue FROM revenue ORDER BY content_id")?;
            let records = stmt
                .query_map([], |row| {
                    Ok((
                        ContentId(column_u64(row, 0)?),
                        RevenueRecord::new(column_u64(row, 1)?),
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
        .await
    }

    async fn get_earnings(&self, principal: &Principal) -> Result<u64> {
        let principal = principal.clone();

        self.blocking(move |conn| {
            let amount = conn
                .query_row(
                    "SELECT amount FROM earnings WHERE principal = ?1",
                    params![principal.as_str()],
                    |row| column_u64(row, 0),
                )
                .optional()?;
            Ok(amount.unwrap_or(0))
        })
        .await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            for op in batch.into_ops() {
                apply_op(&tx, op)?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentledger_core::ContentMetadata;
    use tempfile::tempdir;

    fn principal(name: &str) -> Principal {
        Principal::new(name).unwrap()
    }

    fn entry(id: u64, creator: &str) -> ContentEntry {
        let meta = ContentMetadata::new("Title", "Desc", "QmHash", 100, 10).unwrap();
        ContentEntry::new(ContentId(id), principal(creator), meta)
    }

    #[tokio::test]
    async fn test_insert_and_get_content() {
        let store = SqliteStore::open_memory().unwrap();
        assert_eq!(store.next_content_id().await.unwrap(), ContentId(0));

        let mut batch = WriteBatch::new();
        batch.insert_content(entry(0, "alice"));
        store.commit(batch).await.unwrap();

        let fetched = store.get_content(ContentId(0)).await.unwrap().unwrap();
        assert_eq!(fetched, entry(0, "alice"));
        assert_eq!(store.next_content_id().await.unwrap(), ContentId(1));
        assert!(store.get_content(ContentId(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_id_conflict() {
        let store = SqliteStore::open_memory().unwrap();

        let mut batch = WriteBatch::new();
        batch.insert_content(entry(1, "alice"));

        assert!(matches!(
            store.commit(batch).await,
            Err(StoreError::IdConflict { .. })
        ));
        assert_eq!(store.next_content_id().await.unwrap(), ContentId(0));
    }

    #[tokio::test]
    async fn test_update_and_transfer() {
        let store = SqliteStore::open_memory().unwrap();
        let mut batch = WriteBatch::new();
        batch.insert_content(entry(0, "alice"));
        store.commit(batch).await.unwrap();

        let meta = ContentMetadata::new("New", "Changed", "QmOther", 250, 42).unwrap();
        let mut batch = WriteBatch::new();
        batch
            .update_metadata(ContentId(0), meta.clone())
            .transfer_owner(ContentId(0), principal("bob"));
        store.commit(batch).await.unwrap();

        let fetched = store.get_content(ContentId(0)).await.unwrap().unwrap();
        assert_eq!(fetched.metadata(), meta);
        assert_eq!(fetched.owner, principal("bob"));
        assert_eq!(fetched.creator, principal("alice"));
    }

    #[tokio::test]
    async fn test_transaction_rolls_back() {
        let store = SqliteStore::open_memory().unwrap();
        let mut batch = WriteBatch::new();
        batch.insert_content(entry(0, "alice"));
        store.commit(batch).await.unwrap();

        let mut batch = WriteBatch::new();
        batch
            .add_revenue(ContentId(0), 100)
            .credit(principal("alice"), 100)
            .add_revenue(ContentId(3), 1);
        assert!(matches!(
            store.commit(batch).await,
            Err(StoreError::ContentNotFound(ContentId(3)))
        ));

        let fetched = store.get_content(ContentId(0)).await.unwrap().unwrap();
        assert_eq!(fetched.total_revenue, 0);
        assert!(store.list_revenue().await.unwrap().is_empty());
        assert_eq!(store.get_earnings(&principal("alice")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_revenue_and_earnings() {
        let store = SqliteStore::open_memory().unwrap();
        let mut batch = WriteBatch::new();
        batch
            .insert_content(entry(0, "alice"))
            .add_revenue(ContentId(0), 100)
            .credit(principal("alice"), 10)
            .credit(principal("alice"), 90);
        store.commit(batch).await.unwrap();

        assert_eq!(
            store.get_revenue(ContentId(0)).await.unwrap(),
            Some(RevenueRecord::new(100))
        );
        assert_eq!(
            store.list_revenue().await.unwrap(),
            vec![(ContentId(0), RevenueRecord::new(100))]
        );
        assert_eq!(store.get_earnings(&principal("alice")).await.unwrap(), 100);
        assert_eq!(store.get_earnings(&principal("nobody")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_full_u64_range_round_trips() {
        let store = SqliteStore::open_memory().unwrap();
        let meta = ContentMetadata::new("Title", "Desc", "QmHash", u64::MAX, 10).unwrap();
        let mut batch = WriteBatch::new();
        batch
            .insert_content(ContentEntry::new(ContentId(0), principal("alice"), meta))
            .add_revenue(ContentId(0), i64::MAX as u64)
            .add_revenue(ContentId(0), 1)
            .credit(principal("alice"), u64::MAX)
            .put_grant(AccessGrant::subscription(
                principal("reader"),
                ContentId(0),
                Timestamp(u64::MAX),
                Timestamp(1 << 63),
            ));
        store.commit(batch).await.unwrap();

        let fetched = store.get_content(ContentId(0)).await.unwrap().unwrap();
        assert_eq!(fetched.price, u64::MAX);
        assert_eq!(fetched.total_revenue, 1 << 63);
        assert_eq!(
            store.get_revenue(ContentId(0)).await.unwrap(),
            Some(RevenueRecord::new(1 << 63))
        );
        assert_eq!(store.get_earnings(&principal("alice")).await.unwrap(), u64::MAX);

        let grant = store
            .get_grant(&principal("reader"), ContentId(0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(grant.kind, GrantKind::Subscription { expires_at: Timestamp(u64::MAX) });
        assert_eq!(grant.granted_at, Timestamp(1 << 63));
    }

    #[tokio::test]
    async fn test_u64_overflow_rejected() {
        let store = SqliteStore::open_memory().unwrap();
        let mut batch = WriteBatch::new();
        batch
            .insert_content(entry(0, "alice"))
            .add_revenue(ContentId(0), u64::MAX)
            .credit(principal("alice"), u64::MAX);
        store.commit(batch).await.unwrap();

        let mut batch = WriteBatch::new();
        batch.add_revenue(ContentId(0), 1);
        assert!(matches!(
            store.commit(batch).await,
            Err(StoreError::Overflow(_))
        ));

        let mut batch = WriteBatch::new();
        batch.credit(principal("alice"), 1);
        assert!(matches!(
            store.commit(batch).await,
            Err(StoreError::Overflow(_))
        ));
        assert_eq!(
            store.get_revenue(ContentId(0)).await.unwrap(),
            Some(RevenueRecord::new(u64::MAX))
        );
    }


    #[tokio::test]
    async fn test_grants_round_trip() {
        let store = SqliteStore::open_memory().unwrap();
        let reader = principal("reader");

        let mut batch = WriteBatch::new();
        batch
            .insert_content(entry(0, "alice"))
            .insert_content(entry(1, "alice"))
            .put_grant(AccessGrant::subscription(
                reader.clone(),
                ContentId(1),
                Timestamp(500),
                Timestamp(10),
            ))
            .put_grant(AccessGrant::purchase(reader.clone(), ContentId(0), Timestamp(20)));
        store.commit(batch).await.unwrap();

        let sub = store.get_grant(&reader, ContentId(1)).await.unwrap().unwrap();
        assert_eq!(sub.kind, GrantKind::Subscription { expires_at: Timestamp(500) });
        assert_eq!(sub.granted_at, Timestamp(10));

        // Upgrade replaces the row
        let mut batch = WriteBatch::new();
        batch.put_grant(sub.into_purchase());
        store.commit(batch).await.unwrap();

        let grants = store.grants_for(&reader).await.unwrap();
        assert_eq!(grants.len(), 2);
        assert!(grants.iter().all(|g| g.is_purchase()));
        assert_eq!(grants[0].content_id, ContentId(0));
    }

    #[tokio::test]
    async fn test_list_contents_by_creator() {
        let store = SqliteStore::open_memory().unwrap();
        let mut batch = WriteBatch::new();
        batch
            .insert_content(entry(0, "alice"))
            .insert_content(entry(1, "bob"))
            .insert_content(entry(2, "alice"));
        store.commit(batch).await.unwrap();

        let ids: Vec<_> = store
            .list_contents(Some(&principal("alice")))
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![ContentId(0), ContentId(2)]);
        assert_eq!(store.list_contents(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            let mut batch = WriteBatch::new();
            batch
                .insert_content(entry(0, "alice"))
                .add_revenue(ContentId(0), 5);
            store.commit(batch).await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.next_content_id().await.unwrap(), ContentId(1));
        assert_eq!(
            store.get_revenue(ContentId(0)).await.unwrap(),
            Some(RevenueRecord::new(5))
        );
    }
}
