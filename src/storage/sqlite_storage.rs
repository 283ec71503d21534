use crate::{
    domain::{
        ordering::next_sort_order, sort_items, BacklogItem, Category, ItemFilter, ItemId,
        NewBacklogItem, OwnerId, SortAssignment,
    },
    error::{BacklogError, Result},
    storage::Storage,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::{path::Path, str::FromStr, time::Duration};
use tracing::debug;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS backlog_items (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT,
        category TEXT NOT NULL,
        priority TEXT NOT NULL,
        tentative_start_date TEXT NOT NULL,
        estimated_hours INTEGER,
        sort_order INTEGER,
        completed_at TEXT,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_backlog_partition
        ON backlog_items(user_id, category, completed_at);
";

const COLUMNS: &str = "id, user_id, title, description, category, priority, \
     tentative_start_date, estimated_hours, sort_order, completed_at, created_at";

// Stays well below SQLite's bound-parameter limit
const ID_CHUNK: usize = 500;

/// SQLite-based storage backend for backlog items
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

/// Column values as stored, before domain parsing
struct StoredRow {
    id: String,
    user_id: String,
    title: String,
    description: Option<String>,
    category: String,
    priority: String,
    tentative_start_date: String,
    estimated_hours: Option<u32>,
    sort_order: Option<i64>,
    completed_at: Option<String>,
    created_at: String,
}

impl StoredRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            category: row.get(4)?,
            priority: row.get(5)?,
            tentative_start_date: row.get(6)?,
            estimated_hours: row.get(7)?,
            sort_order: row.get(8)?,
            completed_at: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    fn into_item(self) -> Result<BacklogItem> {
        Ok(BacklogItem {
            id: ItemId::from_str(&self.id)?,
            user_id: OwnerId::new(self.user_id)?,
            title: self.title,
            description: self.description,
            category: self.category.parse()?,
            priority: self.priority.parse()?,
            tentative_start_date: NaiveDate::parse_from_str(&self.tentative_start_date, "%Y-%m-%d")
                .map_err(|e| BacklogError::StorageError(format!("bad start date: {}", e)))?,
            estimated_hours: self.estimated_hours,
            sort_order: self.sort_order,
            completed_at: self.completed_at.as_deref().map(parse_timestamp).transpose()?,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| BacklogError::StorageError(format!("bad timestamp '{}': {}", value, e)))
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

impl SqliteStorage {
    /// Opens (or creates) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn partition_max(
        conn: &Connection,
        owner: &OwnerId,
        category: Category,
    ) -> Result<Option<i64>> {
        let max = conn.query_row(
            "SELECT MAX(sort_order) FROM backlog_items
             WHERE user_id = ?1 AND category = ?2 AND completed_at IS NULL",
            params![owner.as_str(), category.as_str()],
            |row| row.get::<_, Option<i64>>(0),
        )?;
        Ok(max)
    }

    fn insert_row(conn: &Connection, item: &BacklogItem) -> Result<()> {
        conn.execute(
            &format!(
                "INSERT INTO backlog_items ({})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                COLUMNS
            ),
            params![
                item.id.to_string(),
                item.user_id.as_str(),
                item.title,
                item.description,
                item.category.as_str(),
                item.priority.as_str(),
                format_date(item.tentative_start_date),
                item.estimated_hours,
                item.sort_order,
                item.completed_at.map(|t| t.to_rfc3339()),
                item.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn initialize(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    async fn insert_item(&self, owner: &OwnerId, data: NewBacklogItem) -> Result<BacklogItem> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let max = Self::partition_max(&tx, owner, data.category)?;
        let item = BacklogItem::new(owner.clone(), data, next_sort_order(max));
        Self::insert_row(&tx, &item)?;

        tx.commit()?;
        Ok(item)
    }

    async fn load_item(&self, owner: &OwnerId, id: &ItemId) -> Result<BacklogItem> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM backlog_items WHERE id = ?1 AND user_id = ?2",
                    COLUMNS
                ),
                params![id.to_string(), owner.as_str()],
                StoredRow::from_row,
            )
            .optional()?;

        match row {
            Some(row) => row.into_item(),
            None => Err(BacklogError::ItemNotFound(id.to_string())),
        }
    }

    async fn list_items(&self, owner: &OwnerId, filter: &ItemFilter) -> Result<Vec<BacklogItem>> {
        let mut sql = format!("SELECT {} FROM backlog_items WHERE user_id = ?", COLUMNS);
        let mut values: Vec<String> = vec![owner.as_str().to_string()];

        if let Some(category) = filter.category {
            sql.push_str(" AND category = ?");
            values.push(category.as_str().to_string());
        }
        if let Some(priority) = filter.priority {
            sql.push_str(" AND priority = ?");
            values.push(priority.as_str().to_string());
        }
        match filter.completed {
            Some(true) => sql.push_str(" AND completed_at IS NOT NULL"),
            Some(false) => sql.push_str(" AND completed_at IS NULL"),
            None => {}
        }

        let rows = {
            let conn = self.conn.lock();
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(values.iter()), StoredRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        let mut items = rows
            .into_iter()
            .map(StoredRow::into_item)
            .collect::<Result<Vec<_>>>()?;
        sort_items(&mut items);
        Ok(items)
    }

    async fn save_item(&self, owner: &OwnerId, item: &BacklogItem) -> Result<()> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE backlog_items
             SET title = ?1, description = ?2, category = ?3, priority = ?4,
                 tentative_start_date = ?5, estimated_hours = ?6, sort_order = ?7,
                 completed_at = ?8
             WHERE id = ?9 AND user_id = ?10",
            params![
                item.title,
                item.description,
                item.category.as_str(),
                item.priority.as_str(),
                format_date(item.tentative_start_date),
                item.estimated_hours,
                item.sort_order,
                item.completed_at.map(|t| t.to_rfc3339()),
                item.id.to_string(),
                owner.as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(BacklogError::ItemNotFound(item.id.to_string()));
        }
        Ok(())
    }

    async fn delete_item(&self, owner: &OwnerId, id: &ItemId) -> Result<()> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "DELETE FROM backlog_items WHERE id = ?1 AND user_id = ?2",
            params![id.to_string(), owner.as_str()],
        )?;

        if changed == 0 {
            return Err(BacklogError::ItemNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn find_reorderable(
        &self,
        owner: &OwnerId,
        category: Category,
        ids: &[ItemId],
    ) -> Result<Vec<ItemId>> {
        let conn = self.conn.lock();
        let mut found = Vec::new();

        for chunk in ids.chunks(ID_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT id FROM backlog_items
                 WHERE user_id = ? AND category = ? AND completed_at IS NULL AND id IN ({})",
                placeholders
            );

            let mut values: Vec<String> = Vec::with_capacity(chunk.len() + 2);
            values.push(owner.as_str().to_string());
            values.push(category.as_str().to_string());
            values.extend(chunk.iter().map(ItemId::to_string));

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(values.iter()), |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            for id in rows {
                found.push(ItemId::from_str(&id)?);
            }
        }

        Ok(found)
    }

    async fn max_sort_order(&self, owner: &OwnerId, category: Category) -> Result<Option<i64>> {
        let conn = self.conn.lock();
        Self::partition_max(&conn, owner, category)
    }

    async fn apply_sort_orders(
        &self,
        owner: &OwnerId,
        assignments: &[SortAssignment],
    ) -> Result<()> {
        if assignments.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "UPDATE backlog_items SET sort_order = ?1 WHERE id = ?2 AND user_id = ?3",
            )?;
            for assignment in assignments {
                stmt.execute(params![
                    assignment.sort_order,
                    assignment.id.to_string(),
                    owner.as_str()
                ])?;
            }
        }
        tx.commit()?;

        debug!(owner = %owner, updated = assignments.len(), "committed sort orders");
        Ok(())
    }
}
