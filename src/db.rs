use std::fs;
use std::path::Path;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{params, params_from_iter, Connection};
use tracing::{debug, info, warn};

use crate::error::{InsightsError, Result};
use crate::table::{Column, Table, Value};

/// Pool of SQLite connections
pub type DbPool = Pool<SqliteConnectionManager>;
/// Connection checked out of the pool
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// How `save` treats an existing table of the same name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveMode {
    /// Drop the old table and write the new contents
    #[default]
    Replace,
    /// Keep the old rows and add the new ones; columns must match
    Append,
}

/// Named-table persistence used by the aggregate cache.
///
/// Reads never fail: a missing or unreadable table is reported as `None`,
/// which callers treat as a cache miss.
pub trait TableStore {
    /// True when `name` exists and holds at least one row
    fn exists_and_nonempty(&self, name: &str) -> bool;

    /// Load the full contents of `name`
    fn load(&self, name: &str) -> Option<Table>;

    /// Persist `table` under `name`
    fn save(&self, name: &str, table: &Table, mode: SaveMode) -> Result<()>;
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Null => ToSqlOutput::Owned(SqlValue::Null),
            Self::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Self::Real(r) => ToSqlOutput::Owned(SqlValue::Real(*r)),
            Self::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

fn from_sql_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(t) | ValueRef::Blob(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
    }
}

/// Quote an SQL identifier so names with spaces or quotes survive
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// SQLite-backed cache store with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open (or create) the cache store at `path`
    pub fn new(path: &str) -> Result<Self> {
        Self::with_pool_size(path, 4)
    }

    /// Open the cache store with an explicit pool size
    pub fn with_pool_size(path: &str, max_connections: u32) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Set up connection manager and pool
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(max_connections).build(manager)?;

        info!("Opened cache store at {}", path);
        Ok(Self { pool })
    }

    /// A private in-memory store, mostly for tests.
    ///
    /// The pool holds a single connection that is never recycled, so every
    /// caller sees the same database for the life of the store.
    pub fn in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .max_lifetime(None)
            .idle_timeout(None)
            .build(manager)?;
        Ok(Self { pool })
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }

    fn table_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            params![name],
            |row| row.get(0),
        )
    }

    fn read_table(conn: &Connection, name: &str) -> rusqlite::Result<Table> {
        let mut stmt = conn.prepare(&format!("SELECT * FROM {}", quote_ident(name)))?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut values: Vec<Vec<Value>> = vec![Vec::new(); names.len()];

        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            for (i, column) in values.iter_mut().enumerate() {
                column.push(from_sql_ref(row.get_ref(i)?));
            }
        }

        let columns = names
            .into_iter()
            .zip(values)
            .map(|(name, values)| Column { name, values })
            .collect();
        // every column received one value per row
        Ok(Table::from_columns(columns).unwrap_or_default())
    }

    fn write_table(conn: &mut Connection, name: &str, table: &Table, mode: SaveMode) -> Result<()> {
        let quoted = quote_ident(name);
        let tx = conn.transaction()?;

        if mode == SaveMode::Replace {
            tx.execute(&format!("DROP TABLE IF EXISTS {quoted}"), [])?;
        }

        if table.columns().is_empty() {
            debug!("Table {} has no columns, nothing to create", name);
            tx.commit()?;
            return Ok(());
        }

        let definitions = table
            .columns()
            .iter()
            .map(|c| format!("{} {}", quote_ident(&c.name), c.sql_type()))
            .collect::<Vec<_>>()
            .join(", ");
        tx.execute(&format!("CREATE TABLE IF NOT EXISTS {quoted} ({definitions})"), [])?;

        {
            let placeholders = (1..=table.columns().len())
                .map(|i| format!("?{i}"))
                .collect::<Vec<_>>()
                .join(", ");
            let mut stmt = tx.prepare(&format!("INSERT INTO {quoted} VALUES ({placeholders})"))?;
            for row in table.rows() {
                stmt.execute(params_from_iter(row))?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Names of all tables in the store
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    /// Drop a single table; missing tables are ignored
    pub fn drop_table(&self, name: &str) -> Result<()> {
        let conn = self.get_connection()?;
        conn.execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(name)), [])?;
        Ok(())
    }

    /// Drop every table in the store
    pub fn clear(&self) -> Result<usize> {
        let tables = self.list_tables()?;
        for table in &tables {
            self.drop_table(table)?;
        }
        info!("Cleared {} cached tables", tables.len());
        Ok(tables.len())
    }
}

impl TableStore for Database {
    fn exists_and_nonempty(&self, name: &str) -> bool {
        let check = || -> Result<bool> {
            let conn = self.get_connection()?;
            if !Self::table_exists(&conn, name)? {
                return Ok(false);
            }
            let nonempty = conn.query_row(
                &format!("SELECT EXISTS(SELECT 1 FROM {})", quote_ident(name)),
                [],
                |row| row.get(0),
            )?;
            Ok(nonempty)
        };

        check().unwrap_or_else(|e| {
            warn!("Failed to inspect table {}: {}", name, e);
            false
        })
    }

    fn load(&self, name: &str) -> Option<Table> {
        let read = || -> Result<Option<Table>> {
            let conn = self.get_connection()?;
            if !Self::table_exists(&conn, name)? {
                return Ok(None);
            }
            Ok(Some(Self::read_table(&conn, name)?))
        };

        match read() {
            Ok(Some(table)) => {
                debug!("Loaded table {} ({} rows)", name, table.row_count());
                Some(table)
            }
            Ok(None) => {
                info!("Table {} not found in cache store", name);
                None
            }
            Err(e) => {
                warn!("Table {} could not be read: {}", name, e);
                None
            }
        }
    }

    fn save(&self, name: &str, table: &Table, mode: SaveMode) -> Result<()> {
        let mut conn = self.get_connection()?;
        Self::write_table(&mut conn, name, table, mode)
            .map_err(|e| InsightsError::Other(format!("Failed to save table {name}: {e}")))?;
        debug!("Saved table {} ({} rows, {:?})", name, table.row_count(), mode);
        Ok(())
    }
}
