use crate::Result;
use rusqlite::Connection;
use std::path::Path;

/// SQLite connection holding the bundled host's records and saved searches.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn })
    }

    /// A throwaway store that lives as long as the returned value.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Validate database structure
        let table_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master
             WHERE type='table'
             AND name IN ('records', 'saved_searches', 'host_meta')",
            [],
            |row| row.get(0),
        )?;

        if table_count != 3 {
            return Err(crate::LinekitError::Host(
                "Not a valid Linekit record store".to_string(),
            ));
        }

        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
