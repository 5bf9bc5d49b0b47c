use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::Result;

impl Database {
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Insert or overwrite. A single statement, so readers never observe
    /// a half-written value.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn().execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn kv_remove(&self, key: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::database::Database;

    #[test]
    fn set_overwrites_and_remove_reports() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.kv_get("k").unwrap(), None);

        db.kv_set("k", "one").unwrap();
        db.kv_set("k", "two").unwrap();
        assert_eq!(db.kv_get("k").unwrap().as_deref(), Some("two"));

        assert!(db.kv_remove("k").unwrap());
        assert!(!db.kv_remove("k").unwrap());
        assert_eq!(db.kv_get("k").unwrap(), None);
    }
}
