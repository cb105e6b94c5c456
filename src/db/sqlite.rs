// SqliteDatabase: rusqlite backend implementing the Database trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Sync.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{EntityKind, EntityRow};
use super::traits::Database;

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn upsert_entity(&self, kind: EntityKind, id: &str, name: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::upsert_entity(&conn, kind, id, name)
    }

    async fn get_entity(&self, kind: EntityKind, id: &str) -> Result<Option<EntityRow>> {
        let conn = self.conn.lock().await;
        super::queries::get_entity(&conn, kind, id)
    }

    async fn find_by_name(&self, kind: EntityKind, name: &str) -> Result<Option<EntityRow>> {
        let conn = self.conn.lock().await;
        super::queries::find_by_name(&conn, kind, name)
    }

    async fn load_names(&self, kind: EntityKind) -> Result<Vec<(String, String)>> {
        let conn = self.conn.lock().await;
        super::queries::load_names(&conn, kind)
    }

    async fn load_seeds(&self, kind: EntityKind) -> Result<Vec<(String, f64)>> {
        let conn = self.conn.lock().await;
        super::queries::load_seeds(&conn, kind)
    }

    async fn save_score(&self, kind: EntityKind, id: &str, score: f64) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::save_score(&conn, kind, id, score)
    }

    async fn get_ranked(&self, kind: EntityKind, limit: u32) -> Result<Vec<EntityRow>> {
        let conn = self.conn.lock().await;
        super::queries::get_ranked(&conn, kind, limit)
    }

    async fn entity_counts(&self, kind: EntityKind) -> Result<(i64, i64)> {
        let conn = self.conn.lock().await;
        super::queries::entity_counts(&conn, kind)
    }
}
