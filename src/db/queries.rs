// Database queries: CRUD for the entity directory.
//
// Users and channels share one table shape, so every query takes an
// EntityKind and picks the table from it. Table names come from a fixed
// enum, never from input, so formatting them into SQL is safe.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{EntityKind, EntityRow};

/// Register an entity, updating its name if one is given.
///
/// An empty `name` never overwrites a stored one.
pub fn upsert_entity(conn: &Connection, kind: EntityKind, id: &str, name: &str) -> Result<()> {
    let sql = format!(
        "INSERT INTO {table} (id, name, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(id) DO UPDATE SET
            name = CASE WHEN ?2 = '' THEN name ELSE ?2 END,
            updated_at = datetime('now')",
        table = kind.table()
    );
    conn.execute(&sql, params![id, name])?;
    Ok(())
}

/// Store the engine's current score for an entity, creating the row if needed.
pub fn save_score(conn: &Connection, kind: EntityKind, id: &str, score: f64) -> Result<()> {
    let sql = format!(
        "INSERT INTO {table} (id, score, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(id) DO UPDATE SET score = ?2, updated_at = datetime('now')",
        table = kind.table()
    );
    conn.execute(&sql, params![id, score])?;
    Ok(())
}

/// All (id, score) pairs with a stored score, for leaderboard bootstrap.
///
/// Ordered by last update so seeding replays entities in the order they
/// were last scored.
pub fn load_seeds(conn: &Connection, kind: EntityKind) -> Result<Vec<(String, f64)>> {
    let sql = format!(
        "SELECT id, score FROM {table} WHERE score IS NOT NULL ORDER BY updated_at, id",
        table = kind.table()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    let mut seeds = Vec::new();
    for row in rows {
        seeds.push(row?);
    }
    Ok(seeds)
}

/// All (id, name) pairs with a non-empty name.
pub fn load_names(conn: &Connection, kind: EntityKind) -> Result<Vec<(String, String)>> {
    let sql = format!(
        "SELECT id, name FROM {table} WHERE name != '' ORDER BY id",
        table = kind.table()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    let mut names = Vec::new();
    for row in rows {
        names.push(row?);
    }
    Ok(names)
}

/// Look up a single entity by id.
pub fn get_entity(conn: &Connection, kind: EntityKind, id: &str) -> Result<Option<EntityRow>> {
    let sql = format!(
        "SELECT id, name, score, updated_at FROM {table} WHERE id = ?1",
        table = kind.table()
    );
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row(params![id], map_row).optional()?;
    Ok(row)
}

/// Look up a single entity by display name (case-insensitive).
pub fn find_by_name(conn: &Connection, kind: EntityKind, name: &str) -> Result<Option<EntityRow>> {
    let sql = format!(
        "SELECT id, name, score, updated_at FROM {table}
         WHERE name = ?1 COLLATE NOCASE
         ORDER BY id LIMIT 1",
        table = kind.table()
    );
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row(params![name], map_row).optional()?;
    Ok(row)
}

/// Scored entities ranked by score descending, at most `limit` rows.
pub fn get_ranked(conn: &Connection, kind: EntityKind, limit: u32) -> Result<Vec<EntityRow>> {
    let sql = format!(
        "SELECT id, name, score, updated_at FROM {table}
         WHERE score IS NOT NULL
         ORDER BY score DESC, updated_at ASC
         LIMIT ?1",
        table = kind.table()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![limit], map_row)?;
    let mut ranked = Vec::new();
    for row in rows {
        ranked.push(row?);
    }
    Ok(ranked)
}

/// Number of known entities and how many of them have a score.
pub fn entity_counts(conn: &Connection, kind: EntityKind) -> Result<(i64, i64)> {
    let sql = format!(
        "SELECT COUNT(*), COUNT(score) FROM {table}",
        table = kind.table()
    );
    let counts = conn.query_row(&sql, [], |row| Ok((row.get(0)?, row.get(1)?)))?;
    Ok(counts)
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntityRow> {
    Ok(EntityRow {
        id: row.get(0)?,
        name: row.get(1)?,
        score: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    #[test]
    fn test_upsert_keeps_name_when_blank() {
        let conn = test_db();
        upsert_entity(&conn, EntityKind::User, "U1", "alice").unwrap();
        upsert_entity(&conn, EntityKind::User, "U1", "").unwrap();
        let row = get_entity(&conn, EntityKind::User, "U1").unwrap().unwrap();
        assert_eq!(row.name, "alice");
        assert_eq!(row.score, None);
    }

    #[test]
    fn test_save_score_creates_and_updates() {
        let conn = test_db();
        save_score(&conn, EntityKind::Channel, "C1", 42.0).unwrap();
        save_score(&conn, EntityKind::Channel, "C1", 120.5).unwrap();
        let row = get_entity(&conn, EntityKind::Channel, "C1").unwrap().unwrap();
        assert_eq!(row.score, Some(120.5));
        assert_eq!(row.display_name(), "C1");
    }

    #[test]
    fn test_kinds_are_separate_tables() {
        let conn = test_db();
        save_score(&conn, EntityKind::User, "X", 10.0).unwrap();
        assert!(get_entity(&conn, EntityKind::Channel, "X").unwrap().is_none());
    }

    #[test]
    fn test_load_seeds_skips_unscored() {
        let conn = test_db();
        upsert_entity(&conn, EntityKind::User, "U1", "alice").unwrap();
        save_score(&conn, EntityKind::User, "U2", 33.0).unwrap();
        let seeds = load_seeds(&conn, EntityKind::User).unwrap();
        assert_eq!(seeds, vec![("U2".to_string(), 33.0)]);
    }

    #[test]
    fn test_load_names_skips_blank() {
        let conn = test_db();
        upsert_entity(&conn, EntityKind::Channel, "C1", "general").unwrap();
        save_score(&conn, EntityKind::Channel, "C2", 1.0).unwrap();
        let names = load_names(&conn, EntityKind::Channel).unwrap();
        assert_eq!(names, vec![("C1".to_string(), "general".to_string())]);
    }

    #[test]
    fn test_find_by_name_is_case_insensitive() {
        let conn = test_db();
        upsert_entity(&conn, EntityKind::User, "U1", "Alice").unwrap();
        let row = find_by_name(&conn, EntityKind::User, "alice").unwrap().unwrap();
        assert_eq!(row.id, "U1");
    }

    #[test]
    fn test_ranked_and_counts() {
        let conn = test_db();
        save_score(&conn, EntityKind::User, "low", 5.0).unwrap();
        save_score(&conn, EntityKind::User, "high", 250.0).unwrap();
        save_score(&conn, EntityKind::User, "mid", 90.0).unwrap();
        upsert_entity(&conn, EntityKind::User, "quiet", "quiet").unwrap();

        let ranked = get_ranked(&conn, EntityKind::User, 2).unwrap();
        let ids: Vec<&str> = ranked.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid"]);

        assert_eq!(entity_counts(&conn, EntityKind::User).unwrap(), (4, 3));
    }
}
