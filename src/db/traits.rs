// Database trait: async interface to the entity directory.
//
// The engine itself never touches storage. The host uses this trait to seed
// the engine at startup, resolve names for terminal output, and write back
// the one field the engine owns: each entity's cached score.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{EntityKind, EntityRow};

#[async_trait]
pub trait Database: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    // --- Directory ---

    /// Register an entity, setting its display name when non-empty.
    async fn upsert_entity(&self, kind: EntityKind, id: &str, name: &str) -> Result<()>;

    /// Look up an entity by id.
    async fn get_entity(&self, kind: EntityKind, id: &str) -> Result<Option<EntityRow>>;

    /// Look up an entity by display name (case-insensitive).
    async fn find_by_name(&self, kind: EntityKind, name: &str) -> Result<Option<EntityRow>>;

    /// All (id, name) pairs with a display name.
    async fn load_names(&self, kind: EntityKind) -> Result<Vec<(String, String)>>;

    // --- Scores ---

    /// All (id, score) pairs with a stored score, for bootstrap.
    async fn load_seeds(&self, kind: EntityKind) -> Result<Vec<(String, f64)>>;

    /// Write back an entity's current score.
    async fn save_score(&self, kind: EntityKind, id: &str, score: f64) -> Result<()>;

    /// Scored entities, highest first.
    async fn get_ranked(&self, kind: EntityKind, limit: u32) -> Result<Vec<EntityRow>>;

    /// (known, scored) entity counts.
    async fn entity_counts(&self, kind: EntityKind) -> Result<(i64, i64)>;
}
