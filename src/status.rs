// System status display: directory size, entity counts, current top targets.

use anyhow::Result;
use std::sync::Arc;

use crate::db::models::{EnforcementTier, EntityKind};
use crate::db::Database;

/// Display system status to the terminal.
pub async fn show(db: &Arc<dyn Database>, db_display_path: &str) -> Result<()> {
    let file_size = std::fs::metadata(db_display_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", db_display_path, file_size);

    for kind in [EntityKind::User, EntityKind::Channel] {
        let (known, scored) = db.entity_counts(kind).await?;
        println!("{}s: {} known, {} scored", capitalize(kind.as_str()), known, scored);

        match db.get_ranked(kind, 1).await?.first() {
            Some(top) => {
                let score = top.score.unwrap_or(0.0);
                println!(
                    "  Highest: {}{} at {:.1} ({})",
                    kind.sigil(),
                    top.display_name(),
                    score,
                    EnforcementTier::from_score(score)
                );
            }
            None => println!("  Highest: none yet"),
        }
    }

    Ok(())
}

/// Render status for a database that hasn't been created yet.
pub fn show_uninitialized() {
    println!("Database: not initialized");
    println!("\nRun `sibyl init` to set up the database.");
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
