// Colored terminal output for leaderboards and entity scores.
//
// main.rs delegates all terminal formatting here so the CLI commands stay
// focused on loading data.

use colored::Colorize;

use crate::db::models::{EnforcementTier, EntityKind, EntityRow};

/// Display the ranked entities of one kind, most latent first.
pub fn display_leaderboard(kind: EntityKind, rows: &[EntityRow]) {
    if rows.is_empty() {
        println!("No {kind}s scored yet. Feed some messages through `sibyl run` first.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Crime Coefficients: {}s ({}) ===", kind, rows.len()).bold()
    );
    println!();

    println!(
        "  {:>4}  {:<32} {:>7}  {:<10}",
        "Rank".dimmed(),
        "Name".dimmed(),
        "Score".dimmed(),
        "Tier".dimmed(),
    );
    println!("  {}", "-".repeat(58).dimmed());

    for (i, row) in rows.iter().enumerate() {
        let score = row.score.unwrap_or(0.0);
        let name = super::truncate_chars(row.display_name(), 28);
        println!(
            "  {:>4}. {}{:<31} {:>7.1}  {:<10}",
            i + 1,
            kind.sigil(),
            name,
            score,
            colorize_tier(EnforcementTier::from_score(score)),
        );
    }

    println!();

    let eliminators = count_tier(rows, EnforcementTier::Eliminator);
    let paralyzers = count_tier(rows, EnforcementTier::Paralyzer);
    if eliminators > 0 {
        println!("  {} {} lethal-tier {kind}s", "!!".red().bold(), eliminators);
    }
    if paralyzers > 0 {
        println!("  {} {} latent {kind}s", "!".yellow(), paralyzers);
    }
}

/// Display one entity's stored score and verdict.
pub fn display_entity_detail(kind: EntityKind, row: &EntityRow) {
    println!(
        "\n{}",
        format!("=== {}{} ===", kind.sigil(), row.display_name()).bold()
    );
    println!("  Id: {}", row.id.dimmed());

    match row.score {
        Some(score) => {
            let tier = EnforcementTier::from_score(score);
            println!("  Crime coefficient: {score:.1}");
            println!("  Tier: {}", colorize_tier(tier));
            println!("  {}", tier.verdict().italic());
            println!("  Last updated: {}", row.updated_at);
        }
        None => {
            println!("  {}", "No crime coefficient recorded yet.".dimmed());
        }
    }
}

fn count_tier(rows: &[EntityRow], tier: EnforcementTier) -> usize {
    rows.iter()
        .filter(|r| r.score.map(EnforcementTier::from_score) == Some(tier))
        .count()
}

/// Colorize a tier label for terminal display.
pub fn colorize_tier(tier: EnforcementTier) -> String {
    match tier {
        EnforcementTier::Eliminator => tier.as_str().red().bold().to_string(),
        EnforcementTier::Paralyzer => tier.as_str().yellow().to_string(),
        EnforcementTier::Clear => tier.as_str().green().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(score: Option<f64>) -> EntityRow {
        EntityRow {
            id: "C1".to_string(),
            name: "general".to_string(),
            score,
            updated_at: "2026-01-01 00:00:00".to_string(),
        }
    }

    #[test]
    fn test_count_tier_ignores_unscored() {
        let rows = vec![row(Some(320.0)), row(Some(150.0)), row(Some(40.0)), row(None)];
        assert_eq!(count_tier(&rows, EnforcementTier::Eliminator), 1);
        assert_eq!(count_tier(&rows, EnforcementTier::Paralyzer), 1);
        assert_eq!(count_tier(&rows, EnforcementTier::Clear), 1);
    }

    #[test]
    fn test_colorize_tier_keeps_label() {
        colored::control::set_override(false);
        assert_eq!(colorize_tier(EnforcementTier::Paralyzer), "Paralyzer");
        colored::control::unset_override();
    }
}
