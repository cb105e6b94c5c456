// Replay: rebuild scores from a recorded message log.
//
// Feeds every message through a fresh engine with lookups disabled and no
// outbox, then writes the final score of every entity it saw back to the
// directory. Useful after changing window sizes or the scoring policy.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::db::models::EntityKind;
use crate::db::Database;
use crate::router::responses::Response;
use crate::router::{InboundMessage, MessageRouter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub messages: usize,
    pub skipped: usize,
    pub mitigations: usize,
    pub users: usize,
    pub channels: usize,
}

/// Parse a JSON-lines log. Malformed lines are counted and skipped.
pub fn parse_log(contents: &str) -> (Vec<InboundMessage>, usize) {
    let mut messages = Vec::new();
    let mut skipped = 0;
    for (lineno, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<InboundMessage>(line) {
            Ok(msg) => messages.push(msg),
            Err(e) => {
                warn!(line = lineno + 1, error = %e, "Skipping malformed log line");
                skipped += 1;
            }
        }
    }
    (messages, skipped)
}

/// Run `messages` through `router` and persist the resulting scores.
pub async fn run(
    router: &mut MessageRouter,
    db: &Arc<dyn Database>,
    messages: &[InboundMessage],
) -> Result<ReplayStats> {
    let mut stats = ReplayStats::default();
    let mut names: HashMap<(EntityKind, String), String> = HashMap::new();

    let pb = ProgressBar::new(messages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Replay [{bar:30}] {pos}/{len} ({eta})")
            .context("Invalid progress bar template")?,
    );

    for msg in messages {
        for response in router.handle(msg) {
            if let Response::Mitigation(_) = response {
                stats.mitigations += 1;
            }
        }
        if let Some(name) = &msg.user_name {
            names.insert((EntityKind::User, msg.user.clone()), name.clone());
        }
        if let Some(name) = &msg.channel_name {
            names.insert((EntityKind::Channel, msg.channel.clone()), name.clone());
        }
        stats.messages += 1;
        pb.inc(1);
    }
    pb.finish_and_clear();

    for ((kind, id), name) in &names {
        db.upsert_entity(*kind, id, name).await?;
    }

    for kind in [EntityKind::User, EntityKind::Channel] {
        let mut saved = 0;
        for record in router.aggregator(kind).records() {
            if let Some(score) = record.score() {
                db.save_score(kind, &record.id, score.value()).await?;
                saved += 1;
            }
        }
        match kind {
            EntityKind::User => stats.users = saved,
            EntityKind::Channel => stats.channels = saved,
        }
    }

    info!(
        messages = stats.messages,
        mitigations = stats.mitigations,
        users = stats.users,
        channels = stats.channels,
        "Replay complete"
    );
    Ok(stats)
}
