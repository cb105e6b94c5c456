// Responses: what the router asks the host to post, and how it reads.

use serde::Serialize;

use crate::db::models::{EntityKind, EnforcementTier};
use crate::ranking::leaderboard::LeaderboardEntry;
use crate::scoring::policy::Score;

/// One outgoing response produced by handling a message.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Plain text, ready to post.
    Text { channel: String, text: String },
    /// A threshold crossing. The host decorates it with looked-up content
    /// before posting; the engine state is already committed.
    Mitigation(MitigationNotice),
}

impl Response {
    pub fn channel(&self) -> &str {
        match self {
            Response::Text { channel, .. } => channel,
            Response::Mitigation(notice) => &notice.channel,
        }
    }
}

/// A channel crossed the enforcement threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct MitigationNotice {
    pub channel: String,
    pub channel_name: String,
    pub score: Score,
}

impl MitigationNotice {
    /// Announcement text, without any looked-up flavor content.
    pub fn base_text(&self) -> String {
        let tier = EnforcementTier::from_score(self.score.value());
        format!(
            "Area stress warning: #{} has reached a crime coefficient of {}. {}",
            self.channel_name,
            self.score,
            tier.verdict()
        )
    }
}

/// A message as written to the transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingMessage {
    pub channel: String,
    pub text: String,
}

pub fn score_text(kind: EntityKind, name: &str, score: Score) -> String {
    let tier = EnforcementTier::from_score(score.value());
    format!(
        "Crime coefficient of {}{}: {}. {}",
        kind.sigil(),
        name,
        score,
        tier.verdict()
    )
}

pub fn unscored_text(kind: EntityKind, name: &str) -> String {
    format!(
        "{}{} has not been scanned yet. No crime coefficient on record.",
        kind.sigil(),
        name
    )
}

pub fn not_found_text(kind: EntityKind, id: &str) -> String {
    format!(
        "The Sibyl System has no record of {}{}.",
        kind.sigil(),
        id
    )
}

pub fn help_text() -> String {
    [
        "Psycho-Pass commands:",
        "  psychopass                          crime coefficient of this channel",
        "  psychopass @user                    crime coefficient of a user",
        "  psychopass #channel                 crime coefficient of a channel",
        "  psychopass leaderboard users        highest and lowest users",
        "  psychopass leaderboard channels     highest and lowest channels",
        "  psychopass help                     this message",
    ]
    .join("\n")
}

fn plural(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::User => "users",
        EntityKind::Channel => "channels",
    }
}

/// Reply for a leaderboard request when no entity of `kind` is tracked.
pub fn empty_leaderboard_text(kind: EntityKind) -> String {
    format!("No {} have been scanned yet.", plural(kind))
}

/// Render both ends of a non-empty leaderboard. `name_of` resolves ids to
/// display names.
pub fn leaderboard_text(
    kind: EntityKind,
    highest: &[LeaderboardEntry],
    lowest: &[LeaderboardEntry],
    name_of: impl Fn(&str) -> String,
) -> String {
    let plural = plural(kind);
    let mut lines = vec![format!("Highest crime coefficients ({plural}):")];
    for (i, entry) in highest.iter().enumerate() {
        lines.push(format!(
            "  {}. {}{} {}",
            i + 1,
            kind.sigil(),
            name_of(&entry.id),
            entry.score
        ));
    }
    lines.push(format!("Lowest crime coefficients ({plural}):"));
    for (i, entry) in lowest.iter().enumerate() {
        lines.push(format!(
            "  {}. {}{} {}",
            i + 1,
            kind.sigil(),
            name_of(&entry.id),
            entry.score
        ));
    }
    lines.join("\n")
}
