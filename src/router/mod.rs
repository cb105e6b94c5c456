// Message router: the engine's single entry point for inbound messages.
//
// For each message, in order:
// 1. Public channel messages are rated once; the rating updates the channel
//    (aggregate, leaderboard, cooldown) and then the sender (aggregate,
//    leaderboard). Messages outside public channels skip this step.
// 2. The text is checked for a `psychopass` command.
// 3. Responses are assembled: the command answer first, then any mitigation.
//
// Each step runs to completion on &mut self before the next message is
// handled, so a window insert and the matching leaderboard move are never
// observed half-applied.

pub mod commands;
pub mod responses;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::models::EntityKind;
use crate::mitigation::cooldown::{CooldownMonitor, CooldownOutcome};
use crate::ranking::leaderboard::Leaderboard;
use crate::scoring::aggregator::{ScoreAggregator, ScoreChange};
use crate::scoring::policy::{Rating, Score, ScoringPolicy};

use commands::Command;
use responses::{MitigationNotice, Response};

/// A chat message as delivered by the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub user: String,
    #[serde(default)]
    pub user_name: Option<String>,
    pub channel: String,
    #[serde(default)]
    pub channel_name: Option<String>,
    /// Only public channel traffic is scored.
    #[serde(default = "default_public")]
    pub public: bool,
    pub text: String,
}

fn default_public() -> bool {
    true
}

/// Tunables for one engine instance.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub user_window: usize,
    pub channel_window: usize,
    /// Channel score must be strictly above this to trigger mitigation.
    pub threshold: f64,
    /// Channel messages to skip after a trigger.
    pub cooldown: u32,
    /// Entries per end of a leaderboard response.
    pub leaderboard_k: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            user_window: 50,
            channel_window: 100,
            threshold: 100.0,
            cooldown: 10,
            leaderboard_k: 5,
        }
    }
}

pub struct MessageRouter {
    policy: ScoringPolicy,
    users: ScoreAggregator,
    channels: ScoreAggregator,
    user_board: Leaderboard,
    channel_board: Leaderboard,
    cooldown: CooldownMonitor,
    user_names: HashMap<String, String>,
    channel_names: HashMap<String, String>,
    leaderboard_k: usize,
}

impl MessageRouter {
    pub fn new(settings: &EngineSettings, policy: ScoringPolicy) -> Self {
        Self {
            users: ScoreAggregator::new(settings.user_window, policy.user_aggregation.clone()),
            channels: ScoreAggregator::new(
                settings.channel_window,
                policy.channel_aggregation.clone(),
            ),
            policy,
            user_board: Leaderboard::new(),
            channel_board: Leaderboard::new(),
            cooldown: CooldownMonitor::new(Score(settings.threshold), settings.cooldown),
            user_names: HashMap::new(),
            channel_names: HashMap::new(),
            leaderboard_k: settings.leaderboard_k,
        }
    }

    /// Record a display name for an entity.
    pub fn register_name(&mut self, kind: EntityKind, id: &str, name: &str) {
        if name.is_empty() {
            return;
        }
        self.names_mut(kind).insert(id.to_string(), name.to_string());
    }

    /// Bootstrap an entity with a stored score. Already-tracked entities are
    /// left alone.
    pub fn seed(&mut self, kind: EntityKind, id: &str, score: Score) {
        let (aggregator, board) = self.parts_mut(kind);
        if aggregator.seed(id, score) {
            board.update(id, score, None);
        }
    }

    /// Handle one inbound message and return the responses to post.
    pub fn handle(&mut self, msg: &InboundMessage) -> Vec<Response> {
        if let Some(name) = &msg.user_name {
            self.register_name(EntityKind::User, &msg.user, name);
        }
        if let Some(name) = &msg.channel_name {
            self.register_name(EntityKind::Channel, &msg.channel, name);
        }

        let mut mitigation = None;
        if msg.public {
            let rating = self.policy.rate(&msg.text);

            let channel = self.record(EntityKind::Channel, &msg.channel, rating);
            if self.cooldown.observe(&msg.channel, channel.new) == CooldownOutcome::Triggered {
                mitigation = Some(Response::Mitigation(MitigationNotice {
                    channel: msg.channel.clone(),
                    channel_name: self.display_name(EntityKind::Channel, &msg.channel),
                    score: channel.new,
                }));
            }

            self.record(EntityKind::User, &msg.user, rating);
        }

        let mut responses = Vec::new();
        if let Some(command) = commands::parse(&msg.text) {
            debug!(command = ?command, channel = %msg.channel, "Recognized command");
            responses.push(Response::Text {
                channel: msg.channel.clone(),
                text: self.answer(&command, msg),
            });
        }
        responses.extend(mitigation);
        responses
    }

    /// Current cached score of an entity.
    pub fn score(&self, kind: EntityKind, id: &str) -> Option<Score> {
        match kind {
            EntityKind::User => self.users.score(id),
            EntityKind::Channel => self.channels.score(id),
        }
    }

    pub fn leaderboard(&self, kind: EntityKind) -> &Leaderboard {
        match kind {
            EntityKind::User => &self.user_board,
            EntityKind::Channel => &self.channel_board,
        }
    }

    pub fn aggregator(&self, kind: EntityKind) -> &ScoreAggregator {
        match kind {
            EntityKind::User => &self.users,
            EntityKind::Channel => &self.channels,
        }
    }

    /// Remaining cooldown ticks for a channel (0 = armed).
    pub fn cooldown_ticks(&self, channel_id: &str) -> u32 {
        self.cooldown.ticks(channel_id)
    }

    /// Registered name for an entity, or its id.
    pub fn display_name(&self, kind: EntityKind, id: &str) -> String {
        self.names(kind)
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    /// Admit a rating for one entity and move it on its leaderboard.
    fn record(&mut self, kind: EntityKind, id: &str, rating: Rating) -> ScoreChange {
        let (aggregator, board) = self.parts_mut(kind);
        let change = aggregator.update(id, rating);
        board.update(id, change.new, change.old);
        change
    }

    fn answer(&self, command: &Command, msg: &InboundMessage) -> String {
        match command {
            Command::CurrentChannel => self.entity_text(EntityKind::Channel, &msg.channel),
            Command::User(token) => self.entity_text(EntityKind::User, token),
            Command::Channel(token) => self.entity_text(EntityKind::Channel, token),
            Command::Help => responses::help_text(),
            Command::Leaderboard(kind) => {
                let board = self.leaderboard(*kind);
                if board.is_empty() {
                    return responses::empty_leaderboard_text(*kind);
                }
                responses::leaderboard_text(
                    *kind,
                    &board.highest(self.leaderboard_k),
                    &board.lowest(self.leaderboard_k),
                    |id| self.display_name(*kind, id),
                )
            }
        }
    }

    fn entity_text(&self, kind: EntityKind, token: &str) -> String {
        let Some(id) = self.resolve(kind, token) else {
            return responses::not_found_text(kind, token);
        };
        let name = self.display_name(kind, &id);
        match self.score(kind, &id) {
            Some(score) => responses::score_text(kind, &name, score),
            None => responses::unscored_text(kind, &name),
        }
    }

    /// Map a mention token to a known entity id. Tokens may be ids or
    /// registered display names (names match case-insensitively).
    fn resolve(&self, kind: EntityKind, token: &str) -> Option<String> {
        if self.aggregator(kind).get(token).is_some() || self.names(kind).contains_key(token) {
            return Some(token.to_string());
        }
        let mut matches: Vec<&String> = self
            .names(kind)
            .iter()
            .filter(|(_, name)| name.eq_ignore_ascii_case(token))
            .map(|(id, _)| id)
            .collect();
        // Several ids can share a name; pick the smallest id so the answer
        // does not depend on hash order.
        matches.sort();
        matches.first().map(|id| id.to_string())
    }

    fn names(&self, kind: EntityKind) -> &HashMap<String, String> {
        match kind {
            EntityKind::User => &self.user_names,
            EntityKind::Channel => &self.channel_names,
        }
    }

    fn names_mut(&mut self, kind: EntityKind) -> &mut HashMap<String, String> {
        match kind {
            EntityKind::User => &mut self.user_names,
            EntityKind::Channel => &mut self.channel_names,
        }
    }

    fn parts_mut(&mut self, kind: EntityKind) -> (&mut ScoreAggregator, &mut Leaderboard) {
        match kind {
            EntityKind::User => (&mut self.users, &mut self.user_board),
            EntityKind::Channel => (&mut self.channels, &mut self.channel_board),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(user: &str, channel: &str, text: &str) -> InboundMessage {
        InboundMessage {
            user: user.into(),
            user_name: None,
            channel: channel.into(),
            channel_name: None,
            public: true,
            text: text.into(),
        }
    }

    #[test]
    fn test_private_messages_are_not_scored() {
        let mut router = MessageRouter::new(&EngineSettings::default(), ScoringPolicy::default());
        let mut m = msg("U1", "D1", "you idiot");
        m.public = false;
        assert!(router.handle(&m).is_empty());
        assert_eq!(router.score(EntityKind::User, "U1"), None);
        assert!(router.leaderboard(EntityKind::Channel).is_empty());
    }

    #[test]
    fn test_private_messages_still_answer_commands() {
        let mut router = MessageRouter::new(&EngineSettings::default(), ScoringPolicy::default());
        let mut m = msg("U1", "D1", "psychopass help");
        m.public = false;
        let responses = router.handle(&m);
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].channel(), "D1");
    }

    #[test]
    fn test_public_message_updates_both_boards() {
        let mut router = MessageRouter::new(&EngineSettings::default(), ScoringPolicy::default());
        router.handle(&msg("U1", "C1", "you idiot"));
        assert_eq!(router.score(EntityKind::User, "U1"), Some(Score(45.0)));
        assert_eq!(router.score(EntityKind::Channel, "C1"), Some(Score(45.0)));
        assert!(router.leaderboard(EntityKind::User).contains("U1"));
        assert!(router.leaderboard(EntityKind::Channel).contains("C1"));
    }

    #[test]
    fn test_seed_populates_board_without_window() {
        let mut router = MessageRouter::new(&EngineSettings::default(), ScoringPolicy::default());
        router.seed(EntityKind::User, "U9", Score(210.0));
        assert_eq!(router.leaderboard(EntityKind::User).highest(1)[0].id, "U9");
        assert_eq!(router.aggregator(EntityKind::User).get("U9").unwrap().window_len(), 0);
    }

    #[test]
    fn test_resolve_by_display_name() {
        let mut router = MessageRouter::new(&EngineSettings::default(), ScoringPolicy::default());
        let mut m = msg("U1", "C1", "hello");
        m.user_name = Some("alice".into());
        router.handle(&m);

        let responses = router.handle(&msg("U2", "C1", "psychopass @Alice"));
        match &responses[0] {
            Response::Text { text, .. } => assert!(text.starts_with("Crime coefficient of @alice:")),
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn test_zero_k_leaderboard_is_not_reported_empty() {
        let settings = EngineSettings {
            leaderboard_k: 0,
            ..EngineSettings::default()
        };
        let mut router = MessageRouter::new(&settings, ScoringPolicy::default());
        router.handle(&msg("U1", "C1", "you idiot"));

        let mut ask = msg("U1", "D1", "psychopass leaderboard users");
        ask.public = false;
        let responses = router.handle(&ask);
        match &responses[0] {
            Response::Text { text, .. } => {
                assert!(!text.contains("have been scanned yet"));
                assert!(text.starts_with("Highest crime coefficients (users):"));
            }
            other => panic!("unexpected response {other:?}"),
        }
    }
}
