// Composition tests: the router driving scoring, ranking, and cooldown.
//
// A scripted policy makes scores predictable: each message's text is its
// own rating, and a channel or user score is simply its latest rating.
// No database, network, or filesystem access.

use std::sync::Arc;

use sibyl::db::models::EntityKind;
use sibyl::router::responses::Response;
use sibyl::router::{EngineSettings, InboundMessage, MessageRouter};
use sibyl::scoring::policy::{Aggregation, MessageRater, Rating, Score, ScoringPolicy};

/// Rates a message by parsing its text as a number (0 if it isn't one).
struct NumericRater;

impl MessageRater for NumericRater {
    fn rate(&self, text: &str) -> Rating {
        text.trim().parse().unwrap_or(0.0)
    }
}

/// Score is the most recent rating.
struct Latest;

impl Aggregation for Latest {
    fn aggregate(&self, ratings: &[Rating]) -> Score {
        Score(ratings.first().copied().unwrap_or(0.0))
    }
}

fn scripted_router(settings: EngineSettings) -> MessageRouter {
    let policy = ScoringPolicy {
        rater: Arc::new(NumericRater),
        user_aggregation: Arc::new(Latest),
        channel_aggregation: Arc::new(Latest),
    };
    MessageRouter::new(&settings, policy)
}

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

fn mitigations(responses: &[Response]) -> usize {
    responses
        .iter()
        .filter(|r| matches!(r, Response::Mitigation(_)))
        .count()
}

fn text_of(response: &Response) -> &str {
    match response {
        Response::Text { text, .. } => text,
        other => panic!("expected text response, got {other:?}"),
    }
}

// ============================================================
// Cooldown through the router
// ============================================================

#[test]
fn threshold_fires_once_then_waits_for_cooldown() {
    let mut router = scripted_router(EngineSettings {
        threshold: 100.0,
        cooldown: 10,
        ..EngineSettings::default()
    });

    assert_eq!(mitigations(&router.handle(&msg("U1", "C1", "80"))), 0);
    assert_eq!(mitigations(&router.handle(&msg("U1", "C1", "120"))), 1);

    // Next 10 channel messages are cooling, however hot they are
    for _ in 0..10 {
        assert_eq!(mitigations(&router.handle(&msg("U2", "C1", "130"))), 0);
    }
    assert_eq!(router.cooldown_ticks("C1"), 0);

    assert_eq!(mitigations(&router.handle(&msg("U2", "C1", "125"))), 1);
    assert_eq!(router.cooldown_ticks("C1"), 10);
}

#[test]
fn score_equal_to_threshold_does_not_fire() {
    let mut router = scripted_router(EngineSettings::default());
    assert_eq!(mitigations(&router.handle(&msg("U1", "C1", "100"))), 0);
    assert_eq!(mitigations(&router.handle(&msg("U1", "C1", "100.5"))), 1);
}

#[test]
fn channels_cool_down_independently() {
    let mut router = scripted_router(EngineSettings::default());
    assert_eq!(mitigations(&router.handle(&msg("U1", "C1", "150"))), 1);
    assert_eq!(mitigations(&router.handle(&msg("U1", "C2", "150"))), 1);
    assert_eq!(mitigations(&router.handle(&msg("U1", "C1", "150"))), 0);
}

#[test]
fn mitigation_names_the_channel_and_score() {
    let mut router = scripted_router(EngineSettings::default());
    let mut m = msg("U1", "C1", "180");
    m.channel_name = Some("general".into());
    let responses = router.handle(&m);
    match &responses[0] {
        Response::Mitigation(notice) => {
            assert_eq!(notice.channel, "C1");
            assert_eq!(notice.channel_name, "general");
            assert_eq!(notice.score, Score(180.0));
            assert!(notice.base_text().contains("#general"));
        }
        other => panic!("expected mitigation, got {other:?}"),
    }
}

// ============================================================
// Commands alongside scoring
// ============================================================

/// Rates every message hot, so a command message can also trigger.
struct HotRater;

impl MessageRater for HotRater {
    fn rate(&self, _text: &str) -> Rating {
        250.0
    }
}

#[test]
fn command_response_precedes_mitigation() {
    let policy = ScoringPolicy {
        rater: Arc::new(HotRater),
        user_aggregation: Arc::new(Latest),
        channel_aggregation: Arc::new(Latest),
    };
    let mut router = MessageRouter::new(&EngineSettings::default(), policy);
    let responses = router.handle(&msg("U1", "C1", "psychopass"));

    assert_eq!(responses.len(), 2);
    assert!(text_of(&responses[0]).contains("250.0"));
    assert!(matches!(responses[1], Response::Mitigation(_)));
}

#[test]
fn command_sees_score_including_its_own_message() {
    let mut router = scripted_router(EngineSettings::default());
    router.handle(&msg("U1", "C1", "40"));
    let responses = router.handle(&msg("U1", "C1", "psychopass"));
    // The command message rates 0 and is the channel's latest rating
    assert!(text_of(&responses[0]).contains("#C1: 0.0"));
}

#[test]
fn single_entry_leaderboard_lists_it_on_both_ends() {
    let mut router = scripted_router(EngineSettings::default());
    let mut m = msg("U1", "C1", "42");
    m.user_name = Some("alice".into());
    router.handle(&m);

    let mut ask = msg("U1", "D1", "psychopass leaderboard users");
    ask.public = false;
    let responses = router.handle(&ask);
    assert_eq!(responses.len(), 1);
    let text = text_of(&responses[0]);
    assert_eq!(text.matches("@alice 42.0").count(), 2);
}

#[test]
fn leaderboard_respects_k() {
    let mut router = scripted_router(EngineSettings {
        leaderboard_k: 2,
        ..EngineSettings::default()
    });
    for (user, score) in [("U1", "10"), ("U2", "20"), ("U3", "30"), ("U4", "40"), ("U5", "50")] {
        router.handle(&msg(user, "C1", score));
    }
    let board = router.leaderboard(EntityKind::User);
    assert_eq!(board.len(), 5);

    let mut ask = msg("U9", "D1", "psychopass leaderboard users");
    ask.public = false;
    let text = text_of(&router.handle(&ask)[0]).to_string();
    assert!(text.contains("@U5 50.0"));
    assert!(text.contains("@U4 40.0"));
    assert!(text.contains("@U1 10.0"));
    assert!(text.contains("@U2 20.0"));
    assert!(!text.contains("@U3"));
}

#[test]
fn unknown_user_gets_not_found() {
    let mut router = scripted_router(EngineSettings::default());
    let responses = router.handle(&msg("U1", "C1", "psychopass @ghost"));
    assert!(text_of(&responses[0]).contains("no record of @ghost"));
}

#[test]
fn empty_leaderboard_says_so() {
    let mut router = scripted_router(EngineSettings::default());
    let mut ask = msg("U1", "D1", "psychopass leaderboard channels");
    ask.public = false;
    let responses = router.handle(&ask);
    assert_eq!(text_of(&responses[0]), "No channels have been scanned yet.");
}

// ============================================================
// Scores flow to both boards
// ============================================================

#[test]
fn user_and_channel_scores_diverge_across_channels() {
    let mut router = scripted_router(EngineSettings::default());
    router.handle(&msg("U1", "C1", "10"));
    router.handle(&msg("U1", "C2", "70"));
    assert_eq!(router.score(EntityKind::User, "U1"), Some(Score(70.0)));
    assert_eq!(router.score(EntityKind::Channel, "C1"), Some(Score(10.0)));
    assert_eq!(router.score(EntityKind::Channel, "C2"), Some(Score(70.0)));
    assert_eq!(router.leaderboard(EntityKind::Channel).rank("C2"), Some(1));
}

#[test]
fn seeded_entity_is_replaced_by_live_score() {
    let mut router = scripted_router(EngineSettings::default());
    router.seed(EntityKind::User, "U1", Score(220.0));
    router.seed(EntityKind::User, "U2", Score(50.0));
    assert_eq!(router.leaderboard(EntityKind::User).rank("U1"), Some(1));

    router.handle(&msg("U1", "C1", "5"));
    assert_eq!(router.score(EntityKind::User, "U1"), Some(Score(5.0)));
    assert_eq!(router.leaderboard(EntityKind::User).rank("U1"), Some(2));
    assert_eq!(router.leaderboard(EntityKind::User).len(), 2);
}
