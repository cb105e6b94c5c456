// Command grammar: recognizes the `psychopass` chat commands.
//
//   psychopass                          score of the current channel
//   psychopass @user | <@U123>          score of a user
//   psychopass #channel | <#C123|name>  score of a channel
//   psychopass help
//   psychopass leaderboard users|channels
//
// A mention is either fully bracketed or bare: `<@alice` and `@alice>` are
// not mentions. The keyword is case-insensitive and must be followed by whitespace or the
// end of the message. Anything after the recognized arguments is ignored.
// Text that fits none of the forms is not a command.

use std::sync::OnceLock;

use regex_lite::Regex;

use crate::db::models::EntityKind;

static KEYWORD: OnceLock<Regex> = OnceLock::new();
static USER_MENTION: OnceLock<Regex> = OnceLock::new();
static CHANNEL_MENTION: OnceLock<Regex> = OnceLock::new();

fn keyword() -> &'static Regex {
    KEYWORD.get_or_init(|| {
        Regex::new(r"(?is)^\s*psychopass(?:\s+(.*))?$").expect("keyword pattern is valid")
    })
}

fn user_mention() -> &'static Regex {
    USER_MENTION.get_or_init(|| {
        Regex::new(r"^(?:<@([A-Za-z0-9._-]+)(?:\|[^>]*)?>|@([A-Za-z0-9._-]+))$")
            .expect("user pattern is valid")
    })
}

fn channel_mention() -> &'static Regex {
    CHANNEL_MENTION.get_or_init(|| {
        Regex::new(r"^(?:<#([A-Za-z0-9._-]+)(?:\|[^>]*)?>|#([A-Za-z0-9._-]+))$")
            .expect("channel pattern is valid")
    })
}

/// A recognized on-demand command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Score of the channel the command was sent in.
    CurrentChannel,
    /// Score of the user with this id.
    User(String),
    /// Score of the channel with this id.
    Channel(String),
    Help,
    Leaderboard(EntityKind),
}

/// Parse message text into at most one command.
pub fn parse(text: &str) -> Option<Command> {
    let caps = keyword().captures(text)?;
    let rest = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let mut args = rest.split_whitespace();

    let Some(first) = args.next() else {
        return Some(Command::CurrentChannel);
    };

    if first.eq_ignore_ascii_case("help") {
        return Some(Command::Help);
    }

    if first.eq_ignore_ascii_case("leaderboard") {
        return match args.next() {
            Some(kind) if kind.eq_ignore_ascii_case("users") => {
                Some(Command::Leaderboard(EntityKind::User))
            }
            Some(kind) if kind.eq_ignore_ascii_case("channels") => {
                Some(Command::Leaderboard(EntityKind::Channel))
            }
            _ => None,
        };
    }

    if let Some(id) = mention_id(user_mention(), first) {
        return Some(Command::User(id));
    }
    if let Some(id) = mention_id(channel_mention(), first) {
        return Some(Command::Channel(id));
    }

    None
}

/// Id captured by either the bracketed or the bare alternative.
fn mention_id(pattern: &Regex, token: &str) -> Option<String> {
    let caps = pattern.captures(token)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}
