// Live session: the engine wired to storage, the lookup provider, and an
// outbox of messages to post.
//
// Each inbound message is handled synchronously by the router, which
// commits every state change (scores, leaderboards, cooldown) before this
// module sees the responses. Text responses go straight to the outbox.
// Mitigation notices are handed to a spawned task that performs the lookup
// and posts when it finishes, so a slow provider never holds up the next
// message. Score write-back happens after dispatch; a storage failure is
// logged and does not stop the session.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::db::models::EntityKind;
use crate::db::Database;
use crate::mitigation::lookup::{resolve_mitigation, ImageLookup};
use crate::router::responses::{OutgoingMessage, Response};
use crate::router::{InboundMessage, MessageRouter};
use crate::scoring::policy::Score;

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub messages: usize,
    pub skipped: usize,
    pub responses: usize,
    pub mitigations: usize,
}

/// What bootstrap loaded from the directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapStats {
    pub users: usize,
    pub channels: usize,
    pub names: usize,
}

pub struct Session {
    router: MessageRouter,
    db: Arc<dyn Database>,
    lookup: Arc<dyn ImageLookup>,
    lookup_query: String,
    lookup_timeout: Duration,
}

impl Session {
    pub fn new(
        router: MessageRouter,
        db: Arc<dyn Database>,
        lookup: Arc<dyn ImageLookup>,
        lookup_query: &str,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            router,
            db,
            lookup,
            lookup_query: lookup_query.to_string(),
            lookup_timeout,
        }
    }

    pub fn router(&self) -> &MessageRouter {
        &self.router
    }

    /// Seed leaderboards and display names from the directory.
    pub async fn bootstrap(&mut self) -> Result<BootstrapStats> {
        let mut stats = BootstrapStats::default();

        for kind in [EntityKind::User, EntityKind::Channel] {
            for (id, name) in self
                .db
                .load_names(kind)
                .await
                .with_context(|| format!("Failed to load {kind} names"))?
            {
                self.router.register_name(kind, &id, &name);
                stats.names += 1;
            }

            let seeds = self
                .db
                .load_seeds(kind)
                .await
                .with_context(|| format!("Failed to load {kind} scores"))?;
            for (id, score) in &seeds {
                self.router.seed(kind, id, Score(*score));
            }
            match kind {
                EntityKind::User => stats.users = seeds.len(),
                EntityKind::Channel => stats.channels = seeds.len(),
            }
        }

        info!(
            users = stats.users,
            channels = stats.channels,
            names = stats.names,
            "Bootstrapped leaderboards from directory"
        );
        Ok(stats)
    }

    /// Handle one message: update the engine, dispatch responses, persist.
    ///
    /// Returns (responses produced, how many of them were mitigations).
    pub async fn handle(
        &mut self,
        msg: &InboundMessage,
        outbox: &UnboundedSender<OutgoingMessage>,
    ) -> (usize, usize) {
        let responses = self.router.handle(msg);
        let total = responses.len();
        let mut mitigations = 0;

        for response in responses {
            match response {
                Response::Text { channel, text } => {
                    if outbox.send(OutgoingMessage { channel, text }).is_err() {
                        debug!("Outbox closed, dropping response");
                    }
                }
                Response::Mitigation(notice) => {
                    mitigations += 1;
                    let lookup = Arc::clone(&self.lookup);
                    let outbox = outbox.clone();
                    let query = self.lookup_query.clone();
                    let timeout = self.lookup_timeout;
                    tokio::spawn(async move {
                        let text =
                            resolve_mitigation(lookup.as_ref(), &notice, &query, timeout).await;
                        let _ = outbox.send(OutgoingMessage {
                            channel: notice.channel,
                            text,
                        });
                    });
                }
            }
        }

        if msg.public {
            if let Err(e) = self.persist(msg).await {
                warn!(error = %e, channel = %msg.channel, user = %msg.user, "Failed to save scores");
            }
        }

        (total, mitigations)
    }

    /// Read JSON-lines messages from `input` until EOF.
    ///
    /// Lines that don't parse are logged and skipped.
    pub async fn run<R>(
        &mut self,
        input: R,
        outbox: UnboundedSender<OutgoingMessage>,
    ) -> Result<RunStats>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut stats = RunStats::default();
        let mut lines = input.lines();

        while let Some(line) = lines.next_line().await.context("Failed to read input")? {
            if line.trim().is_empty() {
                continue;
            }
            let msg: InboundMessage = match serde_json::from_str(&line) {
                Ok(msg) => msg,
                Err(e) => {
                    warn!(error = %e, "Skipping malformed message line");
                    stats.skipped += 1;
                    continue;
                }
            };

            let (responses, mitigations) = self.handle(&msg, &outbox).await;
            stats.messages += 1;
            stats.responses += responses;
            stats.mitigations += mitigations;
        }

        info!(
            messages = stats.messages,
            skipped = stats.skipped,
            mitigations = stats.mitigations,
            "Input closed"
        );
        Ok(stats)
    }

    /// Write back names and the scores the engine owns for this message.
    async fn persist(&self, msg: &InboundMessage) -> Result<()> {
        let entities = [
            (EntityKind::Channel, &msg.channel, &msg.channel_name),
            (EntityKind::User, &msg.user, &msg.user_name),
        ];
        for (kind, id, name) in entities {
            if let Some(name) = name {
                self.db.upsert_entity(kind, id, name).await?;
            }
            if let Some(score) = self.router.score(kind, id) {
                self.db.save_score(kind, id, score.value()).await?;
            }
        }
        Ok(())
    }
}
