//! Shared fixtures for the integration tests
//!
//! Recording stand-ins for every outbound platform call, plus a tracing
//! layer that keeps emitted log events for assertions.

#![allow(dead_code)]

use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::Interaction;
use twilight_util::builder::command::CommandBuilder;
use uno_bot::commands::{self, CommandHandler, ExecutionContext, HandlerResult};
use uno_bot::error::BotError;
use uno_bot::events::{BotEvent, InteractionEvent};
use uno_bot::gateway::{CommandRegistrar, PresenceSink};
use uno_bot::lifecycle::{CommandRegistration, EventHandlers};
use uno_bot::router::CommandRouter;
use uno_bot::services::{InteractionResponder, Services};
use uno_bot::shard::ShardState;
use uno_bot::stats::StatsReporter;
use uno_bot::status::StatusAggregator;

// ---------------------------------------------------------------------------
// Platform stand-ins
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingPresence {
    statuses: Mutex<Vec<String>>,
}

impl RecordingPresence {
    pub fn last(&self) -> Option<String> {
        self.statuses.lock().unwrap().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.statuses.lock().unwrap().len()
    }
}

#[async_trait]
impl PresenceSink for RecordingPresence {
    async fn set_presence(&self, status: &str) -> Result<(), BotError> {
        self.statuses.lock().unwrap().push(status.to_string());
        Ok(())
    }
}

/// Registrar whose calls take a little while, so concurrent callers overlap
#[derive(Default)]
pub struct RecordingRegistrar {
    global: AtomicUsize,
    guilds: Mutex<Vec<u64>>,
    fail_next_global: AtomicBool,
    fail_next_guild: AtomicBool,
}

impl RecordingRegistrar {
    pub fn failing_once() -> Self {
        let registrar = Self::default();
        registrar.fail_next_global.store(true, Ordering::SeqCst);
        registrar
    }

    pub fn failing_guild_once() -> Self {
        let registrar = Self::default();
        registrar.fail_next_guild.store(true, Ordering::SeqCst);
        registrar
    }

    pub fn global_calls(&self) -> usize {
        self.global.load(Ordering::SeqCst)
    }

    pub fn guild_calls(&self) -> Vec<u64> {
        self.guilds.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRegistrar for RecordingRegistrar {
    async fn register_globally(&self, _commands: &[Command]) -> Result<(), BotError> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        if self.fail_next_global.swap(false, Ordering::SeqCst) {
            return Err(BotError::Registration {
                scope: "global".to_string(),
                source: "rate limited".into(),
            });
        }
        self.global.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn register_to_guild(
        &self,
        guild_id: u64,
        _commands: &[Command],
    ) -> Result<(), BotError> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        if self.fail_next_guild.swap(false, Ordering::SeqCst) {
            return Err(BotError::Registration {
                scope: format!("guild:{guild_id}"),
                source: "missing access".into(),
            });
        }
        self.guilds.lock().unwrap().push(guild_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    counts: Mutex<Vec<u64>>,
    fail: bool,
}

impl RecordingReporter {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn counts(&self) -> Vec<u64> {
        self.counts.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatsReporter for RecordingReporter {
    async fn update_server_count(&self, server_count: u64) -> Result<(), BotError> {
        self.counts.lock().unwrap().push(server_count);
        if self.fail {
            return Err(BotError::StatsUpdate {
                count: server_count,
                source: "service unavailable".into(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingResponder {
    replies: Mutex<Vec<(u64, String)>>,
}

impl RecordingResponder {
    pub fn replies(&self) -> Vec<(u64, String)> {
        self.replies.lock().unwrap().clone()
    }
}

#[async_trait]
impl InteractionResponder for RecordingResponder {
    async fn reply(&self, interaction: &Interaction, content: &str) -> Result<(), BotError> {
        self.replies
            .lock()
            .unwrap()
            .push((interaction.id.get(), content.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

/// Always returns an error
pub struct Explode;

#[async_trait]
impl CommandHandler for Explode {
    fn name(&self) -> &str {
        "explode"
    }

    fn definition(&self) -> Command {
        CommandBuilder::new("explode", "Always fails", CommandType::ChatInput).build()
    }

    async fn execute(&self, _ctx: &ExecutionContext, _services: &Services) -> HandlerResult {
        Err("card deck is empty".into())
    }
}

/// Indexes past the end of an empty hand
pub struct Discard;

#[async_trait]
impl CommandHandler for Discard {
    fn name(&self) -> &str {
        "discard"
    }

    fn definition(&self) -> Command {
        CommandBuilder::new("discard", "Discards a card", CommandType::ChatInput).build()
    }

    async fn execute(&self, _ctx: &ExecutionContext, _services: &Services) -> HandlerResult {
        let hand: Vec<u32> = Vec::new();
        let card = hand[3];
        Err(format!("discarded {card}").into())
    }
}

/// Records who invoked it and from which channel
#[derive(Default)]
pub struct Whoami {
    seen: Mutex<Vec<(Option<u64>, Option<u64>)>>,
}

impl Whoami {
    pub fn seen(&self) -> Vec<(Option<u64>, Option<u64>)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandHandler for Whoami {
    fn name(&self) -> &str {
        "whoami"
    }

    fn definition(&self) -> Command {
        CommandBuilder::new("whoami", "Shows the caller", CommandType::ChatInput).build()
    }

    async fn execute(&self, ctx: &ExecutionContext, _services: &Services) -> HandlerResult {
        let author = ctx.interaction.author_id().map(|id| id.get());
        let channel = ctx.interaction.channel.as_ref().map(|channel| channel.id.get());
        self.seen.lock().unwrap().push((author, channel));
        Ok(())
    }
}

/// Sleeps, then counts the call
#[derive(Default)]
pub struct Slow {
    calls: AtomicUsize,
}

impl Slow {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommandHandler for Slow {
    fn name(&self) -> &str {
        "slow"
    }

    fn definition(&self) -> Command {
        CommandBuilder::new("slow", "Takes its time", CommandType::ChatInput).build()
    }

    async fn execute(&self, _ctx: &ExecutionContext, _services: &Services) -> HandlerResult {
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Slash-command interaction as the gateway delivers it
pub fn command_interaction(interaction_id: u64, command: &str) -> Interaction {
    serde_json::from_value(serde_json::json!({
        "id": interaction_id.to_string(),
        "application_id": "1",
        "type": 2,
        "token": format!("token-{interaction_id}"),
        "guild_id": "10",
        "channel": { "id": "20", "type": 0 },
        "member": {
            "deaf": false,
            "flags": 0,
            "mute": false,
            "joined_at": null,
            "roles": [],
            "user": { "id": "30", "username": "player", "discriminator": "0", "avatar": null },
        },
        "authorizing_integration_owners": {},
        "data": { "id": "40", "name": command, "type": 1 },
    }))
    .expect("valid interaction payload")
}

pub fn interaction(shard_id: u64, interaction_id: u64, command: &str) -> BotEvent {
    BotEvent::InteractionReceived(Box::new(InteractionEvent::new(
        shard_id,
        command_interaction(interaction_id, command),
    )))
}

pub fn ready(shard_id: u64, guild_ids: &[u64]) -> BotEvent {
    BotEvent::ShardReady {
        shard_id,
        guild_ids: guild_ids.to_vec(),
    }
}

pub fn joined(shard_id: u64, guild_id: u64) -> BotEvent {
    BotEvent::GuildJoined { shard_id, guild_id }
}

pub fn left(shard_id: u64, guild_id: u64) -> BotEvent {
    BotEvent::GuildLeft { shard_id, guild_id }
}

// ---------------------------------------------------------------------------
// Runtime harness
// ---------------------------------------------------------------------------

pub struct HarnessOptions {
    pub total_shards: u64,
    pub debug_guild: Option<u64>,
    pub with_reporter: bool,
    pub reporter: Arc<RecordingReporter>,
    pub registrar: Arc<RecordingRegistrar>,
    pub extra_commands: Vec<Arc<dyn CommandHandler>>,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            total_shards: 1,
            debug_guild: None,
            with_reporter: false,
            reporter: Arc::new(RecordingReporter::default()),
            registrar: Arc::new(RecordingRegistrar::default()),
            extra_commands: Vec::new(),
        }
    }
}

/// Event handling wired to recording stand-ins, without a gateway
pub struct Harness {
    pub state: ShardState,
    pub presence: Arc<RecordingPresence>,
    pub registrar: Arc<RecordingRegistrar>,
    pub reporter: Arc<RecordingReporter>,
    pub responder: Arc<RecordingResponder>,
    pub handlers: Arc<EventHandlers>,
}

impl Harness {
    pub fn new(options: HarnessOptions) -> Self {
        let state = ShardState::new(0..options.total_shards);
        let presence = Arc::new(RecordingPresence::default());
        let reporter = options.reporter;
        let responder = Arc::new(RecordingResponder::default());

        let mut router = CommandRouter::new(Services::new(responder.clone()));
        commands::register_all(&mut router).unwrap();
        for handler in options.extra_commands {
            router.register(handler).unwrap();
        }
        let router = Arc::new(router);

        let status = Arc::new(StatusAggregator::new(
            state.clone(),
            presence.clone(),
            options
                .with_reporter
                .then(|| reporter.clone() as Arc<dyn StatsReporter>),
            options.debug_guild.is_some(),
        ));
        let registration = Arc::new(CommandRegistration::new(
            options.registrar.clone(),
            router.definitions(),
            options.debug_guild,
        ));

        Self {
            state,
            presence,
            registrar: options.registrar,
            reporter,
            responder,
            handlers: Arc::new(EventHandlers::new(router, status, registration)),
        }
    }

    /// Feed an event the way a shard loop does: update membership, then
    /// run the subscribers if anything changed.
    pub async fn deliver(&self, event: BotEvent) {
        if self.state.apply(&event) {
            self.handlers.handle(event).await;
        }
    }
}

// ---------------------------------------------------------------------------
// Log capture
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
}

/// Tracing layer keeping every event it sees
#[derive(Clone, Default)]
pub struct LogCapture {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl LogCapture {
    /// Capture events on the current thread until the guard is dropped
    pub fn install(&self) -> DefaultGuard {
        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
    }

    pub fn count(&self, level: Level) -> usize {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|record| record.level == level)
            .count()
    }

    pub fn contains(&self, level: Level, message: &str) -> bool {
        self.records
            .lock()
            .unwrap()
            .iter()
            .any(|record| record.level == level && record.message.contains(message))
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.records.lock().unwrap().push(LogRecord {
            level: *event.metadata().level(),
            message: visitor.message,
        });
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}
