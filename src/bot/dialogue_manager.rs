//! Dialogue manager: routes incoming text through global commands, menu
//! buttons and the step table, and drives recipe generation.
//!
//! Record reads and writes for one chat are serialized by a per-chat lock;
//! the completion call runs on its own task outside that lock so that cancel
//! and "processing" replies still get through.
//!
//! Telegram specifics stay in the sibling handler modules. Everything here
//! talks to the outside world through [`SessionStore`], [`RecipeGenerator`]
//! and [`Messenger`], so tests can swap in fakes.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use teloxide::types::ChatId;
use teloxide::utils::command::BotCommands;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, error, info, warn};

use crate::config::BotConfig;
use crate::diet::{check_diet_conflicts, DietCheck};
use crate::dialogue::{handler_for, ChatSession, ConversationStep, RecipeRequest, Transition};
use crate::llm_client::RecipeGenerator;
use crate::localization::{t_args_lang, t_lang};
use crate::menu::{CANCEL, CREATE_RECIPE, HELP, OUR_CHANNEL, PUBLIC_OFFER};
use crate::messenger::{Keyboard, Messenger, Reply};
use crate::session_store::SessionStore;
use crate::throttle::{ActiveRequest, GenerationThrottle, ThrottleRejection};

/// Slash commands understood in any state
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Команды бота:")]
pub enum Command {
    #[command(description = "главное меню")]
    Start,
    #[command(description = "как пользоваться ботом")]
    Help,
    #[command(description = "создать рецепт")]
    Recipe,
    #[command(description = "отменить текущий запрос")]
    Cancel,
    #[command(description = "статистика (для администраторов)")]
    Stats,
}

/// Parse a slash command, tolerating a `@botname` suffix and trailing text
pub fn parse_command(text: &str) -> Option<Command> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }

    let head = text.split_whitespace().next().unwrap_or(text);
    let head = head.split('@').next().unwrap_or(head).to_lowercase();
    Command::parse(&head, "").ok()
}

/// Text message reduced to what the dialogue needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub user_id: Option<u64>,
    pub text: String,
    pub language_code: Option<String>,
}

/// Operator switches that affect routing
#[derive(Debug, Clone, Default)]
pub struct ManagerSettings {
    pub admin_ids: HashSet<u64>,
    pub maintenance: bool,
    pub channel_link: Option<String>,
}

impl ManagerSettings {
    pub fn from_config(config: &BotConfig) -> Self {
        Self {
            admin_ids: config.admin_ids.clone(),
            maintenance: config.maintenance,
            channel_link: config.channel_link.clone(),
        }
    }
}

pub struct DialogueManager {
    store: Arc<dyn SessionStore>,
    generator: Arc<dyn RecipeGenerator>,
    messenger: Arc<dyn Messenger>,
    throttle: Arc<GenerationThrottle>,
    settings: ManagerSettings,
    /// One lock per chat; record reads and writes for a chat happen under it
    chat_locks: Mutex<HashMap<ChatId, Arc<tokio::sync::Mutex<()>>>>,
}

impl DialogueManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        generator: Arc<dyn RecipeGenerator>,
        messenger: Arc<dyn Messenger>,
        throttle: Arc<GenerationThrottle>,
        settings: ManagerSettings,
    ) -> Self {
        Self {
            store,
            generator,
            messenger,
            throttle,
            settings,
            chat_locks: Mutex::new(HashMap::new()),
        }
    }

    fn is_admin(&self, user_id: Option<u64>) -> bool {
        user_id.is_some_and(|id| self.settings.admin_ids.contains(&id))
    }

    fn blocked_by_maintenance(&self, user_id: Option<u64>) -> bool {
        self.settings.maintenance && !self.is_admin(user_id)
    }

    async fn lock_chat(&self, chat_id: ChatId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.chat_locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(chat_id).or_default())
        };
        lock.lock_owned().await
    }

    async fn send(&self, chat_id: ChatId, reply: Reply) -> Result<()> {
        self.messenger.send(chat_id, reply).await
    }

    /// Entry point for every text message
    ///
    /// Returns once the reply is sent. A submitted questionnaire only starts
    /// the completion call here; the recipe is delivered by a background task.
    pub async fn handle_message(self: &Arc<Self>, incoming: IncomingMessage) -> Result<()> {
        let chat_id = incoming.chat_id;
        let lang = incoming.language_code.as_deref();
        let text = incoming.text.trim();

        if self.blocked_by_maintenance(incoming.user_id) {
            debug!(user_id = %chat_id, "Maintenance mode, message ignored");
            return self
                .send(chat_id, Reply::text(t_lang("maintenance", lang)))
                .await;
        }

        let command = parse_command(text);
        let is_cancel = text == CANCEL || command == Some(Command::Cancel);

        let _chat = self.lock_chat(chat_id).await;

        if self.throttle.is_active(chat_id) && !is_cancel {
            debug!(user_id = %chat_id, "Generation in flight, input rejected");
            return self
                .send(chat_id, Reply::text(t_lang("processing", lang)))
                .await;
        }

        if let Some(command) = command {
            return self.handle_command(command, &incoming).await;
        }

        match text {
            CREATE_RECIPE => self.start_recipe(chat_id, lang).await,
            PUBLIC_OFFER => {
                self.send(chat_id, Reply::new(t_lang("offer", lang), Keyboard::MainMenu))
                    .await
            }
            OUR_CHANNEL => self.send_channel_link(chat_id, lang).await,
            HELP => {
                self.send(chat_id, Reply::new(t_lang("help", lang), Keyboard::MainMenu))
                    .await
            }
            CANCEL => self.cancel(chat_id, lang).await,
            _ => self.handle_step(&incoming).await,
        }
    }

    /// Non-text messages only get a hint
    pub async fn handle_non_text(&self, chat_id: ChatId, language_code: Option<&str>) -> Result<()> {
        self.send(chat_id, Reply::text(t_lang("text-only", language_code)))
            .await
    }

    async fn handle_command(self: &Arc<Self>, command: Command, incoming: &IncomingMessage) -> Result<()> {
        let chat_id = incoming.chat_id;
        let lang = incoming.language_code.as_deref();
        info!(user_id = %chat_id, command = ?command, "Command received");

        match command {
            Command::Start => {
                let session = ChatSession {
                    language_code: incoming.language_code.clone(),
                    ..ChatSession::default()
                };
                self.store.set(chat_id, session).await;
                self.send(chat_id, Reply::new(t_lang("welcome", lang), Keyboard::MainMenu))
                    .await
            }
            Command::Help => {
                self.send(chat_id, Reply::new(t_lang("help", lang), Keyboard::MainMenu))
                    .await
            }
            Command::Recipe => self.start_recipe(chat_id, lang).await,
            Command::Cancel => self.cancel(chat_id, lang).await,
            Command::Stats if self.is_admin(incoming.user_id) => {
                let sessions = self.store.len().await.to_string();
                let in_flight = self.throttle.in_flight().to_string();
                let text = t_args_lang(
                    "stats",
                    &[("sessions", sessions.as_str()), ("in_flight", in_flight.as_str())],
                    lang,
                );
                self.send(chat_id, Reply::text(text)).await
            }
            Command::Stats => {
                warn!(user_id = %chat_id, "Stats requested by non-admin");
                self.send(chat_id, Reply::new(t_lang("menu-hint", lang), Keyboard::MainMenu))
                    .await
            }
        }
    }

    async fn start_recipe(&self, chat_id: ChatId, lang: Option<&str>) -> Result<()> {
        let (session, reply) = ChatSession::start(lang.map(str::to_string));
        self.store.set(chat_id, session).await;
        debug!(user_id = %chat_id, "Questionnaire started");
        self.send(chat_id, reply).await
    }

    async fn send_channel_link(&self, chat_id: ChatId, lang: Option<&str>) -> Result<()> {
        let reply = match &self.settings.channel_link {
            Some(link) => Reply::new(
                t_lang("channel-prompt", lang),
                Keyboard::ChannelLink(link.clone()),
            ),
            None => Reply::new(t_lang("channel-missing", lang), Keyboard::MainMenu),
        };
        self.send(chat_id, reply).await
    }

    /// Drop the questionnaire and any in-flight generation; caller holds the chat lock
    async fn cancel(&self, chat_id: ChatId, lang: Option<&str>) -> Result<()> {
        let had_generation = self.throttle.cancel(chat_id);
        let language_code = match self.store.get(chat_id).await {
            Some(session) => session.language_code,
            None => lang.map(str::to_string),
        };
        self.store
            .set(
                chat_id,
                ChatSession {
                    language_code,
                    ..ChatSession::default()
                },
            )
            .await;

        info!(user_id = %chat_id, had_generation, "Dialogue cancelled");
        self.send(chat_id, Reply::new(t_lang("cancelled", lang), Keyboard::MainMenu))
            .await
    }

    async fn handle_step(self: &Arc<Self>, incoming: &IncomingMessage) -> Result<()> {
        let chat_id = incoming.chat_id;
        let mut session = self.store.get(chat_id).await.unwrap_or_default();
        if session.language_code.is_none() {
            session.language_code = incoming.language_code.clone();
        }

        let Some(handler) = handler_for(session.step) else {
            return self
                .send(
                    chat_id,
                    Reply::new(t_lang("menu-hint", session.lang()), Keyboard::MainMenu),
                )
                .await;
        };

        match handler(session, incoming.text.trim()) {
            Transition::Advance { session, reply } => {
                debug!(user_id = %chat_id, step = ?session.step, "Dialogue advanced");
                self.store.set(chat_id, session).await;
                self.send(chat_id, reply).await
            }
            Transition::Reprompt(reply) => self.send(chat_id, reply).await,
            Transition::Submit(session) => self.submit(chat_id, session).await,
        }
    }

    /// Generate again from the answers of the last finished questionnaire
    pub async fn regenerate(self: &Arc<Self>, chat_id: ChatId, user_id: Option<u64>) -> Result<()> {
        let _chat = self.lock_chat(chat_id).await;
        let session = self.store.get(chat_id).await;
        let lang = session.as_ref().and_then(|s| s.language_code.clone());

        if self.blocked_by_maintenance(user_id) {
            return self
                .send(chat_id, Reply::text(t_lang("maintenance", lang.as_deref())))
                .await;
        }
        if self.throttle.is_active(chat_id) {
            return self
                .send(chat_id, Reply::text(t_lang("processing", lang.as_deref())))
                .await;
        }

        match session {
            Some(session) if session.step == ConversationStep::Done && session.to_request().is_some() => {
                info!(user_id = %chat_id, "Regenerating recipe");
                self.submit(chat_id, session).await
            }
            _ => {
                self.send(
                    chat_id,
                    Reply::new(t_lang("nothing-to-regenerate", lang.as_deref()), Keyboard::MainMenu),
                )
                .await
            }
        }
    }

    /// Admit a finished questionnaire and start its generation in the background
    ///
    /// Caller holds the chat lock.
    async fn submit(self: &Arc<Self>, chat_id: ChatId, mut session: ChatSession) -> Result<()> {
        let lang = session.language_code.clone();
        let lang = lang.as_deref();

        let Some(request) = session.to_request() else {
            warn!(user_id = %chat_id, "Submitted record is incomplete");
            session.step = ConversationStep::Idle;
            self.store.set(chat_id, session).await;
            return self
                .send(chat_id, Reply::new(t_lang("menu-hint", lang), Keyboard::MainMenu))
                .await;
        };

        let guard = match self.throttle.begin(chat_id) {
            Ok(guard) => guard,
            Err(ThrottleRejection::Busy) => {
                return self
                    .send(chat_id, Reply::text(t_lang("processing", lang)))
                    .await;
            }
            Err(ThrottleRejection::QueueFull) => {
                warn!(user_id = %chat_id, "Generation queue is full");
                session.step = ConversationStep::Done;
                self.store.set(chat_id, session).await;
                return self
                    .send(chat_id, Reply::new(t_lang("queue-full", lang), Keyboard::MainMenu))
                    .await;
            }
        };

        let check = check_diet_conflicts(
            &request.ingredients,
            &request.diet_type,
            request.allergies.as_deref(),
        );
        if let Err(e) = self.send_generation_notice(chat_id, &check, lang).await {
            session.step = ConversationStep::Done;
            self.store.set(chat_id, session).await;
            return Err(e);
        }

        let manager = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = manager.run_generation(guard, session, request).await {
                error!(user_id = %chat_id, error = %e, "Failed to deliver recipe");
            }
        });
        Ok(())
    }

    async fn send_generation_notice(
        &self,
        chat_id: ChatId,
        check: &DietCheck,
        lang: Option<&str>,
    ) -> Result<()> {
        if check.has_conflicts() {
            self.send(chat_id, Reply::text(diet_warning(check, lang)))
                .await?;
        }
        self.send(chat_id, Reply::new(t_lang("generating", lang), Keyboard::CancelOnly))
            .await
    }

    /// Call the model, then record `Done` and deliver the result unless cancelled
    async fn run_generation(
        &self,
        guard: ActiveRequest,
        mut session: ChatSession,
        request: RecipeRequest,
    ) -> Result<()> {
        let chat_id = guard.chat_id();
        let lang = session.language_code.clone();
        let lang = lang.as_deref();

        let outcome = self.throttle.run(self.generator.generate(&request)).await;

        {
            let _chat = self.lock_chat(chat_id).await;
            if guard.is_cancelled() {
                info!(user_id = %chat_id, "Generation was cancelled, result discarded");
                return Ok(());
            }
            session.step = ConversationStep::Done;
            self.store.set(chat_id, session).await;
        }

        match outcome {
            Ok(recipe) => {
                info!(user_id = %chat_id, recipe_chars = recipe.chars().count(), "Recipe delivered");
                self.send(chat_id, Reply::new(recipe, Keyboard::RecipeActions))
                    .await?;
            }
            Err(e) => {
                error!(user_id = %chat_id, error = %e, "Recipe generation failed");
                self.send(chat_id, Reply::text(t_lang("recipe-failed", lang)))
                    .await?;
            }
        }

        self.send(chat_id, Reply::new(t_lang("recipe-next", lang), Keyboard::MainMenu))
            .await?;
        drop(guard);
        Ok(())
    }
}

/// Advisory message listing conflicting ingredients and suggested swaps
pub fn diet_warning(check: &DietCheck, lang: Option<&str>) -> String {
    let mut lines = vec![t_lang("diet-conflicts-title", lang)];
    lines.extend(check.conflicts.iter().map(|item| format!("• {item}")));

    let note = check.replacement_note();
    if !note.is_empty() {
        lines.push(String::new());
        lines.push(t_lang("diet-replacements-title", lang));
        lines.push(note);
    }

    lines.push(String::new());
    lines.push(t_lang("diet-conflicts-advice", lang));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_variants() {
        assert_eq!(parse_command("/start"), Some(Command::Start));
        assert_eq!(parse_command("/start@ai_kitchen_bot"), Some(Command::Start));
        assert_eq!(parse_command("/Recipe"), Some(Command::Recipe));
        assert_eq!(parse_command("/start ref123"), Some(Command::Start));
        assert_eq!(parse_command("/unknown"), None);
        assert_eq!(parse_command("start"), None);
    }
}
