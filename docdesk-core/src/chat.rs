//! Conversation state for the chat view.
//!
//! A turn moves `Idle -> AwaitingResponse -> Settling -> Idle`. The user
//! message is appended synchronously when the turn starts; the bot message
//! (a reply or an error description) is appended on settlement; the typing
//! indicator stays up for a short settle delay afterwards. No new turn can
//! start until the previous one is back to `Idle`.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{slot_message, ValidationError};
use crate::events::{EventSink, ProgressTag, WorkspaceEvent};
use crate::progress::{ProgressProfile, ProgressSimulator, ProgressTicker};
use crate::service::{ChatRequest, DocumentService};
use crate::types::{ChatMessage, DocumentId, Sender, TurnId};

pub const GENERIC_CHAT_ERROR: &str = "An unknown error occurred.";
pub const EMPTY_REPLY_ERROR: &str = "Failed to respond.";

/// How long the typing indicator lingers at 100% after a reply.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(300);

/// Prompts offered once a conversation exists.
pub const QUICK_PROMPTS: [&str; 2] = [
    "Summarize our conversation so far",
    "What are the key takeaways from this analysis?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    AwaitingResponse,
    Settling,
}

/// What a turn needs to know about the rest of the workspace.
#[derive(Debug, Clone, Copy)]
pub struct ChatContext<'a> {
    pub analysis_ready: bool,
    pub document_ids: &'a [DocumentId],
}

pub struct ChatController {
    service: Arc<dyn DocumentService>,
    sink: EventSink,
    history: Vec<ChatMessage>,
    turn: TurnId,
    phase: TurnPhase,
    progress: ProgressSimulator,
    ticker: Option<ProgressTicker>,
    settle_delay: Duration,
}

impl ChatController {
    pub fn new(service: Arc<dyn DocumentService>, sink: EventSink) -> Self {
        Self {
            service,
            sink,
            history: Vec::new(),
            turn: TurnId::default(),
            phase: TurnPhase::Idle,
            progress: ProgressSimulator::new(ProgressProfile::CHAT),
            ticker: None,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn is_bot_typing(&self) -> bool {
        self.phase != TurnPhase::Idle
    }

    pub fn progress(&self) -> u8 {
        self.progress.value()
    }

    /// Sends `text` as a new user turn.
    ///
    /// # Errors
    ///
    /// Refuses blank input, a send while a turn is still open, and sends
    /// before an analysis result exists. History is unchanged on refusal.
    pub fn send_message(&mut self, text: &str, ctx: ChatContext<'_>) -> Result<TurnId, ValidationError> {
        let question = text.trim();
        if question.is_empty() {
            return Err(ValidationError::BlankInput);
        }
        self.check_ready(ctx)?;

        self.history.push(ChatMessage::user(question));
        Ok(self.dispatch(question.to_owned(), ctx.document_ids))
    }

    /// Drops the last bot reply and asks the last user question again.
    ///
    /// The last bot message is found by scanning for the last message sent
    /// by the bot; everything from there on is removed. With a single open
    /// turn at a time (enforced by the guards) that is exactly the reply to
    /// the last question. The question is not appended a second time when
    /// the truncated history already ends with it.
    ///
    /// # Errors
    ///
    /// Same guards as [`Self::send_message`], plus
    /// [`ValidationError::NothingToRegenerate`] without a user message.
    pub fn regenerate_last_response(&mut self, ctx: ChatContext<'_>) -> Result<TurnId, ValidationError> {
        self.check_ready(ctx)?;
        let question = self
            .history
            .iter()
            .rev()
            .find(|m| m.sender == Sender::User)
            .map(|m| m.text.clone())
            .ok_or(ValidationError::NothingToRegenerate)?;

        if let Some(last_bot) = self.history.iter().rposition(|m| m.sender == Sender::Bot) {
            self.history.truncate(last_bot);
        }
        let ends_with_question = self
            .history
            .last()
            .is_some_and(|m| m.sender == Sender::User && m.text == question);
        if !ends_with_question {
            self.history.push(ChatMessage::user(question.clone()));
        }
        Ok(self.dispatch(question, ctx.document_ids))
    }

    /// Empties the conversation. Callers confirm with the user first.
    pub fn clear_history(&mut self) {
        tracing::info!(messages = self.history.len(), "clearing chat history");
        self.history.clear();
    }

    /// Messages whose text contains `query`, ignoring case. Empty query matches all.
    pub fn search(&self, query: &str) -> Vec<&ChatMessage> {
        let needle = query.to_lowercase();
        self.history
            .iter()
            .filter(|m| m.text.to_lowercase().contains(&needle))
            .collect()
    }

    /// Forgets the conversation and any open turn. Used when a new analysis run starts.
    pub fn reset(&mut self) {
        self.history.clear();
        self.turn = self.turn.next();
        self.phase = TurnPhase::Idle;
        self.stop_ticker();
        self.progress.reset();
    }

    pub fn on_tick(&mut self, turn: TurnId) {
        if turn == self.turn && self.phase == TurnPhase::AwaitingResponse {
            self.progress.tick();
        }
    }

    pub fn on_settled(&mut self, turn: TurnId, outcome: Result<String, String>) {
        if turn != self.turn || self.phase != TurnPhase::AwaitingResponse {
            tracing::debug!(turn = turn.0, current = self.turn.0, "discarding stale chat reply");
            return;
        }
        self.stop_ticker();
        self.progress.complete();
        self.phase = TurnPhase::Settling;
        let message = match outcome {
            Ok(text) => ChatMessage::bot(text),
            Err(error) => {
                tracing::warn!(turn = turn.0, %error, "chat turn failed");
                ChatMessage::bot_error(&error)
            }
        };
        self.history.push(message);
    }

    pub fn on_settle_elapsed(&mut self, turn: TurnId) {
        if turn == self.turn && self.phase == TurnPhase::Settling {
            self.phase = TurnPhase::Idle;
            self.progress.reset();
        }
    }

    fn check_ready(&self, ctx: ChatContext<'_>) -> Result<(), ValidationError> {
        if self.is_bot_typing() {
            return Err(ValidationError::TurnInFlight);
        }
        if !ctx.analysis_ready {
            return Err(ValidationError::NoAnalysis);
        }
        Ok(())
    }

    fn dispatch(&mut self, question: String, document_ids: &[DocumentId]) -> TurnId {
        self.turn = self.turn.next();
        let turn = self.turn;
        self.phase = TurnPhase::AwaitingResponse;
        self.progress.reset();
        self.stop_ticker();
        self.ticker = Some(ProgressTicker::start(
            ProgressProfile::CHAT,
            ProgressTag::Chat(turn),
            self.sink.clone(),
        ));

        let history = serde_json::to_string(&self.history).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not encode chat history");
            "[]".to_owned()
        });
        let request = ChatRequest {
            document_ids: document_ids.to_vec(),
            history,
            question,
        };
        tracing::debug!(turn = turn.0, "sending chat turn");

        let service = Arc::clone(&self.service);
        let sink = self.sink.clone();
        let settle_delay = self.settle_delay;
        tokio::spawn(async move {
            let outcome = match service.chat(request).await {
                Ok(reply) => reply
                    .text
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| EMPTY_REPLY_ERROR.to_owned()),
                Err(e) => Err(slot_message(&e, GENERIC_CHAT_ERROR)),
            };
            if !sink.emit(WorkspaceEvent::ChatSettled { turn, outcome }) {
                return;
            }
            tokio::time::sleep(settle_delay).await;
            sink.emit(WorkspaceEvent::ChatSettleElapsed { turn });
        });
        turn
    }

    fn stop_ticker(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.stop();
        }
    }
}
