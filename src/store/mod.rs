pub mod clock;
pub mod ids;

use crate::history::KeyValueStore;
use crate::models::chat::{ ChatMessage, ChatRole, ConversationState };
use crate::rag::{ AnsweringService, RagError };
use self::clock::{ Clock, SystemClock };
use self::ids::{ IdGenerator, UuidGenerator };

use log::{ debug, error, info, warn };
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{ watch, Mutex };

pub const STORAGE_KEY: &str = "rag-chat-messages";
pub const DEFAULT_TOP_K: usize = 10;
pub const NO_ANSWER_MESSAGE: &str = "No answer returned by the service.";
pub const FAILURE_MESSAGE: &str = "Unable to retrieve answer. Please try again.";

/// Ordered chat history mirrored to a key-value store, plus the single
/// outbound question flow.
///
/// Every mutation holds the messages lock across its storage write, so
/// persisted snapshots land in the same order as the in-memory changes.
/// The lock is not held while a question is in flight. The loading flag
/// lives only in the published snapshot so it can be cleared from `Drop`.
pub struct ConversationStore {
    messages: Mutex<Vec<ChatMessage>>,
    notifier: watch::Sender<ConversationState>,
    storage: Arc<dyn KeyValueStore>,
    service: Arc<dyn AnsweringService>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    storage_key: String,
    top_k: usize,
}

impl ConversationStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, service: Arc<dyn AnsweringService>) -> Self {
        let (notifier, _) = watch::channel(ConversationState::default());
        Self {
            messages: Mutex::new(Vec::new()),
            notifier,
            storage,
            service,
            ids: Arc::new(UuidGenerator),
            clock: Arc::new(SystemClock),
            storage_key: STORAGE_KEY.to_string(),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.notifier.borrow().messages.clone()
    }

    pub fn loading(&self) -> bool {
        self.notifier.borrow().loading
    }

    pub fn has_messages(&self) -> bool {
        self.notifier.borrow().has_messages()
    }

    /// Receives a new snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<ConversationState> {
        self.notifier.subscribe()
    }

    /// Loads the persisted conversation unless messages are already present.
    pub async fn init_from_storage(&self) {
        let mut messages = self.messages.lock().await;
        if !messages.is_empty() {
            debug!("Conversation already populated, skipping storage load");
            return;
        }

        *messages = self.read_messages().await;
        info!("Loaded {} message(s) from storage", messages.len());
        self.publish(&messages);
    }

    /// Appends a message with trimmed content. Blank content is dropped and
    /// `None` is returned.
    pub async fn append_message(&self, role: ChatRole, content: &str) -> Option<ChatMessage> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return None;
        }

        let mut messages = self.messages.lock().await;
        let message = ChatMessage {
            id: self.ids.next_id(),
            role,
            content: trimmed.to_string(),
            created_at: self.clock.now(),
        };
        messages.push(message.clone());
        self.persist(&messages).await;
        self.publish(&messages);
        Some(message)
    }

    pub async fn replace_messages(&self, replacement: Vec<ChatMessage>) {
        let mut messages = self.messages.lock().await;
        *messages = replacement;
        self.persist(&messages).await;
        self.publish(&messages);
    }

    pub async fn clear_conversation(&self) {
        let mut messages = self.messages.lock().await;
        messages.clear();
        self.persist(&messages).await;
        self.publish(&messages);
    }

    /// Records the question, asks the answering service and records the
    /// reply. Returns `Ok(None)` for a blank prompt without contacting the
    /// service. On failure a fallback assistant message is recorded and the
    /// service error is returned as is. `loading` is cleared even when the
    /// returned future is dropped before the service replies.
    pub async fn ask_rag(&self, prompt: &str) -> Result<Option<String>, RagError> {
        let query = prompt.trim();
        if query.is_empty() {
            return Ok(None);
        }

        self.append_message(ChatRole::User, query).await;
        let in_flight = LoadingGuard::start(&self.notifier);

        let outcome = match self.service.search(query, self.top_k).await {
            Ok(payload) => {
                let answer = resolve_answer(&payload);
                self.append_message(ChatRole::Assistant, &answer).await;
                Ok(Some(answer))
            }
            Err(e) => {
                error!("RAG request failed: {}", e);
                self.append_message(ChatRole::Assistant, FAILURE_MESSAGE).await;
                Err(e)
            }
        };

        drop(in_flight);
        outcome
    }

    fn publish(&self, messages: &[ChatMessage]) {
        self.notifier.send_modify(|state| state.messages = messages.to_vec());
    }

    async fn read_messages(&self) -> Vec<ChatMessage> {
        let raw = match self.storage.get(&self.storage_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                return Vec::new();
            }
            Err(e) => {
                warn!("Failed to read conversation '{}' from storage: {}", self.storage_key, e);
                return Vec::new();
            }
        };
        if raw.trim().is_empty() {
            return Vec::new();
        }

        let entries = match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Discarding unreadable conversation '{}' in storage: {}", self.storage_key, e);
                return Vec::new();
            }
        };

        let mut messages = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<ChatMessage>(entry) {
                Ok(msg) => messages.push(msg),
                Err(e) => {
                    warn!("Skipping unreadable message in conversation '{}': {}", self.storage_key, e);
                }
            }
        }
        messages
    }

    async fn persist(&self, messages: &[ChatMessage]) {
        let json = match serde_json::to_string(messages) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize conversation: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.set(&self.storage_key, &json).await {
            warn!("Failed to persist conversation '{}': {}", self.storage_key, e);
        }
    }
}

/// Marks the store busy for as long as it is alive.
struct LoadingGuard<'a> {
    notifier: &'a watch::Sender<ConversationState>,
}

impl<'a> LoadingGuard<'a> {
    fn start(notifier: &'a watch::Sender<ConversationState>) -> Self {
        notifier.send_modify(|state| state.loading = true);
        Self { notifier }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.notifier.send_modify(|state| state.loading = false);
    }
}

/// Picks the answer text out of a service payload, falling back when the
/// payload is not a non-blank string.
pub fn resolve_answer(payload: &Value) -> String {
    match payload.as_str().map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => NO_ANSWER_MESSAGE.to_string(),
    }
}
