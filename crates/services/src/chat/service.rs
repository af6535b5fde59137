use crate::{
    chat::{
        errors::ChatError,
        models::{
            AccumulatedAnswer, Chat, ChatId, ChatRequest, ChatStreamEvent, NewMessage, SearchMode,
        },
        ports::{ChatEventStream, ChatRepository, ChatServiceTrait},
    },
    inference_provider_pool::{InferenceProviderPool, ResolvedProvider},
    search::SearchAugmentor,
    templates::TemplateRepository,
    usage::{UsageKind, UsageService},
    UserId,
};
use async_trait::async_trait;
use futures::{channel::mpsc, SinkExt, StreamExt};
use inference_providers::{
    classify_stream, prompt::DEFAULT_SYSTEM_PROMPT, ByteStream, ChatMessage, CompletionError,
    FrameDecoder, GenerationRequest, MessageRole, SearchResult,
};
use std::sync::Arc;

/// Characters of the first message used as a new conversation's title
pub const TITLE_MAX_CHARS: usize = 50;

const DEFAULT_EVENT_BUFFER: usize = 32;

/// Model label of answer-engine turns in the usage log
pub const ANSWER_ENGINE_MODEL: &str = "answer-engine";

#[derive(Debug, Clone)]
pub struct ChatSettings {
    /// Used when the request carries no system prompt
    pub default_system_prompt: Option<String>,
    /// Capacity of the outbound event channel of one request
    pub event_buffer: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            default_system_prompt: None,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl From<&config::ChatConfig> for ChatSettings {
    fn from(config: &config::ChatConfig) -> Self {
        Self {
            default_system_prompt: config.default_system_prompt.clone(),
            event_buffer: config.event_buffer.max(1),
        }
    }
}

/// Title for a new conversation: the first characters of its first message
pub fn conversation_title(message: &str) -> String {
    let message = message.trim();
    let mut title: String = message.chars().take(TITLE_MAX_CHARS).collect();
    if message.chars().count() > TITLE_MAX_CHARS {
        title.push_str("...");
    }
    title
}

/// System prompt template sent to the provider.
///
/// The client's date and time, when known, is put in front of the template
/// separated by a blank line.
pub fn compose_system_prompt(date_time: Option<&str>, template: Option<&str>) -> Option<String> {
    let template = template.map(str::trim).filter(|t| !t.is_empty());
    match date_time.map(str::trim).filter(|d| !d.is_empty()) {
        Some(date_time) => Some(format!(
            "Current date and time: {date_time}\n\n{}",
            template.unwrap_or(DEFAULT_SYSTEM_PROMPT)
        )),
        None => template.map(str::to_string),
    }
}

/// The receiving side of the event channel was dropped
#[derive(Debug)]
struct ClientDisconnected;

/// Sending half of one response stream
struct EventSink {
    tx: mpsc::Sender<ChatStreamEvent>,
}

impl EventSink {
    async fn emit(&mut self, event: ChatStreamEvent) -> Result<(), ClientDisconnected> {
        self.tx.send(event).await.map_err(|_| ClientDisconnected)
    }

    /// Report a failure in-band and close the stream
    async fn fail(&mut self, message: String) -> Result<(), ClientDisconnected> {
        self.emit(ChatStreamEvent::error(message)).await?;
        self.emit(ChatStreamEvent::done()).await
    }
}

/// Everything the generation task needs once the request has been accepted
struct Generation {
    chat_id: ChatId,
    user_id: UserId,
    provider: String,
    model: String,
    body: ByteStream,
    decoder: FrameDecoder,
    sources: Option<Vec<SearchResult>>,
    search_usage_remaining: Option<i64>,
}

pub struct ChatServiceImpl {
    chat_repository: Arc<dyn ChatRepository>,
    template_repository: Arc<dyn TemplateRepository>,
    providers: Arc<InferenceProviderPool>,
    search: Arc<SearchAugmentor>,
    usage: Arc<UsageService>,
    settings: ChatSettings,
}

impl ChatServiceImpl {
    pub fn new(
        chat_repository: Arc<dyn ChatRepository>,
        template_repository: Arc<dyn TemplateRepository>,
        providers: Arc<InferenceProviderPool>,
        search: Arc<SearchAugmentor>,
        usage: Arc<UsageService>,
        settings: ChatSettings,
    ) -> Self {
        Self {
            chat_repository,
            template_repository,
            providers,
            search,
            usage,
            settings,
        }
    }

    /// System prompt template of the turn: the request's own text, else the
    /// named saved template, else the configured default
    async fn resolve_template(&self, request: &ChatRequest) -> Result<Option<String>, ChatError> {
        if let Some(prompt) = request
            .system_prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
        {
            return Ok(Some(prompt.to_string()));
        }

        if let Some(template_id) = request.template_id {
            let template = self
                .template_repository
                .get_template(template_id)
                .await
                .map_err(|e| ChatError::Internal(format!("Failed to load template: {e}")))?;
            return template
                .filter(|t| t.user_id == request.user_id)
                .map(|t| Some(t.content))
                .ok_or_else(|| ChatError::NotFound("Template not found".to_string()));
        }

        Ok(self.settings.default_system_prompt.clone())
    }

    /// Continue an existing conversation of the user or start a new one
    async fn resolve_chat(
        &self,
        user_id: &UserId,
        conversation_id: Option<ChatId>,
        message: &str,
    ) -> Result<Chat, ChatError> {
        match conversation_id {
            Some(id) => {
                let chat = self
                    .chat_repository
                    .get_chat(id)
                    .await
                    .map_err(|e| ChatError::Internal(format!("Failed to load chat: {e}")))?;
                chat.filter(|c| &c.user_id == user_id)
                    .ok_or_else(|| ChatError::NotFound("Chat not found".to_string()))
            }
            None => {
                let chat = self
                    .chat_repository
                    .create_chat(user_id, &conversation_title(message))
                    .await
                    .map_err(|e| ChatError::Internal(format!("Failed to create chat: {e}")))?;
                tracing::info!(conversation_id = %chat.id, user_id = %user_id, "Created chat");
                Ok(chat)
            }
        }
    }

    async fn load_history(&self, chat_id: ChatId) -> Result<Vec<ChatMessage>, ChatError> {
        let messages = self
            .chat_repository
            .list_messages(chat_id)
            .await
            .map_err(|e| ChatError::Internal(format!("Failed to load messages: {e}")))?;

        Ok(messages
            .into_iter()
            .filter(|m| m.role != MessageRole::System)
            .map(ChatMessage::from)
            .collect())
    }

    fn resolve_provider(&self, identifier: Option<&str>) -> Result<(ResolvedProvider, String), ChatError> {
        let resolved = self.providers.resolve(identifier)?;
        let api_key = resolved.api_key.clone().ok_or_else(|| {
            ChatError::from(CompletionError::MissingCredential(
                resolved.kind.to_string(),
            ))
        })?;
        Ok((resolved, api_key))
    }

    fn spawn<F>(&self, task: impl FnOnce(EventSink) -> F) -> ChatEventStream
    where
        F: std::future::Future<Output = Result<(), ClientDisconnected>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(self.settings.event_buffer.max(1));
        let run = task(EventSink { tx });
        tokio::spawn(async move {
            if run.await.is_err() {
                tracing::info!("Client disconnected, response stream abandoned");
            }
        });
        Box::pin(rx)
    }
}

#[async_trait]
impl ChatServiceTrait for ChatServiceImpl {
    async fn stream_chat(&self, request: ChatRequest) -> Result<ChatEventStream, ChatError> {
        if request.message.trim().is_empty() {
            return Err(ChatError::Validation("Message is required".to_string()));
        }

        // Provider and template problems surface before anything is persisted
        let provider = match request.search_mode {
            SearchMode::AnswerEngine => None,
            _ => {
                let (resolved, api_key) = self.resolve_provider(request.provider.as_deref())?;
                let model = request
                    .model
                    .as_deref()
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| resolved.provider.default_model())
                    .to_string();
                Some((resolved, api_key, model))
            }
        };
        let template = match provider {
            Some(_) => self.resolve_template(&request).await?,
            None => None,
        };

        let chat = self
            .resolve_chat(&request.user_id, request.conversation_id, &request.message)
            .await?;

        self.chat_repository
            .create_message(NewMessage::user(chat.id, request.message.clone()))
            .await
            .map_err(|e| ChatError::Internal(format!("Failed to save message: {e}")))?;
        let usage_model = provider
            .as_ref()
            .map_or(ANSWER_ENGINE_MODEL, |(_, _, model)| model.as_str());
        self.usage
            .record(&request.user_id, UsageKind::Message, Some(usage_model))
            .await;

        let Some((resolved, api_key, model)) = provider else {
            let records = self.search.answer(&request.message).await;
            let repository = self.chat_repository.clone();
            let chat_id = chat.id;
            return Ok(self.spawn(move |sink| answer_engine_turn(sink, repository, chat_id, records)));
        };

        let (sources, search_usage_remaining) = match request.search_mode {
            SearchMode::Web => {
                let outcome = self
                    .search
                    .web_search(
                        &request.user_id,
                        &request.message,
                        request.search_result_count,
                    )
                    .await?;
                if outcome.remaining.is_some() {
                    self.usage
                        .record(&request.user_id, UsageKind::Search, None)
                        .await;
                }
                let sources = (!outcome.results.is_empty()).then_some(outcome.results);
                (sources, outcome.remaining)
            }
            _ => (None, None),
        };

        let generation_request = GenerationRequest {
            messages: self.load_history(chat.id).await?,
            api_key,
            model: model.clone(),
            search_results: sources.clone(),
            system_prompt: compose_system_prompt(request.date_time.as_deref(), template.as_deref()),
        };

        tracing::info!(
            conversation_id = %chat.id,
            user_id = %request.user_id,
            provider = %resolved.kind,
            model = %model,
            sources = sources.as_ref().map_or(0, Vec::len),
            "Starting generation"
        );

        let body = resolved
            .provider
            .chat_completion_stream(generation_request)
            .await
            .map_err(|e| {
                tracing::warn!(
                    conversation_id = %chat.id,
                    provider = %resolved.kind,
                    error = %e,
                    "Provider rejected generation request"
                );
                upstream_error(e)
            })?;

        let generation = Generation {
            chat_id: chat.id,
            user_id: request.user_id,
            provider: resolved.kind.to_string(),
            model,
            body,
            decoder: resolved.provider.frame_decoder(),
            sources,
            search_usage_remaining,
        };
        let repository = self.chat_repository.clone();

        Ok(self.spawn(move |sink| generation_turn(sink, repository, generation)))
    }
}

/// Map a pre-stream provider failure, keeping addresses out of the message
fn upstream_error(error: CompletionError) -> ChatError {
    match ChatError::from(error) {
        ChatError::Upstream { status, body } => ChatError::Upstream {
            status,
            body: InferenceProviderPool::sanitize_error_message(&body),
        },
        other => other,
    }
}

async fn generation_turn(
    mut sink: EventSink,
    repository: Arc<dyn ChatRepository>,
    generation: Generation,
) -> Result<(), ClientDisconnected> {
    let Generation {
        chat_id,
        user_id,
        provider,
        model,
        body,
        decoder,
        sources,
        search_usage_remaining,
    } = generation;

    sink.emit(ChatStreamEvent::ConversationId {
        conversation_id: chat_id,
    })
    .await?;

    if let Some(sources) = &sources {
        sink.emit(ChatStreamEvent::Sources {
            sources: sources.clone(),
            search_usage_remaining,
        })
        .await?;
    }

    let mut answer = AccumulatedAnswer::default();
    let mut chunks = classify_stream(body, decoder);

    let mut failure = None;
    while let Some(chunk) = chunks.next().await {
        match chunk {
            Ok(chunk) => {
                answer.push(&chunk);
                sink.emit(ChatStreamEvent::from(chunk)).await?;
            }
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }
    // Releases the upstream connection
    drop(chunks);

    if let Some(e) = failure {
        tracing::error!(
            conversation_id = %chat_id,
            user_id = %user_id,
            provider = %provider,
            error = %e,
            "Generation stream failed"
        );
        return sink
            .fail(InferenceProviderPool::sanitize_error_message(&e.to_string()))
            .await;
    }

    if answer.has_visible_text() {
        let reasoning = answer.reasoning();
        let message = NewMessage {
            chat_id,
            role: MessageRole::Assistant,
            content: answer.visible_text,
            sources,
            reasoning,
            model: Some(model),
        };
        if let Err(e) = repository.create_message(message).await {
            tracing::error!(conversation_id = %chat_id, error = %e, "Failed to save assistant message");
            return sink.fail("Failed to save response".to_string()).await;
        }
    } else {
        tracing::warn!(conversation_id = %chat_id, provider = %provider, "Generation produced no visible text");
    }

    tracing::debug!(conversation_id = %chat_id, "Generation complete");
    sink.emit(ChatStreamEvent::done()).await
}

async fn answer_engine_turn(
    mut sink: EventSink,
    repository: Arc<dyn ChatRepository>,
    chat_id: ChatId,
    records: Vec<SearchResult>,
) -> Result<(), ClientDisconnected> {
    sink.emit(ChatStreamEvent::ConversationId {
        conversation_id: chat_id,
    })
    .await?;

    let mut records = records.into_iter();
    let Some(answer) = records.next().filter(|a| !a.content.is_empty()) else {
        return sink
            .fail("The answer engine returned no answer".to_string())
            .await;
    };
    let citations: Vec<SearchResult> = records.collect();

    if !citations.is_empty() {
        sink.emit(ChatStreamEvent::Sources {
            sources: citations.clone(),
            search_usage_remaining: None,
        })
        .await?;
    }
    sink.emit(ChatStreamEvent::Content {
        content: answer.content.clone(),
    })
    .await?;

    let message = NewMessage {
        chat_id,
        role: MessageRole::Assistant,
        content: answer.content,
        sources: (!citations.is_empty()).then_some(citations),
        reasoning: None,
        model: Some(answer.title),
    };
    if let Err(e) = repository.create_message(message).await {
        tracing::error!(conversation_id = %chat_id, error = %e, "Failed to save answer");
        return sink.fail("Failed to save response".to_string()).await;
    }

    sink.emit(ChatStreamEvent::done()).await
}
