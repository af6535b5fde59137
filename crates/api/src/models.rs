use serde::{Deserialize, Serialize};
use services::{
    chat::{
        models::{Chat, ChatId, ChatRequest, Message, SearchMode},
        ChatError,
    },
    conversations::ConversationWithMessages,
    search::SearchUsage,
    templates::{PromptTemplate, TemplateId},
    usage::{DailyUsage, ModelUsage, UsageError, UsagePeriod},
    UserId,
};
use chrono::{Datelike, Utc};
use inference_providers::CreditBalance;
use utoipa::ToSchema;

/// Error body returned before any event has been streamed
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub r#type: String,
}

impl ErrorResponse {
    pub fn new(message: String, error_type: String) -> Self {
        Self {
            error: message,
            r#type: error_type,
        }
    }
}

/// Search augmentation requested by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchModeParam {
    Off,
    Web,
    AnswerEngine,
}

impl From<SearchModeParam> for SearchMode {
    fn from(mode: SearchModeParam) -> Self {
        match mode {
            SearchModeParam::Off => SearchMode::Off,
            SearchModeParam::Web => SearchMode::Web,
            SearchModeParam::AnswerEngine => SearchMode::AnswerEngine,
        }
    }
}

/// Body of `POST /api/chat`
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequestBody {
    pub message: String,
    /// Continue this conversation; omitted to start a new one
    pub conversation_id: Option<String>,
    /// Shorthand for `searchMode: "web"`
    #[serde(default)]
    pub enable_search: bool,
    /// Takes precedence over `enableSearch`
    pub search_mode: Option<SearchModeParam>,
    /// Web search results to retrieve (default 5, clamped to 1..=20)
    pub search_result_count: Option<u32>,
    pub model: Option<String>,
    /// `together` or `openrouter`
    pub provider: Option<String>,
    pub system_prompt: Option<String>,
    /// Saved template to use as system prompt; ignored when `systemPrompt` is set
    pub template_id: Option<String>,
    /// Client wall-clock time, shown to the model
    pub date_time: Option<String>,
}

impl ChatRequestBody {
    pub fn validate(&self) -> Result<(), String> {
        if self.message.trim().is_empty() {
            return Err("message is required".to_string());
        }
        Ok(())
    }

    pub fn search_mode(&self) -> SearchMode {
        match self.search_mode {
            Some(mode) => mode.into(),
            None if self.enable_search => SearchMode::Web,
            None => SearchMode::Off,
        }
    }

    pub fn into_service_request(self, user_id: UserId) -> Result<ChatRequest, ChatError> {
        let conversation_id = self
            .conversation_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .map(str::parse::<ChatId>)
            .transpose()?;
        let template_id = self
            .template_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .map(str::parse::<TemplateId>)
            .transpose()
            .map_err(|e| ChatError::Validation(e.to_string()))?;
        let search_mode = self.search_mode();

        Ok(ChatRequest {
            user_id,
            message: self.message,
            conversation_id,
            provider: self.provider,
            model: self.model,
            search_mode,
            search_result_count: self.search_result_count,
            system_prompt: self.system_prompt,
            template_id,
            date_time: self.date_time,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationObject {
    pub id: String,
    pub title: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Chat> for ConversationObject {
    fn from(chat: Chat) -> Self {
        Self {
            id: chat.id.to_string(),
            title: chat.title,
            created_at: chat.created_at.timestamp(),
            updated_at: chat.updated_at.timestamp(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConversationList {
    pub data: Vec<ConversationObject>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SourceObject {
    pub title: String,
    pub url: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageObject {
    pub id: String,
    /// `user` or `assistant`
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceObject>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub created_at: i64,
}

impl From<Message> for MessageObject {
    fn from(message: Message) -> Self {
        let role = serde_json::to_value(message.role)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();

        Self {
            id: message.id.to_string(),
            role,
            content: message.content,
            sources: message.sources.map(|sources| {
                sources
                    .into_iter()
                    .map(|s| SourceObject {
                        title: s.title,
                        url: s.url,
                        content: s.content,
                    })
                    .collect()
            }),
            reasoning: message.reasoning,
            model: message.model,
            created_at: message.created_at.timestamp(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConversationDetail {
    #[serde(flatten)]
    pub conversation: ConversationObject,
    pub messages: Vec<MessageObject>,
}

impl From<ConversationWithMessages> for ConversationDetail {
    fn from(value: ConversationWithMessages) -> Self {
        Self {
            conversation: value.chat.into(),
            messages: value.messages.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RenameConversationRequest {
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConversationDeleteResult {
    pub id: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchUsageResponse {
    /// Calendar month, `YYYY-MM`
    pub period: String,
    pub used: i64,
    pub limit: i64,
    pub remaining: i64,
}

impl From<SearchUsage> for SearchUsageResponse {
    fn from(usage: SearchUsage) -> Self {
        Self {
            period: usage.period,
            used: usage.used,
            limit: usage.limit,
            remaining: usage.remaining,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateObject {
    pub id: String,
    pub name: String,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<PromptTemplate> for TemplateObject {
    fn from(template: PromptTemplate) -> Self {
        Self {
            id: template.id.to_string(),
            name: template.name,
            content: template.content,
            created_at: template.created_at.timestamp(),
            updated_at: template.updated_at.timestamp(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TemplateList {
    pub data: Vec<TemplateObject>,
}

/// Body of template create and update
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TemplateRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TemplateDeleteResult {
    pub id: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CreditsQuery {
    /// `openrouter`; only providers with a prepaid balance answer
    pub provider: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreditsResponse {
    pub provider: String,
    /// Remaining credit, four decimals
    pub balance: String,
    pub total_credits: f64,
    pub total_usage: f64,
}

impl CreditsResponse {
    pub fn new(provider: String, credits: CreditBalance) -> Self {
        Self {
            provider,
            balance: format!("{:.4}", credits.remaining()),
            total_credits: credits.total_credits,
            total_usage: credits.total_usage,
        }
    }
}

/// Month selector; omitted fields default to the current UTC month
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UsageQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl UsageQuery {
    pub fn period(&self) -> Result<UsagePeriod, UsageError> {
        let today = Utc::now().date_naive();
        UsagePeriod::new(
            self.year.unwrap_or_else(|| today.year()),
            self.month.unwrap_or_else(|| today.month()),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DailyUsageObject {
    /// `YYYY-MM-DD`
    pub date: String,
    pub messages: i64,
    pub searches: i64,
}

impl From<DailyUsage> for DailyUsageObject {
    fn from(day: DailyUsage) -> Self {
        Self {
            date: day.date.format("%Y-%m-%d").to_string(),
            messages: day.messages,
            searches: day.searches,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UsageHistoryResponse {
    pub year: i32,
    pub month: u32,
    pub usage: Vec<DailyUsageObject>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelUsageObject {
    pub model: String,
    pub messages: i64,
}

impl From<ModelUsage> for ModelUsageObject {
    fn from(stats: ModelUsage) -> Self {
        Self {
            model: stats.model,
            messages: stats.messages,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub year: i32,
    pub month: u32,
    pub stats: Vec<ModelUsageObject>,
    pub search_usage: SearchUsageResponse,
}
