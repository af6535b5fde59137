use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{templates::errors::TemplateError, UserId};

/// Longest template name accepted
pub const MAX_NAME_CHARS: usize = 100;
/// Longest template body accepted
pub const MAX_CONTENT_CHARS: usize = 20_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(pub Uuid);

impl TemplateId {
    pub fn new() -> Self {
        TemplateId(Uuid::new_v4())
    }
}

impl Default for TemplateId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::str::FromStr for TemplateId {
    type Err = TemplateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(TemplateId)
            .map_err(|_| TemplateError::InvalidParams(format!("Invalid template ID: {value}")))
    }
}

impl std::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reusable system prompt saved by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub id: TemplateId,
    pub user_id: UserId,
    pub name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Name and body of a template, validated and trimmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFields {
    pub name: String,
    pub content: String,
}

impl TemplateFields {
    pub fn parse(name: &str, content: &str) -> Result<Self, TemplateError> {
        let name = name.trim();
        let content = content.trim();

        if name.is_empty() || content.is_empty() {
            return Err(TemplateError::InvalidParams(
                "Name and content are required".to_string(),
            ));
        }
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(TemplateError::InvalidParams(format!(
                "Name must be at most {MAX_NAME_CHARS} characters"
            )));
        }
        if content.chars().count() > MAX_CONTENT_CHARS {
            return Err(TemplateError::InvalidParams(format!(
                "Content must be at most {MAX_CONTENT_CHARS} characters"
            )));
        }

        Ok(Self {
            name: name.to_string(),
            content: content.to_string(),
        })
    }
}
