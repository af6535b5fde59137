use crate::{
    templates::{
        errors::TemplateError,
        models::{PromptTemplate, TemplateFields, TemplateId},
    },
    UserId,
};
use anyhow::Result;
use async_trait::async_trait;

#[cfg(any(test, feature = "test-mocks"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-mocks"), automock)]
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    async fn create_template(
        &self,
        user_id: &UserId,
        fields: TemplateFields,
    ) -> Result<PromptTemplate>;

    /// Get a template by ID regardless of owner
    async fn get_template(&self, id: TemplateId) -> Result<Option<PromptTemplate>>;

    /// All templates of a user, most recently updated first
    async fn list_templates(&self, user_id: &UserId) -> Result<Vec<PromptTemplate>>;

    /// Returns the updated template, `None` if it does not exist
    async fn update_template(
        &self,
        id: TemplateId,
        fields: TemplateFields,
    ) -> Result<Option<PromptTemplate>>;

    /// Returns false if the template did not exist
    async fn delete_template(&self, id: TemplateId) -> Result<bool>;
}

#[async_trait]
pub trait TemplateServiceTrait: Send + Sync {
    async fn list_templates(&self, user_id: &UserId) -> Result<Vec<PromptTemplate>, TemplateError>;

    /// A template of the user; someone else's template is not found
    async fn get_template(
        &self,
        id: TemplateId,
        user_id: &UserId,
    ) -> Result<PromptTemplate, TemplateError>;

    async fn create_template(
        &self,
        user_id: &UserId,
        name: &str,
        content: &str,
    ) -> Result<PromptTemplate, TemplateError>;

    async fn update_template(
        &self,
        id: TemplateId,
        user_id: &UserId,
        name: &str,
        content: &str,
    ) -> Result<PromptTemplate, TemplateError>;

    async fn delete_template(&self, id: TemplateId, user_id: &UserId)
        -> Result<(), TemplateError>;
}
