use crate::{
    templates::{
        errors::TemplateError,
        models::{PromptTemplate, TemplateFields, TemplateId},
        ports::{TemplateRepository, TemplateServiceTrait},
    },
    UserId,
};
use async_trait::async_trait;
use std::sync::Arc;

pub struct TemplateServiceImpl {
    pub template_repository: Arc<dyn TemplateRepository>,
}

impl TemplateServiceImpl {
    pub fn new(template_repository: Arc<dyn TemplateRepository>) -> Self {
        Self {
            template_repository,
        }
    }

    async fn owned_template(
        &self,
        id: TemplateId,
        user_id: &UserId,
    ) -> Result<PromptTemplate, TemplateError> {
        let template = self
            .template_repository
            .get_template(id)
            .await
            .map_err(|e| TemplateError::InternalError(format!("Failed to get template: {e}")))?;

        template
            .filter(|t| &t.user_id == user_id)
            .ok_or(TemplateError::NotFound)
    }
}

#[async_trait]
impl TemplateServiceTrait for TemplateServiceImpl {
    async fn list_templates(&self, user_id: &UserId) -> Result<Vec<PromptTemplate>, TemplateError> {
        self.template_repository
            .list_templates(user_id)
            .await
            .map_err(|e| TemplateError::InternalError(format!("Failed to list templates: {e}")))
    }

    async fn get_template(
        &self,
        id: TemplateId,
        user_id: &UserId,
    ) -> Result<PromptTemplate, TemplateError> {
        self.owned_template(id, user_id).await
    }

    async fn create_template(
        &self,
        user_id: &UserId,
        name: &str,
        content: &str,
    ) -> Result<PromptTemplate, TemplateError> {
        let fields = TemplateFields::parse(name, content)?;
        let template = self
            .template_repository
            .create_template(user_id, fields)
            .await
            .map_err(|e| TemplateError::InternalError(format!("Failed to create template: {e}")))?;

        tracing::info!(template_id = %template.id, user_id = %user_id, "Created template");
        Ok(template)
    }

    async fn update_template(
        &self,
        id: TemplateId,
        user_id: &UserId,
        name: &str,
        content: &str,
    ) -> Result<PromptTemplate, TemplateError> {
        let fields = TemplateFields::parse(name, content)?;
        self.owned_template(id, user_id).await?;

        let updated = self
            .template_repository
            .update_template(id, fields)
            .await
            .map_err(|e| TemplateError::InternalError(format!("Failed to update template: {e}")))?;

        updated.ok_or(TemplateError::NotFound)
    }

    async fn delete_template(
        &self,
        id: TemplateId,
        user_id: &UserId,
    ) -> Result<(), TemplateError> {
        self.owned_template(id, user_id).await?;

        let deleted = self
            .template_repository
            .delete_template(id)
            .await
            .map_err(|e| TemplateError::InternalError(format!("Failed to delete template: {e}")))?;
        if !deleted {
            return Err(TemplateError::NotFound);
        }

        tracing::info!(template_id = %id, user_id = %user_id, "Deleted template");
        Ok(())
    }
}
