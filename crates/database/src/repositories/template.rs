use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use services::templates::{
    models::{PromptTemplate, TemplateFields, TemplateId},
    ports::TemplateRepository,
};
use services::UserId;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Process-local template storage
#[derive(Default)]
pub struct InMemoryTemplateRepository {
    templates: RwLock<HashMap<TemplateId, PromptTemplate>>,
}

impl InMemoryTemplateRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateRepository for InMemoryTemplateRepository {
    async fn create_template(
        &self,
        user_id: &UserId,
        fields: TemplateFields,
    ) -> Result<PromptTemplate> {
        let now = Utc::now();
        let template = PromptTemplate {
            id: TemplateId::new(),
            user_id: user_id.clone(),
            name: fields.name,
            content: fields.content,
            created_at: now,
            updated_at: now,
        };

        self.templates
            .write()
            .await
            .insert(template.id, template.clone());

        debug!("Created template: {} for user: {}", template.id, user_id);
        Ok(template)
    }

    async fn get_template(&self, id: TemplateId) -> Result<Option<PromptTemplate>> {
        Ok(self.templates.read().await.get(&id).cloned())
    }

    async fn list_templates(&self, user_id: &UserId) -> Result<Vec<PromptTemplate>> {
        let mut templates: Vec<PromptTemplate> = self
            .templates
            .read()
            .await
            .values()
            .filter(|t| &t.user_id == user_id)
            .cloned()
            .collect();
        templates.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(templates)
    }

    async fn update_template(
        &self,
        id: TemplateId,
        fields: TemplateFields,
    ) -> Result<Option<PromptTemplate>> {
        let mut templates = self.templates.write().await;
        let Some(template) = templates.get_mut(&id) else {
            return Ok(None);
        };

        template.name = fields.name;
        template.content = fields.content;
        template.updated_at = Utc::now();
        Ok(Some(template.clone()))
    }

    async fn delete_template(&self, id: TemplateId) -> Result<bool> {
        Ok(self.templates.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str, content: &str) -> TemplateFields {
        TemplateFields::parse(name, content).unwrap()
    }

    #[tokio::test]
    async fn test_list_is_per_user_most_recent_first() {
        let repo = InMemoryTemplateRepository::new();
        let alice = UserId::from("alice");

        let first = repo
            .create_template(&alice, fields("First", "one"))
            .await
            .unwrap();
        let second = repo
            .create_template(&alice, fields("Second", "two"))
            .await
            .unwrap();
        repo.create_template(&UserId::from("bob"), fields("Bob", "three"))
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        repo.update_template(first.id, fields("First", "edited"))
            .await
            .unwrap();

        let listed = repo.list_templates(&alice).await.unwrap();
        let ids: Vec<TemplateId> = listed.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
        assert_eq!(listed[0].content, "edited");
        assert!(listed[0].updated_at > listed[0].created_at);
    }

    #[tokio::test]
    async fn test_missing_template_update_and_delete() {
        let repo = InMemoryTemplateRepository::new();
        let id = TemplateId::new();

        assert!(repo
            .update_template(id, fields("Gone", "x"))
            .await
            .unwrap()
            .is_none());
        assert!(!repo.delete_template(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_removes_template() {
        let repo = InMemoryTemplateRepository::new();
        let template = repo
            .create_template(&UserId::from("alice"), fields("Tutor", "Be patient."))
            .await
            .unwrap();

        assert!(repo.delete_template(template.id).await.unwrap());
        assert!(repo.get_template(template.id).await.unwrap().is_none());
    }
}
