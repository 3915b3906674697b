// src/services/template_service.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::TemplateStore,
    models::template::{Template, TemplateChannel, TemplateUpsert},
    services::notification_service::undeclared_placeholders,
};

#[derive(Clone)]
pub struct TemplateService {
    store: Arc<dyn TemplateStore>,
}

impl TemplateService {
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, channel: TemplateChannel) -> Result<Vec<Template>, AppError> {
        self.store.list_templates(channel).await
    }

    pub async fn get(&self, channel: TemplateChannel, chave: &str) -> Result<Template, AppError> {
        self.store
            .find_template(channel, chave)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Template '{}'", chave)))
    }

    /// Cria ou atualiza pela chave. Todo placeholder usado precisa estar declarado em `variaveis`.
    pub async fn upsert(
        &self,
        channel: TemplateChannel,
        template: TemplateUpsert,
    ) -> Result<Template, AppError> {
        if !template.variaveis.is_object() {
            return Err(AppError::BadRequest(
                "variaveis deve ser um objeto variável -> descrição".to_string(),
            ));
        }
        if channel == TemplateChannel::Email
            && template.assunto.as_deref().is_none_or(|s| s.trim().is_empty())
        {
            return Err(AppError::BadRequest("Templates de e-mail precisam de assunto".to_string()));
        }

        let text = format!("{}\n{}", template.assunto.as_deref().unwrap_or(""), template.corpo);
        let missing = undeclared_placeholders(&text, &template.variaveis);
        if !missing.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Variáveis não declaradas no template: {}",
                missing.join(", ")
            )));
        }

        let saved = self.store.upsert_template(channel, &template).await?;
        tracing::info!("Template '{}' ({:?}) salvo", saved.chave, channel);
        Ok(saved)
    }
}
