// src/models/template.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TemplateChannel {
    Email,
    Whatsapp,
}

impl TemplateChannel {
    pub fn table(self) -> &'static str {
        match self {
            TemplateChannel::Email => "email_templates",
            TemplateChannel::Whatsapp => "whatsapp_templates",
        }
    }
}

/// Template de e-mail (com assunto) ou de WhatsApp (assunto nulo).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Template {
    pub id: Uuid,
    #[schema(example = "demanda_autorizacao_vistoria")]
    pub chave: String,
    pub nome: String,
    pub assunto: Option<String>,
    #[schema(example = "Olá {{nome_empregado}}, nova demanda para o CPF {{cpf}}.")]
    pub corpo: String,
    // Mapa variável -> descrição
    #[schema(value_type = Object)]
    pub variaveis: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TemplateUpsert {
    pub chave: String,
    pub nome: String,
    pub assunto: Option<String>,
    pub corpo: String,
    pub variaveis: Value,
}
