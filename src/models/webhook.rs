// src/models/webhook.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

// =============================================================================
//  E-MAIL RECEBIDO (provedor de e-mail)
// =============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EmailWebhookPayload {
    #[serde(rename = "type")]
    #[schema(example = "email.received")]
    pub event_type: String,
    #[serde(default)]
    pub data: EmailWebhookData,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct EmailWebhookData {
    pub email_id: Option<String>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub to: Vec<EmailAddress>,
    #[schema(value_type = Option<Object>)]
    pub from: Option<EmailAddress>,
    pub subject: Option<String>,
}

/// O provedor manda endereços como string simples ou como objeto `{email, name}`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum EmailAddress {
    Plain(String),
    Object {
        email: String,
        #[serde(default)]
        name: Option<String>,
    },
}

impl EmailAddress {
    pub fn address(&self) -> &str {
        match self {
            EmailAddress::Plain(s) => s,
            EmailAddress::Object { email, .. } => email,
        }
    }
}

/// Ações registradas na auditoria e devolvidas ao provedor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookAction {
    IgnoredInvalidPayload,
    IgnoredEventType,
    IgnoredNoTaskId,
    IgnoredTaskNotFound,
    IgnoredAlreadyCompleted,
    IgnoredNoKeyword,
    Completed,
    Error,
}

impl WebhookAction {
    pub fn as_str(self) -> &'static str {
        match self {
            WebhookAction::IgnoredInvalidPayload => "ignored_invalid_payload",
            WebhookAction::IgnoredEventType => "ignored_event_type",
            WebhookAction::IgnoredNoTaskId => "ignored_no_task_id",
            WebhookAction::IgnoredTaskNotFound => "ignored_task_not_found",
            WebhookAction::IgnoredAlreadyCompleted => "ignored_already_completed",
            WebhookAction::IgnoredNoKeyword => "ignored_no_keyword",
            WebhookAction::Completed => "completed",
            WebhookAction::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewWebhookEvent {
    pub email_id: Option<String>,
    pub distribuicao_id: Option<Uuid>,
    pub remetente: Option<String>,
    pub assunto: Option<String>,
    pub action_taken: String,
    pub matched_keyword: Option<String>,
    pub detalhes: Option<Value>,
}

/// Conteúdo completo de um e-mail recebido, buscado no provedor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReceivedEmail {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmailWebhookOutcome {
    pub success: bool,
    pub action: WebhookAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribuicao_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demand_updated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demand_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp_sent: Option<bool>,
}

impl EmailWebhookOutcome {
    pub fn ignored(action: WebhookAction, reason: impl Into<String>) -> Self {
        Self {
            success: true,
            action,
            reason: Some(reason.into()),
            distribuicao_id: None,
            matched_keyword: None,
            demand_updated: None,
            demand_id: None,
            whatsapp_sent: None,
        }
    }
}

// =============================================================================
//  WHATSAPP RECEBIDO (gateway)
// =============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppWebhookPayload {
    #[schema(example = "incomingMessageReceived")]
    pub type_webhook: String,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub sender_data: Option<WhatsAppSenderData>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub message_data: Option<WhatsAppMessageData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppSenderData {
    pub chat_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppMessageData {
    #[serde(default)]
    pub text_message_data: Option<TextMessageData>,
    #[serde(default)]
    pub extended_text_message_data: Option<ExtendedTextMessageData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMessageData {
    pub text_message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtendedTextMessageData {
    pub text: String,
}

impl WhatsAppWebhookPayload {
    pub fn is_incoming_message(&self) -> bool {
        self.type_webhook == "incomingMessageReceived"
    }

    pub fn chat_id(&self) -> Option<&str> {
        self.sender_data.as_ref().map(|s| s.chat_id.as_str())
    }

    /// Texto da mensagem já sem espaços nas pontas.
    pub fn text(&self) -> Option<String> {
        let data = self.message_data.as_ref()?;
        data.text_message_data
            .as_ref()
            .map(|t| t.text_message.as_str())
            .or_else(|| data.extended_text_message_data.as_ref().map(|t| t.text.as_str()))
            .map(|t| t.trim().to_string())
    }
}
