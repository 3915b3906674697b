// src/clients/email.rs

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::{
    clients::{classify_provider_error, provider_message},
    common::error::AppError,
    models::webhook::ReceivedEmail,
};

#[derive(Debug, Clone, PartialEq)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_base64: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub reply_to: Option<String>,
    pub attachments: Vec<EmailAttachment>,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Envia o e-mail e devolve o id da mensagem no provedor.
    async fn send(&self, email: &OutgoingEmail) -> Result<String, AppError>;
    /// Busca o conteúdo completo de um e-mail recebido (assunto, texto, HTML).
    async fn fetch_received(&self, email_id: &str) -> Result<ReceivedEmail, AppError>;
}

#[derive(Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<AttachmentBody<'a>>,
}

#[derive(Serialize)]
struct AttachmentBody<'a> {
    filename: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    id: String,
}

#[derive(Clone)]
pub struct ResendClient {
    client: Client,
    base_url: String,
    api_key: String,
    from: String,
}

impl ResendClient {
    pub fn new(client: Client, base_url: &str, api_key: String, from: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            from,
        }
    }
}

#[async_trait]
impl EmailSender for ResendClient {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, AppError> {
        let body = SendEmailBody {
            from: &self.from,
            to: &email.to,
            subject: &email.subject,
            html: &email.html,
            reply_to: email.reply_to.as_deref(),
            attachments: email
                .attachments
                .iter()
                .map(|a| AttachmentBody {
                    filename: &a.filename,
                    content: &a.content_base64,
                })
                .collect(),
        };

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            // O provedor recusa remetentes de domínios não verificados com 403
            if status == StatusCode::FORBIDDEN
                && provider_message(&text).to_lowercase().contains("not verified")
            {
                return Err(AppError::EmailDomainNotVerified);
            }
            return Err(classify_provider_error("email", status, &text));
        }

        let sent: SendEmailResponse = response.json().await?;
        tracing::info!("📧 E-mail {} enviado para {:?}", sent.id, email.to);
        Ok(sent.id)
    }

    async fn fetch_received(&self, email_id: &str) -> Result<ReceivedEmail, AppError> {
        let response = self
            .client
            .get(received_email_url(&self.base_url, email_id)?)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_provider_error("email", status, &text));
        }

        Ok(response.json().await?)
    }
}

/// O id entra como um único segmento do caminho, com `/`, `?` e `#` escapados.
fn received_email_url(base_url: &str, email_id: &str) -> Result<Url, AppError> {
    let invalid = |message: String| AppError::ProviderError { provider: "email", message };
    let mut url = Url::parse(base_url).map_err(|e| invalid(format!("URL base inválida: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| invalid(format!("URL base sem caminho: {}", base_url)))?
        .pop_if_empty()
        .extend(["emails", "receiving", email_id]);
    Ok(url)
}
