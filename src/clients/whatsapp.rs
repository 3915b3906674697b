// src/clients/whatsapp.rs

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{clients::classify_provider_error, common::error::AppError};

#[async_trait]
pub trait WhatsAppSender: Send + Sync {
    /// Envia uma mensagem de texto para um chat (`<dígitos>@c.us`).
    async fn send_text(&self, chat_id: &str, message: &str) -> Result<String, AppError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageBody<'a> {
    chat_id: &'a str,
    message: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageResponse {
    id_message: String,
}

/// Gateway de WhatsApp no formato `{url}/waInstance{id}/sendMessage/{token}`.
#[derive(Clone)]
pub struct GreenApiClient {
    client: Client,
    base_url: String,
    instance_id: String,
    token: String,
}

impl GreenApiClient {
    pub fn new(client: Client, base_url: &str, instance_id: String, token: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            instance_id,
            token,
        }
    }
}

#[async_trait]
impl WhatsAppSender for GreenApiClient {
    async fn send_text(&self, chat_id: &str, message: &str) -> Result<String, AppError> {
        let url = format!(
            "{}/waInstance{}/sendMessage/{}",
            self.base_url, self.instance_id, self.token
        );

        let response = self
            .client
            .post(url)
            .json(&SendMessageBody { chat_id, message })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_provider_error("whatsapp", status, &text));
        }

        let sent: SendMessageResponse = response.json().await?;
        tracing::info!("💬 WhatsApp {} enviado para {}", sent.id_message, chat_id);
        Ok(sent.id_message)
    }
}
