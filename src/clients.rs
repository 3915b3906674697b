// src/clients.rs
//
// Clientes HTTP dos provedores externos. Cada um é um trait (para os services
// dependerem de `Arc<dyn ...>`) com a implementação real sobre `reqwest`.

pub mod ai;
pub mod email;
pub mod storage;
pub mod whatsapp;

pub use ai::{AiGatewayClient, DocumentExtractor, ExtractionRequest};
pub use email::{EmailAttachment, EmailSender, OutgoingEmail, ResendClient};
pub use storage::{FileStorage, StorageClient};
pub use whatsapp::{GreenApiClient, WhatsAppSender};

use reqwest::StatusCode;

use crate::common::error::AppError;

/// Classifica uma resposta de erro de provedor nas classes que a API expõe.
pub(crate) fn classify_provider_error(
    provider: &'static str,
    status: StatusCode,
    body: &str,
) -> AppError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => AppError::RateLimited,
        StatusCode::PAYMENT_REQUIRED => AppError::InsufficientCredits,
        _ => AppError::ProviderError {
            provider,
            message: format!("HTTP {}: {}", status.as_u16(), provider_message(body)),
        },
    }
}

/// Mensagem legível de um corpo de erro (`{"message": ...}` ou `{"error": {"message": ...}}`).
pub(crate) fn provider_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error").and_then(|e| e.get("message")))
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
