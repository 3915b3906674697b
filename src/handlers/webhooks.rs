// src/handlers/webhooks.rs
//
// Rotas públicas chamadas pelos provedores. Protegidas pelo próprio segredo,
// não pelo JWT.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{
    common::error::AppError,
    config::AppState,
    models::webhook::{EmailWebhookPayload, WhatsAppWebhookPayload},
    services::{
        email_reply_service::verify_webhook_secret, scheduling_service::WhatsAppReplyOutcome,
        EmailReplyService,
    },
};

const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

// POST /webhooks/email-resposta
#[utoipa::path(
    post,
    path = "/webhooks/email-resposta",
    tag = "Webhooks",
    request_body = EmailWebhookPayload,
    params(("x-webhook-secret" = Option<String>, Header, description = "Segredo compartilhado com o provedor")),
    responses(
        (status = 200, description = "Evento processado ou ignorado"),
        (status = 401, description = "Segredo inválido"),
        (status = 500, description = "Falha inesperada")
    )
)]
pub async fn email_reply(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    receive_email(
        &app_state.email_reply_service,
        app_state.settings.email_webhook_secret.as_deref(),
        &headers,
        &body,
    )
    .await
}

/// Corpo cru: o provedor recebe 200 mesmo quando o JSON não é decodificável.
async fn receive_email(
    service: &EmailReplyService,
    configured_secret: Option<&str>,
    headers: &HeaderMap,
    body: &[u8],
) -> Response {
    let provided = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    if let Err(e) = verify_webhook_secret(configured_secret, provided) {
        tracing::warn!("Webhook de e-mail com segredo inválido");
        return e.into_response();
    }

    match service.handle_raw(body).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

// POST /webhooks/whatsapp
#[utoipa::path(
    post,
    path = "/webhooks/whatsapp",
    tag = "Webhooks",
    request_body = WhatsAppWebhookPayload,
    responses(
        (status = 200, description = "Mensagem processada ou ignorada")
    )
)]
pub async fn whatsapp(
    State(app_state): State<AppState>,
    Json(payload): Json<WhatsAppWebhookPayload>,
) -> Result<impl IntoResponse, AppError> {
    if !payload.is_incoming_message() {
        return Ok(Json(json!({ "success": true, "ignored": payload.type_webhook })));
    }
    let (Some(chat_id), Some(text)) = (payload.chat_id(), payload.text()) else {
        return Ok(Json(json!({ "success": true, "ignored": "sem_texto" })));
    };

    let outcome = app_state
        .scheduling_service
        .handle_whatsapp_reply(chat_id, &text)
        .await?;

    let body = match outcome {
        WhatsAppReplyOutcome::NoPendingProposal => {
            json!({ "success": true, "ignored": "sem_proposta_pendente" })
        }
        WhatsAppReplyOutcome::Reprompted { proposal_id } => {
            json!({ "success": true, "action": "reprompted", "propostaId": proposal_id })
        }
        WhatsAppReplyOutcome::Confirmed { proposal_id, appointment_id } => json!({
            "success": true,
            "action": "confirmed",
            "propostaId": proposal_id,
            "agendamentoId": appointment_id,
        }),
    };
    Ok(Json(body))
}
