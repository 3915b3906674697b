// src/handlers/documents.rs

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    services::signed_document_service::{SignedDocumentOutcome, SignedDocumentRequest},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendSignedDocumentPayload {
    pub demand_id: Uuid,
    pub cca_user_id: Uuid,
    #[validate(length(min = 11, message = "CPF deve ter 11 dígitos"))]
    pub cpf: String,
    #[validate(length(min = 1, message = "required"))]
    pub matricula: String,
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "assinados/demanda-123.pdf")]
    pub pdf_path: String,
}

// POST /api/documentos/assinado/enviar
#[utoipa::path(
    post,
    path = "/api/documentos/assinado/enviar",
    tag = "Documentos",
    request_body = SendSignedDocumentPayload,
    responses(
        (status = 200, description = "Documento enviado ao CCA", body = SignedDocumentOutcome),
        (status = 404, description = "CCA não encontrado"),
        (status = 502, description = "Falha no storage ou no provedor de e-mail")
    ),
    security(("api_jwt" = []))
)]
pub async fn send_signed_document(
    State(app_state): State<AppState>,
    Json(payload): Json<SendSignedDocumentPayload>,
) -> Response {
    if let Err(e) = payload.validate() {
        let err = AppError::ValidationError(e);
        return (err.status_code(), Json(json!({ "success": false, "error": err.public_message() })))
            .into_response();
    }

    let request = SignedDocumentRequest {
        demand_id: payload.demand_id,
        cca_user_id: payload.cca_user_id,
        cpf: payload.cpf,
        matricula: payload.matricula,
        pdf_path: payload.pdf_path,
    };

    match app_state.signed_document_service.send(request).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => {
            tracing::error!("🔥 Falha ao enviar documento assinado: {}", e);
            (e.status_code(), Json(json!({ "success": false, "error": e.public_message() })))
                .into_response()
        }
    }
}
