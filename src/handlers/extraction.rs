// src/handlers/extraction.rs
//
// As funções de extração respondem `{status, ...}` em vez do corpo de erro
// padrão, como o front-end espera.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::{
    common::error::AppError,
    config::AppState,
    models::extraction::DocumentPayload,
    services::extraction_service::ExtractionResult,
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionPayload {
    /// Conteúdo do arquivo em base64 (PDF ou imagem).
    pub pdf_base64: String,
    #[schema(example = "application/pdf")]
    pub file_type: Option<String>,
}

fn respond(result: Result<ExtractionResult, AppError>) -> Response {
    match result {
        Ok(r) => Json(json!({
            "status": "ok",
            "texto_gerado": r.texto_gerado,
            "dados_extraidos": r.dados_extraidos,
        }))
        .into_response(),
        Err(e) => {
            let status = match e {
                AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                AppError::InsufficientCredits => StatusCode::PAYMENT_REQUIRED,
                AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            if status.is_server_error() {
                tracing::error!("🔥 Falha na extração de documento: {:?}", e);
            }
            let message = if status.is_server_error() {
                "Não foi possível processar o documento.".to_string()
            } else {
                e.public_message()
            };
            (status, Json(json!({ "status": "error", "error": message }))).into_response()
        }
    }
}

// POST /api/extracao/certidao-casamento
#[utoipa::path(
    post,
    path = "/api/extracao/certidao-casamento",
    tag = "Extração",
    request_body = ExtractionPayload,
    responses(
        (status = 200, description = "Dados extraídos e texto gerado"),
        (status = 402, description = "Créditos insuficientes"),
        (status = 429, description = "Limite de requisições"),
        (status = 500, description = "Falha na extração")
    ),
    security(("api_jwt" = []))
)]
pub async fn marriage_certificate(
    State(app_state): State<AppState>,
    Json(payload): Json<ExtractionPayload>,
) -> Response {
    let document = DocumentPayload::from_upload(payload.pdf_base64, payload.file_type.as_deref());
    respond(app_state.extraction_service.extract_marriage_certificate(document).await)
}

// POST /api/extracao/matricula-imovel
#[utoipa::path(
    post,
    path = "/api/extracao/matricula-imovel",
    tag = "Extração",
    request_body = ExtractionPayload,
    responses(
        (status = 200, description = "Dados extraídos e texto gerado"),
        (status = 402, description = "Créditos insuficientes"),
        (status = 429, description = "Limite de requisições"),
        (status = 500, description = "Falha na extração")
    ),
    security(("api_jwt" = []))
)]
pub async fn property_registration(
    State(app_state): State<AppState>,
    Json(payload): Json<ExtractionPayload>,
) -> Response {
    let document = DocumentPayload::from_upload(payload.pdf_base64, payload.file_type.as_deref());
    respond(app_state.extraction_service.extract_property_registration(document).await)
}
