// src/handlers/conformidades.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::conformidade::{Conformidade, ConformidadeFilter, Modalidade, NewConformidade, TipoContrato},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateConformidadePayload {
    #[validate(length(min = 11, max = 14, message = "CPF deve ter 11 dígitos"))]
    #[schema(example = "529.982.247-25")]
    pub cpf: String,

    #[schema(example = 250000.0)]
    pub valor_financiamento: Decimal,

    pub modalidade: Modalidade,

    #[schema(example = "Pró-Cotista")]
    pub modalidade_outro: Option<String>,

    pub tipo_contrato: TipoContrato,

    #[serde(default)]
    pub comite_credito: bool,

    pub observacoes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Em análise")]
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateNotesPayload {
    pub observacoes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InterviewApprovalPayload {
    pub entrevista_aprovada: bool,
}

// POST /api/conformidades
#[utoipa::path(
    post,
    path = "/api/conformidades",
    tag = "Conformidades",
    request_body = CreateConformidadePayload,
    responses(
        (status = 201, description = "Conformidade criada", body = Conformidade),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "CPF já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_conformidade(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateConformidadePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let conformidade = app_state
        .conformidade_service
        .create(NewConformidade {
            cpf: payload.cpf,
            valor_financiamento: payload.valor_financiamento,
            modalidade: payload.modalidade,
            modalidade_outro: payload.modalidade_outro,
            tipo_contrato: payload.tipo_contrato,
            comite_credito: payload.comite_credito,
            observacoes: payload.observacoes,
            created_by: Some(user.id),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(conformidade)))
}

// GET /api/conformidades
#[utoipa::path(
    get,
    path = "/api/conformidades",
    tag = "Conformidades",
    params(
        ("status" = Option<String>, Query, description = "Filtra pelo status"),
        ("cpf" = Option<String>, Query, description = "Filtra pelo CPF (com ou sem máscara)")
    ),
    responses(
        (status = 200, description = "Lista de conformidades", body = Vec<Conformidade>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_conformidades(
    State(app_state): State<AppState>,
    Query(filter): Query<ConformidadeFilter>,
) -> Result<impl IntoResponse, AppError> {
    let rows = app_state.conformidade_service.list(filter).await?;
    Ok(Json(rows))
}

// GET /api/conformidades/{id}
#[utoipa::path(
    get,
    path = "/api/conformidades/{id}",
    tag = "Conformidades",
    params(("id" = Uuid, Path, description = "ID da conformidade")),
    responses(
        (status = 200, description = "Conformidade", body = Conformidade),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_conformidade(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let conformidade = app_state.conformidade_service.get(id).await?;
    Ok(Json(conformidade))
}

// PATCH /api/conformidades/{id}/status
#[utoipa::path(
    patch,
    path = "/api/conformidades/{id}/status",
    tag = "Conformidades",
    params(("id" = Uuid, Path, description = "ID da conformidade")),
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, description = "Status atualizado", body = Conformidade),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_status(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let updated = app_state.conformidade_service.update_status(id, &payload.status).await?;
    Ok(Json(updated))
}

// PATCH /api/conformidades/{id}/observacoes
#[utoipa::path(
    patch,
    path = "/api/conformidades/{id}/observacoes",
    tag = "Conformidades",
    params(("id" = Uuid, Path, description = "ID da conformidade")),
    request_body = UpdateNotesPayload,
    responses(
        (status = 200, description = "Observações atualizadas", body = Conformidade)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_notes(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateNotesPayload>,
) -> Result<impl IntoResponse, AppError> {
    let updated = app_state
        .conformidade_service
        .update_notes(id, payload.observacoes.as_deref())
        .await?;
    Ok(Json(updated))
}

// PATCH /api/conformidades/{id}/entrevista-aprovada
#[utoipa::path(
    patch,
    path = "/api/conformidades/{id}/entrevista-aprovada",
    tag = "Conformidades",
    params(("id" = Uuid, Path, description = "ID da conformidade")),
    request_body = InterviewApprovalPayload,
    responses(
        (status = 200, description = "Aprovação registrada", body = Conformidade)
    ),
    security(("api_jwt" = []))
)]
pub async fn set_interview_approved(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<InterviewApprovalPayload>,
) -> Result<impl IntoResponse, AppError> {
    let updated = app_state
        .conformidade_service
        .set_interview_approved(id, payload.entrevista_aprovada)
        .await?;
    Ok(Json(updated))
}

// DELETE /api/conformidades/{id}
#[utoipa::path(
    delete,
    path = "/api/conformidades/{id}",
    tag = "Conformidades",
    params(("id" = Uuid, Path, description = "ID da conformidade")),
    responses(
        (status = 204, description = "Removida"),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_conformidade(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.conformidade_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
