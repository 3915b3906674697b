// src/handlers/demands.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::demand::{Demand, DemandStatus, DemandType, NewDemand},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDemandPayload {
    pub tipo: DemandType,
    #[schema(example = "529.982.247-25")]
    pub cpf: Option<String>,
    pub matricula: Option<String>,
    pub cartorio: Option<String>,
    pub descricao: Option<String>,
    /// Caminhos no storage (no máximo 5).
    #[serde(default)]
    #[validate(length(max = 5, message = "No máximo 5 arquivos"))]
    pub arquivos: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RespondDemandPayload {
    #[validate(length(min = 1, message = "required"))]
    pub resposta: String,
    pub status: Option<DemandStatus>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignedDocumentPathPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "assinados/demanda-123.pdf")]
    pub documento_assinado: String,
}

#[derive(Debug, Deserialize)]
pub struct DemandQuery {
    pub status: Option<DemandStatus>,
}

// POST /api/demandas
#[utoipa::path(
    post,
    path = "/api/demandas",
    tag = "Demandas",
    request_body = CreateDemandPayload,
    responses(
        (status = 201, description = "Demanda aberta", body = Demand),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_demand(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateDemandPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let demand = app_state
        .demand_service
        .create(NewDemand {
            tipo: payload.tipo,
            cpf: payload.cpf,
            matricula: payload.matricula,
            cartorio: payload.cartorio,
            descricao: payload.descricao,
            arquivos: payload.arquivos,
            solicitante_id: user.id,
        })
        .await?;
    tracing::info!(
        "📨 Demanda {} aberta por {}",
        demand.id,
        user.email.as_deref().unwrap_or("usuário sem e-mail")
    );

    Ok((StatusCode::CREATED, Json(demand)))
}

// GET /api/demandas
#[utoipa::path(
    get,
    path = "/api/demandas",
    tag = "Demandas",
    params(("status" = Option<DemandStatus>, Query, description = "Filtra pelo status")),
    responses(
        (status = 200, description = "Demandas", body = Vec<Demand>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_demands(
    State(app_state): State<AppState>,
    Query(query): Query<DemandQuery>,
) -> Result<impl IntoResponse, AppError> {
    let rows = app_state.demand_service.list(query.status).await?;
    Ok(Json(rows))
}

// GET /api/demandas/{id}
#[utoipa::path(
    get,
    path = "/api/demandas/{id}",
    tag = "Demandas",
    params(("id" = Uuid, Path, description = "ID da demanda")),
    responses(
        (status = 200, description = "Demanda", body = Demand),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_demand(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let demand = app_state.demand_service.get(id).await?;
    Ok(Json(demand))
}

// POST /api/demandas/{id}/resposta
#[utoipa::path(
    post,
    path = "/api/demandas/{id}/resposta",
    tag = "Demandas",
    params(("id" = Uuid, Path, description = "ID da demanda")),
    request_body = RespondDemandPayload,
    responses(
        (status = 200, description = "Resposta registrada", body = Demand),
        (status = 409, description = "Demanda já encerrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn respond_demand(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RespondDemandPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let demand = app_state
        .demand_service
        .respond(id, &payload.resposta, payload.status)
        .await?;
    Ok(Json(demand))
}

// POST /api/demandas/{id}/documento-assinado
#[utoipa::path(
    post,
    path = "/api/demandas/{id}/documento-assinado",
    tag = "Demandas",
    params(("id" = Uuid, Path, description = "ID da demanda")),
    request_body = SignedDocumentPathPayload,
    responses(
        (status = 200, description = "Documento anexado, demanda assinada", body = Demand),
        (status = 409, description = "Demanda já encerrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn attach_signed_document(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SignedDocumentPathPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let demand = app_state
        .demand_service
        .attach_signed_document(id, &payload.documento_assinado)
        .await?;
    Ok(Json(demand))
}

// POST /api/demandas/{id}/cancelar
#[utoipa::path(
    post,
    path = "/api/demandas/{id}/cancelar",
    tag = "Demandas",
    params(("id" = Uuid, Path, description = "ID da demanda")),
    responses(
        (status = 200, description = "Demanda cancelada", body = Demand),
        (status = 409, description = "Demanda já encerrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_demand(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let demand = app_state.demand_service.cancel(id).await?;
    Ok(Json(demand))
}
