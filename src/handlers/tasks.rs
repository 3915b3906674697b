// src/handlers/tasks.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
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
    models::tasks::{DistributedTask, TaskFilter, TaskKind},
    services::task_service::{DistributionResult, ERR_DOMAIN_NOT_VERIFIED},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DistributePayload {
    pub tipo_tarefa: TaskKind,
    pub referencia_id: Uuid,
    #[validate(length(min = 1, message = "Informe ao menos um empregado"))]
    pub empregados_ids: Vec<Uuid>,
}

// POST /api/tarefas/distribuir
#[utoipa::path(
    post,
    path = "/api/tarefas/distribuir",
    tag = "Tarefas",
    request_body = DistributePayload,
    responses(
        (status = 200, description = "Ao menos um e-mail enviado", body = DistributionResult),
        (status = 403, description = "Domínio remetente não verificado no provedor"),
        (status = 404, description = "Registro referenciado não existe"),
        (status = 502, description = "Nenhum e-mail pôde ser enviado", body = DistributionResult)
    ),
    security(("api_jwt" = []))
)]
pub async fn distribute(
    State(app_state): State<AppState>,
    Json(payload): Json<DistributePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let result = app_state
        .task_service
        .distribute(payload.tipo_tarefa, payload.referencia_id, &payload.empregados_ids)
        .await?;

    if result.all_domain_unverified() {
        let body = json!({
            "error": ERR_DOMAIN_NOT_VERIFIED,
            "success": false,
            "successCount": result.success_count,
            "failedCount": result.failed_count,
            "results": result.results,
        });
        return Ok((StatusCode::FORBIDDEN, Json(body)));
    }

    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    Ok((status, Json(json!(result))))
}

// GET /api/tarefas
#[utoipa::path(
    get,
    path = "/api/tarefas",
    tag = "Tarefas",
    params(
        ("status" = Option<String>, Query, description = "em_andamento ou concluida"),
        ("empregado_id" = Option<Uuid>, Query, description = "Empregado responsável"),
        ("tipo_tarefa" = Option<TaskKind>, Query, description = "demanda, assinatura ou comite"),
        ("referencia_id" = Option<Uuid>, Query, description = "Registro de origem")
    ),
    responses(
        (status = 200, description = "Tarefas distribuídas", body = Vec<DistributedTask>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_tasks(
    State(app_state): State<AppState>,
    Query(filter): Query<TaskFilter>,
) -> Result<impl IntoResponse, AppError> {
    let rows = app_state.task_service.list_tasks(filter).await?;
    Ok(Json(rows))
}

// POST /api/tarefas/{id}/concluir
#[utoipa::path(
    post,
    path = "/api/tarefas/{id}/concluir",
    tag = "Tarefas",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    responses(
        (status = 200, description = "Tarefa concluída"),
        (status = 404, description = "Tarefa não encontrada"),
        (status = 409, description = "Tarefa já concluída")
    ),
    security(("api_jwt" = []))
)]
pub async fn complete_task(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let closure = app_state.task_service.complete_manually(id).await?;
    Ok(Json(json!({
        "tarefa": closure.task,
        "demandaId": closure.demand_id,
        "demandaAtualizada": closure.demand_updated,
        "tarefasIrmasConcluidas": closure.siblings_completed,
    })))
}
