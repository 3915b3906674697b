// src/handlers/scheduling.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::scheduling::{
        parse_time, Appointment, AppointmentFilter, MeetingKind, PendingProposal, ProposalStatus,
    },
    services::scheduling_service::ProposalInput,
};

// =============================================================================
//  PROPOSTAS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProposalPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Maria da Silva")]
    pub nome_cliente: String,

    #[validate(length(min = 10, message = "Telefone deve ter DDD"))]
    #[schema(example = "(11) 98765-4321")]
    pub telefone_cliente: String,

    pub data_opcao_1: NaiveDate,
    pub data_opcao_2: NaiveDate,

    #[schema(example = "09:00")]
    pub horario_inicio: String,

    #[schema(example = "17:00")]
    pub horario_fim: String,

    pub conformidade_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmProposalPayload {
    pub data_escolhida: NaiveDate,
    /// 1 ou 2 quando o cliente escolheu uma das datas propostas.
    pub opcao_escolhida: Option<i16>,
    #[schema(example = "14:30")]
    pub horario_escolhido: String,
}

#[derive(Debug, Deserialize)]
pub struct ProposalQuery {
    pub status: Option<ProposalStatus>,
}

fn time_field(value: &str, field: &str) -> Result<chrono::NaiveTime, AppError> {
    parse_time(value).ok_or_else(|| AppError::BadRequest(format!("{} inválido: '{}'", field, value)))
}

// POST /api/agendamentos/propostas/{kind}
#[utoipa::path(
    post,
    path = "/api/agendamentos/propostas/{kind}",
    tag = "Agendamentos",
    params(("kind" = MeetingKind, Path, description = "entrevista ou assinatura")),
    request_body = CreateProposalPayload,
    responses(
        (status = 201, description = "Proposta criada e enviada ao cliente", body = PendingProposal),
        (status = 400, description = "Dados inválidos"),
        (status = 422, description = "Entrevista da conformidade ainda não aprovada")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_proposal(
    State(app_state): State<AppState>,
    Path(kind): Path<MeetingKind>,
    Json(payload): Json<CreateProposalPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let input = ProposalInput {
        horario_inicio: time_field(&payload.horario_inicio, "horarioInicio")?,
        horario_fim: time_field(&payload.horario_fim, "horarioFim")?,
        nome_cliente: payload.nome_cliente,
        telefone_cliente: payload.telefone_cliente,
        data_opcao_1: payload.data_opcao_1,
        data_opcao_2: payload.data_opcao_2,
        conformidade_id: payload.conformidade_id,
    };

    let proposal = app_state.scheduling_service.propose_meeting(kind, input).await?;
    Ok((StatusCode::CREATED, Json(proposal)))
}

// GET /api/agendamentos/propostas/{kind}
#[utoipa::path(
    get,
    path = "/api/agendamentos/propostas/{kind}",
    tag = "Agendamentos",
    params(
        ("kind" = MeetingKind, Path, description = "entrevista ou assinatura"),
        ("status" = Option<ProposalStatus>, Query, description = "pendente ou confirmado")
    ),
    responses(
        (status = 200, description = "Propostas", body = Vec<PendingProposal>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_proposals(
    State(app_state): State<AppState>,
    Path(kind): Path<MeetingKind>,
    Query(query): Query<ProposalQuery>,
) -> Result<impl IntoResponse, AppError> {
    let rows = app_state.scheduling_service.list_proposals(kind, query.status).await?;
    Ok(Json(rows))
}

// DELETE /api/agendamentos/propostas/{kind}/{id}
#[utoipa::path(
    delete,
    path = "/api/agendamentos/propostas/{kind}/{id}",
    tag = "Agendamentos",
    params(
        ("kind" = MeetingKind, Path, description = "entrevista ou assinatura"),
        ("id" = Uuid, Path, description = "ID da proposta")
    ),
    responses(
        (status = 204, description = "Removida"),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_proposal(
    State(app_state): State<AppState>,
    Path((kind, id)): Path<(MeetingKind, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    app_state.scheduling_service.delete_proposal(kind, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/agendamentos/propostas/{kind}/{id}/confirmar
#[utoipa::path(
    post,
    path = "/api/agendamentos/propostas/{kind}/{id}/confirmar",
    tag = "Agendamentos",
    params(
        ("kind" = MeetingKind, Path, description = "entrevista ou assinatura"),
        ("id" = Uuid, Path, description = "ID da proposta")
    ),
    request_body = ConfirmProposalPayload,
    responses(
        (status = 200, description = "Proposta confirmada e agendamento criado"),
        (status = 404, description = "Proposta não encontrada"),
        (status = 409, description = "Proposta já confirmada"),
        (status = 422, description = "Horário fora da janela")
    ),
    security(("api_jwt" = []))
)]
pub async fn confirm_proposal(
    State(app_state): State<AppState>,
    Path((kind, id)): Path<(MeetingKind, Uuid)>,
    Json(payload): Json<ConfirmProposalPayload>,
) -> Result<impl IntoResponse, AppError> {
    let confirmed = app_state
        .scheduling_service
        .confirm_meeting(
            kind,
            id,
            payload.data_escolhida,
            payload.opcao_escolhida,
            &payload.horario_escolhido,
        )
        .await?;

    Ok(Json(json!({
        "proposta": confirmed.proposal,
        "agendamento": confirmed.appointment,
    })))
}

// =============================================================================
//  AGENDAMENTOS
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReschedulePayload {
    pub nova_data: NaiveDate,
    #[schema(example = "10:30")]
    pub novo_horario: String,
    #[serde(default)]
    pub notificar_cliente: bool,
    /// Substitui o telefone gravado quando informado.
    pub telefone: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InterviewResultPayload {
    pub aprovado: bool,
    pub motivo_reprovacao: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AppointmentStatusPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Realizado")]
    pub status: String,
}

// GET /api/agendamentos
#[utoipa::path(
    get,
    path = "/api/agendamentos",
    tag = "Agendamentos",
    params(
        ("tipo" = Option<MeetingKind>, Query, description = "entrevista ou assinatura"),
        ("cpf" = Option<String>, Query, description = "CPF do cliente")
    ),
    responses(
        (status = 200, description = "Agendamentos", body = Vec<Appointment>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_appointments(
    State(app_state): State<AppState>,
    Query(filter): Query<AppointmentFilter>,
) -> Result<impl IntoResponse, AppError> {
    let rows = app_state.scheduling_service.list_appointments(filter).await?;
    Ok(Json(rows))
}

// GET /api/agendamentos/{id}
#[utoipa::path(
    get,
    path = "/api/agendamentos/{id}",
    tag = "Agendamentos",
    params(("id" = Uuid, Path, description = "ID do agendamento")),
    responses(
        (status = 200, description = "Agendamento", body = Appointment),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_appointment(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let appointment = app_state.scheduling_service.get_appointment(id).await?;
    Ok(Json(appointment))
}

// POST /api/agendamentos/{id}/reagendar
#[utoipa::path(
    post,
    path = "/api/agendamentos/{id}/reagendar",
    tag = "Agendamentos",
    params(("id" = Uuid, Path, description = "ID do agendamento")),
    request_body = ReschedulePayload,
    responses(
        (status = 200, description = "Reagendado", body = Appointment),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn reschedule_appointment(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReschedulePayload>,
) -> Result<impl IntoResponse, AppError> {
    let updated = app_state
        .scheduling_service
        .reschedule_appointment(
            id,
            payload.nova_data,
            &payload.novo_horario,
            payload.notificar_cliente,
            payload.telefone,
        )
        .await?;
    Ok(Json(updated))
}

// POST /api/agendamentos/{id}/resultado-entrevista
#[utoipa::path(
    post,
    path = "/api/agendamentos/{id}/resultado-entrevista",
    tag = "Agendamentos",
    params(("id" = Uuid, Path, description = "ID do agendamento de entrevista")),
    request_body = InterviewResultPayload,
    responses(
        (status = 200, description = "Resultado registrado", body = Appointment),
        (status = 409, description = "O agendamento não é uma entrevista")
    ),
    security(("api_jwt" = []))
)]
pub async fn interview_result(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<InterviewResultPayload>,
) -> Result<impl IntoResponse, AppError> {
    let updated = app_state
        .scheduling_service
        .approve_or_reject_interview(id, payload.aprovado, payload.motivo_reprovacao)
        .await?;
    Ok(Json(updated))
}

// PATCH /api/agendamentos/{id}/status
#[utoipa::path(
    patch,
    path = "/api/agendamentos/{id}/status",
    tag = "Agendamentos",
    params(("id" = Uuid, Path, description = "ID do agendamento")),
    request_body = AppointmentStatusPayload,
    responses(
        (status = 200, description = "Status atualizado", body = Appointment)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_appointment_status(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AppointmentStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let updated = app_state
        .scheduling_service
        .update_appointment_status(id, &payload.status)
        .await?;
    Ok(Json(updated))
}

// DELETE /api/agendamentos/{id}
#[utoipa::path(
    delete,
    path = "/api/agendamentos/{id}",
    tag = "Agendamentos",
    params(("id" = Uuid, Path, description = "ID do agendamento")),
    responses(
        (status = 204, description = "Removido"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_appointment(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.scheduling_service.delete_appointment(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
