// src/handlers/templates.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::template::{Template, TemplateChannel, TemplateUpsert},
};

fn empty_object() -> Value {
    Value::Object(Default::default())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpsertTemplatePayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "demanda_reemissao_boleto")]
    pub chave: String,

    #[validate(length(min = 1, message = "required"))]
    pub nome: String,

    /// Obrigatório para e-mail.
    pub assunto: Option<String>,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Olá {{nome_empregado}}, nova demanda para o CPF {{cpf}}.")]
    pub corpo: String,

    #[serde(default = "empty_object")]
    #[schema(value_type = Object)]
    pub variaveis: Value,
}

// GET /api/templates/{canal}
#[utoipa::path(
    get,
    path = "/api/templates/{canal}",
    tag = "Templates",
    params(("canal" = TemplateChannel, Path, description = "email ou whatsapp")),
    responses(
        (status = 200, description = "Templates do canal", body = Vec<Template>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_templates(
    State(app_state): State<AppState>,
    Path(canal): Path<TemplateChannel>,
) -> Result<impl IntoResponse, AppError> {
    let rows = app_state.template_service.list(canal).await?;
    Ok(Json(rows))
}

// GET /api/templates/{canal}/{chave}
#[utoipa::path(
    get,
    path = "/api/templates/{canal}/{chave}",
    tag = "Templates",
    params(
        ("canal" = TemplateChannel, Path, description = "email ou whatsapp"),
        ("chave" = String, Path, description = "Chave do template")
    ),
    responses(
        (status = 200, description = "Template", body = Template),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_template(
    State(app_state): State<AppState>,
    Path((canal, chave)): Path<(TemplateChannel, String)>,
) -> Result<impl IntoResponse, AppError> {
    let template = app_state.template_service.get(canal, &chave).await?;
    Ok(Json(template))
}

// PUT /api/templates/{canal}
#[utoipa::path(
    put,
    path = "/api/templates/{canal}",
    tag = "Templates",
    params(("canal" = TemplateChannel, Path, description = "email ou whatsapp")),
    request_body = UpsertTemplatePayload,
    responses(
        (status = 200, description = "Template salvo", body = Template),
        (status = 400, description = "Placeholder não declarado ou assunto ausente")
    ),
    security(("api_jwt" = []))
)]
pub async fn upsert_template(
    State(app_state): State<AppState>,
    Path(canal): Path<TemplateChannel>,
    Json(payload): Json<UpsertTemplatePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let saved = app_state
        .template_service
        .upsert(
            canal,
            TemplateUpsert {
                chave: payload.chave,
                nome: payload.nome,
                assunto: payload.assunto,
                corpo: payload.corpo,
                variaveis: payload.variaveis,
            },
        )
        .await?;
    Ok(Json(saved))
}
