use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("Token inválido")]
    InvalidToken,

    #[error("Segredo do webhook inválido")]
    InvalidWebhookSecret,

    #[error("{0} não encontrado(a)")]
    ResourceNotFound(String),

    #[error("Já existe uma conformidade para este CPF")]
    CpfAlreadyExists,

    #[error("Esta proposta de agendamento já foi confirmada")]
    ProposalAlreadyConfirmed,

    #[error("Esta tarefa já foi concluída")]
    TaskAlreadyCompleted,

    #[error("{0}")]
    InvalidTransition(String),

    #[error("Horário {chosen} fora da janela {start}–{end}")]
    TimeOutsideWindow {
        chosen: String,
        start: String,
        end: String,
    },

    #[error("A entrevista desta conformidade ainda não foi aprovada")]
    InterviewNotApproved,

    // --- Provedores externos ---
    #[error("Limite de requisições excedido")]
    RateLimited,

    #[error("Créditos insuficientes no provedor de IA")]
    InsufficientCredits,

    #[error("Domínio de e-mail não verificado no provedor")]
    EmailDomainNotVerified,

    #[error("Falha no provedor {provider}: {message}")]
    ProviderError { provider: &'static str, message: String },

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro HTTP: {0}")]
    HttpClientError(#[from] reqwest::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::TimeOutsideWindow { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InterviewNotApproved => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidToken | AppError::InvalidWebhookSecret => StatusCode::UNAUTHORIZED,
            AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::CpfAlreadyExists
            | AppError::ProposalAlreadyConfirmed
            | AppError::TaskAlreadyCompleted
            | AppError::InvalidTransition(_) => StatusCode::CONFLICT,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::InsufficientCredits => StatusCode::PAYMENT_REQUIRED,
            AppError::EmailDomainNotVerified => StatusCode::FORBIDDEN,
            AppError::ProviderError { .. } | AppError::HttpClientError(_) => StatusCode::BAD_GATEWAY,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Mensagem exposta ao usuário. Erros internos não vazam detalhes.
    pub fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(_) => "Um ou mais campos são inválidos.".to_string(),
            AppError::RateLimited => {
                "Limite de requisições excedido. Tente novamente em instantes.".to_string()
            }
            AppError::InsufficientCredits => {
                "Créditos insuficientes. Adicione créditos ao workspace para continuar.".to_string()
            }
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                "Ocorreu um erro inesperado.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let AppError::ValidationError(errors) = &self {
            let mut details = std::collections::HashMap::new();
            for (field, field_errors) in errors.field_errors() {
                let messages: Vec<String> = field_errors
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .collect();
                details.insert(field.to_string(), messages);
            }
            let body = Json(json!({
                "error": self.public_message(),
                "details": details,
            }));
            return (status, body).into_response();
        }

        if status.is_server_error() {
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }

        let body = Json(json!({ "error": self.public_message() }));
        (status, body).into_response()
    }
}
