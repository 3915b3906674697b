// src/models/tasks.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_tarefa", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Demanda,
    Assinatura,
    Comite,
}

impl TaskKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Demanda => "demanda",
            TaskKind::Assinatura => "assinatura",
            TaskKind::Comite => "comite",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_tarefa", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    EmAndamento,
    Concluida,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DistributedTask {
    pub id: Uuid,
    pub tipo_tarefa: TaskKind,
    pub referencia_id: Uuid,
    pub empregado_id: Uuid,
    pub status: TaskStatus,
    #[schema(example = "tarefa-6f1c...@respostas.exemplo.com.br")]
    pub email_reply_to: Option<String>,
    pub email_message_id: Option<String>,
    pub concluida_em: Option<DateTime<Utc>>,
    pub concluida_por_email: bool,
    pub email_conclusao_id: Option<String>,
    pub email_conclusao_remetente: Option<String>,
    pub palavra_chave: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DistributedTask {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Concluida
    }
}

/// Origem da conclusão de uma tarefa.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionSource {
    Manual,
    Email {
        email_id: String,
        remetente: String,
        palavra_chave: String,
    },
}

/// Resultado de uma conclusão: a tarefa e, para demandas, o que mudou em volta dela.
#[derive(Debug, Clone)]
pub struct TaskClosure {
    pub task: DistributedTask,
    pub demand_id: Option<Uuid>,
    pub demand_updated: bool,
    pub siblings_completed: u64,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub empregado_id: Option<Uuid>,
    pub tipo_tarefa: Option<TaskKind>,
    pub referencia_id: Option<Uuid>,
}
