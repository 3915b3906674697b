// src/db/task_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        tasks::{CompletionSource, DistributedTask, TaskClosure, TaskFilter, TaskKind},
        webhook::NewWebhookEvent,
    },
};

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create_task(
        &self,
        kind: TaskKind,
        referencia_id: Uuid,
        empregado_id: Uuid,
    ) -> Result<DistributedTask, AppError>;
    async fn find_task(&self, id: Uuid) -> Result<Option<DistributedTask>, AppError>;
    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<DistributedTask>, AppError>;
    async fn attach_email(
        &self,
        id: Uuid,
        reply_to: &str,
        message_id: Option<&str>,
    ) -> Result<(), AppError>;

    /// Conclui a tarefa (só se estiver em andamento). Para demandas, na mesma
    /// transação conclui a demanda e todas as tarefas irmãs.
    /// `None` quando a tarefa já estava concluída ou não existe.
    async fn complete_task(
        &self,
        id: Uuid,
        source: &CompletionSource,
    ) -> Result<Option<TaskClosure>, AppError>;

    async fn log_webhook_event(&self, event: &NewWebhookEvent) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for TaskRepository {
    async fn create_task(
        &self,
        kind: TaskKind,
        referencia_id: Uuid,
        empregado_id: Uuid,
    ) -> Result<DistributedTask, AppError> {
        let task = sqlx::query_as::<_, DistributedTask>(
            r#"
            INSERT INTO distribuicoes_tarefas (tipo_tarefa, referencia_id, empregado_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
            .bind(kind)
            .bind(referencia_id)
            .bind(empregado_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<DistributedTask>, AppError> {
        let maybe = sqlx::query_as::<_, DistributedTask>(
            "SELECT * FROM distribuicoes_tarefas WHERE id = $1",
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe)
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<DistributedTask>, AppError> {
        let rows = sqlx::query_as::<_, DistributedTask>(
            r#"
            SELECT * FROM distribuicoes_tarefas
            WHERE ($1::status_tarefa IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR empregado_id = $2)
              AND ($3::tipo_tarefa IS NULL OR tipo_tarefa = $3)
              AND ($4::uuid IS NULL OR referencia_id = $4)
            ORDER BY created_at DESC
            "#,
        )
            .bind(filter.status)
            .bind(filter.empregado_id)
            .bind(filter.tipo_tarefa)
            .bind(filter.referencia_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn attach_email(
        &self,
        id: Uuid,
        reply_to: &str,
        message_id: Option<&str>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE distribuicoes_tarefas
            SET email_reply_to = $1, email_message_id = $2, updated_at = NOW()
            WHERE id = $3
            "#,
        )
            .bind(reply_to)
            .bind(message_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn complete_task(
        &self,
        id: Uuid,
        source: &CompletionSource,
    ) -> Result<Option<TaskClosure>, AppError> {
        let (by_email, email_id, remetente, palavra) = match source {
            CompletionSource::Manual => (false, None, None, None),
            CompletionSource::Email { email_id, remetente, palavra_chave } => (
                true,
                Some(email_id.as_str()),
                Some(remetente.as_str()),
                Some(palavra_chave.as_str()),
            ),
        };

        let mut tx = self.pool.begin().await?;

        // em_andamento -> concluida, nunca o contrário
        let updated = sqlx::query_as::<_, DistributedTask>(
            r#"
            UPDATE distribuicoes_tarefas
            SET status = 'concluida', concluida_em = NOW(), concluida_por_email = $1,
                email_conclusao_id = $2, email_conclusao_remetente = $3,
                palavra_chave = $4, updated_at = NOW()
            WHERE id = $5 AND status = 'em_andamento'
            RETURNING *
            "#,
        )
            .bind(by_email)
            .bind(email_id)
            .bind(remetente)
            .bind(palavra)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(task) = updated else {
            return Ok(None);
        };

        let mut closure = TaskClosure {
            demand_id: None,
            demand_updated: false,
            siblings_completed: 0,
            task,
        };

        if closure.task.tipo_tarefa == TaskKind::Demanda {
            let demand_id = closure.task.referencia_id;

            let demand = sqlx::query(
                "UPDATE demandas SET status = 'concluida', updated_at = NOW() WHERE id = $1",
            )
                .bind(demand_id)
                .execute(&mut *tx)
                .await?;

            let siblings = sqlx::query(
                r#"
                UPDATE distribuicoes_tarefas
                SET status = 'concluida', concluida_em = NOW(), updated_at = NOW()
                WHERE tipo_tarefa = 'demanda' AND referencia_id = $1 AND status = 'em_andamento'
                "#,
            )
                .bind(demand_id)
                .execute(&mut *tx)
                .await?;

            closure.demand_id = Some(demand_id);
            closure.demand_updated = demand.rows_affected() > 0;
            closure.siblings_completed = siblings.rows_affected();
        }

        tx.commit().await?;
        Ok(Some(closure))
    }

    async fn log_webhook_event(&self, event: &NewWebhookEvent) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO email_webhook_events (
                email_id, distribuicao_id, remetente, assunto,
                action_taken, matched_keyword, detalhes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
            .bind(event.email_id.as_deref())
            .bind(event.distribuicao_id)
            .bind(event.remetente.as_deref())
            .bind(event.assunto.as_deref())
            .bind(&event.action_taken)
            .bind(event.matched_keyword.as_deref())
            .bind(&event.detalhes)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
